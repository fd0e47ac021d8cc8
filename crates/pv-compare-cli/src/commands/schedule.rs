use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use std::collections::BTreeMap;

use pv_compare_core::discount::{self, DiscountEdit, DiscountInput};
use pv_compare_core::schedule::{self, CashFlowSchedule};
use pv_compare_core::time_value;
use pv_compare_core::{CalculatorConfig, Money, Period};

use super::rates::RateArgs;
use crate::input;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LastEditedArg {
    Percent,
    Price,
}

impl From<LastEditedArg> for DiscountEdit {
    fn from(arg: LastEditedArg) -> Self {
        match arg {
            LastEditedArg::Percent => DiscountEdit::PercentEdited,
            LastEditedArg::Price => DiscountEdit::PriceEdited,
        }
    }
}

/// Parse a `period=amount` override.
pub fn parse_override(s: &str) -> Result<(Period, Money), String> {
    let (period, amount) = s
        .split_once('=')
        .ok_or_else(|| format!("expected PERIOD=AMOUNT, got '{s}'"))?;
    let period = period
        .trim()
        .parse::<Period>()
        .map_err(|e| format!("invalid period '{period}': {e}"))?;
    let amount = amount
        .trim()
        .parse::<Decimal>()
        .map_err(|e| format!("invalid amount '{amount}': {e}"))?;
    Ok((period, amount))
}

/// Build a discount from flags. The edited field is explicit when both are
/// given; with a single field that field is the edited one.
pub fn discount_from_flags(
    discount_pct: Option<Decimal>,
    discounted_price: Option<Decimal>,
    last_edited: Option<LastEditedArg>,
) -> Result<Option<DiscountInput>, Box<dyn std::error::Error>> {
    let last_edited = match (discount_pct, discounted_price, last_edited) {
        (None, None, _) => return Ok(None),
        (_, _, Some(edited)) => edited.into(),
        (Some(_), None, None) => DiscountEdit::PercentEdited,
        (None, Some(_), None) => DiscountEdit::PriceEdited,
        (Some(_), Some(_), None) => {
            return Err(
                "--last-edited is required when both --discount-pct and --discounted-price are given"
                    .into(),
            )
        }
    };
    Ok(Some(DiscountInput {
        discount_pct,
        discounted_price,
        last_edited,
    }))
}

/// Arguments for discount reconciliation
#[derive(Args)]
pub struct DiscountArgs {
    /// List price before the cash discount
    #[arg(long)]
    pub price: Decimal,

    /// Percentage off the list price
    #[arg(long)]
    pub discount_pct: Option<Decimal>,

    /// Price payable today after the discount
    #[arg(long)]
    pub discounted_price: Option<Decimal>,

    /// Which field was edited last (the authoritative one)
    #[arg(long, value_enum)]
    pub last_edited: Option<LastEditedArg>,
}

pub fn run_discount(args: DiscountArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let input = discount_from_flags(args.discount_pct, args.discounted_price, args.last_edited)?
        .ok_or("--discount-pct or --discounted-price is required")?;
    let reconciled = discount::reconcile_discount(args.price, &input)?;
    Ok(serde_json::to_value(reconciled)?)
}

/// Arguments for building the installment schedule
#[derive(Args)]
pub struct ScheduleArgs {
    /// Product price
    #[arg(long)]
    pub price: Decimal,

    /// Down payment at period 0
    #[arg(long)]
    pub down_payment: Option<Decimal>,

    /// Number of installments
    #[arg(long)]
    pub installments: u32,

    #[command(flatten)]
    pub rate: RateArgs,

    /// Gross installments up for withholding tax (defaults to the config)
    #[arg(long)]
    pub apply_tax: Option<bool>,

    /// Replace one period's amount, e.g. --override 3=120.50 (repeatable)
    #[arg(long = "override", value_parser = parse_override)]
    pub overrides: Vec<(Period, Money)>,
}

pub fn run_schedule(
    args: ScheduleArgs,
    config: &CalculatorConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    if args.installments > config.max_installments {
        return Err(format!(
            "--installments may not exceed {}",
            config.max_installments
        )
        .into());
    }
    let spec = args.rate.to_spec()?;
    let rate = pv_compare_core::rates::effective_monthly_rate(
        &spec,
        config.benchmark_spread.as_ref(),
    )?;
    let apply_tax = args.apply_tax.unwrap_or(config.tax_gross_up);

    let mut plan = schedule::build_installment_plan(
        args.price,
        args.down_payment.unwrap_or(dec!(0)),
        args.installments,
        rate,
        apply_tax,
    )?;
    if !args.overrides.is_empty() {
        let overrides: BTreeMap<Period, Money> = args.overrides.into_iter().collect();
        plan.schedule = plan.schedule.with_overrides(&overrides)?;
    }

    let mut value = serde_json::to_value(plan)?;
    if let Value::Object(ref mut map) = value {
        map.insert("effective_monthly_rate".into(), serde_json::to_value(rate)?);
        map.insert("tax_gross_up".into(), Value::Bool(apply_tax));
    }
    Ok(value)
}

/// Arguments for present value of an arbitrary schedule
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct PresentValueArgs {
    /// Path to JSON input file: {"cash_flows": [...], "rate": {...}, "reference_period": n}
    #[arg(long)]
    pub input: Option<String>,

    /// Amounts for periods 0, 1, 2, ... (comma-separated)
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub cash_flows: Option<Vec<Decimal>>,

    #[command(flatten)]
    pub rate: RateArgs,

    /// Period at which to evaluate; earlier flows are compounded forward
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    pub reference_period: i64,
}

#[derive(serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct PresentValueRequest {
    cash_flows: CashFlowSchedule,
    rate: pv_compare_core::rates::RateSpec,
    #[serde(default)]
    reference_period: i64,
}

pub fn run_present_value(
    args: PresentValueArgs,
    config: &CalculatorConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let (flows, spec, reference_period) = if let Some(ref path) = args.input {
        let file: PresentValueRequest = input::file::read_json(path)?;
        (file.cash_flows, file.rate, file.reference_period)
    } else if let Some(data) = input::stdin::read_stdin()? {
        let piped: PresentValueRequest = serde_json::from_value(data)?;
        (piped.cash_flows, piped.rate, piped.reference_period)
    } else {
        let cash_flows = args
            .cash_flows
            .ok_or("--cash-flows is required (or provide --input)")?;
        (
            CashFlowSchedule::from_flows(cash_flows)?,
            args.rate.to_spec()?,
            args.reference_period,
        )
    };

    let rate = pv_compare_core::rates::effective_monthly_rate(
        &spec,
        config.benchmark_spread.as_ref(),
    )?;
    let present_value = time_value::present_value(&flows, rate, reference_period)?;
    let rows = time_value::discounted_flows(&flows, rate, reference_period)?;

    Ok(json!({
        "result": {
            "present_value": present_value,
            "effective_monthly_rate": rate,
            "reference_period": reference_period,
            "horizon": flows.horizon(),
        },
        "rows": rows,
    }))
}

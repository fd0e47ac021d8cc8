use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use pv_compare_core::comparison::{self, ComparisonInput, SweepInput};
use pv_compare_core::{CalculatorConfig, Money, Period};

use super::rates::RateArgs;
use super::schedule::{discount_from_flags, parse_override, LastEditedArg};
use crate::input;

/// Arguments for the installments vs. lump-sum comparison
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct CompareArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// List price of the product
    #[arg(long)]
    pub price: Option<Decimal>,

    /// Down payment at period 0 of the installment plan
    #[arg(long, default_value = "0")]
    pub down_payment: Decimal,

    /// Number of installments
    #[arg(long)]
    pub installments: Option<u32>,

    /// Cash discount for paying now, in percent
    #[arg(long)]
    pub discount_pct: Option<Decimal>,

    /// Price payable today after the cash discount
    #[arg(long)]
    pub discounted_price: Option<Decimal>,

    /// Which discount field was edited last
    #[arg(long, value_enum)]
    pub last_edited: Option<LastEditedArg>,

    #[command(flatten)]
    pub rate: RateArgs,

    /// Gross installments up for withholding tax (defaults to the config)
    #[arg(long)]
    pub apply_tax: Option<bool>,

    /// Period at which both streams are valued
    #[arg(long, default_value = "0")]
    pub reference_period: i64,

    /// Replace one period's installment amount, e.g. --override 3=0 (repeatable)
    #[arg(long = "override", value_parser = parse_override)]
    pub overrides: Vec<(Period, Money)>,
}

pub fn run_compare(
    args: CompareArgs,
    config: &CalculatorConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let compare_input: ComparisonInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        let list_price = args
            .price
            .ok_or("--price is required (or provide --input)")?;
        let installment_count = args
            .installments
            .ok_or("--installments is required (or provide --input)")?;

        ComparisonInput {
            list_price,
            down_payment: args.down_payment,
            installment_count,
            discount: discount_from_flags(
                args.discount_pct,
                args.discounted_price,
                args.last_edited,
            )?,
            rate: args.rate.to_spec()?,
            apply_tax: args.apply_tax,
            reference_period: args.reference_period,
            overrides: args.overrides.into_iter().collect(),
        }
    };

    let result = comparison::run_comparison(&compare_input, config)?;
    Ok(serde_json::to_value(result)?)
}

/// Arguments for sweeping installment counts
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct SweepArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// List price of the product
    #[arg(long)]
    pub price: Option<Decimal>,

    /// Down payment at period 0 of every plan
    #[arg(long, default_value = "0")]
    pub down_payment: Decimal,

    /// Evaluate 1..=N installments
    #[arg(long)]
    pub max_installments: Option<u32>,

    /// Cash discount for paying now, in percent
    #[arg(long)]
    pub discount_pct: Option<Decimal>,

    /// Price payable today after the cash discount
    #[arg(long)]
    pub discounted_price: Option<Decimal>,

    /// Which discount field was edited last
    #[arg(long, value_enum)]
    pub last_edited: Option<LastEditedArg>,

    #[command(flatten)]
    pub rate: RateArgs,

    /// Gross installments up for withholding tax (defaults to the config)
    #[arg(long)]
    pub apply_tax: Option<bool>,
}

pub fn run_sweep(
    args: SweepArgs,
    config: &CalculatorConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let sweep_input: SweepInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        let list_price = args
            .price
            .ok_or("--price is required (or provide --input)")?;

        SweepInput {
            list_price,
            down_payment: args.down_payment,
            max_installment_count: args.max_installments.unwrap_or(12),
            discount: discount_from_flags(
                args.discount_pct,
                args.discounted_price,
                args.last_edited,
            )?,
            rate: args.rate.to_spec()?,
            apply_tax: args.apply_tax,
        }
    };

    let result = comparison::sweep_installments(&sweep_input, config)?;
    Ok(serde_json::to_value(result)?)
}

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;

use crate::config::CalculatorConfig;
use crate::discount::{reconcile_discount, DiscountInput, ReconciledDiscount};
use crate::error::PvCompareError;
use crate::rates::{resolve_rate, RateSpec, ResolvedRate};
use crate::schedule::{build_installment_plan, build_lumpsum_schedule, InstallmentLine};
use crate::time_value::{discounted_flows, present_value};
use crate::types::*;
use crate::PvCompareResult;

// ---------------------------------------------------------------------------
// Deltas
// ---------------------------------------------------------------------------

/// Absolute and percentage difference between two present values.
///
/// `delta_pct` is `None` when its denominator is zero; callers decide how to
/// display an undefined ratio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeltaReport {
    pub delta: Money,
    pub delta_pct: Option<Percent>,
}

fn pct_of(delta: Money, base: Money) -> Option<Percent> {
    if base.is_zero() {
        None
    } else {
        delta.checked_div(base).map(rate_to_pct)
    }
}

/// `pv_installment − pv_lumpsum`, and that difference relative to the lump sum.
pub fn compare(pv_installment: Money, pv_lumpsum: Money) -> DeltaReport {
    let delta = pv_installment - pv_lumpsum;
    DeltaReport {
        delta,
        delta_pct: pct_of(delta, pv_lumpsum),
    }
}

/// `list_price − pv_installment`, relative to the list price: how much the
/// installment plan is worth below the sticker price.
pub fn list_price_delta(list_price: Money, pv_installment: Money) -> DeltaReport {
    let delta = list_price - pv_installment;
    DeltaReport {
        delta,
        delta_pct: pct_of(delta, list_price),
    }
}

// ---------------------------------------------------------------------------
// Full comparison
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonInput {
    /// Price of the product before any cash discount
    pub list_price: Money,
    /// Payment at period 0 of the installment plan
    #[serde(default)]
    pub down_payment: Money,
    pub installment_count: u32,
    /// Cash discount for paying now; `None` means the lump sum is the list price
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount: Option<DiscountInput>,
    pub rate: RateSpec,
    /// Overrides `CalculatorConfig::tax_gross_up` for this request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apply_tax: Option<bool>,
    #[serde(default)]
    pub reference_period: i64,
    /// Hand-edited installment amounts, by period
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub overrides: BTreeMap<Period, Money>,
}

/// Both streams at one period, restated at the reference period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodRow {
    pub period: Period,
    pub installment_flow: Money,
    pub installment_pv: Money,
    pub lumpsum_flow: Money,
    pub lumpsum_pv: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonOutput {
    pub reference_period: i64,
    pub rate: ResolvedRate,
    pub effective_monthly_pct: Percent,
    pub list_price: Money,
    pub discount_pct: Percent,
    pub lumpsum_price: Money,
    pub installment_count: u32,
    /// Net installment before tax gross-up and overrides
    pub installment_amount: Money,
    pub tax_gross_up: bool,
    pub pv_installment: Money,
    pub pv_lumpsum: Money,
    /// Installments against paying now
    pub versus_lumpsum: DeltaReport,
    /// List price against the installments' present value
    pub versus_list_price: DeltaReport,
    pub periods: Vec<PeriodRow>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tax_breakdown: Vec<InstallmentLine>,
}

fn check_common(
    list_price: Money,
    installment_count: u32,
    config: &CalculatorConfig,
) -> PvCompareResult<()> {
    config.validate()?;
    if list_price < Decimal::ZERO {
        return Err(PvCompareError::invalid("list_price", "List price cannot be negative"));
    }
    if installment_count > config.max_installments {
        return Err(PvCompareError::invalid(
            "installment_count",
            format!(
                "At most {} installments are allowed",
                config.max_installments
            ),
        ));
    }
    Ok(())
}

fn resolve_discount(
    list_price: Money,
    discount: Option<&DiscountInput>,
    warnings: &mut Vec<String>,
) -> PvCompareResult<ReconciledDiscount> {
    match discount {
        Some(d) => {
            let reconciled = reconcile_discount(list_price, d)?;
            if reconciled.clamped {
                tracing::warn!(?d, "discount input clamped into range");
                warnings.push(format!(
                    "Discount clamped to {}% / {}",
                    reconciled.discount_pct.round_dp(2),
                    reconciled.discounted_price.round_dp(2)
                ));
            }
            Ok(reconciled)
        }
        None => Ok(ReconciledDiscount {
            discount_pct: Decimal::ZERO,
            discounted_price: list_price,
            clamped: false,
        }),
    }
}

/// Compare paying in installments with paying now (possibly discounted) at
/// one reference period, under one effective monthly rate.
pub fn run_comparison(
    input: &ComparisonInput,
    config: &CalculatorConfig,
) -> PvCompareResult<ComputationOutput<ComparisonOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    check_common(input.list_price, input.installment_count, config)?;

    let rate = resolve_rate(&input.rate, config.benchmark_spread.as_ref())?;
    let r = rate.effective_monthly_rate;
    let discount =
        resolve_discount(input.list_price, input.discount.as_ref(), &mut warnings)?;
    let apply_tax = input.apply_tax.unwrap_or(config.tax_gross_up);

    if input.down_payment > input.list_price {
        warnings.push("Down payment exceeds the list price; no installments remain".into());
    }

    let plan = build_installment_plan(
        input.list_price,
        input.down_payment,
        input.installment_count,
        r,
        apply_tax,
    )?;

    let installments = if input.overrides.is_empty() {
        plan.schedule
    } else {
        warnings.push(format!(
            "{} period(s) overridden manually",
            input.overrides.len()
        ));
        plan.schedule.with_overrides(&input.overrides)?
    };
    let lumpsum = build_lumpsum_schedule(discount.discounted_price, installments.horizon())?;

    let pv_installment = present_value(&installments, r, input.reference_period)?;
    let pv_lumpsum = present_value(&lumpsum, r, input.reference_period)?;

    let periods = discounted_flows(&installments, r, input.reference_period)?
        .into_iter()
        .zip(discounted_flows(&lumpsum, r, input.reference_period)?)
        .map(|(inst, lump)| PeriodRow {
            period: inst.period,
            installment_flow: inst.amount,
            installment_pv: inst.present_value,
            lumpsum_flow: lump.amount,
            lumpsum_pv: lump.present_value,
        })
        .collect();

    let versus_lumpsum = compare(pv_installment, pv_lumpsum);
    if versus_lumpsum.delta_pct.is_none() {
        warnings.push("Lump-sum present value is zero; percentage delta undefined".into());
    }
    let versus_list_price = list_price_delta(input.list_price, pv_installment);

    tracing::debug!(
        %pv_installment,
        %pv_lumpsum,
        delta = %versus_lumpsum.delta,
        reference_period = input.reference_period,
        "comparison complete"
    );

    let output = ComparisonOutput {
        reference_period: input.reference_period,
        effective_monthly_pct: rate_to_pct(r),
        rate,
        list_price: input.list_price,
        discount_pct: discount.discount_pct,
        lumpsum_price: discount.discounted_price,
        installment_count: input.installment_count,
        installment_amount: plan.installment_amount,
        tax_gross_up: apply_tax,
        pv_installment,
        pv_lumpsum,
        versus_lumpsum,
        versus_list_price,
        periods,
        tax_breakdown: plan.lines,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Present value comparison: installments vs. lump sum",
        &serde_json::json!({
            "input": input,
            "config": config,
        }),
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Installment-count sweep
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepInput {
    pub list_price: Money,
    #[serde(default)]
    pub down_payment: Money,
    /// Counts 1..=max_installment_count are evaluated
    pub max_installment_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount: Option<DiscountInput>,
    pub rate: RateSpec,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apply_tax: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepRow {
    pub installment_count: u32,
    pub installment_amount: Money,
    pub pv_installment: Money,
    pub pv_lumpsum: Money,
    pub delta: Money,
    pub delta_pct: Option<Percent>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepOutput {
    pub rate: ResolvedRate,
    pub discount_pct: Percent,
    pub lumpsum_price: Money,
    pub tax_gross_up: bool,
    pub rows: Vec<SweepRow>,
}

/// Present value at period 0 of every installment count up to a maximum,
/// each against paying now.
pub fn sweep_installments(
    input: &SweepInput,
    config: &CalculatorConfig,
) -> PvCompareResult<ComputationOutput<SweepOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    if input.max_installment_count == 0 {
        return Err(PvCompareError::invalid(
            "max_installment_count",
            "At least one installment count must be evaluated",
        ));
    }
    check_common(input.list_price, input.max_installment_count, config)?;

    let rate = resolve_rate(&input.rate, config.benchmark_spread.as_ref())?;
    let r = rate.effective_monthly_rate;
    let discount =
        resolve_discount(input.list_price, input.discount.as_ref(), &mut warnings)?;
    let apply_tax = input.apply_tax.unwrap_or(config.tax_gross_up);

    let mut rows = Vec::with_capacity(input.max_installment_count as usize);
    for n in 1..=input.max_installment_count {
        let plan =
            build_installment_plan(input.list_price, input.down_payment, n, r, apply_tax)?;
        let lumpsum =
            build_lumpsum_schedule(discount.discounted_price, plan.schedule.horizon())?;

        let pv_installment = present_value(&plan.schedule, r, 0)?;
        let pv_lumpsum = present_value(&lumpsum, r, 0)?;
        let report = compare(pv_installment, pv_lumpsum);

        rows.push(SweepRow {
            installment_count: n,
            installment_amount: plan.installment_amount,
            pv_installment,
            pv_lumpsum,
            delta: report.delta,
            delta_pct: report.delta_pct,
        });
    }

    tracing::debug!(
        counts = rows.len(),
        %r,
        "installment sweep complete"
    );

    let output = SweepOutput {
        rate,
        discount_pct: discount.discount_pct,
        lumpsum_price: discount.discounted_price,
        tax_gross_up: apply_tax,
        rows,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Installment-count sweep: present value at period 0",
        &serde_json::json!({
            "input": input,
            "config": config,
        }),
        warnings,
        elapsed,
        output,
    ))
}

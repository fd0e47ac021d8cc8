use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::PvCompareError;
use crate::types::{pct_to_rate, Percent, Rate};
use crate::PvCompareResult;

/// Money-market day count: twelve 30-day months in a 360-day year.
pub const DAYS_PER_MONTH: u32 = 30;
pub const DAYS_PER_YEAR: u32 = 360;

/// Typical gap between the SELIC target and the CDI rate, in percentage points.
pub const SELIC_CDI_SPREAD_PCT: Percent = dec!(0.10);

/// Annual benchmark the user may quote a rate against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Benchmark {
    Selic,
    Cdi,
}

/// The single active representation of the discount rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RateSpec {
    /// Annual benchmark rate in percent, converted with the 30/360 identity
    Annual {
        benchmark: Benchmark,
        annual_pct: Percent,
    },
    /// Effective monthly rate in percent, used as is
    Monthly { monthly_pct: Percent },
}

/// Spread subtracted from one benchmark's annual rate before conversion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkSpread {
    pub benchmark: Benchmark,
    pub spread_pct: Percent,
}

impl BenchmarkSpread {
    /// Approximates CDI from a quoted SELIC rate.
    pub fn selic_to_cdi() -> Self {
        BenchmarkSpread {
            benchmark: Benchmark::Selic,
            spread_pct: SELIC_CDI_SPREAD_PCT,
        }
    }
}

/// Outcome of normalising a [`RateSpec`] into the engine's monthly rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedRate {
    /// Effective monthly rate as a fraction (0.01 = 1%)
    pub effective_monthly_rate: Rate,
    /// Annual percentage actually converted, after any spread
    #[serde(skip_serializing_if = "Option::is_none")]
    pub converted_annual_pct: Option<Percent>,
    /// Spread subtracted, when the configured benchmark matched
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spread_applied_pct: Option<Percent>,
}

/// Effective monthly rate equivalent to an annual percentage:
/// `(1 + annual_pct/100)^(30/360) − 1`.
///
/// Never fails. Returns zero when the power is undefined (base ≤ 0).
pub fn annual_to_monthly_effective(annual_pct: Percent) -> Rate {
    let base = Decimal::ONE + pct_to_rate(annual_pct);
    if base <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    if base == Decimal::ONE {
        return Decimal::ZERO;
    }

    let exponent = Decimal::from(DAYS_PER_MONTH) / Decimal::from(DAYS_PER_YEAR);
    match base.checked_powd(exponent) {
        Some(factor) => factor - Decimal::ONE,
        None => Decimal::ZERO,
    }
}

/// Normalise a rate choice into the effective monthly rate, reporting which
/// adjustments were applied. Rates at or below −100% are rejected.
pub fn resolve_rate(
    spec: &RateSpec,
    spread: Option<&BenchmarkSpread>,
) -> PvCompareResult<ResolvedRate> {
    match spec {
        RateSpec::Annual {
            benchmark,
            annual_pct,
        } => {
            let spread_applied = spread
                .filter(|s| s.benchmark == *benchmark)
                .map(|s| s.spread_pct);
            let adjusted = *annual_pct - spread_applied.unwrap_or(Decimal::ZERO);

            if adjusted <= dec!(-100) {
                return Err(PvCompareError::invalid(
                    "annual_pct",
                    "Annual rate must be greater than -100%",
                ));
            }

            let monthly = annual_to_monthly_effective(adjusted);
            tracing::debug!(
                ?benchmark,
                %annual_pct,
                %adjusted,
                %monthly,
                "converted annual rate to effective monthly"
            );

            Ok(ResolvedRate {
                effective_monthly_rate: monthly,
                converted_annual_pct: Some(adjusted),
                spread_applied_pct: spread_applied,
            })
        }
        RateSpec::Monthly { monthly_pct } => {
            if *monthly_pct <= dec!(-100) {
                return Err(PvCompareError::invalid(
                    "monthly_pct",
                    "Monthly rate must be greater than -100%",
                ));
            }
            Ok(ResolvedRate {
                effective_monthly_rate: pct_to_rate(*monthly_pct),
                converted_annual_pct: None,
                spread_applied_pct: None,
            })
        }
    }
}

/// Shorthand for [`resolve_rate`] when only the rate itself is needed.
pub fn effective_monthly_rate(
    spec: &RateSpec,
    spread: Option<&BenchmarkSpread>,
) -> PvCompareResult<Rate> {
    Ok(resolve_rate(spec, spread)?.effective_monthly_rate)
}

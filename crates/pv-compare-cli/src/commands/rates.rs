use clap::{Args, ValueEnum};
use rust_decimal::Decimal;
use serde_json::{json, Value};

use pv_compare_core::rates::{self, Benchmark, RateSpec};
use pv_compare_core::tax;
use pv_compare_core::{rate_to_pct, CalculatorConfig};

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum BenchmarkArg {
    Selic,
    Cdi,
}

impl From<BenchmarkArg> for Benchmark {
    fn from(arg: BenchmarkArg) -> Self {
        match arg {
            BenchmarkArg::Selic => Benchmark::Selic,
            BenchmarkArg::Cdi => Benchmark::Cdi,
        }
    }
}

/// Rate selection shared by every command that discounts
#[derive(Args)]
pub struct RateArgs {
    /// Annual benchmark rate in percent (e.g. 15 for 15% a year)
    #[arg(long, conflicts_with = "monthly_pct")]
    pub annual_pct: Option<Decimal>,

    /// Benchmark the annual rate refers to
    #[arg(long, value_enum, default_value = "selic")]
    pub benchmark: BenchmarkArg,

    /// Effective monthly rate in percent (e.g. 1.17), used as is
    #[arg(long)]
    pub monthly_pct: Option<Decimal>,
}

impl RateArgs {
    pub fn to_spec(&self) -> Result<RateSpec, Box<dyn std::error::Error>> {
        match (self.annual_pct, self.monthly_pct) {
            (Some(annual_pct), None) => Ok(RateSpec::Annual {
                benchmark: self.benchmark.into(),
                annual_pct,
            }),
            (None, Some(monthly_pct)) => Ok(RateSpec::Monthly { monthly_pct }),
            (None, None) => Err("one of --annual-pct or --monthly-pct is required".into()),
            (Some(_), Some(_)) => {
                Err("--annual-pct and --monthly-pct are mutually exclusive".into())
            }
        }
    }
}

/// Arguments for rate conversion
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct ConvertRateArgs {
    #[command(flatten)]
    pub rate: RateArgs,
}

pub fn run_convert_rate(
    args: ConvertRateArgs,
    config: &CalculatorConfig,
) -> Result<Value, Box<dyn std::error::Error>> {
    let spec = args.rate.to_spec()?;
    let resolved = rates::resolve_rate(&spec, config.benchmark_spread.as_ref())?;
    let effective_monthly_pct = rate_to_pct(resolved.effective_monthly_rate);

    let mut value = serde_json::to_value(resolved)?;
    if let Value::Object(ref mut map) = value {
        map.insert(
            "effective_monthly_pct".into(),
            serde_json::to_value(effective_monthly_pct)?,
        );
        map.insert("rate".into(), serde_json::to_value(&spec)?);
    }
    Ok(value)
}

/// Arguments for the withholding tax lookup
#[derive(Args)]
pub struct BracketArgs {
    /// Holding period in days
    #[arg(long, conflicts_with = "period")]
    pub days: Option<u32>,

    /// Installment number; held for 30 days per period
    #[arg(long)]
    pub period: Option<u32>,
}

pub fn run_bracket(args: BracketArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let days = match (args.days, args.period) {
        (Some(days), _) => days,
        (None, Some(period)) => tax::holding_days(period),
        (None, None) => return Err("--days or --period is required".into()),
    };
    let rate = tax::bracket_rate(days);

    Ok(json!({
        "days_held": days,
        "tax_rate": rate,
        "tax_pct": rate * Decimal::ONE_HUNDRED,
    }))
}

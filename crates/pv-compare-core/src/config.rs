use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::PvCompareError;
use crate::rates::BenchmarkSpread;
use crate::schedule::MAX_SCHEDULE_HORIZON;
use crate::PvCompareResult;

/// Policy ceiling on the number of installments.
pub const DEFAULT_MAX_INSTALLMENTS: u32 = 120;

/// Business rules that vary between deployments. Both the benchmark spread
/// and the tax gross-up are independent toggles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalculatorConfig {
    /// Spread subtracted from one benchmark's annual rate before conversion
    pub benchmark_spread: Option<BenchmarkSpread>,
    /// Gross installments up for withholding tax unless a request says otherwise
    pub tax_gross_up: bool,
    pub max_installments: u32,
}

impl Default for CalculatorConfig {
    fn default() -> Self {
        CalculatorConfig {
            benchmark_spread: None,
            tax_gross_up: false,
            max_installments: DEFAULT_MAX_INSTALLMENTS,
        }
    }
}

impl CalculatorConfig {
    /// Parse a JSON document; missing fields take their defaults.
    pub fn from_json(json: &str) -> PvCompareResult<Self> {
        let config: CalculatorConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> PvCompareResult<()> {
        if self.max_installments == 0 {
            return Err(PvCompareError::ConfigError(
                "max_installments must be at least 1".into(),
            ));
        }
        if self.max_installments > MAX_SCHEDULE_HORIZON {
            return Err(PvCompareError::ConfigError(format!(
                "max_installments cannot exceed {MAX_SCHEDULE_HORIZON}"
            )));
        }
        if let Some(spread) = &self.benchmark_spread {
            if spread.spread_pct < Decimal::ZERO {
                return Err(PvCompareError::ConfigError(
                    "benchmark_spread.spread_pct cannot be negative".into(),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rates::Benchmark;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    #[test]
    fn test_defaults() {
        let config = CalculatorConfig::default();
        assert_eq!(config.benchmark_spread, None);
        assert!(!config.tax_gross_up);
        assert_eq!(config.max_installments, 120);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = CalculatorConfig::from_json(
            r#"{"benchmark_spread": {"benchmark": "selic", "spread_pct": "0.10"}}"#,
        )
        .unwrap();
        assert_eq!(config.benchmark_spread, Some(BenchmarkSpread::selic_to_cdi()));
        assert_eq!(config.max_installments, 120);
        assert_eq!(
            config.benchmark_spread.map(|s| s.benchmark),
            Some(Benchmark::Selic)
        );
    }

    #[test]
    fn test_invalid_config_rejected() {
        assert!(CalculatorConfig::from_json(r#"{"max_installments": 0}"#).is_err());

        let config = CalculatorConfig {
            benchmark_spread: Some(BenchmarkSpread {
                benchmark: Benchmark::Cdi,
                spread_pct: dec!(-0.1),
            }),
            ..CalculatorConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(PvCompareError::ConfigError(_))
        ));
    }

    #[test]
    fn test_max_installments_capped_by_schedule_horizon() {
        let config = CalculatorConfig::from_json(r#"{"max_installments": 1200}"#).unwrap();
        assert_eq!(config.max_installments, MAX_SCHEDULE_HORIZON);
        assert!(matches!(
            CalculatorConfig::from_json(r#"{"max_installments": 1201}"#),
            Err(PvCompareError::ConfigError(_))
        ));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            CalculatorConfig::from_json("{not json"),
            Err(PvCompareError::SerializationError(_))
        ));
    }
}

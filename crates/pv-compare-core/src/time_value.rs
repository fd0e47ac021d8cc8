use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use serde::{Deserialize, Serialize};

use crate::error::PvCompareError;
use crate::schedule::CashFlowSchedule;
use crate::types::{Money, Period, Rate};
use crate::PvCompareResult;

/// One schedule entry restated at the reference period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscountedFlow {
    pub period: Period,
    pub amount: Money,
    pub present_value: Money,
}

fn validate_rate(rate: Rate) -> PvCompareResult<()> {
    if rate <= -Decimal::ONE {
        return Err(PvCompareError::InvalidInput {
            field: "monthly_rate".into(),
            reason: "Discount rate must be greater than -100%".into(),
        });
    }
    Ok(())
}

/// Value of `amount` paid at `period`, restated at `reference_period`.
///
/// Flows after the reference period are discounted back, flows before it are
/// compounded forward.
fn restate(
    amount: Money,
    period: Period,
    one_plus_r: Decimal,
    reference_period: i64,
) -> PvCompareResult<Money> {
    if amount.is_zero() {
        return Ok(Decimal::ZERO);
    }

    let exponent = i64::from(period)
        .checked_sub(reference_period)
        .ok_or_else(|| {
            PvCompareError::FinancialImpossibility(format!(
                "Period {period} is too far from reference {reference_period}"
            ))
        })?;
    let factor = one_plus_r
        .checked_powu(exponent.unsigned_abs())
        .ok_or_else(|| {
            PvCompareError::FinancialImpossibility(format!(
                "Discount factor overflows for period {period} at reference {reference_period}"
            ))
        })?;

    let restated = if exponent >= 0 {
        amount.checked_div(factor)
    } else {
        amount.checked_mul(factor)
    };
    restated.ok_or_else(|| {
        PvCompareError::FinancialImpossibility(format!(
            "Present value of period {period} is not representable"
        ))
    })
}

/// Present value of a schedule at `reference_period`:
/// `Σ cf_t / (1 + r)^(t − reference_period)`.
///
/// A zero rate gives the plain sum. Rates at or below −100% are rejected.
pub fn present_value(
    schedule: &CashFlowSchedule,
    monthly_rate: Rate,
    reference_period: i64,
) -> PvCompareResult<Money> {
    validate_rate(monthly_rate)?;

    let one_plus_r = Decimal::ONE + monthly_rate;
    let mut result = Decimal::ZERO;

    for (t, cf) in schedule.iter() {
        let pv = restate(cf, t, one_plus_r, reference_period)?;
        result = result.checked_add(pv).ok_or_else(|| {
            PvCompareError::FinancialImpossibility("Present value sum overflows".into())
        })?;
    }

    Ok(result)
}

/// Per-period breakdown behind [`present_value`].
pub fn discounted_flows(
    schedule: &CashFlowSchedule,
    monthly_rate: Rate,
    reference_period: i64,
) -> PvCompareResult<Vec<DiscountedFlow>> {
    validate_rate(monthly_rate)?;

    let one_plus_r = Decimal::ONE + monthly_rate;
    schedule
        .iter()
        .map(|(t, cf)| {
            Ok(DiscountedFlow {
                period: t,
                amount: cf,
                present_value: restate(cf, t, one_plus_r, reference_period)?,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn schedule(flows: &[Money]) -> CashFlowSchedule {
        CashFlowSchedule::from_flows(flows.to_vec()).unwrap()
    }

    #[test]
    fn test_pv_basic() {
        let s = schedule(&[dec!(0), dec!(110), dec!(121)]);
        // 110/1.1 + 121/1.21 = 200
        let result = present_value(&s, dec!(0.10), 0).unwrap();
        assert!((result - dec!(200)).abs() < dec!(0.0000001));
    }

    #[test]
    fn test_pv_zero_rate_is_plain_sum() {
        let s = schedule(&[dec!(-100), dec!(50), dec!(50), dec!(50)]);
        for reference in [-3, 0, 2, 10] {
            assert_eq!(present_value(&s, Decimal::ZERO, reference).unwrap(), dec!(50));
        }
    }

    #[test]
    fn test_pv_compounds_forward_past_flows() {
        let s = schedule(&[dec!(100)]);
        // 100 paid at 0, valued at period 2: 100 * 1.1^2
        let result = present_value(&s, dec!(0.10), 2).unwrap();
        assert_eq!(result, dec!(121));
    }

    #[test]
    fn test_pv_single_flow_at_reference_is_exact() {
        let s = schedule(&[dec!(0), dec!(0), dec!(0), dec!(333.33)]);
        for rate in [dec!(0), dec!(0.01), dec!(0.5), dec!(-0.5)] {
            assert_eq!(present_value(&s, rate, 3).unwrap(), dec!(333.33));
        }
    }

    #[test]
    fn test_pv_rejects_minus_hundred_percent() {
        let s = schedule(&[dec!(100), dec!(100)]);
        assert!(matches!(
            present_value(&s, dec!(-1), 0),
            Err(PvCompareError::InvalidInput { .. })
        ));
        assert!(discounted_flows(&s, dec!(-1.5), 0).is_err());
    }

    #[test]
    fn test_pv_overflow_is_an_error() {
        let s = schedule(&[dec!(1000000)]);
        let result = present_value(&s, dec!(10), -200);
        assert!(matches!(
            result,
            Err(PvCompareError::FinancialImpossibility(_))
        ));
    }

    #[test]
    fn test_pv_extreme_reference_period_is_an_error() {
        let s = schedule(&[dec!(100), dec!(100)]);
        assert!(matches!(
            present_value(&s, dec!(0.01), i64::MIN),
            Err(PvCompareError::FinancialImpossibility(_))
        ));
        assert!(discounted_flows(&s, dec!(0.01), i64::MIN).is_err());
        assert!(present_value(&s, dec!(0.01), i64::MAX).is_err());
    }

    #[test]
    fn test_discounted_flows_sum_to_present_value() {
        let s = schedule(&[dec!(50), dec!(100), dec!(100), dec!(100)]);
        let rows = discounted_flows(&s, dec!(0.02), 1).unwrap();
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[1].present_value, dec!(100));
        assert_eq!(rows[0].present_value, dec!(51));
        let total: Decimal = rows.iter().map(|r| r.present_value).sum();
        assert_eq!(total, present_value(&s, dec!(0.02), 1).unwrap());
    }
}

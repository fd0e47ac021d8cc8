//! Cash-discount reconciliation between a percentage off and a discounted price.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::PvCompareError;
use crate::types::{pct_to_rate, rate_to_pct, Money, Percent};
use crate::PvCompareResult;

/// Which representation of the discount the user edited last. The edited one
/// is authoritative and the other is derived from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscountEdit {
    PercentEdited,
    PriceEdited,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscountInput {
    /// Percentage off the list price (5 = 5%)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_pct: Option<Percent>,
    /// Price payable today after the discount
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discounted_price: Option<Money>,
    pub last_edited: DiscountEdit,
}

impl DiscountInput {
    pub fn percent(discount_pct: Percent) -> Self {
        DiscountInput {
            discount_pct: Some(discount_pct),
            discounted_price: None,
            last_edited: DiscountEdit::PercentEdited,
        }
    }

    pub fn price(discounted_price: Money) -> Self {
        DiscountInput {
            discount_pct: None,
            discounted_price: Some(discounted_price),
            last_edited: DiscountEdit::PriceEdited,
        }
    }
}

/// Both discount representations, consistent with each other.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciledDiscount {
    pub discount_pct: Percent,
    pub discounted_price: Money,
    /// The authoritative value had to be clamped into range
    pub clamped: bool,
}

/// Derive the non-edited discount field from the edited one.
///
/// Percentages are clamped to [0, 100]; a discounted price is capped to
/// [0, list_price]. With a list price of zero the percentage is zero.
pub fn reconcile_discount(
    list_price: Money,
    input: &DiscountInput,
) -> PvCompareResult<ReconciledDiscount> {
    if list_price < Decimal::ZERO {
        return Err(PvCompareError::invalid(
            "list_price",
            "List price cannot be negative",
        ));
    }

    match input.last_edited {
        DiscountEdit::PercentEdited => {
            let pct = input.discount_pct.ok_or_else(|| {
                PvCompareError::invalid(
                    "discount_pct",
                    "Required when the percentage was edited last",
                )
            })?;
            let clamped_pct = pct.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED);
            let discounted = list_price * (Decimal::ONE - pct_to_rate(clamped_pct));

            Ok(ReconciledDiscount {
                discount_pct: clamped_pct,
                discounted_price: discounted,
                clamped: clamped_pct != pct,
            })
        }
        DiscountEdit::PriceEdited => {
            let price = input.discounted_price.ok_or_else(|| {
                PvCompareError::invalid(
                    "discounted_price",
                    "Required when the discounted price was edited last",
                )
            })?;
            let capped = price.clamp(Decimal::ZERO, list_price);
            let pct = if list_price.is_zero() {
                Decimal::ZERO
            } else {
                rate_to_pct(Decimal::ONE - capped / list_price)
                    .clamp(Decimal::ZERO, Decimal::ONE_HUNDRED)
            };

            Ok(ReconciledDiscount {
                discount_pct: pct,
                discounted_price: capped,
                clamped: capped != price,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_percent_to_price() {
        let r = reconcile_discount(dec!(1000), &DiscountInput::percent(dec!(10))).unwrap();
        assert_eq!(r.discounted_price.round_dp(2), dec!(900.00));
        assert_eq!(r.discount_pct, dec!(10));
        assert!(!r.clamped);
    }

    #[test]
    fn test_price_to_percent() {
        let r = reconcile_discount(dec!(1000), &DiscountInput::price(dec!(900))).unwrap();
        assert_eq!(r.discount_pct.round_dp(2), dec!(10.00));
        assert_eq!(r.discounted_price, dec!(900));
    }

    #[test]
    fn test_flag_decides_precedence_not_values() {
        // Both fields present and inconsistent: the flag picks the winner
        let input = DiscountInput {
            discount_pct: Some(dec!(5)),
            discounted_price: Some(dec!(800)),
            last_edited: DiscountEdit::PriceEdited,
        };
        let r = reconcile_discount(dec!(1000), &input).unwrap();
        assert_eq!(r.discount_pct, dec!(20));

        let input = DiscountInput {
            last_edited: DiscountEdit::PercentEdited,
            ..input
        };
        let r = reconcile_discount(dec!(1000), &input).unwrap();
        assert_eq!(r.discounted_price, dec!(950));
    }

    #[test]
    fn test_percent_clamped() {
        let r = reconcile_discount(dec!(1000), &DiscountInput::percent(dec!(150))).unwrap();
        assert_eq!(r.discount_pct, dec!(100));
        assert_eq!(r.discounted_price, Decimal::ZERO);
        assert!(r.clamped);

        let r = reconcile_discount(dec!(1000), &DiscountInput::percent(dec!(-5))).unwrap();
        assert_eq!(r.discount_pct, Decimal::ZERO);
        assert_eq!(r.discounted_price, dec!(1000));
    }

    #[test]
    fn test_price_capped_at_list_price() {
        let r = reconcile_discount(dec!(1000), &DiscountInput::price(dec!(1200))).unwrap();
        assert_eq!(r.discounted_price, dec!(1000));
        assert_eq!(r.discount_pct, Decimal::ZERO);
        assert!(r.clamped);
    }

    #[test]
    fn test_zero_list_price() {
        let r = reconcile_discount(Decimal::ZERO, &DiscountInput::price(dec!(10))).unwrap();
        assert_eq!(r.discounted_price, Decimal::ZERO);
        assert_eq!(r.discount_pct, Decimal::ZERO);
    }

    #[test]
    fn test_missing_authoritative_field() {
        let input = DiscountInput {
            discount_pct: Some(dec!(5)),
            discounted_price: None,
            last_edited: DiscountEdit::PriceEdited,
        };
        assert!(reconcile_discount(dec!(1000), &input).is_err());
    }

    #[test]
    fn test_negative_list_price_rejected() {
        assert!(reconcile_discount(dec!(-1), &DiscountInput::percent(dec!(5))).is_err());
    }
}

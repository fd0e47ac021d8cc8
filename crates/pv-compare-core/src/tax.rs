use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::rates::DAYS_PER_MONTH;
use crate::types::{Period, Rate};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One tier of the withholding schedule. `max_days: None` is the open-ended
/// final tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxBracket {
    pub max_days: Option<u32>,
    pub rate: Rate,
}

// ---------------------------------------------------------------------------
// Withholding schedule on fixed-income yield
// ---------------------------------------------------------------------------

/// Regressive schedule by holding period, ascending, inclusive upper bounds.
pub const WITHHOLDING_SCHEDULE: &[TaxBracket] = &[
    TaxBracket {
        max_days: Some(180),
        rate: dec!(0.225),
    },
    TaxBracket {
        max_days: Some(360),
        rate: dec!(0.20),
    },
    TaxBracket {
        max_days: Some(720),
        rate: dec!(0.175),
    },
    TaxBracket {
        max_days: None,
        rate: dec!(0.15),
    },
];

/// Withholding rate for yield earned over `days_held` days.
pub fn bracket_rate(days_held: u32) -> Rate {
    WITHHOLDING_SCHEDULE
        .iter()
        .find(|b| b.max_days.map_or(true, |max| days_held <= max))
        .map(|b| b.rate)
        // the last tier is open-ended, so the search always matches
        .unwrap_or(dec!(0.15))
}

/// Days an amount set aside today stays invested until installment `period`.
pub fn holding_days(period: Period) -> u32 {
    period.saturating_mul(DAYS_PER_MONTH)
}

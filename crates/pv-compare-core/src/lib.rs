//! Present-value comparison between paying a price in full today and paying
//! it in installments.
//!
//! All money is `rust_decimal::Decimal`. The pipeline is:
//! [`rates`] → effective monthly rate, [`discount`] → lump-sum price,
//! [`schedule`] → both cash-flow streams (with optional [`tax`] gross-up),
//! [`time_value`] → present values, [`comparison`] → deltas.

pub mod comparison;
pub mod config;
pub mod discount;
pub mod error;
pub mod rates;
pub mod schedule;
pub mod tax;
pub mod time_value;
pub mod types;

pub use config::CalculatorConfig;
pub use error::PvCompareError;
pub use types::*;

/// Standard result type for all pv-compare operations
pub type PvCompareResult<T> = Result<T, PvCompareError>;

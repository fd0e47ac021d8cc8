pub mod compare;
pub mod rates;
pub mod schedule;

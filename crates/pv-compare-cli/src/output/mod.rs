pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use rust_decimal::Decimal;
use serde_json::Value;

/// Arrays of per-period or per-count rows, printed as their own tables.
pub(crate) const ROW_KEYS: [&str; 4] = ["periods", "rows", "lines", "tax_breakdown"];

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// Round a decimal string for human display: rates keep six places,
/// money and percentages two. Anything else passes through.
pub(crate) fn display_decimal(key: &str, s: &str) -> String {
    match s.parse::<Decimal>() {
        Ok(d) if key.ends_with("rate") => d.round_dp(6).normalize().to_string(),
        Ok(d) => format!("{:.2}", d.round_dp(2)),
        Err(_) => s.to_string(),
    }
}

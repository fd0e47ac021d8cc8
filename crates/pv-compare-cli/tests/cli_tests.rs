use assert_cmd::Command;
use predicates::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::Value;
use std::io::Write;

fn pvc() -> Command {
    let mut cmd = Command::cargo_bin("pvc").unwrap();
    // an empty pipe keeps commands on their flags
    cmd.write_stdin("");
    cmd
}

fn run_json(args: &[&str]) -> Value {
    let output = pvc().args(args).output().unwrap();
    assert!(
        output.status.success(),
        "pvc {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).unwrap()
}

fn decimal_at(value: &Value, pointer: &str) -> Decimal {
    let field = value
        .pointer(pointer)
        .unwrap_or_else(|| panic!("missing {pointer} in {value}"));
    field.as_str().unwrap().parse().unwrap()
}

#[test]
fn test_version() {
    pvc()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("pvc "));
}

#[test]
fn test_convert_monthly_rate_passes_through() {
    let out = run_json(&["convert-rate", "--monthly-pct", "1.17"]);
    assert_eq!(decimal_at(&out, "/effective_monthly_rate"), dec!(0.0117));
    assert_eq!(out["converted_annual_pct"], Value::Null);
}

#[test]
fn test_convert_rate_requires_a_rate() {
    pvc()
        .arg("convert-rate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--annual-pct or --monthly-pct"));
}

#[test]
fn test_bracket_boundaries() {
    let out = run_json(&["bracket", "--days", "181"]);
    assert_eq!(decimal_at(&out, "/tax_rate"), dec!(0.20));

    let out = run_json(&["bracket", "--period", "6"]);
    assert_eq!(out["days_held"], 180);
    assert_eq!(decimal_at(&out, "/tax_rate"), dec!(0.225));
}

#[test]
fn test_discount_from_price() {
    let out = run_json(&["discount", "--price", "1000", "--discounted-price", "900"]);
    assert_eq!(decimal_at(&out, "/discount_pct"), dec!(10));
    assert_eq!(out["clamped"], false);
}

#[test]
fn test_discount_both_fields_need_last_edited() {
    pvc()
        .args([
            "discount",
            "--price",
            "1000",
            "--discount-pct",
            "10",
            "--discounted-price",
            "800",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--last-edited"));
}

#[test]
fn test_schedule_with_override() {
    let out = run_json(&[
        "schedule",
        "--price",
        "600",
        "--installments",
        "3",
        "--monthly-pct",
        "1",
        "--override",
        "2=0",
    ]);
    let flows = out["schedule"].as_array().unwrap();
    assert_eq!(flows.len(), 4);
    assert_eq!(decimal_at(&out, "/schedule/1"), dec!(200));
    assert_eq!(decimal_at(&out, "/schedule/2"), Decimal::ZERO);
}

#[test]
fn test_schedule_rejects_malformed_override() {
    pvc()
        .args([
            "schedule",
            "--price",
            "600",
            "--installments",
            "3",
            "--monthly-pct",
            "1",
            "--override",
            "two",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("PERIOD=AMOUNT"));
}

#[test]
fn test_present_value_minimal_output() {
    pvc()
        .args([
            "present-value",
            "--cash-flows",
            "100,100",
            "--monthly-pct",
            "0",
            "--output",
            "minimal",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("200"));
}

#[test]
fn test_present_value_extreme_reference_period_fails_cleanly() {
    pvc()
        .args([
            "present-value",
            "--cash-flows",
            "100,100",
            "--monthly-pct",
            "1",
            "--reference-period",
            "-9223372036854775808",
        ])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("too far from reference"));
}

#[test]
fn test_compare_discounted_lumpsum() {
    let out = run_json(&[
        "compare",
        "--price",
        "1000",
        "--installments",
        "6",
        "--discount-pct",
        "5",
        "--monthly-pct",
        "1.17",
    ]);
    assert_eq!(decimal_at(&out, "/result/pv_lumpsum"), dec!(950));
    assert_eq!(out["result"]["periods"].as_array().unwrap().len(), 7);
    assert_eq!(
        out["methodology"],
        "Present value comparison: installments vs. lump sum"
    );
    let delta = decimal_at(&out, "/result/versus_lumpsum/delta");
    let pv_installment = decimal_at(&out, "/result/pv_installment");
    assert_eq!(delta, pv_installment - dec!(950));
}

#[test]
fn test_compare_rejects_rate_at_minus_hundred() {
    pvc()
        .args([
            "compare",
            "--price",
            "1000",
            "--installments",
            "6",
            "--monthly-pct",
            "-100",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

#[test]
fn test_compare_missing_price() {
    pvc()
        .args(["compare", "--installments", "6", "--monthly-pct", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--price is required"));
}

#[test]
fn test_compare_from_input_file() {
    let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
    write!(
        file,
        r#"{{
            "list_price": "1000",
            "installment_count": 4,
            "rate": {{"kind": "monthly", "monthly_pct": "2"}},
            "reference_period": 4
        }}"#
    )
    .unwrap();

    let path = file.path().to_str().unwrap();
    let out = run_json(&["compare", "--input", path]);
    assert_eq!(out["result"]["reference_period"], 4);
    assert_eq!(decimal_at(&out, "/result/periods/4/installment_pv"), dec!(250));
}

#[test]
fn test_compare_from_stdin() {
    let output = Command::cargo_bin("pvc")
        .unwrap()
        .arg("compare")
        .write_stdin(
            r#"{"list_price": "0", "installment_count": 3,
                "rate": {"kind": "monthly", "monthly_pct": "1"}}"#,
        )
        .output()
        .unwrap();
    assert!(output.status.success());
    let out: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(out["result"]["versus_lumpsum"]["delta_pct"], Value::Null);
}

#[test]
fn test_yaml_config_applies_spread() {
    let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
    writeln!(file, "benchmark_spread:").unwrap();
    writeln!(file, "  benchmark: selic").unwrap();
    writeln!(file, "  spread_pct: \"0.10\"").unwrap();

    let path = file.path().to_str().unwrap();
    let out = run_json(&["--config", path, "convert-rate", "--annual-pct", "15"]);
    assert_eq!(decimal_at(&out, "/converted_annual_pct"), dec!(14.90));
    assert_eq!(decimal_at(&out, "/spread_applied_pct"), dec!(0.10));
}

#[test]
fn test_invalid_config_is_reported() {
    let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
    write!(file, r#"{{"max_installments": 0}}"#).unwrap();

    pvc()
        .args(["--config", file.path().to_str().unwrap(), "bracket", "--days", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("max_installments"));
}

#[test]
fn test_sweep_csv_output() {
    pvc()
        .args([
            "sweep",
            "--price",
            "1200",
            "--max-installments",
            "3",
            "--monthly-pct",
            "1",
            "--output",
            "csv",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("installment_count"))
        .stdout(predicate::str::contains("pv_lumpsum"));
}

#[test]
fn test_compare_table_output() {
    pvc()
        .args([
            "compare",
            "--price",
            "549.90",
            "--installments",
            "6",
            "--monthly-pct",
            "1.17",
            "--output",
            "table",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("pv_installment"))
        .stdout(predicate::str::contains("periods:"));
}

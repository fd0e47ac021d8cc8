use serde_json::Value;

/// Print just the key answer from the output.
///
/// Looks for well-known result fields in order of priority, then falls back
/// to the first field in the result object.
pub fn print_minimal(value: &Value) {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    let priority_keys = [
        "versus_lumpsum",
        "present_value",
        "installment_amount",
        "effective_monthly_rate",
        "tax_rate",
        "discounted_price",
    ];

    if let Value::Object(map) = result_obj {
        for key in &priority_keys {
            if let Some(val) = map.get(*key) {
                if !val.is_null() {
                    println!("{}", format_minimal(val));
                    return;
                }
            }
        }

        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, format_minimal(val));
            return;
        }
    }

    println!("{}", format_minimal(result_obj));
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        // a delta report answers with its absolute difference
        Value::Object(map) if map.contains_key("delta") => map
            .get("delta")
            .map(format_minimal)
            .unwrap_or_default(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}

use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::{display_decimal, ROW_KEYS};

/// Format output as tables using the tabled crate: one Field/Value table for
/// the scalar answers, then one table per row array.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => {
            if let Some(Value::Object(result)) = map.get("result") {
                print_object(result);
                for key in ROW_KEYS {
                    if let Some(Value::Array(rows)) = map.get(key) {
                        print_rows(key, rows);
                    }
                }
                print_envelope(map);
            } else {
                print_object(map);
            }
        }
        Value::Array(arr) => print_rows("rows", arr),
        _ => println!("{}", value),
    }
}

fn print_object(map: &Map<String, Value>) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    let mut fields = Vec::new();
    flatten("", map, &mut fields);
    for (key, val) in fields {
        builder.push_record([key, val]);
    }
    println!("{}", Table::from(builder));

    for key in ROW_KEYS {
        if let Some(Value::Array(rows)) = map.get(key) {
            print_rows(key, rows);
        }
    }
}

/// Nested objects become dotted keys; row arrays are left for their own table.
fn flatten(prefix: &str, map: &Map<String, Value>, out: &mut Vec<(String, String)>) {
    for (key, val) in map {
        if prefix.is_empty() && ROW_KEYS.contains(&key.as_str()) {
            continue;
        }
        let name = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };
        match val {
            Value::Object(inner) => flatten(&name, inner, out),
            _ => out.push((name, format_value(key, val))),
        }
    }
}

fn print_rows(title: &str, rows: &[Value]) {
    println!("\n{}:", title);
    if rows.is_empty() {
        println!("(empty)");
        return;
    }

    if let Some(Value::Object(first)) = rows.first() {
        let headers: Vec<String> = first.keys().cloned().collect();
        let mut builder = Builder::default();
        builder.push_record(&headers);

        for item in rows {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| {
                        map.get(h.as_str())
                            .map(|v| format_value(h, v))
                            .unwrap_or_default()
                    })
                    .collect();
                builder.push_record(row);
            }
        }

        println!("{}", Table::from(builder));
    } else {
        for item in rows {
            println!("{}", format_value(title, item));
        }
    }
}

fn print_envelope(envelope: &Map<String, Value>) {
    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings {
                if let Value::String(s) = w {
                    println!("  - {}", s);
                }
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

fn format_value(key: &str, value: &Value) -> String {
    match value {
        Value::String(s) => display_decimal(key, s),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "n/a".to_string(),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(|v| format_value(key, v)).collect();
            items.join(", ")
        }
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}

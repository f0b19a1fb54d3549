use serde_json::Value;
use tabled::{builder::Builder, Table};

use super::{flatten_record, format_scalar, RECORD_KEYS};

/// Rows beyond which record tables are truncated.
const MAX_ROWS: usize = 50;

/// Format output as tables using the tabled crate.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => {
            if let Some(result) = map.get("result") {
                print_result(result);
                print_envelope_notes(map);
            } else {
                print_result(value);
            }
        }
        Value::Array(arr) => print_array_table(arr),
        _ => println!("{}", value),
    }
}

fn print_result(result: &Value) {
    let Value::Object(map) = result else {
        println!("{}", format_scalar(result));
        return;
    };

    // Scalars and nested summaries as one field/value table; index-aligned
    // series are reported by length only.
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in flatten_record(result) {
        if RECORD_KEYS.contains(&key.as_str()) {
            continue;
        }
        let shown = match &val {
            Value::Array(arr) => format!("({} values)", arr.len()),
            other => format_scalar(other),
        };
        builder.push_record([key, shown]);
    }
    println!("{}", Table::from(builder));

    for key in RECORD_KEYS {
        if let Some(Value::Array(arr)) = map.get(key) {
            if !arr.is_empty() {
                println!("\n{} ({}):", key, arr.len());
                print_array_table(arr);
            }
        }
    }
}

fn print_envelope_notes(envelope: &serde_json::Map<String, Value>) {
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

fn print_array_table(arr: &[Value]) {
    let Some(first) = arr.first() else {
        println!("(empty)");
        return;
    };

    if first.is_object() {
        let headers: Vec<String> = flatten_record(first).into_iter().map(|(k, _)| k).collect();
        let mut builder = Builder::default();
        builder.push_record(headers.clone());

        for item in arr.iter().take(MAX_ROWS) {
            let flat = flatten_record(item);
            let row: Vec<String> = headers
                .iter()
                .map(|h| {
                    flat.iter()
                        .find(|(k, _)| k == h)
                        .map(|(_, v)| format_scalar(v))
                        .unwrap_or_default()
                })
                .collect();
            builder.push_record(row);
        }

        println!("{}", Table::from(builder));
        if arr.len() > MAX_ROWS {
            println!("... {} more rows (use --output csv for all)", arr.len() - MAX_ROWS);
        }
    } else {
        for item in arr {
            println!("{}", format_scalar(item));
        }
    }
}

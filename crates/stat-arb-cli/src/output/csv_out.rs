use serde_json::Value;
use std::io;

use super::{flatten_record, format_scalar, result_of, RECORD_KEYS};

/// Write output as CSV to stdout.
///
/// The first non-empty record array (trades, screened pairs, sweep runs)
/// becomes the table; otherwise the flattened result as field/value rows.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());
    let result = result_of(value);

    let records = RECORD_KEYS.iter().find_map(|k| match result.get(*k) {
        Some(Value::Array(arr)) if !arr.is_empty() => Some(arr),
        _ => None,
    });

    match (records, result) {
        (Some(arr), _) => write_array_csv(&mut wtr, arr),
        (None, Value::Object(_)) => {
            let _ = wtr.write_record(["field", "value"]);
            for (key, val) in flatten_record(result) {
                if !val.is_array() {
                    let _ = wtr.write_record([key.as_str(), &format_scalar(&val)]);
                }
            }
        }
        (None, Value::Array(arr)) => write_array_csv(&mut wtr, arr),
        (None, other) => {
            let _ = wtr.write_record([&format_scalar(other)]);
        }
    }

    let _ = wtr.flush();
}

fn write_array_csv<W: io::Write>(wtr: &mut csv::Writer<W>, arr: &[Value]) {
    let Some(first) = arr.first() else {
        return;
    };

    if first.is_object() {
        let headers: Vec<String> = flatten_record(first).into_iter().map(|(k, _)| k).collect();
        let _ = wtr.write_record(&headers);

        for item in arr {
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
            let _ = wtr.write_record(&row);
        }
    } else {
        for item in arr {
            let _ = wtr.write_record([&format_scalar(item)]);
        }
    }
}

use serde_json::Value;

use super::result_of;

/// Print just the key answer value from the output.
///
/// Heuristic: look for well-known result fields in order of priority,
/// first on the result itself and then inside its `summary`, then fall
/// back to the first scalar field.
pub fn print_minimal(value: &Value) {
    println!("{}", minimal_line(result_of(value)));
}

fn minimal_line(result: &Value) -> String {
    // Priority list of key output fields
    let priority_keys = [
        "total_profit",
        "cointegrated_count",
        "runs",
        "trade_count",
        "adf_statistic",
    ];

    let scopes = [Some(result), result.get("summary")];
    for scope in scopes.into_iter().flatten() {
        for key in &priority_keys {
            if let Some(val) = scope.get(*key) {
                if !val.is_null() {
                    return format_minimal(val);
                }
            }
        }
    }

    if let Value::Object(map) = result {
        if let Some((key, val)) = map.iter().find(|(_, v)| !v.is_array() && !v.is_object()) {
            return format!("{}: {}", key, format_minimal(val));
        }
    }

    format_minimal(result)
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_backtest_prints_total_profit() {
        let v = json!({"asset1": "GLD", "summary": {"trade_count": 4, "total_profit": "152.5"}});
        assert_eq!(minimal_line(&v), "152.5");
    }

    #[test]
    fn test_screen_prints_cointegrated_count() {
        let v = json!({"pairs": [], "cointegrated_count": 2, "critical_value": "-3.34"});
        assert_eq!(minimal_line(&v), "2");
    }

    #[test]
    fn test_fallback_to_first_scalar() {
        let v = json!({"series": [1, 2], "label": "x"});
        assert_eq!(minimal_line(&v), "label: x");
    }
}

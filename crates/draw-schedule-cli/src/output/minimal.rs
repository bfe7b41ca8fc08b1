use serde_json::Value;

use super::format_value;

/// Print just the key answer value from the output: the final balance for a
/// schedule, the consistency flag for a verification, the path for a workbook.
pub fn print_minimal(value: &Value) {
    println!("{}", minimal_text(value));
}

pub fn minimal_text(value: &Value) -> String {
    let result = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    if let Some(balance) = result.get("summary").and_then(|s| s.get("final_balance")) {
        return format_value(balance);
    }

    for key in ["consistent", "path"] {
        if let Some(val) = result.get(key).filter(|v| !v.is_null()) {
            return format_value(val);
        }
    }

    if let Some((key, val)) = result.as_object().and_then(|m| m.iter().next()) {
        return format!("{}: {}", key, format_value(val));
    }

    format_value(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_final_balance_wins() {
        let value = json!({ "result": { "rows": [], "summary": { "final_balance": "103030.1" } } });
        assert_eq!(minimal_text(&value), "103030.1");
    }

    #[test]
    fn test_verification_flag() {
        let value = json!({ "result": { "cells_checked": 10, "consistent": true } });
        assert_eq!(minimal_text(&value), "true");
    }
}

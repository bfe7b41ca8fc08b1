pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use draw_schedule_core::schedule::table::COLUMNS;
use serde_json::{Map, Value};

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => json::print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// Header order for an array of row objects: schedule columns first, in
/// display order, then any other keys.
pub fn column_order(first: &Map<String, Value>) -> Vec<String> {
    let mut headers: Vec<String> = COLUMNS
        .iter()
        .filter(|c| first.contains_key(**c))
        .map(|c| c.to_string())
        .collect();
    for key in first.keys() {
        if !headers.contains(key) {
            headers.push(key.clone());
        }
    }
    headers
}

pub fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(format_value).collect();
            items.join(", ")
        }
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_column_order_follows_schedule_columns() {
        let row = json!({
            "Ending Balance": "1.00",
            "Period": 1,
            "Date": "2024-02-29",
            "Paydown": "0.00",
            "note": "x",
        });
        let order = column_order(row.as_object().unwrap());
        assert_eq!(order, vec!["Period", "Date", "Paydown", "Ending Balance", "note"]);
    }
}

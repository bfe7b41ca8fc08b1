use serde_json::Value;
use std::io;

use super::{column_order, format_value};

/// Write output as CSV to stdout.
///
/// Schedule output becomes one record per period; anything else is written
/// as two-column field/value pairs.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());
    write_csv(&mut wtr, value);
    let _ = wtr.flush();
}

pub fn write_csv<W: io::Write>(wtr: &mut csv::Writer<W>, value: &Value) {
    let result = value.get("result").unwrap_or(value);
    match result {
        Value::Object(map) => {
            if let Some(Value::Array(rows)) = map.get("rows") {
                write_array_csv(wtr, rows);
            } else if let Some(Value::Array(rows)) = map.get("mismatches").filter(|m| {
                m.as_array().is_some_and(|a| !a.is_empty())
            }) {
                write_array_csv(wtr, rows);
            } else {
                let _ = wtr.write_record(["field", "value"]);
                for (key, val) in map {
                    let _ = wtr.write_record([key.as_str(), &format_value(val)]);
                }
            }
        }
        Value::Array(arr) => write_array_csv(wtr, arr),
        _ => {
            let _ = wtr.write_record([&format_value(result)]);
        }
    }
}

fn write_array_csv<W: io::Write>(wtr: &mut csv::Writer<W>, arr: &[Value]) {
    if let Some(Value::Object(first)) = arr.first() {
        let headers = column_order(first);
        let _ = wtr.write_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(h.as_str()).map(format_value).unwrap_or_default())
                    .collect();
                let _ = wtr.write_record(&row);
            }
        }
    } else {
        for item in arr {
            let _ = wtr.write_record([&format_value(item)]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_schedule_rows_as_records() {
        let value = json!({
            "result": {
                "rows": [
                    { "Period": 1, "Date": "2024-01-31", "Ending Balance": "101000.00" },
                    { "Period": 2, "Date": "2024-02-29", "Ending Balance": "102010.00" }
                ],
                "summary": { "final_balance": "102010" }
            }
        });
        let mut wtr = csv::Writer::from_writer(Vec::new());
        write_csv(&mut wtr, &value);
        let text = String::from_utf8(wtr.into_inner().unwrap()).unwrap();
        assert_eq!(
            text,
            "Period,Date,Ending Balance\n1,2024-01-31,101000.00\n2,2024-02-29,102010.00\n"
        );
    }
}

pub mod csv_out;
pub mod json;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
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

/// The `result` object of an output envelope, if there is one.
pub(crate) fn result_object(value: &Value) -> Option<&Map<String, Value>> {
    value.get("result").and_then(Value::as_object)
}

/// Series pivoted into rows: one row per bucket key, one column per series.
/// Keys keep the order they first appear in.
pub(crate) fn pivot_series(series: &[Value]) -> (Vec<String>, Vec<Vec<String>>) {
    let mut headers = vec!["key".to_string(), "label".to_string()];
    let mut keys: Vec<(String, String)> = Vec::new();

    for s in series {
        headers.push(
            s.get("display_name")
                .and_then(Value::as_str)
                .unwrap_or("value")
                .to_string(),
        );
        for p in points(s) {
            let key = p.get("key").and_then(Value::as_str).unwrap_or_default();
            if !keys.iter().any(|(k, _)| k == key) {
                let label = p.get("label").and_then(Value::as_str).unwrap_or(key);
                keys.push((key.to_string(), label.to_string()));
            }
        }
    }

    let rows = keys
        .into_iter()
        .map(|(key, label)| {
            let mut row = vec![key.clone(), label];
            for s in series {
                let value = points(s)
                    .iter()
                    .find(|p| p.get("key").and_then(Value::as_str) == Some(key.as_str()))
                    .and_then(|p| p.get("value"))
                    .map(scalar)
                    .unwrap_or_default();
                row.push(value);
            }
            row
        })
        .collect();

    (headers, rows)
}

fn points(series: &Value) -> &[Value] {
    series
        .get("points")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

/// Plain text of a scalar; objects and arrays as compact JSON.
pub(crate) fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}

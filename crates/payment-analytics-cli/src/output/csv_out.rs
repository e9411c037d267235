use serde_json::Value;
use std::io;

use super::{pivot_series, result_object, scalar};

/// Write the result as CSV to stdout.
///
/// Charts become one row per bucket key with a column per series; filter
/// output becomes the raw transaction list, ready for export.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    match result_object(value) {
        Some(result) => {
            if let Some(Value::Array(series)) = result.get("series") {
                let (headers, rows) = pivot_series(series);
                let _ = wtr.write_record(&headers);
                for row in &rows {
                    let _ = wtr.write_record(row);
                }
            } else if let Some(Value::Array(txs)) = result.get("transactions") {
                write_object_array(&mut wtr, txs);
            } else {
                let _ = wtr.write_record(["field", "value"]);
                for (key, val) in result {
                    let _ = wtr.write_record([key.as_str(), &scalar(val)]);
                }
            }
        }
        None => {
            let _ = wtr.write_record([&scalar(value)]);
        }
    }

    let _ = wtr.flush();
}

fn write_object_array(wtr: &mut csv::Writer<io::StdoutLock<'_>>, arr: &[Value]) {
    let Some(Value::Object(first)) = arr.first() else {
        return;
    };
    let headers: Vec<&str> = first.keys().map(String::as_str).collect();
    let _ = wtr.write_record(&headers);

    for map in arr.iter().filter_map(Value::as_object) {
        let row: Vec<String> = headers
            .iter()
            .map(|h| map.get(*h).map(scalar).unwrap_or_default())
            .collect();
        let _ = wtr.write_record(&row);
    }
}

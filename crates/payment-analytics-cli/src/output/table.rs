use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::{pivot_series, result_object, scalar};

/// Print the result as tables: the series pivot for charts, the transaction
/// list for filter output, field/value pairs for everything else.
pub fn print_table(value: &Value) {
    let Some(result) = result_object(value) else {
        println!("{}", scalar(value));
        return;
    };

    if let Some(Value::Array(series)) = result.get("series") {
        let (headers, rows) = pivot_series(series);
        print_rows(&headers, &rows);
    } else if let Some(Value::Array(txs)) = result.get("transactions") {
        print_object_array(txs);
    }

    if let Some(Value::Object(summary)) = result.get("summary") {
        println!("\nSummary:");
        print_fields(summary);
    }

    if !result.contains_key("series") && !result.contains_key("transactions") {
        print_fields(result);
    }

    print_envelope_notes(value);
}

fn print_rows(headers: &[String], rows: &[Vec<String>]) {
    if rows.is_empty() {
        println!("(no data)");
        return;
    }
    let mut builder = Builder::default();
    builder.push_record(headers);
    for row in rows {
        builder.push_record(row);
    }
    println!("{}", Table::from(builder));
}

fn print_object_array(arr: &[Value]) {
    let Some(Value::Object(first)) = arr.first() else {
        println!("(no transactions)");
        return;
    };
    let headers: Vec<String> = first.keys().cloned().collect();
    let rows: Vec<Vec<String>> = arr
        .iter()
        .filter_map(Value::as_object)
        .map(|map| {
            headers
                .iter()
                .map(|h| map.get(h).map(scalar).unwrap_or_default())
                .collect()
        })
        .collect();
    print_rows(&headers, &rows);
}

fn print_fields(map: &Map<String, Value>) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in map {
        builder.push_record([key.clone(), scalar(val)]);
    }
    println!("{}", Table::from(builder));
}

fn print_envelope_notes(value: &Value) {
    if let Some(Value::Array(warnings)) = value.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings.iter().filter_map(Value::as_str) {
                println!("  - {}", w);
            }
        }
    }

    if let Some(Value::String(meth)) = value.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

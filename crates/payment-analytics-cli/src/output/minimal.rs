use serde_json::Value;

use super::{result_object, scalar};

/// Print only the headline numbers.
///
/// Charts print one line per series (`name: key=value, ...`); other results
/// print the summary's count and volume.
pub fn print_minimal(value: &Value) {
    let Some(result) = result_object(value) else {
        println!("{}", scalar(value));
        return;
    };

    if let Some(Value::Array(series)) = result.get("series") {
        for s in series {
            let name = s.get("display_name").and_then(Value::as_str).unwrap_or("series");
            let points: Vec<String> = s
                .get("points")
                .and_then(Value::as_array)
                .map(|pts| {
                    pts.iter()
                        .map(|p| {
                            format!(
                                "{}={}",
                                p.get("key").map(scalar).unwrap_or_default(),
                                p.get("value").map(scalar).unwrap_or_default()
                            )
                        })
                        .collect()
                })
                .unwrap_or_default();
            println!("{}: {}", name, points.join(", "));
        }
        return;
    }

    // Priority list of headline fields
    let priority_keys = ["transaction_count", "total_volume", "refund_percent", "policy_count"];
    let source = result
        .get("summary")
        .and_then(Value::as_object)
        .unwrap_or(result);
    for key in priority_keys {
        if let Some(val) = source.get(key) {
            println!("{}: {}", key, scalar(val));
        }
    }
}

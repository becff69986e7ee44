use serde_json::Value;

use super::scalar;

/// Print just the key answer value from the output.
///
/// Looks for the bottom line in the summary (or the projection total),
/// then falls back to the first field of the result object.
pub fn print_minimal(value: &Value) {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    let headline = result_obj
        .get("summary")
        .or_else(|| result_obj.get("total"))
        .unwrap_or(result_obj);

    let priority_keys = ["net_profit", "profit_before_tax", "revenue"];

    if let Value::Object(map) = headline {
        for key in &priority_keys {
            if let Some(val) = map.get(*key) {
                if !val.is_null() {
                    println!("{}", scalar(val));
                    return;
                }
            }
        }

        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, scalar(val));
            return;
        }
    }

    println!("{}", scalar(result_obj));
}

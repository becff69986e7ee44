use serde_json::Value;
use std::io;

use super::{lookup, scalar, STATEMENT_COLUMNS};

type StdoutWriter<'a> = csv::Writer<io::StdoutLock<'a>>;

/// Write output as CSV to stdout.
///
/// Entity rows win over summaries: zones for a brand, months for a
/// projection, routes for a fleet costing. Anything else falls back to a
/// two-column `field,value` listing.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    let result = value.get("result").unwrap_or(value);
    match result {
        Value::Object(map) => {
            if let Some(Value::Array(zones)) = map.get("zones") {
                write_statements(&mut wtr, zones);
            } else if let Some(Value::Array(months)) = map.get("months") {
                write_months(&mut wtr, months);
            } else if let Some(Value::Array(routes)) = map.get("routes") {
                write_array_csv(&mut wtr, routes);
            } else if let Some(Value::Object(summary)) = map.get("summary") {
                write_fields(&mut wtr, summary);
            } else {
                write_fields(&mut wtr, map);
            }
        }
        Value::Array(arr) => write_array_csv(&mut wtr, arr),
        _ => {
            let _ = wtr.write_record([scalar(result)]);
        }
    }

    let _ = wtr.flush();
}

fn write_fields(wtr: &mut StdoutWriter<'_>, map: &serde_json::Map<String, Value>) {
    let _ = wtr.write_record(["field", "value"]);
    for (key, val) in map {
        let _ = wtr.write_record([key.as_str(), &scalar(val)]);
    }
}

fn write_statements(wtr: &mut StdoutWriter<'_>, rows: &[Value]) {
    let _ = wtr.write_record(STATEMENT_COLUMNS.map(|(h, _)| h));
    for row in rows {
        let record = STATEMENT_COLUMNS.map(|(_, path)| lookup(row, path).map(scalar).unwrap_or_default());
        let _ = wtr.write_record(&record);
    }
}

fn write_months(wtr: &mut StdoutWriter<'_>, months: &[Value]) {
    const FIELDS: [&str; 4] = ["revenue", "profit_before_tax", "income_tax", "net_profit"];
    let _ = wtr.write_record(["period", FIELDS[0], FIELDS[1], FIELDS[2], FIELDS[3]]);
    for m in months {
        let period = lookup(m, &["period", "month"])
            .or_else(|| m.get("period"))
            .map(scalar)
            .unwrap_or_default();
        let mut record = vec![period];
        record.extend(FIELDS.map(|f| lookup(m, &["summary", f]).map(scalar).unwrap_or_default()));
        let _ = wtr.write_record(&record);
    }
}

fn write_array_csv(wtr: &mut StdoutWriter<'_>, arr: &[Value]) {
    if arr.is_empty() {
        return;
    }

    // Extract headers from first object
    if let Some(Value::Object(first)) = arr.first() {
        let headers: Vec<&str> = first.keys().map(|k| k.as_str()).collect();
        let _ = wtr.write_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(*h).map(scalar).unwrap_or_default())
                    .collect();
                let _ = wtr.write_record(&row);
            }
        }
    } else {
        for item in arr {
            let _ = wtr.write_record([scalar(item)]);
        }
    }
}

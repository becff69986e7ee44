use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::{lookup, scalar, STATEMENT_COLUMNS};

const ROUTE_COLUMNS: [&str; 9] = [
    "route_id",
    "vehicle_id",
    "km_per_month",
    "fuel",
    "tolls",
    "overnight",
    "base_freight",
    "fixed_share",
    "total",
];

/// Format output as tables using the tabled crate.
pub fn print_table(value: &Value) {
    match value.as_object() {
        Some(envelope) if envelope.contains_key("result") => {
            print_result(&envelope["result"]);
            print_footer(envelope);
        }
        Some(map) => print_fields(map),
        None => println!("{}", value),
    }
}

fn print_result(result: &Value) {
    let Some(map) = result.as_object() else {
        println!("{}", scalar(result));
        return;
    };

    if let Some(Value::Object(summary)) = map.get("summary") {
        print_section("Summary", summary_table(summary));
    }
    if let Some(Value::Array(brands)) = map.get("brands") {
        let mut builder = Builder::default();
        builder.push_record(["brand_id", "brand_name", "revenue", "net_profit", "net_margin_pct"]);
        for b in brands {
            builder.push_record([
                cell(b, &["brand_id"]),
                cell(b, &["brand_name"]),
                cell(b, &["summary", "revenue"]),
                cell(b, &["summary", "net_profit"]),
                cell(b, &["summary", "net_margin_pct"]),
            ]);
        }
        print_section("Brands", Table::from(builder));
    }
    for (key, title) in [
        ("operations", "Operations"),
        ("zones", "Zones"),
        ("municipalities", "Municipalities"),
    ] {
        if let Some(Value::Array(rows)) = map.get(key) {
            print_section(title, statement_table(rows));
        }
    }
    if let Some(Value::Array(months)) = map.get("months") {
        let mut builder = Builder::default();
        builder.push_record(["period", "revenue", "profit_before_tax", "income_tax", "net_profit"]);
        for m in months {
            builder.push_record([
                period_label(m.get("period")),
                cell(m, &["summary", "revenue"]),
                cell(m, &["summary", "profit_before_tax"]),
                cell(m, &["summary", "income_tax"]),
                cell(m, &["summary", "net_profit"]),
            ]);
        }
        print_section("Months", Table::from(builder));
        if let Some(Value::Object(total)) = map.get("total") {
            print_section("Year", summary_table(total));
        }
    }
    if let Some(Value::Array(routes)) = map.get("routes") {
        let mut builder = Builder::default();
        builder.push_record(ROUTE_COLUMNS);
        for r in routes {
            builder.push_record(ROUTE_COLUMNS.map(|c| cell(r, &[c])));
        }
        print_section("Routes", Table::from(builder));
    }
    if let Some(Value::Array(checks)) = map.get("participation") {
        let mut builder = Builder::default();
        builder.push_record(["parent_level", "parent_id", "level", "sum", "valid"]);
        for c in checks {
            builder.push_record(["parent_level", "parent_id", "level", "sum", "valid"].map(|k| cell(c, &[k])));
        }
        print_section("Participation", Table::from(builder));
    }
}

fn summary_table(summary: &Map<String, Value>) -> Table {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in summary {
        match val {
            Value::Object(costs) => {
                for (category, detail) in costs {
                    let shown = detail.get("total").unwrap_or(detail);
                    builder.push_record([format!("{key}.{category}"), scalar(shown)]);
                }
            }
            _ => builder.push_record([key.clone(), scalar(val)]),
        }
    }
    Table::from(builder)
}

fn statement_table(rows: &[Value]) -> Table {
    let mut builder = Builder::default();
    builder.push_record(STATEMENT_COLUMNS.map(|(h, _)| h));
    for row in rows {
        builder.push_record(STATEMENT_COLUMNS.map(|(_, path)| cell(row, path)));
    }
    Table::from(builder)
}

fn cell(value: &Value, path: &[&str]) -> String {
    lookup(value, path).map(scalar).unwrap_or_default()
}

/// "annual", or the month name of `{"month": "March"}`.
fn period_label(period: Option<&Value>) -> String {
    match period {
        Some(Value::Object(m)) => m.get("month").map(scalar).unwrap_or_default(),
        Some(v) => scalar(v),
        None => String::new(),
    }
}

fn print_section(title: &str, table: Table) {
    println!("{}\n{}\n", title, table);
}

fn print_fields(map: &Map<String, Value>) {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in map {
        builder.push_record([key.as_str(), &scalar(val)]);
    }
    println!("{}", Table::from(builder));
}

fn print_footer(envelope: &Map<String, Value>) {
    // Print warnings if any
    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("Warnings:");
            for w in warnings.iter().filter_map(Value::as_str) {
                println!("  - {}", w);
            }
        }
    }

    // Print methodology
    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

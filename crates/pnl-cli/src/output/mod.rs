pub mod csv_out;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::Value;
use std::io::{self, Write};

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// Pretty-print JSON to stdout.
fn print_json(value: &Value) {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    if let Err(e) = serde_json::to_writer_pretty(&mut out, value) {
        eprintln!("JSON serialization error: {}", e);
        return;
    }
    let _ = writeln!(out);
}

/// Columns shown for per-entity statements, as (header, path under the row).
pub(crate) const STATEMENT_COLUMNS: [(&str, &[&str]); 9] = [
    ("id", &["id"]),
    ("name", &["name"]),
    ("revenue", &["statement", "revenue"]),
    ("gross_margin", &["statement", "gross_margin"]),
    ("route_costs", &["statement", "costs", "route_costs"]),
    ("ica", &["statement", "ica"]),
    ("profit_before_tax", &["statement", "profit_before_tax"]),
    ("net_profit", &["statement", "net_profit"]),
    ("net_margin_pct", &["statement", "net_margin_pct"]),
];

/// Follow `path` through nested objects.
pub(crate) fn lookup<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(value, |v, key| v.get(*key))
}

/// Scalar rendering shared by the table and CSV writers.
pub(crate) fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}

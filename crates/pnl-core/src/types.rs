use chrono::Month;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Rates expressed as decimals (0.05 = 5%). Used for ICA and income tax.
pub type Rate = Decimal;

/// Percentages expressed on a 0–100 scale. Used for participations,
/// discount tiers and rebates, which are configured that way upstream.
pub type Percent = Decimal;

/// Entity identifiers as issued by the configuration layer.
pub type EntityId = u32;

/// The slice of the year a computation covers.
///
/// Always passed explicitly; the engine keeps no "current month" state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Period {
    Month(Month),
    #[default]
    Annual,
}

impl Period {
    /// Every calendar month, January first.
    pub fn months() -> [Period; 12] {
        [
            Month::January,
            Month::February,
            Month::March,
            Month::April,
            Month::May,
            Month::June,
            Month::July,
            Month::August,
            Month::September,
            Month::October,
            Month::November,
            Month::December,
        ]
        .map(Period::Month)
    }

    /// Multiplier turning a monthly cost into this period's cost.
    pub fn cost_factor(&self) -> Decimal {
        match self {
            Period::Month(_) => Decimal::ONE,
            Period::Annual => Decimal::from(12),
        }
    }

    /// Zero-based index into a 12-value monthly series.
    pub fn month_index(&self) -> Option<usize> {
        match self {
            Period::Month(m) => Some(m.number_from_month() as usize - 1),
            Period::Annual => None,
        }
    }

    /// Parse `annual`, a month name (`march`, `mar`) or a month number (`3`).
    pub fn parse(s: &str) -> Option<Period> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("annual") || trimmed.eq_ignore_ascii_case("year") {
            return Some(Period::Annual);
        }
        if let Ok(n) = trimmed.parse::<u8>() {
            return Month::try_from(n).ok().map(Period::Month);
        }
        trimmed.parse::<Month>().ok().map(Period::Month)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Period::Month(m) => write!(f, "{}", m.name()),
            Period::Annual => write!(f, "Annual"),
        }
    }
}

/// Hierarchy level an output record or check refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityLevel {
    Brand,
    Operation,
    Zone,
    Municipality,
    Rubro,
    Route,
    Vehicle,
}

impl fmt::Display for EntityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EntityLevel::Brand => "brand",
            EntityLevel::Operation => "operation",
            EntityLevel::Zone => "zone",
            EntityLevel::Municipality => "municipality",
            EntityLevel::Rubro => "rubro",
            EntityLevel::Route => "route",
            EntityLevel::Vehicle => "vehicle",
        };
        f.write_str(label)
    }
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}

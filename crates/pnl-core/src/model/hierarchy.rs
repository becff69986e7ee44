//! Brand → Operation → Zone → Municipality.
//!
//! Parent links are plain ids. The two many-to-many relations (brand in
//! operation, municipality in zone) are explicit association records so the
//! weight they carry is never inferred from ordering.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::commercial::DiscountConfig;
use crate::types::{EntityId, Money, Percent, Period, Rate};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Brand {
    pub id: EntityId,
    pub name: String,
    /// Projected sales, January to December.
    pub monthly_revenue: Vec<Money>,
    pub discount: DiscountConfig,
}

impl Brand {
    /// Revenue for one month, or the sum of the series for the year.
    ///
    /// A series that is not exactly twelve non-negative values is a data
    /// error; the caller decides whether to skip the brand.
    pub fn revenue_for(&self, period: Period) -> Result<Money, String> {
        if self.monthly_revenue.len() != 12 {
            return Err(format!(
                "monthly revenue series has {} values, expected 12",
                self.monthly_revenue.len()
            ));
        }
        if let Some((i, v)) = self
            .monthly_revenue
            .iter()
            .enumerate()
            .find(|(_, v)| **v < Decimal::ZERO)
        {
            return Err(format!("negative revenue {} in month {}", v, i + 1));
        }
        Ok(match period.month_index() {
            Some(idx) => self.monthly_revenue[idx],
            None => self.monthly_revenue.iter().copied().sum(),
        })
    }
}

/// Share of a brand's revenue attributed to one operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrandOperation {
    pub brand_id: EntityId,
    pub operation_id: EntityId,
    pub participation: Percent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Operation {
    pub id: EntityId,
    pub name: String,
    pub code: String,
    /// Municipal gross-revenue tax, as a decimal rate (0.00966 = 9.66 per mil).
    pub ica_rate: Rate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Zone {
    pub id: EntityId,
    pub name: String,
    pub operation_id: EntityId,
    pub participation_in_operation: Percent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Municipality {
    pub id: EntityId,
    pub name: String,
    /// Administrative (DANE-style) code.
    pub code: String,
}

/// A zone serving a municipality.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneCoverage {
    pub zone_id: EntityId,
    pub municipality_id: EntityId,
    /// Relative weight of the municipality within the zone's revenue.
    pub participation_in_zone: Percent,
    /// Weight used by the `coverage_weight` zone split policy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coverage_weight: Option<Decimal>,
}

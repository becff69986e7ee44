//! Simulation policy: every knob that changes how the engine resolves an
//! ambiguous configuration. All fields default, so an empty document is a
//! valid policy.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::PnlError;
use crate::types::Percent;
use crate::PnlResult;

/// How raw participation weights are turned into shares.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipationMode {
    /// share = parent * weight / 100; the largest child absorbs any gap.
    #[default]
    AsIs,
    /// share = parent * weight / sum(weights).
    Normalize,
}

/// What to do with a shared rubro whose criterion yields no usable weight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZeroWeightPolicy {
    /// Leave it unallocated and report it as a configuration error.
    #[default]
    Flag,
    /// Split it equally across the target zones.
    EqualSplit,
}

/// How a municipality's logistics cost is split between the zones serving it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneSplitPolicy {
    /// By the municipality's revenue inside each zone. Falls back to an
    /// equal split when it has no revenue anywhere.
    #[default]
    RevenueWeighted,
    /// One equal share per serving zone.
    Equal,
    /// By the `coverage_weight` carried on each coverage association.
    CoverageWeight,
}

/// Driver used to spread a vehicle's fixed cost over its routes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixedCostBasis {
    /// Monthly kilometres driven on each route.
    #[default]
    Distance,
    /// Monthly trips on each route.
    Trips,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationPolicy {
    /// Accepted deviation of a participation sum from 100, in points.
    pub participation_tolerance: Percent,
    pub participation_mode: ParticipationMode,
    pub zero_weight: ZeroWeightPolicy,
    pub zone_split: ZoneSplitPolicy,
    pub fixed_cost_basis: FixedCostBasis,
    /// Used to convert per-day route frequencies.
    pub working_days_per_month: Decimal,
    /// Decimal places allocated shares are rounded to (0 = currency units).
    pub rounding_dp: u32,
    /// Abort on reconciliation anomalies instead of recording them.
    pub strict_invariants: bool,
}

impl Default for SimulationPolicy {
    fn default() -> Self {
        Self {
            participation_tolerance: dec!(0.5),
            participation_mode: ParticipationMode::AsIs,
            zero_weight: ZeroWeightPolicy::Flag,
            zone_split: ZoneSplitPolicy::RevenueWeighted,
            fixed_cost_basis: FixedCostBasis::Distance,
            working_days_per_month: dec!(24),
            rounding_dp: 0,
            strict_invariants: false,
        }
    }
}

impl SimulationPolicy {
    pub fn validate(&self) -> PnlResult<()> {
        if self.participation_tolerance < Decimal::ZERO {
            return Err(PnlError::InvalidInput {
                field: "participation_tolerance".into(),
                reason: "Tolerance must be non-negative.".into(),
            });
        }
        if self.working_days_per_month <= Decimal::ZERO
            || self.working_days_per_month > dec!(31)
        {
            return Err(PnlError::InvalidInput {
                field: "working_days_per_month".into(),
                reason: "Working days per month must be in (0, 31].".into(),
            });
        }
        if self.rounding_dp > 6 {
            return Err(PnlError::InvalidInput {
                field: "rounding_dp".into(),
                reason: "At most 6 decimal places are supported.".into(),
            });
        }
        Ok(())
    }
}

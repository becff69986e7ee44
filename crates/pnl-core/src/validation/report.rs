//! Non-fatal findings collected while a brand is simulated.
//!
//! Configuration warnings and entity-scoped data errors never stop the run.
//! Reconciliation anomalies are recorded too, unless the policy asks for
//! strict invariants, in which case they surface as [`PnlError`].

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::participation::ParticipationCheck;
use crate::error::PnlError;
use crate::types::{EntityId, EntityLevel, Money, Percent, Period};
use crate::PnlResult;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConfigWarning {
    ParticipationOutOfTolerance {
        level: EntityLevel,
        parent_level: EntityLevel,
        parent_id: EntityId,
        sum: Percent,
    },
    NoChildren {
        level: EntityLevel,
        parent_level: EntityLevel,
        parent_id: EntityId,
    },
    Undistributed {
        level: EntityLevel,
        parent_id: EntityId,
        amount: Money,
    },
    UncoveredMunicipality {
        municipality_id: EntityId,
        unattributed_cost: Money,
    },
    ZoneSplitFallback {
        municipality_id: EntityId,
    },
    MunicipalityWithoutZone {
        municipality_id: EntityId,
    },
    UnallocatedRubro {
        rubro_id: EntityId,
        value: Money,
        reason: String,
    },
    VehicleWithoutRoutes {
        vehicle_id: EntityId,
        fixed_cost: Money,
    },
    IgnoredFixedComponents {
        level: EntityLevel,
        id: EntityId,
        scheme: String,
        components: Vec<String>,
    },
    DiscountTiersIncomplete {
        brand_id: EntityId,
        covered: Percent,
        attainment: Percent,
    },
    InactiveScenario {
        scenario_id: EntityId,
    },
}

impl fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigWarning::ParticipationOutOfTolerance {
                level,
                parent_level,
                parent_id,
                sum,
            } => write!(
                f,
                "{level} participations under {parent_level} {parent_id} sum to {sum}%, not 100%"
            ),
            ConfigWarning::NoChildren {
                level,
                parent_level,
                parent_id,
            } => write!(f, "{parent_level} {parent_id} has no {level} to distribute to"),
            ConfigWarning::Undistributed {
                level,
                parent_id,
                amount,
            } => write!(
                f,
                "{amount} of {parent_id} could not be distributed to {level} level"
            ),
            ConfigWarning::UncoveredMunicipality {
                municipality_id,
                unattributed_cost,
            } => write!(
                f,
                "municipality {municipality_id} is served by no zone; {unattributed_cost} of route cost unattributed"
            ),
            ConfigWarning::ZoneSplitFallback { municipality_id } => write!(
                f,
                "municipality {municipality_id} has no revenue in its zones; route cost split equally"
            ),
            ConfigWarning::MunicipalityWithoutZone { municipality_id } => {
                write!(f, "municipality {municipality_id} is not covered by any zone")
            }
            ConfigWarning::UnallocatedRubro {
                rubro_id,
                value,
                reason,
            } => write!(f, "shared rubro {rubro_id} ({value}) left unallocated: {reason}"),
            ConfigWarning::VehicleWithoutRoutes {
                vehicle_id,
                fixed_cost,
            } => write!(
                f,
                "vehicle {vehicle_id} serves no route; fixed cost {fixed_cost} unattributed"
            ),
            ConfigWarning::IgnoredFixedComponents {
                level,
                id,
                scheme,
                components,
            } => write!(
                f,
                "{level} {id}: components {} do not apply to scheme {scheme} and were ignored",
                components.join(", ")
            ),
            ConfigWarning::DiscountTiersIncomplete {
                brand_id,
                covered,
                attainment,
            } => write!(
                f,
                "brand {brand_id}: discount tiers cover {covered}% of {attainment}%; last tier extended"
            ),
            ConfigWarning::InactiveScenario { scenario_id } => {
                write!(f, "scenario {scenario_id} is not active")
            }
        }
    }
}

/// Bad data scoped to one entity, which was skipped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityError {
    pub level: EntityLevel,
    pub id: EntityId,
    pub reason: String,
}

impl fmt::Display for EntityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} skipped: {}", self.level, self.id, self.reason)
    }
}

/// A broken engine invariant degraded to best effort.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anomaly {
    pub context: String,
    pub detail: String,
    pub delta: Decimal,
}

/// Parent total vs. the sum of what reached its children.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationDelta {
    pub level: EntityLevel,
    pub parent_id: EntityId,
    pub parent_total: Money,
    pub children_total: Money,
    pub delta: Money,
    /// Month the entry belongs to, when several periods share one report.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<Period>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub participation: Vec<ParticipationCheck>,
    pub reconciliation: Vec<ReconciliationDelta>,
    pub warnings: Vec<ConfigWarning>,
    pub errors: Vec<EntityError>,
    pub anomalies: Vec<Anomaly>,
}

impl ValidationReport {
    pub fn check(&mut self, check: ParticipationCheck) {
        if !check.valid {
            let warning = if check.members == 0 {
                ConfigWarning::NoChildren {
                    level: check.level,
                    parent_level: check.parent_level,
                    parent_id: check.parent_id,
                }
            } else {
                ConfigWarning::ParticipationOutOfTolerance {
                    level: check.level,
                    parent_level: check.parent_level,
                    parent_id: check.parent_id,
                    sum: check.sum,
                }
            };
            self.warn(warning);
        }
        self.participation.push(check);
    }

    pub fn warn(&mut self, warning: ConfigWarning) {
        tracing::warn!(%warning, "configuration warning");
        if !self.warnings.contains(&warning) {
            self.warnings.push(warning);
        }
    }

    pub fn error(&mut self, level: EntityLevel, id: EntityId, reason: impl Into<String>) {
        let error = EntityError {
            level,
            id,
            reason: reason.into(),
        };
        tracing::warn!(%error, "data error");
        if !self.errors.contains(&error) {
            self.errors.push(error);
        }
    }

    pub fn reconcile(
        &mut self,
        level: EntityLevel,
        parent_id: EntityId,
        parent_total: Money,
        children_total: Money,
    ) {
        self.reconciliation.push(ReconciliationDelta {
            level,
            parent_id,
            parent_total,
            children_total,
            delta: parent_total - children_total,
            period: None,
        });
    }

    /// Record a broken invariant, or fail when `strict` is set.
    pub fn anomaly(
        &mut self,
        strict: bool,
        context: impl Into<String>,
        detail: impl Into<String>,
        delta: Decimal,
    ) -> PnlResult<()> {
        let anomaly = Anomaly {
            context: context.into(),
            detail: detail.into(),
            delta,
        };
        tracing::error!(
            context = %anomaly.context,
            detail = %anomaly.detail,
            delta = %anomaly.delta,
            "reconciliation anomaly"
        );
        if strict {
            return Err(PnlError::InvariantViolation {
                context: anomaly.context,
                detail: anomaly.detail,
                delta: anomaly.delta,
            });
        }
        self.anomalies.push(anomaly);
        Ok(())
    }

    /// Tag untagged reconciliation entries with `period`.
    pub fn for_period(mut self, period: Period) -> Self {
        for r in &mut self.reconciliation {
            r.period.get_or_insert(period);
        }
        self
    }

    /// Fold `other` in. Findings already present are not repeated.
    pub fn merge(&mut self, other: ValidationReport) {
        for c in other.participation {
            if !self.participation.contains(&c) {
                self.participation.push(c);
            }
        }
        for r in other.reconciliation {
            if !self.reconciliation.contains(&r) {
                self.reconciliation.push(r);
            }
        }
        for w in other.warnings {
            if !self.warnings.contains(&w) {
                self.warnings.push(w);
            }
        }
        for e in other.errors {
            if !self.errors.contains(&e) {
                self.errors.push(e);
            }
        }
        self.anomalies.extend(other.anomalies);
    }

    /// True when nothing needs review.
    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
            && self.errors.is_empty()
            && self.anomalies.is_empty()
            && self.reconciliation.iter().all(|r| r.delta.is_zero())
    }

    /// Human-readable lines for the output envelope.
    pub fn messages(&self) -> Vec<String> {
        let mut out: Vec<String> = self.warnings.iter().map(|w| w.to_string()).collect();
        out.extend(self.errors.iter().map(|e| e.to_string()));
        out.extend(self.anomalies.iter().map(|a| {
            format!("anomaly in {}: {} (delta {})", a.context, a.detail, a.delta)
        }));
        out
    }
}

//! Rubro allocation: direct lines to their zone, shared lines prorated.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::breakdown::CostBreakdown;
use super::criteria::{CriterionRegistry, ZoneMetrics};
use crate::config::{SimulationPolicy, ZeroWeightPolicy};
use crate::model::{AllocationMode, Category, Rubro, RubroKind, ScenarioIndex};
use crate::reconcile::{allocate_exact, round_money, WeightBasis};
use crate::types::{EntityId, EntityLevel, Money, Period};
use crate::validation::{check_participation, ConfigWarning, ValidationReport};

/// Where one rubro ended up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RubroAllocation {
    pub rubro_id: EntityId,
    pub category: Category,
    pub kind: RubroKind,
    pub value: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub criterion: Option<String>,
    pub shares: Vec<(EntityId, Money)>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CostAllocation {
    pub zones: BTreeMap<EntityId, CostBreakdown>,
    pub rubros: Vec<RubroAllocation>,
    /// Valued rubros that reached no zone.
    pub unallocated: Money,
    pub headcount: Decimal,
}

impl CostAllocation {
    pub fn zone(&self, zone_id: EntityId) -> CostBreakdown {
        self.zones.get(&zone_id).cloned().unwrap_or_default()
    }

    pub fn allocated(&self) -> Money {
        self.zones.values().map(|b| b.rubro_total()).sum()
    }
}

/// Allocate every rubro of a brand over its zones for `period`.
///
/// `metrics` lists the brand's zones; any target outside it is ignored with a
/// data error. Rubros that cannot be valued are recorded and skipped.
pub fn allocate_costs(
    index: &ScenarioIndex<'_>,
    brand_id: EntityId,
    metrics: &[ZoneMetrics],
    registry: &CriterionRegistry,
    policy: &SimulationPolicy,
    period: Period,
    report: &mut ValidationReport,
) -> CostAllocation {
    let dp = policy.rounding_dp;
    let mut out = CostAllocation::default();
    for m in metrics {
        out.zones.insert(m.zone_id, CostBreakdown::default());
    }

    let mut rubros: Vec<&Rubro> = index.rubros_of_brand(brand_id).collect();
    rubros.sort_by_key(|r| r.id);

    for rubro in rubros {
        let value = match rubro.monthly_value() {
            Ok(v) => round_money(v * period.cost_factor(), dp),
            Err(reason) => {
                report.error(EntityLevel::Rubro, rubro.id, reason);
                continue;
            }
        };

        if let Some(v) = &rubro.vehicle {
            let ignored = v.fixed.ignored_for(v.scheme);
            if !ignored.is_empty() {
                report.warn(ConfigWarning::IgnoredFixedComponents {
                    level: EntityLevel::Rubro,
                    id: rubro.id,
                    scheme: v.scheme.to_string(),
                    components: ignored.iter().map(|c| c.to_string()).collect(),
                });
            }
        }

        let shares = match &rubro.allocation {
            AllocationMode::Individual { zone_id } => {
                if out.zones.contains_key(zone_id) {
                    vec![(*zone_id, value)]
                } else {
                    report.error(
                        EntityLevel::Rubro,
                        rubro.id,
                        format!("zone {zone_id} is not served by brand {brand_id}"),
                    );
                    out.unallocated += value;
                    continue;
                }
            }
            AllocationMode::Shared { criterion, targets } => {
                match prorate(rubro, value, criterion, targets, metrics, registry, policy, report) {
                    Some(shares) => shares,
                    None => {
                        out.unallocated += value;
                        continue;
                    }
                }
            }
        };

        out.headcount += rubro.headcount();
        for (zone_id, amount) in &shares {
            if let Some(b) = out.zones.get_mut(zone_id) {
                b.add(rubro.category, rubro.kind, *amount);
            }
        }
        out.rubros.push(RubroAllocation {
            rubro_id: rubro.id,
            category: rubro.category,
            kind: rubro.kind,
            value,
            criterion: match &rubro.allocation {
                AllocationMode::Shared { criterion, .. } => Some(criterion.clone()),
                AllocationMode::Individual { .. } => None,
            },
            shares,
        });
    }

    tracing::debug!(
        brand = brand_id,
        rubros = out.rubros.len(),
        allocated = %out.allocated(),
        unallocated = %out.unallocated,
        "costs allocated"
    );
    out
}

#[allow(clippy::too_many_arguments)]
fn prorate(
    rubro: &Rubro,
    value: Money,
    criterion: &str,
    targets: &[EntityId],
    metrics: &[ZoneMetrics],
    registry: &CriterionRegistry,
    policy: &SimulationPolicy,
    report: &mut ValidationReport,
) -> Option<Vec<(EntityId, Money)>> {
    let zones: Vec<&ZoneMetrics> = if targets.is_empty() {
        metrics.iter().collect()
    } else {
        for t in targets {
            if !metrics.iter().any(|m| m.zone_id == *t) {
                report.error(
                    EntityLevel::Rubro,
                    rubro.id,
                    format!("target zone {t} is not served by brand {}", rubro.brand_id),
                );
            }
        }
        metrics
            .iter()
            .filter(|m| targets.contains(&m.zone_id))
            .collect()
    };

    if zones.is_empty() {
        report.warn(ConfigWarning::UnallocatedRubro {
            rubro_id: rubro.id,
            value,
            reason: "no target zones".into(),
        });
        return None;
    }

    let weights: Option<Vec<(EntityId, Decimal)>> = registry.get(criterion).map(|c| {
        zones
            .iter()
            .map(|z| (z.zone_id, c.weight(z).max(Decimal::ZERO)))
            .collect()
    });

    // Raw criterion weights as shares of their sum: a criterion that gives
    // every target zero weight fails the check before any fallback applies.
    if let Some(raw) = &weights {
        let sum: Decimal = raw.iter().map(|(_, w)| *w).sum();
        let pcts: Vec<Decimal> = raw
            .iter()
            .map(|(_, w)| if sum.is_zero() { Decimal::ZERO } else { *w / sum * dec!(100) })
            .collect();
        report.check(check_participation(
            EntityLevel::Zone,
            EntityLevel::Rubro,
            rubro.id,
            &pcts,
            policy.participation_tolerance,
        ));
    }

    let failure = match &weights {
        None => Some(format!("unknown criterion '{criterion}'")),
        Some(w) if w.iter().all(|(_, w)| w.is_zero()) => {
            Some(format!("criterion '{criterion}' gives every target zero weight"))
        }
        Some(_) => None,
    };

    let weights = match (failure, policy.zero_weight) {
        (None, _) => weights.unwrap_or_default(),
        (Some(reason), ZeroWeightPolicy::Flag) => {
            report.warn(ConfigWarning::UnallocatedRubro {
                rubro_id: rubro.id,
                value,
                reason,
            });
            return None;
        }
        (Some(reason), ZeroWeightPolicy::EqualSplit) => {
            tracing::warn!(rubro = rubro.id, %reason, "splitting equally");
            zones.iter().map(|z| (z.zone_id, Decimal::ONE)).collect()
        }
    };

    let alloc = allocate_exact(value, &weights, WeightBasis::Proportional, policy.rounding_dp);
    report.reconcile(EntityLevel::Zone, rubro.id, value, alloc.allocated());
    Some(alloc.shares)
}

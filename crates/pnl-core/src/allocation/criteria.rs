//! Named proration criteria for shared rubros.
//!
//! A criterion turns a zone's metrics into a non-negative weight. Shares are
//! proportional to the weights, so criteria need not produce percentages.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::cascade::RevenueCascade;
use crate::logistics::LogisticsAttribution;
use crate::model::{AllocationMode, RubroKind, ScenarioIndex};
use crate::types::{EntityId, Money};

/// What a criterion can weigh a zone by.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneMetrics {
    pub zone_id: EntityId,
    pub revenue: Money,
    /// People paid by rubros assigned directly to the zone.
    pub headcount: Decimal,
    pub monthly_km: Decimal,
    pub municipalities: usize,
}

pub trait ProrationCriterion: Send + Sync {
    fn weight(&self, zone: &ZoneMetrics) -> Decimal;
}

pub struct RevenueCriterion;

impl ProrationCriterion for RevenueCriterion {
    fn weight(&self, zone: &ZoneMetrics) -> Decimal {
        zone.revenue
    }
}

pub struct HeadcountCriterion;

impl ProrationCriterion for HeadcountCriterion {
    fn weight(&self, zone: &ZoneMetrics) -> Decimal {
        zone.headcount
    }
}

pub struct DistanceCriterion;

impl ProrationCriterion for DistanceCriterion {
    fn weight(&self, zone: &ZoneMetrics) -> Decimal {
        zone.monthly_km
    }
}

pub struct EqualCriterion;

impl ProrationCriterion for EqualCriterion {
    fn weight(&self, _zone: &ZoneMetrics) -> Decimal {
        Decimal::ONE
    }
}

pub struct MunicipalityCountCriterion;

impl ProrationCriterion for MunicipalityCountCriterion {
    fn weight(&self, zone: &ZoneMetrics) -> Decimal {
        Decimal::from(zone.municipalities as u64)
    }
}

/// Criteria by lower-case name.
pub struct CriterionRegistry {
    criteria: BTreeMap<String, Box<dyn ProrationCriterion>>,
}

impl CriterionRegistry {
    pub fn empty() -> Self {
        Self {
            criteria: BTreeMap::new(),
        }
    }

    /// The built-in criteria, with their Spanish aliases.
    pub fn standard() -> Self {
        let mut registry = Self::empty();
        registry.register("revenue", RevenueCriterion);
        registry.register("ventas", RevenueCriterion);
        registry.register("headcount", HeadcountCriterion);
        registry.register("personal", HeadcountCriterion);
        registry.register("distance", DistanceCriterion);
        registry.register("distancia", DistanceCriterion);
        registry.register("equal", EqualCriterion);
        registry.register("municipalities", MunicipalityCountCriterion);
        registry
    }

    pub fn register(&mut self, name: &str, criterion: impl ProrationCriterion + 'static) {
        self.criteria
            .insert(name.trim().to_lowercase(), Box::new(criterion));
    }

    pub fn get(&self, name: &str) -> Option<&dyn ProrationCriterion> {
        self.criteria
            .get(&name.trim().to_lowercase())
            .map(|c| c.as_ref())
    }

    pub fn names(&self) -> Vec<&str> {
        self.criteria.keys().map(String::as_str).collect()
    }
}

impl Default for CriterionRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

/// Metrics of every zone the brand reaches, in zone id order.
pub fn collect_zone_metrics(
    index: &ScenarioIndex<'_>,
    brand_id: EntityId,
    cascade: &RevenueCascade,
    logistics: &LogisticsAttribution,
) -> Vec<ZoneMetrics> {
    index
        .brand_zones(brand_id)
        .into_iter()
        .map(|zone| {
            let headcount = index
                .rubros_of_brand(brand_id)
                .filter(|r| r.kind == RubroKind::Personal)
                .filter(|r| matches!(r.allocation, AllocationMode::Individual { zone_id } if zone_id == zone.id))
                .map(|r| r.headcount())
                .sum();
            ZoneMetrics {
                zone_id: zone.id,
                revenue: cascade.zone_revenue(zone.id),
                headcount,
                monthly_km: logistics
                    .zone_km
                    .get(&zone.id)
                    .copied()
                    .unwrap_or(Decimal::ZERO),
                municipalities: index.coverages_of_zone(zone.id).len(),
            }
        })
        .collect()
}

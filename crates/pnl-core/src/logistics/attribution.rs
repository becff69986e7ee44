//! Where route cost lands: route → stops (municipalities) → serving zones.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::fleet::FleetCosting;
use super::route::StopCost;
use crate::cascade::RevenueCascade;
use crate::config::{SimulationPolicy, ZoneSplitPolicy};
use crate::model::{FreightSplit, Route, ScenarioIndex};
use crate::reconcile::{allocate_exact, WeightBasis};
use crate::types::{EntityId, EntityLevel, Money};
use crate::validation::{ConfigWarning, ValidationReport};

/// Spread a route's total over its distinct stops by the route's policy.
///
/// Delivery-weighted routes with no recorded deliveries fall back to an
/// equal split.
pub fn split_to_stops(route: &Route, total: Money, dp: u32) -> Vec<StopCost> {
    let stops = route.stops();
    let has_deliveries = stops.iter().any(|(_, d)| *d > Decimal::ZERO);
    let weights: Vec<(EntityId, Decimal)> = stops
        .iter()
        .map(|(m, d)| match route.freight_split {
            FreightSplit::ByDeliveries if has_deliveries => (*m, *d),
            _ => (*m, Decimal::ONE),
        })
        .collect();
    if route.freight_split == FreightSplit::ByDeliveries && !has_deliveries {
        tracing::debug!(route = route.id, "no deliveries recorded; splitting equally");
    }
    let alloc = allocate_exact(total, &weights, WeightBasis::Proportional, dp);
    stops
        .iter()
        .zip(alloc.shares)
        .map(|((m, d), (_, cost))| StopCost {
            municipality_id: *m,
            deliveries: *d,
            cost,
        })
        .collect()
}

/// One brand's route cost, by municipality and by zone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogisticsAttribution {
    /// Full route cost of each covered municipality.
    pub municipalities: BTreeMap<EntityId, Money>,
    /// Route cost landing on each zone after the multi-zone split.
    pub zones: BTreeMap<EntityId, Money>,
    /// Monthly kilometres attributed to each zone.
    pub zone_km: BTreeMap<EntityId, Decimal>,
    /// Cost of municipalities no brand zone serves.
    pub unattributed: Money,
}

impl LogisticsAttribution {
    pub fn zone_cost(&self, zone_id: EntityId) -> Money {
        self.zones.get(&zone_id).copied().unwrap_or(Decimal::ZERO)
    }

    pub fn municipality_cost(&self, municipality_id: EntityId) -> Money {
        self.municipalities
            .get(&municipality_id)
            .copied()
            .unwrap_or(Decimal::ZERO)
    }
}

/// Roll a brand's route cost up from municipalities to the zones serving
/// them, following the zone split policy.
pub fn attribute_to_zones(
    index: &ScenarioIndex<'_>,
    fleet: &FleetCosting,
    brand_id: EntityId,
    cascade: &RevenueCascade,
    policy: &SimulationPolicy,
    report: &mut ValidationReport,
) -> LogisticsAttribution {
    let mut per_municipality: BTreeMap<EntityId, (Money, Decimal)> = BTreeMap::new();
    for route in fleet.routes_of_brand(brand_id) {
        let stop_count = Decimal::from(route.stops.len().max(1) as u64);
        for stop in &route.stops {
            let entry = per_municipality
                .entry(stop.municipality_id)
                .or_insert((Decimal::ZERO, Decimal::ZERO));
            entry.0 += stop.cost;
            entry.1 += route.km_per_month / stop_count;
        }
    }

    let brand_zones: Vec<EntityId> = cascade.zones.iter().map(|z| z.id).collect();
    let mut out = LogisticsAttribution::default();

    for (municipality_id, (cost, km)) in per_municipality {
        let serving: Vec<_> = index
            .zones_serving(municipality_id)
            .into_iter()
            .filter(|c| brand_zones.contains(&c.zone_id))
            .collect();

        if serving.is_empty() {
            report.warn(ConfigWarning::UncoveredMunicipality {
                municipality_id,
                unattributed_cost: cost,
            });
            out.unattributed += cost;
            continue;
        }
        out.municipalities.insert(municipality_id, cost);

        let equal: Vec<(EntityId, Decimal)> =
            serving.iter().map(|c| (c.zone_id, Decimal::ONE)).collect();
        let weighted: Vec<(EntityId, Decimal)> = match policy.zone_split {
            ZoneSplitPolicy::Equal => equal.clone(),
            ZoneSplitPolicy::RevenueWeighted => serving
                .iter()
                .map(|c| (c.zone_id, cascade.municipality_in_zone(c.zone_id, municipality_id)))
                .collect(),
            ZoneSplitPolicy::CoverageWeight => serving
                .iter()
                .map(|c| (c.zone_id, c.coverage_weight.unwrap_or(Decimal::ZERO)))
                .collect(),
        };
        let weights = if weighted.iter().any(|(_, w)| *w > Decimal::ZERO) {
            weighted
        } else {
            report.warn(ConfigWarning::ZoneSplitFallback { municipality_id });
            equal
        };

        let alloc = allocate_exact(cost, &weights, WeightBasis::Proportional, policy.rounding_dp);
        report.reconcile(EntityLevel::Zone, municipality_id, cost, alloc.allocated());
        let weight_sum: Decimal = weights.iter().map(|(_, w)| (*w).max(Decimal::ZERO)).sum();
        for (zone_id, share) in alloc.shares {
            *out.zones.entry(zone_id).or_insert(Decimal::ZERO) += share;
            let w = weights
                .iter()
                .find(|(z, _)| *z == zone_id)
                .map(|(_, w)| (*w).max(Decimal::ZERO))
                .unwrap_or(Decimal::ZERO);
            if !weight_sum.is_zero() {
                *out.zone_km.entry(zone_id).or_insert(Decimal::ZERO) += km * w / weight_sum;
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cascade::{MunicipalityRevenue, RevenueShare};
    use crate::logistics::route::RouteCost;
    use crate::model::{Frequency, FrequencyUnit, Leg, Scenario, VehicleScheme, ZoneCoverage};
    use crate::types::Period;
    use rust_decimal_macros::dec;

    fn leg(m: EntityId, deliveries: Option<Decimal>) -> Leg {
        Leg {
            municipality_id: m,
            distance_km: dec!(10),
            toll: Decimal::ZERO,
            deliveries,
        }
    }

    fn route(split: FreightSplit, legs: Vec<Leg>) -> Route {
        Route {
            id: 1,
            brand_id: 1,
            name: "R".into(),
            vehicle_id: 1,
            legs,
            frequency: Frequency {
                trips: dec!(1),
                per: FrequencyUnit::Month,
            },
            overnight: None,
            fuel_km_per_gallon: None,
            base_freight_per_trip: Decimal::ZERO,
            freight_split: split,
        }
    }

    #[test]
    fn test_equal_split_over_distinct_stops() {
        let r = route(
            FreightSplit::Equal,
            vec![leg(1, None), leg(2, None), leg(1, None)],
        );
        let stops = split_to_stops(&r, dec!(1000), 0);
        assert_eq!(stops.len(), 2);
        assert_eq!(stops[0].cost, dec!(500));
        assert_eq!(stops[1].cost, dec!(500));
    }

    #[test]
    fn test_delivery_weighted_split() {
        let r = route(
            FreightSplit::ByDeliveries,
            vec![leg(1, Some(dec!(3))), leg(2, Some(dec!(1)))],
        );
        let stops = split_to_stops(&r, dec!(1000), 0);
        assert_eq!(stops[0].cost, dec!(750));
        assert_eq!(stops[1].cost, dec!(250));
    }

    #[test]
    fn test_delivery_split_without_deliveries_is_equal() {
        let r = route(FreightSplit::ByDeliveries, vec![leg(1, None), leg(2, None)]);
        let stops = split_to_stops(&r, dec!(1001), 0);
        assert_eq!(stops[0].cost + stops[1].cost, dec!(1001));
        // the second stop rounds 500.5 up; the first absorbs the rest
        assert_eq!(stops[1].cost, dec!(501));
    }

    fn fleet(stops: Vec<(EntityId, Money)>) -> FleetCosting {
        let total: Money = stops.iter().map(|(_, c)| *c).sum();
        FleetCosting {
            period: Period::Annual,
            routes: vec![RouteCost {
                route_id: 1,
                brand_id: 1,
                vehicle_id: 1,
                scheme: VehicleScheme::Tradicional,
                circuit_km: dec!(100),
                trips_per_month: dec!(1),
                km_per_month: dec!(100),
                fuel: total,
                tolls: Decimal::ZERO,
                overnight: Decimal::ZERO,
                base_freight: Decimal::ZERO,
                fixed_share: Decimal::ZERO,
                total,
                stops: stops
                    .into_iter()
                    .map(|(m, cost)| StopCost {
                        municipality_id: m,
                        deliveries: Decimal::ZERO,
                        cost,
                    })
                    .collect(),
            }],
            ..Default::default()
        }
    }

    fn cascade(munis: Vec<(EntityId, EntityId, Money)>) -> RevenueCascade {
        RevenueCascade {
            brand_id: 1,
            period: Period::Annual,
            brand_revenue: Decimal::ZERO,
            operations: vec![],
            zones: vec![
                RevenueShare { id: 10, parent_id: 1, weight: dec!(50), revenue: Decimal::ZERO },
                RevenueShare { id: 11, parent_id: 1, weight: dec!(50), revenue: Decimal::ZERO },
            ],
            municipalities: munis
                .into_iter()
                .map(|(z, m, revenue)| MunicipalityRevenue {
                    municipality_id: m,
                    zone_id: z,
                    weight: dec!(50),
                    revenue,
                })
                .collect(),
        }
    }

    fn coverage(zone_id: EntityId, municipality_id: EntityId, w: Option<Decimal>) -> ZoneCoverage {
        ZoneCoverage {
            zone_id,
            municipality_id,
            participation_in_zone: dec!(50),
            coverage_weight: w,
        }
    }

    #[test]
    fn test_revenue_weighted_zone_split() {
        let s = Scenario {
            coverages: vec![coverage(10, 5, None), coverage(11, 5, None)],
            ..Default::default()
        };
        let index = ScenarioIndex::new(&s);
        let mut report = ValidationReport::default();
        let out = attribute_to_zones(
            &index,
            &fleet(vec![(5, dec!(900))]),
            1,
            &cascade(vec![(10, 5, dec!(200)), (11, 5, dec!(100))]),
            &SimulationPolicy::default(),
            &mut report,
        );
        assert_eq!(out.zone_cost(10), dec!(600));
        assert_eq!(out.zone_cost(11), dec!(300));
        assert_eq!(out.municipality_cost(5), dec!(900));
        assert_eq!(out.zone_km[&10] + out.zone_km[&11], dec!(100));
    }

    #[test]
    fn test_revenue_weighted_falls_back_to_equal() {
        let s = Scenario {
            coverages: vec![coverage(10, 5, None), coverage(11, 5, None)],
            ..Default::default()
        };
        let index = ScenarioIndex::new(&s);
        let mut report = ValidationReport::default();
        let out = attribute_to_zones(
            &index,
            &fleet(vec![(5, dec!(900))]),
            1,
            &cascade(vec![]),
            &SimulationPolicy::default(),
            &mut report,
        );
        assert_eq!(out.zone_cost(10), dec!(450));
        assert_eq!(out.zone_cost(11), dec!(450));
        assert!(report
            .warnings
            .contains(&ConfigWarning::ZoneSplitFallback { municipality_id: 5 }));
    }

    #[test]
    fn test_coverage_weight_split() {
        let s = Scenario {
            coverages: vec![
                coverage(10, 5, Some(dec!(1))),
                coverage(11, 5, Some(dec!(3))),
            ],
            ..Default::default()
        };
        let index = ScenarioIndex::new(&s);
        let policy = SimulationPolicy {
            zone_split: ZoneSplitPolicy::CoverageWeight,
            ..Default::default()
        };
        let mut report = ValidationReport::default();
        let out = attribute_to_zones(
            &index,
            &fleet(vec![(5, dec!(1000))]),
            1,
            &cascade(vec![]),
            &policy,
            &mut report,
        );
        assert_eq!(out.zone_cost(10), dec!(250));
        assert_eq!(out.zone_cost(11), dec!(750));
    }

    #[test]
    fn test_uncovered_municipality_is_flagged_not_dropped() {
        let s = Scenario {
            coverages: vec![coverage(10, 5, None)],
            ..Default::default()
        };
        let index = ScenarioIndex::new(&s);
        let mut report = ValidationReport::default();
        let out = attribute_to_zones(
            &index,
            &fleet(vec![(5, dec!(100)), (6, dec!(40))]),
            1,
            &cascade(vec![(10, 5, dec!(1))]),
            &SimulationPolicy::default(),
            &mut report,
        );
        assert_eq!(out.unattributed, dec!(40));
        assert_eq!(out.zone_cost(10), dec!(100));
        assert!(report.warnings.iter().any(|w| matches!(
            w,
            ConfigWarning::UncoveredMunicipality { municipality_id: 6, .. }
        )));
    }
}

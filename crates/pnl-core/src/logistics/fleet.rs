//! Fleet-wide route costing and vehicle fixed-cost distribution.
//!
//! A vehicle may run routes for several brands, so its fixed cost is spread
//! over every route it serves before any brand looks at its own routes.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::attribution::split_to_stops;
use super::route::{cost_route, RouteCost};
use crate::config::{FixedCostBasis, SimulationPolicy};
use crate::model::ScenarioIndex;
use crate::reconcile::{allocate_exact, round_money, WeightBasis};
use crate::types::{EntityId, EntityLevel, Money, Period};
use crate::validation::{ConfigWarning, ValidationReport};
use crate::PnlResult;

/// Fixed cost of one vehicle and how it reached its routes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleFixedCost {
    pub vehicle_id: EntityId,
    pub monthly_fixed: Money,
    pub period_fixed: Money,
    pub routes: Vec<(EntityId, Money)>,
    pub unattributed: Money,
}

/// Every costed route of a scenario plus fleet-level findings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FleetCosting {
    pub period: Period,
    pub routes: Vec<RouteCost>,
    pub vehicles: Vec<VehicleFixedCost>,
    pub report: ValidationReport,
}

impl FleetCosting {
    pub fn routes_of_brand(&self, brand_id: EntityId) -> impl Iterator<Item = &RouteCost> {
        self.routes.iter().filter(move |r| r.brand_id == brand_id)
    }

    pub fn total(&self) -> Money {
        self.routes.iter().map(|r| r.total).sum()
    }
}

/// Cost every route of the scenario for `period`.
///
/// Routes with unusable data are recorded as errors and skipped; they take
/// no share of their vehicle's fixed cost.
pub fn cost_fleet(
    index: &ScenarioIndex<'_>,
    policy: &SimulationPolicy,
    period: Period,
) -> PnlResult<FleetCosting> {
    policy.validate()?;
    let scenario = index.scenario;
    let mut report = ValidationReport::default();
    let mut routes: Vec<RouteCost> = Vec::new();

    let mut ordered: Vec<_> = scenario.routes.iter().collect();
    ordered.sort_by_key(|r| r.id);

    for route in ordered {
        let Some(vehicle) = index.vehicle(route.vehicle_id) else {
            report.error(
                EntityLevel::Route,
                route.id,
                format!("vehicle {} not defined", route.vehicle_id),
            );
            continue;
        };
        match cost_route(route, vehicle, &scenario.logistics, policy, period) {
            Ok(cost) => routes.push(cost),
            Err(reason) => report.error(EntityLevel::Route, route.id, reason),
        }
    }

    let vehicles = distribute_fixed_costs(index, policy, period, &mut routes, &mut report);

    for cost in &mut routes {
        if let Some(route) = scenario.routes.iter().find(|r| r.id == cost.route_id) {
            cost.stops = split_to_stops(route, cost.total, policy.rounding_dp);
        }
    }

    tracing::debug!(
        %period,
        routes = routes.len(),
        vehicles = vehicles.len(),
        "fleet costed"
    );

    Ok(FleetCosting {
        period,
        routes,
        vehicles,
        report,
    })
}

fn distribute_fixed_costs(
    index: &ScenarioIndex<'_>,
    policy: &SimulationPolicy,
    period: Period,
    routes: &mut [RouteCost],
    report: &mut ValidationReport,
) -> Vec<VehicleFixedCost> {
    let mut by_vehicle: BTreeMap<EntityId, Vec<usize>> = BTreeMap::new();
    for (i, r) in routes.iter().enumerate() {
        by_vehicle.entry(r.vehicle_id).or_default().push(i);
    }

    let mut out = Vec::new();
    let mut vehicles: Vec<_> = index.scenario.vehicles.iter().collect();
    vehicles.sort_by_key(|v| v.id);

    for vehicle in vehicles {
        if vehicle.fixed_costs.has_negative() {
            report.error(
                EntityLevel::Vehicle,
                vehicle.id,
                "negative fixed cost component",
            );
            continue;
        }
        let ignored = vehicle.fixed_costs.ignored_for(vehicle.scheme);
        if !ignored.is_empty() {
            report.warn(ConfigWarning::IgnoredFixedComponents {
                level: EntityLevel::Vehicle,
                id: vehicle.id,
                scheme: vehicle.scheme.to_string(),
                components: ignored.iter().map(|c| c.to_string()).collect(),
            });
        }

        let monthly_fixed = vehicle.fixed_costs.monthly_for(vehicle.scheme);
        let period_fixed = round_money(monthly_fixed * period.cost_factor(), policy.rounding_dp);
        let served = by_vehicle.get(&vehicle.id).cloned().unwrap_or_default();

        if served.is_empty() {
            if !period_fixed.is_zero() {
                report.warn(ConfigWarning::VehicleWithoutRoutes {
                    vehicle_id: vehicle.id,
                    fixed_cost: period_fixed,
                });
            }
            out.push(VehicleFixedCost {
                vehicle_id: vehicle.id,
                monthly_fixed,
                period_fixed,
                routes: Vec::new(),
                unattributed: period_fixed,
            });
            continue;
        }

        let weights: Vec<(EntityId, Decimal)> = served
            .iter()
            .map(|&i| {
                let r = &routes[i];
                let w = match policy.fixed_cost_basis {
                    FixedCostBasis::Distance => r.km_per_month,
                    FixedCostBasis::Trips => r.trips_per_month,
                };
                (r.route_id, w)
            })
            .collect();
        let alloc = allocate_exact(period_fixed, &weights, WeightBasis::Proportional, policy.rounding_dp);
        if !alloc.undistributed.is_zero() {
            report.warn(ConfigWarning::Undistributed {
                level: EntityLevel::Route,
                parent_id: vehicle.id,
                amount: alloc.undistributed,
            });
        }
        report.reconcile(EntityLevel::Route, vehicle.id, period_fixed, alloc.allocated());

        for &i in &served {
            let share = alloc.share_of(routes[i].route_id);
            routes[i].fixed_share = share;
            routes[i].refresh_total();
        }

        out.push(VehicleFixedCost {
            vehicle_id: vehicle.id,
            monthly_fixed,
            period_fixed,
            routes: alloc.shares.clone(),
            unattributed: alloc.undistributed,
        });
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        Frequency, FrequencyUnit, FreightSplit, Leg, LogisticsParams, Route, Scenario, Vehicle,
        VehicleFixedCosts, VehicleScheme,
    };
    use chrono::Month;
    use rust_decimal_macros::dec;

    fn route(id: EntityId, vehicle_id: EntityId, km: Decimal, trips: Decimal) -> Route {
        Route {
            id,
            brand_id: 1,
            name: format!("R{id}"),
            vehicle_id,
            legs: vec![Leg {
                municipality_id: 100 + id,
                distance_km: km,
                toll: Decimal::ZERO,
                deliveries: None,
            }],
            frequency: Frequency {
                trips,
                per: FrequencyUnit::Month,
            },
            overnight: None,
            fuel_km_per_gallon: Some(dec!(25)),
            base_freight_per_trip: Decimal::ZERO,
            freight_split: FreightSplit::Equal,
        }
    }

    fn scenario(routes: Vec<Route>) -> Scenario {
        Scenario {
            vehicles: vec![
                Vehicle {
                    id: 1,
                    plate: "AAA111".into(),
                    scheme: VehicleScheme::Tradicional,
                    fixed_costs: VehicleFixedCosts {
                        depreciation: dec!(700_000),
                        insurance: dec!(300_000),
                        ..Default::default()
                    },
                    fuel_km_per_gallon: None,
                },
                Vehicle {
                    id: 2,
                    plate: "BBB222".into(),
                    scheme: VehicleScheme::Renting,
                    fixed_costs: VehicleFixedCosts {
                        canon: dec!(2_000_000),
                        insurance: dec!(1),
                        ..Default::default()
                    },
                    fuel_km_per_gallon: None,
                },
            ],
            routes,
            logistics: LogisticsParams {
                fuel_price_per_gallon: dec!(10_000),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_fixed_cost_split_by_distance() {
        let s = scenario(vec![
            route(1, 1, dec!(100), dec!(3)),
            route(2, 1, dec!(100), dec!(1)),
        ]);
        let index = ScenarioIndex::new(&s);
        let fleet =
            cost_fleet(&index, &SimulationPolicy::default(), Period::Month(Month::July)).unwrap();
        // km/month: 300 vs 100 → 750,000 / 250,000
        let r1 = fleet.routes.iter().find(|r| r.route_id == 1).unwrap();
        let r2 = fleet.routes.iter().find(|r| r.route_id == 2).unwrap();
        assert_eq!(r1.fixed_share, dec!(750_000));
        assert_eq!(r2.fixed_share, dec!(250_000));
        assert_eq!(r1.fixed_share + r2.fixed_share, dec!(1_000_000));
    }

    #[test]
    fn test_fixed_cost_split_by_trips() {
        let s = scenario(vec![
            route(1, 1, dec!(10), dec!(1)),
            route(2, 1, dec!(500), dec!(1)),
        ]);
        let index = ScenarioIndex::new(&s);
        let policy = SimulationPolicy {
            fixed_cost_basis: FixedCostBasis::Trips,
            ..Default::default()
        };
        let fleet = cost_fleet(&index, &policy, Period::Month(Month::July)).unwrap();
        let shares: Vec<Money> = fleet.routes.iter().map(|r| r.fixed_share).collect();
        assert_eq!(shares, vec![dec!(500_000), dec!(500_000)]);
    }

    #[test]
    fn test_vehicle_without_routes_is_flagged() {
        let s = scenario(vec![route(1, 1, dec!(100), dec!(1))]);
        let index = ScenarioIndex::new(&s);
        let fleet = cost_fleet(&index, &SimulationPolicy::default(), Period::Annual).unwrap();
        assert!(fleet.report.warnings.iter().any(|w| matches!(
            w,
            ConfigWarning::VehicleWithoutRoutes { vehicle_id: 2, .. }
        )));
        // Renting vehicle carries an insurance figure that does not apply.
        assert!(fleet.report.warnings.iter().any(|w| matches!(
            w,
            ConfigWarning::IgnoredFixedComponents { id: 2, .. }
        )));
    }

    #[test]
    fn test_unknown_vehicle_is_route_error() {
        let s = scenario(vec![route(1, 99, dec!(100), dec!(1))]);
        let index = ScenarioIndex::new(&s);
        let fleet = cost_fleet(&index, &SimulationPolicy::default(), Period::Annual).unwrap();
        assert!(fleet.routes.is_empty());
        assert_eq!(fleet.report.errors[0].level, EntityLevel::Route);
    }

    #[test]
    fn test_stop_costs_sum_to_route_total() {
        let s = scenario(vec![route(1, 1, dec!(77), dec!(3))]);
        let index = ScenarioIndex::new(&s);
        let fleet = cost_fleet(&index, &SimulationPolicy::default(), Period::Annual).unwrap();
        let r = &fleet.routes[0];
        let stops: Money = r.stops.iter().map(|s| s.cost).sum();
        assert_eq!(stops, r.total);
    }
}

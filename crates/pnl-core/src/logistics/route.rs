//! Variable cost of one circuit: fuel, tolls, pernocta and flete base.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::SimulationPolicy;
use crate::model::{LogisticsParams, Route, Vehicle, VehicleScheme};
use crate::reconcile::round_money;
use crate::types::{EntityId, Money, Period};

/// Cost attributed to one stop of a circuit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StopCost {
    pub municipality_id: EntityId,
    pub deliveries: Decimal,
    pub cost: Money,
}

/// Route cost for the requested period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteCost {
    pub route_id: EntityId,
    pub brand_id: EntityId,
    pub vehicle_id: EntityId,
    pub scheme: VehicleScheme,
    pub circuit_km: Decimal,
    pub trips_per_month: Decimal,
    pub km_per_month: Decimal,
    pub fuel: Money,
    pub tolls: Money,
    pub overnight: Money,
    pub base_freight: Money,
    /// Share of the vehicle's fixed cost, filled in by fleet distribution.
    pub fixed_share: Money,
    pub total: Money,
    pub stops: Vec<StopCost>,
}

impl RouteCost {
    /// Distance-driven part (lejanía): fuel, tolls and overnight.
    pub fn lejania(&self) -> Money {
        self.fuel + self.tolls + self.overnight
    }

    pub(crate) fn refresh_total(&mut self) {
        self.total = self.fuel + self.tolls + self.overnight + self.base_freight + self.fixed_share;
    }
}

/// Overnight cost of a single trip.
///
/// The driver's meals and lodging are only carried when the company runs the
/// vehicle (not `tercero`); helpers are always company-paid.
pub fn overnight_per_trip(route: &Route, scheme: VehicleScheme, params: &LogisticsParams) -> Money {
    let Some(overnight) = &route.overnight else {
        return Decimal::ZERO;
    };
    let driver = if scheme == VehicleScheme::Tercero {
        Decimal::ZERO
    } else {
        params.driver_meals_per_night + params.driver_lodging_per_night
    };
    let helpers = Decimal::from(overnight.helpers)
        * (params.helper_meals_per_night + params.helper_lodging_per_night);
    let parking = if overnight.parking {
        params.parking_per_night
    } else {
        Decimal::ZERO
    };
    overnight.nights_per_trip * (driver + helpers + parking)
}

/// Cost a route for `period`, before its vehicle's fixed share.
///
/// Returns a reason string when the route's data cannot be costed; the
/// caller records it against the route and skips it.
pub fn cost_route(
    route: &Route,
    vehicle: &Vehicle,
    params: &LogisticsParams,
    policy: &SimulationPolicy,
    period: Period,
) -> Result<RouteCost, String> {
    if route.legs.is_empty() {
        return Err("route has no legs".into());
    }
    if let Some(leg) = route
        .legs
        .iter()
        .find(|l| l.distance_km < Decimal::ZERO || l.toll < Decimal::ZERO)
    {
        return Err(format!(
            "negative distance or toll on leg to municipality {}",
            leg.municipality_id
        ));
    }
    if route.frequency.trips < Decimal::ZERO {
        return Err(format!("negative trip frequency {}", route.frequency.trips));
    }
    if route.base_freight_per_trip < Decimal::ZERO {
        return Err("negative base freight".into());
    }
    if let Some(o) = &route.overnight {
        if o.nights_per_trip < Decimal::ZERO {
            return Err("negative overnight nights".into());
        }
    }

    let consumption = route
        .fuel_km_per_gallon
        .or(vehicle.fuel_km_per_gallon)
        .ok_or_else(|| "missing fuel consumption rate".to_string())?;
    if consumption <= Decimal::ZERO {
        return Err(format!("fuel consumption must be positive, got {consumption}"));
    }

    let dp = policy.rounding_dp;
    let factor = period.cost_factor();
    let circuit_km = route.circuit_km();
    let trips_per_month = route.frequency.trips_per_month(policy.working_days_per_month);

    let fuel_per_trip = circuit_km / consumption * params.fuel_price_per_gallon;
    let per_period = |per_trip: Money| round_money(per_trip * trips_per_month * factor, dp);

    let mut cost = RouteCost {
        route_id: route.id,
        brand_id: route.brand_id,
        vehicle_id: vehicle.id,
        scheme: vehicle.scheme,
        circuit_km,
        trips_per_month,
        km_per_month: circuit_km * trips_per_month,
        fuel: per_period(fuel_per_trip),
        tolls: per_period(route.tolls_per_trip()),
        overnight: per_period(overnight_per_trip(route, vehicle.scheme, params)),
        base_freight: per_period(route.base_freight_per_trip),
        fixed_share: Decimal::ZERO,
        total: Decimal::ZERO,
        stops: Vec::new(),
    };
    cost.refresh_total();
    Ok(cost)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Frequency, FrequencyUnit, FreightSplit, Leg, Overnight, VehicleFixedCosts};
    use chrono::Month;
    use rust_decimal_macros::dec;

    fn params() -> LogisticsParams {
        LogisticsParams {
            fuel_price_per_gallon: dec!(15_000),
            driver_meals_per_night: dec!(40_000),
            driver_lodging_per_night: dec!(60_000),
            helper_meals_per_night: dec!(30_000),
            helper_lodging_per_night: dec!(50_000),
            parking_per_night: dec!(20_000),
        }
    }

    fn vehicle(scheme: VehicleScheme) -> Vehicle {
        Vehicle {
            id: 7,
            plate: "ABC123".into(),
            scheme,
            fixed_costs: VehicleFixedCosts::default(),
            fuel_km_per_gallon: Some(dec!(30)),
        }
    }

    fn route(overnight: Option<Overnight>) -> Route {
        Route {
            id: 1,
            brand_id: 1,
            name: "Ruta Sur".into(),
            vehicle_id: 7,
            legs: vec![
                Leg {
                    municipality_id: 10,
                    distance_km: dec!(120),
                    toll: dec!(10_000),
                    deliveries: None,
                },
                Leg {
                    municipality_id: 11,
                    distance_km: dec!(180),
                    toll: dec!(5_000),
                    deliveries: None,
                },
            ],
            frequency: Frequency {
                trips: dec!(4),
                per: FrequencyUnit::Month,
            },
            overnight,
            fuel_km_per_gallon: None,
            base_freight_per_trip: dec!(100_000),
            freight_split: FreightSplit::Equal,
        }
    }

    #[test]
    fn test_fuel_tolls_freight_monthly() {
        let cost = cost_route(
            &route(None),
            &vehicle(VehicleScheme::Tradicional),
            &params(),
            &SimulationPolicy::default(),
            Period::Month(Month::May),
        )
        .unwrap();
        // 300 km / 30 km/gal * 15,000 = 150,000 per trip; 4 trips
        assert_eq!(cost.circuit_km, dec!(300));
        assert_eq!(cost.km_per_month, dec!(1200));
        assert_eq!(cost.fuel, dec!(600_000));
        assert_eq!(cost.tolls, dec!(60_000));
        assert_eq!(cost.base_freight, dec!(400_000));
        assert_eq!(cost.overnight, Decimal::ZERO);
        assert_eq!(cost.total, dec!(1_060_000));
        assert_eq!(cost.lejania(), dec!(660_000));
    }

    #[test]
    fn test_annual_period_scales_by_twelve() {
        let cost = cost_route(
            &route(None),
            &vehicle(VehicleScheme::Tradicional),
            &params(),
            &SimulationPolicy::default(),
            Period::Annual,
        )
        .unwrap();
        assert_eq!(cost.fuel, dec!(7_200_000));
    }

    #[test]
    fn test_overnight_owned_vehicle_pays_driver_and_helpers() {
        let overnight = Overnight {
            nights_per_trip: dec!(2),
            helpers: 1,
            parking: true,
        };
        // per night: driver 100k + helper 80k + parking 20k = 200k
        let per_trip = overnight_per_trip(
            &route(Some(overnight)),
            VehicleScheme::Tradicional,
            &params(),
        );
        assert_eq!(per_trip, dec!(400_000));
    }

    #[test]
    fn test_overnight_tercero_excludes_driver() {
        let overnight = Overnight {
            nights_per_trip: dec!(2),
            helpers: 1,
            parking: false,
        };
        let per_trip =
            overnight_per_trip(&route(Some(overnight)), VehicleScheme::Tercero, &params());
        assert_eq!(per_trip, dec!(160_000));
    }

    #[test]
    fn test_route_consumption_overrides_vehicle() {
        let mut r = route(None);
        r.fuel_km_per_gallon = Some(dec!(60));
        let cost = cost_route(
            &r,
            &vehicle(VehicleScheme::Renting),
            &params(),
            &SimulationPolicy::default(),
            Period::Month(Month::May),
        )
        .unwrap();
        assert_eq!(cost.fuel, dec!(300_000));
    }

    #[test]
    fn test_missing_consumption_is_error() {
        let mut v = vehicle(VehicleScheme::Tradicional);
        v.fuel_km_per_gallon = None;
        let err = cost_route(
            &route(None),
            &v,
            &params(),
            &SimulationPolicy::default(),
            Period::Annual,
        )
        .unwrap_err();
        assert!(err.contains("fuel consumption"));
    }

    #[test]
    fn test_zero_consumption_is_error_not_panic() {
        let mut v = vehicle(VehicleScheme::Tradicional);
        v.fuel_km_per_gallon = Some(Decimal::ZERO);
        assert!(cost_route(
            &route(None),
            &v,
            &params(),
            &SimulationPolicy::default(),
            Period::Annual
        )
        .is_err());
    }

    #[test]
    fn test_empty_route_is_error() {
        let mut r = route(None);
        r.legs.clear();
        assert!(cost_route(
            &r,
            &vehicle(VehicleScheme::Tradicional),
            &params(),
            &SimulationPolicy::default(),
            Period::Annual
        )
        .is_err());
    }
}

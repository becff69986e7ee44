use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::rubro::{VehicleFixedCosts, VehicleScheme};
use crate::types::{EntityId, Money};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: EntityId,
    pub plate: String,
    pub scheme: VehicleScheme,
    #[serde(default)]
    pub fixed_costs: VehicleFixedCosts,
    /// Kilometres per gallon. Routes may override it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fuel_km_per_gallon: Option<Decimal>,
}

/// One leg of a circuit, ending at `municipality_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Leg {
    pub municipality_id: EntityId,
    pub distance_km: Decimal,
    #[serde(default)]
    pub toll: Money,
    /// Deliveries made at the stop, for delivery-weighted splits.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deliveries: Option<Decimal>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrequencyUnit {
    Day,
    Week,
    Fortnight,
    Month,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Frequency {
    pub trips: Decimal,
    pub per: FrequencyUnit,
}

impl Frequency {
    /// Trips per month. Weeks convert at 52/12, fortnights at 26/12.
    pub fn trips_per_month(&self, working_days_per_month: Decimal) -> Decimal {
        match self.per {
            FrequencyUnit::Day => self.trips * working_days_per_month,
            FrequencyUnit::Week => self.trips * dec!(52) / dec!(12),
            FrequencyUnit::Fortnight => self.trips * dec!(26) / dec!(12),
            FrequencyUnit::Month => self.trips,
        }
    }
}

/// Pernocta requirement of a circuit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Overnight {
    pub nights_per_trip: Decimal,
    /// Auxiliaries travelling with the driver; always company-paid.
    #[serde(default)]
    pub helpers: u32,
    #[serde(default)]
    pub parking: bool,
}

/// How a route's cost is spread over its stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FreightSplit {
    #[default]
    Equal,
    ByDeliveries,
}

/// A closed delivery circuit served by one vehicle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Route {
    pub id: EntityId,
    pub brand_id: EntityId,
    pub name: String,
    pub vehicle_id: EntityId,
    pub legs: Vec<Leg>,
    pub frequency: Frequency,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overnight: Option<Overnight>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fuel_km_per_gallon: Option<Decimal>,
    /// Flete base charged per trip.
    #[serde(default)]
    pub base_freight_per_trip: Money,
    #[serde(default)]
    pub freight_split: FreightSplit,
}

impl Route {
    pub fn circuit_km(&self) -> Decimal {
        self.legs.iter().map(|l| l.distance_km).sum()
    }

    pub fn tolls_per_trip(&self) -> Money {
        self.legs.iter().map(|l| l.toll).sum()
    }

    /// Distinct municipalities on the circuit in first-visit order, with
    /// their summed deliveries.
    pub fn stops(&self) -> Vec<(EntityId, Decimal)> {
        let mut stops: Vec<(EntityId, Decimal)> = Vec::new();
        for leg in &self.legs {
            let deliveries = leg.deliveries.unwrap_or(Decimal::ZERO);
            match stops.iter_mut().find(|(id, _)| *id == leg.municipality_id) {
                Some((_, d)) => *d += deliveries,
                None => stops.push((leg.municipality_id, deliveries)),
            }
        }
        stops
    }
}

/// Unit prices used by route costing, shared by every route of a scenario.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LogisticsParams {
    pub fuel_price_per_gallon: Money,
    pub driver_meals_per_night: Money,
    pub driver_lodging_per_night: Money,
    pub helper_meals_per_night: Money,
    pub helper_lodging_per_night: Money,
    pub parking_per_night: Money,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leg(m: EntityId, km: Decimal, toll: Money, deliveries: Option<Decimal>) -> Leg {
        Leg {
            municipality_id: m,
            distance_km: km,
            toll,
            deliveries,
        }
    }

    fn route(legs: Vec<Leg>, frequency: Frequency) -> Route {
        Route {
            id: 1,
            brand_id: 1,
            name: "Circuito Norte".into(),
            vehicle_id: 1,
            legs,
            frequency,
            overnight: None,
            fuel_km_per_gallon: None,
            base_freight_per_trip: Decimal::ZERO,
            freight_split: FreightSplit::Equal,
        }
    }

    #[test]
    fn test_trips_per_month_conversions() {
        let weekly = Frequency { trips: dec!(3), per: FrequencyUnit::Week };
        assert_eq!(weekly.trips_per_month(dec!(24)), dec!(13));
        let daily = Frequency { trips: dec!(1), per: FrequencyUnit::Day };
        assert_eq!(daily.trips_per_month(dec!(24)), dec!(24));
        let monthly = Frequency { trips: dec!(2), per: FrequencyUnit::Month };
        assert_eq!(monthly.trips_per_month(dec!(24)), dec!(2));
    }

    #[test]
    fn test_circuit_totals_and_stops() {
        let r = route(
            vec![
                leg(10, dec!(40), dec!(12_000), Some(dec!(5))),
                leg(11, dec!(25), dec!(0), Some(dec!(2))),
                leg(10, dec!(65), dec!(12_000), Some(dec!(1))),
            ],
            Frequency { trips: dec!(1), per: FrequencyUnit::Week },
        );
        assert_eq!(r.circuit_km(), dec!(130));
        assert_eq!(r.tolls_per_trip(), dec!(24_000));
        assert_eq!(r.stops(), vec![(10, dec!(6)), (11, dec!(2))]);
    }
}

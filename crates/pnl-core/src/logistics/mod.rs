pub mod attribution;
pub mod fleet;
pub mod route;

pub use attribution::{attribute_to_zones, split_to_stops, LogisticsAttribution};
pub use fleet::{cost_fleet, FleetCosting, VehicleFixedCost};
pub use route::{cost_route, overnight_per_trip, RouteCost, StopCost};

pub mod commercial;
pub mod hierarchy;
pub mod logistics;
pub mod rubro;
pub mod scenario;

pub use commercial::{DiscountConfig, DiscountTier, TaxConfig};
pub use hierarchy::{Brand, BrandOperation, Municipality, Operation, Zone, ZoneCoverage};
pub use logistics::{
    Frequency, FrequencyUnit, FreightSplit, Leg, LogisticsParams, Overnight, Route, Vehicle,
};
pub use rubro::{
    AllocationMode, Category, Rubro, RubroKind, Staff, VehicleFixedCosts, VehicleRubro,
    VehicleScheme,
};
pub use scenario::{Scenario, ScenarioIndex, ScenarioKind};

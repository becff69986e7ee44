use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::commercial::TaxConfig;
use super::hierarchy::{Brand, BrandOperation, Municipality, Operation, Zone, ZoneCoverage};
use super::logistics::{LogisticsParams, Route, Vehicle};
use super::rubro::Rubro;
use crate::types::EntityId;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioKind {
    #[default]
    Budget,
    Forecast,
    Actual,
}

/// The full entity graph of one scenario. Read-only during a computation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Scenario {
    pub id: EntityId,
    pub name: String,
    pub year: i32,
    pub kind: ScenarioKind,
    pub active: bool,
    pub brands: Vec<Brand>,
    pub operations: Vec<Operation>,
    pub brand_operations: Vec<BrandOperation>,
    pub zones: Vec<Zone>,
    pub municipalities: Vec<Municipality>,
    pub coverages: Vec<ZoneCoverage>,
    pub rubros: Vec<Rubro>,
    pub vehicles: Vec<Vehicle>,
    pub routes: Vec<Route>,
    pub logistics: LogisticsParams,
    pub tax: TaxConfig,
}

/// Id lookups over a borrowed scenario.
pub struct ScenarioIndex<'a> {
    pub scenario: &'a Scenario,
    brands: BTreeMap<EntityId, &'a Brand>,
    operations: BTreeMap<EntityId, &'a Operation>,
    zones: BTreeMap<EntityId, &'a Zone>,
    municipalities: BTreeMap<EntityId, &'a Municipality>,
    vehicles: BTreeMap<EntityId, &'a Vehicle>,
}

impl<'a> ScenarioIndex<'a> {
    pub fn new(scenario: &'a Scenario) -> Self {
        Self {
            scenario,
            brands: scenario.brands.iter().map(|b| (b.id, b)).collect(),
            operations: scenario.operations.iter().map(|o| (o.id, o)).collect(),
            zones: scenario.zones.iter().map(|z| (z.id, z)).collect(),
            municipalities: scenario.municipalities.iter().map(|m| (m.id, m)).collect(),
            vehicles: scenario.vehicles.iter().map(|v| (v.id, v)).collect(),
        }
    }

    pub fn brand(&self, id: EntityId) -> Option<&'a Brand> {
        self.brands.get(&id).copied()
    }

    pub fn operation(&self, id: EntityId) -> Option<&'a Operation> {
        self.operations.get(&id).copied()
    }

    pub fn zone(&self, id: EntityId) -> Option<&'a Zone> {
        self.zones.get(&id).copied()
    }

    pub fn municipality(&self, id: EntityId) -> Option<&'a Municipality> {
        self.municipalities.get(&id).copied()
    }

    pub fn vehicle(&self, id: EntityId) -> Option<&'a Vehicle> {
        self.vehicles.get(&id).copied()
    }

    /// Brand→operation links, in operation id order.
    pub fn brand_operations(&self, brand_id: EntityId) -> Vec<&'a BrandOperation> {
        let mut links: Vec<&BrandOperation> = self
            .scenario
            .brand_operations
            .iter()
            .filter(|bo| bo.brand_id == brand_id)
            .collect();
        links.sort_by_key(|bo| bo.operation_id);
        links
    }

    pub fn zones_of_operation(&self, operation_id: EntityId) -> Vec<&'a Zone> {
        // BTreeMap iteration keeps id order.
        self.zones
            .values()
            .copied()
            .filter(|z| z.operation_id == operation_id)
            .collect()
    }

    pub fn coverages_of_zone(&self, zone_id: EntityId) -> Vec<&'a ZoneCoverage> {
        let mut cov: Vec<&ZoneCoverage> = self
            .scenario
            .coverages
            .iter()
            .filter(|c| c.zone_id == zone_id)
            .collect();
        cov.sort_by_key(|c| c.municipality_id);
        cov
    }

    pub fn zones_serving(&self, municipality_id: EntityId) -> Vec<&'a ZoneCoverage> {
        let mut cov: Vec<&ZoneCoverage> = self
            .scenario
            .coverages
            .iter()
            .filter(|c| c.municipality_id == municipality_id)
            .collect();
        cov.sort_by_key(|c| c.zone_id);
        cov
    }

    pub fn rubros_of_brand(&self, brand_id: EntityId) -> impl Iterator<Item = &'a Rubro> {
        self.scenario
            .rubros
            .iter()
            .filter(move |r| r.brand_id == brand_id)
    }

    pub fn routes_of_brand(&self, brand_id: EntityId) -> impl Iterator<Item = &'a Route> {
        self.scenario
            .routes
            .iter()
            .filter(move |r| r.brand_id == brand_id)
    }

    /// Zones reachable from a brand through its operations, in id order.
    pub fn brand_zones(&self, brand_id: EntityId) -> Vec<&'a Zone> {
        let mut zones: Vec<&Zone> = self
            .brand_operations(brand_id)
            .iter()
            .flat_map(|bo| self.zones_of_operation(bo.operation_id))
            .collect();
        zones.sort_by_key(|z| z.id);
        zones.dedup_by_key(|z| z.id);
        zones
    }
}

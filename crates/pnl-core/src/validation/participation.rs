//! Participation checks: do sibling weights add to ~100%?
//!
//! Checks only report. Weights are never normalised here; the cascade
//! consumes them raw.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::report::{ConfigWarning, ValidationReport};
use crate::model::ScenarioIndex;
use crate::types::{EntityId, EntityLevel, Percent};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParticipationCheck {
    /// Level of the weighted children.
    pub level: EntityLevel,
    pub parent_level: EntityLevel,
    pub parent_id: EntityId,
    pub sum: Percent,
    /// sum - 100
    pub deviation: Percent,
    pub valid: bool,
    pub members: usize,
}

/// Sum of the weights and whether it lies within `tolerance` of 100.
pub fn participation_sum(weights: &[Percent], tolerance: Percent) -> (Percent, bool) {
    let sum: Decimal = weights.iter().copied().sum();
    let valid = !weights.is_empty() && (sum - dec!(100)).abs() <= tolerance;
    (sum, valid)
}

pub fn check_participation(
    level: EntityLevel,
    parent_level: EntityLevel,
    parent_id: EntityId,
    weights: &[Percent],
    tolerance: Percent,
) -> ParticipationCheck {
    let (sum, valid) = participation_sum(weights, tolerance);
    ParticipationCheck {
        level,
        parent_level,
        parent_id,
        sum,
        deviation: sum - dec!(100),
        valid,
        members: weights.len(),
    }
}

/// Run every hierarchy-level participation check for one brand:
/// brand→operation, each operation→zone, each zone→municipality.
pub fn validate_brand_participation(
    index: &ScenarioIndex<'_>,
    brand_id: EntityId,
    tolerance: Percent,
    report: &mut ValidationReport,
) {
    let links = index.brand_operations(brand_id);
    let weights: Vec<Percent> = links.iter().map(|l| l.participation).collect();
    report.check(check_participation(
        EntityLevel::Operation,
        EntityLevel::Brand,
        brand_id,
        &weights,
        tolerance,
    ));

    for link in links {
        let zones = index.zones_of_operation(link.operation_id);
        let weights: Vec<Percent> = zones.iter().map(|z| z.participation_in_operation).collect();
        report.check(check_participation(
            EntityLevel::Zone,
            EntityLevel::Operation,
            link.operation_id,
            &weights,
            tolerance,
        ));

        for zone in zones {
            let weights: Vec<Percent> = index
                .coverages_of_zone(zone.id)
                .iter()
                .map(|c| c.participation_in_zone)
                .collect();
            report.check(check_participation(
                EntityLevel::Municipality,
                EntityLevel::Zone,
                zone.id,
                &weights,
                tolerance,
            ));
        }
    }
}

/// Structural problems in the graph: dangling ids, negative weights and
/// municipalities no zone covers.
pub fn validate_references(index: &ScenarioIndex<'_>, report: &mut ValidationReport) {
    let scenario = index.scenario;
    for municipality in &scenario.municipalities {
        let covered = index
            .zones_serving(municipality.id)
            .iter()
            .any(|c| index.zone(c.zone_id).is_some());
        if !covered {
            report.warn(ConfigWarning::MunicipalityWithoutZone {
                municipality_id: municipality.id,
            });
        }
    }
    for link in &scenario.brand_operations {
        if index.operation(link.operation_id).is_none() {
            report.error(
                EntityLevel::Operation,
                link.operation_id,
                format!("referenced by brand {} but not defined", link.brand_id),
            );
        }
        if link.participation < Decimal::ZERO {
            report.error(
                EntityLevel::Operation,
                link.operation_id,
                format!("negative participation {} in brand {}", link.participation, link.brand_id),
            );
        }
    }
    for zone in &scenario.zones {
        if index.operation(zone.operation_id).is_none() {
            report.error(
                EntityLevel::Zone,
                zone.id,
                format!("operation {} not defined", zone.operation_id),
            );
        }
        if zone.participation_in_operation < Decimal::ZERO {
            report.error(
                EntityLevel::Zone,
                zone.id,
                format!("negative participation {}", zone.participation_in_operation),
            );
        }
    }
    for cov in &scenario.coverages {
        if index.zone(cov.zone_id).is_none() || index.municipality(cov.municipality_id).is_none() {
            report.error(
                EntityLevel::Municipality,
                cov.municipality_id,
                format!("coverage by zone {} references an undefined entity", cov.zone_id),
            );
        }
        if cov.participation_in_zone < Decimal::ZERO {
            report.error(
                EntityLevel::Municipality,
                cov.municipality_id,
                format!("negative participation {} in zone {}", cov.participation_in_zone, cov.zone_id),
            );
        }
    }
}

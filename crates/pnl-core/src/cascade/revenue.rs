//! Revenue Cascade: Brand → Operation → Zone → Municipality.
//!
//! Each level is split independently with [`allocate_exact`], so the
//! rounding noise of one level never compounds into the next: a zone's
//! municipalities always add up to the zone's own (already reconciled)
//! figure.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::{ParticipationMode, SimulationPolicy};
use crate::model::{Brand, ScenarioIndex};
use crate::reconcile::{allocate_exact, round_money, Allocation, WeightBasis};
use crate::types::{EntityId, EntityLevel, Money, Percent, Period};
use crate::validation::{ConfigWarning, ValidationReport};
use crate::PnlResult;

/// Revenue reaching one operation or zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenueShare {
    pub id: EntityId,
    pub parent_id: EntityId,
    pub weight: Percent,
    pub revenue: Money,
}

/// Revenue a municipality receives through one of the zones serving it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MunicipalityRevenue {
    pub municipality_id: EntityId,
    pub zone_id: EntityId,
    pub weight: Percent,
    pub revenue: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenueCascade {
    pub brand_id: EntityId,
    pub period: Period,
    pub brand_revenue: Money,
    pub operations: Vec<RevenueShare>,
    pub zones: Vec<RevenueShare>,
    pub municipalities: Vec<MunicipalityRevenue>,
}

impl RevenueCascade {
    pub fn operation_revenue(&self, id: EntityId) -> Money {
        self.operations
            .iter()
            .filter(|s| s.id == id)
            .map(|s| s.revenue)
            .sum()
    }

    pub fn zone_revenue(&self, id: EntityId) -> Money {
        self.zones
            .iter()
            .filter(|s| s.id == id)
            .map(|s| s.revenue)
            .sum()
    }

    /// Revenue of a municipality summed over every zone serving it.
    pub fn municipality_revenue(&self, id: EntityId) -> Money {
        self.municipalities
            .iter()
            .filter(|m| m.municipality_id == id)
            .map(|m| m.revenue)
            .sum()
    }

    pub fn municipality_in_zone(&self, zone_id: EntityId, municipality_id: EntityId) -> Money {
        self.municipalities
            .iter()
            .filter(|m| m.zone_id == zone_id && m.municipality_id == municipality_id)
            .map(|m| m.revenue)
            .sum()
    }

    /// Municipalities of one zone with their revenue, in id order.
    pub fn zone_municipalities(&self, zone_id: EntityId) -> Vec<&MunicipalityRevenue> {
        self.municipalities
            .iter()
            .filter(|m| m.zone_id == zone_id)
            .collect()
    }
}

/// Split `parent` over weighted children following the participation mode.
pub fn distribute(
    parent: Money,
    children: &[(EntityId, Percent)],
    mode: ParticipationMode,
    dp: u32,
) -> Allocation<EntityId> {
    let basis = match mode {
        ParticipationMode::AsIs => WeightBasis::Percent,
        ParticipationMode::Normalize => WeightBasis::Proportional,
    };
    allocate_exact(parent, children, basis, dp)
}

/// Record what one split did to the report: the reconciliation delta, any
/// undistributed amount, and a negative absorber as an anomaly.
pub(crate) fn record_split(
    alloc: &Allocation<EntityId>,
    level: EntityLevel,
    parent_id: EntityId,
    parent_total: Money,
    strict: bool,
    report: &mut ValidationReport,
) -> PnlResult<()> {
    report.reconcile(level, parent_id, parent_total, alloc.allocated());
    if !alloc.undistributed.is_zero() {
        report.warn(ConfigWarning::Undistributed {
            level,
            parent_id,
            amount: alloc.undistributed,
        });
    }
    if alloc.absorber_negative() {
        let absorber = alloc.absorber.unwrap_or(parent_id);
        report.anomaly(
            strict,
            format!("{level} split of {parent_id}"),
            format!("largest share {absorber} went negative absorbing the residual"),
            alloc.share_of(absorber),
        )?;
    }
    Ok(())
}

/// Cascade one brand's revenue for `period` down to municipalities.
///
/// A brand whose revenue series is unusable is recorded as a data error and
/// cascades zero, so its costs are still reported.
pub fn cascade_revenue(
    index: &ScenarioIndex<'_>,
    brand: &Brand,
    period: Period,
    policy: &SimulationPolicy,
    report: &mut ValidationReport,
) -> PnlResult<RevenueCascade> {
    let dp = policy.rounding_dp;
    let strict = policy.strict_invariants;
    let mode = policy.participation_mode;

    let raw_revenue = match brand.revenue_for(period) {
        Ok(v) => v,
        Err(reason) => {
            report.error(EntityLevel::Brand, brand.id, reason);
            Decimal::ZERO
        }
    };
    // The cascade starts from whole currency units.
    let brand_revenue = round_money(raw_revenue, dp);
    if brand_revenue != raw_revenue {
        report.reconcile(EntityLevel::Brand, brand.id, raw_revenue, brand_revenue);
    }

    // Brand → Operation
    let links: Vec<(EntityId, Percent)> = index
        .brand_operations(brand.id)
        .into_iter()
        .filter(|l| index.operation(l.operation_id).is_some())
        .map(|l| (l.operation_id, l.participation))
        .collect();
    let op_alloc = distribute(brand_revenue, &links, mode, dp);
    record_split(&op_alloc, EntityLevel::Operation, brand.id, brand_revenue, strict, report)?;

    let operations: Vec<RevenueShare> = links
        .iter()
        .zip(&op_alloc.shares)
        .map(|((id, weight), (_, revenue))| RevenueShare {
            id: *id,
            parent_id: brand.id,
            weight: *weight,
            revenue: *revenue,
        })
        .collect();

    // Operation → Zone
    let mut zones = Vec::new();
    for op in &operations {
        let children: Vec<(EntityId, Percent)> = index
            .zones_of_operation(op.id)
            .iter()
            .map(|z| (z.id, z.participation_in_operation))
            .collect();
        let alloc = distribute(op.revenue, &children, mode, dp);
        record_split(&alloc, EntityLevel::Zone, op.id, op.revenue, strict, report)?;
        zones.extend(children.iter().zip(&alloc.shares).map(
            |((id, weight), (_, revenue))| RevenueShare {
                id: *id,
                parent_id: op.id,
                weight: *weight,
                revenue: *revenue,
            },
        ));
    }

    // Zone → Municipality
    let mut municipalities = Vec::new();
    for zone in &zones {
        let children: Vec<(EntityId, Percent)> = index
            .coverages_of_zone(zone.id)
            .iter()
            .filter(|c| index.municipality(c.municipality_id).is_some())
            .map(|c| (c.municipality_id, c.participation_in_zone))
            .collect();
        let alloc = distribute(zone.revenue, &children, mode, dp);
        record_split(&alloc, EntityLevel::Municipality, zone.id, zone.revenue, strict, report)?;
        municipalities.extend(children.iter().zip(&alloc.shares).map(
            |((id, weight), (_, revenue))| MunicipalityRevenue {
                municipality_id: *id,
                zone_id: zone.id,
                weight: *weight,
                revenue: *revenue,
            },
        ));
    }

    tracing::debug!(
        brand = brand.id,
        %period,
        revenue = %brand_revenue,
        operations = operations.len(),
        zones = zones.len(),
        municipalities = municipalities.len(),
        "revenue cascaded"
    );

    Ok(RevenueCascade {
        brand_id: brand.id,
        period,
        brand_revenue,
        operations,
        zones,
        municipalities,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        Brand, BrandOperation, DiscountConfig, Municipality, Operation, Scenario, Zone,
        ZoneCoverage,
    };
    use chrono::Month;
    use rust_decimal_macros::dec;

    fn scenario(op_weights: &[Percent], muni_weights: &[Percent]) -> Scenario {
        let mut s = Scenario {
            brands: vec![Brand {
                id: 1,
                name: "Brand".into(),
                monthly_revenue: vec![dec!(1_000_000); 12],
                discount: DiscountConfig::default(),
            }],
            ..Default::default()
        };
        for (i, w) in op_weights.iter().enumerate() {
            let op_id = 10 + i as EntityId;
            s.operations.push(Operation {
                id: op_id,
                name: format!("Op {op_id}"),
                code: format!("OP{op_id}"),
                ica_rate: dec!(0.01),
            });
            s.brand_operations.push(BrandOperation {
                brand_id: 1,
                operation_id: op_id,
                participation: *w,
            });
            s.zones.push(Zone {
                id: 100 + i as EntityId,
                name: format!("Zone {op_id}"),
                operation_id: op_id,
                participation_in_operation: dec!(100),
            });
        }
        for (i, w) in muni_weights.iter().enumerate() {
            let m = 1000 + i as EntityId;
            s.municipalities.push(Municipality {
                id: m,
                name: format!("M{m}"),
                code: format!("{m}"),
            });
            s.coverages.push(ZoneCoverage {
                zone_id: 100,
                municipality_id: m,
                participation_in_zone: *w,
                coverage_weight: None,
            });
        }
        s
    }

    fn run(s: &Scenario, period: Period) -> (RevenueCascade, ValidationReport) {
        let index = ScenarioIndex::new(s);
        let mut report = ValidationReport::default();
        let cascade = cascade_revenue(
            &index,
            &s.brands[0],
            period,
            &SimulationPolicy::default(),
            &mut report,
        )
        .unwrap();
        (cascade, report)
    }

    #[test]
    fn test_fifty_thirty_twenty_is_exact() {
        let s = scenario(&[dec!(50), dec!(30), dec!(20)], &[]);
        let (c, _) = run(&s, Period::Month(Month::January));
        assert_eq!(c.operation_revenue(10), dec!(500_000));
        assert_eq!(c.operation_revenue(11), dec!(300_000));
        assert_eq!(c.operation_revenue(12), dec!(200_000));
    }

    #[test]
    fn test_thirds_conserve_brand_revenue() {
        let s = scenario(&[dec!(33.33), dec!(33.33), dec!(33.34)], &[]);
        let (c, _) = run(&s, Period::Month(Month::June));
        let total: Money = c.operations.iter().map(|o| o.revenue).sum();
        assert_eq!(total, dec!(1_000_000));
        assert_eq!(c.operation_revenue(12), dec!(333_400));
    }

    #[test]
    fn test_zone_revenue_equals_single_operation() {
        let s = scenario(&[dec!(100)], &[]);
        let (c, _) = run(&s, Period::Annual);
        assert_eq!(c.brand_revenue, dec!(12_000_000));
        assert_eq!(c.zone_revenue(100), dec!(12_000_000));
    }

    #[test]
    fn test_municipalities_sum_to_zone() {
        let s = scenario(&[dec!(100)], &[dec!(40), dec!(35), dec!(25)]);
        let (c, report) = run(&s, Period::Month(Month::March));
        let total: Money = c.zone_municipalities(100).iter().map(|m| m.revenue).sum();
        assert_eq!(total, c.zone_revenue(100));
        assert!(report.reconciliation.iter().all(|r| r.delta.is_zero()));
    }

    #[test]
    fn test_fractional_revenue_is_rounded_before_cascading() {
        let mut s = scenario(&[dec!(100)], &[dec!(33.33), dec!(33.33), dec!(33.34)]);
        s.brands[0].monthly_revenue = vec![dec!(1000.6); 12];
        let (c, report) = run(&s, Period::Month(Month::January));
        assert_eq!(c.brand_revenue, dec!(1001));
        assert_eq!(c.zone_revenue(100), dec!(1001));
        for m in &c.municipalities {
            assert_eq!(m.revenue, m.revenue.round(), "municipality {}", m.municipality_id);
        }
        let total: Money = c.municipalities.iter().map(|m| m.revenue).sum();
        assert_eq!(total, dec!(1001));

        let brand_delta = report
            .reconciliation
            .iter()
            .find(|r| r.level == EntityLevel::Brand)
            .unwrap();
        assert_eq!(brand_delta.parent_total, dec!(1000.6));
        assert_eq!(brand_delta.delta, dec!(-0.4));
    }

    #[test]
    fn test_bad_series_cascades_zero_and_records_error() {
        let mut s = scenario(&[dec!(100)], &[]);
        s.brands[0].monthly_revenue.pop();
        let (c, report) = run(&s, Period::Annual);
        assert_eq!(c.brand_revenue, Decimal::ZERO);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].level, EntityLevel::Brand);
    }

    #[test]
    fn test_zone_without_municipalities_warns_undistributed() {
        let s = scenario(&[dec!(100)], &[]);
        let (_, report) = run(&s, Period::Month(Month::January));
        assert!(report.warnings.iter().any(|w| matches!(
            w,
            ConfigWarning::Undistributed { level: EntityLevel::Municipality, .. }
        )));
    }

    #[test]
    fn test_overweight_shifts_gap_to_largest() {
        // 60 + 70 = 130: the 70 child absorbs the 30-point excess.
        let s = scenario(&[dec!(60), dec!(70)], &[]);
        let (c, report) = run(&s, Period::Month(Month::January));
        assert_eq!(c.operation_revenue(10), dec!(600_000));
        assert_eq!(c.operation_revenue(11), dec!(400_000));
        assert!(report.anomalies.is_empty());
    }

    #[test]
    fn test_negative_absorber_records_anomaly() {
        let s = scenario(&[dec!(80), dec!(70), dec!(75)], &[]);
        let (c, report) = run(&s, Period::Month(Month::January));
        assert_eq!(c.operation_revenue(10), dec!(-450_000));
        assert_eq!(report.anomalies.len(), 1);
    }

    #[test]
    fn test_strict_policy_aborts_on_negative_absorber() {
        let s = scenario(&[dec!(80), dec!(70), dec!(75)], &[]);
        let index = ScenarioIndex::new(&s);
        let policy = SimulationPolicy {
            strict_invariants: true,
            ..Default::default()
        };
        let mut report = ValidationReport::default();
        let res = cascade_revenue(&index, &s.brands[0], Period::Annual, &policy, &mut report);
        assert!(res.is_err());
    }

    #[test]
    fn test_cascade_is_idempotent() {
        let s = scenario(&[dec!(45.5), dec!(54.5)], &[dec!(33), dec!(33), dec!(34)]);
        let (a, _) = run(&s, Period::Annual);
        let (b, _) = run(&s, Period::Annual);
        assert_eq!(a, b);
    }
}

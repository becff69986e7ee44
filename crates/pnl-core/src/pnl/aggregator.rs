//! Composes cascade, route costing, allocation and tax into per-entity P&L.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Instant;

use super::statement::{ConsolidatedSummary, EntityPnl, IncomeStatement};
use crate::allocation::{
    allocate_costs, collect_zone_metrics, CostBreakdown, CriterionRegistry, RubroAllocation,
};
use crate::cascade::{cascade_revenue, RevenueCascade};
use crate::config::SimulationPolicy;
use crate::error::PnlError;
use crate::logistics::{
    attribute_to_zones, cost_fleet, FleetCosting, LogisticsAttribution, RouteCost,
    VehicleFixedCost,
};
use crate::model::{Brand, Category, RubroKind, Scenario, ScenarioIndex};
use crate::reconcile::{allocate_exact, WeightBasis};
use crate::tax::{
    brand_discount, ica, prorate_income_tax, IncomeTaxAllocation, OtherIncome, WeightedDiscount,
};
use crate::types::{with_metadata, ComputationOutput, EntityId, EntityLevel, Money, Period};
use crate::validation::{
    validate_brand_participation, validate_references, ConfigWarning, ValidationReport,
};
use crate::PnlResult;

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

/// Full P&L of one brand for one period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrandPnl {
    pub brand_id: EntityId,
    pub brand_name: String,
    pub period: Period,
    pub summary: ConsolidatedSummary,
    pub discount: WeightedDiscount,
    pub income_tax: IncomeTaxAllocation,
    pub operations: Vec<EntityPnl>,
    pub zones: Vec<EntityPnl>,
    pub municipalities: Vec<EntityPnl>,
    pub routes: Vec<RouteCost>,
    pub rubros: Vec<RubroAllocation>,
    pub validation: ValidationReport,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioPnl {
    pub scenario_id: EntityId,
    pub scenario_name: String,
    pub period: Period,
    pub summary: ConsolidatedSummary,
    pub brands: Vec<BrandPnl>,
    pub vehicles: Vec<VehicleFixedCost>,
    /// Scenario-wide findings: references, fleet costing, inactive scenario.
    pub validation: ValidationReport,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthSummary {
    pub period: Period,
    pub summary: ConsolidatedSummary,
}

/// Twelve monthly runs side by side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyProjection {
    pub scenario_id: EntityId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand_id: Option<EntityId>,
    pub months: Vec<MonthSummary>,
    /// Sum of the twelve months. Tax is the sum of the monthly assessments.
    pub total: ConsolidatedSummary,
    pub validation: ValidationReport,
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Simulate one brand of a scenario.
pub fn simulate_brand(
    scenario: &Scenario,
    brand_id: EntityId,
    period: Period,
    policy: &SimulationPolicy,
) -> PnlResult<ComputationOutput<BrandPnl>> {
    let start = Instant::now();
    check_inputs(scenario, policy)?;
    let index = ScenarioIndex::new(scenario);
    let brand = index.brand(brand_id).ok_or_else(|| PnlError::InvalidInput {
        field: "brand_id".into(),
        reason: format!("brand {brand_id} is not part of scenario {}", scenario.id),
    })?;
    let registry = CriterionRegistry::standard();

    let fleet = cost_fleet(&index, policy, period)?;
    let mut pnl = compute_brand(&index, brand, period, policy, &registry, &fleet)?;

    let mut scenario_report = scenario_checks(&index);
    scenario_report.merge(brand_scoped(&fleet.report, &pnl.routes));
    pnl.validation.merge(scenario_report);

    let warnings = pnl.validation.messages();
    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Brand P&L: participation cascade, route costing, shared-cost proration, consolidated income tax",
        &assumptions(scenario, period, policy),
        warnings,
        elapsed,
        pnl,
    ))
}

/// Simulate every brand of a scenario, each on its own thread.
pub fn simulate_scenario(
    scenario: &Scenario,
    period: Period,
    policy: &SimulationPolicy,
) -> PnlResult<ComputationOutput<ScenarioPnl>> {
    let start = Instant::now();
    check_inputs(scenario, policy)?;
    let index = ScenarioIndex::new(scenario);
    let registry = CriterionRegistry::standard();

    let result = run_scenario(&index, period, policy, &registry)?;

    let mut warnings = result.validation.messages();
    for b in &result.brands {
        warnings.extend(
            b.validation
                .messages()
                .into_iter()
                .map(|m| format!("brand {}: {m}", b.brand_id)),
        );
    }
    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Scenario P&L: per-brand cascade and costing, consolidated per brand",
        &assumptions(scenario, period, policy),
        warnings,
        elapsed,
        result,
    ))
}

/// Run the twelve months of the scenario, optionally for one brand only.
pub fn project_months(
    scenario: &Scenario,
    brand_id: Option<EntityId>,
    policy: &SimulationPolicy,
) -> PnlResult<ComputationOutput<MonthlyProjection>> {
    let start = Instant::now();
    check_inputs(scenario, policy)?;
    let index = ScenarioIndex::new(scenario);
    if let Some(id) = brand_id {
        if index.brand(id).is_none() {
            return Err(PnlError::InvalidInput {
                field: "brand_id".into(),
                reason: format!("brand {id} is not part of scenario {}", scenario.id),
            });
        }
    }
    let registry = CriterionRegistry::standard();

    let mut months = Vec::with_capacity(12);
    let mut total = ConsolidatedSummary::default();
    let mut validation = scenario_checks(&index);
    for period in Period::months() {
        let fleet = cost_fleet(&index, policy, period)?;
        let brands: Vec<&Brand> = scenario
            .brands
            .iter()
            .filter(|b| brand_id.map_or(true, |id| b.id == id))
            .collect();
        let results = run_brands(&index, &brands, period, policy, &registry, &fleet)?;

        let mut summary = ConsolidatedSummary::default();
        for b in results {
            summary.absorb(&b.summary);
            validation.merge(b.validation.for_period(period));
        }
        validation.merge(fleet.report.for_period(period));
        total.absorb(&summary);
        months.push(MonthSummary { period, summary });
    }

    let warnings = validation.messages();
    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Monthly P&L projection: twelve independent monthly simulations",
        &serde_json::json!({
            "scenario": scenario.id,
            "brand": brand_id,
            "policy": policy,
        }),
        warnings,
        elapsed,
        MonthlyProjection {
            scenario_id: scenario.id,
            brand_id,
            months,
            total,
            validation,
        },
    ))
}

/// Participation and reference checks only; nothing is computed.
pub fn validate_scenario(
    scenario: &Scenario,
    policy: &SimulationPolicy,
) -> PnlResult<ComputationOutput<ValidationReport>> {
    let start = Instant::now();
    policy.validate()?;
    let index = ScenarioIndex::new(scenario);
    let mut report = scenario_checks(&index);
    for brand in &scenario.brands {
        validate_brand_participation(&index, brand.id, policy.participation_tolerance, &mut report);
        if let Err(reason) = brand.revenue_for(Period::Annual) {
            report.error(EntityLevel::Brand, brand.id, reason);
        }
        brand_discount(brand.id, &brand.discount, &mut report);
    }

    let warnings = report.messages();
    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Participation validation: sibling weights against 100% within tolerance",
        &serde_json::json!({
            "scenario": scenario.id,
            "tolerance": policy.participation_tolerance,
        }),
        warnings,
        elapsed,
        report,
    ))
}

/// Route and fleet costing only.
pub fn cost_routes(
    scenario: &Scenario,
    period: Period,
    policy: &SimulationPolicy,
) -> PnlResult<ComputationOutput<FleetCosting>> {
    let start = Instant::now();
    let index = ScenarioIndex::new(scenario);
    let fleet = cost_fleet(&index, policy, period)?;

    let warnings = fleet.report.messages();
    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Route costing: fuel, tolls, overnight, base freight and vehicle fixed-cost share",
        &serde_json::json!({
            "scenario": scenario.id,
            "period": period,
            "fixed_cost_basis": policy.fixed_cost_basis,
            "working_days_per_month": policy.working_days_per_month,
        }),
        warnings,
        elapsed,
        fleet,
    ))
}

// ---------------------------------------------------------------------------
// Orchestration
// ---------------------------------------------------------------------------

fn check_inputs(scenario: &Scenario, policy: &SimulationPolicy) -> PnlResult<()> {
    policy.validate()?;
    if scenario.brands.is_empty() {
        return Err(PnlError::InsufficientData(format!(
            "scenario {} has no brands",
            scenario.id
        )));
    }
    let rate = scenario.tax.income_tax_rate;
    if rate < Decimal::ZERO || rate > Decimal::ONE {
        return Err(PnlError::InvalidInput {
            field: "tax.income_tax_rate".into(),
            reason: format!("Income tax rate must be a decimal between 0 and 1, got {rate}."),
        });
    }
    Ok(())
}

fn assumptions(scenario: &Scenario, period: Period, policy: &SimulationPolicy) -> serde_json::Value {
    serde_json::json!({
        "scenario": scenario.id,
        "year": scenario.year,
        "kind": scenario.kind,
        "period": period,
        "income_tax_rate": scenario.tax.income_tax_rate,
        "policy": policy,
    })
}

fn scenario_checks(index: &ScenarioIndex<'_>) -> ValidationReport {
    let mut report = ValidationReport::default();
    if !index.scenario.active {
        report.warn(ConfigWarning::InactiveScenario {
            scenario_id: index.scenario.id,
        });
    }
    validate_references(index, &mut report);
    report
}

/// Fleet findings relevant to one brand: errors on its routes plus every
/// vehicle-level finding.
fn brand_scoped(fleet: &ValidationReport, routes: &[RouteCost]) -> ValidationReport {
    let mut out = fleet.clone();
    out.errors.retain(|e| {
        e.level != EntityLevel::Route || routes.iter().any(|r| r.route_id == e.id)
    });
    out
}

fn run_scenario(
    index: &ScenarioIndex<'_>,
    period: Period,
    policy: &SimulationPolicy,
    registry: &CriterionRegistry,
) -> PnlResult<ScenarioPnl> {
    let scenario = index.scenario;
    let fleet = cost_fleet(index, policy, period)?;
    let brands: Vec<&Brand> = scenario.brands.iter().collect();
    let results = run_brands(index, &brands, period, policy, registry, &fleet)?;

    let mut summary = ConsolidatedSummary::default();
    for b in &results {
        summary.absorb(&b.summary);
    }
    let mut validation = scenario_checks(index);
    validation.merge(fleet.report);

    tracing::info!(
        scenario = scenario.id,
        %period,
        brands = results.len(),
        net_profit = %summary.net_profit,
        "scenario simulated"
    );

    Ok(ScenarioPnl {
        scenario_id: scenario.id,
        scenario_name: scenario.name.clone(),
        period,
        summary,
        brands: results,
        vehicles: fleet.vehicles,
        validation,
    })
}

/// Brands are independent once the fleet is costed; run them on scoped
/// threads and keep input order.
fn run_brands(
    index: &ScenarioIndex<'_>,
    brands: &[&Brand],
    period: Period,
    policy: &SimulationPolicy,
    registry: &CriterionRegistry,
    fleet: &FleetCosting,
) -> PnlResult<Vec<BrandPnl>> {
    std::thread::scope(|scope| {
        let handles: Vec<_> = brands
            .iter()
            .map(|brand| {
                scope.spawn(move || compute_brand(index, brand, period, policy, registry, fleet))
            })
            .collect();
        handles
            .into_iter()
            .zip(brands)
            .map(|(handle, brand)| {
                handle.join().unwrap_or_else(|_| {
                    Err(PnlError::InvariantViolation {
                        context: format!("brand {}", brand.id),
                        detail: "simulation thread panicked".into(),
                        delta: Decimal::ZERO,
                    })
                })
            })
            .collect()
    })
}

/// The per-brand pipeline: validation, cascade, route attribution, cost
/// allocation, zone statements, consolidated tax, then the operation and
/// municipality views.
pub fn compute_brand(
    index: &ScenarioIndex<'_>,
    brand: &Brand,
    period: Period,
    policy: &SimulationPolicy,
    registry: &CriterionRegistry,
    fleet: &FleetCosting,
) -> PnlResult<BrandPnl> {
    let _span = tracing::debug_span!("brand", id = brand.id, %period).entered();
    let dp = policy.rounding_dp;
    let strict = policy.strict_invariants;
    let mut report = ValidationReport::default();

    validate_brand_participation(index, brand.id, policy.participation_tolerance, &mut report);
    let cascade = cascade_revenue(index, brand, period, policy, &mut report)?;
    let discount = brand_discount(brand.id, &brand.discount, &mut report);
    let logistics = attribute_to_zones(index, fleet, brand.id, &cascade, policy, &mut report);
    let metrics = collect_zone_metrics(index, brand.id, &cascade, &logistics);
    let allocation = allocate_costs(index, brand.id, &metrics, registry, policy, period, &mut report);

    // -- Zones, before tax ---------------------------------------------------
    let mut zones: Vec<EntityPnl> = cascade
        .zones
        .iter()
        .map(|z| {
            let mut costs = allocation.zone(z.id);
            costs.route_costs = logistics.zone_cost(z.id);
            let ica_rate = index
                .operation(z.parent_id)
                .map(|o| o.ica_rate)
                .unwrap_or(Decimal::ZERO);
            EntityPnl {
                level: EntityLevel::Zone,
                id: z.id,
                name: index.zone(z.id).map(|x| x.name.clone()).unwrap_or_default(),
                parent_id: Some(z.parent_id),
                statement: IncomeStatement::before_tax(
                    z.revenue,
                    discount.rate,
                    costs,
                    ica(z.revenue, ica_rate, dp),
                    &brand.discount,
                    dp,
                ),
            }
        })
        .collect();

    // -- Consolidated tax, prorated to zones ---------------------------------
    let mut consolidated = IncomeStatement::sum(zones.iter().map(|z| &z.statement));
    consolidated.discount_rate = discount.rate;
    let zone_weights = revenue_weights(zones.iter().map(|z| (z.id, z.statement.revenue)));
    let income_tax = prorate_income_tax(
        consolidated.profit_before_tax,
        index.scenario.tax.income_tax_rate,
        &zone_weights,
        dp,
    );
    if !income_tax.undistributed.is_zero() {
        report.anomaly(
            strict,
            format!("income tax of brand {}", brand.id),
            "tax assessed but no zone to carry it",
            income_tax.undistributed,
        )?;
    }
    for z in &mut zones {
        z.statement.apply_income_tax(income_tax.share_of(z.id));
    }
    consolidated.apply_income_tax(income_tax.tax);

    let zone_net: Money = zones.iter().map(|z| z.statement.net_profit).sum();
    if zone_net != consolidated.net_profit {
        report.anomaly(
            strict,
            format!("net profit of brand {}", brand.id),
            "zone net profits do not add up to the consolidated figure",
            consolidated.net_profit - zone_net,
        )?;
    }

    // -- Operations: sums of their zones -------------------------------------
    let operations: Vec<EntityPnl> = cascade
        .operations
        .iter()
        .map(|op| EntityPnl {
            level: EntityLevel::Operation,
            id: op.id,
            name: index.operation(op.id).map(|o| o.name.clone()).unwrap_or_default(),
            parent_id: Some(brand.id),
            statement: IncomeStatement::sum(
                zones
                    .iter()
                    .filter(|z| z.parent_id == Some(op.id))
                    .map(|z| &z.statement),
            ),
        })
        .collect();

    // -- Municipalities ------------------------------------------------------
    let municipalities =
        municipality_statements(index, &cascade, &zones, &logistics, &income_tax, dp);
    let muni_net: Money = municipalities.iter().map(|m| m.statement.net_profit).sum();
    report.reconcile(
        EntityLevel::Municipality,
        brand.id,
        consolidated.net_profit,
        muni_net,
    );

    let summary = ConsolidatedSummary::from_statement(
        &consolidated,
        allocation.headcount,
        allocation.unallocated,
        logistics.unattributed,
    );

    tracing::debug!(
        revenue = %summary.revenue,
        pbt = %summary.profit_before_tax,
        tax = %summary.income_tax,
        net = %summary.net_profit,
        "brand simulated"
    );

    Ok(BrandPnl {
        brand_id: brand.id,
        brand_name: brand.name.clone(),
        period,
        summary,
        discount,
        income_tax,
        operations,
        zones,
        municipalities,
        routes: fleet.routes_of_brand(brand.id).cloned().collect(),
        rubros: allocation.rubros,
        validation: report,
    })
}

/// Revenue weights, or equal weights when nothing has revenue.
fn revenue_weights(items: impl Iterator<Item = (EntityId, Money)>) -> Vec<(EntityId, Money)> {
    let weights: Vec<(EntityId, Money)> = items.collect();
    if weights.iter().any(|(_, r)| *r > Decimal::ZERO) {
        weights
    } else {
        weights.into_iter().map(|(id, _)| (id, Decimal::ONE)).collect()
    }
}

/// Municipality pieces accumulated over the zones serving it.
#[derive(Default)]
struct MunicipalityParts {
    revenue: Money,
    gross_margin: Money,
    ica: Money,
    other_income: OtherIncome,
    costs: CostBreakdown,
}

/// Municipality statements. Every line of a zone statement (gross margin,
/// ICA, other income, rubro costs) is split over the zone's municipalities
/// by their revenue in it, so municipalities add up to their zones exactly.
/// Route cost is the municipality's own; income tax is the consolidated
/// assessment split by municipality revenue.
fn municipality_statements(
    index: &ScenarioIndex<'_>,
    cascade: &RevenueCascade,
    zones: &[EntityPnl],
    logistics: &LogisticsAttribution,
    income_tax: &IncomeTaxAllocation,
    dp: u32,
) -> Vec<EntityPnl> {
    let mut parts: BTreeMap<EntityId, MunicipalityParts> = BTreeMap::new();

    for zone in zones {
        let members = cascade.zone_municipalities(zone.id);
        if members.is_empty() {
            continue;
        }
        for m in &members {
            parts.entry(m.municipality_id).or_default().revenue += m.revenue;
        }

        let weights = revenue_weights(members.iter().map(|m| (m.municipality_id, m.revenue)));
        let st = &zone.statement;
        spread(st.gross_margin, &weights, dp, &mut parts, |p, v| p.gross_margin += v);
        spread(st.ica, &weights, dp, &mut parts, |p, v| p.ica += v);
        spread(st.other_income.rebate, &weights, dp, &mut parts, |p, v| {
            p.other_income.rebate += v
        });
        spread(st.other_income.financial_discount, &weights, dp, &mut parts, |p, v| {
            p.other_income.financial_discount += v
        });
        spread(st.other_income.commercial_severance, &weights, dp, &mut parts, |p, v| {
            p.other_income.commercial_severance += v
        });
        for (category, source) in [
            (Category::Comercial, &st.costs.comercial),
            (Category::Logistico, &st.costs.logistico),
            (Category::Administrativo, &st.costs.administrativo),
        ] {
            for (kind, amount) in [
                (RubroKind::Personal, source.personal),
                (RubroKind::Gasto, source.expenses),
                (RubroKind::Vehiculo, source.vehicles),
            ] {
                spread(amount, &weights, dp, &mut parts, |p, v| p.costs.add(category, kind, v));
            }
        }
    }

    for (&municipality_id, &cost) in &logistics.municipalities {
        parts.entry(municipality_id).or_default().costs.route_costs += cost;
    }

    let tax_weights = revenue_weights(parts.iter().map(|(id, p)| (*id, p.revenue)));
    let tax_split = allocate_exact(income_tax.tax, &tax_weights, WeightBasis::Proportional, dp);

    parts
        .into_iter()
        .map(|(id, p)| {
            let mut other_income = p.other_income;
            other_income.total = other_income.rebate
                + other_income.financial_discount
                + other_income.commercial_severance;
            let mut statement =
                IncomeStatement::from_parts(p.revenue, p.gross_margin, p.costs, p.ica, other_income);
            statement.apply_income_tax(tax_split.share_of(id));
            EntityPnl {
                level: EntityLevel::Municipality,
                id,
                name: index.municipality(id).map(|m| m.name.clone()).unwrap_or_default(),
                parent_id: None,
                statement,
            }
        })
        .collect()
}

/// Split one zone figure over its municipalities and fold each share in.
fn spread(
    amount: Money,
    weights: &[(EntityId, Money)],
    dp: u32,
    into: &mut BTreeMap<EntityId, MunicipalityParts>,
    apply: impl Fn(&mut MunicipalityParts, Money),
) {
    if amount.is_zero() {
        return;
    }
    let alloc = allocate_exact(amount, weights, WeightBasis::Proportional, dp);
    for (id, share) in alloc.shares {
        apply(into.entry(id).or_default(), share);
    }
}

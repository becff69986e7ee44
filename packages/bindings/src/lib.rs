use napi::Result as NapiResult;
use napi_derive::napi;

use pnl_core::model::Scenario;
use pnl_core::{Period, SimulationPolicy};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

fn parse_scenario(scenario_json: &str) -> NapiResult<Scenario> {
    serde_json::from_str(scenario_json).map_err(to_napi_error)
}

fn parse_policy(policy_json: Option<String>) -> NapiResult<SimulationPolicy> {
    let policy: SimulationPolicy = match policy_json {
        Some(json) => serde_json::from_str(&json).map_err(to_napi_error)?,
        None => SimulationPolicy::default(),
    };
    policy.validate().map_err(to_napi_error)?;
    Ok(policy)
}

fn parse_period(period: Option<String>) -> NapiResult<Period> {
    match period {
        None => Ok(Period::Annual),
        Some(raw) => Period::parse(&raw)
            .ok_or_else(|| napi::Error::from_reason(format!("invalid period '{raw}'"))),
    }
}

// ---------------------------------------------------------------------------
// Simulation
// ---------------------------------------------------------------------------

#[napi]
pub fn simulate_scenario(
    scenario_json: String,
    period: Option<String>,
    policy_json: Option<String>,
) -> NapiResult<String> {
    let scenario = parse_scenario(&scenario_json)?;
    let policy = parse_policy(policy_json)?;
    let output = pnl_core::simulate_scenario(&scenario, parse_period(period)?, &policy)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn simulate_brand(
    scenario_json: String,
    brand_id: u32,
    period: Option<String>,
    policy_json: Option<String>,
) -> NapiResult<String> {
    let scenario = parse_scenario(&scenario_json)?;
    let policy = parse_policy(policy_json)?;
    let output = pnl_core::simulate_brand(&scenario, brand_id, parse_period(period)?, &policy)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn project_months(
    scenario_json: String,
    brand_id: Option<u32>,
    policy_json: Option<String>,
) -> NapiResult<String> {
    let scenario = parse_scenario(&scenario_json)?;
    let policy = parse_policy(policy_json)?;
    let output =
        pnl_core::project_months(&scenario, brand_id, &policy).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Validation and logistics
// ---------------------------------------------------------------------------

#[napi]
pub fn validate_scenario(scenario_json: String, policy_json: Option<String>) -> NapiResult<String> {
    let scenario = parse_scenario(&scenario_json)?;
    let policy = parse_policy(policy_json)?;
    let output = pnl_core::validate_scenario(&scenario, &policy).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn cost_routes(
    scenario_json: String,
    period: Option<String>,
    policy_json: Option<String>,
) -> NapiResult<String> {
    let scenario = parse_scenario(&scenario_json)?;
    let policy = parse_policy(policy_json)?;
    let output = pnl_core::cost_routes(&scenario, parse_period(period)?, &policy)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

pub mod routes;
pub mod simulate;
pub mod validate;

use pnl_core::model::Scenario;
use pnl_core::types::Period;
use pnl_core::SimulationPolicy;

use crate::input;

/// Load the scenario from `--input` or stdin.
pub fn load_scenario(path: Option<&str>, what: &str) -> Result<Scenario, Box<dyn std::error::Error>> {
    let scenario: Scenario = if let Some(path) = path {
        input::file::read_document(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err(format!("--input <scenario.json|yaml> or stdin required for {what}").into());
    };
    tracing::debug!(
        scenario = scenario.id,
        brands = scenario.brands.len(),
        routes = scenario.routes.len(),
        "scenario loaded"
    );
    Ok(scenario)
}

/// Load the simulation policy, or the defaults when no file is given.
pub fn load_policy(path: Option<&str>) -> Result<SimulationPolicy, Box<dyn std::error::Error>> {
    let policy: SimulationPolicy = match path {
        Some(path) => input::file::read_document(path)?,
        None => SimulationPolicy::default(),
    };
    policy.validate()?;
    Ok(policy)
}

pub fn parse_period(raw: &str) -> Result<Period, Box<dyn std::error::Error>> {
    Period::parse(raw).ok_or_else(|| {
        format!("invalid period '{raw}': use 'annual', a month number (1-12) or a month name").into()
    })
}

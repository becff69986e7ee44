use clap::Args;
use serde_json::Value;

use pnl_core::pnl;

use super::{load_policy, load_scenario, parse_period};

/// Arguments for route costing
#[derive(Args)]
pub struct RoutesArgs {
    /// Path to scenario file (JSON or YAML)
    #[arg(long)]
    pub input: Option<String>,

    /// Period: "annual", a month number (1-12) or a month name
    #[arg(long, default_value = "annual")]
    pub period: String,

    /// Path to simulation policy file (JSON or YAML)
    #[arg(long)]
    pub policy: Option<String>,
}

pub fn run_routes(args: RoutesArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let scenario = load_scenario(args.input.as_deref(), "route costing")?;
    let policy = load_policy(args.policy.as_deref())?;
    let period = parse_period(&args.period)?;
    let result = pnl::cost_routes(&scenario, period, &policy)?;
    Ok(serde_json::to_value(result)?)
}

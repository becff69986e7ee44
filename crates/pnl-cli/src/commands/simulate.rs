use clap::Args;
use serde_json::Value;

use pnl_core::pnl;

use super::{load_policy, load_scenario, parse_period};

/// Arguments for a full scenario simulation
#[derive(Args)]
pub struct SimulateArgs {
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

/// Arguments for a single-brand simulation
#[derive(Args)]
pub struct BrandArgs {
    /// Brand id
    #[arg(long)]
    pub brand: u32,

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

/// Arguments for the twelve-month projection
#[derive(Args)]
pub struct MonthsArgs {
    /// Restrict the projection to one brand
    #[arg(long)]
    pub brand: Option<u32>,

    /// Path to scenario file (JSON or YAML)
    #[arg(long)]
    pub input: Option<String>,

    /// Path to simulation policy file (JSON or YAML)
    #[arg(long)]
    pub policy: Option<String>,
}

pub fn run_simulate(args: SimulateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let scenario = load_scenario(args.input.as_deref(), "scenario simulation")?;
    let policy = load_policy(args.policy.as_deref())?;
    let period = parse_period(&args.period)?;
    let result = pnl::simulate_scenario(&scenario, period, &policy)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_brand(args: BrandArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let scenario = load_scenario(args.input.as_deref(), "brand simulation")?;
    let policy = load_policy(args.policy.as_deref())?;
    let period = parse_period(&args.period)?;
    let result = pnl::simulate_brand(&scenario, args.brand, period, &policy)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_months(args: MonthsArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let scenario = load_scenario(args.input.as_deref(), "monthly projection")?;
    let policy = load_policy(args.policy.as_deref())?;
    let result = pnl::project_months(&scenario, args.brand, &policy)?;
    Ok(serde_json::to_value(result)?)
}

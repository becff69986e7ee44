use clap::Args;
use serde_json::Value;

use pnl_core::pnl;

use super::{load_policy, load_scenario};

/// Arguments for participation validation
#[derive(Args)]
pub struct ValidateArgs {
    /// Path to scenario file (JSON or YAML)
    #[arg(long)]
    pub input: Option<String>,

    /// Path to simulation policy file (JSON or YAML)
    #[arg(long)]
    pub policy: Option<String>,
}

pub fn run_validate(args: ValidateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let scenario = load_scenario(args.input.as_deref(), "validation")?;
    let policy = load_policy(args.policy.as_deref())?;
    let result = pnl::validate_scenario(&scenario, &policy)?;
    Ok(serde_json::to_value(result)?)
}

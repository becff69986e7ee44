pub mod allocation;
pub mod cascade;
pub mod config;
pub mod error;
pub mod logistics;
pub mod model;
pub mod pnl;
pub mod reconcile;
pub mod tax;
pub mod types;
pub mod validation;

pub use config::SimulationPolicy;
pub use error::PnlError;
pub use pnl::{
    cost_routes, project_months, simulate_brand, simulate_scenario, validate_scenario,
};
pub use types::*;

/// Standard result type for all P&L engine operations
pub type PnlResult<T> = Result<T, PnlError>;

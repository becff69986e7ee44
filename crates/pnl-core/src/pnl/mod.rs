pub mod aggregator;
pub mod statement;

pub use aggregator::{
    compute_brand, cost_routes, project_months, simulate_brand, simulate_scenario,
    validate_scenario, BrandPnl, MonthSummary, MonthlyProjection, ScenarioPnl,
};
pub use statement::{net_margin, ConsolidatedSummary, EntityPnl, IncomeStatement};

pub mod breakdown;
pub mod criteria;
pub mod engine;

pub use breakdown::{CategoryCosts, CostBreakdown};
pub use criteria::{collect_zone_metrics, CriterionRegistry, ProrationCriterion, ZoneMetrics};
pub use engine::{allocate_costs, CostAllocation, RubroAllocation};

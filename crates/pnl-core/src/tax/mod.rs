pub mod discount;
pub mod income_tax;
pub mod margin;

pub use discount::{brand_discount, weighted_discount_rate, WeightedDiscount};
pub use income_tax::{consolidated_income_tax, prorate_income_tax, IncomeTaxAllocation};
pub use margin::{gross_margin, ica, OtherIncome};

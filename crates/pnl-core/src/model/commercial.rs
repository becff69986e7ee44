use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{Percent, Rate};

/// One "pie de factura" tier: sales up to `breakpoint` percent of the total
/// earn `discount` percent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscountTier {
    pub breakpoint: Percent,
    pub discount: Percent,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DiscountConfig {
    /// Tiers ordered by ascending breakpoint.
    #[serde(default)]
    pub tiers: Vec<DiscountTier>,
    #[serde(default)]
    pub rebate_pct: Percent,
    /// Pronto-pago discount; `None` when the brand does not grant it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub financial_discount_pct: Option<Percent>,
    /// Statutory commercial-agent severance (1/12 provision).
    #[serde(default)]
    pub commercial_severance: bool,
    /// Expected cumulative sales reached, in percent. Defaults to 100.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sales_attainment: Option<Percent>,
}

impl DiscountConfig {
    pub fn financial_discount(&self) -> Percent {
        self.financial_discount_pct.unwrap_or(Decimal::ZERO)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaxConfig {
    /// Corporate income tax, as a decimal rate (0.33 = 33%).
    pub income_tax_rate: Rate,
}

//! Income tax: assessed once on the consolidated result, then prorated down
//! by revenue share.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::reconcile::{allocate_exact, round_money, WeightBasis};
use crate::types::{EntityId, Money, Rate};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomeTaxAllocation {
    pub consolidated_pbt: Money,
    pub rate: Rate,
    pub tax: Money,
    pub shares: Vec<(EntityId, Money)>,
    /// Tax left over when no entity has revenue to carry it.
    pub undistributed: Money,
}

impl IncomeTaxAllocation {
    pub fn share_of(&self, id: EntityId) -> Money {
        self.shares
            .iter()
            .find(|(k, _)| *k == id)
            .map(|(_, v)| *v)
            .unwrap_or(Decimal::ZERO)
    }
}

/// max(0, pbt) × rate. Losses carry no tax.
pub fn consolidated_income_tax(pbt: Money, rate: Rate, dp: u32) -> Money {
    round_money(pbt.max(Decimal::ZERO) * rate, dp)
}

/// Assess tax on `pbt` and spread it over `revenues` so the shares add up to
/// the assessed tax exactly.
pub fn prorate_income_tax(
    pbt: Money,
    rate: Rate,
    revenues: &[(EntityId, Money)],
    dp: u32,
) -> IncomeTaxAllocation {
    let tax = consolidated_income_tax(pbt, rate, dp);
    let alloc = allocate_exact(tax, revenues, WeightBasis::Proportional, dp);
    IncomeTaxAllocation {
        consolidated_pbt: pbt,
        rate,
        tax,
        shares: alloc.shares,
        undistributed: alloc.undistributed,
    }
}

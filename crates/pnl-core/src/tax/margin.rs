//! Gross margin, ICA and other operating income of one entity.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::ops::AddAssign;

use crate::model::DiscountConfig;
use crate::reconcile::round_money;
use crate::types::{Money, Percent, Rate};

/// gross margin = revenue × weighted discount % / 100
pub fn gross_margin(revenue: Money, discount_rate: Percent, dp: u32) -> Money {
    round_money(revenue * discount_rate / dec!(100), dp)
}

/// Municipal industry-and-commerce tax on revenue.
pub fn ica(revenue: Money, ica_rate: Rate, dp: u32) -> Money {
    round_money(revenue * ica_rate, dp)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OtherIncome {
    pub rebate: Money,
    pub financial_discount: Money,
    pub commercial_severance: Money,
    pub total: Money,
}

impl OtherIncome {
    /// Rebate and pronto-pago discount on revenue, plus a twelfth of the
    /// commercial income when the brand provisions agent severance.
    pub fn compute(
        revenue: Money,
        gross_margin: Money,
        config: &DiscountConfig,
        dp: u32,
    ) -> Self {
        let rebate = round_money(revenue * config.rebate_pct / dec!(100), dp);
        let financial_discount = round_money(revenue * config.financial_discount() / dec!(100), dp);
        let commercial_severance = if config.commercial_severance {
            round_money((gross_margin + rebate + financial_discount) / dec!(12), dp)
        } else {
            Decimal::ZERO
        };
        Self {
            rebate,
            financial_discount,
            commercial_severance,
            total: rebate + financial_discount + commercial_severance,
        }
    }
}

impl AddAssign<&OtherIncome> for OtherIncome {
    fn add_assign(&mut self, rhs: &OtherIncome) {
        self.rebate += rhs.rebate;
        self.financial_discount += rhs.financial_discount;
        self.commercial_severance += rhs.commercial_severance;
        self.total += rhs.total;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gross_margin_and_ica() {
        assert_eq!(gross_margin(dec!(10_000_000), dec!(24), 0), dec!(2_400_000));
        assert_eq!(ica(dec!(10_000_000), dec!(0.00966), 0), dec!(96_600));
    }

    #[test]
    fn test_other_income_with_severance() {
        let config = DiscountConfig {
            rebate_pct: dec!(2),
            financial_discount_pct: Some(dec!(1)),
            commercial_severance: true,
            ..Default::default()
        };
        let oi = OtherIncome::compute(dec!(10_000_000), dec!(2_400_000), &config, 0);
        assert_eq!(oi.rebate, dec!(200_000));
        assert_eq!(oi.financial_discount, dec!(100_000));
        // (2,400,000 + 200,000 + 100,000) / 12
        assert_eq!(oi.commercial_severance, dec!(225_000));
        assert_eq!(oi.total, dec!(525_000));
    }

    #[test]
    fn test_financial_discount_disabled() {
        let config = DiscountConfig {
            rebate_pct: dec!(1.5),
            ..Default::default()
        };
        let oi = OtherIncome::compute(dec!(1_000_000), Decimal::ZERO, &config, 0);
        assert_eq!(oi.financial_discount, Decimal::ZERO);
        assert_eq!(oi.commercial_severance, Decimal::ZERO);
        assert_eq!(oi.total, dec!(15_000));
    }
}

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::allocation::CostBreakdown;
use crate::model::DiscountConfig;
use crate::reconcile::round_money;
use crate::tax::{gross_margin, OtherIncome};
use crate::types::{EntityId, EntityLevel, Money, Percent};

// ---------------------------------------------------------------------------
// Income statement
// ---------------------------------------------------------------------------

/// Income statement of one entity for one period.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IncomeStatement {
    pub revenue: Money,
    /// Weighted discount rate the gross margin was taken at, in percent.
    pub discount_rate: Percent,
    pub gross_margin: Money,
    pub costs: CostBreakdown,
    pub ica: Money,
    pub operating_profit: Money,
    pub other_income: OtherIncome,
    pub profit_before_tax: Money,
    pub income_tax: Money,
    pub net_profit: Money,
    /// `None` when there is no revenue.
    pub net_margin_pct: Option<Percent>,
}

impl IncomeStatement {
    /// Statement up to profit before tax; income tax is applied later from
    /// the consolidated assessment.
    pub fn before_tax(
        revenue: Money,
        discount_rate: Percent,
        costs: CostBreakdown,
        ica: Money,
        discount: &DiscountConfig,
        dp: u32,
    ) -> Self {
        let gm = gross_margin(revenue, discount_rate, dp);
        let other_income = OtherIncome::compute(revenue, gm, discount, dp);
        let mut s = Self {
            revenue,
            discount_rate,
            gross_margin: gm,
            costs,
            ica,
            other_income,
            ..Default::default()
        };
        s.refresh();
        s
    }

    /// Statement from lines already split off a parent statement. The
    /// discount rate is re-derived from the margin.
    pub fn from_parts(
        revenue: Money,
        gross_margin: Money,
        costs: CostBreakdown,
        ica: Money,
        other_income: OtherIncome,
    ) -> Self {
        let mut s = Self {
            revenue,
            discount_rate: effective_rate(gross_margin, revenue),
            gross_margin,
            costs,
            ica,
            other_income,
            ..Default::default()
        };
        s.refresh();
        s
    }

    pub fn apply_income_tax(&mut self, tax: Money) {
        self.income_tax = tax;
        self.refresh();
    }

    /// Sum of several statements. The discount rate is re-derived from the
    /// summed gross margin.
    pub fn sum<'a>(statements: impl IntoIterator<Item = &'a IncomeStatement>) -> Self {
        let mut total = Self::default();
        for s in statements {
            total.revenue += s.revenue;
            total.gross_margin += s.gross_margin;
            total.costs += &s.costs;
            total.ica += s.ica;
            total.other_income += &s.other_income;
            total.income_tax += s.income_tax;
        }
        total.discount_rate = effective_rate(total.gross_margin, total.revenue);
        total.refresh();
        total
    }

    fn refresh(&mut self) {
        self.operating_profit = self.gross_margin - self.costs.total() - self.ica;
        self.profit_before_tax = self.operating_profit + self.other_income.total;
        self.net_profit = self.profit_before_tax - self.income_tax;
        self.net_margin_pct = net_margin(self.net_profit, self.revenue);
    }
}

pub fn net_margin(net_profit: Money, revenue: Money) -> Option<Percent> {
    if revenue.is_zero() {
        None
    } else {
        Some(round_money(net_profit / revenue * dec!(100), 2))
    }
}

fn effective_rate(gross_margin: Money, revenue: Money) -> Percent {
    if revenue.is_zero() {
        Decimal::ZERO
    } else {
        (gross_margin / revenue * dec!(100)).round_dp(6)
    }
}

// ---------------------------------------------------------------------------
// Entity P&L and summaries
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityPnl {
    pub level: EntityLevel,
    pub id: EntityId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<EntityId>,
    pub statement: IncomeStatement,
}

/// Headline figures of a brand or a whole scenario.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConsolidatedSummary {
    pub revenue: Money,
    pub costs: CostBreakdown,
    pub total_costs: Money,
    pub gross_margin: Money,
    pub ica: Money,
    pub other_income: Money,
    pub profit_before_tax: Money,
    pub income_tax: Money,
    pub net_profit: Money,
    pub net_margin_pct: Option<Percent>,
    pub headcount: Decimal,
    pub weighted_discount_rate: Percent,
    /// Rubro value that reached no zone.
    pub unallocated_costs: Money,
    /// Route cost of municipalities no zone serves.
    pub unattributed_route_costs: Money,
}

impl ConsolidatedSummary {
    pub fn from_statement(
        statement: &IncomeStatement,
        headcount: Decimal,
        unallocated_costs: Money,
        unattributed_route_costs: Money,
    ) -> Self {
        Self {
            revenue: statement.revenue,
            costs: statement.costs.clone(),
            total_costs: statement.costs.total(),
            gross_margin: statement.gross_margin,
            ica: statement.ica,
            other_income: statement.other_income.total,
            profit_before_tax: statement.profit_before_tax,
            income_tax: statement.income_tax,
            net_profit: statement.net_profit,
            net_margin_pct: statement.net_margin_pct,
            headcount,
            weighted_discount_rate: statement.discount_rate,
            unallocated_costs,
            unattributed_route_costs,
        }
    }

    /// Add another summary in, e.g. one brand into a scenario total.
    pub fn absorb(&mut self, other: &ConsolidatedSummary) {
        self.revenue += other.revenue;
        self.costs += &other.costs;
        self.total_costs += other.total_costs;
        self.gross_margin += other.gross_margin;
        self.ica += other.ica;
        self.other_income += other.other_income;
        self.profit_before_tax += other.profit_before_tax;
        self.income_tax += other.income_tax;
        self.net_profit += other.net_profit;
        self.headcount += other.headcount;
        self.unallocated_costs += other.unallocated_costs;
        self.unattributed_route_costs += other.unattributed_route_costs;
        self.net_margin_pct = net_margin(self.net_profit, self.revenue);
        self.weighted_discount_rate = effective_rate(self.gross_margin, self.revenue);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Category, RubroKind};

    fn costs(amount: Money) -> CostBreakdown {
        let mut c = CostBreakdown::default();
        c.add(Category::Comercial, RubroKind::Gasto, amount);
        c
    }

    #[test]
    fn test_before_tax_and_net() {
        let config = DiscountConfig {
            rebate_pct: dec!(1),
            ..Default::default()
        };
        let mut s = IncomeStatement::before_tax(
            dec!(10_000_000),
            dec!(20),
            costs(dec!(1_000_000)),
            dec!(100_000),
            &config,
            0,
        );
        assert_eq!(s.gross_margin, dec!(2_000_000));
        assert_eq!(s.operating_profit, dec!(900_000));
        assert_eq!(s.profit_before_tax, dec!(1_000_000));
        s.apply_income_tax(dec!(330_000));
        assert_eq!(s.net_profit, dec!(670_000));
        assert_eq!(s.net_margin_pct, Some(dec!(6.7)));
    }

    #[test]
    fn test_zero_revenue_has_no_margin() {
        let s = IncomeStatement::before_tax(
            Decimal::ZERO,
            dec!(20),
            costs(dec!(10)),
            Decimal::ZERO,
            &DiscountConfig::default(),
            0,
        );
        assert_eq!(s.net_profit, dec!(-10));
        assert_eq!(s.net_margin_pct, None);
        let json = serde_json::to_value(&s).unwrap();
        assert!(json["net_margin_pct"].is_null());
    }

    #[test]
    fn test_from_parts_keeps_split_lines() {
        let other_income = OtherIncome {
            rebate: dec!(150),
            financial_discount: Decimal::ZERO,
            commercial_severance: Decimal::ZERO,
            total: dec!(150),
        };
        let s = IncomeStatement::from_parts(
            dec!(10_000),
            dec!(2_451),
            costs(dec!(1_000)),
            dec!(97),
            other_income,
        );
        assert_eq!(s.discount_rate, dec!(24.51));
        assert_eq!(s.operating_profit, dec!(1_354));
        assert_eq!(s.profit_before_tax, dec!(1_504));
        assert_eq!(s.net_profit, dec!(1_504));
    }

    #[test]
    fn test_sum_rederives_rate() {
        let config = DiscountConfig::default();
        let a = IncomeStatement::before_tax(dec!(100), dec!(20), costs(dec!(5)), dec!(1), &config, 0);
        let b = IncomeStatement::before_tax(dec!(300), dec!(20), costs(dec!(5)), dec!(1), &config, 0);
        let total = IncomeStatement::sum([&a, &b]);
        assert_eq!(total.revenue, dec!(400));
        assert_eq!(total.gross_margin, dec!(80));
        assert_eq!(total.discount_rate, dec!(20));
        assert_eq!(total.net_profit, a.net_profit + b.net_profit);
    }
}

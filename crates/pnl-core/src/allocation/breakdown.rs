use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::ops::AddAssign;

use crate::model::{Category, RubroKind};
use crate::types::Money;

/// Costs of one category split by rubro kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryCosts {
    pub personal: Money,
    pub expenses: Money,
    pub vehicles: Money,
    pub total: Money,
}

impl CategoryCosts {
    pub fn add(&mut self, kind: RubroKind, amount: Money) {
        match kind {
            RubroKind::Personal => self.personal += amount,
            RubroKind::Gasto => self.expenses += amount,
            RubroKind::Vehiculo => self.vehicles += amount,
        }
        self.total += amount;
    }
}

impl AddAssign<&CategoryCosts> for CategoryCosts {
    fn add_assign(&mut self, rhs: &CategoryCosts) {
        self.personal += rhs.personal;
        self.expenses += rhs.expenses;
        self.vehicles += rhs.vehicles;
        self.total += rhs.total;
    }
}

/// Everything an entity spends before ICA.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub comercial: CategoryCosts,
    pub logistico: CategoryCosts,
    pub administrativo: CategoryCosts,
    pub route_costs: Money,
}

impl CostBreakdown {
    pub fn category_mut(&mut self, category: Category) -> &mut CategoryCosts {
        match category {
            Category::Comercial => &mut self.comercial,
            Category::Logistico => &mut self.logistico,
            Category::Administrativo => &mut self.administrativo,
        }
    }

    pub fn add(&mut self, category: Category, kind: RubroKind, amount: Money) {
        self.category_mut(category).add(kind, amount);
    }

    /// Rubro costs of the three categories, route costs excluded.
    pub fn rubro_total(&self) -> Money {
        self.comercial.total + self.logistico.total + self.administrativo.total
    }

    pub fn total(&self) -> Money {
        self.rubro_total() + self.route_costs
    }

    pub fn personal(&self) -> Money {
        self.comercial.personal + self.logistico.personal + self.administrativo.personal
    }

    pub fn is_zero(&self) -> bool {
        self.total() == Decimal::ZERO
    }
}

impl AddAssign<&CostBreakdown> for CostBreakdown {
    fn add_assign(&mut self, rhs: &CostBreakdown) {
        self.comercial += &rhs.comercial;
        self.logistico += &rhs.logistico;
        self.administrativo += &rhs.administrativo;
        self.route_costs += rhs.route_costs;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_add_routes_by_kind_and_category() {
        let mut b = CostBreakdown::default();
        b.add(Category::Comercial, RubroKind::Personal, dec!(100));
        b.add(Category::Comercial, RubroKind::Gasto, dec!(20));
        b.add(Category::Logistico, RubroKind::Vehiculo, dec!(50));
        b.route_costs = dec!(30);
        assert_eq!(b.comercial.total, dec!(120));
        assert_eq!(b.logistico.vehicles, dec!(50));
        assert_eq!(b.rubro_total(), dec!(170));
        assert_eq!(b.total(), dec!(200));
        assert_eq!(b.personal(), dec!(100));
    }

    #[test]
    fn test_add_assign_sums_every_field() {
        let mut a = CostBreakdown::default();
        a.add(Category::Administrativo, RubroKind::Gasto, dec!(10));
        let mut b = a.clone();
        b.route_costs = dec!(5);
        a += &b;
        assert_eq!(a.administrativo.expenses, dec!(20));
        assert_eq!(a.total(), dec!(25));
    }
}

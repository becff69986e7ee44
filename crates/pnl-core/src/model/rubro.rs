use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::{EntityId, Money};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Comercial,
    Logistico,
    Administrativo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RubroKind {
    Personal,
    Vehiculo,
    Gasto,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleScheme {
    /// Company-owned fleet.
    Tradicional,
    Renting,
    /// Third-party carrier; driver and fixed costs are theirs.
    Tercero,
}

impl fmt::Display for VehicleScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            VehicleScheme::Tradicional => "tradicional",
            VehicleScheme::Renting => "renting",
            VehicleScheme::Tercero => "tercero",
        };
        f.write_str(label)
    }
}

/// Monthly fixed cost components of a vehicle. Which ones count depends on
/// the scheme, see [`VehicleFixedCosts::monthly_for`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleFixedCosts {
    pub depreciation: Money,
    pub insurance: Money,
    pub canon: Money,
    pub maintenance: Money,
    pub taxes: Money,
    pub other: Money,
}

impl VehicleFixedCosts {
    fn components(&self) -> [(&'static str, Money); 6] {
        [
            ("depreciation", self.depreciation),
            ("insurance", self.insurance),
            ("canon", self.canon),
            ("maintenance", self.maintenance),
            ("taxes", self.taxes),
            ("other", self.other),
        ]
    }

    fn applies(scheme: VehicleScheme, component: &str) -> bool {
        match scheme {
            VehicleScheme::Tradicional => component != "canon",
            VehicleScheme::Renting => matches!(component, "canon" | "other"),
            VehicleScheme::Tercero => false,
        }
    }

    /// Monthly fixed cost under `scheme`.
    ///
    /// Tradicional: everything but the canon. Renting: canon plus other (the
    /// lease bundles insurance and maintenance). Tercero: nothing, the
    /// carrier's freight covers it.
    pub fn monthly_for(&self, scheme: VehicleScheme) -> Money {
        self.components()
            .iter()
            .filter(|(name, _)| Self::applies(scheme, name))
            .map(|(_, v)| *v)
            .sum()
    }

    /// Non-zero components that `scheme` does not recognise.
    pub fn ignored_for(&self, scheme: VehicleScheme) -> Vec<&'static str> {
        self.components()
            .iter()
            .filter(|(name, v)| !v.is_zero() && !Self::applies(scheme, name))
            .map(|(name, _)| *name)
            .collect()
    }

    pub fn has_negative(&self) -> bool {
        self.components().iter().any(|(_, v)| *v < Decimal::ZERO)
    }
}

/// Payroll detail of a personal rubro.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Staff {
    pub salary: Money,
    /// Statutory benefits load over salary (0.52 = 52%).
    pub benefit_factor: Decimal,
    #[serde(default)]
    pub transport_subsidy: Money,
}

impl Staff {
    pub fn monthly_cost(&self) -> Money {
        self.salary * (Decimal::ONE + self.benefit_factor) + self.transport_subsidy
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleRubro {
    pub scheme: VehicleScheme,
    #[serde(default)]
    pub fixed: VehicleFixedCosts,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum AllocationMode {
    /// Owned by a single zone.
    Individual { zone_id: EntityId },
    /// Prorated across `targets` (every brand zone when empty) by a named
    /// criterion.
    Shared {
        criterion: String,
        #[serde(default)]
        targets: Vec<EntityId>,
    },
}

/// A single cost line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rubro {
    pub id: EntityId,
    pub brand_id: EntityId,
    pub name: String,
    pub category: Category,
    pub kind: RubroKind,
    /// Monthly value when it is not derived from quantity and unit value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_value: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_value: Option<Money>,
    pub allocation: AllocationMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub staff: Option<Staff>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vehicle: Option<VehicleRubro>,
}

impl Rubro {
    fn quantity(&self) -> Decimal {
        self.quantity.unwrap_or(Decimal::ONE)
    }

    /// Monthly cost of the line.
    pub fn monthly_value(&self) -> Result<Money, String> {
        if self.quantity() < Decimal::ZERO {
            return Err(format!("negative quantity {}", self.quantity()));
        }
        let value = match (self.kind, &self.staff, &self.vehicle) {
            (RubroKind::Personal, Some(staff), _) => {
                if staff.salary < Decimal::ZERO || staff.transport_subsidy < Decimal::ZERO {
                    return Err("negative salary or transport subsidy".into());
                }
                self.quantity() * staff.monthly_cost()
            }
            (RubroKind::Vehiculo, _, Some(vehicle)) => {
                if vehicle.fixed.has_negative() {
                    return Err("negative vehicle fixed cost component".into());
                }
                self.quantity() * vehicle.fixed.monthly_for(vehicle.scheme)
            }
            _ => match (self.quantity, self.unit_value, self.total_value) {
                (Some(q), Some(unit), _) => q * unit,
                (_, _, Some(total)) => total,
                (None, Some(unit), None) => unit,
                _ => return Err("no total value, unit value or payroll detail".into()),
            },
        };
        if value < Decimal::ZERO {
            return Err(format!("negative value {value}"));
        }
        Ok(value)
    }

    /// People this line pays for.
    pub fn headcount(&self) -> Decimal {
        match self.kind {
            RubroKind::Personal => self.quantity(),
            _ => Decimal::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn gasto(total: Option<Money>, qty: Option<Decimal>, unit: Option<Money>) -> Rubro {
        Rubro {
            id: 1,
            brand_id: 1,
            name: "Arriendo".into(),
            category: Category::Administrativo,
            kind: RubroKind::Gasto,
            total_value: total,
            quantity: qty,
            unit_value: unit,
            allocation: AllocationMode::Individual { zone_id: 1 },
            staff: None,
            vehicle: None,
        }
    }

    #[test]
    fn test_personal_value_includes_benefits_and_subsidy() {
        let mut r = gasto(None, Some(dec!(3)), None);
        r.kind = RubroKind::Personal;
        r.staff = Some(Staff {
            salary: dec!(2_000_000),
            benefit_factor: dec!(0.5),
            transport_subsidy: dec!(160_000),
        });
        // 3 * (2,000,000 * 1.5 + 160,000)
        assert_eq!(r.monthly_value().unwrap(), dec!(9_480_000));
        assert_eq!(r.headcount(), dec!(3));
    }

    #[test]
    fn test_quantity_times_unit_wins_over_total() {
        let r = gasto(Some(dec!(1)), Some(dec!(4)), Some(dec!(250)));
        assert_eq!(r.monthly_value().unwrap(), dec!(1000));
        assert_eq!(r.headcount(), Decimal::ZERO);
    }

    #[test]
    fn test_total_value_used_alone() {
        let r = gasto(Some(dec!(750_000)), None, None);
        assert_eq!(r.monthly_value().unwrap(), dec!(750_000));
    }

    #[test]
    fn test_missing_value_is_error() {
        assert!(gasto(None, Some(dec!(2)), None).monthly_value().is_err());
    }

    #[test]
    fn test_negative_value_is_error() {
        assert!(gasto(Some(dec!(-5)), None, None).monthly_value().is_err());
    }

    #[test]
    fn test_scheme_fixed_components() {
        let fixed = VehicleFixedCosts {
            depreciation: dec!(1000),
            insurance: dec!(200),
            canon: dec!(3000),
            maintenance: dec!(300),
            taxes: dec!(50),
            other: dec!(10),
        };
        assert_eq!(fixed.monthly_for(VehicleScheme::Tradicional), dec!(1560));
        assert_eq!(fixed.monthly_for(VehicleScheme::Renting), dec!(3010));
        assert_eq!(fixed.monthly_for(VehicleScheme::Tercero), Decimal::ZERO);
        assert_eq!(fixed.ignored_for(VehicleScheme::Tradicional), vec!["canon"]);
        assert_eq!(fixed.ignored_for(VehicleScheme::Tercero).len(), 6);
    }

    #[test]
    fn test_vehicle_rubro_value() {
        let mut r = gasto(None, Some(dec!(2)), None);
        r.kind = RubroKind::Vehiculo;
        r.vehicle = Some(VehicleRubro {
            scheme: VehicleScheme::Renting,
            fixed: VehicleFixedCosts {
                canon: dec!(4_500_000),
                ..Default::default()
            },
        });
        assert_eq!(r.monthly_value().unwrap(), dec!(9_000_000));
    }

    #[test]
    fn test_allocation_mode_serde_tags() {
        let json = r#"{"mode":"shared","criterion":"revenue"}"#;
        let mode: AllocationMode = serde_json::from_str(json).unwrap();
        match mode {
            AllocationMode::Shared { criterion, targets } => {
                assert_eq!(criterion, "revenue");
                assert!(targets.is_empty());
            }
            AllocationMode::Individual { .. } => panic!("expected shared"),
        }
    }
}

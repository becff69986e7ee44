//! Weighted "pie de factura" discount rate from cumulative sales tiers.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::model::{DiscountConfig, DiscountTier};
use crate::types::{EntityId, EntityLevel, Percent};
use crate::validation::{ConfigWarning, ValidationReport};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedDiscount {
    /// Effective discount over the attained sales, in percent.
    pub rate: Percent,
    pub attainment: Percent,
    /// Sales percentage the tiers explicitly cover.
    pub covered: Percent,
}

impl WeightedDiscount {
    pub fn is_complete(&self) -> bool {
        self.covered >= self.attainment
    }
}

/// Average the tier discounts over `[0, attainment]`, each weighted by the
/// width of the tier that falls inside that range.
///
/// A last tier ending below the attainment is stretched to it.
pub fn weighted_discount_rate(config: &DiscountConfig) -> Result<WeightedDiscount, String> {
    let attainment = config.sales_attainment.unwrap_or(dec!(100));
    if attainment < Decimal::ZERO {
        return Err(format!("negative sales attainment {attainment}"));
    }
    validate_tiers(&config.tiers)?;

    let Some(last) = config.tiers.last() else {
        return Ok(WeightedDiscount {
            rate: Decimal::ZERO,
            attainment,
            covered: attainment,
        });
    };
    if attainment.is_zero() {
        return Ok(WeightedDiscount {
            rate: Decimal::ZERO,
            attainment,
            covered: attainment,
        });
    }

    let mut lower = Decimal::ZERO;
    let mut weighted = Decimal::ZERO;
    for tier in &config.tiers {
        if lower >= attainment {
            break;
        }
        let upper = tier.breakpoint.min(attainment);
        weighted += (upper - lower).max(Decimal::ZERO) * tier.discount;
        lower = tier.breakpoint;
    }
    let covered = last.breakpoint.min(attainment);
    if covered < attainment {
        weighted += (attainment - covered) * last.discount;
    }

    Ok(WeightedDiscount {
        rate: weighted / attainment,
        attainment,
        covered: last.breakpoint,
    })
}

fn validate_tiers(tiers: &[DiscountTier]) -> Result<(), String> {
    for tier in tiers {
        if tier.breakpoint < Decimal::ZERO || tier.discount < Decimal::ZERO {
            return Err(format!(
                "discount tier {}% → {}% has a negative value",
                tier.breakpoint, tier.discount
            ));
        }
    }
    if tiers.windows(2).any(|w| w[1].breakpoint <= w[0].breakpoint) {
        return Err("discount tier breakpoints must be strictly ascending".into());
    }
    Ok(())
}

/// Weighted discount of a brand, recording problems in `report`.
///
/// Unusable tiers give a zero rate and an error against the brand.
pub fn brand_discount(
    brand_id: EntityId,
    config: &DiscountConfig,
    report: &mut ValidationReport,
) -> WeightedDiscount {
    match weighted_discount_rate(config) {
        Ok(d) => {
            if !d.is_complete() {
                report.warn(ConfigWarning::DiscountTiersIncomplete {
                    brand_id,
                    covered: d.covered,
                    attainment: d.attainment,
                });
            }
            d
        }
        Err(reason) => {
            report.error(EntityLevel::Brand, brand_id, reason);
            WeightedDiscount {
                rate: Decimal::ZERO,
                attainment: config.sales_attainment.unwrap_or(dec!(100)),
                covered: Decimal::ZERO,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tier(breakpoint: Percent, discount: Percent) -> DiscountTier {
        DiscountTier {
            breakpoint,
            discount,
        }
    }

    fn config(tiers: Vec<DiscountTier>, attainment: Option<Percent>) -> DiscountConfig {
        DiscountConfig {
            tiers,
            sales_attainment: attainment,
            ..Default::default()
        }
    }

    #[test]
    fn test_two_tiers_full_attainment() {
        // 0-60% at 20, 60-100% at 30 → 0.6*20 + 0.4*30 = 24
        let c = config(vec![tier(dec!(60), dec!(20)), tier(dec!(100), dec!(30))], None);
        let d = weighted_discount_rate(&c).unwrap();
        assert_eq!(d.rate, dec!(24));
        assert!(d.is_complete());
    }

    #[test]
    fn test_partial_attainment_only_weighs_reached_tiers() {
        // attain 80: 60*20 + 20*30 = 1800 / 80 = 22.5
        let c = config(
            vec![tier(dec!(60), dec!(20)), tier(dec!(100), dec!(30))],
            Some(dec!(80)),
        );
        assert_eq!(weighted_discount_rate(&c).unwrap().rate, dec!(22.5));
    }

    #[test]
    fn test_short_tiers_extend_last_and_warn() {
        let c = config(vec![tier(dec!(50), dec!(10))], None);
        let mut report = ValidationReport::default();
        let d = brand_discount(1, &c, &mut report);
        assert_eq!(d.rate, dec!(10));
        assert_eq!(d.covered, dec!(50));
        assert!(matches!(
            report.warnings[0],
            ConfigWarning::DiscountTiersIncomplete { brand_id: 1, .. }
        ));
    }

    #[test]
    fn test_no_tiers_is_zero() {
        let d = weighted_discount_rate(&config(vec![], None)).unwrap();
        assert_eq!(d.rate, Decimal::ZERO);
        assert!(d.is_complete());
    }

    #[test]
    fn test_descending_breakpoints_are_rejected() {
        let c = config(vec![tier(dec!(80), dec!(20)), tier(dec!(40), dec!(30))], None);
        let mut report = ValidationReport::default();
        let d = brand_discount(3, &c, &mut report);
        assert_eq!(d.rate, Decimal::ZERO);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].level, EntityLevel::Brand);
    }

    #[test]
    fn test_zero_attainment_is_zero_rate() {
        let c = config(vec![tier(dec!(100), dec!(25))], Some(Decimal::ZERO));
        assert_eq!(weighted_discount_rate(&c).unwrap().rate, Decimal::ZERO);
    }
}

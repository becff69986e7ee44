//! Largest-remainder-to-largest-share allocation.
//!
//! Every split in the engine (revenue cascade, shared rubros, vehicle fixed
//! costs, route attribution, income tax) goes through [`allocate_exact`]:
//! all children but the heaviest are rounded to the configured precision and
//! the heaviest takes `total - sum(others)`, so the parts always add back to
//! the parent. Ties on weight are broken by key, ascending.

use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::types::Money;

/// How a weight is converted into a fraction of the total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeightBasis {
    /// weight / 100. Weights that do not add to 100 leave a gap that the
    /// heaviest child absorbs.
    Percent,
    /// weight / sum(weights).
    Proportional,
}

/// Result of splitting a total over weighted children.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Allocation<K> {
    /// One share per input child, in input order.
    pub shares: Vec<(K, Money)>,
    /// Child that absorbed the residual, if anything was allocated.
    pub absorber: Option<K>,
    /// Amount the absorber received beyond its own rounded exact share.
    pub residual: Money,
    /// Part of the total that could not be allocated (no positive weight).
    pub undistributed: Money,
}

impl<K: Copy + PartialEq> Allocation<K> {
    pub fn share_of(&self, key: K) -> Money {
        self.shares
            .iter()
            .filter(|(k, _)| *k == key)
            .map(|(_, v)| *v)
            .sum()
    }

    pub fn allocated(&self) -> Money {
        self.shares.iter().map(|(_, v)| *v).sum()
    }

    /// True when rounding/gap reconciliation drove the absorber below zero.
    pub fn absorber_negative(&self) -> bool {
        self.absorber
            .map(|k| self.share_of(k) < Decimal::ZERO)
            .unwrap_or(false)
    }
}

/// Round half away from zero to `dp` decimal places.
pub fn round_money(value: Money, dp: u32) -> Money {
    value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}

/// Split `total` over `children` so that the shares sum to `total` exactly.
///
/// `total` is first rounded to `dp`, so every share is a whole currency
/// unit at that precision; callers compare `allocated()` with their raw
/// total to report the rounding. Negative weights are treated as zero;
/// callers are expected to have reported them. When no child has a positive
/// weight nothing is allocated and the whole total is returned as
/// `undistributed`.
pub fn allocate_exact<K: Copy + Ord>(
    total: Money,
    children: &[(K, Decimal)],
    basis: WeightBasis,
    dp: u32,
) -> Allocation<K> {
    let total = round_money(total, dp);
    let weight_of = |w: Decimal| if w > Decimal::ZERO { w } else { Decimal::ZERO };
    let weight_sum: Decimal = children.iter().map(|(_, w)| weight_of(*w)).sum();

    if weight_sum.is_zero() {
        return Allocation {
            shares: children.iter().map(|(k, _)| (*k, Decimal::ZERO)).collect(),
            absorber: None,
            residual: Decimal::ZERO,
            undistributed: total,
        };
    }

    let denominator = match basis {
        WeightBasis::Percent => dec!(100),
        WeightBasis::Proportional => weight_sum,
    };

    // Heaviest first, ties by key.
    let mut order: Vec<usize> = (0..children.len()).collect();
    order.sort_by(|&a, &b| {
        let (ka, wa) = children[a];
        let (kb, wb) = children[b];
        weight_of(wb).cmp(&weight_of(wa)).then(ka.cmp(&kb))
    });

    let mut shares = vec![Decimal::ZERO; children.len()];
    let mut others = Decimal::ZERO;
    for &idx in order.iter().skip(1) {
        let exact = total * weight_of(children[idx].1) / denominator;
        let rounded = round_money(exact, dp);
        shares[idx] = rounded;
        others += rounded;
    }

    let head = order[0];
    let head_exact = round_money(total * weight_of(children[head].1) / denominator, dp);
    let absorbed = total - others;
    shares[head] = absorbed;

    Allocation {
        shares: children
            .iter()
            .zip(shares)
            .map(|((k, _), v)| (*k, v))
            .collect(),
        absorber: Some(children[head].0),
        residual: absorbed - head_exact,
        undistributed: Decimal::ZERO,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

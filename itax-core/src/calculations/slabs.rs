//! Progressive slab tax.
//!
//! The tax at any income is the full tax of every lower slab plus the
//! slab's rate applied to the part of income inside the current slab.
//! Slabs are walked in ascending order and the walk stops at the first slab
//! the income does not reach, so an income sitting exactly on a boundary is
//! taxed entirely in the lower slab.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::{RegimeRules, TaxSlab};

/// Tax raised by a single slab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlabTax {
    pub slab: TaxSlab,
    pub taxed_amount: Decimal,
    pub tax: Decimal,
}

/// Per-slab cascade for `taxable_income`, lowest slab first.
///
/// Only slabs the income reaches are listed. Non-positive income yields an
/// empty breakdown.
pub fn slab_breakdown(
    slabs: &[TaxSlab],
    taxable_income: Decimal,
) -> Vec<SlabTax> {
    let mut breakdown = Vec::new();
    if taxable_income <= Decimal::ZERO {
        return breakdown;
    }

    for slab in slabs {
        if taxable_income <= slab.min_income {
            break;
        }
        let taxed_amount = slab.portion_of(taxable_income);
        breakdown.push(SlabTax {
            slab: slab.clone(),
            taxed_amount,
            tax: taxed_amount * slab.rate,
        });
    }

    breakdown
}

/// Cumulative slab tax, before any rebate.
pub fn slab_tax(
    slabs: &[TaxSlab],
    taxable_income: Decimal,
) -> Decimal {
    slab_breakdown(slabs, taxable_income)
        .iter()
        .map(|entry| entry.tax)
        .sum()
}

/// Slab tax for a regime with its rebate applied.
///
/// The rebate is an override on the cascade result, not a slab: at or below
/// the threshold the tax is zero whatever the slabs produced.
pub fn regime_tax(
    rules: &RegimeRules,
    taxable_income: Decimal,
) -> Decimal {
    let tax = slab_tax(&rules.slabs, taxable_income);

    match &rules.rebate {
        Some(rebate) if rebate.applies_to(taxable_income) => Decimal::ZERO,
        _ => tax,
    }
}

/// Rate of the slab `taxable_income` falls in; zero below the first slab.
pub fn marginal_rate(
    slabs: &[TaxSlab],
    taxable_income: Decimal,
) -> Decimal {
    slabs
        .iter()
        .find(|slab| slab.contains(taxable_income))
        .map_or(Decimal::ZERO, |slab| slab.rate)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::TaxRuleSet;

    fn old() -> RegimeRules {
        TaxRuleSet::fy_2024_25().old_regime
    }

    fn new() -> RegimeRules {
        TaxRuleSet::fy_2024_25().new_regime
    }

    // =========================================================================
    // old regime cascade
    // =========================================================================

    #[test]
    fn old_regime_zero_up_to_first_threshold() {
        assert_eq!(regime_tax(&old(), dec!(250000)), dec!(0));
    }

    #[test]
    fn old_regime_second_slab() {
        // (400,000 - 250,000) x 5%
        assert_eq!(regime_tax(&old(), dec!(400000)), dec!(7500));
    }

    #[test]
    fn old_regime_at_five_lakh_boundary() {
        assert_eq!(regime_tax(&old(), dec!(500000)), dec!(12500));
    }

    #[test]
    fn old_regime_third_slab() {
        // 12,500 + (800,000 - 500,000) x 20%
        assert_eq!(regime_tax(&old(), dec!(800000)), dec!(72500));
    }

    #[test]
    fn old_regime_at_ten_lakh_boundary() {
        assert_eq!(regime_tax(&old(), dec!(1000000)), dec!(112500));
    }

    #[test]
    fn old_regime_top_slab() {
        // 112,500 + (1,150,000 - 1,000,000) x 30%
        assert_eq!(regime_tax(&old(), dec!(1150000)), dec!(157500));
    }

    // =========================================================================
    // new regime cascade and rebate
    // =========================================================================

    #[test]
    fn new_regime_rebate_wipes_tax_at_threshold() {
        assert_eq!(slab_tax(&new().slabs, dec!(700000)), dec!(20000));
        assert_eq!(regime_tax(&new(), dec!(700000)), dec!(0));
    }

    #[test]
    fn new_regime_rebate_covers_everything_below_threshold() {
        for income in [dec!(0), dec!(300000), dec!(450000), dec!(699999.99)] {
            assert_eq!(regime_tax(&new(), income), dec!(0), "income {income}");
        }
    }

    #[test]
    fn new_regime_just_above_rebate_threshold() {
        assert_eq!(regime_tax(&new(), dec!(700001)), dec!(20000.10));
    }

    #[test]
    fn new_regime_slab_boundaries() {
        assert_eq!(regime_tax(&new(), dec!(1000000)), dec!(50000));
        assert_eq!(regime_tax(&new(), dec!(1200000)), dec!(80000));
        assert_eq!(regime_tax(&new(), dec!(1500000)), dec!(140000));
    }

    #[test]
    fn new_regime_inside_fourth_slab() {
        // 50,000 + (1,125,000 - 1,000,000) x 15%
        assert_eq!(regime_tax(&new(), dec!(1125000)), dec!(68750));
    }

    #[test]
    fn new_regime_top_slab() {
        // 140,000 + (2,000,000 - 1,500,000) x 30%
        assert_eq!(regime_tax(&new(), dec!(2000000)), dec!(290000));
    }

    // =========================================================================
    // properties
    // =========================================================================

    #[test]
    fn non_positive_income_is_untaxed() {
        for rules in [old(), new()] {
            assert_eq!(regime_tax(&rules, dec!(0)), dec!(0));
            assert_eq!(regime_tax(&rules, dec!(-500000)), dec!(0));
        }
        assert!(slab_breakdown(&old().slabs, dec!(-1)).is_empty());
    }

    #[test]
    fn tax_is_monotonically_non_decreasing() {
        for rules in [old(), new()] {
            let mut previous = Decimal::ZERO;
            let mut income = Decimal::ZERO;
            while income <= dec!(6000000) {
                let tax = regime_tax(&rules, income);
                assert!(tax >= previous, "tax fell at income {income}");
                previous = tax;
                income += dec!(12500);
            }
        }
    }

    #[test]
    fn old_regime_is_continuous_at_boundaries() {
        let rules = old();
        for (boundary, lower_rate, upper_rate) in [
            (dec!(250000), dec!(0), dec!(0.05)),
            (dec!(500000), dec!(0.05), dec!(0.20)),
            (dec!(1000000), dec!(0.20), dec!(0.30)),
        ] {
            let at = regime_tax(&rules, boundary);
            assert_eq!(at - regime_tax(&rules, boundary - dec!(1)), lower_rate);
            assert_eq!(regime_tax(&rules, boundary + dec!(1)) - at, upper_rate);
        }
    }

    #[test]
    fn new_regime_is_continuous_at_boundaries_above_rebate() {
        let rules = new();
        for (boundary, lower_rate, upper_rate) in [
            (dec!(1000000), dec!(0.10), dec!(0.15)),
            (dec!(1200000), dec!(0.15), dec!(0.20)),
            (dec!(1500000), dec!(0.20), dec!(0.30)),
        ] {
            let at = regime_tax(&rules, boundary);
            assert_eq!(at - regime_tax(&rules, boundary - dec!(1)), lower_rate);
            assert_eq!(regime_tax(&rules, boundary + dec!(1)) - at, upper_rate);
        }
    }

    #[test]
    fn breakdown_sums_to_slab_tax() {
        let breakdown = slab_breakdown(&old().slabs, dec!(1150000));

        assert_eq!(breakdown.len(), 4);
        assert_eq!(breakdown[0].tax, dec!(0));
        assert_eq!(breakdown[1].tax, dec!(12500));
        assert_eq!(breakdown[2].tax, dec!(100000));
        assert_eq!(breakdown[3].taxed_amount, dec!(150000));
        assert_eq!(breakdown[3].tax, dec!(45000));
        assert_eq!(
            breakdown.iter().map(|b| b.tax).sum::<Decimal>(),
            slab_tax(&old().slabs, dec!(1150000))
        );
    }

    #[test]
    fn breakdown_stops_at_boundary_income() {
        let breakdown = slab_breakdown(&old().slabs, dec!(500000));

        assert_eq!(breakdown.len(), 2);
    }

    #[test]
    fn marginal_rate_uses_inclusive_upper_bound() {
        let slabs = old().slabs;

        assert_eq!(marginal_rate(&slabs, dec!(0)), dec!(0));
        assert_eq!(marginal_rate(&slabs, dec!(500000)), dec!(0.05));
        assert_eq!(marginal_rate(&slabs, dec!(500001)), dec!(0.20));
        assert_eq!(marginal_rate(&slabs, dec!(20000000)), dec!(0.30));
    }

    #[test]
    fn income_below_first_slab_start_is_untaxed() {
        let slabs = vec![
            TaxSlab::new(dec!(300000), Some(dec!(600000)), dec!(0.05)),
            TaxSlab::new(dec!(600000), None, dec!(0.10)),
        ];

        assert_eq!(slab_tax(&slabs, dec!(300000)), dec!(0));
        assert_eq!(slab_tax(&slabs, dec!(700000)), dec!(25000));
    }
}

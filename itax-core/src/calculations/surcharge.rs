//! Surcharge on high incomes.
//!
//! The rate is a step function of taxable income alone. The whole tier rate
//! applies to the pre-surcharge tax; there is no marginal relief at tier
//! boundaries, so crossing a threshold by one rupee raises the full tier.

use rust_decimal::Decimal;

use crate::SurchargeTier;

/// Rate of the highest tier whose threshold `taxable_income` exceeds.
pub fn surcharge_rate(
    tiers: &[SurchargeTier],
    taxable_income: Decimal,
) -> Decimal {
    tiers
        .iter()
        .take_while(|tier| taxable_income > tier.threshold)
        .last()
        .map_or(Decimal::ZERO, |tier| tier.rate)
}

/// Surcharge on `tax` for a given taxable income.
pub fn surcharge(
    tiers: &[SurchargeTier],
    tax: Decimal,
    taxable_income: Decimal,
) -> Decimal {
    tax * surcharge_rate(tiers, taxable_income)
}

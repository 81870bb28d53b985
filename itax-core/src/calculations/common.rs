//! Small decimal helpers shared by the calculators.
//!
//! Liability figures are never rounded. Rounding to paise happens only in
//! the planning calculators and when amounts are displayed.

use rust_decimal::{Decimal, RoundingStrategy};

/// Rounds to paise (two places), half away from zero.
///
/// ```
/// use rust_decimal_macros::dec;
/// use itax_core::calculations::common::round_half_up;
///
/// assert_eq!(round_half_up(dec!(8884.875)), dec!(8884.88));
/// assert_eq!(round_half_up(dec!(-0.005)), dec!(-0.01));
/// ```
pub fn round_half_up(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Floors an amount at zero.
pub fn non_negative(value: Decimal) -> Decimal {
    value.max(Decimal::ZERO)
}

/// Limits `amount` to `ceiling`; `None` means no limit.
///
/// ```
/// use rust_decimal_macros::dec;
/// use itax_core::calculations::common::cap;
///
/// assert_eq!(cap(dec!(200000), Some(dec!(150000))), dec!(150000));
/// assert_eq!(cap(dec!(90000), None), dec!(90000));
/// ```
pub fn cap(
    amount: Decimal,
    ceiling: Option<Decimal>,
) -> Decimal {
    match ceiling {
        Some(ceiling) => amount.min(ceiling),
        None => amount,
    }
}

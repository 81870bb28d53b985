//! Health and education cess.

use rust_decimal::Decimal;

/// Flat cess on tax plus surcharge.
pub fn cess(
    cess_rate: Decimal,
    tax: Decimal,
    surcharge: Decimal,
) -> Decimal {
    (tax + surcharge) * cess_rate
}

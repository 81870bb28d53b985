//! Income aggregation.

use rust_decimal::Decimal;
use tracing::warn;

use crate::IncomeDetails;

/// Sums every income source. No caps, no validation.
///
/// Negative components are summed as given; a warning is traced because
/// input validation belongs to the caller.
pub fn total_income(income: &IncomeDetails) -> Decimal {
    income
        .fields()
        .into_iter()
        .map(|(field, amount)| {
            if amount < Decimal::ZERO {
                warn!(field, amount = %amount, "negative income component passed to engine");
            }
            amount
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn sums_all_five_sources() {
        let income = IncomeDetails {
            salary_income: dec!(1000000),
            business_income: dec!(200000),
            capital_gains: dec!(50000.50),
            house_property_income: dec!(120000),
            other_income: dec!(9999.50),
        };

        assert_eq!(total_income(&income), dec!(1380000));
    }

    #[test]
    fn empty_income_is_zero() {
        assert_eq!(total_income(&IncomeDetails::default()), dec!(0));
    }

    #[test]
    fn negative_components_are_not_rejected() {
        let income = IncomeDetails {
            salary_income: dec!(500000),
            house_property_income: dec!(-200000),
            ..IncomeDetails::default()
        };

        assert_eq!(total_income(&income), dec!(300000));
    }
}

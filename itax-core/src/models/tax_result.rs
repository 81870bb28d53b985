use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Regime;

/// Liability breakdown for one regime.
///
/// `total_tax_liability` is always `income_tax + surcharge + cess`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxResult {
    pub total_income: Decimal,
    pub total_deductions: Decimal,
    pub taxable_income: Decimal,
    /// Slab tax after any rebate, before surcharge and cess.
    pub income_tax: Decimal,
    pub surcharge: Decimal,
    pub cess: Decimal,
    pub total_tax_liability: Decimal,
}

impl TaxResult {
    /// Liability as a percentage of total income; zero when there is no income.
    pub fn effective_rate(&self) -> Decimal {
        if self.total_income <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        self.total_tax_liability / self.total_income * Decimal::ONE_HUNDRED
    }
}

/// Old-versus-new summary produced by the regime comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonResult {
    pub old_regime_tax: Decimal,
    pub new_regime_tax: Decimal,
    /// Absolute difference between the two liabilities.
    pub savings: Decimal,
    /// Regime with the lower liability; `Old` on a tie.
    pub better_regime: Regime,
}

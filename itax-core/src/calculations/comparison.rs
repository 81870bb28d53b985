//! Old-versus-new regime comparison.

use serde::Serialize;

use crate::calculations::TaxEngine;
use crate::{ComparisonResult, DeductionDetails, IncomeDetails, Regime, TaxResult};

/// Full liability under each regime for the same inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegimeComparison {
    pub old_regime: TaxResult,
    pub new_regime: TaxResult,
}

impl RegimeComparison {
    pub fn result(
        &self,
        regime: Regime,
    ) -> &TaxResult {
        match regime {
            Regime::Old => &self.old_regime,
            Regime::New => &self.new_regime,
        }
    }

    /// Savings and the cheaper regime. Ties go to the old regime.
    pub fn summary(&self) -> ComparisonResult {
        let old_regime_tax = self.old_regime.total_tax_liability;
        let new_regime_tax = self.new_regime.total_tax_liability;

        ComparisonResult {
            old_regime_tax,
            new_regime_tax,
            savings: (old_regime_tax - new_regime_tax).abs(),
            better_regime: if old_regime_tax <= new_regime_tax {
                Regime::Old
            } else {
                Regime::New
            },
        }
    }
}

impl TaxEngine {
    /// Runs the liability pipeline once per regime with identical inputs.
    pub fn compare_regimes(
        &self,
        income: &IncomeDetails,
        deductions: &DeductionDetails,
    ) -> RegimeComparison {
        RegimeComparison {
            old_regime: self.calculate_tax_liability(income, deductions, Regime::Old),
            new_regime: self.calculate_tax_liability(income, deductions, Regime::New),
        }
    }

    pub fn calculate_tax_savings(
        &self,
        income: &IncomeDetails,
        deductions: &DeductionDetails,
    ) -> ComparisonResult {
        self.compare_regimes(income, deductions).summary()
    }
}

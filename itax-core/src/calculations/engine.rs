//! Income-tax liability for one regime.
//!
//! [`TaxEngine`] binds a validated [`TaxRuleSet`] and runs the liability
//! pipeline against it. Every step is a pure function of its inputs and the
//! bound rules, so one engine can be shared freely between callers.
//!
//! # Pipeline
//!
//! | Step | Description |
//! |------|-------------|
//! | 1    | Total income (sum of the five sources) |
//! | 2    | Total deductions (standard deduction, plus capped claims under the old regime) |
//! | 3    | Taxable income (step 1 - step 2, minimum 0) |
//! | 4    | Slab tax for the regime, with the rebate override applied |
//! | 5    | Surcharge on step 4, rate chosen by step 3 |
//! | 6    | Cess on step 4 + step 5 |
//! | 7    | Total liability (step 4 + step 5 + step 6) |
//!
//! Nothing is rounded, so step 7 is exactly the sum of its parts.
//!
//! # Example
//!
//! ```
//! use rust_decimal_macros::dec;
//! use itax_core::calculations::TaxEngine;
//! use itax_core::{DeductionDetails, IncomeDetails, Regime};
//!
//! let engine = TaxEngine::default();
//! let income = IncomeDetails::salaried(dec!(1200000));
//!
//! let result = engine.calculate_tax_liability(&income, &DeductionDetails::default(), Regime::New);
//!
//! assert_eq!(result.taxable_income, dec!(1125000));
//! assert_eq!(result.income_tax, dec!(68750));
//! assert_eq!(result.cess, dec!(2750));
//! assert_eq!(result.total_tax_liability, dec!(71500));
//! ```

use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::calculations::common::non_negative;
use crate::calculations::deductions::DeductionBreakdown;
use crate::calculations::slabs::SlabTax;
use crate::calculations::{cess, deductions, income, slabs, surcharge};
use crate::{DeductionDetails, IncomeDetails, Regime, RuleSetError, TaxResult, TaxRuleSet};

/// Tax calculator bound to one financial year's rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaxEngine {
    rules: TaxRuleSet,
}

impl TaxEngine {
    /// Validates `rules` and binds them.
    ///
    /// # Errors
    ///
    /// Returns the first [`RuleSetError`] found in the tables. Once an engine
    /// exists none of its operations can fail.
    pub fn new(rules: TaxRuleSet) -> Result<Self, RuleSetError> {
        rules.validate()?;
        debug!(financial_year = %rules.financial_year, "tax engine bound to rule set");
        Ok(Self { rules })
    }

    pub fn rules(&self) -> &TaxRuleSet {
        &self.rules
    }

    /// Step 1: gross income from every source.
    pub fn total_income(
        &self,
        income: &IncomeDetails,
    ) -> Decimal {
        income::total_income(income)
    }

    /// Step 2: deductions allowed under `regime`.
    pub fn total_deductions(
        &self,
        deductions: &DeductionDetails,
        regime: Regime,
    ) -> Decimal {
        if regime == Regime::Old {
            for (field, amount) in deductions.fields() {
                if amount < Decimal::ZERO {
                    warn!(field, amount = %amount, "negative deduction passed to engine");
                }
            }
        }
        deductions::total_deductions(&self.rules, deductions, regime)
    }

    /// Per-field view of step 2.
    pub fn deduction_breakdown(
        &self,
        deductions: &DeductionDetails,
        regime: Regime,
    ) -> DeductionBreakdown {
        deductions::deduction_breakdown(&self.rules, deductions, regime)
    }

    /// Step 4 under the old regime.
    pub fn old_regime_tax(
        &self,
        taxable_income: Decimal,
    ) -> Decimal {
        self.regime_tax(Regime::Old, taxable_income)
    }

    /// Step 4 under the new regime, including the rebate override.
    pub fn new_regime_tax(
        &self,
        taxable_income: Decimal,
    ) -> Decimal {
        self.regime_tax(Regime::New, taxable_income)
    }

    pub fn regime_tax(
        &self,
        regime: Regime,
        taxable_income: Decimal,
    ) -> Decimal {
        slabs::regime_tax(self.rules.regime(regime), taxable_income)
    }

    /// Slab-by-slab view of step 4, before the rebate.
    pub fn slab_breakdown(
        &self,
        regime: Regime,
        taxable_income: Decimal,
    ) -> Vec<SlabTax> {
        slabs::slab_breakdown(&self.rules.regime(regime).slabs, taxable_income)
    }

    /// Rate applied to the next rupee of taxable income, ignoring the rebate.
    pub fn marginal_rate(
        &self,
        regime: Regime,
        taxable_income: Decimal,
    ) -> Decimal {
        slabs::marginal_rate(&self.rules.regime(regime).slabs, taxable_income)
    }

    /// Step 5.
    pub fn surcharge(
        &self,
        tax: Decimal,
        taxable_income: Decimal,
    ) -> Decimal {
        surcharge::surcharge(&self.rules.surcharge_tiers, tax, taxable_income)
    }

    /// Step 6.
    pub fn cess(
        &self,
        tax: Decimal,
        surcharge: Decimal,
    ) -> Decimal {
        cess::cess(self.rules.cess_rate, tax, surcharge)
    }

    /// Runs the whole pipeline for one regime.
    ///
    /// Deduction fields are ignored under the new regime, so the same
    /// `deductions` can be passed for either regime.
    pub fn calculate_tax_liability(
        &self,
        income: &IncomeDetails,
        deductions: &DeductionDetails,
        regime: Regime,
    ) -> TaxResult {
        let total_income = self.total_income(income);
        let total_deductions = self.total_deductions(deductions, regime);
        let taxable_income = self.taxable_income(total_income, total_deductions);
        let income_tax = self.regime_tax(regime, taxable_income);
        let surcharge = self.surcharge(income_tax, taxable_income);
        let cess = self.cess(income_tax, surcharge);
        let total_tax_liability = income_tax + surcharge + cess;

        debug!(
            regime = %regime,
            total_income = %total_income,
            total_deductions = %total_deductions,
            taxable_income = %taxable_income,
            income_tax = %income_tax,
            surcharge = %surcharge,
            cess = %cess,
            total_tax_liability = %total_tax_liability,
            "calculated tax liability"
        );

        TaxResult {
            total_income,
            total_deductions,
            taxable_income,
            income_tax,
            surcharge,
            cess,
            total_tax_liability,
        }
    }

    /// Step 3: never negative.
    fn taxable_income(
        &self,
        total_income: Decimal,
        total_deductions: Decimal,
    ) -> Decimal {
        non_negative(total_income - total_deductions)
    }
}

impl Default for TaxEngine {
    /// Engine bound to [`TaxRuleSet::fy_2024_25`].
    fn default() -> Self {
        Self {
            rules: TaxRuleSet::fy_2024_25(),
        }
    }
}

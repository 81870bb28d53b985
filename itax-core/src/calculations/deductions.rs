//! Deduction aggregation.
//!
//! The new regime allows only its standard deduction. The old regime adds
//! every claimed deduction, each capped at its own statutory ceiling, so
//! callers can pass raw claimed amounts.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::calculations::common::cap;
use crate::{DeductionDetails, Regime, TaxRuleSet};

/// One deduction line after its ceiling has been applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AllowedDeduction {
    pub field: &'static str,
    pub claimed: Decimal,
    pub ceiling: Option<Decimal>,
    pub allowed: Decimal,
}

/// Standard deduction plus the allowed amount of each claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeductionBreakdown {
    pub regime: Regime,
    pub standard_deduction: Decimal,
    /// Empty under the new regime.
    pub lines: Vec<AllowedDeduction>,
}

impl DeductionBreakdown {
    pub fn total(&self) -> Decimal {
        self.standard_deduction + self.lines.iter().map(|line| line.allowed).sum::<Decimal>()
    }
}

/// Applies the regime's deduction policy to the claimed amounts.
pub fn deduction_breakdown(
    rules: &TaxRuleSet,
    deductions: &DeductionDetails,
    regime: Regime,
) -> DeductionBreakdown {
    let standard_deduction = rules.regime(regime).standard_deduction;

    let lines = match regime {
        Regime::New => Vec::new(),
        Regime::Old => {
            let limits = &rules.deduction_limits;
            let ceilings = [
                limits.section_80c,
                limits.section_80d,
                limits.hra,
                limits.lta,
                limits.nps,
                limits.home_loan_interest,
                limits.other_deductions,
            ];
            deductions
                .fields()
                .into_iter()
                .zip(ceilings)
                .map(|((field, claimed), ceiling)| AllowedDeduction {
                    field,
                    claimed,
                    ceiling,
                    allowed: cap(claimed, ceiling),
                })
                .collect()
        }
    };

    DeductionBreakdown {
        regime,
        standard_deduction,
        lines,
    }
}

/// Total deduction for `regime`.
pub fn total_deductions(
    rules: &TaxRuleSet,
    deductions: &DeductionDetails,
    regime: Regime,
) -> Decimal {
    deduction_breakdown(rules, deductions, regime).total()
}

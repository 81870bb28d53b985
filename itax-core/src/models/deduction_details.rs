use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::income_details::amount_or_zero;

/// Deductions claimed by the taxpayer, as raw claimed amounts.
///
/// Only the old regime looks at these; statutory ceilings are applied when
/// the engine aggregates them, so callers pass what was claimed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DeductionDetails {
    #[serde(rename = "section80C", deserialize_with = "amount_or_zero")]
    pub section_80c: Decimal,

    #[serde(rename = "section80D", deserialize_with = "amount_or_zero")]
    pub section_80d: Decimal,

    /// Exempt HRA, already computed by the caller from salary, rent and city.
    #[serde(deserialize_with = "amount_or_zero")]
    pub hra: Decimal,

    #[serde(deserialize_with = "amount_or_zero")]
    pub lta: Decimal,

    #[serde(deserialize_with = "amount_or_zero")]
    pub nps: Decimal,

    #[serde(deserialize_with = "amount_or_zero")]
    pub home_loan_interest: Decimal,

    #[serde(deserialize_with = "amount_or_zero")]
    pub other_deductions: Decimal,
}

impl DeductionDetails {
    /// Every claim with its contract field name, in declaration order.
    pub fn fields(&self) -> [(&'static str, Decimal); 7] {
        [
            ("section80C", self.section_80c),
            ("section80D", self.section_80d),
            ("hra", self.hra),
            ("lta", self.lta),
            ("nps", self.nps),
            ("homeLoanInterest", self.home_loan_interest),
            ("otherDeductions", self.other_deductions),
        ]
    }
}

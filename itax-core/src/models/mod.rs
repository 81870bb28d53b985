mod deduction_details;
mod financial_year;
mod income_details;
mod regime;
mod rule_set;
mod tax_result;
mod tax_slab;

pub use deduction_details::DeductionDetails;
pub use financial_year::{FinancialYear, FinancialYearParseError};
pub use income_details::IncomeDetails;
pub use regime::Regime;
pub use rule_set::{
    DeductionLimits, Rebate, RegimeRules, RuleSetError, SurchargeTier, TaxRuleSet,
};
pub use tax_result::{ComparisonResult, TaxResult};
pub use tax_slab::TaxSlab;

//! Income-tax calculations for the old and new regimes.
//!
//! The liability pipeline is split into one module per step (income,
//! deductions, slabs, surcharge, cess), each a set of pure functions over a
//! [`TaxRuleSet`](crate::TaxRuleSet). [`TaxEngine`] binds a validated rule set
//! and composes them; [`comparison`] and [`planning`] build on the engine.

pub mod cess;
pub mod common;
pub mod comparison;
pub mod deductions;
pub mod engine;
pub mod income;
pub mod planning;
pub mod slabs;
pub mod surcharge;

pub use comparison::RegimeComparison;
pub use deductions::{AllowedDeduction, DeductionBreakdown};
pub use engine::TaxEngine;
pub use planning::{
    EducationPlan, EducationYear, InvestmentGrowth, InvestmentYear, LoanSchedule, LoanYear,
    MAX_HORIZON_YEARS, MAX_LOAN_YEARS, PlanningError, Section80cPlan, education_goal,
    investment_growth, loan_schedule,
};
pub use slabs::SlabTax;

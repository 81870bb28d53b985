//! Tax planning calculators.
//!
//! Helpers a taxpayer reaches for once the liability is known: how much
//! old-regime tax an extra Section 80C investment would save, what a home
//! loan costs each year (the yearly interest is the home-loan interest claim),
//! how a regular investment grows, and what monthly saving meets an
//! inflating education goal.
//!
//! Unlike the liability pipeline these produce money amounts meant for display,
//! so instalments and percentages are rounded half-up to two places.

use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::calculations::TaxEngine;
use crate::calculations::common::{non_negative, round_half_up};
use crate::{DeductionDetails, IncomeDetails, Regime};

/// Longest home loan [`loan_schedule`] accepts.
pub const MAX_LOAN_YEARS: u32 = 30;

/// Longest horizon [`investment_growth`] and [`education_goal`] accept.
pub const MAX_HORIZON_YEARS: u32 = 50;

/// Errors from the free-standing planning calculators.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanningError {
    #[error("loan tenure must be at least one year")]
    ZeroTenure,

    #[error("loan tenure of {years} years exceeds the {max}-year maximum")]
    TenureTooLong { years: u32, max: u32 },

    #[error("planning horizon must be 1 to {max} years, got {years}")]
    HorizonOutOfRange { years: u32, max: u32 },

    #[error("loan principal must be non-negative, got {0}")]
    NegativePrincipal(Decimal),

    #[error("interest rate must be non-negative, got {0}")]
    NegativeRate(Decimal),

    #[error("{field} must be non-negative, got {value}")]
    NegativeAmount { field: &'static str, value: Decimal },

    #[error("{0} is too large to compute")]
    Overflow(&'static str),
}

/// What investing the unused Section 80C limit would save under the old regime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Section80cPlan {
    pub ceiling: Decimal,
    pub claimed: Decimal,
    pub remaining_limit: Decimal,
    /// Remaining limit, bounded by total income.
    pub additional_investment: Decimal,
    pub tax_without_investment: Decimal,
    pub tax_with_investment: Decimal,
    pub tax_saved: Decimal,
    /// Tax saved per rupee invested, as a percentage.
    pub effective_return_pct: Decimal,
}

/// One year of a [`LoanSchedule`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanYear {
    pub year: u32,
    pub principal_paid: Decimal,
    pub interest_paid: Decimal,
    pub closing_balance: Decimal,
}

/// Equated monthly instalment and its yearly amortisation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanSchedule {
    pub principal: Decimal,
    pub annual_rate_pct: Decimal,
    pub tenure_years: u32,
    pub emi: Decimal,
    pub total_payment: Decimal,
    pub total_interest: Decimal,
    pub years: Vec<LoanYear>,
}

/// One year of an [`InvestmentGrowth`] projection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvestmentYear {
    pub year: u32,
    pub contributed: Decimal,
    pub value: Decimal,
}

/// A lump sum plus a fixed monthly contribution, compounded monthly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvestmentGrowth {
    pub initial_investment: Decimal,
    pub monthly_contribution: Decimal,
    pub annual_return_pct: Decimal,
    pub duration_years: u32,
    pub future_value: Decimal,
    pub total_contributed: Decimal,
    pub interest_earned: Decimal,
    pub years: Vec<InvestmentYear>,
}

/// One year of an [`EducationPlan`]: the goal inflated to that year and what
/// the monthly saving has built up by then.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EducationYear {
    pub year: u32,
    pub goal: Decimal,
    pub accumulated: Decimal,
}

/// Saving plan for an education goal priced in today's money.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EducationPlan {
    pub target: Decimal,
    pub years_to_goal: u32,
    pub inflation_pct: Decimal,
    pub annual_return_pct: Decimal,
    pub inflation_adjusted_goal: Decimal,
    pub monthly_investment: Decimal,
    pub total_investment: Decimal,
    pub years: Vec<EducationYear>,
}

impl TaxEngine {
    /// Plans an additional Section 80C investment.
    ///
    /// Returns `None` when the bound rules leave Section 80C uncapped, since
    /// there is no headroom to compute.
    pub fn plan_section_80c(
        &self,
        income: &IncomeDetails,
        deductions: &DeductionDetails,
    ) -> Option<Section80cPlan> {
        let ceiling = self.rules().deduction_limits.section_80c?;
        let claimed = deductions.section_80c;
        let remaining_limit = non_negative(ceiling - claimed);
        let additional_investment =
            remaining_limit.min(non_negative(self.total_income(income)));

        let tax_without_investment = self
            .calculate_tax_liability(income, deductions, Regime::Old)
            .total_tax_liability;
        let invested = DeductionDetails {
            section_80c: claimed + additional_investment,
            ..deductions.clone()
        };
        let tax_with_investment = self
            .calculate_tax_liability(income, &invested, Regime::Old)
            .total_tax_liability;
        let tax_saved = tax_without_investment - tax_with_investment;

        let effective_return_pct = if additional_investment > Decimal::ZERO {
            round_half_up(tax_saved / additional_investment * Decimal::ONE_HUNDRED)
        } else {
            Decimal::ZERO
        };

        Some(Section80cPlan {
            ceiling,
            claimed,
            remaining_limit,
            additional_investment,
            tax_without_investment,
            tax_with_investment,
            tax_saved,
            effective_return_pct,
        })
    }
}

/// Builds a monthly-reducing-balance loan schedule.
///
/// EMI = P·r·(1+r)^n / ((1+r)^n − 1) with `r` the monthly rate and `n` the
/// number of months; a zero rate repays `P / n` each month.
///
/// # Errors
///
/// Returns [`PlanningError`] for a zero tenure or one over
/// [`MAX_LOAN_YEARS`], a negative principal or rate, or amounts too large
/// for a decimal.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use itax_core::calculations::loan_schedule;
///
/// let schedule = loan_schedule(dec!(100000), dec!(12), 1).unwrap();
///
/// assert_eq!(schedule.emi, dec!(8884.88));
/// assert_eq!(schedule.years.len(), 1);
/// ```
pub fn loan_schedule(
    principal: Decimal,
    annual_rate_pct: Decimal,
    tenure_years: u32,
) -> Result<LoanSchedule, PlanningError> {
    if tenure_years == 0 {
        return Err(PlanningError::ZeroTenure);
    }
    if tenure_years > MAX_LOAN_YEARS {
        return Err(PlanningError::TenureTooLong {
            years: tenure_years,
            max: MAX_LOAN_YEARS,
        });
    }
    if principal < Decimal::ZERO {
        return Err(PlanningError::NegativePrincipal(principal));
    }
    if annual_rate_pct < Decimal::ZERO {
        return Err(PlanningError::NegativeRate(annual_rate_pct));
    }

    let overflow = || PlanningError::Overflow("loan");
    let months = tenure_years * 12;
    let monthly_rate = monthly_rate(annual_rate_pct);
    let emi = if monthly_rate.is_zero() {
        principal / Decimal::from(months)
    } else {
        let growth = compound(Decimal::ONE + monthly_rate, months).ok_or_else(overflow)?;
        principal
            .checked_mul(monthly_rate)
            .and_then(|p| p.checked_mul(growth))
            .ok_or_else(overflow)?
            / (growth - Decimal::ONE)
    };

    let mut balance = principal;
    let mut years = Vec::with_capacity(tenure_years as usize);
    for year in 1..=tenure_years {
        let mut principal_paid = Decimal::ZERO;
        let mut interest_paid = Decimal::ZERO;
        for _ in 0..12 {
            let interest = balance.checked_mul(monthly_rate).ok_or_else(overflow)?;
            let repaid = emi.checked_sub(interest).ok_or_else(overflow)?;
            interest_paid = interest_paid.checked_add(interest).ok_or_else(overflow)?;
            principal_paid = principal_paid.checked_add(repaid).ok_or_else(overflow)?;
            balance = balance.checked_sub(repaid).ok_or_else(overflow)?;
        }
        years.push(LoanYear {
            year,
            principal_paid: round_half_up(principal_paid),
            interest_paid: round_half_up(interest_paid),
            closing_balance: round_half_up(non_negative(balance)),
        });
    }

    let total_payment = emi
        .checked_mul(Decimal::from(months))
        .map(round_half_up)
        .ok_or_else(overflow)?;
    debug!(
        principal = %principal,
        annual_rate_pct = %annual_rate_pct,
        tenure_years,
        emi = %emi,
        "built loan schedule"
    );

    Ok(LoanSchedule {
        principal,
        annual_rate_pct,
        tenure_years,
        emi: round_half_up(emi),
        total_payment,
        total_interest: total_payment - principal,
        years,
    })
}

/// Grows `initial` with `monthly` added at the end of every month, compounded
/// monthly at `annual_return_pct`.
///
/// # Errors
///
/// [`PlanningError`] for a horizon outside `1..=MAX_HORIZON_YEARS`, a
/// negative amount or rate, or a value too large for a decimal.
///
/// # Examples
///
/// ```
/// use rust_decimal_macros::dec;
/// use itax_core::calculations::investment_growth;
///
/// let growth = investment_growth(dec!(0), dec!(1000), dec!(12), 1).unwrap();
///
/// assert_eq!(growth.future_value, dec!(12682.50));
/// assert_eq!(growth.interest_earned, dec!(682.50));
/// ```
pub fn investment_growth(
    initial: Decimal,
    monthly: Decimal,
    annual_return_pct: Decimal,
    duration_years: u32,
) -> Result<InvestmentGrowth, PlanningError> {
    check_horizon(duration_years)?;
    check_amount("initial investment", initial)?;
    check_amount("monthly contribution", monthly)?;
    if annual_return_pct < Decimal::ZERO {
        return Err(PlanningError::NegativeRate(annual_return_pct));
    }

    let overflow = || PlanningError::Overflow("investment");
    let growth = Decimal::ONE + monthly_rate(annual_return_pct);
    let mut value = initial;
    let mut contributed = initial;
    let mut years = Vec::with_capacity(duration_years as usize);
    for year in 1..=duration_years {
        for _ in 0..12 {
            value = value
                .checked_mul(growth)
                .and_then(|v| v.checked_add(monthly))
                .ok_or_else(overflow)?;
            contributed = contributed.checked_add(monthly).ok_or_else(overflow)?;
        }
        years.push(InvestmentYear {
            year,
            contributed: round_half_up(contributed),
            value: round_half_up(value),
        });
    }

    debug!(
        initial = %initial,
        monthly = %monthly,
        annual_return_pct = %annual_return_pct,
        duration_years,
        future_value = %value,
        "projected investment growth"
    );
    let future_value = round_half_up(value);
    Ok(InvestmentGrowth {
        initial_investment: initial,
        monthly_contribution: monthly,
        annual_return_pct,
        duration_years,
        future_value,
        total_contributed: contributed,
        interest_earned: future_value - round_half_up(contributed),
        years,
    })
}

/// Monthly saving that reaches `target` (in today's money) after
/// `years_to_goal` years of `inflation_pct` inflation, invested at
/// `annual_return_pct` compounded monthly with end-of-month deposits.
///
/// # Errors
///
/// [`PlanningError`] for a horizon outside `1..=MAX_HORIZON_YEARS`, a
/// negative amount or rate, or a goal too large for a decimal.
pub fn education_goal(
    target: Decimal,
    years_to_goal: u32,
    inflation_pct: Decimal,
    annual_return_pct: Decimal,
) -> Result<EducationPlan, PlanningError> {
    check_horizon(years_to_goal)?;
    check_amount("goal amount", target)?;
    check_amount("inflation rate", inflation_pct)?;
    if annual_return_pct < Decimal::ZERO {
        return Err(PlanningError::NegativeRate(annual_return_pct));
    }

    let overflow = || PlanningError::Overflow("education goal");
    let inflation = Decimal::ONE + inflation_pct / Decimal::ONE_HUNDRED;
    let inflated = |year: u32| {
        compound(inflation, year)
            .and_then(|factor| target.checked_mul(factor))
            .ok_or_else(overflow)
    };
    let inflation_adjusted_goal = inflated(years_to_goal)?;

    let months = years_to_goal * 12;
    let rate = monthly_rate(annual_return_pct);
    let monthly_investment = if rate.is_zero() {
        inflation_adjusted_goal / Decimal::from(months)
    } else {
        let growth = compound(Decimal::ONE + rate, months).ok_or_else(overflow)?;
        inflation_adjusted_goal.checked_mul(rate).ok_or_else(overflow)? / (growth - Decimal::ONE)
    };

    let mut accumulated = Decimal::ZERO;
    let mut years = Vec::with_capacity(years_to_goal as usize);
    for year in 1..=years_to_goal {
        for _ in 0..12 {
            accumulated = accumulated
                .checked_mul(Decimal::ONE + rate)
                .and_then(|v| v.checked_add(monthly_investment))
                .ok_or_else(overflow)?;
        }
        years.push(EducationYear {
            year,
            goal: round_half_up(inflated(year)?),
            accumulated: round_half_up(accumulated),
        });
    }

    let total_investment = monthly_investment
        .checked_mul(Decimal::from(months))
        .map(round_half_up)
        .ok_or_else(overflow)?;
    debug!(
        target = %target,
        years_to_goal,
        monthly_investment = %monthly_investment,
        "planned education goal"
    );

    Ok(EducationPlan {
        target,
        years_to_goal,
        inflation_pct,
        annual_return_pct,
        inflation_adjusted_goal: round_half_up(inflation_adjusted_goal),
        monthly_investment: round_half_up(monthly_investment),
        total_investment,
        years,
    })
}

fn monthly_rate(annual_pct: Decimal) -> Decimal {
    annual_pct / Decimal::ONE_HUNDRED / Decimal::from(12)
}

fn check_horizon(years: u32) -> Result<(), PlanningError> {
    if (1..=MAX_HORIZON_YEARS).contains(&years) {
        Ok(())
    } else {
        Err(PlanningError::HorizonOutOfRange {
            years,
            max: MAX_HORIZON_YEARS,
        })
    }
}

fn check_amount(
    field: &'static str,
    value: Decimal,
) -> Result<(), PlanningError> {
    if value < Decimal::ZERO {
        Err(PlanningError::NegativeAmount { field, value })
    } else {
        Ok(())
    }
}

fn compound(
    base: Decimal,
    periods: u32,
) -> Option<Decimal> {
    (0..periods).try_fold(Decimal::ONE, |acc, _| acc.checked_mul(base))
}

//! Text and JSON rendering of engine output.
//!
//! Text renderers return a `String` so commands can print it in one go and
//! tests can assert on it. Amounts are shown rounded to paise; the JSON
//! reports carry the engine's exact values.

use std::fmt::Write;

use itax_core::calculations::{
    DeductionBreakdown, EducationPlan, InvestmentGrowth, LoanSchedule, RegimeComparison,
    Section80cPlan, SlabTax,
};
use itax_core::{ComparisonResult, FinancialYear, Regime, TaxResult, TaxRuleSet, TaxSlab};
use serde::Serialize;

use crate::utils::{format_inr, format_percent, format_rate, opt_amount_display};

const LABEL_WIDTH: usize = 28;
const VALUE_WIDTH: usize = 18;

/// `calculate --json` payload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationReport {
    pub financial_year: FinancialYear,
    pub regime: Regime,
    #[serde(flatten)]
    pub result: TaxResult,
    pub deductions: DeductionBreakdown,
    pub slabs: Vec<SlabTax>,
}

/// `compare --json` payload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonReport {
    pub financial_year: FinancialYear,
    #[serde(flatten)]
    pub regimes: RegimeComparison,
    pub summary: ComparisonResult,
}

fn line(
    out: &mut String,
    label: &str,
    value: &str,
) {
    let _ = writeln!(out, "  {label:<LABEL_WIDTH$}{value:>VALUE_WIDTH$}");
}

fn heading(
    out: &mut String,
    title: &str,
) {
    let _ = writeln!(out, "{title}");
    let _ = writeln!(out, "{}", "-".repeat(title.chars().count()));
}

fn slab_range(slab: &TaxSlab) -> String {
    match slab.max_income {
        Some(max) => format!("{} - {}", format_inr(slab.min_income), format_inr(max)),
        None => format!("above {}", format_inr(slab.min_income)),
    }
}

fn result_lines(
    out: &mut String,
    result: &TaxResult,
) {
    line(out, "Total income", &format_inr(result.total_income));
    line(out, "Deductions", &format_inr(result.total_deductions));
    line(out, "Taxable income", &format_inr(result.taxable_income));
    line(out, "Income tax", &format_inr(result.income_tax));
    line(out, "Surcharge", &format_inr(result.surcharge));
    line(out, "Health & education cess", &format_inr(result.cess));
    line(out, "Total tax liability", &format_inr(result.total_tax_liability));
    line(out, "Effective rate", &format_percent(result.effective_rate()));
}

/// Full breakdown for one regime.
pub fn render_calculation(report: &CalculationReport) -> String {
    let mut out = String::new();
    heading(
        &mut out,
        &format!(
            "Tax liability for FY {} (AY {}), {}",
            report.financial_year.label(),
            report.financial_year.assessment_year(),
            report.regime.display_name()
        ),
    );
    result_lines(&mut out, &report.result);

    out.push('\n');
    heading(&mut out, "Deductions");
    line(
        &mut out,
        "Standard deduction",
        &format_inr(report.deductions.standard_deduction),
    );
    for entry in report.deductions.lines.iter().filter(|l| !l.claimed.is_zero()) {
        let label = match entry.ceiling {
            Some(ceiling) if entry.claimed > ceiling => {
                format!("{} (capped at {})", entry.field, format_inr(ceiling))
            }
            _ => entry.field.to_string(),
        };
        line(&mut out, &label, &format_inr(entry.allowed));
    }
    if report.regime == Regime::New {
        let _ = writeln!(out, "  (the new regime allows only the standard deduction)");
    }

    out.push('\n');
    heading(&mut out, "Slabs");
    if report.slabs.is_empty() {
        let _ = writeln!(out, "  no taxable income");
    }
    for entry in &report.slabs {
        let _ = writeln!(
            out,
            "  {:<34} {:>5}  on {:>16}  = {:>14}",
            slab_range(&entry.slab),
            format_rate(entry.slab.rate),
            format_inr(entry.taxed_amount),
            format_inr(entry.tax)
        );
    }
    let slab_total: rust_decimal::Decimal = report.slabs.iter().map(|s| s.tax).sum();
    if slab_total != report.result.income_tax {
        let _ = writeln!(
            out,
            "  rebate reduces slab tax of {} to {}",
            format_inr(slab_total),
            format_inr(report.result.income_tax)
        );
    }
    out
}

/// Side-by-side liabilities and the recommendation.
pub fn render_comparison(report: &ComparisonReport) -> String {
    let mut out = String::new();
    heading(
        &mut out,
        &format!("Regime comparison for FY {}", report.financial_year.label()),
    );
    let _ = writeln!(
        out,
        "  {:<LABEL_WIDTH$}{:>VALUE_WIDTH$}{:>VALUE_WIDTH$}",
        "", "Old Regime", "New Regime"
    );

    let rows: [(&str, fn(&TaxResult) -> String); 7] = [
        ("Total income", |r| format_inr(r.total_income)),
        ("Deductions", |r| format_inr(r.total_deductions)),
        ("Taxable income", |r| format_inr(r.taxable_income)),
        ("Income tax", |r| format_inr(r.income_tax)),
        ("Surcharge", |r| format_inr(r.surcharge)),
        ("Health & education cess", |r| format_inr(r.cess)),
        ("Total tax liability", |r| format_inr(r.total_tax_liability)),
    ];
    for (label, value) in rows {
        let _ = writeln!(
            out,
            "  {label:<LABEL_WIDTH$}{:>VALUE_WIDTH$}{:>VALUE_WIDTH$}",
            value(&report.regimes.old_regime),
            value(&report.regimes.new_regime)
        );
    }

    out.push('\n');
    let summary = &report.summary;
    if summary.savings.is_zero() {
        let _ = writeln!(
            out,
            "Both regimes cost the same; {} recommended.",
            summary.better_regime.display_name()
        );
    } else {
        let _ = writeln!(
            out,
            "{} saves {} over the {}.",
            summary.better_regime.display_name(),
            format_inr(summary.savings),
            summary.better_regime.other().display_name()
        );
    }
    out
}

/// Every table in a rule set.
pub fn render_rules(rules: &TaxRuleSet) -> String {
    let mut out = String::new();
    heading(
        &mut out,
        &format!("Tax rules for FY {}", rules.financial_year.label()),
    );

    for regime in Regime::ALL {
        let regime_rules = rules.regime(regime);
        out.push('\n');
        let _ = writeln!(out, "{}", regime.display_name());
        line(
            &mut out,
            "Standard deduction",
            &format_inr(regime_rules.standard_deduction),
        );
        match &regime_rules.rebate {
            Some(rebate) => line(
                &mut out,
                "Full rebate up to",
                &format_inr(rebate.income_threshold),
            ),
            None => line(&mut out, "Rebate", "none"),
        }
        for slab in &regime_rules.slabs {
            line(&mut out, &slab_range(slab), &format_rate(slab.rate));
        }
    }

    out.push('\n');
    let _ = writeln!(out, "Deduction limits (old regime)");
    for (field, limit) in rules.deduction_limits.fields() {
        line(&mut out, field, &opt_amount_display(limit));
    }

    out.push('\n');
    let _ = writeln!(out, "Surcharge");
    if rules.surcharge_tiers.is_empty() {
        line(&mut out, "Tiers", "none");
    }
    for tier in &rules.surcharge_tiers {
        line(
            &mut out,
            &format!("above {}", format_inr(tier.threshold)),
            &format_rate(tier.rate),
        );
    }
    line(&mut out, "Cess", &format_rate(rules.cess_rate));
    out
}

pub fn render_years(
    years: &[FinancialYear],
    selected: FinancialYear,
) -> String {
    if years.is_empty() {
        return "No rule sets stored.\n".to_string();
    }
    let mut out = String::new();
    for year in years {
        let marker = if *year == selected { "*" } else { " " };
        let _ = writeln!(
            out,
            "{marker} FY {} (AY {})",
            year.label(),
            year.assessment_year()
        );
    }
    out
}

pub fn render_plan(plan: &Section80cPlan) -> String {
    let mut out = String::new();
    heading(&mut out, "Section 80C plan (old regime)");
    line(&mut out, "Limit", &format_inr(plan.ceiling));
    line(&mut out, "Already claimed", &format_inr(plan.claimed));
    line(&mut out, "Remaining limit", &format_inr(plan.remaining_limit));
    line(
        &mut out,
        "Suggested investment",
        &format_inr(plan.additional_investment),
    );
    line(
        &mut out,
        "Tax without investment",
        &format_inr(plan.tax_without_investment),
    );
    line(
        &mut out,
        "Tax with investment",
        &format_inr(plan.tax_with_investment),
    );
    line(&mut out, "Tax saved", &format_inr(plan.tax_saved));
    line(
        &mut out,
        "Effective return",
        &format_percent(plan.effective_return_pct),
    );
    out
}

pub fn render_schedule(schedule: &LoanSchedule) -> String {
    let mut out = String::new();
    heading(&mut out, "Home loan schedule");
    line(&mut out, "Principal", &format_inr(schedule.principal));
    line(
        &mut out,
        "Interest rate",
        &format_percent(schedule.annual_rate_pct),
    );
    line(
        &mut out,
        "Tenure",
        &format!("{} years", schedule.tenure_years),
    );
    line(&mut out, "Monthly EMI", &format_inr(schedule.emi));
    line(&mut out, "Total payment", &format_inr(schedule.total_payment));
    line(&mut out, "Total interest", &format_inr(schedule.total_interest));

    out.push('\n');
    let _ = writeln!(
        out,
        "  {:>4}  {:>16}  {:>16}  {:>18}",
        "Year", "Principal", "Interest", "Closing balance"
    );
    for year in &schedule.years {
        let _ = writeln!(
            out,
            "  {:>4}  {:>16}  {:>16}  {:>18}",
            year.year,
            format_inr(year.principal_paid),
            format_inr(year.interest_paid),
            format_inr(year.closing_balance)
        );
    }
    let _ = writeln!(
        out,
        "\nInterest paid in a year can be claimed as homeLoanInterest under the old regime."
    );
    out
}

pub fn render_growth(growth: &InvestmentGrowth) -> String {
    let mut out = String::new();
    heading(&mut out, "Investment growth");
    line(&mut out, "Initial investment", &format_inr(growth.initial_investment));
    line(
        &mut out,
        "Monthly contribution",
        &format_inr(growth.monthly_contribution),
    );
    line(
        &mut out,
        "Expected return",
        &format_percent(growth.annual_return_pct),
    );
    line(&mut out, "Duration", &format!("{} years", growth.duration_years));
    line(&mut out, "Total contributed", &format_inr(growth.total_contributed));
    line(&mut out, "Future value", &format_inr(growth.future_value));
    line(&mut out, "Returns earned", &format_inr(growth.interest_earned));

    out.push('\n');
    let _ = writeln!(out, "  {:>4}  {:>18}  {:>18}", "Year", "Contributed", "Value");
    for year in &growth.years {
        let _ = writeln!(
            out,
            "  {:>4}  {:>18}  {:>18}",
            year.year,
            format_inr(year.contributed),
            format_inr(year.value)
        );
    }
    out
}

pub fn render_goal(plan: &EducationPlan) -> String {
    let mut out = String::new();
    heading(&mut out, "Education goal plan");
    line(&mut out, "Goal in today's money", &format_inr(plan.target));
    line(&mut out, "Years to goal", &plan.years_to_goal.to_string());
    line(&mut out, "Inflation", &format_percent(plan.inflation_pct));
    line(&mut out, "Expected return", &format_percent(plan.annual_return_pct));
    line(
        &mut out,
        "Goal at target date",
        &format_inr(plan.inflation_adjusted_goal),
    );
    line(
        &mut out,
        "Monthly investment",
        &format_inr(plan.monthly_investment),
    );
    line(&mut out, "Total invested", &format_inr(plan.total_investment));

    out.push('\n');
    let _ = writeln!(out, "  {:>4}  {:>18}  {:>18}", "Year", "Goal", "Saved");
    for year in &plan.years {
        let _ = writeln!(
            out,
            "  {:>4}  {:>18}  {:>18}",
            year.year,
            format_inr(year.goal),
            format_inr(year.accumulated)
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use itax_core::calculations::{education_goal, investment_growth, loan_schedule};
    use itax_core::{DeductionDetails, IncomeDetails, TaxEngine};
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    fn calculation(
        salary: rust_decimal::Decimal,
        deductions: DeductionDetails,
        regime: Regime,
    ) -> CalculationReport {
        let engine = TaxEngine::default();
        let income = IncomeDetails::salaried(salary);
        let result = engine.calculate_tax_liability(&income, &deductions, regime);
        CalculationReport {
            financial_year: FinancialYear(2024),
            regime,
            deductions: engine.deduction_breakdown(&deductions, regime),
            slabs: engine.slab_breakdown(regime, result.taxable_income),
            result,
        }
    }

    #[test]
    fn calculation_text_shows_totals_and_slabs() {
        let report = calculation(dec!(1200000), DeductionDetails::default(), Regime::New);

        let text = render_calculation(&report);

        assert!(text.starts_with("Tax liability for FY 2024-25 (AY 2025-26), New Regime\n"));
        assert!(text.contains("₹11,25,000.00"));
        assert!(text.contains("₹71,500.00"));
        assert!(!text.contains("above ₹15,00,000.00"));
        assert!(text.contains("₹10,00,000.00 - ₹12,00,000.00"));
        assert!(text.contains("only the standard deduction"));
    }

    #[test]
    fn calculation_text_notes_rebate() {
        let report = calculation(dec!(700000), DeductionDetails::default(), Regime::New);

        let text = render_calculation(&report);

        assert!(text.contains("rebate reduces slab tax of ₹16,250.00 to ₹0.00"));
    }

    #[test]
    fn calculation_text_flags_capped_deduction() {
        let deductions = DeductionDetails {
            section_80c: dec!(200000),
            ..DeductionDetails::default()
        };
        let report = calculation(dec!(1200000), deductions, Regime::Old);

        let text = render_calculation(&report);

        assert!(text.contains("section80C (capped at ₹1,50,000.00)"));
    }

    #[test]
    fn calculation_json_flattens_result() {
        let report = calculation(dec!(1200000), DeductionDetails::default(), Regime::New);

        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["financialYear"], "2024-25");
        assert_eq!(json["regime"], "new");
        let total = json["totalTaxLiability"]
            .as_str()
            .and_then(|s| s.parse::<rust_decimal::Decimal>().ok());
        assert_eq!(total, Some(dec!(71500)));
        assert_eq!(json["slabs"].as_array().map(Vec::len), Some(4));
    }

    #[test]
    fn comparison_text_recommends_cheaper_regime() {
        let engine = TaxEngine::default();
        let income = IncomeDetails::salaried(dec!(1200000));
        let regimes = engine.compare_regimes(&income, &DeductionDetails::default());
        let report = ComparisonReport {
            financial_year: FinancialYear(2024),
            summary: regimes.summary(),
            regimes,
        };

        let text = render_comparison(&report);

        assert!(text.contains("₹1,63,800.00"));
        assert!(text.ends_with("New Regime saves ₹92,300.00 over the Old Regime.\n"));
    }

    #[test]
    fn rules_text_lists_every_table() {
        let text = render_rules(&TaxRuleSet::fy_2024_25());

        assert!(text.starts_with("Tax rules for FY 2024-25\n"));
        assert!(text.contains("Full rebate up to"));
        assert!(text.contains("above ₹10,00,000.00"));
        assert!(text.contains("hra"));
        assert!(text.contains("no limit"));
        assert!(text.contains("above ₹5,00,00,000.00"));
    }

    #[test]
    fn years_marks_selected_year() {
        let text = render_years(&[FinancialYear(2025), FinancialYear(2024)], FinancialYear(2024));

        assert_eq!(text, "  FY 2025-26 (AY 2026-27)\n* FY 2024-25 (AY 2025-26)\n");
    }

    #[test]
    fn years_handles_empty_repository() {
        assert_eq!(render_years(&[], FinancialYear(2024)), "No rule sets stored.\n");
    }

    #[test]
    fn schedule_lists_each_year() {
        let schedule = loan_schedule(dec!(100000), dec!(12), 1).unwrap();

        let text = render_schedule(&schedule);

        assert!(text.contains("₹8,884.88"));
        assert!(text.contains("₹1,06,618.55"));
        assert!(text.contains("     1  "));
    }

    #[test]
    fn comparison_text_names_both_regimes_when_old_wins() {
        let engine = TaxEngine::default();
        let deductions = DeductionDetails {
            section_80c: dec!(150000),
            section_80d: dec!(50000),
            nps: dec!(50000),
            home_loan_interest: dec!(200000),
            hra: dec!(300000),
            ..DeductionDetails::default()
        };
        let regimes = engine.compare_regimes(&IncomeDetails::salaried(dec!(1200000)), &deductions);
        let report = ComparisonReport {
            financial_year: FinancialYear(2024),
            summary: regimes.summary(),
            regimes,
        };

        let text = render_comparison(&report);

        assert!(text.ends_with("Old Regime saves ₹63,700.00 over the New Regime.\n"));
    }

    #[test]
    fn growth_lists_each_year() {
        let growth = investment_growth(dec!(100000), dec!(10000), dec!(0), 2).unwrap();

        let text = render_growth(&growth);

        assert!(text.starts_with("Investment growth\n"));
        assert!(text.contains("₹3,40,000.00"));
        assert!(text.contains("2 years"));
        assert_eq!(text.lines().filter(|l| l.contains("₹2,20,000.00")).count(), 1);
    }

    #[test]
    fn goal_shows_inflated_target_and_saving() {
        let plan = education_goal(dec!(1000000), 1, dec!(6), dec!(0)).unwrap();

        let text = render_goal(&plan);

        assert!(text.contains("₹10,00,000.00"));
        assert!(text.contains("₹10,60,000.00"));
        assert!(text.contains("₹88,333.33"));
        assert!(text.contains("6.00%"));
    }
}

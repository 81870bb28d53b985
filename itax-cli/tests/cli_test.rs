//! End-to-end runs of the CLI commands against the bundled backends.

use std::path::PathBuf;

use clap::Parser;
use itax_cli::{Cli, Config, app};
use itax_core::TaxRuleSet;
use itax_data::RulesFile;
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn fixture(name: &str) -> String {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
        .to_string_lossy()
        .into_owned()
}

async fn run(args: &[&str]) -> anyhow::Result<String> {
    let cli = Cli::try_parse_from(args)?;
    let config = Config::default().apply(cli.overrides());
    app::execute(&cli.command, &config).await
}

async fn run_ok(args: &[&str]) -> String {
    match run(args).await {
        Ok(output) => output,
        Err(e) => panic!("{args:?} failed: {e:#}"),
    }
}

fn decimal(value: &serde_json::Value) -> Option<Decimal> {
    value.as_str().and_then(|s| s.parse().ok())
}

#[tokio::test]
async fn compare_recommends_new_regime_for_plain_salary() {
    let output = run_ok(&["itax", "compare", "--salary", "12,00,000"]).await;

    assert!(output.starts_with("Regime comparison for FY 2024-25\n"));
    assert!(output.contains("₹1,63,800.00"));
    assert!(output.contains("₹71,500.00"));
    assert!(output.ends_with("New Regime saves ₹92,300.00 over the Old Regime.\n"));
}

#[tokio::test]
async fn compare_json_carries_both_results_and_summary() {
    let output = run_ok(&[
        "itax", "compare", "--salary", "1200000", "--section-80c", "150000", "--section-80d",
        "50000", "--nps", "50000", "--home-loan-interest", "200000", "--hra", "300000",
        "--json",
    ])
    .await;

    let json: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(json["financialYear"], "2024-25");
    assert_eq!(decimal(&json["oldRegime"]["totalTaxLiability"]), Some(dec!(7800)));
    assert_eq!(decimal(&json["newRegime"]["totalTaxLiability"]), Some(dec!(71500)));
    assert_eq!(json["summary"]["betterRegime"], "old");
    assert_eq!(decimal(&json["summary"]["savings"]), Some(dec!(63700)));
}

#[tokio::test]
async fn calculate_uses_regime_from_input_file() {
    let input = fixture("form16_response.json");

    let output = run_ok(&["itax", "calculate", "--input", &input, "--json"]).await;

    let json: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(json["regime"], "old");
    assert_eq!(decimal(&json["taxableIncome"]), Some(dec!(1245000)));
    assert_eq!(decimal(&json["totalTaxLiability"]), Some(dec!(193440)));
}

#[tokio::test]
async fn calculate_flags_override_input_file() {
    let input = fixture("form16_response.json");

    let output = run_ok(&[
        "itax", "calculate", "--input", &input, "--regime", "new", "--salary", "8,00,000",
        "--json",
    ])
    .await;

    let json: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(json["regime"], "new");
    assert_eq!(decimal(&json["totalIncome"]), Some(dec!(820000)));
    assert_eq!(decimal(&json["taxableIncome"]), Some(dec!(745000)));
    assert_eq!(decimal(&json["incomeTax"]), Some(dec!(24500)));
}

#[tokio::test]
async fn calculate_rejects_negative_amount() {
    let err = run(&["itax", "calculate", "--salary=-5000"]).await.unwrap_err();

    assert_eq!(
        err.to_string(),
        "incomeDetails.salaryIncome must not be negative, got -5000"
    );
}

#[tokio::test]
async fn calculate_rejects_amount_too_large_to_compute() {
    let err = run(&[
        "itax",
        "calculate",
        "--salary",
        "40000000000000000000000000000",
        "--business",
        "40000000000000000000000000000",
    ])
    .await
    .unwrap_err();

    assert_eq!(
        err.to_string(),
        "incomeDetails.salaryIncome of 40000000000000000000000000000 exceeds the largest \
         supported amount, 1000000000000000"
    );
}

#[tokio::test]
async fn years_marks_selected_year() {
    let output = run_ok(&["itax", "years"]).await;

    assert_eq!(output, "* FY 2024-25 (AY 2025-26)\n");
}

#[tokio::test]
async fn unknown_year_lists_available_years() {
    let err = run(&["itax", "compare", "--salary", "1", "--year", "2030-31"])
        .await
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "No tax rules stored for FY 2030-31; available: 2024-25"
    );
}

#[tokio::test]
async fn unknown_backend_is_an_error() {
    let err = run(&["itax", "years", "--backend", "postgres"]).await.unwrap_err();

    assert!(format!("{err:#}").contains("unknown backend 'postgres'"));
}

#[tokio::test]
async fn rules_toml_matches_builtin_table() {
    let output = run_ok(&["itax", "rules", "--format", "toml"]).await;

    assert_eq!(RulesFile::parse(&output).unwrap(), TaxRuleSet::fy_2024_25());
}

#[tokio::test]
async fn sqlite_backend_serves_seeded_rules() {
    let output = run_ok(&[
        "itax", "calculate", "--backend", "sqlite", "--db", ":memory:", "--regime", "new",
        "--salary", "1200000", "--json",
    ])
    .await;

    let json: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(decimal(&json["totalTaxLiability"]), Some(dec!(71500)));
}

#[tokio::test]
async fn plan_80c_reports_tax_saved() {
    let output = run_ok(&[
        "itax", "plan-80c", "--salary", "1200000", "--section-80c", "50000", "--json",
    ])
    .await;

    let json: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(decimal(&json["additionalInvestment"]), Some(dec!(100000)));
    assert_eq!(decimal(&json["taxSaved"]), Some(dec!(31200)));
}

#[tokio::test]
async fn emi_runs_without_repository() {
    let output = run_ok(&[
        "itax", "emi", "--principal", "1,00,000", "--rate", "12", "--years", "1", "--backend",
        "postgres",
    ])
    .await;

    assert!(output.contains("₹8,884.88"));
}

#[tokio::test]
async fn emi_rejects_zero_tenure() {
    let result = run(&["itax", "emi", "--principal", "100000", "--rate", "9", "--years", "0"]).await;

    assert!(result.is_err());
}

#[tokio::test]
async fn emi_rejects_overlong_tenure() {
    let err = run(&["itax", "emi", "--principal", "100000", "--rate", "0", "--years", "357913941"])
        .await
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "loan tenure of 357913941 years exceeds the 30-year maximum"
    );
}

#[tokio::test]
async fn invest_projects_growth() {
    let output = run_ok(&[
        "itax", "invest", "--initial", "1,00,000", "--monthly", "0", "--rate", "12", "--years",
        "1", "--json",
    ])
    .await;

    let json: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(decimal(&json["futureValue"]), Some(dec!(112682.50)));
    assert_eq!(decimal(&json["interestEarned"]), Some(dec!(12682.50)));
    assert_eq!(json["years"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn goal_text_shows_monthly_saving() {
    let output = run_ok(&[
        "itax", "goal", "--target", "10,00,000", "--years", "1", "--inflation", "6", "--rate", "0",
        "--backend", "postgres",
    ])
    .await;

    assert!(output.starts_with("Education goal plan\n"));
    assert!(output.contains("₹10,60,000.00"));
    assert!(output.contains("₹88,333.33"));
}

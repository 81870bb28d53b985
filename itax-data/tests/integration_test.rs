//! Integration tests for rule loading against real repository backends.

use std::path::PathBuf;

use itax_core::db::InMemoryRepository;
use itax_core::{
    DeductionDetails, FinancialYear, IncomeDetails, Regime, TaxEngine, TaxRuleSet,
    TaxRulesRepository,
};
use itax_data::{RulesFile, SlabLoader, SlabLoaderError, TaxInput};
use itax_db_sqlite::SqliteRepository;
use pretty_assertions::assert_eq;
use rust_decimal_macros::dec;

const SLABS_CSV: &str = include_str!("../test-data/slabs.csv");
const RESPONSE_JSON: &str = include_str!("../test-data/response.json");

fn test_data(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("test-data")
        .join(name)
}

/// Migrated in-memory database without seed data.
async fn setup_test_db() -> SqliteRepository {
    let repo = SqliteRepository::new(":memory:")
        .await
        .expect("Failed to create in-memory database");
    repo.run_migrations()
        .await
        .expect("Failed to run migrations");
    repo
}

#[tokio::test]
async fn test_rules_file_stored_and_used_by_engine() {
    let repo = setup_test_db().await;
    let rules = RulesFile::load(&test_data("fy2025-26.toml")).expect("Failed to load rules");

    repo.save_rule_set(&rules).await.expect("Failed to save");
    let stored = repo
        .get_rule_set(FinancialYear(2025))
        .await
        .expect("Failed to read back");
    assert_eq!(stored, rules);

    let engine = TaxEngine::new(stored).expect("Stored rules should be valid");
    let none = DeductionDetails::default();

    let at_rebate_limit =
        engine.calculate_tax_liability(&IncomeDetails::salaried(dec!(1275000)), &none, Regime::New);
    assert_eq!(at_rebate_limit.taxable_income, dec!(1200000));
    assert_eq!(at_rebate_limit.total_tax_liability, dec!(0));

    let above = engine.calculate_tax_liability(&IncomeDetails::salaried(dec!(1675000)), &none, Regime::New);
    assert_eq!(above.income_tax, dec!(120000));
    assert_eq!(above.cess, dec!(4800));
    assert_eq!(above.total_tax_liability, dec!(124800));
}

#[tokio::test]
async fn test_load_slabs_replaces_one_regime() {
    let repo = InMemoryRepository::with_builtin();
    let records = SlabLoader::parse(SLABS_CSV.as_bytes()).expect("Failed to parse CSV");

    let loaded = SlabLoader::load(&repo, &records).await.expect("Failed to load slabs");
    assert_eq!(loaded, 6);

    let rules = repo
        .get_rule_set(FinancialYear(2024))
        .await
        .expect("Failed to read back");
    assert_eq!(rules.old_regime, TaxRuleSet::fy_2024_25().old_regime);
    assert_eq!(rules.new_regime.slabs.len(), 6);
    assert_eq!(rules.new_regime.slabs[1].max_income, Some(dec!(600000)));

    let engine = TaxEngine::new(rules).expect("Loaded rules should be valid");
    let tax = engine.new_regime_tax(dec!(1000000));
    assert_eq!(tax, dec!(60000));
}

#[tokio::test]
async fn test_load_slabs_into_sqlite() {
    let repo = setup_test_db().await;
    repo.save_rule_set(&TaxRuleSet::fy_2024_25())
        .await
        .expect("Failed to save");
    let records = SlabLoader::parse(SLABS_CSV.as_bytes()).expect("Failed to parse CSV");

    SlabLoader::load(&repo, &records).await.expect("Failed to load slabs");

    let rules = repo
        .get_rule_set(FinancialYear(2024))
        .await
        .expect("Failed to read back");
    assert_eq!(rules.new_regime.slabs.last().map(|s| s.rate), Some(dec!(0.30)));
    assert_eq!(rules.new_regime.slabs[2].min_income, dec!(600000));
    assert_eq!(rules.new_regime.rebate, TaxRuleSet::fy_2024_25().new_regime.rebate);
}

#[tokio::test]
async fn test_load_slabs_without_rule_set_fails() {
    let repo = setup_test_db().await;
    let records = SlabLoader::parse(SLABS_CSV.as_bytes()).expect("Failed to parse CSV");

    let result = SlabLoader::load(&repo, &records).await;

    assert!(matches!(
        result,
        Err(SlabLoaderError::YearNotFound(FinancialYear(2024)))
    ));
    assert_eq!(repo.list_financial_years().await.unwrap(), Vec::<FinancialYear>::new());
}

#[test]
fn test_extraction_response_drives_old_regime_calculation() {
    let input = TaxInput::from_json(RESPONSE_JSON).expect("Failed to parse response");
    input.validate().expect("Amounts should be non-negative");
    assert_eq!(input.tax_regime, Regime::Old);

    let engine = TaxEngine::default();
    let result = engine.calculate_tax_liability(
        &input.income_details,
        &input.deduction_details,
        input.tax_regime,
    );

    assert_eq!(result.total_income, dec!(1520000));
    assert_eq!(result.total_deductions, dec!(275000));
    assert_eq!(result.taxable_income, dec!(1245000));
    assert_eq!(result.income_tax, dec!(186000));
    assert_eq!(result.cess, dec!(7440));
    assert_eq!(result.total_tax_liability, dec!(193440));
}

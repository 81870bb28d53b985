use std::fs;

use anyhow::{Context, Result};
use itax_core::calculations::{education_goal, investment_growth, loan_schedule};
use itax_core::db::{MemoryRepositoryFactory, RepositoryRegistry};
use itax_core::{FinancialYear, RepositoryError, TaxEngine, TaxRulesRepository};
use itax_data::{RulesFile, TaxInput};
use itax_db_sqlite::SqliteRepositoryFactory;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::cli::{AmountArgs, Command, RulesFormat};
use crate::config::Config;
use crate::report::{self, CalculationReport, ComparisonReport};

/// Registry with every backend this binary ships.
pub fn build_registry() -> RepositoryRegistry {
    let mut registry = RepositoryRegistry::new();
    registry.register(Box::new(MemoryRepositoryFactory));
    registry.register(Box::new(SqliteRepositoryFactory));
    registry
}

pub async fn open_repository(config: &Config) -> Result<Box<dyn TaxRulesRepository>> {
    let db_config = config.db_config();
    debug!(backend = %db_config.backend, "connecting to rules repository");
    build_registry()
        .create(&db_config)
        .await
        .with_context(|| format!("Failed to open the '{}' rules repository", db_config.backend))
}

/// Engine bound to the rules stored for `year`.
pub async fn load_engine(
    repo: &dyn TaxRulesRepository,
    year: FinancialYear,
) -> Result<TaxEngine> {
    let rules = match repo.get_rule_set(year).await {
        Ok(rules) => rules,
        Err(RepositoryError::NotFound(_)) => {
            let available = match repo.list_financial_years().await {
                Ok(years) => years,
                Err(e) => {
                    warn!(error = %e, "could not list stored financial years");
                    Vec::new()
                }
            };
            let labels: Vec<String> = available.iter().map(FinancialYear::label).collect();
            anyhow::bail!(
                "No tax rules stored for FY {}; available: {}",
                year.label(),
                if labels.is_empty() {
                    "none".to_string()
                } else {
                    labels.join(", ")
                }
            );
        }
        Err(e) => {
            return Err(e)
                .with_context(|| format!("Failed to load tax rules for FY {}", year.label()));
        }
    };
    let engine = TaxEngine::new(rules)
        .with_context(|| format!("Stored tax rules for FY {} are invalid", year.label()))?;
    info!(financial_year = %year, "loaded tax rules");
    Ok(engine)
}

/// Input file (if any) with command-line amounts applied, validated.
pub fn read_input(amounts: &AmountArgs) -> Result<TaxInput> {
    let mut input = match &amounts.input {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("Failed to read input file {}", path.display()))?;
            TaxInput::from_json(&text)
                .with_context(|| format!("Failed to parse input file {}", path.display()))?
        }
        None => TaxInput::default(),
    };
    amounts.apply(&mut input.income_details, &mut input.deduction_details);
    input.validate()?;
    Ok(input)
}

fn to_json<T: Serialize>(value: &T) -> Result<String> {
    let mut text = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    text.push('\n');
    Ok(text)
}

/// Runs one command and returns what it prints on stdout.
pub async fn execute(
    command: &Command,
    config: &Config,
) -> Result<String> {
    let year = config.financial_year;

    match command {
        Command::Emi {
            principal,
            rate,
            years,
            json,
        } => {
            let schedule = loan_schedule(*principal, *rate, *years)?;
            if *json {
                to_json(&schedule)
            } else {
                Ok(report::render_schedule(&schedule))
            }
        }
        Command::Invest {
            initial,
            monthly,
            rate,
            years,
            json,
        } => {
            let growth = investment_growth(*initial, *monthly, *rate, *years)?;
            if *json {
                to_json(&growth)
            } else {
                Ok(report::render_growth(&growth))
            }
        }
        Command::Goal {
            target,
            years,
            inflation,
            rate,
            json,
        } => {
            let plan = education_goal(*target, *years, *inflation, *rate)?;
            if *json {
                to_json(&plan)
            } else {
                Ok(report::render_goal(&plan))
            }
        }
        Command::Years => {
            let repo = open_repository(config).await?;
            let years = repo
                .list_financial_years()
                .await
                .context("Failed to list financial years")?;
            Ok(report::render_years(&years, year))
        }
        Command::Rules { format } => {
            let repo = open_repository(config).await?;
            let engine = load_engine(&*repo, year).await?;
            let rules = engine.rules();
            match format {
                RulesFormat::Text => Ok(report::render_rules(rules)),
                RulesFormat::Json => to_json(rules),
                RulesFormat::Toml => Ok(RulesFile::to_toml(rules)?),
            }
        }
        Command::Calculate {
            regime,
            amounts,
            json,
        } => {
            let input = read_input(amounts)?;
            let repo = open_repository(config).await?;
            let engine = load_engine(&*repo, year).await?;
            let regime = regime.unwrap_or(input.tax_regime);
            let result = engine.calculate_tax_liability(
                &input.income_details,
                &input.deduction_details,
                regime,
            );
            let calculation = CalculationReport {
                financial_year: year,
                regime,
                deductions: engine.deduction_breakdown(&input.deduction_details, regime),
                slabs: engine.slab_breakdown(regime, result.taxable_income),
                result,
            };
            if *json {
                to_json(&calculation)
            } else {
                Ok(report::render_calculation(&calculation))
            }
        }
        Command::Compare { amounts, json } => {
            let input = read_input(amounts)?;
            let repo = open_repository(config).await?;
            let engine = load_engine(&*repo, year).await?;
            let regimes = engine.compare_regimes(&input.income_details, &input.deduction_details);
            let comparison = ComparisonReport {
                financial_year: year,
                summary: regimes.summary(),
                regimes,
            };
            if *json {
                to_json(&comparison)
            } else {
                Ok(report::render_comparison(&comparison))
            }
        }
        Command::Plan80c { amounts, json } => {
            let input = read_input(amounts)?;
            let repo = open_repository(config).await?;
            let engine = load_engine(&*repo, year).await?;
            let plan = engine
                .plan_section_80c(&input.income_details, &input.deduction_details)
                .with_context(|| {
                    format!(
                        "Section 80C is uncapped for FY {}; there is no limit to plan against",
                        year.label()
                    )
                })?;
            if *json {
                to_json(&plan)
            } else {
                Ok(report::render_plan(&plan))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use itax_core::TaxRuleSet;
    use pretty_assertions::assert_eq;

    use super::*;

    /// Has no rules and cannot list its years either.
    struct BrokenIndex;

    #[async_trait]
    impl TaxRulesRepository for BrokenIndex {
        async fn get_rule_set(
            &self,
            year: FinancialYear,
        ) -> Result<TaxRuleSet, RepositoryError> {
            Err(RepositoryError::NotFound(year))
        }

        async fn list_financial_years(&self) -> Result<Vec<FinancialYear>, RepositoryError> {
            Err(RepositoryError::Database("index is corrupt".to_string()))
        }

        async fn save_rule_set(
            &self,
            _rules: &TaxRuleSet,
        ) -> Result<(), RepositoryError> {
            Ok(())
        }

        async fn delete_rule_set(
            &self,
            _year: FinancialYear,
        ) -> Result<(), RepositoryError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn missing_year_falls_back_when_years_cannot_be_listed() {
        let err = match load_engine(&BrokenIndex, FinancialYear(2025)).await {
            Ok(_) => panic!("expected an error for a missing year"),
            Err(e) => e,
        };

        assert_eq!(
            err.to_string(),
            "No tax rules stored for FY 2025-26; available: none"
        );
    }

    #[test]
    fn registry_knows_both_backends() {
        assert_eq!(build_registry().available_backends(), vec!["memory", "sqlite"]);
    }
}

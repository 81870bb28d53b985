use async_trait::async_trait;
use thiserror::Error;

use crate::models::{FinancialYear, RuleSetError, TaxRuleSet};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error("No rule set for financial year {0}")]
    NotFound(FinancialYear),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid rule set: {0}")]
    InvalidRules(#[from] RuleSetError),
}

/// Storage for per-year rule tables.
///
/// Calculations are never stored; only the tables the engine is built from.
#[async_trait]
pub trait TaxRulesRepository: Send + Sync {
    async fn get_rule_set(
        &self,
        year: FinancialYear,
    ) -> Result<TaxRuleSet, RepositoryError>;

    /// Every stored year, most recent first.
    async fn list_financial_years(&self) -> Result<Vec<FinancialYear>, RepositoryError>;

    /// Validates and stores `rules`, replacing any rule set for the same year.
    async fn save_rule_set(
        &self,
        rules: &TaxRuleSet,
    ) -> Result<(), RepositoryError>;

    async fn delete_rule_set(
        &self,
        year: FinancialYear,
    ) -> Result<(), RepositoryError>;
}

//! Process-local rules repository.
//!
//! The default backend: needs no database and starts with the built-in
//! FY 2024-25 table, so the CLI works out of the box.

use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;
use tracing::debug;

use super::factory::{DbConfig, RepositoryFactory};
use super::repository::{RepositoryError, TaxRulesRepository};
use crate::models::{FinancialYear, TaxRuleSet};

#[derive(Debug, Default)]
pub struct InMemoryRepository {
    rule_sets: RwLock<BTreeMap<FinancialYear, TaxRuleSet>>,
}

impl InMemoryRepository {
    /// Empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Repository holding [`TaxRuleSet::fy_2024_25`].
    pub fn with_builtin() -> Self {
        let rules = TaxRuleSet::fy_2024_25();
        let mut rule_sets = BTreeMap::new();
        rule_sets.insert(rules.financial_year, rules);
        Self {
            rule_sets: RwLock::new(rule_sets),
        }
    }

    fn poisoned() -> RepositoryError {
        RepositoryError::Database("rule set lock poisoned".to_string())
    }
}

#[async_trait]
impl TaxRulesRepository for InMemoryRepository {
    async fn get_rule_set(
        &self,
        year: FinancialYear,
    ) -> Result<TaxRuleSet, RepositoryError> {
        let rule_sets = self.rule_sets.read().map_err(|_| Self::poisoned())?;
        rule_sets
            .get(&year)
            .cloned()
            .ok_or(RepositoryError::NotFound(year))
    }

    async fn list_financial_years(&self) -> Result<Vec<FinancialYear>, RepositoryError> {
        let rule_sets = self.rule_sets.read().map_err(|_| Self::poisoned())?;
        Ok(rule_sets.keys().rev().copied().collect())
    }

    async fn save_rule_set(
        &self,
        rules: &TaxRuleSet,
    ) -> Result<(), RepositoryError> {
        rules.validate()?;
        let mut rule_sets = self.rule_sets.write().map_err(|_| Self::poisoned())?;
        rule_sets.insert(rules.financial_year, rules.clone());
        debug!(financial_year = %rules.financial_year, "stored rule set in memory");
        Ok(())
    }

    async fn delete_rule_set(
        &self,
        year: FinancialYear,
    ) -> Result<(), RepositoryError> {
        let mut rule_sets = self.rule_sets.write().map_err(|_| Self::poisoned())?;
        rule_sets
            .remove(&year)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound(year))
    }
}

/// Factory for the `memory` backend. The connection string is ignored.
pub struct MemoryRepositoryFactory;

#[async_trait]
impl RepositoryFactory for MemoryRepositoryFactory {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn create(
        &self,
        _config: &DbConfig,
    ) -> Result<Box<dyn TaxRulesRepository>, RepositoryError> {
        Ok(Box::new(InMemoryRepository::with_builtin()))
    }
}

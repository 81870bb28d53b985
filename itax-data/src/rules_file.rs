//! Rule sets stored as TOML.
//!
//! A rule-set file is a serialized [`TaxRuleSet`]. Decimal values are written
//! as strings so rates such as `"0.04"` survive exactly:
//!
//! ```toml
//! financial_year = "2024-25"
//! cess_rate = "0.04"
//!
//! [deduction_limits]
//! section_80c = "150000"
//!
//! [[surcharge_tiers]]
//! threshold = "5000000"
//! rate = "0.10"
//!
//! [old_regime]
//! standard_deduction = "50000"
//!
//! [[old_regime.slabs]]
//! min_income = "0"
//! max_income = "250000"
//! rate = "0"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use itax_core::{RuleSetError, TaxRuleSet};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum RulesFileError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid rule set: {0}")]
    Invalid(#[from] RuleSetError),
}

/// Reader and writer for TOML rule-set files.
pub struct RulesFile;

impl RulesFile {
    /// Parses and validates a rule set.
    pub fn parse(text: &str) -> Result<TaxRuleSet, RulesFileError> {
        let rules: TaxRuleSet = toml::from_str(text)?;
        rules.validate()?;
        Ok(rules)
    }

    /// Reads, parses and validates the rule set at `path`.
    pub fn load(path: &Path) -> Result<TaxRuleSet, RulesFileError> {
        let text = fs::read_to_string(path).map_err(|source| RulesFileError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let rules = Self::parse(&text)?;
        info!(path = %path.display(), financial_year = %rules.financial_year, "loaded rule set");
        Ok(rules)
    }

    pub fn to_toml(rules: &TaxRuleSet) -> Result<String, RulesFileError> {
        Ok(toml::to_string(rules)?)
    }
}

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use chrono::{Datelike, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

static FY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:FY\s*)?(\d{4})(?:\s*[-/]\s*(\d{2}|\d{4}))?\s*$")
        .expect("financial year pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FinancialYearParseError {
    #[error("'{0}' is not a financial year (expected e.g. 2024-25)")]
    Malformed(String),

    #[error("'{input}' does not describe consecutive years (expected {start}-{expected:02})")]
    NonConsecutive {
        input: String,
        start: i32,
        expected: i32,
    },
}

/// Indian financial year, 1 April to 31 March.
///
/// The wrapped value is the calendar year the financial year starts in, so
/// `FinancialYear(2024)` is FY 2024-25 (assessment year 2025-26).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FinancialYear(pub i32);

impl FinancialYear {
    pub fn from_date(date: NaiveDate) -> Self {
        let year = date.year();
        if date.month() >= 4 {
            FinancialYear(year)
        } else {
            FinancialYear(year - 1)
        }
    }

    pub fn start_year(&self) -> i32 {
        self.0
    }

    pub fn start_date(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.0, 4, 1)
    }

    pub fn end_date(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.0 + 1, 3, 31)
    }

    /// `"2024-25"` style label.
    pub fn label(&self) -> String {
        format!("{}-{:02}", self.0, (self.0 + 1).rem_euclid(100))
    }

    /// Label of the assessment year in which this year's income is assessed.
    pub fn assessment_year(&self) -> String {
        FinancialYear(self.0 + 1).label()
    }

    pub fn next(&self) -> Self {
        FinancialYear(self.0 + 1)
    }

    pub fn parse(s: &str) -> Result<Self, FinancialYearParseError> {
        let caps = FY_PATTERN
            .captures(s)
            .ok_or_else(|| FinancialYearParseError::Malformed(s.to_string()))?;

        let start: i32 = caps[1]
            .parse()
            .map_err(|_| FinancialYearParseError::Malformed(s.to_string()))?;

        if let Some(end) = caps.get(2) {
            let end_str = end.as_str();
            let end: i32 = end_str
                .parse()
                .map_err(|_| FinancialYearParseError::Malformed(s.to_string()))?;
            let (actual, expected) = if end_str.len() == 4 {
                (end, start + 1)
            } else {
                (end, (start + 1).rem_euclid(100))
            };
            if actual != expected {
                return Err(FinancialYearParseError::NonConsecutive {
                    input: s.to_string(),
                    start,
                    expected: (start + 1).rem_euclid(100),
                });
            }
        }

        Ok(FinancialYear(start))
    }
}

impl fmt::Display for FinancialYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for FinancialYear {
    type Err = FinancialYearParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for FinancialYear {
    type Error = FinancialYearParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<FinancialYear> for String {
    fn from(year: FinancialYear) -> Self {
        year.label()
    }
}

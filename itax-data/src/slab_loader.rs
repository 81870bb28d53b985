use std::io::Read;

use itax_core::{
    FinancialYear, Regime, RepositoryError, RuleSetError, TaxRulesRepository, TaxSlab,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

/// Errors that can occur when loading slab tables.
#[derive(Debug, Error)]
pub enum SlabLoaderError {
    #[error("CSV parse error: {0}")]
    CsvParse(String),

    #[error("Financial year {0} not found in repository (have you loaded its rule set?)")]
    YearNotFound(FinancialYear),

    #[error("Slabs for financial year {year} are invalid: {source}")]
    InvalidSlabs {
        year: FinancialYear,
        source: RuleSetError,
    },

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<csv::Error> for SlabLoaderError {
    fn from(err: csv::Error) -> Self {
        SlabLoaderError::CsvParse(err.to_string())
    }
}

/// A single row of a slab CSV file.
///
/// - `financial_year`: e.g. `2024-25`
/// - `regime`: `old` or `new`
/// - `min_income`: exclusive lower bound of the slab
/// - `max_income`: inclusive upper bound (empty for the open-ended top slab)
/// - `rate`: marginal rate as a decimal (e.g. 0.05 for 5%)
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct SlabRecord {
    pub financial_year: FinancialYear,
    pub regime: Regime,
    pub min_income: Decimal,
    #[serde(deserialize_with = "deserialize_optional_decimal")]
    pub max_income: Option<Decimal>,
    pub rate: Decimal,
}

fn deserialize_optional_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: Option<String> = Option::deserialize(deserializer)?;
    match s {
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => s
            .trim()
            .parse::<Decimal>()
            .map(Some)
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

/// Slab table for one regime of one year, in file order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlabTable {
    pub financial_year: FinancialYear,
    pub regime: Regime,
    pub slabs: Vec<TaxSlab>,
}

/// Loader for slab tables from CSV files.
///
/// Slabs replace the matching regime's table inside a rule set that already
/// exists in the repository; every other rule in that set is left alone.
pub struct SlabLoader;

impl SlabLoader {
    /// Parse slab records from a CSV reader.
    pub fn parse<R: Read>(reader: R) -> Result<Vec<SlabRecord>, SlabLoaderError> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let mut records = Vec::new();

        for result in csv_reader.deserialize() {
            let record: SlabRecord = result?;
            records.push(record);
        }

        Ok(records)
    }

    /// Groups records per (year, regime), keeping first-seen order for the
    /// groups and file order inside each group.
    pub fn group(records: &[SlabRecord]) -> Vec<SlabTable> {
        let mut tables: Vec<SlabTable> = Vec::new();

        for record in records {
            let slab = TaxSlab::new(record.min_income, record.max_income, record.rate);
            match tables
                .iter_mut()
                .find(|t| t.financial_year == record.financial_year && t.regime == record.regime)
            {
                Some(table) => table.slabs.push(slab),
                None => tables.push(SlabTable {
                    financial_year: record.financial_year,
                    regime: record.regime,
                    slabs: vec![slab],
                }),
            }
        }

        tables
    }

    /// Replace slab tables in the repository.
    ///
    /// Each affected year is read, has its regime tables swapped, is
    /// re-validated and saved once. A year missing from the repository or a
    /// table that breaks validation aborts before that year is written.
    ///
    /// Returns the number of slabs loaded.
    pub async fn load<R: TaxRulesRepository + ?Sized>(
        repo: &R,
        records: &[SlabRecord],
    ) -> Result<usize, SlabLoaderError> {
        let tables = Self::group(records);

        let mut years: Vec<FinancialYear> = Vec::new();
        for table in &tables {
            if !years.contains(&table.financial_year) {
                years.push(table.financial_year);
            }
        }

        let mut loaded = 0;
        for year in years {
            let mut rules = repo.get_rule_set(year).await.map_err(|e| match e {
                RepositoryError::NotFound(year) => SlabLoaderError::YearNotFound(year),
                other => SlabLoaderError::Repository(other),
            })?;

            for table in tables.iter().filter(|t| t.financial_year == year) {
                rules.regime_mut(table.regime).slabs = table.slabs.clone();
                loaded += table.slabs.len();
                info!(
                    financial_year = %year,
                    regime = %table.regime,
                    slabs = table.slabs.len(),
                    "replacing slab table"
                );
            }

            rules
                .validate()
                .map_err(|source| SlabLoaderError::InvalidSlabs { year, source })?;
            repo.save_rule_set(&rules).await?;
        }

        Ok(loaded)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;

    const HEADER: &str = "financial_year,regime,min_income,max_income,rate\n";

    #[test]
    fn test_parse_csv_single_slab() {
        let csv = format!("{HEADER}2024-25,old,250000,500000,0.05");

        let records = SlabLoader::parse(csv.as_bytes()).expect("Failed to parse CSV");

        assert_eq!(
            records,
            vec![SlabRecord {
                financial_year: FinancialYear(2024),
                regime: Regime::Old,
                min_income: dec!(250000),
                max_income: Some(dec!(500000)),
                rate: dec!(0.05),
            }]
        );
    }

    #[test]
    fn test_parse_csv_open_top_slab() {
        let csv = format!("{HEADER}2024-25,new,1500000,,0.30");

        let records = SlabLoader::parse(csv.as_bytes()).expect("Failed to parse CSV");

        assert_eq!(records[0].max_income, None);
        assert_eq!(records[0].regime, Regime::New);
    }

    #[test]
    fn test_parse_invalid_regime() {
        let csv = format!("{HEADER}2024-25,flat,0,,0.10");

        let err = SlabLoader::parse(csv.as_bytes()).expect_err("Should fail for unknown regime");

        assert!(matches!(err, SlabLoaderError::CsvParse(_)));
    }

    #[test]
    fn test_parse_invalid_csv_missing_column() {
        let csv = "financial_year,regime,min_income\n2024-25,old,0";

        let err = SlabLoader::parse(csv.as_bytes()).expect_err("Should fail for missing column");
        let SlabLoaderError::CsvParse(msg) = err else {
            panic!("Expected CsvParse error, got: {:?}", err);
        };
        assert!(msg.contains("missing field"), "Expected 'missing field' in error, got: {msg}");
    }

    #[test]
    fn test_parse_empty_csv() {
        let records = SlabLoader::parse(HEADER.as_bytes()).expect("Failed to parse CSV");

        assert!(records.is_empty());
    }

    #[test]
    fn test_group_keeps_file_order() {
        let csv = format!(
            "{HEADER}\
             2024-25,new,0,300000,0\n\
             2024-25,old,0,250000,0\n\
             2024-25,new,300000,,0.05\n\
             2025-26,new,0,,0.05\n"
        );
        let records = SlabLoader::parse(csv.as_bytes()).unwrap();

        let tables = SlabLoader::group(&records);

        assert_eq!(tables.len(), 3);
        assert_eq!((tables[0].financial_year, tables[0].regime), (FinancialYear(2024), Regime::New));
        assert_eq!(tables[0].slabs.len(), 2);
        assert_eq!(tables[0].slabs[1].min_income, dec!(300000));
        assert_eq!((tables[1].financial_year, tables[1].regime), (FinancialYear(2024), Regime::Old));
        assert_eq!(tables[2].financial_year, FinancialYear(2025));
    }
}

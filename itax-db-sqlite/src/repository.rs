use std::path::Path;
use std::str::FromStr;

use async_trait::async_trait;
use itax_core::{
    DeductionLimits, FinancialYear, Rebate, Regime, RegimeRules, RepositoryError, SurchargeTier,
    TaxRuleSet, TaxRulesRepository, TaxSlab,
};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, Sqlite, Transaction};
use tracing::{debug, info};

use crate::decimal::{decimal_to_text, get_decimal, get_optional_decimal};

pub struct SqliteRepository {
    pool: SqlitePool,
}

fn db_error(e: sqlx::Error) -> RepositoryError {
    RepositoryError::Database(e.to_string())
}

impl SqliteRepository {
    /// Connects to `connection_string`, creating the database file if needed.
    ///
    /// Accepts a sqlx URL (`sqlite:itax.db`, `sqlite::memory:`), a bare file
    /// path, or `:memory:`. In-memory databases are held on a single pooled
    /// connection that is never recycled, since each SQLite connection would
    /// otherwise see its own empty database.
    pub async fn new(connection_string: &str) -> Result<Self, RepositoryError> {
        let in_memory = connection_string.contains(":memory:");
        let parsed = if in_memory {
            SqliteConnectOptions::from_str("sqlite::memory:")
        } else if connection_string.starts_with("sqlite:") {
            SqliteConnectOptions::from_str(connection_string)
        } else {
            Ok(SqliteConnectOptions::new().filename(connection_string))
        };
        let options = parsed
            .map_err(|e| RepositoryError::Connection(e.to_string()))?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new()
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| {
                RepositoryError::Connection(format!(
                    "Failed to connect to database '{}': {}",
                    connection_string, e
                ))
            })?;
        debug!(connection_string, "connected to sqlite");
        Ok(Self { pool })
    }

    pub async fn new_with_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn run_migrations(&self) -> Result<(), RepositoryError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| RepositoryError::Database(format!("Failed to run database migrations: {}", e)))?;
        Ok(())
    }

    /// Load and execute all SQL seed files from the specified directory.
    /// Files are executed in alphabetical order by filename.
    pub async fn run_seeds(
        &self,
        seeds_dir: &Path,
    ) -> Result<(), RepositoryError> {
        let mut entries: Vec<_> = std::fs::read_dir(seeds_dir)
            .map_err(|e| {
                RepositoryError::Configuration(format!(
                    "Failed to read seeds directory '{}': {}",
                    seeds_dir.display(),
                    e
                ))
            })?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "sql"))
            .collect();

        entries.sort_by_key(|entry| entry.file_name());

        for entry in entries {
            let path = entry.path();
            let sql = std::fs::read_to_string(&path).map_err(|e| {
                RepositoryError::Configuration(format!(
                    "Failed to read seed file '{}': {}",
                    path.display(),
                    e
                ))
            })?;

            sqlx::raw_sql(&sql).execute(&self.pool).await.map_err(|e| {
                RepositoryError::Database(format!(
                    "Failed to execute seed file '{}': {}",
                    path.display(),
                    e
                ))
            })?;
            info!(seed = %path.display(), "applied seed file");
        }

        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn get_regime_rules(
        &self,
        year: FinancialYear,
        regime: Regime,
    ) -> Result<RegimeRules, RepositoryError> {
        let row = sqlx::query(
            "SELECT standard_deduction, rebate_threshold
             FROM regime_rules WHERE financial_year = ? AND regime = ?",
        )
        .bind(year.start_year())
        .bind(regime.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?
        .ok_or_else(|| {
            RepositoryError::Database(format!(
                "Rule set {} has no {} regime rules",
                year, regime
            ))
        })?;

        let slabs = sqlx::query(
            "SELECT min_income, max_income, rate
             FROM tax_slabs WHERE financial_year = ? AND regime = ?
             ORDER BY position",
        )
        .bind(year.start_year())
        .bind(regime.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?
        .iter()
        .map(row_to_tax_slab)
        .collect::<Result<Vec<_>, _>>()?;

        Ok(RegimeRules {
            standard_deduction: get_decimal(&row, "standard_deduction")?,
            rebate: get_optional_decimal(&row, "rebate_threshold")?
                .map(|income_threshold| Rebate { income_threshold }),
            slabs,
        })
    }
}

fn row_to_tax_slab(row: &SqliteRow) -> Result<TaxSlab, RepositoryError> {
    Ok(TaxSlab::new(
        get_decimal(row, "min_income")?,
        get_optional_decimal(row, "max_income")?,
        get_decimal(row, "rate")?,
    ))
}

fn row_to_surcharge_tier(row: &SqliteRow) -> Result<SurchargeTier, RepositoryError> {
    Ok(SurchargeTier {
        threshold: get_decimal(row, "threshold")?,
        rate: get_decimal(row, "rate")?,
    })
}

fn row_to_deduction_limits(row: &SqliteRow) -> Result<DeductionLimits, RepositoryError> {
    Ok(DeductionLimits {
        section_80c: get_optional_decimal(row, "limit_section_80c")?,
        section_80d: get_optional_decimal(row, "limit_section_80d")?,
        hra: get_optional_decimal(row, "limit_hra")?,
        lta: get_optional_decimal(row, "limit_lta")?,
        nps: get_optional_decimal(row, "limit_nps")?,
        home_loan_interest: get_optional_decimal(row, "limit_home_loan_interest")?,
        other_deductions: get_optional_decimal(row, "limit_other_deductions")?,
    })
}

async fn insert_regime(
    tx: &mut Transaction<'_, Sqlite>,
    year: FinancialYear,
    regime: Regime,
    rules: &RegimeRules,
) -> Result<(), RepositoryError> {
    sqlx::query(
        "INSERT INTO regime_rules (financial_year, regime, standard_deduction, rebate_threshold)
         VALUES (?, ?, ?, ?)",
    )
    .bind(year.start_year())
    .bind(regime.as_str())
    .bind(decimal_to_text(rules.standard_deduction))
    .bind(rules.rebate.as_ref().map(|r| decimal_to_text(r.income_threshold)))
    .execute(&mut **tx)
    .await
    .map_err(db_error)?;

    for (position, slab) in rules.slabs.iter().enumerate() {
        sqlx::query(
            "INSERT INTO tax_slabs (financial_year, regime, position, min_income, max_income, rate)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(year.start_year())
        .bind(regime.as_str())
        .bind(position as i64)
        .bind(decimal_to_text(slab.min_income))
        .bind(slab.max_income.map(decimal_to_text))
        .bind(decimal_to_text(slab.rate))
        .execute(&mut **tx)
        .await
        .map_err(db_error)?;
    }

    Ok(())
}

#[async_trait]
impl TaxRulesRepository for SqliteRepository {
    async fn get_rule_set(
        &self,
        year: FinancialYear,
    ) -> Result<TaxRuleSet, RepositoryError> {
        let row = sqlx::query("SELECT * FROM rule_sets WHERE financial_year = ?")
            .bind(year.start_year())
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?
            .ok_or(RepositoryError::NotFound(year))?;

        let surcharge_tiers = sqlx::query(
            "SELECT threshold, rate FROM surcharge_tiers
             WHERE financial_year = ? ORDER BY position",
        )
        .bind(year.start_year())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?
        .iter()
        .map(row_to_surcharge_tier)
        .collect::<Result<Vec<_>, _>>()?;

        Ok(TaxRuleSet {
            financial_year: year,
            cess_rate: get_decimal(&row, "cess_rate")?,
            deduction_limits: row_to_deduction_limits(&row)?,
            surcharge_tiers,
            old_regime: self.get_regime_rules(year, Regime::Old).await?,
            new_regime: self.get_regime_rules(year, Regime::New).await?,
        })
    }

    async fn list_financial_years(&self) -> Result<Vec<FinancialYear>, RepositoryError> {
        let rows = sqlx::query("SELECT financial_year FROM rule_sets ORDER BY financial_year DESC")
            .fetch_all(&self.pool)
            .await
            .map_err(db_error)?;

        rows.iter()
            .map(|row| {
                row.try_get::<i32, _>("financial_year")
                    .map(FinancialYear)
                    .map_err(db_error)
            })
            .collect()
    }

    async fn save_rule_set(
        &self,
        rules: &TaxRuleSet,
    ) -> Result<(), RepositoryError> {
        rules.validate()?;
        let year = rules.financial_year;
        let limits = &rules.deduction_limits;

        let mut tx = self.pool.begin().await.map_err(db_error)?;

        sqlx::query("DELETE FROM rule_sets WHERE financial_year = ?")
            .bind(year.start_year())
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;

        sqlx::query(
            "INSERT INTO rule_sets (
                financial_year, cess_rate,
                limit_section_80c, limit_section_80d, limit_hra, limit_lta,
                limit_nps, limit_home_loan_interest, limit_other_deductions
             ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(year.start_year())
        .bind(decimal_to_text(rules.cess_rate))
        .bind(limits.section_80c.map(decimal_to_text))
        .bind(limits.section_80d.map(decimal_to_text))
        .bind(limits.hra.map(decimal_to_text))
        .bind(limits.lta.map(decimal_to_text))
        .bind(limits.nps.map(decimal_to_text))
        .bind(limits.home_loan_interest.map(decimal_to_text))
        .bind(limits.other_deductions.map(decimal_to_text))
        .execute(&mut *tx)
        .await
        .map_err(db_error)?;

        for (position, tier) in rules.surcharge_tiers.iter().enumerate() {
            sqlx::query(
                "INSERT INTO surcharge_tiers (financial_year, position, threshold, rate)
                 VALUES (?, ?, ?, ?)",
            )
            .bind(year.start_year())
            .bind(position as i64)
            .bind(decimal_to_text(tier.threshold))
            .bind(decimal_to_text(tier.rate))
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;
        }

        for regime in Regime::ALL {
            insert_regime(&mut tx, year, regime, rules.regime(regime)).await?;
        }

        tx.commit().await.map_err(db_error)?;
        info!(financial_year = %year, "saved rule set");
        Ok(())
    }

    async fn delete_rule_set(
        &self,
        year: FinancialYear,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM rule_sets WHERE financial_year = ?")
            .bind(year.start_year())
            .execute(&self.pool)
            .await
            .map_err(db_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(year));
        }
        Ok(())
    }
}

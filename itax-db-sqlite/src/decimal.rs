//! Decimal columns.
//!
//! Amounts and rates are written as TEXT so they round-trip exactly. Reads
//! also accept INTEGER and REAL so hand-written seed files may use bare
//! numbers.

use std::str::FromStr;

use itax_core::RepositoryError;
use rust_decimal::Decimal;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, TypeInfo, ValueRef};

fn column_error(
    column: &str,
    detail: impl std::fmt::Display,
) -> RepositoryError {
    RepositoryError::Database(format!("Column '{column}' {detail}"))
}

/// Reads `column` as a decimal. `None` for SQL NULL.
pub fn get_optional_decimal(
    row: &SqliteRow,
    column: &str,
) -> Result<Option<Decimal>, RepositoryError> {
    let raw = row
        .try_get_raw(column)
        .map_err(|e| column_error(column, format_args!("not found: {e}")))?;
    if raw.is_null() {
        return Ok(None);
    }
    let storage = raw.type_info().name().to_string();

    let value = match storage.as_str() {
        "TEXT" => {
            let text: String = row
                .try_get(column)
                .map_err(|e| column_error(column, format_args!("unreadable as TEXT: {e}")))?;
            Decimal::from_str(text.trim()).map_err(|e| {
                column_error(column, format_args!("holds '{text}', which is not a decimal: {e}"))
            })?
        }
        "INTEGER" => row
            .try_get::<i64, _>(column)
            .map(Decimal::from)
            .map_err(|e| column_error(column, format_args!("unreadable as INTEGER: {e}")))?,
        "REAL" => {
            let real: f64 = row
                .try_get(column)
                .map_err(|e| column_error(column, format_args!("unreadable as REAL: {e}")))?;
            Decimal::try_from(real)
                .map_err(|e| column_error(column, format_args!("holds {real}: {e}")))?
        }
        other => return Err(column_error(column, format_args!("has unexpected type '{other}'"))),
    };
    Ok(Some(value))
}

/// Reads a NOT NULL decimal column.
pub fn get_decimal(
    row: &SqliteRow,
    column: &str,
) -> Result<Decimal, RepositoryError> {
    get_optional_decimal(row, column)?.ok_or_else(|| column_error(column, "is NULL"))
}

/// Text form used when binding a decimal.
pub fn decimal_to_text(d: Decimal) -> String {
    d.normalize().to_string()
}

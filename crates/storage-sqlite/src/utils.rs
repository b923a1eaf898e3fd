//! Helpers shared by the SQLite repositories.
//!
//! Amounts live in TEXT columns so no precision is lost to REAL storage;
//! these functions convert between the column text and `Decimal`.

use std::str::FromStr;

use log::error;
use rust_decimal::Decimal;

use ledgerly_core::errors::Result;

/// Maximum number of parameters for SQLite IN (...) queries.
///
/// SQLite caps the number of bound parameters per statement (typically 999).
/// Queries that take a caller-supplied id list go through `chunk_for_sqlite`.
pub const SQLITE_MAX_PARAMS_CHUNK: usize = 500;

/// Splits a slice into chunks that fit in one `IN (...)` clause.
pub fn chunk_for_sqlite<T>(items: &[T]) -> impl Iterator<Item = &[T]> {
    items.chunks(SQLITE_MAX_PARAMS_CHUNK)
}

/// Canonical column text for an amount.
pub fn decimal_to_text(value: Decimal) -> String {
    value.to_string()
}

/// Parses an amount column, logging the offending column on failure.
pub fn parse_decimal(value: &str, field_name: &str) -> Result<Decimal> {
    Decimal::from_str(value).map_err(|e| {
        error!("Failed to parse {} '{}': {}", field_name, value, e);
        e.into()
    })
}

pub fn parse_optional_decimal(value: Option<&str>, field_name: &str) -> Result<Option<Decimal>> {
    value.map(|v| parse_decimal(v, field_name)).transpose()
}

/// Sums amount columns loaded from a query.
pub fn sum_decimals(values: &[String], field_name: &str) -> Result<Decimal> {
    values
        .iter()
        .try_fold(Decimal::ZERO, |acc, v| Ok(acc + parse_decimal(v, field_name)?))
}

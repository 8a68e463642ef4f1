//! Repository layer: row-level reads and writes for each table.
//!
//! Every function takes a `&Connection`; a `&Transaction` derefs to one, so
//! callers decide the unit of work. Nothing here opens a transaction.

#![allow(clippy::result_large_err)]

pub mod datasets;
pub mod draft_items;
pub mod tags;
pub mod versions;

use chrono::{DateTime, TimeZone, Utc};
use rusqlite::types::Type;
use rusqlite::Row;
use serde::de::DeserializeOwned;

use crate::errors::column_decode_error;

/// Timestamps are stored as Unix milliseconds
pub(crate) fn to_millis(at: &DateTime<Utc>) -> i64 {
    at.timestamp_millis()
}

pub(crate) fn time_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let ms: i64 = row.get(idx)?;
    Utc.timestamp_millis_opt(ms)
        .single()
        .ok_or(rusqlite::Error::IntegralValueOutOfRange(idx, ms))
}

pub(crate) fn json_column<T: DeserializeOwned>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T> {
    let text: String = row.get(idx)?;
    serde_json::from_str(&text).map_err(|e| column_decode_error(idx, Type::Text, e))
}

pub(crate) fn count_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<u64> {
    let n: i64 = row.get(idx)?;
    u64::try_from(n).map_err(|_| rusqlite::Error::IntegralValueOutOfRange(idx, n))
}

/// Counts and offsets bound as SQLite integers
pub(crate) fn sql_int(n: u64) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

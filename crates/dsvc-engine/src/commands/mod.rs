//! Command orchestration layer.
//!
//! Each public function is one engine operation: it checks the caller's
//! workspace scope, validates input, runs its unit of work against the
//! store and logs exactly one start and one end-or-error event.

#![allow(clippy::result_large_err)]

pub mod commit;
pub mod compare;
pub mod datasets;
pub mod engine_command;
pub mod items;
pub mod resolve;
pub mod restore;
pub mod tags;
pub mod versions;

use dsvc_core::config::PagingConfig;
use dsvc_core::errors::{ExError, VersioningError};
use dsvc_core::model::Dataset;
use dsvc_core::rules::validate_page;
use dsvc_core_types::CallerContext;
use dsvc_store::errors::Result;
use dsvc_store::repo::datasets as dataset_rows;
use rusqlite::Connection;
use std::time::Instant;

/// A 1-based page request; `size` falls back to the configured default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub size: Option<u32>,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            size: None,
        }
    }
}

impl PageRequest {
    pub fn new(page: u32, size: u32) -> Self {
        Self {
            page,
            size: Some(size),
        }
    }

    /// Effective `(page, size)` after defaulting and bounds checks.
    ///
    /// # Errors
    /// `InvalidPage` when the page is 0 or the size is outside `1..=max_page_size`.
    pub fn resolve(&self, paging: &PagingConfig) -> std::result::Result<(u32, u32), VersioningError> {
        let size = self.size.unwrap_or(paging.default_page_size);
        validate_page(self.page, size, paging.max_page_size)?;
        Ok((self.page, size))
    }
}

/// Load a dataset the caller's workspace can see.
///
/// # Errors
/// `NotFound` when the dataset does not exist or belongs to another workspace.
pub(crate) fn require_dataset(
    conn: &Connection,
    ctx: &CallerContext,
    dataset_id: &str,
) -> Result<Dataset> {
    dataset_rows::get_dataset(conn, &ctx.workspace_id, dataset_id)?.ok_or_else(|| {
        VersioningError::DatasetNotFound {
            dataset_id: dataset_id.to_string(),
        }
        .into()
    })
}

/// Attach operation and request context to an error leaving an operation
pub(crate) fn annotate(err: ExError, op: &str, ctx: &CallerContext) -> ExError {
    let err = if err.op().is_none() { err.with_op(op) } else { err };
    err.with_request_id(ctx.request_id.clone())
}

pub(crate) fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}

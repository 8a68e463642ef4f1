//! Identity resolution: reference string → draft or one version.
//!
//! Order is fixed: the draft sentinel, then an exact tag match, then an
//! exact version hash match within the dataset. No prefix or fuzzy matching.

use dsvc_core::errors::VersioningError;
use dsvc_core::model::DatasetVersion;
use dsvc_core::reference::{ResolvedRef, VersionRef};
use dsvc_core::{log_op_end, log_op_error, log_op_start};
use dsvc_core_types::CallerContext;
use dsvc_store::errors::Result;
use dsvc_store::repo::{tags, versions};
use rusqlite::Connection;
use std::time::Instant;

use super::{annotate, elapsed_ms, require_dataset};

/// Resolve a parsed reference within `dataset_id`.
///
/// Does not check workspace scope; callers do that once per operation.
///
/// # Errors
/// - `NotFound`: no tag or version hash matches
/// - `Persistence`: lookup failed
pub fn resolve_reference(
    conn: &Connection,
    dataset_id: &str,
    reference: &VersionRef,
) -> Result<ResolvedRef> {
    let name = match reference {
        VersionRef::Draft => return Ok(ResolvedRef::Draft),
        VersionRef::Named(name) => name,
    };

    let hash = tags::find_tag(conn, dataset_id, name)?;
    let version = match hash {
        Some(hash) => versions::get_version(conn, dataset_id, &hash)?,
        None => versions::get_version(conn, dataset_id, name)?,
    };

    match version {
        Some(version) => {
            tracing::debug!(
                dataset_id = dataset_id,
                reference = name.as_str(),
                version_hash = version.version_hash.as_str(),
                "Resolved version reference"
            );
            Ok(ResolvedRef::Version {
                label: name.clone(),
                version,
            })
        }
        None => Err(VersioningError::ReferenceNotFound {
            dataset_id: dataset_id.to_string(),
            reference: name.clone(),
        }
        .into()),
    }
}

/// Parse and resolve a reference that must name a committed version.
///
/// # Errors
/// - `Validation`: malformed reference, or the draft
/// - `NotFound`: no tag or version hash matches
pub fn resolve_committed(
    conn: &Connection,
    dataset_id: &str,
    reference: &str,
    op: &str,
) -> Result<DatasetVersion> {
    let parsed = VersionRef::parse(Some(reference))?;
    Ok(resolve_reference(conn, dataset_id, &parsed)?.into_version(op)?)
}

/// Fetch a version by tag name or hash.
///
/// # Errors
/// - `NotFound`: unknown dataset (in this workspace), tag or hash
/// - `Validation`: malformed reference or `draft`
pub fn retrieve_version(
    ctx: &CallerContext,
    dataset_id: &str,
    name: &str,
    conn: &Connection,
) -> Result<DatasetVersion> {
    const OP: &str = "retrieve_version";
    let start = Instant::now();
    log_op_start!(OP, dataset_id = dataset_id, reference = name);

    let result = require_dataset(conn, ctx, dataset_id)
        .and_then(|_| resolve_committed(conn, dataset_id, name, OP));

    let duration_ms = elapsed_ms(start);
    match &result {
        Ok(version) => log_op_end!(
            OP,
            duration_ms = duration_ms,
            dataset_id = dataset_id,
            version_hash = version.version_hash.as_str()
        ),
        Err(e) => log_op_error!(OP, *e, duration_ms = duration_ms, dataset_id = dataset_id),
    }
    result.map_err(|e| annotate(e, OP, ctx))
}

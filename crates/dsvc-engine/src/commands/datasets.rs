//! Dataset registry operations.

use chrono::Utc;
use dsvc_core::errors::ExError;
use dsvc_core::model::Dataset;
use dsvc_core::rules::validate_dataset_name;
use dsvc_core::{log_op_end, log_op_error, log_op_start};
use dsvc_core_types::CallerContext;
use dsvc_store::errors::Result;
use dsvc_store::repo::datasets as dataset_rows;
use rusqlite::Connection;
use std::time::Instant;
use uuid::Uuid;

use super::{annotate, elapsed_ms, require_dataset};

/// Register a new dataset in the caller's workspace.
///
/// # Errors
/// - `Validation`: blank or oversized name
/// - `Conflict`: the workspace already has a dataset with this name
pub fn create_dataset(
    ctx: &CallerContext,
    name: &str,
    description: Option<&str>,
    conn: &Connection,
) -> Result<Dataset> {
    const OP: &str = "create_dataset";
    let start = Instant::now();
    log_op_start!(OP, workspace_id = ctx.workspace_id.as_str(), dataset_name = name);

    let result = (|| {
        validate_dataset_name(name)?;
        let dataset = Dataset {
            id: Uuid::now_v7().to_string(),
            workspace_id: ctx.workspace_id.clone(),
            name: name.to_string(),
            description: description.map(str::to_string),
            created_at: Utc::now(),
            created_by: ctx.user_name.clone(),
        };
        dataset_rows::insert_dataset(conn, &dataset)?;
        Ok::<Dataset, ExError>(dataset)
    })();

    let duration_ms = elapsed_ms(start);
    match &result {
        Ok(dataset) => log_op_end!(
            OP,
            duration_ms = duration_ms,
            dataset_id = dataset.id.as_str()
        ),
        Err(e) => log_op_error!(OP, *e, duration_ms = duration_ms, dataset_name = name),
    }
    result.map_err(|e| annotate(e, OP, ctx))
}

/// # Errors
/// `NotFound` when the dataset is unknown in the caller's workspace.
pub fn get_dataset(ctx: &CallerContext, dataset_id: &str, conn: &Connection) -> Result<Dataset> {
    const OP: &str = "get_dataset";
    let start = Instant::now();
    log_op_start!(OP, dataset_id = dataset_id);

    let result = require_dataset(conn, ctx, dataset_id);

    let duration_ms = elapsed_ms(start);
    match &result {
        Ok(_) => log_op_end!(OP, duration_ms = duration_ms, dataset_id = dataset_id),
        Err(e) => log_op_error!(OP, *e, duration_ms = duration_ms, dataset_id = dataset_id),
    }
    result.map_err(|e| annotate(e, OP, ctx))
}

/// Datasets of the caller's workspace, ordered by name.
pub fn list_datasets(ctx: &CallerContext, conn: &Connection) -> Result<Vec<Dataset>> {
    const OP: &str = "list_datasets";
    let start = Instant::now();
    log_op_start!(OP, workspace_id = ctx.workspace_id.as_str());

    let result = dataset_rows::list_datasets(conn, &ctx.workspace_id);

    let duration_ms = elapsed_ms(start);
    match &result {
        Ok(list) => log_op_end!(OP, duration_ms = duration_ms, count = list.len()),
        Err(e) => log_op_error!(OP, *e, duration_ms = duration_ms),
    }
    result.map_err(|e| annotate(e, OP, ctx))
}

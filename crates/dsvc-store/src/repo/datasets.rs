//! Dataset registry rows.

use dsvc_core::errors::{ExError, VersioningError};
use dsvc_core::model::Dataset;
use rusqlite::{Connection, OptionalExtension, Row};

use super::{time_column, to_millis};
use crate::errors::{is_unique_violation, persistence, Result};

const DATASET_COLUMNS: &str = "id, workspace_id, name, description, created_at, created_by";

fn row_to_dataset(row: &Row<'_>) -> rusqlite::Result<Dataset> {
    Ok(Dataset {
        id: row.get(0)?,
        workspace_id: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        created_at: time_column(row, 4)?,
        created_by: row.get(5)?,
    })
}

/// Insert a new dataset.
///
/// # Errors
/// - `Conflict`: the workspace already has a dataset with this name
/// - `Persistence`: SQLite write failed
pub fn insert_dataset(conn: &Connection, dataset: &Dataset) -> Result<()> {
    conn.execute(
        "INSERT INTO datasets (id, workspace_id, name, description, created_at, created_by)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        rusqlite::params![
            dataset.id,
            dataset.workspace_id,
            dataset.name,
            dataset.description,
            to_millis(&dataset.created_at),
            dataset.created_by,
        ],
    )
    .map_err(|e| {
        if is_unique_violation(&e) {
            ExError::from(VersioningError::DatasetNameTaken {
                workspace_id: dataset.workspace_id.clone(),
                name: dataset.name.clone(),
            })
            .with_op("insert_dataset")
        } else {
            persistence("insert_dataset", e)
        }
    })?;

    Ok(())
}

/// Fetch a dataset visible to `workspace_id`.
///
/// A dataset owned by another workspace reads as absent.
pub fn get_dataset(
    conn: &Connection,
    workspace_id: &str,
    dataset_id: &str,
) -> Result<Option<Dataset>> {
    conn.query_row(
        &format!(
            "SELECT {} FROM datasets WHERE id = ?1 AND workspace_id = ?2",
            DATASET_COLUMNS
        ),
        [dataset_id, workspace_id],
        row_to_dataset,
    )
    .optional()
    .map_err(|e| persistence("get_dataset", e))
}

/// All datasets in a workspace, ordered by name.
pub fn list_datasets(conn: &Connection, workspace_id: &str) -> Result<Vec<Dataset>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {} FROM datasets WHERE workspace_id = ?1 ORDER BY name, id",
            DATASET_COLUMNS
        ))
        .map_err(|e| persistence("list_datasets", e))?;

    let datasets = stmt
        .query_map([workspace_id], row_to_dataset)
        .map_err(|e| persistence("list_datasets", e))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| persistence("list_datasets", e))?;

    Ok(datasets)
}

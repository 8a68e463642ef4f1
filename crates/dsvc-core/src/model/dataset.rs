use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A dataset registered in a workspace.
///
/// Owns exactly one draft item collection and any number of committed
/// versions. Every engine operation is scoped by `(workspace_id, id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dataset {
    /// Unique identifier (UUID v7)
    pub id: String,

    /// Workspace that owns this dataset
    pub workspace_id: String,

    /// Human-readable name, unique within the workspace
    pub name: String,

    pub description: Option<String>,

    pub created_at: DateTime<Utc>,

    pub created_by: String,
}

//! Correlation types for request tracking
//!
//! These types carry the caller identity and a request id through every
//! engine operation so that log events and errors can be correlated.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a single request or operation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(String);

impl RequestId {
    /// Generate a new random RequestId using UUIDv7
    pub fn new() -> Self {
        Self(Uuid::now_v7().to_string())
    }

    /// Get the string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Create from an existing string (for deserialization)
    pub fn from_string(s: String) -> Self {
        Self(s)
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Authenticated caller on whose behalf an operation runs.
///
/// Workspace resolution and authentication happen upstream; the engine only
/// trusts what it is handed here. `user_name` becomes `created_by` on
/// commits and tags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerContext {
    pub workspace_id: String,
    pub user_name: String,
    pub request_id: RequestId,
}

impl CallerContext {
    /// Create a context with a fresh RequestId
    pub fn new(workspace_id: impl Into<String>, user_name: impl Into<String>) -> Self {
        Self {
            workspace_id: workspace_id.into(),
            user_name: user_name.into(),
            request_id: RequestId::new(),
        }
    }

    /// Replace the generated RequestId with one propagated from upstream
    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = request_id;
        self
    }
}

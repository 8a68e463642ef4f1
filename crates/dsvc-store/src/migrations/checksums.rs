//! Checksum validation for migrations
//!
//! Applied migrations record the SHA256 of their SQL; an embedded migration
//! whose text no longer matches means the binary and the database disagree
//! about the schema.

use sha2::{Digest, Sha256};

use crate::errors::{checksum_mismatch, Result};

/// Compute SHA256 checksum of a string
pub fn compute_checksum(content: &str) -> String {
    hex::encode(Sha256::digest(content.as_bytes()))
}

/// Compare a recorded checksum against the embedded SQL
pub fn verify_checksum(migration_id: &str, recorded: &str, sql: &str) -> Result<()> {
    let actual = compute_checksum(sql);
    if actual != recorded {
        return Err(checksum_mismatch(migration_id, recorded, &actual));
    }
    Ok(())
}

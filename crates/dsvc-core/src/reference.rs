//! Version references: the tagged variant a caller's reference string is
//! parsed into once, at the boundary of each operation.
//!
//! Resolution against storage (tag first, then version hash) happens in the
//! engine; this module only owns the syntax.

use crate::errors::VersioningError;
use crate::model::{DatasetVersion, DRAFT_REF};

/// Longest reference string accepted (tags are shorter; hashes are UUIDs)
pub const MAX_REFERENCE_LEN: usize = 128;

/// A parsed, not yet resolved, reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionRef {
    /// The live draft collection (`"draft"` or no reference at all)
    Draft,
    /// A tag name or a version hash; which one is decided by resolution
    Named(String),
}

impl VersionRef {
    /// Parse an optional reference, treating absence as the draft.
    ///
    /// # Errors
    /// `InvalidReference` when a present reference is blank, padded with
    /// whitespace, longer than [`MAX_REFERENCE_LEN`] or contains control
    /// characters.
    pub fn parse(reference: Option<&str>) -> Result<Self, VersioningError> {
        let Some(raw) = reference else {
            return Ok(VersionRef::Draft);
        };

        let invalid = |reason: &str| VersioningError::InvalidReference {
            reference: raw.to_string(),
            reason: reason.to_string(),
        };

        if raw.trim().is_empty() {
            return Err(invalid("reference must not be blank"));
        }
        if raw.trim() != raw {
            return Err(invalid("reference must not start or end with whitespace"));
        }
        if raw.chars().count() > MAX_REFERENCE_LEN {
            return Err(invalid("reference is too long"));
        }
        if raw.chars().any(char::is_control) {
            return Err(invalid("reference must not contain control characters"));
        }

        if raw == DRAFT_REF {
            Ok(VersionRef::Draft)
        } else {
            Ok(VersionRef::Named(raw.to_string()))
        }
    }

    /// Label echoed back to callers: the string as given, or `draft`
    pub fn label(&self) -> &str {
        match self {
            VersionRef::Draft => DRAFT_REF,
            VersionRef::Named(name) => name,
        }
    }

    pub fn is_draft(&self) -> bool {
        matches!(self, VersionRef::Draft)
    }
}

/// A reference after resolution against a dataset.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedRef {
    Draft,
    Version {
        /// The reference as the caller wrote it (tag or hash)
        label: String,
        version: DatasetVersion,
    },
}

impl ResolvedRef {
    pub fn label(&self) -> &str {
        match self {
            ResolvedRef::Draft => DRAFT_REF,
            ResolvedRef::Version { label, .. } => label,
        }
    }

    /// Hash of the resolved version, `None` for the draft
    pub fn version_hash(&self) -> Option<&str> {
        match self {
            ResolvedRef::Draft => None,
            ResolvedRef::Version { version, .. } => Some(&version.version_hash),
        }
    }

    /// Consume into the version, failing for the draft.
    ///
    /// # Errors
    /// `DraftNotAllowed` when the reference resolved to the draft.
    pub fn into_version(self, op: &str) -> Result<DatasetVersion, VersioningError> {
        match self {
            ResolvedRef::Draft => Err(VersioningError::DraftNotAllowed { op: op.to_string() }),
            ResolvedRef::Version { version, .. } => Ok(version),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_reference_is_draft() {
        assert_eq!(VersionRef::parse(None).unwrap(), VersionRef::Draft);
    }

    #[test]
    fn test_draft_sentinel_is_draft() {
        let r = VersionRef::parse(Some("draft")).unwrap();
        assert!(r.is_draft());
        assert_eq!(r.label(), "draft");
    }

    #[test]
    fn test_named_reference_keeps_text() {
        let r = VersionRef::parse(Some("latest")).unwrap();
        assert_eq!(r, VersionRef::Named("latest".to_string()));
        assert_eq!(r.label(), "latest");
    }

    #[test]
    fn test_sentinel_match_is_exact() {
        let r = VersionRef::parse(Some("Draft")).unwrap();
        assert_eq!(r, VersionRef::Named("Draft".to_string()));
    }

    #[test]
    fn test_malformed_references_rejected() {
        for bad in ["", "   ", " latest", "latest ", "a\tb"] {
            assert!(
                matches!(
                    VersionRef::parse(Some(bad)),
                    Err(VersioningError::InvalidReference { .. })
                ),
                "expected rejection for {:?}",
                bad
            );
        }
        let long = "h".repeat(MAX_REFERENCE_LEN + 1);
        assert!(VersionRef::parse(Some(&long)).is_err());
    }

    #[test]
    fn test_draft_cannot_become_version() {
        let err = ResolvedRef::Draft.into_version("restore").unwrap_err();
        assert_eq!(
            err,
            VersioningError::DraftNotAllowed {
                op: "restore".to_string()
            }
        );
    }
}

//! Search error types for sift-search.

use std::fmt;

use sift_core::keys::ComponentKey;

/// External store a search depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collaborator {
    Hierarchy,
    Authorization,
    Baseline,
    IssueIndex,
}

impl Collaborator {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hierarchy => "hierarchy store",
            Self::Authorization => "authorization index",
            Self::Baseline => "baseline store",
            Self::IssueIndex => "issue index",
        }
    }
}

impl fmt::Display for Collaborator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors reported by collaborator implementations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backing service could not be reached.
    #[error("unavailable: {0}")]
    Unavailable(String),

    /// The backing service answered with something unusable.
    #[error("backend error: {0}")]
    Backend(String),
}

/// Errors from a search request.
///
/// A user lacking rights on some or all requested projects is not an error:
/// that yields a valid, possibly empty, result.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// Malformed or empty request scope, or contradictory filters.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A requested component key does not exist.
    #[error("component '{key}' not found")]
    NotFound { key: ComponentKey },

    /// An external store failed or timed out. Fatal for the whole request;
    /// the caller may retry.
    #[error("{collaborator} unavailable: {reason}")]
    CollaboratorUnavailable {
        collaborator: Collaborator,
        reason: String,
    },
}

impl SearchError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidArgument(reason.into())
    }

    pub(crate) fn unavailable(collaborator: Collaborator, reason: impl fmt::Display) -> Self {
        Self::CollaboratorUnavailable {
            collaborator,
            reason: reason.to_string(),
        }
    }

    /// Whether retrying the identical request may succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::CollaboratorUnavailable { .. })
    }
}

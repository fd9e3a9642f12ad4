//! Cross-cutting error types for Sift.
//!
//! Errors specific to a pipeline stage (`SearchError`, `StoreError`) live in
//! `sift-search`. The CLI converges everything into `anyhow`.

use thiserror::Error;

/// Errors that can be raised by any Sift crate.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    /// Data failed validation (empty key, malformed value).
    #[error("Validation error: {0}")]
    Validation(String),

    /// A string did not name any variant of an enum.
    #[error("Unknown {kind} '{value}'")]
    UnknownVariant { kind: &'static str, value: String },
}

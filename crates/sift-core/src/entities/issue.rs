use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::{IssueStatus, IssueType, Severity};
use crate::keys::ProjectKey;

/// An issue document as stored in the issue index.
///
/// `project` is always a real project: application copies are resolved away
/// before indexing, so no issue is ever owned by an application.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IssueRecord {
    pub key: String,
    pub project: ProjectKey,
    pub rule: String,
    pub severity: Severity,
    pub issue_type: IssueType,
    pub status: IssueStatus,
    /// Resolution (`FIXED`, `FALSE-POSITIVE`, ...). `None` while unresolved.
    pub resolution: Option<String>,
    pub assignee: Option<String>,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl IssueRecord {
    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        self.resolution.is_some()
    }
}

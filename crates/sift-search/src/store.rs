//! Contracts for the external stores a search runs against.
//!
//! All four are read-only from the pipeline's point of view and are owned by
//! other systems (provisioning, permission administration, analysis,
//! indexing). Implementations must be `Send + Sync` so the engine can fan
//! per-project lookups out across tasks.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sift_core::entities::{ComponentNode, IssueRecord};
use sift_core::keys::{ComponentKey, ProjectKey, UserId};

use crate::error::StoreError;
use crate::query::StructuredQuery;

/// Component hierarchy: kind of each key and, for applications, the linked
/// project copies.
#[async_trait]
pub trait HierarchyStore: Send + Sync {
    /// Resolve every key in one lookup.
    ///
    /// Unknown keys are simply absent from the returned map.
    async fn resolve_hierarchy(
        &self,
        keys: &[ComponentKey],
    ) -> Result<BTreeMap<ComponentKey, ComponentNode>, StoreError>;
}

/// Browse permission facts, maintained per component.
///
/// A fact on an application only says whether the user may address it as a
/// search target. It never implies anything about the linked projects.
#[async_trait]
pub trait AuthorizationIndex: Send + Sync {
    /// Whether `user` holds browse rights on `component`. Absence of a fact
    /// must be reported as `false`.
    async fn is_authorized(&self, user: &UserId, component: &ComponentKey)
    -> Result<bool, StoreError>;
}

/// Leak-period baselines from the latest analysis of each project.
#[async_trait]
pub trait BaselineStore: Send + Sync {
    /// The project's current baseline, or `None` when it was never analyzed or
    /// has no period configured.
    async fn get_baseline(&self, project: &ProjectKey)
    -> Result<Option<DateTime<Utc>>, StoreError>;
}

/// One page of index matches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuePage {
    pub issues: Vec<IssueRecord>,
    /// Total matches across all pages.
    pub total: u64,
}

/// Inverted index of issue documents.
#[async_trait]
pub trait IssueIndex: Send + Sync {
    async fn search(&self, query: &StructuredQuery) -> Result<IssuePage, StoreError>;
}

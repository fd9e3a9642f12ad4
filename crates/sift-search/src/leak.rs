//! Per-project leak windows.
//!
//! Each authorized project gets its own window from its own baseline; there
//! is no shared cutoff across projects. A project without a baseline is
//! excluded from a leak-filtered search: absence of baseline data never means
//! "everything is new".

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sift_core::keys::ProjectKey;

use crate::authz::AuthorizedProjects;
use crate::budget::LookupBudget;
use crate::error::{Collaborator, SearchError};
use crate::store::BaselineStore;

/// Creation-date constraint for one project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "since", rename_all = "snake_case")]
pub enum LeakWindow {
    /// Only issues created at or after the baseline.
    Bounded(DateTime<Utc>),
    /// No creation constraint (leak filtering not requested).
    Unconstrained,
    /// The project contributes no issues.
    Excluded,
}

impl LeakWindow {
    /// Window for a leak-filtered search given the project's baseline.
    #[must_use]
    pub const fn from_baseline(baseline: Option<DateTime<Utc>>) -> Self {
        match baseline {
            Some(since) => Self::Bounded(since),
            None => Self::Excluded,
        }
    }

    #[must_use]
    pub fn admits(&self, created_at: DateTime<Utc>) -> bool {
        match self {
            Self::Bounded(since) => created_at >= *since,
            Self::Unconstrained => true,
            Self::Excluded => false,
        }
    }

    #[must_use]
    pub const fn lower_bound(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Bounded(since) => Some(*since),
            Self::Unconstrained | Self::Excluded => None,
        }
    }

    #[must_use]
    pub const fn is_excluded(&self) -> bool {
        matches!(self, Self::Excluded)
    }
}

/// Window of every authorized project. Keys are exactly the authorized set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeakWindows {
    #[serde(skip)]
    authorized: AuthorizedProjects,
    windows: BTreeMap<ProjectKey, LeakWindow>,
}

impl LeakWindows {
    /// Every authorized project unconstrained.
    #[must_use]
    pub fn unconstrained(authorized: AuthorizedProjects) -> Self {
        let windows = authorized
            .iter()
            .map(|project| (project.clone(), LeakWindow::Unconstrained))
            .collect();
        Self {
            authorized,
            windows,
        }
    }

    /// Leak-filtered windows from looked-up baselines. An authorized project
    /// missing from `baselines` is treated as having none. Entries for
    /// projects outside the authorized set are ignored.
    #[must_use]
    pub fn from_baselines(
        authorized: AuthorizedProjects,
        baselines: &BTreeMap<ProjectKey, Option<DateTime<Utc>>>,
    ) -> Self {
        let windows = authorized
            .iter()
            .map(|project| {
                let baseline = baselines.get(project).copied().flatten();
                (project.clone(), LeakWindow::from_baseline(baseline))
            })
            .collect();
        Self {
            authorized,
            windows,
        }
    }

    #[must_use]
    pub fn get(&self, project: &ProjectKey) -> Option<LeakWindow> {
        self.windows.get(project).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ProjectKey, &LeakWindow)> {
        self.windows.iter()
    }

    #[must_use]
    pub const fn authorized(&self) -> &AuthorizedProjects {
        &self.authorized
    }

    /// Authorized projects that contribute nothing under these windows.
    #[must_use]
    pub fn excluded(&self) -> BTreeSet<ProjectKey> {
        self.windows
            .iter()
            .filter(|(_, window)| window.is_excluded())
            .map(|(project, _)| project.clone())
            .collect()
    }

    pub(crate) fn into_parts(self) -> (AuthorizedProjects, BTreeMap<ProjectKey, LeakWindow>) {
        (self.authorized, self.windows)
    }
}

#[derive(Clone)]
pub struct LeakWindowResolver {
    baselines: Arc<dyn BaselineStore>,
}

impl LeakWindowResolver {
    #[must_use]
    pub fn new(baselines: Arc<dyn BaselineStore>) -> Self {
        Self { baselines }
    }

    /// Look up every authorized project's baseline concurrently.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::CollaboratorUnavailable`] if any lookup fails.
    /// A failed lookup is never treated as a missing baseline.
    pub async fn resolve(
        &self,
        authorized: AuthorizedProjects,
        budget: &LookupBudget,
    ) -> Result<LeakWindows, SearchError> {
        let baselines = budget
            .fan_out(Collaborator::Baseline, authorized.iter().cloned(), |project| {
                let store = Arc::clone(&self.baselines);
                async move { store.get_baseline(&project).await }
            })
            .await?;

        let windows = LeakWindows::from_baselines(authorized, &baselines);
        tracing::debug!(
            projects = windows.windows.len(),
            excluded = windows.excluded().len(),
            "resolved leak windows"
        );
        Ok(windows)
    }
}

//! Per-project browse authorization.
//!
//! [`AuthorizedProjects`] and [`AuthorizationClause`] can only be constructed
//! in this module. Everything downstream (leak windows, the query builder, the
//! index) receives the owner restriction through these types, so no code path
//! can assemble an index query whose owner set was not checked project by
//! project against the requesting user.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Serialize;
use sift_core::keys::{ProjectKey, UserId};

use crate::budget::LookupBudget;
use crate::error::{Collaborator, SearchError};
use crate::store::AuthorizationIndex;

/// Projects the requesting user holds browse rights on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AuthorizedProjects {
    projects: BTreeSet<ProjectKey>,
}

impl AuthorizedProjects {
    #[must_use]
    pub fn contains(&self, project: &ProjectKey) -> bool {
        self.projects.contains(project)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ProjectKey> {
        self.projects.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.projects.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    /// The mandatory owner clause, minus projects that can contribute nothing
    /// (leak-excluded).
    #[must_use]
    pub fn clause_excluding(&self, excluded: &BTreeSet<ProjectKey>) -> AuthorizationClause {
        AuthorizationClause {
            projects: self.projects.difference(excluded).cloned().collect(),
        }
    }

    #[cfg(test)]
    pub(crate) fn for_tests<'a>(keys: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            projects: keys
                .into_iter()
                .map(|key| ProjectKey::new(key).unwrap())
                .collect(),
        }
    }
}

/// `owner ∈ projects`: the conjunct every index query starts with.
///
/// An empty clause matches nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorizationClause {
    projects: BTreeSet<ProjectKey>,
}

impl AuthorizationClause {
    #[must_use]
    pub const fn projects(&self) -> &BTreeSet<ProjectKey> {
        &self.projects
    }

    #[must_use]
    pub fn contains(&self, project: &ProjectKey) -> bool {
        self.projects.contains(project)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }
}

/// Reduces candidate projects to those the user may browse.
///
/// Evaluation is per project and total: a project without a recorded fact is
/// denied. Rights on an application that links a project are never consulted.
#[derive(Clone)]
pub struct AuthorizationFilter {
    index: Arc<dyn AuthorizationIndex>,
}

impl AuthorizationFilter {
    #[must_use]
    pub fn new(index: Arc<dyn AuthorizationIndex>) -> Self {
        Self { index }
    }

    /// Check every candidate concurrently.
    ///
    /// An empty outcome is a valid answer, not an error.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::CollaboratorUnavailable`] if any lookup fails;
    /// a failed lookup is never read as "denied".
    pub async fn filter(
        &self,
        user: &UserId,
        candidates: &BTreeSet<ProjectKey>,
        budget: &LookupBudget,
    ) -> Result<AuthorizedProjects, SearchError> {
        let verdicts = budget
            .fan_out(Collaborator::Authorization, candidates.iter().cloned(), |project| {
                let index = Arc::clone(&self.index);
                let user = user.clone();
                async move { index.is_authorized(&user, project.as_component()).await }
            })
            .await?;

        let projects: BTreeSet<ProjectKey> = verdicts
            .into_iter()
            .filter_map(|(project, allowed)| allowed.then_some(project))
            .collect();

        tracing::debug!(
            user = %user,
            candidates = candidates.len(),
            authorized = projects.len(),
            "filtered projects by browse permission"
        );

        Ok(AuthorizedProjects { projects })
    }
}

//! Expansion of requested component keys into the projects to search.
//!
//! Applications are flattened through their project links in a single
//! hierarchy lookup; there is no parent/child graph to walk. The result is a
//! set, so a project reachable through several requested components is
//! searched once.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Serialize;
use sift_core::entities::ComponentNode;
use sift_core::enums::ComponentKind;
use sift_core::keys::{ComponentKey, ProjectKey, UserId};

use crate::budget::LookupBudget;
use crate::error::{Collaborator, SearchError};
use crate::store::{AuthorizationIndex, HierarchyStore};

/// Flat outcome of component resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResolvedComponents {
    projects: BTreeSet<ProjectKey>,
    applications: BTreeSet<ComponentKey>,
    unaddressable: BTreeSet<ComponentKey>,
}

impl ResolvedComponents {
    /// Candidate projects, not yet checked for browse rights.
    #[must_use]
    pub const fn projects(&self) -> &BTreeSet<ProjectKey> {
        &self.projects
    }

    /// Requested keys that turned out to be applications.
    #[must_use]
    pub const fn applications(&self) -> &BTreeSet<ComponentKey> {
        &self.applications
    }

    /// Applications the user may not address; they contributed no projects.
    #[must_use]
    pub const fn unaddressable(&self) -> &BTreeSet<ComponentKey> {
        &self.unaddressable
    }
}

#[derive(Clone)]
pub struct ComponentResolver {
    hierarchy: Arc<dyn HierarchyStore>,
    authorization: Arc<dyn AuthorizationIndex>,
}

impl ComponentResolver {
    #[must_use]
    pub fn new(
        hierarchy: Arc<dyn HierarchyStore>,
        authorization: Arc<dyn AuthorizationIndex>,
    ) -> Self {
        Self {
            hierarchy,
            authorization,
        }
    }

    /// Expand `keys` into candidate projects.
    ///
    /// An application the user cannot address resolves to nothing. Being able
    /// to address one grants nothing on its members either; those still go
    /// through [`crate::authz::AuthorizationFilter`].
    ///
    /// # Errors
    ///
    /// - [`SearchError::InvalidArgument`] if `keys` is empty.
    /// - [`SearchError::NotFound`] naming the first unknown key, in request order.
    /// - [`SearchError::CollaboratorUnavailable`] if a store lookup fails.
    pub async fn resolve(
        &self,
        user: &UserId,
        keys: &[ComponentKey],
        budget: &LookupBudget,
    ) -> Result<ResolvedComponents, SearchError> {
        if keys.is_empty() {
            return Err(SearchError::invalid(
                "at least one component key is required",
            ));
        }

        let unique: Vec<ComponentKey> = keys
            .iter()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let mut nodes = budget
            .call(
                Collaborator::Hierarchy,
                self.hierarchy.resolve_hierarchy(&unique),
            )
            .await?;

        if let Some(missing) = keys.iter().find(|key| !nodes.contains_key(*key)) {
            return Err(SearchError::NotFound {
                key: missing.clone(),
            });
        }

        // Only requested keys define the scope, whatever else the store returns.
        let requested: Vec<(ComponentKey, ComponentNode)> = unique
            .into_iter()
            .filter_map(|key| nodes.remove(&key).map(|node| (key, node)))
            .collect();

        let applications: BTreeSet<ComponentKey> = requested
            .iter()
            .filter(|(_, node)| node.is_application())
            .map(|(key, _)| key.clone())
            .collect();

        let addressable = budget
            .fan_out(
                Collaborator::Authorization,
                applications.iter().cloned(),
                |application| {
                    let index = Arc::clone(&self.authorization);
                    let user = user.clone();
                    async move { index.is_authorized(&user, &application).await }
                },
            )
            .await?;

        let mut resolved = ResolvedComponents {
            applications,
            ..ResolvedComponents::default()
        };

        for (key, node) in requested {
            match node.kind {
                ComponentKind::Project => {
                    resolved.projects.insert(ProjectKey::from(key));
                }
                ComponentKind::Application => {
                    if addressable.get(&key).copied().unwrap_or(false) {
                        resolved.projects.extend(node.projects);
                    } else {
                        tracing::debug!(
                            application = %key,
                            user = %user,
                            "application not addressable by user; skipping its projects"
                        );
                        resolved.unaddressable.insert(key);
                    }
                }
            }
        }

        tracing::debug!(
            requested = keys.len(),
            applications = resolved.applications.len(),
            projects = resolved.projects.len(),
            "resolved components"
        );

        Ok(resolved)
    }
}

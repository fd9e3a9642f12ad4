//! JSON dataset fixtures for the in-memory collaborators.
//!
//! ```json
//! {
//!   "projects": ["P1", "P2"],
//!   "applications": [
//!     { "key": "APP", "copies": [{ "key": "APP_P1", "project": "P1" }] }
//!   ],
//!   "baselines": { "P1": "2026-10-01T00:00:00Z" },
//!   "permissions": {
//!     "anyone": ["P2"],
//!     "users": { "alice": ["APP", "P1"] },
//!     "groups": { "devs": ["P2"] },
//!     "members": { "alice": ["devs"] }
//!   },
//!   "issues": []
//! }
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use sift_core::entities::IssueRecord;
use sift_core::errors::CoreError;
use sift_core::keys::{ComponentKey, ProjectKey, UserId};

use super::{MemoryCatalog, MemoryIssueIndex, MemoryPermissions};
use crate::engine::{EngineOptions, IssueSearchEngine};
use crate::error::SearchError;

#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("failed to read dataset {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed dataset: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("inconsistent dataset: {0}")]
    Invalid(#[from] CoreError),

    #[error("issue '{issue}' is owned by unknown project '{project}'")]
    UnknownOwner { issue: String, project: ProjectKey },

    #[error("baseline given for unknown project '{project}'")]
    UnknownBaseline { project: ProjectKey },

    #[error("invalid engine options: {0}")]
    Options(#[from] SearchError),
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApplicationFixture {
    pub key: ComponentKey,
    #[serde(default)]
    pub copies: Vec<CopyFixture>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CopyFixture {
    pub key: ComponentKey,
    pub project: ProjectKey,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PermissionFixture {
    pub anyone: BTreeSet<ComponentKey>,
    pub users: BTreeMap<UserId, BTreeSet<ComponentKey>>,
    pub groups: BTreeMap<String, BTreeSet<ComponentKey>>,
    pub members: BTreeMap<UserId, BTreeSet<String>>,
}

/// A complete fixture: hierarchy, baselines, permissions and issues.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MemoryDataset {
    pub projects: Vec<ProjectKey>,
    pub applications: Vec<ApplicationFixture>,
    pub baselines: BTreeMap<ProjectKey, DateTime<Utc>>,
    pub permissions: PermissionFixture,
    pub issues: Vec<IssueRecord>,
}

impl MemoryDataset {
    /// # Errors
    ///
    /// Returns [`DatasetError::Io`] or [`DatasetError::Parse`].
    pub fn from_path(path: &Path) -> Result<Self, DatasetError> {
        let raw = std::fs::read_to_string(path).map_err(|source| DatasetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&raw)
    }

    /// # Errors
    ///
    /// Returns [`DatasetError::Parse`] if `raw` is not a valid dataset.
    pub fn from_json(raw: &str) -> Result<Self, DatasetError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// Populate the in-memory stores.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::Invalid`] for links between unknown or
    /// mis-typed components, [`DatasetError::UnknownOwner`] for issues whose
    /// project is not declared and [`DatasetError::UnknownBaseline`] for
    /// baselines of undeclared projects.
    pub fn into_stores(
        self,
    ) -> Result<(MemoryCatalog, MemoryPermissions, MemoryIssueIndex), DatasetError> {
        let mut catalog = MemoryCatalog::default();
        for project in &self.projects {
            catalog.add_project(project.clone());
        }
        for application in &self.applications {
            catalog.add_application(application.key.clone());
        }
        for application in self.applications {
            for copy in application.copies {
                catalog.link_copy(copy.key, &application.key, &copy.project)?;
            }
        }
        let known: BTreeSet<&ProjectKey> = self.projects.iter().collect();
        for (project, since) in self.baselines {
            if !known.contains(&project) {
                return Err(DatasetError::UnknownBaseline { project });
            }
            catalog.set_baseline(&project, Some(since));
        }

        let mut permissions = MemoryPermissions::default();
        let fixture = self.permissions;
        for component in &fixture.anyone {
            permissions.allow_anyone(component);
        }
        for (user, components) in &fixture.users {
            for component in components {
                permissions.grant_user(user, component);
            }
        }
        for (group, components) in &fixture.groups {
            for component in components {
                permissions.grant_group(group, component);
            }
        }
        for (user, groups) in &fixture.members {
            for group in groups {
                permissions.add_member(user, group);
            }
        }

        let mut index = MemoryIssueIndex::default();
        for issue in self.issues {
            if !known.contains(&issue.project) {
                return Err(DatasetError::UnknownOwner {
                    issue: issue.key,
                    project: issue.project,
                });
            }
            index.insert(issue);
        }

        tracing::debug!(
            projects = known.len(),
            issues = index.len(),
            "loaded in-memory dataset"
        );

        Ok((catalog, permissions, index))
    }

    /// Build an engine over this dataset.
    ///
    /// # Errors
    ///
    /// See [`MemoryDataset::into_stores`]; additionally
    /// [`DatasetError::Options`] if `options` are unusable.
    pub fn into_engine(self, options: EngineOptions) -> Result<IssueSearchEngine, DatasetError> {
        let (catalog, permissions, index) = self.into_stores()?;
        let catalog = Arc::new(catalog);
        Ok(IssueSearchEngine::new(
            catalog.clone(),
            Arc::new(permissions),
            catalog,
            Arc::new(index),
        )
        .with_options(options)?)
    }
}

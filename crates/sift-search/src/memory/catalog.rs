use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sift_core::entities::{ComponentNode, ProjectLink};
use sift_core::enums::ComponentKind;
use sift_core::errors::CoreError;
use sift_core::keys::{ComponentKey, ProjectKey};

use crate::error::StoreError;
use crate::store::{BaselineStore, HierarchyStore};

/// Component hierarchy and baselines.
#[derive(Debug, Clone, Default)]
pub struct MemoryCatalog {
    kinds: BTreeMap<ComponentKey, ComponentKind>,
    links: BTreeMap<ComponentKey, ProjectLink>,
    baselines: BTreeMap<ProjectKey, DateTime<Utc>>,
}

impl MemoryCatalog {
    pub fn add_project(&mut self, key: ProjectKey) -> &mut Self {
        self.kinds.insert(key.into(), ComponentKind::Project);
        self
    }

    pub fn add_application(&mut self, key: ComponentKey) -> &mut Self {
        self.kinds.insert(key, ComponentKind::Application);
        self
    }

    /// Link a copy of `project` into `application`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Validation`] if either end is unknown or of the
    /// wrong kind, or if `copy_key` collides with an existing component.
    pub fn link_copy(
        &mut self,
        copy_key: ComponentKey,
        application: &ComponentKey,
        project: &ProjectKey,
    ) -> Result<&mut Self, CoreError> {
        if self.kinds.get(application) != Some(&ComponentKind::Application) {
            return Err(CoreError::Validation(format!(
                "'{application}' is not a known application"
            )));
        }
        if self.kinds.get(project.as_component()) != Some(&ComponentKind::Project) {
            return Err(CoreError::Validation(format!(
                "'{project}' is not a known project"
            )));
        }
        if self.kinds.contains_key(&copy_key) || self.links.contains_key(&copy_key) {
            return Err(CoreError::Validation(format!(
                "copy key '{copy_key}' is already in use"
            )));
        }

        self.links.insert(
            copy_key.clone(),
            ProjectLink {
                copy_key,
                application: application.clone(),
                project: project.clone(),
            },
        );
        Ok(self)
    }

    /// Set or clear a project's baseline.
    pub fn set_baseline(&mut self, project: &ProjectKey, baseline: Option<DateTime<Utc>>) -> &mut Self {
        match baseline {
            Some(since) => {
                self.baselines.insert(project.clone(), since);
            }
            None => {
                self.baselines.remove(project);
            }
        }
        self
    }

    fn node(&self, key: &ComponentKey) -> Option<ComponentNode> {
        match self.kinds.get(key)? {
            ComponentKind::Project => Some(ComponentNode::project(ProjectKey::from(key.clone()))),
            ComponentKind::Application => {
                let projects = self
                    .links
                    .values()
                    .filter(|link| &link.application == key)
                    .map(|link| link.project.clone());
                Some(ComponentNode::application(key.clone(), projects))
            }
        }
    }
}

#[async_trait]
impl HierarchyStore for MemoryCatalog {
    async fn resolve_hierarchy(
        &self,
        keys: &[ComponentKey],
    ) -> Result<BTreeMap<ComponentKey, ComponentNode>, StoreError> {
        Ok(keys
            .iter()
            .filter_map(|key| self.node(key).map(|node| (key.clone(), node)))
            .collect())
    }
}

#[async_trait]
impl BaselineStore for MemoryCatalog {
    async fn get_baseline(&self, project: &ProjectKey) -> Result<Option<DateTime<Utc>>, StoreError> {
        Ok(self.baselines.get(project).copied())
    }
}

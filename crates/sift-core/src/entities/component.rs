use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::enums::ComponentKind;
use crate::keys::{ComponentKey, ProjectKey};

/// Membership record binding a real project to an application.
///
/// The copy has its own key (`copy_key`) distinct from both ends; several
/// applications may hold copies of the same project.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProjectLink {
    pub copy_key: ComponentKey,
    pub application: ComponentKey,
    pub project: ProjectKey,
}

/// A component as seen by the hierarchy store at query time.
///
/// `projects` is the flat set of real projects the component stands for: the
/// project itself for [`ComponentKind::Project`], the linked copies for
/// [`ComponentKind::Application`] (possibly empty).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ComponentNode {
    pub key: ComponentKey,
    pub kind: ComponentKind,
    pub projects: BTreeSet<ProjectKey>,
}

impl ComponentNode {
    /// A project node, which resolves to itself.
    #[must_use]
    pub fn project(key: ProjectKey) -> Self {
        Self {
            key: key.as_component().clone(),
            kind: ComponentKind::Project,
            projects: BTreeSet::from([key]),
        }
    }

    /// An application node resolving to its linked projects.
    #[must_use]
    pub fn application(key: ComponentKey, projects: impl IntoIterator<Item = ProjectKey>) -> Self {
        Self {
            key,
            kind: ComponentKind::Application,
            projects: projects.into_iter().collect(),
        }
    }

    #[must_use]
    pub fn is_application(&self) -> bool {
        self.kind == ComponentKind::Application
    }
}

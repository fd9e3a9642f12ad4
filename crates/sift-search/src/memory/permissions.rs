use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use sift_core::keys::{ComponentKey, UserId};

use crate::error::StoreError;
use crate::store::AuthorizationIndex;

/// Browse permission facts.
///
/// A user is authorized on a component when it is public ("anyone"), when the
/// user holds a direct grant, or when one of the user's groups does.
#[derive(Debug, Clone, Default)]
pub struct MemoryPermissions {
    anyone: BTreeSet<ComponentKey>,
    users: BTreeMap<UserId, BTreeSet<ComponentKey>>,
    groups: BTreeMap<String, BTreeSet<ComponentKey>>,
    members: BTreeMap<UserId, BTreeSet<String>>,
}

impl MemoryPermissions {
    pub fn allow_anyone(&mut self, component: &ComponentKey) -> &mut Self {
        self.anyone.insert(component.clone());
        self
    }

    pub fn grant_user(&mut self, user: &UserId, component: &ComponentKey) -> &mut Self {
        self.users
            .entry(user.clone())
            .or_default()
            .insert(component.clone());
        self
    }

    pub fn grant_group(&mut self, group: &str, component: &ComponentKey) -> &mut Self {
        self.groups
            .entry(group.to_string())
            .or_default()
            .insert(component.clone());
        self
    }

    pub fn add_member(&mut self, user: &UserId, group: &str) -> &mut Self {
        self.members
            .entry(user.clone())
            .or_default()
            .insert(group.to_string());
        self
    }

    fn allows(&self, user: &UserId, component: &ComponentKey) -> bool {
        if self.anyone.contains(component) {
            return true;
        }
        if self
            .users
            .get(user)
            .is_some_and(|granted| granted.contains(component))
        {
            return true;
        }
        self.members.get(user).is_some_and(|groups| {
            groups.iter().any(|group| {
                self.groups
                    .get(group)
                    .is_some_and(|granted| granted.contains(component))
            })
        })
    }
}

#[async_trait]
impl AuthorizationIndex for MemoryPermissions {
    async fn is_authorized(
        &self,
        user: &UserId,
        component: &ComponentKey,
    ) -> Result<bool, StoreError> {
        Ok(self.allows(user, component))
    }
}

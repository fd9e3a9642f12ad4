//! Validated identifiers for components, projects, and users.
//!
//! Keys are opaque strings unique within an organization namespace. They are
//! never empty: every constructor trims nothing but rejects blank input, so a
//! key that exists in memory is always addressable.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

fn validate(kind: &str, value: String) -> Result<String, CoreError> {
    if value.trim().is_empty() {
        return Err(CoreError::Validation(format!("{kind} cannot be empty")));
    }
    Ok(value)
}

// ---------------------------------------------------------------------------
// ComponentKey
// ---------------------------------------------------------------------------

/// Key of a project or an application.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ComponentKey(String);

impl ComponentKey {
    /// Build a key, rejecting empty or whitespace-only input.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Validation`] if `key` is blank.
    pub fn new(key: impl Into<String>) -> Result<Self, CoreError> {
        validate("component key", key.into()).map(Self)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ComponentKey {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for ComponentKey {
    type Error = CoreError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ComponentKey> for String {
    fn from(key: ComponentKey) -> Self {
        key.0
    }
}

impl Borrow<str> for ComponentKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ComponentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// ProjectKey
// ---------------------------------------------------------------------------

/// Key of a component known to be a real project (never an application).
///
/// Issues are only ever owned by projects, so the issue index, the baseline
/// store, and per-project authorization all speak in `ProjectKey`s.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectKey(ComponentKey);

impl ProjectKey {
    /// Build a project key, rejecting empty or whitespace-only input.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Validation`] if `key` is blank.
    pub fn new(key: impl Into<String>) -> Result<Self, CoreError> {
        ComponentKey::new(key).map(Self)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// View this project as a generic component key.
    #[must_use]
    pub const fn as_component(&self) -> &ComponentKey {
        &self.0
    }
}

impl From<ComponentKey> for ProjectKey {
    fn from(key: ComponentKey) -> Self {
        Self(key)
    }
}

impl From<ProjectKey> for ComponentKey {
    fn from(key: ProjectKey) -> Self {
        key.0
    }
}

impl TryFrom<&str> for ProjectKey {
    type Error = CoreError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl Borrow<str> for ProjectKey {
    fn borrow(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for ProjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

// ---------------------------------------------------------------------------
// UserId
// ---------------------------------------------------------------------------

/// Identity of the user a search runs on behalf of.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

impl UserId {
    /// Build a user id, rejecting empty or whitespace-only input.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Validation`] if `id` is blank.
    pub fn new(id: impl Into<String>) -> Result<Self, CoreError> {
        validate("user id", id.into()).map(Self)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for UserId {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<UserId> for String {
    fn from(id: UserId) -> Self {
        id.0
    }
}

impl Borrow<str> for UserId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

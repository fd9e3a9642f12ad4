//! Caller-facing search parameters.
//!
//! A request names the components to scope the search to, whether to restrict
//! to each project's leak period, and the ordinary attribute filters, paging,
//! and sort. Nothing here can name a project directly: ownership is always
//! derived by the pipeline from `component_keys`.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sift_core::entities::IssueRecord;
use sift_core::enums::{IssueStatus, IssueType, Severity, SortField, SortOrder};
use sift_core::keys::ComponentKey;

use crate::error::SearchError;

/// A search request as parsed by the request handler.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Projects and/or applications to search. Must not be empty.
    pub component_keys: Vec<ComponentKey>,
    /// Restrict every project to issues created since its own baseline.
    #[serde(default)]
    pub since_leak_period: bool,
    #[serde(default)]
    pub filters: IssueFilters,
    /// 1-based page number. Defaults to 1.
    #[serde(default)]
    pub page: Option<u32>,
    /// Defaults to `search.default_page_size`.
    #[serde(default)]
    pub page_size: Option<u32>,
    #[serde(default)]
    pub sort: Sort,
}

impl SearchRequest {
    #[must_use]
    pub fn for_components(keys: impl IntoIterator<Item = ComponentKey>) -> Self {
        Self {
            component_keys: keys.into_iter().collect(),
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn since_leak_period(mut self, enabled: bool) -> Self {
        self.since_leak_period = enabled;
        self
    }

    #[must_use]
    pub fn with_filters(mut self, filters: IssueFilters) -> Self {
        self.filters = filters;
        self
    }

    #[must_use]
    pub const fn with_page(mut self, page: u32, page_size: u32) -> Self {
        self.page = Some(page);
        self.page_size = Some(page_size);
        self
    }

    #[must_use]
    pub const fn sorted_by(mut self, field: SortField, order: SortOrder) -> Self {
        self.sort = Sort { field, order };
        self
    }
}

// ---------------------------------------------------------------------------
// Filters
// ---------------------------------------------------------------------------

fn in_set<T: Ord>(set: &BTreeSet<T>, value: &T) -> bool {
    set.is_empty() || set.contains(value)
}

/// Attribute filters ANDed with the pipeline's mandatory clauses.
///
/// Empty sets mean "no constraint on this attribute".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueFilters {
    #[serde(default)]
    pub severities: BTreeSet<Severity>,
    #[serde(default)]
    pub types: BTreeSet<IssueType>,
    #[serde(default)]
    pub statuses: BTreeSet<IssueStatus>,
    #[serde(default)]
    pub rules: BTreeSet<String>,
    #[serde(default)]
    pub assignees: BTreeSet<String>,
    /// `Some(true)` keeps only resolved issues, `Some(false)` only unresolved.
    #[serde(default)]
    pub resolved: Option<bool>,
    /// Inclusive lower bound on creation date.
    #[serde(default)]
    pub created_after: Option<DateTime<Utc>>,
    /// Exclusive upper bound on creation date.
    #[serde(default)]
    pub created_before: Option<DateTime<Utc>>,
}

impl IssueFilters {
    /// Check the filters against each other and against the leak flag.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::InvalidArgument`] when `created_after` is combined
    /// with leak-period filtering (both define the lower creation bound), or
    /// when the creation range is empty.
    pub fn validate(&self, since_leak_period: bool) -> Result<(), SearchError> {
        if since_leak_period && self.created_after.is_some() {
            return Err(SearchError::invalid(
                "created_after and since_leak_period cannot be set simultaneously",
            ));
        }
        if let (Some(after), Some(before)) = (self.created_after, self.created_before) {
            if after >= before {
                return Err(SearchError::invalid(format!(
                    "created_after ({after}) must be earlier than created_before ({before})"
                )));
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Whether `issue` satisfies every attribute filter.
    #[must_use]
    pub fn matches(&self, issue: &IssueRecord) -> bool {
        in_set(&self.severities, &issue.severity)
            && in_set(&self.types, &issue.issue_type)
            && in_set(&self.statuses, &issue.status)
            && (self.rules.is_empty() || self.rules.contains(&issue.rule))
            && (self.assignees.is_empty()
                || issue
                    .assignee
                    .as_ref()
                    .is_some_and(|assignee| self.assignees.contains(assignee)))
            && self
                .resolved
                .is_none_or(|resolved| resolved == issue.is_resolved())
            && self
                .created_after
                .is_none_or(|after| issue.created_at >= after)
            && self
                .created_before
                .is_none_or(|before| issue.created_at < before)
    }
}

// ---------------------------------------------------------------------------
// Paging and sort
// ---------------------------------------------------------------------------

/// Validated page window passed through to the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paging {
    pub page: u32,
    pub page_size: u32,
}

impl Paging {
    /// Resolve requested paging against configured defaults.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::InvalidArgument`] for page 0, page size 0, or a
    /// page size above `max_page_size`.
    pub fn resolve(
        page: Option<u32>,
        page_size: Option<u32>,
        default_page_size: u32,
        max_page_size: u32,
    ) -> Result<Self, SearchError> {
        let page = page.unwrap_or(1);
        let page_size = page_size.unwrap_or(default_page_size);

        if page == 0 {
            return Err(SearchError::invalid("page must be at least 1"));
        }
        if page_size == 0 || page_size > max_page_size {
            return Err(SearchError::invalid(format!(
                "page_size must be between 1 and {max_page_size}, got {page_size}"
            )));
        }
        Ok(Self { page, page_size })
    }

    /// Number of matches preceding this page.
    #[must_use]
    pub fn offset(&self) -> usize {
        (self.page as usize)
            .saturating_sub(1)
            .saturating_mul(self.page_size as usize)
    }
}

/// Result ordering. The issue key is always the final tiebreaker so equal
/// requests produce identical pages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sort {
    #[serde(default)]
    pub field: SortField,
    #[serde(default)]
    pub order: SortOrder,
}

impl Sort {
    #[must_use]
    pub fn compare(&self, a: &IssueRecord, b: &IssueRecord) -> Ordering {
        let primary = match self.field {
            SortField::CreationDate => a.created_at.cmp(&b.created_at),
            SortField::UpdateDate => a.updated_at.cmp(&b.updated_at),
            SortField::Severity => a.severity.cmp(&b.severity),
            SortField::Key => Ordering::Equal,
        };
        let ordering = primary.then_with(|| a.key.cmp(&b.key));
        match self.order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    }
}

//! Structured query against the issue index.
//!
//! A [`StructuredQuery`] is only produced by [`QueryBuilder::build`] from
//! [`LeakWindows`], which in turn only exist on top of
//! [`crate::authz::AuthorizedProjects`]. Its semantics:
//!
//! ```text
//! owner ∈ authorized \ excluded
//!   AND (owner = p AND created_at >= bound(p))   for each bounded p, OR'd
//!   AND caller filters
//! ```
//!
//! [`StructuredQuery::matches`] evaluates that predicate directly;
//! [`StructuredQuery::to_index_dsl`] renders it as a boolean query document
//! for a remote inverted index.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{Value, json};
use sift_core::entities::IssueRecord;
use sift_core::enums::SortField;
use sift_core::keys::ProjectKey;

use crate::authz::AuthorizationClause;
use crate::leak::{LeakWindow, LeakWindows};
use crate::request::{IssueFilters, Paging, Sort};

/// Index field names used in rendered queries.
mod field {
    pub const PROJECT: &str = "project";
    pub const CREATED_AT: &str = "created_at";
    pub const UPDATED_AT: &str = "updated_at";
    pub const SEVERITY: &str = "severity";
    pub const TYPE: &str = "issue_type";
    pub const STATUS: &str = "status";
    pub const RULE: &str = "rule";
    pub const ASSIGNEE: &str = "assignee";
    pub const RESOLUTION: &str = "resolution";
    pub const KEY: &str = "key";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StructuredQuery {
    authorization: AuthorizationClause,
    lower_bounds: BTreeMap<ProjectKey, DateTime<Utc>>,
    filters: IssueFilters,
    paging: Paging,
    sort: Sort,
}

impl StructuredQuery {
    /// Mandatory owner restriction.
    #[must_use]
    pub const fn authorization(&self) -> &AuthorizationClause {
        &self.authorization
    }

    /// Per-project inclusive creation lower bounds. Projects in the
    /// authorization clause without an entry are unconstrained.
    #[must_use]
    pub const fn lower_bounds(&self) -> &BTreeMap<ProjectKey, DateTime<Utc>> {
        &self.lower_bounds
    }

    #[must_use]
    pub const fn filters(&self) -> &IssueFilters {
        &self.filters
    }

    #[must_use]
    pub const fn paging(&self) -> Paging {
        self.paging
    }

    #[must_use]
    pub const fn sort(&self) -> Sort {
        self.sort
    }

    /// Whether the query can match anything at all.
    #[must_use]
    pub fn is_unsatisfiable(&self) -> bool {
        self.authorization.is_empty()
    }

    /// Evaluate the query against one document.
    #[must_use]
    pub fn matches(&self, issue: &IssueRecord) -> bool {
        self.authorization.contains(&issue.project)
            && self
                .lower_bounds
                .get(&issue.project)
                .map_or(LeakWindow::Unconstrained, |since| LeakWindow::Bounded(*since))
                .admits(issue.created_at)
            && self.filters.matches(issue)
    }

    /// Render as an Elasticsearch-style `bool` query with paging and sort.
    ///
    /// The owner `terms` clause is always the first `filter` entry.
    #[must_use]
    pub fn to_index_dsl(&self) -> Value {
        let mut filter = vec![json!({
            "terms": { (field::PROJECT): self.authorization.projects() }
        })];

        if !self.lower_bounds.is_empty() {
            filter.push(self.leak_clause());
        }
        filter.extend(self.filter_clauses());

        let order = self.sort.order.as_str();
        let mut sort = Vec::new();
        if let Some(name) = sort_field_name(self.sort.field) {
            sort.push(json!({ name: { "order": order } }));
        }
        sort.push(json!({ (field::KEY): { "order": order } }));

        json!({
            "query": { "bool": { "filter": filter } },
            "from": self.paging.offset(),
            "size": self.paging.page_size,
            "sort": sort,
        })
    }

    fn leak_clause(&self) -> Value {
        let mut should: Vec<Value> = self
            .lower_bounds
            .iter()
            .map(|(project, since)| {
                json!({
                    "bool": {
                        "filter": [
                            { "term": { (field::PROJECT): project } },
                            { "range": { (field::CREATED_AT): { "gte": timestamp(*since) } } },
                        ]
                    }
                })
            })
            .collect();

        let unbounded: Vec<&ProjectKey> = self
            .authorization
            .projects()
            .iter()
            .filter(|project| !self.lower_bounds.contains_key(*project))
            .collect();
        if !unbounded.is_empty() {
            should.push(json!({ "terms": { (field::PROJECT): unbounded } }));
        }

        json!({ "bool": { "should": should, "minimum_should_match": 1 } })
    }

    fn filter_clauses(&self) -> Vec<Value> {
        let filters = &self.filters;
        let mut clauses = Vec::new();

        let mut terms = |name: &str, values: Vec<String>| {
            if !values.is_empty() {
                clauses.push(json!({ "terms": { name: values } }));
            }
        };
        terms(field::SEVERITY, as_terms(&filters.severities));
        terms(field::TYPE, as_terms(&filters.types));
        terms(field::STATUS, as_terms(&filters.statuses));
        terms(field::RULE, filters.rules.iter().cloned().collect());
        terms(field::ASSIGNEE, filters.assignees.iter().cloned().collect());

        match filters.resolved {
            Some(true) => clauses.push(json!({ "exists": { "field": field::RESOLUTION } })),
            Some(false) => clauses.push(json!({
                "bool": { "must_not": { "exists": { "field": field::RESOLUTION } } }
            })),
            None => {}
        }

        let mut range = serde_json::Map::new();
        if let Some(after) = filters.created_after {
            range.insert("gte".to_string(), Value::String(timestamp(after)));
        }
        if let Some(before) = filters.created_before {
            range.insert("lt".to_string(), Value::String(timestamp(before)));
        }
        if !range.is_empty() {
            clauses.push(json!({ "range": { (field::CREATED_AT): range } }));
        }

        clauses
    }
}

fn as_terms<T: ToString>(values: &BTreeSet<T>) -> Vec<String> {
    values.iter().map(ToString::to_string).collect()
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

const fn sort_field_name(sort: SortField) -> Option<&'static str> {
    match sort {
        SortField::CreationDate => Some(field::CREATED_AT),
        SortField::UpdateDate => Some(field::UPDATED_AT),
        SortField::Severity => Some(field::SEVERITY),
        SortField::Key => None,
    }
}

/// Query plus diagnostics from building it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuiltQuery {
    pub query: StructuredQuery,
    /// Authorized projects that can contribute nothing because of their leak
    /// window. Diagnostic only.
    pub leak_excluded: usize,
}

/// Composes the final index query.
pub struct QueryBuilder;

impl QueryBuilder {
    /// Excluded projects are left out of the owner clause entirely, so they
    /// cannot match regardless of `filters`.
    #[must_use]
    pub fn build(windows: LeakWindows, filters: IssueFilters, paging: Paging, sort: Sort) -> BuiltQuery {
        let excluded = windows.excluded();
        let (authorized, windows) = windows.into_parts();

        let lower_bounds = windows
            .into_iter()
            .filter_map(|(project, window)| match window {
                LeakWindow::Bounded(since) => Some((project, since)),
                LeakWindow::Unconstrained | LeakWindow::Excluded => None,
            })
            .collect();

        let query = StructuredQuery {
            authorization: authorized.clause_excluding(&excluded),
            lower_bounds,
            filters,
            paging,
            sort,
        };

        tracing::debug!(
            owners = query.authorization.projects().len(),
            bounded = query.lower_bounds.len(),
            leak_excluded = excluded.len(),
            "built index query"
        );

        BuiltQuery {
            query,
            leak_excluded: excluded.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeDelta, TimeZone};
    use pretty_assertions::assert_eq;
    use sift_core::enums::{IssueStatus, IssueType, Severity, SortOrder};

    use super::*;
    use crate::authz::AuthorizedProjects;

    fn pk(key: &str) -> ProjectKey {
        ProjectKey::new(key).unwrap()
    }

    fn paging() -> Paging {
        Paging {
            page: 1,
            page_size: 100,
        }
    }

    fn issue(key: &str, project: &str, created_at: DateTime<Utc>) -> IssueRecord {
        IssueRecord {
            key: key.to_string(),
            project: pk(project),
            rule: "rust:S100".to_string(),
            severity: Severity::Major,
            issue_type: IssueType::CodeSmell,
            status: IssueStatus::Open,
            resolution: None,
            assignee: None,
            message: String::new(),
            created_at,
            updated_at: created_at,
        }
    }

    #[test]
    fn excluded_projects_leave_the_owner_clause() {
        let now = Utc::now();
        let windows = LeakWindows::from_baselines(
            AuthorizedProjects::for_tests(["P1", "P2"]),
            &BTreeMap::from([(pk("P1"), Some(now))]),
        );

        let built = QueryBuilder::build(windows, IssueFilters::default(), paging(), Sort::default());

        assert_eq!(built.leak_excluded, 1);
        assert_eq!(built.query.authorization().projects(), &BTreeSet::from([pk("P1")]));
        assert!(!built.query.matches(&issue("X", "P2", now + TimeDelta::days(1))));
    }

    #[test]
    fn lower_bounds_apply_per_project() {
        let now = Utc::now();
        let windows = LeakWindows::from_baselines(
            AuthorizedProjects::for_tests(["P1", "P2"]),
            &BTreeMap::from([
                (pk("P1"), Some(now - TimeDelta::days(14))),
                (pk("P2"), Some(now - TimeDelta::days(25))),
            ]),
        );
        let query = QueryBuilder::build(windows, IssueFilters::default(), paging(), Sort::default()).query;

        // 20 days old: outside P1's window, inside P2's.
        let twenty_days = now - TimeDelta::days(20);
        assert!(!query.matches(&issue("A", "P1", twenty_days)));
        assert!(query.matches(&issue("B", "P2", twenty_days)));
    }

    #[test]
    fn matching_agrees_with_the_leak_window_at_the_boundary() {
        let since = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let windows = LeakWindows::from_baselines(
            AuthorizedProjects::for_tests(["P1"]),
            &BTreeMap::from([(pk("P1"), Some(since))]),
        );
        let window = windows.get(&pk("P1")).unwrap();
        let query = QueryBuilder::build(windows, IssueFilters::default(), paging(), Sort::default()).query;

        for created_at in [since - TimeDelta::seconds(1), since, since + TimeDelta::seconds(1)] {
            assert_eq!(
                query.matches(&issue("A", "P1", created_at)),
                window.admits(created_at),
                "created_at = {created_at}"
            );
        }
        assert!(query.matches(&issue("A", "P1", since)));
    }

    #[test]
    fn filters_cannot_reach_unauthorized_owners() {
        let windows = LeakWindows::unconstrained(AuthorizedProjects::for_tests(["P1"]));
        let query = QueryBuilder::build(windows, IssueFilters::default(), paging(), Sort::default()).query;

        assert!(query.matches(&issue("A", "P1", Utc::now())));
        assert!(!query.matches(&issue("B", "P9", Utc::now())));
    }

    #[test]
    fn empty_authorization_is_unsatisfiable() {
        let windows = LeakWindows::unconstrained(AuthorizedProjects::default());
        let query = QueryBuilder::build(windows, IssueFilters::default(), paging(), Sort::default()).query;
        assert!(query.is_unsatisfiable());
    }

    #[test]
    fn renders_owner_clause_first_and_leak_clause_second() {
        let since = Utc.with_ymd_and_hms(2026, 10, 5, 0, 0, 0).unwrap();
        let windows = LeakWindows::from_baselines(
            AuthorizedProjects::for_tests(["P1", "P2"]),
            &BTreeMap::from([(pk("P1"), Some(since))]),
        );
        let filters = IssueFilters {
            severities: BTreeSet::from([Severity::Blocker]),
            resolved: Some(false),
            ..IssueFilters::default()
        };
        let sort = Sort {
            field: SortField::Severity,
            order: SortOrder::Desc,
        };
        let query = QueryBuilder::build(
            windows,
            filters,
            Paging {
                page: 2,
                page_size: 10,
            },
            sort,
        )
        .query;

        assert_eq!(
            query.to_index_dsl(),
            json!({
                "query": { "bool": { "filter": [
                    { "terms": { "project": ["P1"] } },
                    { "bool": {
                        "should": [
                            { "bool": { "filter": [
                                { "term": { "project": "P1" } },
                                { "range": { "created_at": { "gte": "2026-10-05T00:00:00.000Z" } } },
                            ] } },
                        ],
                        "minimum_should_match": 1,
                    } },
                    { "terms": { "severity": ["BLOCKER"] } },
                    { "bool": { "must_not": { "exists": { "field": "resolution" } } } },
                ] } },
                "from": 10,
                "size": 10,
                "sort": [
                    { "severity": { "order": "desc" } },
                    { "key": { "order": "desc" } },
                ],
            })
        );
    }

    #[test]
    fn unconstrained_query_has_no_leak_clause() {
        let windows = LeakWindows::unconstrained(AuthorizedProjects::for_tests(["P1", "P2"]));
        let dsl = QueryBuilder::build(windows, IssueFilters::default(), paging(), Sort::default())
            .query
            .to_index_dsl();

        let filter = dsl["query"]["bool"]["filter"].as_array().unwrap();
        assert_eq!(filter.len(), 1);
        assert_eq!(filter[0], json!({ "terms": { "project": ["P1", "P2"] } }));
    }
}

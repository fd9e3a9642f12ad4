//! Shared fixture for the search integration tests.
//!
//! Layout:
//! - `APP` links copies of `P1` and `P2`.
//! - `P1` baseline now-14d, issues at now-10d and now-20d.
//! - `P2` baseline now-25d, issues at now-15d and now-30d.
//! - `P3` is not linked anywhere and has one issue.
//! - `alice` may address `APP` and browse `P1`, `P2`, `P3`.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use sift_core::entities::IssueRecord;
use sift_core::enums::{IssueStatus, IssueType, Severity};
use sift_core::keys::{ComponentKey, ProjectKey, UserId};
use sift_search::IssueSearchEngine;
use sift_search::memory::{MemoryCatalog, MemoryIssueIndex, MemoryPermissions};

pub fn ck(key: &str) -> ComponentKey {
    ComponentKey::new(key).unwrap()
}

pub fn pk(key: &str) -> ProjectKey {
    ProjectKey::new(key).unwrap()
}

pub fn user(id: &str) -> UserId {
    UserId::new(id).unwrap()
}

pub fn days_ago(now: DateTime<Utc>, days: i64) -> DateTime<Utc> {
    now - TimeDelta::days(days)
}

pub fn issue(key: &str, project: &str, created_at: DateTime<Utc>) -> IssueRecord {
    IssueRecord {
        key: key.to_string(),
        project: pk(project),
        rule: "rust:S3776".to_string(),
        severity: Severity::Major,
        issue_type: IssueType::CodeSmell,
        status: IssueStatus::Open,
        resolution: None,
        assignee: None,
        message: "Refactor this function to reduce its cognitive complexity.".to_string(),
        created_at,
        updated_at: created_at,
    }
}

pub struct Fixture {
    pub now: DateTime<Utc>,
    pub catalog: MemoryCatalog,
    pub permissions: MemoryPermissions,
    pub index: MemoryIssueIndex,
}

impl Fixture {
    pub fn new() -> Self {
        let now = Utc::now();

        let mut catalog = MemoryCatalog::default();
        catalog
            .add_project(pk("P1"))
            .add_project(pk("P2"))
            .add_project(pk("P3"))
            .add_application(ck("APP"));
        catalog.link_copy(ck("APP_P1"), &ck("APP"), &pk("P1")).unwrap();
        catalog.link_copy(ck("APP_P2"), &ck("APP"), &pk("P2")).unwrap();
        catalog
            .set_baseline(&pk("P1"), Some(days_ago(now, 14)))
            .set_baseline(&pk("P2"), Some(days_ago(now, 25)));

        let alice = user("alice");
        let mut permissions = MemoryPermissions::default();
        for component in ["APP", "P1", "P2", "P3"] {
            permissions.grant_user(&alice, &ck(component));
        }

        let mut index = MemoryIssueIndex::default();
        index.extend([
            issue("P1_NEW", "P1", days_ago(now, 10)),
            issue("P1_OLD", "P1", days_ago(now, 20)),
            issue("P2_NEW", "P2", days_ago(now, 15)),
            issue("P2_OLD", "P2", days_ago(now, 30)),
            issue("P3_ANY", "P3", days_ago(now, 1)),
        ]);

        Self {
            now,
            catalog,
            permissions,
            index,
        }
    }

    pub fn engine(self) -> IssueSearchEngine {
        let catalog = Arc::new(self.catalog);
        IssueSearchEngine::new(
            catalog.clone(),
            Arc::new(self.permissions),
            catalog,
            Arc::new(self.index),
        )
    }
}

pub fn keys(issues: &[IssueRecord]) -> Vec<&str> {
    let mut keys: Vec<&str> = issues.iter().map(|issue| issue.key.as_str()).collect();
    keys.sort_unstable();
    keys
}

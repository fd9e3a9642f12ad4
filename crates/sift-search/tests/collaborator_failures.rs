//! Collaborator failures fail the whole request.
//!
//! A failing or slow store must never be read as "denied" or "no baseline",
//! and no partial page is returned.

mod common;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sift_core::entities::ComponentNode;
use sift_core::keys::{ComponentKey, ProjectKey, UserId};
use sift_search::memory::MemoryIssueIndex;
use sift_search::query::StructuredQuery;
use sift_search::store::{AuthorizationIndex, BaselineStore, HierarchyStore, IssueIndex, IssuePage};
use sift_search::{Collaborator, EngineOptions, IssueSearchEngine, SearchError, SearchRequest, StoreError};

use common::{Fixture, ck, pk, user};

/// Fails every call for one project; delegates the rest.
struct FlakyBaselines {
    inner: Arc<dyn BaselineStore>,
    broken: ProjectKey,
}

#[async_trait]
impl BaselineStore for FlakyBaselines {
    async fn get_baseline(&self, project: &ProjectKey) -> Result<Option<DateTime<Utc>>, StoreError> {
        if *project == self.broken {
            return Err(StoreError::Unavailable("baseline service reset the connection".to_string()));
        }
        self.inner.get_baseline(project).await
    }
}

/// Never answers in time.
struct StalledPermissions;

#[async_trait]
impl AuthorizationIndex for StalledPermissions {
    async fn is_authorized(&self, _: &UserId, _: &ComponentKey) -> Result<bool, StoreError> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(true)
    }
}

/// Slow but healthy; records how many lookups started and finished.
#[derive(Default)]
struct SlowPermissions {
    started: AtomicUsize,
    finished: AtomicUsize,
}

#[async_trait]
impl AuthorizationIndex for SlowPermissions {
    async fn is_authorized(&self, _: &UserId, _: &ComponentKey) -> Result<bool, StoreError> {
        self.started.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(300)).await;
        self.finished.fetch_add(1, Ordering::SeqCst);
        Ok(true)
    }
}

struct BrokenHierarchy;

#[async_trait]
impl HierarchyStore for BrokenHierarchy {
    async fn resolve_hierarchy(
        &self,
        _: &[ComponentKey],
    ) -> Result<BTreeMap<ComponentKey, ComponentNode>, StoreError> {
        Err(StoreError::Backend("hierarchy table missing".to_string()))
    }
}

/// Counts calls so tests can check the index is never reached.
#[derive(Default)]
struct CountingIndex {
    inner: MemoryIssueIndex,
    calls: AtomicUsize,
}

#[async_trait]
impl IssueIndex for CountingIndex {
    async fn search(&self, query: &StructuredQuery) -> Result<IssuePage, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.search(query).await
    }
}

fn fast_options() -> EngineOptions {
    EngineOptions {
        lookup_timeout: Duration::from_millis(50),
        ..EngineOptions::default()
    }
}

#[tokio::test]
async fn failing_baseline_fails_the_request() {
    let fixture = Fixture::new();
    let catalog = Arc::new(fixture.catalog);
    let baselines = FlakyBaselines {
        inner: catalog.clone(),
        broken: pk("P2"),
    };
    let engine = IssueSearchEngine::new(
        catalog,
        Arc::new(fixture.permissions),
        Arc::new(baselines),
        Arc::new(fixture.index),
    );

    let err = engine
        .search(
            &user("alice"),
            &SearchRequest::for_components([ck("APP")]).since_leak_period(true),
        )
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        SearchError::CollaboratorUnavailable {
            collaborator: Collaborator::Baseline,
            ..
        }
    ));
    assert!(err.is_transient());
}

#[tokio::test]
async fn failing_baseline_is_irrelevant_without_leak_period() {
    let fixture = Fixture::new();
    let catalog = Arc::new(fixture.catalog);
    let baselines = FlakyBaselines {
        inner: catalog.clone(),
        broken: pk("P2"),
    };
    let engine = IssueSearchEngine::new(
        catalog,
        Arc::new(fixture.permissions),
        Arc::new(baselines),
        Arc::new(fixture.index),
    );

    let outcome = engine
        .search(&user("alice"), &SearchRequest::for_components([ck("APP")]))
        .await
        .unwrap();
    assert_eq!(outcome.total, 4);
}

#[tokio::test]
async fn stalled_authorization_times_out() {
    let fixture = Fixture::new();
    let catalog = Arc::new(fixture.catalog);
    let index = Arc::new(CountingIndex {
        inner: fixture.index,
        calls: AtomicUsize::new(0),
    });
    let engine = IssueSearchEngine::new(
        catalog.clone(),
        Arc::new(StalledPermissions),
        catalog,
        index.clone(),
    )
    .with_options(fast_options())
    .unwrap();

    let err = engine
        .search(&user("alice"), &SearchRequest::for_components([ck("P1")]))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        SearchError::CollaboratorUnavailable {
            collaborator: Collaborator::Authorization,
            ..
        }
    ));
    assert_eq!(index.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn dropped_search_cancels_outstanding_lookups() {
    let fixture = Fixture::new();
    let catalog = Arc::new(fixture.catalog);
    let permissions = Arc::new(SlowPermissions::default());
    let engine = IssueSearchEngine::new(
        catalog.clone(),
        permissions.clone(),
        catalog,
        Arc::new(fixture.index),
    );

    let request = SearchRequest::for_components([ck("P1"), ck("P2")]);
    let abandoned = tokio::time::timeout(
        Duration::from_millis(50),
        engine.search(&user("alice"), &request),
    )
    .await;
    assert!(abandoned.is_err(), "search should still be waiting on authorization");

    // Long enough for any detached lookup to have completed.
    tokio::time::sleep(Duration::from_millis(400)).await;

    assert_eq!(permissions.started.load(Ordering::SeqCst), 2);
    assert_eq!(permissions.finished.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn broken_hierarchy_fails_before_authorization() {
    let fixture = Fixture::new();
    let engine = IssueSearchEngine::new(
        Arc::new(BrokenHierarchy),
        Arc::new(StalledPermissions),
        Arc::new(fixture.catalog),
        Arc::new(fixture.index),
    )
    .with_options(fast_options())
    .unwrap();

    let err = engine
        .search(&user("alice"), &SearchRequest::for_components([ck("APP")]))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        SearchError::CollaboratorUnavailable {
            collaborator: Collaborator::Hierarchy,
            ..
        }
    ));
}

#[tokio::test]
async fn empty_authorization_skips_the_index() {
    let fixture = Fixture::new();
    let catalog = Arc::new(fixture.catalog);
    let index = Arc::new(CountingIndex {
        inner: fixture.index,
        calls: AtomicUsize::new(0),
    });
    let engine = IssueSearchEngine::new(
        catalog.clone(),
        Arc::new(fixture.permissions),
        catalog,
        index.clone(),
    );

    let outcome = engine
        .search(&user("mallory"), &SearchRequest::for_components([ck("P1"), ck("P2")]))
        .await
        .unwrap();

    assert!(outcome.issues.is_empty());
    assert_eq!(index.calls.load(Ordering::SeqCst), 0);
}

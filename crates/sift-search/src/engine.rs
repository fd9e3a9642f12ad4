//! The search pipeline.
//!
//! ```text
//! SearchRequest
//!   -> ComponentResolver     (applications flattened to projects)
//!   -> AuthorizationFilter   (per-project browse check)
//!   -> LeakWindowResolver    (per-project baseline, only if requested)
//!   -> QueryBuilder          (owner clause + leak clauses + filters)
//!   -> IssueIndex
//! ```
//!
//! Every stage is stateless; the engine only holds the collaborators. A new
//! [`LookupBudget`] is created for each request.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use sift_config::SearchConfig;
use sift_core::entities::IssueRecord;
use sift_core::keys::{ComponentKey, ProjectKey, UserId};

use crate::authz::AuthorizationFilter;
use crate::budget::LookupBudget;
use crate::error::{Collaborator, SearchError};
use crate::leak::{LeakWindowResolver, LeakWindows};
use crate::query::{QueryBuilder, StructuredQuery};
use crate::request::{Paging, SearchRequest};
use crate::resolver::ComponentResolver;
use crate::store::{AuthorizationIndex, BaselineStore, HierarchyStore, IssueIndex, IssuePage};

/// Engine tunables, usually taken from [`SearchConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    pub default_page_size: u32,
    pub max_page_size: u32,
    pub lookup_timeout: Duration,
    pub max_concurrent_lookups: usize,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self::from(&SearchConfig::default())
    }
}

impl EngineOptions {
    /// Reject options the pipeline cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::InvalidArgument`] for zero page sizes, a
    /// default page size above the maximum, a zero timeout, or zero
    /// concurrency.
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.default_page_size == 0 || self.max_page_size == 0 {
            return Err(SearchError::invalid("page sizes must be at least 1"));
        }
        if self.default_page_size > self.max_page_size {
            return Err(SearchError::invalid(format!(
                "default page size {} exceeds maximum {}",
                self.default_page_size, self.max_page_size
            )));
        }
        if self.lookup_timeout.is_zero() {
            return Err(SearchError::invalid("lookup timeout must be non-zero"));
        }
        if self.max_concurrent_lookups == 0 {
            return Err(SearchError::invalid("at least one concurrent lookup is required"));
        }
        Ok(())
    }
}

impl From<&SearchConfig> for EngineOptions {
    fn from(config: &SearchConfig) -> Self {
        Self {
            default_page_size: config.default_page_size,
            max_page_size: config.max_page_size,
            lookup_timeout: config.lookup_timeout(),
            max_concurrent_lookups: config.max_concurrent_lookups,
        }
    }
}

/// What the pipeline did on the way to the query. Diagnostic only; none of
/// it changes the result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SearchDiagnostics {
    pub requested_components: usize,
    pub applications: BTreeSet<ComponentKey>,
    pub unaddressable_applications: BTreeSet<ComponentKey>,
    pub resolved_projects: BTreeSet<ProjectKey>,
    pub authorized_projects: usize,
    pub leak_excluded_projects: usize,
    pub since_leak_period: bool,
}

/// Final index query plus diagnostics, without having run the search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchPlan {
    pub query: StructuredQuery,
    pub diagnostics: SearchDiagnostics,
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchOutcome {
    pub issues: Vec<IssueRecord>,
    pub total: u64,
    pub paging: Paging,
    pub diagnostics: SearchDiagnostics,
}

#[derive(Clone)]
pub struct IssueSearchEngine {
    resolver: ComponentResolver,
    authorization: AuthorizationFilter,
    leak: LeakWindowResolver,
    index: Arc<dyn IssueIndex>,
    options: EngineOptions,
}

impl IssueSearchEngine {
    #[must_use]
    pub fn new(
        hierarchy: Arc<dyn HierarchyStore>,
        authorization: Arc<dyn AuthorizationIndex>,
        baselines: Arc<dyn BaselineStore>,
        index: Arc<dyn IssueIndex>,
    ) -> Self {
        Self {
            resolver: ComponentResolver::new(hierarchy, Arc::clone(&authorization)),
            authorization: AuthorizationFilter::new(authorization),
            leak: LeakWindowResolver::new(baselines),
            index,
            options: EngineOptions::default(),
        }
    }

    /// Replace the default options.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::InvalidArgument`] if the options fail
    /// [`EngineOptions::validate`].
    pub fn with_options(mut self, options: EngineOptions) -> Result<Self, SearchError> {
        options.validate()?;
        self.options = options;
        Ok(self)
    }

    #[must_use]
    pub const fn options(&self) -> &EngineOptions {
        &self.options
    }

    fn budget(&self) -> LookupBudget {
        LookupBudget::new(self.options.max_concurrent_lookups, self.options.lookup_timeout)
    }

    /// Run every stage up to and including query construction.
    ///
    /// # Errors
    ///
    /// - [`SearchError::InvalidArgument`] for an empty scope, contradictory
    ///   filters, or out-of-range paging.
    /// - [`SearchError::NotFound`] for an unknown component key.
    /// - [`SearchError::CollaboratorUnavailable`] if any lookup fails.
    pub async fn plan(&self, user: &UserId, request: &SearchRequest) -> Result<SearchPlan, SearchError> {
        self.plan_with(user, request, &self.budget()).await
    }

    async fn plan_with(
        &self,
        user: &UserId,
        request: &SearchRequest,
        budget: &LookupBudget,
    ) -> Result<SearchPlan, SearchError> {
        if request.component_keys.is_empty() {
            return Err(SearchError::invalid("at least one component key is required"));
        }
        request.filters.validate(request.since_leak_period)?;
        let paging = Paging::resolve(
            request.page,
            request.page_size,
            self.options.default_page_size,
            self.options.max_page_size,
        )?;

        let resolved = self
            .resolver
            .resolve(user, &request.component_keys, budget)
            .await?;
        let authorized = self
            .authorization
            .filter(user, resolved.projects(), budget)
            .await?;
        let authorized_projects = authorized.len();

        let windows = if request.since_leak_period {
            self.leak.resolve(authorized, budget).await?
        } else {
            LeakWindows::unconstrained(authorized)
        };

        let built = QueryBuilder::build(windows, request.filters.clone(), paging, request.sort);

        let diagnostics = SearchDiagnostics {
            requested_components: request.component_keys.len(),
            applications: resolved.applications().clone(),
            unaddressable_applications: resolved.unaddressable().clone(),
            resolved_projects: resolved.projects().clone(),
            authorized_projects,
            leak_excluded_projects: built.leak_excluded,
            since_leak_period: request.since_leak_period,
        };

        Ok(SearchPlan {
            query: built.query,
            diagnostics,
        })
    }

    /// Search issues across the requested components.
    ///
    /// A user with no rights on any resolved project gets an empty page, not
    /// an error. No partial results are ever returned: a failing lookup fails
    /// the whole request.
    ///
    /// # Errors
    ///
    /// See [`IssueSearchEngine::plan`]; additionally
    /// [`SearchError::CollaboratorUnavailable`] if the index call fails.
    #[tracing::instrument(
        skip_all,
        fields(
            user = %user,
            components = request.component_keys.len(),
            since_leak_period = request.since_leak_period,
        )
    )]
    pub async fn search(&self, user: &UserId, request: &SearchRequest) -> Result<SearchOutcome, SearchError> {
        let budget = self.budget();
        let SearchPlan { query, diagnostics } = self.plan_with(user, request, &budget).await?;
        let paging = query.paging();

        let page = if query.is_unsatisfiable() {
            IssuePage::default()
        } else {
            budget
                .call(Collaborator::IssueIndex, self.index.search(&query))
                .await?
        };

        tracing::debug!(
            returned = page.issues.len(),
            total = page.total,
            "issue search complete"
        );

        Ok(SearchOutcome {
            issues: page.issues,
            total: page.total,
            paging,
            diagnostics,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeDelta, Utc};
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use sift_core::enums::{IssueStatus, IssueType, Severity};

    use super::*;
    use crate::memory::{MemoryCatalog, MemoryIssueIndex, MemoryPermissions};
    use crate::request::IssueFilters;

    fn ck(key: &str) -> ComponentKey {
        ComponentKey::new(key).unwrap()
    }

    fn pk(key: &str) -> ProjectKey {
        ProjectKey::new(key).unwrap()
    }

    fn issue(key: &str, project: &str, age_days: i64) -> IssueRecord {
        let created_at = Utc::now() - TimeDelta::days(age_days);
        IssueRecord {
            key: key.to_string(),
            project: pk(project),
            rule: "rust:S1135".to_string(),
            severity: Severity::Minor,
            issue_type: IssueType::CodeSmell,
            status: IssueStatus::Open,
            resolution: None,
            assignee: None,
            message: "Complete the task associated to this TODO comment.".to_string(),
            created_at,
            updated_at: created_at,
        }
    }

    fn engine(permissions: MemoryPermissions) -> IssueSearchEngine {
        let mut catalog = MemoryCatalog::default();
        catalog.add_project(pk("P1"));
        let mut index = MemoryIssueIndex::default();
        index.insert(issue("I1", "P1", 1));

        let catalog = Arc::new(catalog);
        IssueSearchEngine::new(
            catalog.clone(),
            Arc::new(permissions),
            catalog,
            Arc::new(index),
        )
    }

    #[test]
    fn options_follow_config() {
        let config = SearchConfig {
            default_page_size: 20,
            max_page_size: 40,
            lookup_timeout_ms: 250,
            max_concurrent_lookups: 3,
        };
        let options = EngineOptions::from(&config);
        assert_eq!(options.default_page_size, 20);
        assert_eq!(options.lookup_timeout, Duration::from_millis(250));
    }

    #[test]
    fn default_options_are_valid() {
        assert!(EngineOptions::default().validate().is_ok());
    }

    #[rstest]
    #[case::zero_default_page(EngineOptions { default_page_size: 0, ..EngineOptions::default() })]
    #[case::zero_max_page(EngineOptions { max_page_size: 0, ..EngineOptions::default() })]
    #[case::default_above_max(EngineOptions { default_page_size: 50, max_page_size: 10, ..EngineOptions::default() })]
    #[case::zero_timeout(EngineOptions { lookup_timeout: Duration::ZERO, ..EngineOptions::default() })]
    #[case::zero_concurrency(EngineOptions { max_concurrent_lookups: 0, ..EngineOptions::default() })]
    fn unusable_options_are_rejected(#[case] options: EngineOptions) {
        let err = engine(MemoryPermissions::default())
            .with_options(options)
            .err()
            .unwrap();
        assert!(matches!(err, SearchError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn unauthorized_project_yields_empty_page() {
        let alice = UserId::new("alice").unwrap();
        let outcome = engine(MemoryPermissions::default())
            .search(&alice, &SearchRequest::for_components([ck("P1")]))
            .await
            .unwrap();

        assert!(outcome.issues.is_empty());
        assert_eq!(outcome.total, 0);
        assert_eq!(outcome.diagnostics.authorized_projects, 0);
    }

    #[tokio::test]
    async fn plan_validates_filters_before_any_lookup() {
        let alice = UserId::new("alice").unwrap();
        let request = SearchRequest::for_components([ck("NOT_EVEN_KNOWN")])
            .since_leak_period(true)
            .with_filters(IssueFilters {
                created_after: Some(Utc::now()),
                ..IssueFilters::default()
            });

        let err = engine(MemoryPermissions::default())
            .plan(&alice, &request)
            .await
            .unwrap_err();
        assert!(matches!(err, SearchError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn page_size_above_maximum_is_rejected() {
        let alice = UserId::new("alice").unwrap();
        let request = SearchRequest::for_components([ck("P1")]).with_page(1, 10_000);

        let err = engine(MemoryPermissions::default())
            .search(&alice, &request)
            .await
            .unwrap_err();
        assert!(matches!(err, SearchError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn default_paging_comes_from_options() {
        let alice = UserId::new("alice").unwrap();
        let mut permissions = MemoryPermissions::default();
        permissions.grant_user(&alice, &ck("P1"));

        let options = EngineOptions {
            default_page_size: 7,
            ..EngineOptions::default()
        };
        let outcome = engine(permissions)
            .with_options(options)
            .unwrap()
            .search(&alice, &SearchRequest::for_components([ck("P1")]))
            .await
            .unwrap();

        assert_eq!(outcome.paging, Paging { page: 1, page_size: 7 });
        assert_eq!(outcome.issues.len(), 1);
    }
}

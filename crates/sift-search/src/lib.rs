//! # sift-search
//!
//! Component-scoped issue search with per-project authorization and
//! per-project leak-period filtering.
//!
//! A search names projects and/or applications. Applications are expanded
//! into the real projects they link, every project is checked for browse
//! rights on its own, and when a leak-period search is requested each project
//! is restricted to issues created since its own baseline. Only then is the
//! index queried, always with a mandatory owner restriction.
//!
//! The external systems (hierarchy, permissions, baselines, issue index) are
//! reached through the async traits in [`store`]; [`memory`] provides
//! in-process implementations of all four.

pub mod authz;
pub mod budget;
pub mod engine;
pub mod error;
pub mod leak;
pub mod memory;
pub mod query;
pub mod request;
pub mod resolver;
pub mod store;

pub use engine::{EngineOptions, IssueSearchEngine, SearchDiagnostics, SearchOutcome, SearchPlan};
pub use error::{Collaborator, SearchError, StoreError};
pub use request::{IssueFilters, Paging, SearchRequest, Sort};

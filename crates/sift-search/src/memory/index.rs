use std::collections::BTreeMap;

use async_trait::async_trait;
use sift_core::entities::IssueRecord;
use sift_core::keys::ProjectKey;

use crate::error::StoreError;
use crate::query::StructuredQuery;
use crate::store::{IssueIndex, IssuePage};

/// Issue documents bucketed by owning project.
///
/// Only the buckets named in the query's authorization clause are ever read.
#[derive(Debug, Clone, Default)]
pub struct MemoryIssueIndex {
    by_project: BTreeMap<ProjectKey, Vec<IssueRecord>>,
}

impl MemoryIssueIndex {
    pub fn insert(&mut self, issue: IssueRecord) -> &mut Self {
        self.by_project
            .entry(issue.project.clone())
            .or_default()
            .push(issue);
        self
    }

    pub fn extend(&mut self, issues: impl IntoIterator<Item = IssueRecord>) -> &mut Self {
        for issue in issues {
            self.insert(issue);
        }
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_project.values().map(Vec::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_project.values().all(Vec::is_empty)
    }
}

#[async_trait]
impl IssueIndex for MemoryIssueIndex {
    async fn search(&self, query: &StructuredQuery) -> Result<IssuePage, StoreError> {
        let mut matches: Vec<&IssueRecord> = query
            .authorization()
            .projects()
            .iter()
            .filter_map(|project| self.by_project.get(project))
            .flatten()
            .filter(|issue| query.matches(issue))
            .collect();

        let sort = query.sort();
        matches.sort_by(|a, b| sort.compare(a, b));

        let paging = query.paging();
        let total = matches.len() as u64;
        let issues = matches
            .into_iter()
            .skip(paging.offset())
            .take(paging.page_size as usize)
            .cloned()
            .collect();

        Ok(IssuePage { issues, total })
    }
}

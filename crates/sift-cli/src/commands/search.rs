use serde::Serialize;
use sift_config::SiftConfig;
use sift_core::entities::IssueRecord;
use sift_search::{Paging, SearchDiagnostics, SearchOutcome};

use crate::cli::{GlobalFlags, SearchArgs};
use crate::commands::shared;
use crate::output::output;

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub total: u64,
    pub paging: Paging,
    pub issues: Vec<IssueRecord>,
    pub diagnostics: SearchDiagnostics,
}

impl From<SearchOutcome> for SearchResponse {
    fn from(outcome: SearchOutcome) -> Self {
        Self {
            total: outcome.total,
            paging: outcome.paging,
            issues: outcome.issues,
            diagnostics: outcome.diagnostics,
        }
    }
}

/// Handle `sift search`.
pub async fn handle(args: &SearchArgs, config: &SiftConfig, flags: &GlobalFlags) -> anyhow::Result<()> {
    let response = run(args, config).await?;
    tracing::info!(total = response.total, "search complete");
    output(&response, flags.format)
}

pub async fn run(args: &SearchArgs, config: &SiftConfig) -> anyhow::Result<SearchResponse> {
    let prepared = shared::prepare(args, config)?;
    let outcome = prepared.engine.search(&prepared.user, &prepared.request).await?;
    Ok(outcome.into())
}

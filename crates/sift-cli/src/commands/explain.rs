use serde::Serialize;
use serde_json::Value;
use sift_config::SiftConfig;
use sift_search::SearchDiagnostics;

use crate::cli::{GlobalFlags, SearchArgs};
use crate::commands::shared;
use crate::output::output;

#[derive(Debug, Serialize)]
pub struct ExplainResponse {
    /// Index query document.
    pub query: Value,
    pub diagnostics: SearchDiagnostics,
}

/// Handle `sift explain`.
pub async fn handle(args: &SearchArgs, config: &SiftConfig, flags: &GlobalFlags) -> anyhow::Result<()> {
    let response = run(args, config).await?;
    output(&response, flags.format)
}

pub async fn run(args: &SearchArgs, config: &SiftConfig) -> anyhow::Result<ExplainResponse> {
    let prepared = shared::prepare(args, config)?;
    let plan = prepared.engine.plan(&prepared.user, &prepared.request).await?;
    Ok(ExplainResponse {
        query: plan.query.to_index_dsl(),
        diagnostics: plan.diagnostics,
    })
}

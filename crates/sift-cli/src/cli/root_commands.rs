use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Args, Subcommand};
use sift_core::enums::{IssueStatus, IssueType, Severity, SortField};

/// Top-level commands for the `sift` binary.
#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    /// Search issues across projects and applications.
    Search(SearchArgs),
    /// Print the index query a search would run, without running it.
    Explain(SearchArgs),
}

/// Arguments shared by `sift search` and `sift explain`.
#[derive(Clone, Debug, Args)]
pub struct SearchArgs {
    /// Dataset fixture (JSON). Defaults to `general.default_dataset`.
    #[arg(long)]
    pub dataset: Option<PathBuf>,

    /// Requesting user.
    #[arg(long)]
    pub user: String,

    /// Project and/or application keys, comma-separated.
    #[arg(long, value_delimiter = ',', required = true)]
    pub components: Vec<String>,

    /// Only issues created since each project's own baseline.
    #[arg(long)]
    pub since_leak_period: bool,

    #[arg(long, value_delimiter = ',')]
    pub severities: Vec<Severity>,

    #[arg(long, value_delimiter = ',')]
    pub types: Vec<IssueType>,

    #[arg(long, value_delimiter = ',')]
    pub statuses: Vec<IssueStatus>,

    #[arg(long, value_delimiter = ',')]
    pub rules: Vec<String>,

    #[arg(long, value_delimiter = ',')]
    pub assignees: Vec<String>,

    /// `true` for resolved issues only, `false` for unresolved only.
    #[arg(long)]
    pub resolved: Option<bool>,

    /// Inclusive lower creation bound (RFC 3339).
    #[arg(long)]
    pub created_after: Option<DateTime<Utc>>,

    /// Exclusive upper creation bound (RFC 3339).
    #[arg(long)]
    pub created_before: Option<DateTime<Utc>>,

    /// creation_date, update_date, severity or key.
    #[arg(long)]
    pub sort: Option<SortField>,

    /// Ascending order (default is descending).
    #[arg(long)]
    pub asc: bool,

    /// 1-based page number.
    #[arg(long)]
    pub page: Option<u32>,

    #[arg(long)]
    pub page_size: Option<u32>,
}

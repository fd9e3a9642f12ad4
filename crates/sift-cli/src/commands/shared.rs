use std::path::PathBuf;

use anyhow::{Context, bail};
use sift_config::SiftConfig;
use sift_core::enums::SortOrder;
use sift_core::keys::{ComponentKey, UserId};
use sift_search::memory::MemoryDataset;
use sift_search::{EngineOptions, IssueFilters, IssueSearchEngine, SearchRequest, Sort};

use crate::cli::SearchArgs;

/// Everything a command needs to run one search.
pub struct Prepared {
    pub engine: IssueSearchEngine,
    pub user: UserId,
    pub request: SearchRequest,
}

pub fn prepare(args: &SearchArgs, config: &SiftConfig) -> anyhow::Result<Prepared> {
    let path = dataset_path(args, config)?;
    let dataset = MemoryDataset::from_path(&path)?;
    let engine = dataset
        .into_engine(EngineOptions::from(&config.search))
        .with_context(|| format!("failed to load dataset {}", path.display()))?;

    let user = UserId::new(args.user.clone()).context("invalid --user")?;

    Ok(Prepared {
        engine,
        user,
        request: build_request(args)?,
    })
}

fn dataset_path(args: &SearchArgs, config: &SiftConfig) -> anyhow::Result<PathBuf> {
    if let Some(path) = &args.dataset {
        return Ok(path.clone());
    }
    if config.general.has_default_dataset() {
        return Ok(PathBuf::from(&config.general.default_dataset));
    }
    bail!("no dataset given: pass --dataset or set general.default_dataset")
}

pub fn build_request(args: &SearchArgs) -> anyhow::Result<SearchRequest> {
    let components = args
        .components
        .iter()
        .map(|key| ComponentKey::new(key.trim()))
        .collect::<Result<Vec<_>, _>>()
        .context("invalid --components")?;

    let filters = IssueFilters {
        severities: args.severities.iter().copied().collect(),
        types: args.types.iter().copied().collect(),
        statuses: args.statuses.iter().copied().collect(),
        rules: args.rules.iter().cloned().collect(),
        assignees: args.assignees.iter().cloned().collect(),
        resolved: args.resolved,
        created_after: args.created_after,
        created_before: args.created_before,
    };

    let sort = Sort {
        field: args.sort.unwrap_or_default(),
        order: if args.asc {
            SortOrder::Asc
        } else {
            SortOrder::Desc
        },
    };

    Ok(SearchRequest {
        component_keys: components,
        since_leak_period: args.since_leak_period,
        filters,
        page: args.page,
        page_size: args.page_size,
        sort,
    })
}

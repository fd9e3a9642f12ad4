pub mod explain;
pub mod search;
mod shared;

use sift_config::SiftConfig;

use crate::cli::{Commands, GlobalFlags};

/// Dispatch a parsed command to the corresponding handler module.
pub async fn dispatch(command: Commands, config: &SiftConfig, flags: &GlobalFlags) -> anyhow::Result<()> {
    match command {
        Commands::Search(args) => search::handle(&args, config, flags).await,
        Commands::Explain(args) => explain::handle(&args, config, flags).await,
    }
}

use std::path::Path;

use anyhow::Context;
use sift_config::SiftConfig;

/// Load `.env` from the working directory if present, then the layered config.
pub fn load_config() -> anyhow::Result<SiftConfig> {
    let env_path = Path::new(".env");
    if env_path.exists() {
        dotenvy::from_path(env_path)
            .with_context(|| format!("failed to load dotenv file at {}", env_path.display()))?;
    }

    SiftConfig::load().context("failed to load sift configuration")
}

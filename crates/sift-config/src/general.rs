//! General CLI configuration.

use serde::{Deserialize, Serialize};

fn default_format() -> String {
    "json".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeneralConfig {
    /// Output format used when `--format` is not given (`json` or `raw`).
    #[serde(default = "default_format")]
    pub default_format: String,

    /// Dataset fixture used when `--dataset` is not given.
    #[serde(default)]
    pub default_dataset: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            default_format: default_format(),
            default_dataset: String::new(),
        }
    }
}

impl GeneralConfig {
    pub fn has_default_dataset(&self) -> bool {
        !self.default_dataset.is_empty()
    }
}

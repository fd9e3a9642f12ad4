use clap::{Parser, ValueEnum};
use sift_config::SiftConfig;

pub mod global;
pub mod root_commands;

pub use global::{GlobalFlags, OutputFormat};
pub use root_commands::{Commands, SearchArgs};

/// Top-level CLI parser for the `sift` binary.
#[derive(Debug, Parser)]
#[command(name = "sift", version, about = "Sift - component-scoped issue search")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format: json, raw (defaults to `general.default_format`)
    #[arg(short, long, global = true)]
    pub format: Option<OutputFormat>,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

impl Cli {
    /// Resolve global flags, falling back to config for anything not given.
    pub fn global_flags(&self, config: &SiftConfig) -> anyhow::Result<GlobalFlags> {
        let format = match self.format {
            Some(format) => format,
            None => <OutputFormat as ValueEnum>::from_str(&config.general.default_format, true).map_err(|_| {
                anyhow::anyhow!(
                    "invalid general.default_format '{}': expected json or raw",
                    config.general.default_format
                )
            })?,
        };

        Ok(GlobalFlags {
            format,
            quiet: self.quiet,
            verbose: self.verbose,
        })
    }
}

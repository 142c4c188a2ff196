use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};

use crate::config::{ConfigError, ScenarioConfig};

#[derive(Parser)]
#[command(author, version, about, propagate_version = true)]
pub struct Cli {
    /// Log rule firings and every step.
    #[clap(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Simulate one week with a scenario and operating strategy.
    #[clap(name = "run")]
    Run(Box<RunArgs>),

    /// Validate a strategy JSON file without simulating.
    #[clap(name = "check")]
    Check {
        /// Rule set JSON file.
        path: PathBuf,
    },

    /// List the names rule conditions and actions may use.
    #[clap(name = "variables")]
    Variables,

    /// List the built-in scenario presets.
    #[clap(name = "presets")]
    Presets,
}

#[derive(Args)]
pub struct RunArgs {
    /// Scenario TOML file.
    #[clap(long, conflicts_with = "preset")]
    pub scenario: Option<PathBuf>,

    /// Built-in scenario; `reference` when neither this nor `--scenario` is given.
    #[clap(long)]
    pub preset: Option<String>,

    /// Strategy JSON file overriding the scenario's strategy.
    #[clap(long)]
    pub strategy: Option<PathBuf>,

    /// Override the random seed of the generated series.
    #[clap(long)]
    pub seed: Option<u64>,

    /// Write the results table as CSV. A directory gets the default file name.
    #[clap(long = "results-out")]
    pub results_out: Option<PathBuf>,

    /// Write the applied strategy as JSON. A directory gets `applied_os.json`.
    #[clap(long = "strategy-out")]
    pub strategy_out: Option<PathBuf>,

    /// Print the hour-by-hour table.
    #[clap(long = "print-steps")]
    pub print_steps: bool,

    /// Print the summary as JSON instead of text.
    #[clap(long)]
    pub json: bool,

    /// Serve the results over HTTP after the run.
    #[cfg(feature = "api")]
    #[clap(long)]
    pub serve: bool,

    #[cfg(feature = "api")]
    #[clap(long, default_value = "3000")]
    pub port: u16,
}

impl RunArgs {
    /// Resolves the scenario: file, then preset, then `reference`, with the
    /// command-line overrides applied.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file or preset cannot be loaded.
    pub fn load_config(&self) -> Result<ScenarioConfig, ConfigError> {
        let mut config = match (&self.scenario, &self.preset) {
            (Some(path), _) => ScenarioConfig::from_toml_file(path)?,
            (None, Some(name)) => ScenarioConfig::from_preset(name)?,
            (None, None) => ScenarioConfig::reference(),
        };
        if let Some(seed) = self.seed {
            config.simulation.seed = seed;
        }
        if let Some(path) = &self.strategy {
            config.strategy.file = Some(path.clone());
        }
        Ok(config)
    }
}

/// `path` itself, or `path/default_name` when `path` is a directory.
pub fn output_path(path: &Path, default_name: &str) -> PathBuf {
    if path.is_dir() {
        path.join(default_name)
    } else {
        path.to_path_buf()
    }
}

//! CLI argument parsing and command dispatch.
//!
//! This module provides the command-line interface for issuedep using clap's derive API.
//! Each command has its own argument struct with validation and helpful error messages.
//!
//! # Commands
//!
//! - `graph`: Load a dependency graph and print it as trees, DOT or JSON
//! - `export`: Write the dependency graph as CSV
//! - `schedule`: List planned start/end dates and work factors
//! - `search`: Find issues in the dependency graph
//! - `config`: Show the effective settings
//!
//! # Global Flags
//!
//! - `--json`: Output in JSON format (applies to all commands)
//! - `--snapshot`: Tracker snapshot to read issues from
//! - `--settings`: Settings file (default `issuedep.yaml`)
//!
//! # Example
//!
//! ```bash
//! issuedep --snapshot tracker.json graph PROJ-12 --max-depth 2
//! issuedep --snapshot tracker.json graph PROJ-12 --format dot | dot -Tsvg > deps.svg
//! issuedep --snapshot tracker.json export PROJ-12 --output -
//! issuedep --snapshot tracker.json search PROJ-12 login --exclude-state Done
//! ```

mod args;
mod execute;
mod types;
mod validators;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

// Re-export argument structs
pub use args::{
    ConfigArgs, ExportArgs, FilterArgs, GraphArgs, ScheduleArgs, SearchArgs, TraversalArgs,
};

// Re-export types
pub use types::{FilterFieldArg, GraphFormatArg};

// Re-export validators for external use
pub use validators::{
    MAX_CONCURRENCY, MAX_DEPTH_LIMIT, validate_concurrency, validate_field_value,
    validate_issue_key, validate_max_depth,
};

/// Default snapshot file name
pub const DEFAULT_SNAPSHOT_FILE: &str = "issuedep-snapshot.json";

/// Issuedep - dependency graph explorer for linked issues
///
/// Starting from a root issue, follows the configured link types upstream and
/// downstream and shows the resulting dependency graph.
#[derive(Parser, Debug)]
#[command(name = "issuedep")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output in JSON format for programmatic use
    #[arg(long, global = true)]
    pub json: bool,

    /// Tracker snapshot (JSON) to read issues and links from
    #[arg(long, global = true, default_value = DEFAULT_SNAPSHOT_FILE)]
    pub snapshot: PathBuf,

    /// Settings file (YAML, or JSON by extension)
    #[arg(long, global = true)]
    pub settings: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Show the dependency graph of an issue
    ///
    /// Loads the root issue, follows its relations up to the configured depth
    /// and prints the upstream and downstream trees, or Graphviz DOT.
    Graph(GraphArgs),

    /// Export the dependency graph as CSV
    ///
    /// Writes one row per relation of every loaded issue, ordered by depth.
    Export(ExportArgs),

    /// Show the planned schedule of the dependency graph
    ///
    /// Lists start and end dates, estimations and work factors of every
    /// scheduled issue.
    Schedule(ScheduleArgs),

    /// Search the dependency graph
    ///
    /// Matches text against readable ids and summaries, or a state/type value.
    Search(SearchArgs),

    /// Show the effective settings
    ///
    /// Prints the settings after environment overrides and reports relation
    /// rules that can never match.
    Config(ConfigArgs),
}

impl Cli {
    /// Parse CLI arguments from command line
    pub fn parse_args() -> Self {
        <Self as Parser>::parse()
    }

    /// Parse CLI arguments from an iterator (for testing)
    pub fn try_parse_from<I, T>(iter: I) -> std::result::Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(iter)
    }

    /// Execute the CLI command
    pub async fn execute(&self) -> Result<()> {
        use crate::app::App;
        use crate::output::OutputMode;
        use crate::settings::SETTINGS_FILE_NAME;

        let output_mode = if self.json {
            OutputMode::Json
        } else {
            OutputMode::Text
        };

        match &self.command {
            Some(Commands::Graph(args)) => {
                let app = App::from_paths(&self.snapshot, self.settings.as_deref()).await?;
                execute::execute_graph(&app, args, output_mode).await
            }
            Some(Commands::Export(args)) => {
                let app = App::from_paths(&self.snapshot, self.settings.as_deref()).await?;
                execute::execute_export(&app, args, output_mode).await
            }
            Some(Commands::Schedule(args)) => {
                let app = App::from_paths(&self.snapshot, self.settings.as_deref()).await?;
                execute::execute_schedule(&app, args, output_mode).await
            }
            Some(Commands::Search(args)) => {
                let app = App::from_paths(&self.snapshot, self.settings.as_deref()).await?;
                execute::execute_search(&app, args, output_mode).await
            }
            Some(Commands::Config(args)) => {
                let path = self
                    .settings
                    .clone()
                    .unwrap_or_else(|| PathBuf::from(SETTINGS_FILE_NAME));
                execute::execute_config(&path, args, output_mode).await
            }
            None => {
                println!("Issuedep dependency graph explorer");
                println!("Use --help for more information");
                Ok(())
            }
        }
    }
}

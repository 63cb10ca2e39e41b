//! CLI argument structs for all commands.
//!
//! Each command has its own argument struct with clap derive attributes
//! for parsing and validation. Traversal and filter flags are shared through
//! flattened groups.

use clap::{Args, Parser};
use std::path::PathBuf;

use super::types::{FilterFieldArg, GraphFormatArg};
use super::validators::{
    validate_concurrency, validate_field_value, validate_issue_key, validate_max_depth,
};
use crate::domain::FollowDirections;

/// Traversal flags shared by every command that loads a graph
#[derive(Args, Debug, Clone, Default)]
pub struct TraversalArgs {
    /// Largest depth a discovered issue may have (overrides the settings)
    #[arg(short = 'd', long, value_parser = validate_max_depth)]
    pub max_depth: Option<u32>,

    /// Do not follow upstream links
    #[arg(long)]
    pub no_upstream: bool,

    /// Do not follow downstream links
    #[arg(long)]
    pub no_downstream: bool,

    /// Traverse even if `autoLoadDeps` is off in the settings
    #[arg(long)]
    pub load_deps: bool,

    /// Expand one more level from this issue after loading (repeatable)
    #[arg(short = 'e', long = "expand", value_parser = validate_issue_key)]
    pub expand: Vec<String>,

    /// Upper bound on in-flight link fetches
    #[arg(long, value_parser = validate_concurrency)]
    pub concurrency: Option<usize>,
}

impl TraversalArgs {
    /// Directions selected by the `--no-*` flags.
    pub fn follow(&self) -> FollowDirections {
        FollowDirections::from_flags(!self.no_upstream, !self.no_downstream)
    }
}

/// View filter flags
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Show issues without any visible relation
    #[arg(long)]
    pub show_orphans: bool,

    /// Hide issues whose links were never loaded
    #[arg(long)]
    pub hide_unknown_links: bool,

    /// Hide issues in this state (repeatable)
    #[arg(long, value_parser = validate_field_value)]
    pub exclude_state: Vec<String>,

    /// Hide issues of this type (repeatable)
    #[arg(long, value_parser = validate_field_value)]
    pub exclude_type: Vec<String>,
}

/// Arguments for the `graph` command
#[derive(Parser, Debug, Clone)]
pub struct GraphArgs {
    /// Root issue (internal or readable id)
    #[arg(value_parser = validate_issue_key)]
    pub root: String,

    /// Output format (ignored with --json)
    #[arg(short, long, value_enum, default_value = "tree")]
    pub format: GraphFormatArg,

    /// Hide the upstream links of this issue (repeatable)
    #[arg(long, value_parser = validate_issue_key)]
    pub hide_upstream: Vec<String>,

    /// Hide the downstream links of this issue (repeatable)
    #[arg(long, value_parser = validate_issue_key)]
    pub hide_downstream: Vec<String>,

    /// Traversal options
    #[command(flatten)]
    pub traversal: TraversalArgs,

    /// Filter options
    #[command(flatten)]
    pub filter: FilterArgs,
}

/// Arguments for the `export` command
#[derive(Parser, Debug, Clone)]
pub struct ExportArgs {
    /// Root issue (internal or readable id)
    #[arg(value_parser = validate_issue_key)]
    pub root: String,

    /// Output file, `-` for stdout
    ///
    /// Defaults to `<project><number>_export.csv` in the working directory.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Traversal options
    #[command(flatten)]
    pub traversal: TraversalArgs,
}

/// Arguments for the `schedule` command
#[derive(Parser, Debug, Clone)]
pub struct ScheduleArgs {
    /// Root issue (internal or readable id)
    #[arg(value_parser = validate_issue_key)]
    pub root: String,

    /// Only list overdue issues
    #[arg(long)]
    pub overdue: bool,

    /// Traversal options
    #[command(flatten)]
    pub traversal: TraversalArgs,

    /// Filter options
    #[command(flatten)]
    pub filter: FilterArgs,
}

/// Arguments for the `search` command
#[derive(Parser, Debug, Clone)]
pub struct SearchArgs {
    /// Root issue (internal or readable id)
    #[arg(value_parser = validate_issue_key)]
    pub root: String,

    /// Text to look for in the id and summary (case-insensitive)
    pub text: Option<String>,

    /// Match issues whose field equals `--value`
    #[arg(long, value_enum, requires = "value")]
    pub field: Option<FilterFieldArg>,

    /// Field value to match
    #[arg(long, value_parser = validate_field_value, requires = "field")]
    pub value: Option<String>,

    /// Traversal options
    #[command(flatten)]
    pub traversal: TraversalArgs,
}

/// Arguments for the `config` command
#[derive(Parser, Debug, Clone)]
pub struct ConfigArgs {
    /// Fail if a relation spec contains entries that can never match
    #[arg(long)]
    pub strict: bool,
}

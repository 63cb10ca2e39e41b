//! Issuedep - incremental dependency-graph explorer for linked issues.
//!
//! Starting from a root issue, the traversal engine fetches linked issues
//! from an [`source::IssueSource`], merges them into a growing
//! [`graph::IssueGraph`] and tracks which directions of each issue have been
//! explored. The projection, export and output modules consume the merged
//! graph read-only.

#![forbid(unsafe_code)]

// Public modules for library usage
pub mod domain;
pub mod error;
pub mod export;
pub mod fields;
pub mod graph;
pub mod loader;
pub mod projection;
pub mod relations;
pub mod schedule;
pub mod settings;
pub mod source;

// Public CLI module (needed by binary)
pub mod app;
pub mod cli;
pub mod output;

//! Application context for CLI command execution.
//!
//! This module provides the `App` struct that owns the issue source and the
//! effective settings, and provides a context for executing CLI commands.
//!
//! # Example
//!
//! ```no_run
//! use issuedep::app::App;
//! use std::path::Path;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let app = App::from_paths(Path::new("snapshot.json"), None).await?;
//!     // Execute commands using app...
//!     Ok(())
//! }
//! ```

use crate::error::Result;
use crate::settings::{SETTINGS_FILE_NAME, Settings};
use crate::source::{InMemorySource, IssueSource};
use std::path::{Path, PathBuf};

/// Application context for CLI operations.
pub struct App {
    /// The issue source (trait object for polymorphism)
    source: Box<dyn IssueSource>,

    /// Effective settings, after environment overrides
    settings: Settings,

    /// Settings file the settings were read from
    settings_path: PathBuf,
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("settings_path", &self.settings_path)
            .field("settings", &self.settings)
            .field("source", &"<dyn IssueSource>")
            .finish()
    }
}

impl App {
    /// Create an App with an explicit source and settings.
    pub fn new(source: Box<dyn IssueSource>, settings: Settings) -> Self {
        Self {
            source,
            settings,
            settings_path: PathBuf::from(SETTINGS_FILE_NAME),
        }
    }

    /// Create an App from a snapshot file and an optional settings file.
    ///
    /// Without a settings path, `issuedep.yaml` in the working directory is
    /// used if it exists. `ISSUEDEP_MAX_DEPTH` is applied on top.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The snapshot cannot be read or parsed
    /// - The settings file exists but cannot be parsed
    pub async fn from_paths(snapshot: &Path, settings_path: Option<&Path>) -> Result<Self> {
        let settings_path = settings_path.map_or_else(
            || PathBuf::from(SETTINGS_FILE_NAME),
            Path::to_path_buf,
        );
        let settings = Settings::load(&settings_path).await?.apply_env();
        let source = InMemorySource::load(snapshot).await?;

        let relations = settings.relations();
        for rule in relations.invalid_rules() {
            tracing::warn!(rule = %rule, "Ignoring relation rule that can never match");
        }

        Ok(Self {
            source: Box::new(source),
            settings,
            settings_path,
        })
    }

    /// Get an immutable reference to the source.
    pub fn source(&self) -> &dyn IssueSource {
        self.source.as_ref()
    }

    /// Get the effective settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Get the path the settings were read from.
    pub fn settings_path(&self) -> &Path {
        &self.settings_path
    }
}

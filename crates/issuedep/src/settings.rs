//! Settings for issuedep.
//!
//! Settings are read from a YAML file (or JSON, by `.json` extension) using
//! the tracker widget's camelCase keys:
//!
//! ```yaml
//! stateField: State
//! typeField: Type
//! upstreamRelations: "OUTWARD:Depend, OUTWARD:Subtask"
//! downstreamRelations: "INWARD:Depend, INWARD:Subtask"
//! maxRecursionDepth: 6
//! ```
//!
//! A missing file yields the defaults. `ISSUEDEP_MAX_DEPTH` overrides
//! `maxRecursionDepth`.

use crate::error::{ConfigError, Result};
use crate::relations::Relations;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;

/// Default settings file name
pub const SETTINGS_FILE_NAME: &str = "issuedep.yaml";

/// Default traversal depth bound
pub const DEFAULT_MAX_RECURSION_DEPTH: u32 = 6;

/// Environment variable overriding `maxRecursionDepth`
pub const MAX_DEPTH_ENV: &str = "ISSUEDEP_MAX_DEPTH";

/// Names of the custom fields extracted for every issue.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldSettings {
    /// State field
    pub state_field: Option<String>,
    /// Type field
    pub type_field: Option<String>,
    /// Assignee field
    pub assignee_field: Option<String>,
    /// Start date field
    pub start_date_field: Option<String>,
    /// Due date field
    pub due_date_field: Option<String>,
    /// Estimation field
    pub estimation_field: Option<String>,
    /// Sprints field
    pub sprints_field: Option<String>,
    /// Comma-separated extra display fields
    pub extra_custom_fields: Option<String>,
}

/// User settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// State field name
    pub state_field: Option<String>,
    /// Type field name
    pub type_field: Option<String>,
    /// Assignee field name
    pub assignee_field: Option<String>,
    /// Start date field name
    pub start_date_field: Option<String>,
    /// Due date field name
    pub due_date_field: Option<String>,
    /// Estimation field name
    pub estimation_field: Option<String>,
    /// Sprints field name
    pub sprints_field: Option<String>,
    /// Comma-separated extra display fields
    pub extra_custom_fields: Option<String>,
    /// Relation spec for upstream links
    pub upstream_relations: Option<String>,
    /// Relation spec for downstream links
    pub downstream_relations: Option<String>,
    /// Traverse dependencies right after loading the root
    pub auto_load_deps: bool,
    /// Lay the graph out top-down by depth
    pub use_hierarchical_layout: bool,
    /// Largest depth any discovered issue may have
    pub max_recursion_depth: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            state_field: Some("State".to_string()),
            type_field: Some("Type".to_string()),
            assignee_field: Some("Assignee".to_string()),
            start_date_field: None,
            due_date_field: Some("Due Date".to_string()),
            estimation_field: None,
            sprints_field: None,
            extra_custom_fields: None,
            upstream_relations: Some("OUTWARD:Depend, OUTWARD:Subtask".to_string()),
            downstream_relations: Some("INWARD:Depend, INWARD:Subtask".to_string()),
            auto_load_deps: true,
            use_hierarchical_layout: false,
            max_recursion_depth: DEFAULT_MAX_RECURSION_DEPTH,
        }
    }
}

impl Settings {
    /// Load settings from a file.
    ///
    /// Returns the defaults if the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if the file cannot be read, `Error::Json` or
    /// `ConfigError::Yaml` if it cannot be parsed.
    pub async fn load(path: &Path) -> Result<Self> {
        if !fs::try_exists(path).await? {
            tracing::debug!(path = %path.display(), "No settings file, using defaults");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).await?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let settings: Self = if is_json {
            serde_json::from_str(&content)?
        } else {
            serde_yaml::from_str(&content).map_err(ConfigError::Yaml)?
        };
        Ok(settings)
    }

    /// Apply environment overrides.
    #[must_use]
    pub fn apply_env(self) -> Self {
        let value = std::env::var(MAX_DEPTH_ENV).ok();
        self.with_max_depth_override(value.as_deref())
    }

    /// Override `maxRecursionDepth` from a raw value; invalid values are ignored.
    #[must_use]
    pub fn with_max_depth_override(mut self, value: Option<&str>) -> Self {
        if let Some(raw) = value {
            match raw.trim().parse::<u32>() {
                Ok(depth) => self.max_recursion_depth = depth,
                Err(_) => tracing::warn!(
                    "Invalid {} value '{}', using {}",
                    MAX_DEPTH_ENV,
                    raw,
                    self.max_recursion_depth
                ),
            }
        }
        self
    }

    /// Relation rules built from the relation specs.
    pub fn relations(&self) -> Relations {
        Relations::parse(
            self.upstream_relations.as_deref(),
            self.downstream_relations.as_deref(),
        )
    }

    /// Field names used by extraction.
    pub fn field_settings(&self) -> FieldSettings {
        FieldSettings {
            state_field: self.state_field.clone(),
            type_field: self.type_field.clone(),
            assignee_field: self.assignee_field.clone(),
            start_date_field: self.start_date_field.clone(),
            due_date_field: self.due_date_field.clone(),
            estimation_field: self.estimation_field.clone(),
            sprints_field: self.sprints_field.clone(),
            extra_custom_fields: self.extra_custom_fields.clone(),
        }
    }

    /// Reject relation specs containing entries that can never match.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` naming the first offending key.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        let specs = [
            ("upstreamRelations", &self.upstream_relations),
            ("downstreamRelations", &self.downstream_relations),
        ];
        for (key, spec) in specs {
            let rules = crate::relations::parse_relation_spec(spec.as_deref());
            if let Some(rule) = rules.iter().find(|rule| !rule.is_valid()) {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: format!(
                        "'{rule}' is not of the form <INWARD|OUTWARD|BOTH>:<link type>"
                    ),
                });
            }
        }
        Ok(())
    }
}

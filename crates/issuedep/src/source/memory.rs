//! In-memory issue source.
//!
//! Serves tracker responses held in RAM. The data can be assembled in code
//! with the builder methods or loaded from a JSON snapshot file:
//!
//! ```json
//! {
//!   "issues": [ { "id": "2-1", "idReadable": "PROJ-1", "summary": "...", "customFields": [] } ],
//!   "links": { "2-1": [ { "direction": "OUTWARD", "linkType": { "name": "Subtask" }, "issues": [] } ] },
//!   "fields": { "State": { "name": "State", "values": {} } }
//! }
//! ```
//!
//! Each fetch is counted, so tests can check how often the traversal hit the
//! source. Fetches for issues marked with [`InMemorySource::failing_on`]
//! return [`Error::Fetch`].

use super::IssueSource;
use super::raw::{RawIssue, RawIssueLink, RawLinkType};
use crate::domain::{DirectionType, FieldInfoField, IssueId};
use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Serialized form of an [`InMemorySource`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Issue core records
    #[serde(default)]
    pub issues: Vec<RawIssue>,

    /// Link lists by issue id
    #[serde(default)]
    pub links: HashMap<IssueId, Vec<RawIssueLink>>,

    /// Field metadata by field name
    #[serde(default)]
    pub fields: HashMap<String, FieldInfoField>,
}

/// Issue source backed by in-memory tracker responses.
#[derive(Debug, Default)]
pub struct InMemorySource {
    issues: HashMap<IssueId, RawIssue>,
    links: HashMap<IssueId, Vec<RawIssueLink>>,
    fields: HashMap<String, FieldInfoField>,
    failing: HashSet<IssueId>,
    latency: Option<Duration>,
    core_fetches: AtomicUsize,
    link_fetches: AtomicUsize,
}

impl InMemorySource {
    /// Create an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a source from a snapshot.
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        Self {
            issues: snapshot
                .issues
                .into_iter()
                .map(|issue| (issue.id.clone(), issue))
                .collect(),
            links: snapshot.links,
            fields: snapshot.fields,
            ..Self::default()
        }
    }

    /// Load a source from a JSON snapshot file.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if the file cannot be read and `Error::Json` if it
    /// is not a valid snapshot.
    pub async fn load(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        let snapshot: Snapshot = serde_json::from_str(&content)?;
        tracing::debug!(
            path = %path.display(),
            issues = snapshot.issues.len(),
            "Loaded issue snapshot"
        );
        Ok(Self::from_snapshot(snapshot))
    }

    /// Dump the served data as a snapshot.
    pub fn snapshot(&self) -> Snapshot {
        let mut issues: Vec<RawIssue> = self.issues.values().cloned().collect();
        issues.sort_by(|a, b| a.id.cmp(&b.id));
        Snapshot {
            issues,
            links: self.links.clone(),
            fields: self.fields.clone(),
        }
    }

    /// Add or replace an issue record.
    #[must_use]
    pub fn with_issue(mut self, issue: RawIssue) -> Self {
        self.issues.insert(issue.id.clone(), issue);
        self
    }

    /// Set the link list of an issue.
    #[must_use]
    pub fn with_links(mut self, id: impl Into<IssueId>, links: Vec<RawIssueLink>) -> Self {
        self.links.insert(id.into(), links);
        self
    }

    /// Add field metadata.
    #[must_use]
    pub fn with_field(mut self, field: FieldInfoField) -> Self {
        self.fields.insert(field.name.clone(), field);
        self
    }

    /// Make every fetch for `id` fail.
    #[must_use]
    pub fn failing_on(mut self, id: impl Into<IssueId>) -> Self {
        self.failing.insert(id.into());
        self
    }

    /// Delay every fetch by `latency`.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Link `from` to `to`, recording the relation on both ends.
    ///
    /// `direction` is the direction seen from `from`; `to` gets the inverse.
    /// Issues that have no record yet get a bare one.
    #[must_use]
    pub fn with_relation(
        mut self,
        from: impl Into<IssueId>,
        to: impl Into<IssueId>,
        link_type: &RawLinkType,
        direction: DirectionType,
    ) -> Self {
        let from = from.into();
        let to = to.into();
        let from_record = self.record_or_bare(&from);
        let to_record = self.record_or_bare(&to);

        self.push_link(&from, link_type, direction, to_record);
        self.push_link(&to, link_type, direction.inverse(), from_record);
        self
    }

    fn record_or_bare(&mut self, id: &IssueId) -> RawIssue {
        self.issues
            .entry(id.clone())
            .or_insert_with(|| RawIssue {
                id: id.clone(),
                id_readable: Some(id.to_string()),
                summary: String::new(),
                resolved: false,
                is_draft: false,
                custom_fields: Vec::new(),
            })
            .clone()
    }

    fn push_link(
        &mut self,
        owner: &IssueId,
        link_type: &RawLinkType,
        direction: DirectionType,
        target: RawIssue,
    ) {
        let links = self.links.entry(owner.clone()).or_default();
        let group = links
            .iter_mut()
            .find(|link| link.direction == direction && link.link_type.name == link_type.name);
        match group {
            Some(group) => group.issues.push(target),
            None => links.push(RawIssueLink {
                id: None,
                direction,
                link_type: link_type.clone(),
                issues: vec![target],
            }),
        }
    }

    /// Number of core fetches served so far.
    pub fn core_fetches(&self) -> usize {
        self.core_fetches.load(Ordering::SeqCst)
    }

    /// Number of link fetches served so far.
    pub fn link_fetches(&self) -> usize {
        self.link_fetches.load(Ordering::SeqCst)
    }

    async fn before_fetch(&self, id: &IssueId) -> Result<()> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if self.failing.contains(id) {
            return Err(Error::Fetch {
                id: id.clone(),
                message: "simulated failure".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl IssueSource for InMemorySource {
    async fn fetch_issue_core(&self, id: &IssueId) -> Result<RawIssue> {
        self.core_fetches.fetch_add(1, Ordering::SeqCst);
        self.before_fetch(id).await?;
        self.issues
            .get(id)
            .cloned()
            .ok_or_else(|| Error::IssueNotFound(id.clone()))
    }

    async fn fetch_issue_links(&self, id: &IssueId) -> Result<Vec<RawIssueLink>> {
        self.link_fetches.fetch_add(1, Ordering::SeqCst);
        self.before_fetch(id).await?;
        match self.links.get(id) {
            Some(links) => Ok(links.clone()),
            None if self.issues.contains_key(id) => Ok(Vec::new()),
            None => Err(Error::IssueNotFound(id.clone())),
        }
    }

    async fn fetch_field_metadata(&self, name: &str) -> Result<Option<FieldInfoField>> {
        Ok(self.fields.get(name).cloned())
    }

    async fn resolve_id(&self, key: &str) -> Result<IssueId> {
        let key = key.trim();
        let id = IssueId::new(key);
        if self.issues.contains_key(&id) {
            return Ok(id);
        }
        let by_readable = self.issues.values().find(|issue| {
            issue
                .id_readable
                .as_deref()
                .is_some_and(|readable| readable.eq_ignore_ascii_case(key))
        });
        Ok(by_readable.map_or(id, |issue| issue.id.clone()))
    }
}

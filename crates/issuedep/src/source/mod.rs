//! Issue source abstraction.
//!
//! The traversal engine never talks to the tracker directly. It goes through
//! the [`IssueSource`] trait, which provides the three remote queries the
//! graph needs:
//!
//! - **Core**: one issue record with its custom fields
//! - **Links**: the link list of one issue, grouped by link type
//! - **Field metadata**: the legal values of a classification field
//!
//! # Implementations
//!
//! - [`memory::InMemorySource`]: issues held in RAM, built in code or loaded
//!   from a JSON snapshot of tracker responses
//!
//! # Test Utilities
//!
//! [`MockSource`] is available under `#[cfg(test)]` or with the `test-util`
//! feature. It serves a single issue without links.
//!
//! ```rust,ignore
//! use issuedep::source::{IssueSource, MockSource};
//!
//! #[tokio::test]
//! async fn test_with_mock_source() {
//!     let source: Box<dyn IssueSource> = Box::new(MockSource::new());
//!     // Use source in tests...
//! }
//! ```

use crate::domain::{FieldInfoField, IssueId};
use crate::error::Result;
use async_trait::async_trait;

pub mod memory;
pub mod raw;

pub use memory::{InMemorySource, Snapshot};
pub use raw::{RawCustomField, RawIssue, RawIssueLink, RawLinkType};

/// Remote queries used to build the dependency graph.
///
/// Implementations must be `Send + Sync`: the traversal issues concurrent
/// fetches for sibling issues from one shared source.
///
/// # Error Handling
///
/// - `IssueNotFound`: the tracker does not know the issue
/// - `Fetch`: the request failed for any other reason
#[async_trait]
pub trait IssueSource: Send + Sync {
    /// Fetch one issue with its custom fields.
    async fn fetch_issue_core(&self, id: &IssueId) -> Result<RawIssue>;

    /// Fetch the links of one issue.
    ///
    /// Every entry groups the linked issues of one link type and direction.
    async fn fetch_issue_links(&self, id: &IssueId) -> Result<Vec<RawIssueLink>>;

    /// Fetch the legal values of the field called `name`.
    ///
    /// Returns `None` if the tracker has no such enumerated field.
    async fn fetch_field_metadata(&self, name: &str) -> Result<Option<FieldInfoField>>;

    /// Map a user-supplied key, internal or readable id, to an internal id.
    ///
    /// The default treats every key as an internal id.
    async fn resolve_id(&self, key: &str) -> Result<IssueId> {
        Ok(IssueId::new(key.trim()))
    }
}

/// The id served by [`MockSource`].
#[cfg(any(test, feature = "test-util"))]
pub const MOCK_ISSUE_ID: &str = "0-1";

/// Stateless [`IssueSource`] serving one issue without links.
///
/// - `fetch_issue_core`: `Some` only for [`MOCK_ISSUE_ID`]
/// - `fetch_issue_links`: always empty
/// - `fetch_field_metadata`: always `None`
///
/// Use [`InMemorySource`] when a test needs real link structure.
#[cfg(any(test, feature = "test-util"))]
#[derive(Debug, Clone, Copy, Default)]
#[non_exhaustive]
pub struct MockSource;

#[cfg(any(test, feature = "test-util"))]
impl MockSource {
    /// Create a new MockSource instance.
    pub fn new() -> Self {
        Self
    }

    /// The issue record served for [`MOCK_ISSUE_ID`].
    pub fn create_test_issue() -> RawIssue {
        RawIssue {
            id: IssueId::new(MOCK_ISSUE_ID),
            id_readable: Some("MOCK-1".to_string()),
            summary: "Mock issue".to_string(),
            resolved: false,
            is_draft: false,
            custom_fields: Vec::new(),
        }
    }
}

#[cfg(any(test, feature = "test-util"))]
#[async_trait]
impl IssueSource for MockSource {
    async fn fetch_issue_core(&self, id: &IssueId) -> Result<RawIssue> {
        if id.as_str() == MOCK_ISSUE_ID {
            Ok(Self::create_test_issue())
        } else {
            Err(crate::error::Error::IssueNotFound(id.clone()))
        }
    }

    async fn fetch_issue_links(&self, _id: &IssueId) -> Result<Vec<RawIssueLink>> {
        Ok(vec![])
    }

    async fn fetch_field_metadata(&self, _name: &str) -> Result<Option<FieldInfoField>> {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[tokio::test]
    async fn test_trait_object_usage() {
        let source: Box<dyn IssueSource> = Box::new(MockSource::new());

        let issue = source
            .fetch_issue_core(&IssueId::new(MOCK_ISSUE_ID))
            .await
            .unwrap();
        assert_eq!(issue.display_id(), "MOCK-1");
    }

    #[tokio::test]
    async fn test_mock_unknown_issue() {
        let source = MockSource::new();
        let result = source.fetch_issue_core(&IssueId::new("0-99")).await;
        assert!(matches!(result, Err(Error::IssueNotFound(_))));
    }

    #[tokio::test]
    async fn test_mock_empty_queries() {
        let source = MockSource::new();
        let id = IssueId::new(MOCK_ISSUE_ID);
        assert!(source.fetch_issue_links(&id).await.unwrap().is_empty());
        assert!(source.fetch_field_metadata("State").await.unwrap().is_none());
    }
}

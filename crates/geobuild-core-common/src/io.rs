//! Collaborator traits for loading source tables and persisting built objects.
//!
//! Builders never talk to storage themselves. The operations layer loads
//! tables through a [`TableSource`] and hands projected payloads to an
//! [`ObjectStore`].

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tabular_csv::{Table, TableResult};

/// Trait for loading tables from source handles (file paths, keys, ...).
pub trait TableSource: Send + Sync {
    /// Loads the table identified by `handle`.
    ///
    /// # Errors
    ///
    /// Returns [`tabular_csv::TableError::NotFound`] for missing sources and
    /// [`tabular_csv::TableError::Malformed`] for unparsable ones.
    fn load(&self, handle: &str) -> TableResult<Table>;
}

/// How an object is addressed in a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectRef {
    /// Store-assigned identifier.
    Id(String),
    /// Workspace-relative object path.
    Path(String),
}

impl std::fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ObjectRef::Id(id) => write!(f, "id {id}"),
            ObjectRef::Path(path) => write!(f, "path {path}"),
        }
    }
}

/// Result of a successful `create_object` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedObject {
    pub id: String,
    pub version_id: String,
}

/// Metadata returned alongside downloaded content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectMetadata {
    pub id: String,
    pub name: Option<String>,
    pub path: String,
    pub schema_id: Option<String>,
    pub version_id: String,
}

/// A downloaded object version.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadedObject {
    pub metadata: ObjectMetadata,
    pub content: Value,
}

/// Trait for the object store that persists built objects.
///
/// Implementations own their concurrency discipline and retry policy;
/// callers issue at most one `create_object` per build.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Stores `content` at `path`, creating a new version when the path exists.
    ///
    /// # Arguments
    ///
    /// * `path` - Workspace-relative object path (e.g. `/drillholes/collection.json`)
    /// * `content` - The projected object payload
    async fn create_object(&self, path: &str, content: Value) -> Result<CreatedObject>;

    /// Downloads an object by id or path; `version` selects a specific
    /// version, `None` the latest.
    async fn download_object(
        &self,
        object: &ObjectRef,
        version: Option<&str>,
    ) -> Result<DownloadedObject>;
}

//! [`ObjectStore`] implementations that need no remote service.
//!
//! [`LocalObjectStore`] keeps versioned JSON envelopes in a directory;
//! [`MemoryObjectStore`] keeps them in memory for tests and embedding.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::Result;
use async_trait::async_trait;
use geobuild_core_common::{CreatedObject, DownloadedObject, ObjectMetadata, ObjectRef, ObjectStore};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::StoreError;

/// Path to id mapping plus the version history of every object.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct StoreIndex {
    objects: Vec<IndexEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct IndexEntry {
    id: String,
    path: String,
    versions: Vec<String>,
}

impl StoreIndex {
    /// Records a new version at `path`, creating the object on first use.
    fn add_version(&mut self, path: &str) -> (String, String) {
        if let Some(entry) = self.objects.iter_mut().find(|e| e.path == path) {
            let version = (entry.versions.len() + 1).to_string();
            entry.versions.push(version.clone());
            return (entry.id.clone(), version);
        }
        let id = Uuid::new_v4().to_string();
        let version = "1".to_string();
        self.objects.push(IndexEntry {
            id: id.clone(),
            path: path.to_string(),
            versions: vec![version.clone()],
        });
        (id, version)
    }

    /// Id and version addressed by `object` and `version` (latest when `None`).
    fn locate(&self, object: &ObjectRef, version: Option<&str>) -> Result<(String, String), StoreError> {
        let not_found = || StoreError::NotFound {
            object: object.to_string(),
            version: version.map(str::to_string),
        };
        let entry = self
            .objects
            .iter()
            .find(|e| match object {
                ObjectRef::Id(id) => &e.id == id,
                ObjectRef::Path(path) => e.path == normalize_path(path),
            })
            .ok_or_else(not_found)?;
        let version = match version {
            Some(v) => entry.versions.iter().find(|known| *known == v),
            None => entry.versions.last(),
        }
        .ok_or_else(not_found)?;
        Ok((entry.id.clone(), version.clone()))
    }
}

/// Object paths are stored with a single leading `/`.
fn normalize_path(path: &str) -> String {
    format!("/{}", path.trim().trim_start_matches('/'))
}

fn metadata(id: String, path: String, version_id: String, content: &Value) -> ObjectMetadata {
    ObjectMetadata {
        id,
        name: content.get("name").and_then(Value::as_str).map(str::to_string),
        path,
        schema_id: content.get("schema").and_then(Value::as_str).map(str::to_string),
        version_id,
    }
}

/// Directory-backed object store.
///
/// Layout: `index.json` plus `objects/<id>/<version>.json`, each holding
/// the object metadata and content.
#[derive(Debug)]
pub struct LocalObjectStore {
    root: PathBuf,
    lock: Mutex<()>,
}

impl LocalObjectStore {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn index_path(&self) -> PathBuf {
        self.root.join("index.json")
    }

    fn version_path(&self, id: &str, version: &str) -> PathBuf {
        self.root.join("objects").join(id).join(format!("{version}.json"))
    }

    async fn read_index(&self) -> Result<StoreIndex, StoreError> {
        let path = self.index_path();
        match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| access(&path, e)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(StoreIndex::default()),
            Err(e) => Err(access(&path, e)),
        }
    }

    async fn write_json<T: Serialize>(&self, path: &Path, value: &T) -> Result<(), StoreError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| access(parent, e))?;
        }
        let bytes = serde_json::to_vec_pretty(value).map_err(|e| access(path, e))?;
        let staging = path.with_extension("json.tmp");
        tokio::fs::write(&staging, bytes)
            .await
            .map_err(|e| access(&staging, e))?;
        tokio::fs::rename(&staging, path)
            .await
            .map_err(|e| access(path, e))
    }
}

fn access(path: &Path, source: impl std::error::Error + Send + Sync + 'static) -> StoreError {
    StoreError::Access {
        path: path.to_path_buf(),
        source: Box::new(source),
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn create_object(&self, path: &str, content: Value) -> Result<CreatedObject> {
        let _guard = self.lock.lock().await;
        let path = normalize_path(path);

        let mut index = self.read_index().await?;
        let (id, version_id) = index.add_version(&path);
        let envelope = DownloadedObject {
            metadata: metadata(id.clone(), path.clone(), version_id.clone(), &content),
            content,
        };

        self.write_json(&self.version_path(&id, &version_id), &envelope)
            .await?;
        self.write_json(&self.index_path(), &index).await?;

        info!("Stored {path} as object {id} version {version_id}");
        Ok(CreatedObject { id, version_id })
    }

    async fn download_object(
        &self,
        object: &ObjectRef,
        version: Option<&str>,
    ) -> Result<DownloadedObject> {
        let index = self.read_index().await?;
        let (id, version_id) = index.locate(object, version)?;
        let path = self.version_path(&id, &version_id);
        debug!("Reading {object} version {version_id} from {}", path.display());

        let bytes = tokio::fs::read(&path).await.map_err(|e| access(&path, e))?;
        let envelope = serde_json::from_slice(&bytes).map_err(|e| access(&path, e))?;
        Ok(envelope)
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    index: StoreIndex,
    versions: HashMap<(String, String), DownloadedObject>,
}

/// In-memory object store.
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    state: Mutex<MemoryState>,
    creates: AtomicUsize,
}

impl MemoryObjectStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `create_object` calls received.
    #[must_use]
    pub fn create_count(&self) -> usize {
        self.creates.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn create_object(&self, path: &str, content: Value) -> Result<CreatedObject> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock().await;
        let path = normalize_path(path);

        let (id, version_id) = state.index.add_version(&path);
        let envelope = DownloadedObject {
            metadata: metadata(id.clone(), path, version_id.clone(), &content),
            content,
        };
        state
            .versions
            .insert((id.clone(), version_id.clone()), envelope);
        Ok(CreatedObject { id, version_id })
    }

    async fn download_object(
        &self,
        object: &ObjectRef,
        version: Option<&str>,
    ) -> Result<DownloadedObject> {
        let state = self.state.lock().await;
        let key = state.index.locate(object, version)?;
        let envelope = state.versions.get(&key).cloned().ok_or_else(|| StoreError::NotFound {
            object: object.to_string(),
            version: Some(key.1.clone()),
        })?;
        Ok(envelope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_local_store_versions() {
        let dir = TempDir::new().unwrap();
        let store = LocalObjectStore::new(dir.path());

        let first = store
            .create_object("drillholes/dh.json", json!({"name": "v1", "schema": "/s"}))
            .await
            .unwrap();
        let second = store
            .create_object("/drillholes/dh.json", json!({"name": "v2", "schema": "/s"}))
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(first.version_id, "1");
        assert_eq!(second.version_id, "2");

        let latest = store
            .download_object(&ObjectRef::Path("/drillholes/dh.json".into()), None)
            .await
            .unwrap();
        assert_eq!(latest.content["name"], "v2");
        assert_eq!(latest.metadata.schema_id.as_deref(), Some("/s"));

        let older = store
            .download_object(&ObjectRef::Id(first.id.clone()), Some("1"))
            .await
            .unwrap();
        assert_eq!(older.metadata.name.as_deref(), Some("v1"));
        assert_eq!(older.metadata.path, "/drillholes/dh.json");
    }

    #[tokio::test]
    async fn test_local_store_persists_across_instances() {
        let dir = TempDir::new().unwrap();
        let created = LocalObjectStore::new(dir.path())
            .create_object("a.json", json!({"name": "a"}))
            .await
            .unwrap();

        let reopened = LocalObjectStore::new(dir.path());
        let object = reopened
            .download_object(&ObjectRef::Id(created.id), None)
            .await
            .unwrap();
        assert_eq!(object.content, json!({"name": "a"}));
    }

    #[tokio::test]
    async fn test_unknown_object_is_not_found() {
        let dir = TempDir::new().unwrap();
        let store = LocalObjectStore::new(dir.path());
        let err = store
            .download_object(&ObjectRef::Path("/missing.json".into()), None)
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<StoreError>(),
            Some(StoreError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_memory_store_counts_creates() {
        let store = MemoryObjectStore::new();
        let created = store.create_object("x.json", json!({})).await.unwrap();
        assert_eq!(store.create_count(), 1);

        let err = store
            .download_object(&ObjectRef::Id(created.id), Some("7"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("version 7"));
    }
}

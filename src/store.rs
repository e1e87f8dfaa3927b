//! Blob store capability.
//!
//! Activities never talk to a module-level storage client; they receive a
//! [`BlobStore`] handle as an explicit capability. That keeps every activity
//! testable against [`MemoryBlobStore`] and lets the host decide once, at
//! startup, where blobs actually live.
//!
//! Two implementations ship with the crate:
//!
//! * [`FsBlobStore`] — containers are subdirectories of a storage root on
//!   the local filesystem. Object names may contain `/`, which maps to
//!   nested directories.
//! * [`MemoryBlobStore`] — a map behind a mutex, for tests and embedding.

use crate::error::ActivityError;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::debug;

/// Name and size of one stored object, as reported by [`BlobStore::list`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobInfo {
    pub name: String,
    pub size: u64,
}

/// Capability handle for reading and writing named objects in containers.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Read the full contents of `container/name`.
    async fn get(&self, container: &str, name: &str) -> Result<Vec<u8>, ActivityError>;

    /// Write `data` to `container/name`, replacing any existing object.
    async fn put(&self, container: &str, name: &str, data: &[u8]) -> Result<(), ActivityError>;

    /// List every object in `container`, in name order. An absent container
    /// lists as empty rather than erroring, matching a store where
    /// containers spring into being on first write.
    async fn list(&self, container: &str) -> Result<Vec<BlobInfo>, ActivityError>;
}

// ── Filesystem store ─────────────────────────────────────────────────────

/// Containers as subdirectories of a root path.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn object_path(&self, container: &str, name: &str) -> PathBuf {
        self.root.join(container).join(name)
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn get(&self, container: &str, name: &str) -> Result<Vec<u8>, ActivityError> {
        let path = self.object_path(container, name);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(ActivityError::ObjectNotFound {
                    container: container.to_string(),
                    name: name.to_string(),
                })
            }
            Err(e) => Err(ActivityError::Store {
                detail: format!("read '{}': {e}", path.display()),
            }),
        }
    }

    async fn put(&self, container: &str, name: &str, data: &[u8]) -> Result<(), ActivityError> {
        let path = self.object_path(container, name);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ActivityError::Store {
                    detail: format!("create '{}': {e}", parent.display()),
                })?;
        }

        // Atomic write: temp file in the same directory, then rename.
        // `.tmp` is appended to the full object name, not swapped for its
        // extension, so dot-differing siblings never share a temp path.
        let mut tmp_os = path.clone().into_os_string();
        tmp_os.push(".tmp");
        let tmp_path = PathBuf::from(tmp_os);
        tokio::fs::write(&tmp_path, data)
            .await
            .map_err(|e| ActivityError::Store {
                detail: format!("write '{}': {e}", tmp_path.display()),
            })?;
        tokio::fs::rename(&tmp_path, &path)
            .await
            .map_err(|e| ActivityError::Store {
                detail: format!("rename to '{}': {e}", path.display()),
            })?;

        debug!(container, name, bytes = data.len(), "stored object");
        Ok(())
    }

    async fn list(&self, container: &str) -> Result<Vec<BlobInfo>, ActivityError> {
        let base = self.root.join(container);
        if !base.exists() {
            return Ok(Vec::new());
        }

        let mut blobs = Vec::new();
        let mut pending = vec![base.clone()];
        while let Some(dir) = pending.pop() {
            let mut entries =
                tokio::fs::read_dir(&dir)
                    .await
                    .map_err(|e| ActivityError::Store {
                        detail: format!("list '{}': {e}", dir.display()),
                    })?;
            while let Some(entry) = entries.next_entry().await.map_err(|e| ActivityError::Store {
                detail: format!("list '{}': {e}", dir.display()),
            })? {
                let path = entry.path();
                if path.is_dir() {
                    pending.push(path);
                    continue;
                }
                let meta = entry.metadata().await.map_err(|e| ActivityError::Store {
                    detail: format!("stat '{}': {e}", path.display()),
                })?;
                blobs.push(BlobInfo {
                    name: relative_name(&base, &path),
                    size: meta.len(),
                });
            }
        }

        blobs.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(blobs)
    }
}

/// Container-relative object name with `/` separators on every platform.
fn relative_name(base: &Path, path: &Path) -> String {
    path.strip_prefix(base)
        .unwrap_or(path)
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

// ── In-memory store ──────────────────────────────────────────────────────

/// Map-backed store for tests and embedded use.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    objects: Mutex<BTreeMap<(String, String), Vec<u8>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn get(&self, container: &str, name: &str) -> Result<Vec<u8>, ActivityError> {
        let objects = self.objects.lock().await;
        objects
            .get(&(container.to_string(), name.to_string()))
            .cloned()
            .ok_or_else(|| ActivityError::ObjectNotFound {
                container: container.to_string(),
                name: name.to_string(),
            })
    }

    async fn put(&self, container: &str, name: &str, data: &[u8]) -> Result<(), ActivityError> {
        let mut objects = self.objects.lock().await;
        objects.insert((container.to_string(), name.to_string()), data.to_vec());
        Ok(())
    }

    async fn list(&self, container: &str) -> Result<Vec<BlobInfo>, ActivityError> {
        let objects = self.objects.lock().await;
        Ok(objects
            .iter()
            .filter(|((c, _), _)| c == container)
            .map(|((_, name), data)| BlobInfo {
                name: name.clone(),
                size: data.len() as u64,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_store_roundtrip_and_missing() {
        let store = MemoryBlobStore::new();
        store.put("input", "a.pdf", b"pdf bytes").await.unwrap();
        assert_eq!(store.get("input", "a.pdf").await.unwrap(), b"pdf bytes");

        let err = store.get("input", "b.pdf").await.unwrap_err();
        assert!(matches!(err, ActivityError::ObjectNotFound { .. }));
    }

    #[tokio::test]
    async fn memory_store_list_is_scoped_to_container() {
        let store = MemoryBlobStore::new();
        store.put("input", "a.pdf", b"1").await.unwrap();
        store.put("output", "a.txt", b"2").await.unwrap();

        let listed = store.list("input").await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "a.pdf");
        assert_eq!(listed[0].size, 1);
    }

    #[tokio::test]
    async fn fs_store_roundtrip_with_nested_names() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::new(dir.path());

        store.put("input", "folder/report.pdf", b"%PDF").await.unwrap();
        assert_eq!(
            store.get("input", "folder/report.pdf").await.unwrap(),
            b"%PDF"
        );

        let listed = store.list("input").await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "folder/report.pdf");
        assert_eq!(listed[0].size, 4);
    }

    #[tokio::test]
    async fn concurrent_puts_of_dot_differing_names_do_not_mix() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::new(dir.path());

        for _ in 0..8 {
            let (a, b) = tokio::join!(
                store.put("input", "a.pdf", b"pdf bytes"),
                store.put("input", "a.txt", b"txt bytes")
            );
            a.unwrap();
            b.unwrap();
            assert_eq!(store.get("input", "a.pdf").await.unwrap(), b"pdf bytes");
            assert_eq!(store.get("input", "a.txt").await.unwrap(), b"txt bytes");
        }
    }

    #[tokio::test]
    async fn fs_store_missing_object_and_empty_container() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::new(dir.path());

        let err = store.get("input", "nope.pdf").await.unwrap_err();
        assert!(matches!(err, ActivityError::ObjectNotFound { .. }));

        assert!(store.list("input").await.unwrap().is_empty());
    }
}

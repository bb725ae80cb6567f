//! Local filesystem implementation of `ObjectStore`.
//!
//! Object keys map directly onto paths below `root`; the directory is
//! expected to be served statically under `public_url`.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use domains::{DomainError, DomainResult, ObjectStore};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

pub struct LocalObjectStore {
    /// Root directory for all blobs (e.g. "./data/objects")
    root: PathBuf,
    /// Public URL prefix (e.g. "/static/objects")
    public_url: String,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>, public_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_url: public_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Resolves `key` below the root, refusing anything that could escape it.
    fn path_for(&self, key: &str) -> DomainResult<PathBuf> {
        let relative = Path::new(key);
        let safe = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if key.is_empty() || !safe {
            return Err(DomainError::Storage(format!("invalid object key {key}")));
        }
        Ok(self.root.join(relative))
    }
}

async fn write_then_rename(temp: &Path, target: &Path, data: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(temp).await?;
    file.write_all(data).await?;
    file.sync_all().await?;
    drop(file);
    fs::rename(temp, target).await
}

fn io_err(key: &str, e: std::io::Error) -> DomainError {
    DomainError::Storage(format!("{key}: {e}"))
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    /// Writes to a temp file and renames it over the target, so a failed
    /// write never replaces an existing blob.
    async fn put(&self, key: &str, data: Bytes, _content_type: &str) -> DomainResult<()> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| io_err(key, e))?;
        }

        let temp = path.with_extension(format!("{}.tmp", uuid::Uuid::new_v4().simple()));
        if let Err(e) = write_then_rename(&temp, &path, &data).await {
            // the temp file may or may not exist depending on where it failed
            let _ = fs::remove_file(&temp).await;
            return Err(io_err(key, e));
        }
        debug!(%key, size = data.len(), "blob stored");
        Ok(())
    }

    async fn delete(&self, key: &str) -> DomainResult<()> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_err(key, e)),
        }
    }

    async fn exists(&self, key: &str) -> DomainResult<bool> {
        let path = self.path_for(key)?;
        fs::try_exists(&path).await.map_err(|e| io_err(key, e))
    }

    fn public_url(&self, key: &str) -> String {
        domains::public_link(&self.public_url, key)
    }
}

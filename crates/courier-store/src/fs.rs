//! Local-disk object store.
//!
//! Layout: `<root>/<account>/<container>/<blob-name>`. Blob names containing
//! `/` become nested directories, mirroring virtual directories in a blob
//! service.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use courier_identity::Credential;
use courier_types::AccountEndpoint;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::error::{StoreError, StoreResult};
use crate::traits::{ObjectStore, StoreConnector};

/// Object store for one account, backed by a directory.
#[derive(Clone, Debug)]
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn container_path(&self, container: &str) -> StoreResult<PathBuf> {
        if container.is_empty() || container.contains('/') || is_dot_segment(container) {
            return Err(StoreError::InvalidName(format!("container {container:?}")));
        }
        Ok(self.root.join(container))
    }

    fn blob_path(&self, container: &str, name: &str) -> StoreResult<PathBuf> {
        let mut path = self.container_path(container)?;
        for segment in name.split('/') {
            if segment.is_empty() || is_dot_segment(segment) {
                return Err(StoreError::InvalidName(format!("blob {name:?}")));
            }
            path.push(segment);
        }
        Ok(path)
    }

    async fn require_container(&self, container: &str) -> StoreResult<PathBuf> {
        let path = self.container_path(container)?;
        if !tokio::fs::try_exists(&path).await? {
            return Err(StoreError::ContainerNotFound(container.to_string()));
        }
        Ok(path)
    }
}

fn is_dot_segment(segment: &str) -> bool {
    segment == "." || segment == ".."
}

/// Write `data` to a freshly created file, removing the file again if the
/// write fails so the name stays free.
async fn write_or_discard<W>(path: &Path, mut file: W, data: &[u8]) -> StoreResult<()>
where
    W: AsyncWrite + Unpin,
{
    let written = async {
        file.write_all(data).await?;
        file.flush().await
    }
    .await;
    if let Err(e) = written {
        drop(file);
        if let Err(cleanup) = tokio::fs::remove_file(path).await {
            tracing::warn!(path = %path.display(), error = %cleanup, "partial blob not removed");
        }
        return Err(e.into());
    }
    Ok(())
}

fn blob_not_found(container: &str, name: &str) -> StoreError {
    StoreError::BlobNotFound {
        container: container.to_string(),
        name: name.to_string(),
    }
}

#[async_trait]
impl ObjectStore for FsObjectStore {
    async fn put_blob(&self, container: &str, name: &str, data: Bytes) -> StoreResult<()> {
        let path = self.blob_path(container, name)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let file = match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(StoreError::BlobExists {
                    container: container.to_string(),
                    name: name.to_string(),
                });
            }
            Err(e) => return Err(e.into()),
        };
        write_or_discard(&path, file, &data).await?;
        tracing::debug!(path = %path.display(), bytes = data.len(), "blob written");
        Ok(())
    }

    async fn get_blob(&self, container: &str, name: &str) -> StoreResult<Bytes> {
        self.require_container(container).await?;
        let path = self.blob_path(container, name)?;
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(blob_not_found(container, name)),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete_blob(&self, container: &str, name: &str) -> StoreResult<()> {
        let container_path = self.require_container(container).await?;
        let path = self.blob_path(container, name)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(blob_not_found(container, name))
            }
            Err(e) => return Err(e.into()),
        }

        // Empty virtual directories vanish with their last blob.
        let mut dir = path.parent().map(Path::to_path_buf);
        while let Some(current) = dir {
            if current == container_path || tokio::fs::remove_dir(&current).await.is_err() {
                break;
            }
            dir = current.parent().map(Path::to_path_buf);
        }
        Ok(())
    }

    async fn list_blobs(&self, container: &str) -> StoreResult<Vec<String>> {
        let container_path = self.require_container(container).await?;
        let mut names = Vec::new();
        let mut pending = vec![(container_path, String::new())];
        while let Some((dir, prefix)) = pending.pop() {
            let mut entries = tokio::fs::read_dir(&dir).await?;
            while let Some(entry) = entries.next_entry().await? {
                let file_name = entry.file_name().to_string_lossy().into_owned();
                let name = if prefix.is_empty() {
                    file_name
                } else {
                    format!("{prefix}/{file_name}")
                };
                if entry.file_type().await?.is_dir() {
                    pending.push((entry.path(), name));
                } else {
                    names.push(name);
                }
            }
        }
        names.sort();
        Ok(names)
    }

    async fn delete_container(&self, container: &str) -> StoreResult<()> {
        let path = self.container_path(container)?;
        match tokio::fs::remove_dir_all(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(StoreError::ContainerNotFound(container.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Connector mapping each account to a subdirectory of `root`.
#[derive(Clone, Debug)]
pub struct FsConnector {
    root: PathBuf,
}

impl FsConnector {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl StoreConnector for FsConnector {
    fn connect(
        &self,
        endpoint: &AccountEndpoint,
        credential: &Credential,
    ) -> StoreResult<Arc<dyn ObjectStore>> {
        if credential.is_expired() {
            return Err(StoreError::AccessDenied(format!(
                "expired credential for {endpoint}"
            )));
        }
        if endpoint.account.is_empty()
            || endpoint.account.contains('/')
            || is_dot_segment(&endpoint.account)
        {
            return Err(StoreError::InvalidName(format!("account {:?}", endpoint.account)));
        }
        Ok(Arc::new(FsObjectStore::new(self.root.join(&endpoint.account))))
    }
}

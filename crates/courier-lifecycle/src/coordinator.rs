use courier_store::StoreAccess;
use courier_types::DeletionRequest;
use tracing::{debug, info};

use crate::error::LifecycleResult;

/// What a deletion request removed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeletionOutcome {
    /// The URL named a container; it was deleted with everything in it.
    ContainerDeleted { container: String },
    /// One blob was deleted, and its container too if it was the last blob.
    BlobDeleted {
        container: String,
        blob: String,
        container_deleted: bool,
    },
}

impl DeletionOutcome {
    pub fn container_deleted(&self) -> bool {
        match self {
            Self::ContainerDeleted { .. } => true,
            Self::BlobDeleted {
                container_deleted, ..
            } => *container_deleted,
        }
    }
}

/// Deletes blobs named by URL and garbage-collects emptied containers.
#[derive(Clone, Debug)]
pub struct LifecycleCoordinator {
    store: StoreAccess,
}

impl LifecycleCoordinator {
    pub fn new(store: StoreAccess) -> Self {
        Self { store }
    }

    /// Delete the blob at `blob_url`, and its container if the blob was the
    /// only one in it.
    ///
    /// The URL is parsed before any store call. All store calls for one
    /// invocation go through a single session on the account named in the
    /// URL.
    pub async fn delete_blob_and_container_if_last(
        &self,
        blob_url: &str,
    ) -> LifecycleResult<DeletionOutcome> {
        let request = DeletionRequest::parse(blob_url)?;
        let session = self.store.open(&request.endpoint()).await?;

        let Some(blob) = request.blob_name else {
            session.delete_container(&request.container).await?;
            info!(
                account = %request.account,
                container = %request.container,
                "container deleted"
            );
            return Ok(DeletionOutcome::ContainerDeleted {
                container: request.container,
            });
        };

        let count = session.list_blobs(&request.container).await?.len();
        debug!(container = %request.container, count, "blobs in container before delete");

        session.delete_blob(&request.container, &blob).await?;
        info!(container = %request.container, %blob, "blob deleted");

        let container_deleted = count == 1;
        if container_deleted {
            session.delete_container(&request.container).await?;
            info!(container = %request.container, "last blob removed, container deleted");
        }

        Ok(DeletionOutcome::BlobDeleted {
            container: request.container,
            blob,
            container_deleted,
        })
    }
}

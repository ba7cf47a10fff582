use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use courier_identity::Credential;
use courier_types::AccountEndpoint;

use crate::error::StoreResult;

/// Path-addressed blob store scoped to one storage account.
///
/// Implementations must satisfy these invariants:
/// - `put_blob` never overwrites: an existing name yields `BlobExists`.
/// - Deleting an absent blob or container yields the matching not-found error.
/// - `list_blobs` is a point-in-time snapshot; it takes no lock over the
///   container.
/// - All backend errors are propagated, never silently ignored.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Write a new blob.
    async fn put_blob(&self, container: &str, name: &str, data: Bytes) -> StoreResult<()>;

    /// Read a blob's full contents.
    async fn get_blob(&self, container: &str, name: &str) -> StoreResult<Bytes>;

    /// Delete one blob.
    async fn delete_blob(&self, container: &str, name: &str) -> StoreResult<()>;

    /// Names of all blobs currently in `container`.
    async fn list_blobs(&self, container: &str) -> StoreResult<Vec<String>>;

    /// Delete a container and everything in it.
    async fn delete_container(&self, container: &str) -> StoreResult<()>;
}

/// Builds a store client for an account, authenticated by a credential.
///
/// The returned client is used for one operation and then dropped.
pub trait StoreConnector: Send + Sync {
    fn connect(
        &self,
        endpoint: &AccountEndpoint,
        credential: &Credential,
    ) -> StoreResult<Arc<dyn ObjectStore>>;
}

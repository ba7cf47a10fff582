use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use async_trait::async_trait;
use bytes::Bytes;
use courier_identity::{Credential, StaticCredentialProvider};
use courier_types::AccountEndpoint;

use crate::error::{StoreError, StoreResult};
use crate::traits::{ObjectStore, StoreConnector};

/// One primitive call recorded by [`InMemoryObjectStore`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreOp {
    Put { container: String, name: String },
    Get { container: String, name: String },
    DeleteBlob { container: String, name: String },
    List { container: String },
    DeleteContainer { container: String },
}

type Containers = BTreeMap<String, BTreeMap<String, Bytes>>;

/// In-memory, map-based object store for one account.
///
/// Intended for tests and embedding. Containers are created implicitly by
/// the first `put_blob`. Every call is appended to an operation log.
pub struct InMemoryObjectStore {
    containers: RwLock<Containers>,
    ops: Mutex<Vec<StoreOp>>,
    unavailable: AtomicBool,
}

impl InMemoryObjectStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            containers: RwLock::new(BTreeMap::new()),
            ops: Mutex::new(Vec::new()),
            unavailable: AtomicBool::new(false),
        }
    }

    /// Insert a blob directly, bypassing the operation log.
    pub fn seed(&self, container: &str, name: &str, data: impl Into<Bytes>) {
        self.containers
            .write()
            .expect("lock poisoned")
            .entry(container.to_string())
            .or_default()
            .insert(name.to_string(), data.into());
    }

    /// Create an empty container directly.
    pub fn create_container(&self, container: &str) {
        self.containers
            .write()
            .expect("lock poisoned")
            .entry(container.to_string())
            .or_default();
    }

    /// Contents of a blob, if present.
    pub fn blob(&self, container: &str, name: &str) -> Option<Bytes> {
        self.containers
            .read()
            .expect("lock poisoned")
            .get(container)
            .and_then(|blobs| blobs.get(name).cloned())
    }

    pub fn container_exists(&self, container: &str) -> bool {
        self.containers
            .read()
            .expect("lock poisoned")
            .contains_key(container)
    }

    /// Sorted names of all blobs in `container`, empty if it does not exist.
    pub fn blob_names(&self, container: &str) -> Vec<String> {
        self.containers
            .read()
            .expect("lock poisoned")
            .get(container)
            .map(|blobs| blobs.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Every call made so far, in order.
    pub fn ops(&self) -> Vec<StoreOp> {
        self.ops.lock().expect("lock poisoned").clone()
    }

    /// Make every subsequent call fail with `Unavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn record(&self, op: StoreOp) -> StoreResult<()> {
        self.ops.lock().expect("lock poisoned").push(op);
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("in-memory store marked unavailable".into()));
        }
        Ok(())
    }
}

impl Default for InMemoryObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn put_blob(&self, container: &str, name: &str, data: Bytes) -> StoreResult<()> {
        self.record(StoreOp::Put {
            container: container.to_string(),
            name: name.to_string(),
        })?;
        let mut map = self.containers.write().expect("lock poisoned");
        let blobs = map.entry(container.to_string()).or_default();
        if blobs.contains_key(name) {
            return Err(StoreError::BlobExists {
                container: container.to_string(),
                name: name.to_string(),
            });
        }
        blobs.insert(name.to_string(), data);
        Ok(())
    }

    async fn get_blob(&self, container: &str, name: &str) -> StoreResult<Bytes> {
        self.record(StoreOp::Get {
            container: container.to_string(),
            name: name.to_string(),
        })?;
        let map = self.containers.read().expect("lock poisoned");
        let blobs = map
            .get(container)
            .ok_or_else(|| StoreError::ContainerNotFound(container.to_string()))?;
        blobs.get(name).cloned().ok_or_else(|| StoreError::BlobNotFound {
            container: container.to_string(),
            name: name.to_string(),
        })
    }

    async fn delete_blob(&self, container: &str, name: &str) -> StoreResult<()> {
        self.record(StoreOp::DeleteBlob {
            container: container.to_string(),
            name: name.to_string(),
        })?;
        let mut map = self.containers.write().expect("lock poisoned");
        let blobs = map
            .get_mut(container)
            .ok_or_else(|| StoreError::ContainerNotFound(container.to_string()))?;
        blobs
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| StoreError::BlobNotFound {
                container: container.to_string(),
                name: name.to_string(),
            })
    }

    async fn list_blobs(&self, container: &str) -> StoreResult<Vec<String>> {
        self.record(StoreOp::List {
            container: container.to_string(),
        })?;
        let map = self.containers.read().expect("lock poisoned");
        map.get(container)
            .map(|blobs| blobs.keys().cloned().collect())
            .ok_or_else(|| StoreError::ContainerNotFound(container.to_string()))
    }

    async fn delete_container(&self, container: &str) -> StoreResult<()> {
        self.record(StoreOp::DeleteContainer {
            container: container.to_string(),
        })?;
        let mut map = self.containers.write().expect("lock poisoned");
        map.remove(container)
            .map(|_| ())
            .ok_or_else(|| StoreError::ContainerNotFound(container.to_string()))
    }
}

impl std::fmt::Debug for InMemoryObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.containers.read().expect("lock poisoned").len();
        f.debug_struct("InMemoryObjectStore")
            .field("container_count", &count)
            .finish()
    }
}

/// Connector handing out clients over per-account in-memory stores.
///
/// Accounts are created on first use. Expired credentials are rejected; when
/// built with [`InMemoryConnector::verifying`], so are credentials the given
/// provider does not consider live.
pub struct InMemoryConnector {
    accounts: RwLock<BTreeMap<String, Arc<InMemoryObjectStore>>>,
    verifier: Option<Arc<StaticCredentialProvider>>,
    connections: AtomicUsize,
    open_clients: Arc<AtomicUsize>,
}

impl InMemoryConnector {
    pub fn new() -> Self {
        Self {
            accounts: RwLock::new(BTreeMap::new()),
            verifier: None,
            connections: AtomicUsize::new(0),
            open_clients: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A connector that only accepts credentials live in `provider`.
    pub fn verifying(provider: Arc<StaticCredentialProvider>) -> Self {
        Self {
            verifier: Some(provider),
            ..Self::new()
        }
    }

    /// The store backing `account`.
    pub fn account(&self, account: &str) -> Arc<InMemoryObjectStore> {
        if let Some(store) = self.accounts.read().expect("lock poisoned").get(account) {
            return Arc::clone(store);
        }
        let mut accounts = self.accounts.write().expect("lock poisoned");
        Arc::clone(accounts.entry(account.to_string()).or_default())
    }

    /// Number of clients handed out so far.
    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    /// Number of clients not yet dropped.
    pub fn open_clients(&self) -> usize {
        self.open_clients.load(Ordering::SeqCst)
    }
}

impl Default for InMemoryConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl StoreConnector for InMemoryConnector {
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
        if let Some(verifier) = &self.verifier {
            if !verifier.is_live(credential) {
                return Err(StoreError::AccessDenied(format!(
                    "unknown credential for {endpoint}"
                )));
            }
        }
        self.connections.fetch_add(1, Ordering::SeqCst);
        self.open_clients.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(InMemoryClient {
            store: self.account(&endpoint.account),
            open_clients: Arc::clone(&self.open_clients),
        }))
    }
}

impl std::fmt::Debug for InMemoryConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryConnector")
            .field("connections", &self.connections())
            .field("open_clients", &self.open_clients())
            .finish()
    }
}

/// Client handle over a shared account store; counts itself while alive.
struct InMemoryClient {
    store: Arc<InMemoryObjectStore>,
    open_clients: Arc<AtomicUsize>,
}

impl Drop for InMemoryClient {
    fn drop(&mut self) {
        self.open_clients.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ObjectStore for InMemoryClient {
    async fn put_blob(&self, container: &str, name: &str, data: Bytes) -> StoreResult<()> {
        self.store.put_blob(container, name, data).await
    }

    async fn get_blob(&self, container: &str, name: &str) -> StoreResult<Bytes> {
        self.store.get_blob(container, name).await
    }

    async fn delete_blob(&self, container: &str, name: &str) -> StoreResult<()> {
        self.store.delete_blob(container, name).await
    }

    async fn list_blobs(&self, container: &str) -> StoreResult<Vec<String>> {
        self.store.list_blobs(container).await
    }

    async fn delete_container(&self, container: &str) -> StoreResult<()> {
        self.store.delete_container(container).await
    }
}

use std::ops::Deref;
use std::sync::Arc;

use courier_identity::{CredentialProvider, IdentitySelector, ScopedCredential};
use courier_types::{AccountEndpoint, CourierConfig};

use crate::error::StoreResult;
use crate::traits::{ObjectStore, StoreConnector};

/// Everything needed to open a store session: how to connect, where
/// credentials come from, and which identity to use.
#[derive(Clone)]
pub struct StoreAccess {
    pub connector: Arc<dyn StoreConnector>,
    pub credentials: Arc<dyn CredentialProvider>,
    pub selector: IdentitySelector,
}

impl StoreAccess {
    pub fn new(
        connector: Arc<dyn StoreConnector>,
        credentials: Arc<dyn CredentialProvider>,
        selector: IdentitySelector,
    ) -> Self {
        Self {
            connector,
            credentials,
            selector,
        }
    }

    /// Access using the identity selected by `config`.
    pub fn from_config(
        config: &CourierConfig,
        connector: Arc<dyn StoreConnector>,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Self {
        Self::new(connector, credentials, IdentitySelector::from_config(config))
    }

    /// Acquire a credential and connect to `endpoint`.
    pub async fn open(&self, endpoint: &AccountEndpoint) -> StoreResult<StoreSession> {
        StoreSession::open(self, endpoint).await
    }
}

impl std::fmt::Debug for StoreAccess {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreAccess")
            .field("selector", &self.selector)
            .finish_non_exhaustive()
    }
}

/// A connected store client plus the credential it was opened with.
///
/// Dropping the session drops the client first, then releases the
/// credential.
pub struct StoreSession {
    client: Arc<dyn ObjectStore>,
    // Held only so it is released when the session drops.
    _credential: ScopedCredential,
}

impl StoreSession {
    pub async fn open(access: &StoreAccess, endpoint: &AccountEndpoint) -> StoreResult<Self> {
        let credential =
            ScopedCredential::acquire(Arc::clone(&access.credentials), &access.selector).await?;
        let client = access.connector.connect(endpoint, &credential)?;
        tracing::debug!(%endpoint, "store session opened");
        Ok(Self {
            client,
            _credential: credential,
        })
    }
}

impl Deref for StoreSession {
    type Target = dyn ObjectStore;

    fn deref(&self) -> &Self::Target {
        self.client.as_ref()
    }
}

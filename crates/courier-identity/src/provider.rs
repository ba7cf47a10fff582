use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{Duration, Utc};

use crate::credential::{Credential, IdentitySelector};
use crate::error::{IdentityError, IdentityResult};

/// Identity backend: hands out credentials and takes them back.
///
/// `release` is synchronous so it can run from a `Drop` impl, which is what
/// makes release unconditional on cancellation.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    /// Acquire a fresh credential for `selector`.
    async fn acquire(&self, selector: &IdentitySelector) -> IdentityResult<Credential>;

    /// Give a credential back. Called exactly once per acquired credential.
    fn release(&self, credential: &Credential);
}

/// In-process provider issuing random bearer tokens.
///
/// Tracks every credential it has issued and not yet seen released, so
/// callers (and tests) can assert that nothing leaks.
pub struct StaticCredentialProvider {
    lifetime: Duration,
    live: Mutex<HashSet<String>>,
    acquired: AtomicU64,
    released: AtomicU64,
    fail: AtomicBool,
}

impl StaticCredentialProvider {
    /// A provider whose credentials are valid for five minutes.
    pub fn new() -> Self {
        Self::with_lifetime(Duration::minutes(5))
    }

    pub fn with_lifetime(lifetime: Duration) -> Self {
        Self {
            lifetime,
            live: Mutex::new(HashSet::new()),
            acquired: AtomicU64::new(0),
            released: AtomicU64::new(0),
            fail: AtomicBool::new(false),
        }
    }

    /// Make subsequent acquisitions fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.fail.store(failing, Ordering::SeqCst);
    }

    /// Whether `credential` was issued here and has not been released.
    pub fn is_live(&self, credential: &Credential) -> bool {
        self.live
            .lock()
            .expect("credential set poisoned")
            .contains(credential.token())
    }

    pub fn acquired(&self) -> u64 {
        self.acquired.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> u64 {
        self.released.load(Ordering::SeqCst)
    }

    /// Credentials currently held by callers.
    pub fn outstanding(&self) -> usize {
        self.live.lock().expect("credential set poisoned").len()
    }
}

impl Default for StaticCredentialProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for StaticCredentialProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticCredentialProvider")
            .field("acquired", &self.acquired())
            .field("released", &self.released())
            .finish()
    }
}

#[async_trait]
impl CredentialProvider for StaticCredentialProvider {
    async fn acquire(&self, selector: &IdentitySelector) -> IdentityResult<Credential> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(IdentityError::Unavailable {
                selector: selector.to_string(),
                reason: "provider configured to fail".into(),
            });
        }
        let token = hex::encode(rand::random::<[u8; 16]>());
        self.live
            .lock()
            .expect("credential set poisoned")
            .insert(token.clone());
        self.acquired.fetch_add(1, Ordering::SeqCst);
        Ok(Credential::new(
            selector.clone(),
            token,
            Utc::now() + self.lifetime,
        ))
    }

    fn release(&self, credential: &Credential) {
        let removed = self
            .live
            .lock()
            .expect("credential set poisoned")
            .remove(credential.token());
        if removed {
            self.released.fetch_add(1, Ordering::SeqCst);
        } else {
            tracing::warn!(selector = %credential.selector, "release of unknown credential");
        }
    }
}

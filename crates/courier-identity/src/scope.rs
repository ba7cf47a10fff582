use std::ops::Deref;
use std::sync::Arc;

use crate::credential::{Credential, IdentitySelector};
use crate::error::IdentityResult;
use crate::provider::CredentialProvider;

/// A credential held for the duration of one logical operation.
///
/// Dropping the guard releases the credential. Because a cancelled future is
/// dropped, release also happens when the surrounding operation is cancelled
/// or times out.
pub struct ScopedCredential {
    provider: Arc<dyn CredentialProvider>,
    credential: Credential,
}

impl ScopedCredential {
    pub async fn acquire(
        provider: Arc<dyn CredentialProvider>,
        selector: &IdentitySelector,
    ) -> IdentityResult<Self> {
        let credential = provider.acquire(selector).await?;
        tracing::debug!(%selector, "credential acquired");
        Ok(Self {
            provider,
            credential,
        })
    }
}

impl Deref for ScopedCredential {
    type Target = Credential;

    fn deref(&self) -> &Credential {
        &self.credential
    }
}

impl Drop for ScopedCredential {
    fn drop(&mut self) {
        self.provider.release(&self.credential);
        tracing::debug!(selector = %self.credential.selector, "credential released");
    }
}

impl std::fmt::Debug for ScopedCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopedCredential")
            .field("credential", &self.credential)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::StaticCredentialProvider;
    use std::time::Duration;

    fn provider() -> (Arc<StaticCredentialProvider>, Arc<dyn CredentialProvider>) {
        let concrete = Arc::new(StaticCredentialProvider::new());
        let dynamic: Arc<dyn CredentialProvider> = concrete.clone();
        (concrete, dynamic)
    }

    #[tokio::test]
    async fn released_on_scope_exit() {
        let (stats, provider) = provider();
        {
            let scoped = ScopedCredential::acquire(provider, &IdentitySelector::Default)
                .await
                .unwrap();
            assert!(stats.is_live(&scoped));
            assert_eq!(stats.outstanding(), 1);
        }
        assert_eq!(stats.outstanding(), 0);
        assert_eq!(stats.released(), 1);
    }

    #[tokio::test]
    async fn released_on_error_path() {
        let (stats, provider) = provider();

        async fn failing_op(provider: Arc<dyn CredentialProvider>) -> Result<(), String> {
            let _scoped = ScopedCredential::acquire(provider, &IdentitySelector::Default)
                .await
                .map_err(|e| e.to_string())?;
            Err("store exploded".into())
        }

        assert!(failing_op(provider).await.is_err());
        assert_eq!(stats.acquired(), 1);
        assert_eq!(stats.outstanding(), 0);
    }

    #[tokio::test]
    async fn released_on_cancellation() {
        let (stats, provider) = provider();

        let op = async move {
            let _scoped = ScopedCredential::acquire(provider, &IdentitySelector::Default)
                .await
                .unwrap();
            std::future::pending::<()>().await;
        };

        let result = tokio::time::timeout(Duration::from_millis(20), op).await;
        assert!(result.is_err());
        assert_eq!(stats.acquired(), 1);
        assert_eq!(stats.outstanding(), 0);
    }

    #[tokio::test]
    async fn acquisition_failure_releases_nothing() {
        let (stats, provider) = provider();
        stats.set_failing(true);
        assert!(ScopedCredential::acquire(provider, &IdentitySelector::Default)
            .await
            .is_err());
        assert_eq!(stats.released(), 0);
    }
}

use std::fmt;

use chrono::{DateTime, Utc};
use courier_types::CourierConfig;

/// Which identity a credential is acquired for.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum IdentitySelector {
    /// A user-assigned managed identity, by client id.
    ManagedIdentity(String),
    /// Ambient resolution: system identity, environment, developer login.
    Default,
}

impl IdentitySelector {
    /// Prefer the configured managed identity, fall back to ambient resolution.
    pub fn from_config(config: &CourierConfig) -> Self {
        match &config.managed_identity_client_id {
            Some(id) => Self::ManagedIdentity(id.clone()),
            None => Self::Default,
        }
    }
}

impl fmt::Display for IdentitySelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ManagedIdentity(id) => write!(f, "managed-identity:{id}"),
            Self::Default => f.write_str("default"),
        }
    }
}

/// A short-lived access credential.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub selector: IdentitySelector,
    token: String,
    pub expires_at: DateTime<Utc>,
}

impl Credential {
    pub fn new(
        selector: IdentitySelector,
        token: impl Into<String>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            selector,
            token: token.into(),
            expires_at,
        }
    }

    /// The bearer token presented to the store or channel.
    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

// Tokens never appear in logs.
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("selector", &self.selector)
            .field("token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn selector_prefers_managed_identity() {
        let mut config = CourierConfig::default();
        assert_eq!(IdentitySelector::from_config(&config), IdentitySelector::Default);

        config.managed_identity_client_id = Some("abc-123".into());
        assert_eq!(
            IdentitySelector::from_config(&config),
            IdentitySelector::ManagedIdentity("abc-123".into())
        );
        assert_eq!(
            IdentitySelector::from_config(&config).to_string(),
            "managed-identity:abc-123"
        );
    }

    #[test]
    fn debug_redacts_token() {
        let cred = Credential::new(
            IdentitySelector::Default,
            "super-secret",
            Utc::now() + Duration::minutes(5),
        );
        let rendered = format!("{cred:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("<redacted>"));
        assert_eq!(cred.token(), "super-secret");
    }

    #[test]
    fn expiry() {
        let now = Utc::now();
        let cred = Credential::new(IdentitySelector::Default, "t", now);
        assert!(cred.is_expired_at(now));
        assert!(!cred.is_expired_at(now - Duration::seconds(1)));
    }
}

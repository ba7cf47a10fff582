use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::locator::{
    AccountEndpoint, DEFAULT_OFFLOAD_CONTAINER, DEFAULT_OFFLOAD_THRESHOLD,
    DEFAULT_STORAGE_ENDPOINT_SUFFIX,
};

/// Prefix of environment variables that override file configuration.
pub const ENV_PREFIX: &str = "COURIER_";

/// Process-wide configuration, loaded once at start-up and shared read-only.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CourierConfig {
    /// Storage account for offloaded bodies. Absent disables offloading.
    pub offload_storage_account_name: Option<String>,
    /// Serialized size above which a body is offloaded.
    pub offload_threshold_bytes: usize,
    /// Container receiving offloaded bodies.
    pub offload_container: String,
    /// Blob endpoint suffix, e.g. `core.windows.net`.
    pub storage_endpoint_suffix: String,
    /// Fully qualified namespace of the message channel.
    pub channel_namespace: Option<String>,
    /// Client id of a user-assigned managed identity.
    pub managed_identity_client_id: Option<String>,
}

impl Default for CourierConfig {
    fn default() -> Self {
        Self {
            offload_storage_account_name: None,
            offload_threshold_bytes: DEFAULT_OFFLOAD_THRESHOLD,
            offload_container: DEFAULT_OFFLOAD_CONTAINER.to_string(),
            storage_endpoint_suffix: DEFAULT_STORAGE_ENDPOINT_SUFFIX.to_string(),
            channel_namespace: None,
            managed_identity_client_id: None,
        }
    }
}

impl CourierConfig {
    /// Parse a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.normalized().validate()
    }

    /// Read and parse a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        tracing::debug!(path = %path.as_ref().display(), "loading configuration");
        Self::from_toml_str(&contents)
    }

    /// Apply `COURIER_*` overrides from the given variables.
    ///
    /// Keys are the field names upper-cased, e.g.
    /// `COURIER_OFFLOAD_THRESHOLD_BYTES`. Unknown variables are ignored.
    pub fn with_overrides<I, K, V>(mut self, vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        for (key, value) in vars {
            let Some(field) = key.as_ref().strip_prefix(ENV_PREFIX) else {
                continue;
            };
            let value: String = value.into();
            match field {
                "OFFLOAD_STORAGE_ACCOUNT_NAME" => self.offload_storage_account_name = Some(value),
                "OFFLOAD_THRESHOLD_BYTES" => {
                    self.offload_threshold_bytes =
                        value.trim().parse().map_err(|e| ConfigError::Invalid {
                            key: "offload_threshold_bytes",
                            reason: format!("{e}"),
                        })?;
                }
                "OFFLOAD_CONTAINER" => self.offload_container = value,
                "STORAGE_ENDPOINT_SUFFIX" => self.storage_endpoint_suffix = value,
                "CHANNEL_NAMESPACE" => self.channel_namespace = Some(value),
                "MANAGED_IDENTITY_CLIENT_ID" => self.managed_identity_client_id = Some(value),
                _ => {}
            }
        }
        self.normalized().validate()
    }

    /// Apply overrides from the process environment.
    pub fn with_env(self) -> Result<Self, ConfigError> {
        self.with_overrides(std::env::vars())
    }

    /// Blank optional values count as unset.
    fn normalized(mut self) -> Self {
        for slot in [
            &mut self.offload_storage_account_name,
            &mut self.channel_namespace,
            &mut self.managed_identity_client_id,
        ] {
            if slot.as_deref().is_some_and(|v| v.trim().is_empty()) {
                *slot = None;
            }
        }
        self
    }

    fn validate(self) -> Result<Self, ConfigError> {
        if self.offload_container.is_empty() {
            return Err(ConfigError::Invalid {
                key: "offload_container",
                reason: "must not be empty".into(),
            });
        }
        if self.offload_container.contains('/') {
            return Err(ConfigError::Invalid {
                key: "offload_container",
                reason: "must not contain '/'".into(),
            });
        }
        if self.storage_endpoint_suffix.is_empty() {
            return Err(ConfigError::Invalid {
                key: "storage_endpoint_suffix",
                reason: "must not be empty".into(),
            });
        }
        Ok(self)
    }

    /// The offload decision inputs.
    pub fn threshold(&self) -> ThresholdConfig {
        ThresholdConfig {
            offload_enabled: self.offload_storage_account_name.is_some(),
            max_inline_bytes: self.offload_threshold_bytes,
            container: self.offload_container.clone(),
        }
    }

    /// Endpoint of the offload storage account.
    pub fn offload_endpoint(&self) -> Result<AccountEndpoint, ConfigError> {
        let account = self
            .offload_storage_account_name
            .as_ref()
            .ok_or(ConfigError::Missing("offload_storage_account_name"))?;
        Ok(AccountEndpoint::new(
            account.clone(),
            self.storage_endpoint_suffix.clone(),
        ))
    }

    /// Namespace of the message channel.
    pub fn channel_namespace(&self) -> Result<&str, ConfigError> {
        self.channel_namespace
            .as_deref()
            .ok_or(ConfigError::Missing("channel_namespace"))
    }
}

/// When and where payloads are offloaded.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdConfig {
    pub offload_enabled: bool,
    pub max_inline_bytes: usize,
    pub container: String,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        CourierConfig::default().threshold()
    }
}

impl ThresholdConfig {
    /// Whether a serialized body of `len` bytes must be offloaded.
    pub fn should_offload(&self, len: usize) -> bool {
        self.offload_enabled && len > self.max_inline_bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config() {
        let c = CourierConfig::default();
        assert_eq!(c.offload_threshold_bytes, 200_000);
        assert_eq!(c.offload_container, "sb-messages");
        assert_eq!(c.storage_endpoint_suffix, "core.windows.net");
        assert!(c.offload_storage_account_name.is_none());

        let t = c.threshold();
        assert!(!t.offload_enabled);
        assert_eq!(t, ThresholdConfig::default());
    }

    #[test]
    fn toml_parsing_fills_defaults() {
        let c = CourierConfig::from_toml_str(
            r#"
            offload_storage_account_name = "stgmsgs"
            channel_namespace = "sb-tre.servicebus.windows.net"
            "#,
        )
        .unwrap();
        assert_eq!(c.offload_threshold_bytes, 200_000);
        assert!(c.threshold().offload_enabled);
        assert_eq!(
            c.offload_endpoint().unwrap().url(),
            "https://stgmsgs.blob.core.windows.net"
        );
        assert_eq!(c.channel_namespace().unwrap(), "sb-tre.servicebus.windows.net");
    }

    #[test]
    fn blank_account_disables_offloading() {
        let c = CourierConfig::from_toml_str(r#"offload_storage_account_name = "  ""#).unwrap();
        assert!(!c.threshold().offload_enabled);
        assert!(matches!(
            c.offload_endpoint(),
            Err(ConfigError::Missing("offload_storage_account_name"))
        ));
    }

    #[test]
    fn missing_namespace_is_config_error() {
        let c = CourierConfig::default();
        assert!(matches!(
            c.channel_namespace(),
            Err(ConfigError::Missing("channel_namespace"))
        ));
    }

    #[test]
    fn env_overrides_apply() {
        let c = CourierConfig::default()
            .with_overrides([
                ("COURIER_OFFLOAD_STORAGE_ACCOUNT_NAME", "envacct"),
                ("COURIER_OFFLOAD_THRESHOLD_BYTES", "1024"),
                ("COURIER_MANAGED_IDENTITY_CLIENT_ID", "client-1"),
                ("PATH", "/usr/bin"),
            ])
            .unwrap();
        assert_eq!(c.offload_storage_account_name.as_deref(), Some("envacct"));
        assert_eq!(c.offload_threshold_bytes, 1024);
        assert_eq!(c.managed_identity_client_id.as_deref(), Some("client-1"));
    }

    #[test]
    fn invalid_threshold_override_rejected() {
        let err = CourierConfig::default()
            .with_overrides([("COURIER_OFFLOAD_THRESHOLD_BYTES", "lots")])
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid { key: "offload_threshold_bytes", .. }
        ));
    }

    #[test]
    fn container_with_slash_rejected() {
        let err = CourierConfig::from_toml_str(r#"offload_container = "a/b""#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "offload_container", .. }));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "offload_threshold_bytes = 42").unwrap();
        let c = CourierConfig::load(file.path()).unwrap();
        assert_eq!(c.offload_threshold_bytes, 42);
    }

    #[test]
    fn should_offload_respects_enablement() {
        let mut t = ThresholdConfig {
            offload_enabled: true,
            max_inline_bytes: 10,
            container: "sb-messages".into(),
        };
        assert!(!t.should_offload(10));
        assert!(t.should_offload(11));
        t.offload_enabled = false;
        assert!(!t.should_offload(1_000_000));
    }
}

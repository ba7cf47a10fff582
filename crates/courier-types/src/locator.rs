use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::FormatError;

/// JSON field carrying the `<container>/<blob-name>` path of an offloaded body.
pub const CLAIM_CHECK_FIELD: &str = "claim_check";

/// Container that receives every offloaded message body.
pub const DEFAULT_OFFLOAD_CONTAINER: &str = "sb-messages";

/// Serialized size in bytes above which a payload is offloaded.
pub const DEFAULT_OFFLOAD_THRESHOLD: usize = 200_000;

/// Blob endpoint suffix of the public cloud.
pub const DEFAULT_STORAGE_ENDPOINT_SUFFIX: &str = "core.windows.net";

/// Address of one blob inside an object store account.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlobLocator {
    pub container: String,
    pub name: String,
}

impl BlobLocator {
    pub fn new(container: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            container: container.into(),
            name: name.into(),
        }
    }

    /// A fresh, globally unique `msg-<uuid>.json` locator inside `container`.
    pub fn generate(container: impl Into<String>) -> Self {
        Self::new(container, format!("msg-{}.json", uuid::Uuid::new_v4()))
    }

    /// Parse a `<container>/<blob-name>` path.
    ///
    /// Only the first `/` separates the container; blob names may contain
    /// further slashes.
    ///
    /// # Examples
    ///
    /// ```
    /// use courier_types::BlobLocator;
    ///
    /// let loc = BlobLocator::parse_path("sb-messages/a/b.json").unwrap();
    /// assert_eq!(loc.container, "sb-messages");
    /// assert_eq!(loc.name, "a/b.json");
    /// assert!(BlobLocator::parse_path("no-separator").is_err());
    /// ```
    pub fn parse_path(path: &str) -> Result<Self, FormatError> {
        let (container, name) = path
            .split_once('/')
            .ok_or_else(|| FormatError::MissingSeparator(path.to_string()))?;
        if container.is_empty() {
            return Err(FormatError::EmptySegment {
                path: path.to_string(),
                part: "container",
            });
        }
        if name.is_empty() {
            return Err(FormatError::EmptySegment {
                path: path.to_string(),
                part: "blob name",
            });
        }
        Ok(Self::new(container, name))
    }

    /// The `<container>/<blob-name>` path stored in a claim-check envelope.
    pub fn to_path(&self) -> String {
        format!("{}/{}", self.container, self.name)
    }
}

impl fmt::Display for BlobLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.container, self.name)
    }
}

/// A storage account together with the endpoint suffix of its cloud.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountEndpoint {
    pub account: String,
    pub suffix: String,
}

impl AccountEndpoint {
    pub fn new(account: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self {
            account: account.into(),
            suffix: suffix.into(),
        }
    }

    /// `https://<account>.blob.<suffix>`
    pub fn url(&self) -> String {
        format!("https://{}.blob.{}", self.account, self.suffix)
    }
}

impl fmt::Display for AccountEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn generated_names_are_unique_and_well_formed() {
        let a = BlobLocator::generate(DEFAULT_OFFLOAD_CONTAINER);
        let b = BlobLocator::generate(DEFAULT_OFFLOAD_CONTAINER);
        assert_ne!(a, b);
        assert_eq!(a.container, "sb-messages");
        assert!(a.name.starts_with("msg-"));
        assert!(a.name.ends_with(".json"));

        let uuid_part = &a.name["msg-".len()..a.name.len() - ".json".len()];
        assert!(uuid::Uuid::parse_str(uuid_part).is_ok());
    }

    #[test]
    fn parse_splits_on_first_slash_only() {
        let loc = BlobLocator::parse_path("sb-messages/nested/dir/msg.json").unwrap();
        assert_eq!(loc.container, "sb-messages");
        assert_eq!(loc.name, "nested/dir/msg.json");
    }

    #[test]
    fn parse_rejects_missing_separator() {
        let err = BlobLocator::parse_path("sb-messages").unwrap_err();
        assert_eq!(err, FormatError::MissingSeparator("sb-messages".into()));
    }

    #[test]
    fn parse_rejects_empty_segments() {
        assert!(matches!(
            BlobLocator::parse_path("/msg.json"),
            Err(FormatError::EmptySegment { part: "container", .. })
        ));
        assert!(matches!(
            BlobLocator::parse_path("sb-messages/"),
            Err(FormatError::EmptySegment { part: "blob name", .. })
        ));
    }

    #[test]
    fn display_matches_path() {
        let loc = BlobLocator::new("c", "n/m");
        assert_eq!(loc.to_string(), "c/n/m");
        assert_eq!(loc.to_path(), "c/n/m");
    }

    #[test]
    fn account_endpoint_url() {
        let ep = AccountEndpoint::new("stgmsgs", DEFAULT_STORAGE_ENDPOINT_SUFFIX);
        assert_eq!(ep.url(), "https://stgmsgs.blob.core.windows.net");
        assert_eq!(ep.to_string(), ep.url());
    }

    proptest! {
        #[test]
        fn path_roundtrip_preserves_blob_name(
            container in "[a-z0-9-]{1,20}",
            name in "[a-zA-Z0-9._/-]{1,40}",
        ) {
            let loc = BlobLocator::new(container.clone(), name.clone());
            let parsed = BlobLocator::parse_path(&loc.to_path()).unwrap();
            prop_assert_eq!(parsed.container, container);
            prop_assert_eq!(parsed.name, name);
        }
    }
}

//! Deletion targets parsed from blob URLs.
//!
//! A deletion event names its target as a full blob URL:
//!
//! ```text
//! https://<account>.blob.<suffix>/<container>/<blob-path-or-empty>
//! ```
//!
//! An empty blob path means the whole container is the target.

use percent_encoding::percent_decode_str;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::FormatError;
use crate::locator::AccountEndpoint;

const SCHEME: &str = "https";
const BLOB_HOST_MARKER: &str = ".blob.";

/// The target of one deletion event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletionRequest {
    pub account: String,
    pub suffix: String,
    pub container: String,
    /// `None` when the URL names the container itself.
    pub blob_name: Option<String>,
}

impl DeletionRequest {
    /// Parse a blob URL into its account, container, and blob path.
    ///
    /// Query strings (SAS tokens) are ignored. Path segments are
    /// percent-decoded, and the blob path keeps its embedded `/` characters.
    /// Only the default https port is accepted.
    pub fn parse(url: &str) -> Result<Self, FormatError> {
        let invalid = |reason: &str| FormatError::InvalidBlobUrl {
            url: url.to_string(),
            reason: reason.to_string(),
        };

        let parsed = Url::parse(url).map_err(|e| invalid(&e.to_string()))?;
        if parsed.scheme() != SCHEME {
            return Err(invalid("expected an https url"));
        }
        if parsed.port().is_some() {
            return Err(invalid("non-default port"));
        }

        let host = parsed.host_str().ok_or_else(|| invalid("missing host"))?;
        let (account, suffix) = host
            .split_once(BLOB_HOST_MARKER)
            .ok_or_else(|| invalid("host is not a blob endpoint"))?;
        if account.is_empty() {
            return Err(invalid("empty account name"));
        }
        if suffix.is_empty() {
            return Err(invalid("empty endpoint suffix"));
        }

        let mut segments = parsed
            .path_segments()
            .ok_or_else(|| invalid("missing container segment"))?
            .map(|segment| {
                percent_decode_str(segment)
                    .decode_utf8()
                    .map(|decoded| decoded.into_owned())
                    .map_err(|_| invalid("path is not valid UTF-8"))
            });
        let container = segments.next().transpose()?.unwrap_or_default();
        if container.is_empty() {
            return Err(invalid("empty container name"));
        }
        let blob = segments.collect::<Result<Vec<_>, _>>()?.join("/");

        Ok(Self {
            account: account.to_string(),
            suffix: suffix.to_string(),
            container,
            blob_name: (!blob.is_empty()).then_some(blob),
        })
    }

    /// The storage account this request targets.
    pub fn endpoint(&self) -> AccountEndpoint {
        AccountEndpoint::new(self.account.clone(), self.suffix.clone())
    }

    /// Whether the request deletes the whole container.
    pub fn is_container_target(&self) -> bool {
        self.blob_name.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_blob_url() {
        let req =
            DeletionRequest::parse("https://stgairlock.blob.core.windows.net/req-1/data.csv")
                .unwrap();
        assert_eq!(req.account, "stgairlock");
        assert_eq!(req.suffix, "core.windows.net");
        assert_eq!(req.container, "req-1");
        assert_eq!(req.blob_name.as_deref(), Some("data.csv"));
        assert!(!req.is_container_target());
        assert_eq!(req.endpoint().url(), "https://stgairlock.blob.core.windows.net");
    }

    #[test]
    fn keeps_nested_blob_path() {
        let req = DeletionRequest::parse("https://acct.blob.core.windows.net/c/dir/sub/file.txt")
            .unwrap();
        assert_eq!(req.container, "c");
        assert_eq!(req.blob_name.as_deref(), Some("dir/sub/file.txt"));
    }

    #[test]
    fn empty_blob_segment_targets_container() {
        for url in [
            "https://acct.blob.core.windows.net/c/",
            "https://acct.blob.core.windows.net/c",
        ] {
            let req = DeletionRequest::parse(url).unwrap();
            assert_eq!(req.container, "c");
            assert!(req.is_container_target(), "{url}");
        }
    }

    #[test]
    fn ignores_query_string() {
        let req = DeletionRequest::parse("https://acct.blob.core.windows.net/c/f.bin?sv=2021&sig=x")
            .unwrap();
        assert_eq!(req.blob_name.as_deref(), Some("f.bin"));
    }

    #[test]
    fn sovereign_cloud_suffix() {
        let req = DeletionRequest::parse("https://acct.blob.core.usgovcloudapi.net/c/f").unwrap();
        assert_eq!(req.suffix, "core.usgovcloudapi.net");
    }

    #[test]
    fn decodes_percent_escapes() {
        let req = DeletionRequest::parse(
            "https://acct.blob.core.windows.net/c/reports/my%20file%2B1.csv",
        )
        .unwrap();
        assert_eq!(req.blob_name.as_deref(), Some("reports/my file+1.csv"));
    }

    #[test]
    fn default_port_stays_out_of_suffix() {
        let req =
            DeletionRequest::parse("https://acct.blob.core.windows.net:443/c/f.csv").unwrap();
        assert_eq!(req.suffix, "core.windows.net");
        assert_eq!(req.endpoint().url(), "https://acct.blob.core.windows.net");
        assert!(DeletionRequest::parse("https://acct.blob.core.windows.net:8443/c/f").is_err());
    }

    #[test]
    fn scheme_is_case_insensitive() {
        let req = DeletionRequest::parse("HTTPS://acct.blob.core.windows.net/c/f.csv").unwrap();
        assert_eq!(req.account, "acct");
        assert_eq!(req.blob_name.as_deref(), Some("f.csv"));
    }

    #[test]
    fn rejects_malformed_urls() {
        for url in [
            "http://acct.blob.core.windows.net/c/f",
            "https://acct.blob.core.windows.net",
            "https://acct.blob.core.windows.net//f",
            "https://acct.queue.core.windows.net/c/f",
            "https://.blob.core.windows.net/c/f",
            "not a url",
        ] {
            assert!(
                matches!(DeletionRequest::parse(url), Err(FormatError::InvalidBlobUrl { .. })),
                "{url} should be rejected"
            );
        }
    }
}

use thiserror::Error;

/// A message body or blob URL that does not have the expected shape.
///
/// Format errors are detected before any network call is made.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormatError {
    #[error("claim-check path has no '/' separator: {0:?}")]
    MissingSeparator(String),

    #[error("claim-check path has an empty {part}: {path:?}")]
    EmptySegment { path: String, part: &'static str },

    #[error("claim-check field is not a string")]
    NonStringClaimCheck,

    #[error("invalid blob url {url:?}: {reason}")]
    InvalidBlobUrl { url: String, reason: String },
}

/// A required configuration value is missing or malformed.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing configuration value: {0}")]
    Missing(&'static str),

    #[error("invalid configuration value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },

    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("I/O error reading configuration: {0}")]
    Io(#[from] std::io::Error),
}

use courier_store::StoreError;
use courier_types::{BlobLocator, ConfigError, FormatError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("format error: {0}")]
    Format(#[from] FormatError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("offloaded body {locator} is not valid UTF-8: {source}")]
    InvalidUtf8 {
        locator: BlobLocator,
        #[source]
        source: std::string::FromUtf8Error,
    },
}

pub type CodecResult<T> = Result<T, CodecError>;

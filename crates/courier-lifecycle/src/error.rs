use thiserror::Error;

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("format error: {0}")]
    Format(#[from] courier_types::FormatError),

    #[error("store error: {0}")]
    Store(#[from] courier_store::StoreError),

    #[error("codec error: {0}")]
    Codec(#[from] courier_codec::CodecError),

    #[error("invalid deletion event: {0}")]
    InvalidEvent(#[from] serde_json::Error),

    #[error("deletion event is missing field `{0}`")]
    MissingField(&'static str),
}

impl LifecycleError {
    /// True when the target blob or container was already gone.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Store(err) if err.is_not_found())
    }
}

pub type LifecycleResult<T> = Result<T, LifecycleError>;

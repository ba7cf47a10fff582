use courier_codec::CodecError;
use courier_identity::IdentityError;
use courier_types::ConfigError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("identity error: {0}")]
    Identity(#[from] IdentityError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

pub type ChannelResult<T> = Result<T, ChannelError>;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("credential unavailable for {selector}: {reason}")]
    Unavailable { selector: String, reason: String },
}

pub type IdentityResult<T> = Result<T, IdentityError>;

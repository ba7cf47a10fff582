use courier_identity::IdentityError;

/// Errors from object store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested blob does not exist.
    #[error("blob not found: {container}/{name}")]
    BlobNotFound { container: String, name: String },

    /// A blob with this name already exists.
    #[error("blob already exists: {container}/{name}")]
    BlobExists { container: String, name: String },

    /// The container does not exist.
    #[error("container not found: {0}")]
    ContainerNotFound(String),

    /// The credential was rejected.
    #[error("access denied: {0}")]
    AccessDenied(String),

    /// The backend could not be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A container or blob name the backend cannot address.
    #[error("invalid name: {0}")]
    InvalidName(String),

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Credential acquisition failed.
    #[error("identity error: {0}")]
    Identity(#[from] IdentityError),
}

impl StoreError {
    /// Whether the error reports a missing blob or container.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::BlobNotFound { .. } | Self::ContainerNotFound(_))
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

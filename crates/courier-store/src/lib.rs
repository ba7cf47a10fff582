//! Object store client abstraction for Courier.
//!
//! The store is path-addressed: a blob lives at `(container, name)` inside a
//! storage account. Courier needs only five primitives from it: put, get and
//! delete a blob, list a container, delete a container.
//!
//! # Access model
//!
//! Store clients are never pooled. A [`StoreSession`] acquires a fresh
//! credential, connects a client through a [`StoreConnector`], performs one
//! logical operation, and releases both when dropped.
//!
//! # Backends
//!
//! - [`InMemoryObjectStore`] / [`InMemoryConnector`] -- for tests and embedding
//! - [`FsObjectStore`] / [`FsConnector`] -- one directory per account on local disk
//!
//! # Rules
//!
//! 1. A blob is written once; writing an existing name fails.
//! 2. Deleting an absent blob or container is an error, not a no-op.
//! 3. All backend errors are propagated; nothing is retried here.

pub mod error;
pub mod fs;
pub mod memory;
pub mod session;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use fs::{FsConnector, FsObjectStore};
pub use memory::{InMemoryConnector, InMemoryObjectStore, StoreOp};
pub use session::{StoreAccess, StoreSession};
pub use traits::{ObjectStore, StoreConnector};

//! Blob lifecycle coordination for Courier.
//!
//! When an upstream process finishes with a blob it emits a deletion event
//! naming the blob by URL. The coordinator deletes that blob and, when it was
//! the only blob in its container, the container too.
//!
//! # Semantics
//!
//! - URL with an empty blob path -- the container is deleted, nothing is listed
//! - otherwise the container is listed first; if it held exactly one blob the
//!   container is removed after the blob
//! - deletion of an absent blob or container is reported as a store error
//!
//! The list and the deletes are not atomic. A blob written to the container
//! between the listing and the container delete is removed with it.

pub mod coordinator;
pub mod error;
pub mod trigger;

pub use coordinator::{DeletionOutcome, LifecycleCoordinator};
pub use error::{LifecycleError, LifecycleResult};
pub use trigger::{DeletionEvent, DeletionTrigger};

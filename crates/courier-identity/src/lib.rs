//! Credential scoping for Courier.
//!
//! Every store or channel operation acquires its own short-lived credential
//! and releases it when done. Nothing is cached across operations: each
//! invocation is self-contained.
//!
//! - [`CredentialProvider`] -- acquisition/release primitive implemented by
//!   the identity backend
//! - [`IdentitySelector`] -- managed identity by client id, or ambient resolution
//! - [`ScopedCredential`] -- guard that releases its credential on drop, so
//!   success, error, and cancellation all release exactly once
//! - [`StaticCredentialProvider`] -- self-contained provider for tests and
//!   local runs

pub mod credential;
pub mod error;
pub mod provider;
pub mod scope;

pub use credential::{Credential, IdentitySelector};
pub use error::{IdentityError, IdentityResult};
pub use provider::{CredentialProvider, StaticCredentialProvider};
pub use scope::ScopedCredential;

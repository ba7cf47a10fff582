//! Foundation types for Courier.
//!
//! This crate provides the value types shared by every other Courier crate:
//! where an offloaded payload lives, what a deletion request targets, and the
//! process-wide configuration that decides when offloading happens.
//!
//! # Key Types
//!
//! - [`BlobLocator`] -- `(container, name)` pair addressing one blob
//! - [`AccountEndpoint`] -- storage account plus endpoint suffix
//! - [`DeletionRequest`] -- target of a blob deletion, parsed from a blob URL
//! - [`CourierConfig`] -- configuration loaded once at process start
//! - [`ThresholdConfig`] -- the offload decision inputs derived from it

pub mod config;
pub mod deletion;
pub mod error;
pub mod locator;

pub use config::{CourierConfig, ThresholdConfig};
pub use deletion::DeletionRequest;
pub use error::{ConfigError, FormatError};
pub use locator::{
    AccountEndpoint, BlobLocator, CLAIM_CHECK_FIELD, DEFAULT_OFFLOAD_CONTAINER,
    DEFAULT_OFFLOAD_THRESHOLD, DEFAULT_STORAGE_ENDPOINT_SUFFIX,
};

//! Claim-check payload codec for Courier.
//!
//! A message channel caps body size. The codec keeps small payloads inline
//! and moves large ones to object storage, replacing the body with a small
//! envelope that points at the blob:
//!
//! ```text
//! {"claim_check": "<container>/<blob-name>"}
//! ```
//!
//! On receipt the envelope is resolved back into the original text. Bodies
//! that are not JSON, or are JSON without the envelope field, pass through
//! untouched.

pub mod codec;
pub mod error;
pub mod message;

pub use codec::PayloadCodec;
pub use error::{CodecError, CodecResult};
pub use message::{EncodedMessage, ParsedBody};

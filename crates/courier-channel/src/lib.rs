//! Channel gateway for Courier.
//!
//! Runs the claim-check codec around the message channel: outbound bodies
//! are encoded (and possibly offloaded) before exactly one publish, inbound
//! bodies are resolved back to payload text before the caller parses them.
//!
//! The same offload rule applies to event-grid style publishing through
//! [`EventGateway`], where only the event's `data` is replaced.

pub mod error;
pub mod event;
pub mod gateway;
pub mod message;
pub mod transport;

pub use error::{ChannelError, ChannelResult};
pub use event::{EventEnvelope, EventGateway, EventPublisher, InMemoryEventPublisher};
pub use gateway::{ChannelGateway, SendOutcome};
pub use message::ChannelMessage;
pub use transport::{ChannelTransport, InMemoryChannel};

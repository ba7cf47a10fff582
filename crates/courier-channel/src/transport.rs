use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use courier_identity::Credential;

use crate::error::{ChannelError, ChannelResult};
use crate::message::ChannelMessage;

/// Publish primitive of the message channel.
///
/// One call publishes one message to one destination. Delivery is
/// at-least-once; retries belong to the transport, not to callers.
#[async_trait]
pub trait ChannelTransport: Send + Sync {
    async fn send(
        &self,
        namespace: &str,
        credential: &Credential,
        destination: &str,
        message: ChannelMessage,
    ) -> ChannelResult<()>;
}

/// In-process channel with one FIFO queue per destination.
#[derive(Default)]
pub struct InMemoryChannel {
    queues: Mutex<BTreeMap<String, VecDeque<ChannelMessage>>>,
    failing: AtomicBool,
}

impl InMemoryChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent sends fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Take the oldest message queued for `destination`.
    pub fn pop(&self, destination: &str) -> Option<ChannelMessage> {
        self.queues
            .lock()
            .expect("queue lock poisoned")
            .get_mut(destination)
            .and_then(VecDeque::pop_front)
    }

    /// Take every message queued for `destination`.
    pub fn drain(&self, destination: &str) -> Vec<ChannelMessage> {
        self.queues
            .lock()
            .expect("queue lock poisoned")
            .remove(destination)
            .map(Vec::from)
            .unwrap_or_default()
    }

    /// Number of messages queued for `destination`.
    pub fn len(&self, destination: &str) -> usize {
        self.queues
            .lock()
            .expect("queue lock poisoned")
            .get(destination)
            .map_or(0, VecDeque::len)
    }

    pub fn is_empty(&self) -> bool {
        self.queues
            .lock()
            .expect("queue lock poisoned")
            .values()
            .all(VecDeque::is_empty)
    }
}

impl std::fmt::Debug for InMemoryChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let queues = self.queues.lock().expect("queue lock poisoned");
        f.debug_struct("InMemoryChannel")
            .field("destinations", &queues.len())
            .finish()
    }
}

#[async_trait]
impl ChannelTransport for InMemoryChannel {
    async fn send(
        &self,
        namespace: &str,
        credential: &Credential,
        destination: &str,
        message: ChannelMessage,
    ) -> ChannelResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(ChannelError::Transport(format!(
                "{namespace}/{destination}: channel unavailable"
            )));
        }
        if credential.is_expired() {
            return Err(ChannelError::Transport(format!(
                "{namespace}/{destination}: credential expired"
            )));
        }
        self.queues
            .lock()
            .expect("queue lock poisoned")
            .entry(destination.to_string())
            .or_default()
            .push_back(message);
        Ok(())
    }
}

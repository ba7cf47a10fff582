use std::sync::Arc;

use courier_codec::PayloadCodec;
use courier_identity::{CredentialProvider, IdentitySelector, ScopedCredential};
use courier_types::{BlobLocator, ConfigError, CourierConfig};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::ChannelResult;
use crate::message::ChannelMessage;
use crate::transport::ChannelTransport;

/// What a successful send put on the channel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SendOutcome {
    pub destination: String,
    /// Where the body went, when it was offloaded.
    pub claim_check: Option<BlobLocator>,
    /// Length of the body actually published.
    pub body_len: usize,
}

impl SendOutcome {
    pub fn is_claim_check(&self) -> bool {
        self.claim_check.is_some()
    }
}

/// Claim-check aware send/receive over a [`ChannelTransport`].
#[derive(Clone)]
pub struct ChannelGateway {
    namespace: Option<String>,
    codec: PayloadCodec,
    transport: Arc<dyn ChannelTransport>,
    credentials: Arc<dyn CredentialProvider>,
    selector: IdentitySelector,
}

impl ChannelGateway {
    pub fn new(
        config: &CourierConfig,
        codec: PayloadCodec,
        transport: Arc<dyn ChannelTransport>,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Self {
        Self {
            namespace: config.channel_namespace.clone(),
            codec,
            transport,
            credentials,
            selector: IdentitySelector::from_config(config),
        }
    }

    pub fn codec(&self) -> &PayloadCodec {
        &self.codec
    }

    /// Encode the message body, then publish it once to `destination`.
    ///
    /// An offloaded body is replaced by its claim-check envelope; correlation
    /// id, session id and application properties are carried over. If the
    /// publish fails after an offload, the blob is left behind.
    pub async fn send(
        &self,
        message: ChannelMessage,
        destination: &str,
    ) -> ChannelResult<SendOutcome> {
        let namespace = self
            .namespace
            .as_deref()
            .ok_or(ConfigError::Missing("channel_namespace"))?;

        let ChannelMessage {
            body,
            correlation_id,
            session_id,
            application_properties,
        } = message;
        let encoded = self.codec.encode_text(body).await?;
        let claim_check = encoded.locator().cloned();
        let message = ChannelMessage {
            body: encoded.into_body(),
            correlation_id,
            session_id,
            application_properties,
        };
        let body_len = message.body.len();

        let credential =
            ScopedCredential::acquire(Arc::clone(&self.credentials), &self.selector).await?;
        self.transport
            .send(namespace, &credential, destination, message)
            .await?;

        match &claim_check {
            Some(locator) => info!(destination, %locator, "message sent with claim check"),
            None => debug!(destination, body_len, "message sent inline"),
        }
        Ok(SendOutcome {
            destination: destination.to_string(),
            claim_check,
            body_len,
        })
    }

    /// Serialize `payload` as the body of a fresh message and send it.
    pub async fn send_payload<T: Serialize + ?Sized>(
        &self,
        payload: &T,
        destination: &str,
    ) -> ChannelResult<SendOutcome> {
        let body = serde_json::to_string(payload).map_err(courier_codec::CodecError::from)?;
        self.send(ChannelMessage::new(body), destination).await
    }

    /// Resolve a received body into payload text for the caller to parse.
    pub async fn receive(&self, raw_body: &str) -> ChannelResult<String> {
        Ok(self.codec.decode(raw_body).await?)
    }

    /// [`receive`](Self::receive) for a whole message.
    pub async fn receive_message(&self, message: &ChannelMessage) -> ChannelResult<String> {
        self.receive(&message.body).await
    }
}

impl std::fmt::Debug for ChannelGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelGateway")
            .field("namespace", &self.namespace)
            .field("threshold", self.codec.threshold())
            .finish_non_exhaustive()
    }
}

use bytes::Bytes;
use courier_store::StoreAccess;
use courier_types::{AccountEndpoint, BlobLocator, ConfigError, CourierConfig, ThresholdConfig};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{CodecError, CodecResult};
use crate::message::{EncodedMessage, ParsedBody};

/// Encodes outbound payloads and resolves inbound bodies.
///
/// Built once per process from the configuration; every offload or download
/// opens its own store session.
#[derive(Clone, Debug)]
pub struct PayloadCodec {
    threshold: ThresholdConfig,
    endpoint: Option<AccountEndpoint>,
    store: StoreAccess,
}

impl PayloadCodec {
    pub fn new(config: &CourierConfig, store: StoreAccess) -> Self {
        Self {
            threshold: config.threshold(),
            endpoint: config.offload_endpoint().ok(),
            store,
        }
    }

    pub fn threshold(&self) -> &ThresholdConfig {
        &self.threshold
    }

    /// Serialize `payload` and decide between inline and claim check.
    pub async fn encode<T: Serialize + ?Sized>(&self, payload: &T) -> CodecResult<EncodedMessage> {
        let text = serde_json::to_string(payload)?;
        self.encode_text(text).await
    }

    /// Decide between inline and claim check for already-serialized text.
    ///
    /// With offloading disabled the size is never checked.
    pub async fn encode_text(&self, text: String) -> CodecResult<EncodedMessage> {
        if !self.threshold.should_offload(text.len()) {
            return Ok(EncodedMessage::Inline(text));
        }
        info!(
            size = text.len(),
            threshold = self.threshold.max_inline_bytes,
            "message exceeds threshold, offloading to blob storage"
        );
        let locator = self.offload(text).await?;
        Ok(EncodedMessage::ClaimCheck(locator))
    }

    /// Return `payload` unchanged, or the claim-check envelope object that
    /// replaces it.
    pub async fn wrap_value(&self, payload: Value) -> CodecResult<Value> {
        let text = serde_json::to_string(&payload)?;
        match self.encode_text(text).await? {
            EncodedMessage::Inline(_) => Ok(payload),
            EncodedMessage::ClaimCheck(locator) => Ok(EncodedMessage::envelope(&locator)),
        }
    }

    /// Resolve a received body into the payload text.
    ///
    /// Non-JSON bodies and JSON without a claim check come back exactly as
    /// received. A claim check is downloaded and returned as text.
    pub async fn decode(&self, raw: &str) -> CodecResult<String> {
        match ParsedBody::parse(raw)? {
            ParsedBody::NotJson | ParsedBody::OtherJson => Ok(raw.to_string()),
            ParsedBody::ClaimCheck(path) => {
                let locator = BlobLocator::parse_path(&path)?;
                info!(%locator, "message has claim check, downloading from blob storage");
                self.fetch(&locator).await
            }
        }
    }

    /// Download an offloaded body.
    pub async fn fetch(&self, locator: &BlobLocator) -> CodecResult<String> {
        let endpoint = self.offload_endpoint()?;
        let session = self.store.open(endpoint).await?;
        let data = session.get_blob(&locator.container, &locator.name).await?;
        debug!(%locator, bytes = data.len(), "claim check resolved");
        String::from_utf8(data.to_vec()).map_err(|source| CodecError::InvalidUtf8 {
            locator: locator.clone(),
            source,
        })
    }

    async fn offload(&self, text: String) -> CodecResult<BlobLocator> {
        let endpoint = self.offload_endpoint()?;
        let locator = BlobLocator::generate(self.threshold.container.clone());
        let session = self.store.open(endpoint).await?;
        session
            .put_blob(&locator.container, &locator.name, Bytes::from(text))
            .await?;
        debug!(%locator, "payload offloaded");
        Ok(locator)
    }

    fn offload_endpoint(&self) -> Result<&AccountEndpoint, ConfigError> {
        self.endpoint
            .as_ref()
            .ok_or(ConfigError::Missing("offload_storage_account_name"))
    }
}

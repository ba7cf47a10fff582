use courier_codec::PayloadCodec;
use serde_json::Value;
use tracing::info;

use crate::coordinator::{DeletionOutcome, LifecycleCoordinator};
use crate::error::{LifecycleError, LifecycleResult};

const BLOB_TO_DELETE: &str = "/data/blob_to_delete";

/// A deletion event as delivered on the channel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeletionEvent {
    pub blob_to_delete: String,
}

impl DeletionEvent {
    /// Parse the event JSON, reading `data.blob_to_delete`.
    pub fn from_json(text: &str) -> LifecycleResult<Self> {
        let value: Value = serde_json::from_str(text)?;
        let url = value
            .pointer(BLOB_TO_DELETE)
            .and_then(Value::as_str)
            .ok_or(LifecycleError::MissingField("data.blob_to_delete"))?;
        Ok(Self {
            blob_to_delete: url.to_string(),
        })
    }
}

/// Handles deletion events received from the channel.
#[derive(Clone, Debug)]
pub struct DeletionTrigger {
    codec: PayloadCodec,
    coordinator: LifecycleCoordinator,
}

impl DeletionTrigger {
    pub fn new(codec: PayloadCodec, coordinator: LifecycleCoordinator) -> Self {
        Self { codec, coordinator }
    }

    /// Resolve the body (which may itself be a claim check), then delete the
    /// blob it names.
    pub async fn handle(&self, raw_body: &str) -> LifecycleResult<DeletionOutcome> {
        let text = self.codec.decode(raw_body).await?;
        let event = DeletionEvent::from_json(&text)?;
        info!(blob_url = %event.blob_to_delete, "deletion event received");
        self.coordinator
            .delete_blob_and_container_if_last(&event.blob_to_delete)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_identity::StaticCredentialProvider;
    use courier_store::{InMemoryConnector, StoreAccess};
    use courier_types::CourierConfig;
    use serde_json::json;
    use std::sync::Arc;

    const BLOB_URL: &str = "https://stairlock.blob.core.windows.net/req-1/input.csv";

    fn trigger(config: &CourierConfig) -> (DeletionTrigger, Arc<InMemoryConnector>) {
        let credentials = Arc::new(StaticCredentialProvider::new());
        let connector = Arc::new(InMemoryConnector::new());
        let store = StoreAccess::from_config(config, connector.clone(), credentials);
        let trigger = DeletionTrigger::new(
            PayloadCodec::new(config, store.clone()),
            LifecycleCoordinator::new(store),
        );
        (trigger, connector)
    }

    #[test]
    fn event_field_is_read_from_data() {
        let body = json!({ "data": { "blob_to_delete": BLOB_URL } }).to_string();
        assert_eq!(
            DeletionEvent::from_json(&body).unwrap().blob_to_delete,
            BLOB_URL
        );
    }

    #[test]
    fn missing_field_is_reported() {
        let err = DeletionEvent::from_json(r#"{"data":{}}"#).unwrap_err();
        assert!(matches!(err, LifecycleError::MissingField(_)));
        let err = DeletionEvent::from_json(r#"{"data":{"blob_to_delete":7}}"#).unwrap_err();
        assert!(matches!(err, LifecycleError::MissingField(_)));
    }

    #[test]
    fn non_json_event_is_invalid() {
        let err = DeletionEvent::from_json("delete it please").unwrap_err();
        assert!(matches!(err, LifecycleError::InvalidEvent(_)));
    }

    #[tokio::test]
    async fn inline_event_deletes_blob() {
        let (trigger, connector) = trigger(&CourierConfig::default());
        connector.account("stairlock").seed("req-1", "input.csv", "a,b");

        let body = json!({ "data": { "blob_to_delete": BLOB_URL } }).to_string();
        let outcome = trigger.handle(&body).await.unwrap();
        assert!(outcome.container_deleted());
        assert!(!connector.account("stairlock").container_exists("req-1"));
    }

    #[tokio::test]
    async fn claim_checked_event_is_resolved_first() {
        let config = CourierConfig {
            offload_storage_account_name: Some("stgmsgs".into()),
            ..Default::default()
        };
        let (trigger, connector) = trigger(&config);
        connector.account("stairlock").seed("req-1", "input.csv", "a,b");
        connector.account("stairlock").seed("req-1", "keep.csv", "c,d");
        let event = json!({ "data": { "blob_to_delete": BLOB_URL } }).to_string();
        connector
            .account("stgmsgs")
            .seed("sb-messages", "msg-1.json", event);

        let outcome = trigger
            .handle(r#"{"claim_check":"sb-messages/msg-1.json"}"#)
            .await
            .unwrap();
        assert!(!outcome.container_deleted());
        assert_eq!(
            connector.account("stairlock").blob_names("req-1"),
            vec!["keep.csv".to_string()]
        );
        // The offloaded event body is left in place.
        assert!(connector
            .account("stgmsgs")
            .blob("sb-messages", "msg-1.json")
            .is_some());
    }
}

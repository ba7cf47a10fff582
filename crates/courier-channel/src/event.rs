use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use courier_codec::PayloadCodec;
use courier_identity::{Credential, CredentialProvider, IdentitySelector, ScopedCredential};
use courier_types::CourierConfig;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ChannelError, ChannelResult};

/// An event in the event-grid schema.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventEnvelope {
    pub id: String,
    pub subject: String,
    pub event_type: String,
    pub data: Value,
    pub data_version: String,
    pub event_time: DateTime<Utc>,
}

impl EventEnvelope {
    /// A new event with a random id, timestamped now.
    pub fn new(subject: impl Into<String>, event_type: impl Into<String>, data: Value) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            subject: subject.into(),
            event_type: event_type.into(),
            data,
            data_version: "1.0".into(),
            event_time: Utc::now(),
        }
    }
}

/// Publish primitive of the event topic.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(
        &self,
        credential: &Credential,
        topic_endpoint: &str,
        events: Vec<EventEnvelope>,
    ) -> ChannelResult<()>;
}

/// Records every published event per topic.
#[derive(Debug, Default)]
pub struct InMemoryEventPublisher {
    published: Mutex<Vec<(String, EventEnvelope)>>,
}

impl InMemoryEventPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Events published to `topic_endpoint`, oldest first.
    pub fn events(&self, topic_endpoint: &str) -> Vec<EventEnvelope> {
        self.published
            .lock()
            .expect("publisher lock poisoned")
            .iter()
            .filter(|(topic, _)| topic == topic_endpoint)
            .map(|(_, event)| event.clone())
            .collect()
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventPublisher {
    async fn publish(
        &self,
        credential: &Credential,
        topic_endpoint: &str,
        events: Vec<EventEnvelope>,
    ) -> ChannelResult<()> {
        if credential.is_expired() {
            return Err(ChannelError::Transport(format!(
                "{topic_endpoint}: credential expired"
            )));
        }
        let mut published = self.published.lock().expect("publisher lock poisoned");
        published.extend(events.into_iter().map(|e| (topic_endpoint.to_string(), e)));
        Ok(())
    }
}

/// Publishes events, offloading oversized `data` the same way the channel
/// gateway offloads message bodies.
#[derive(Clone)]
pub struct EventGateway {
    codec: PayloadCodec,
    publisher: Arc<dyn EventPublisher>,
    credentials: Arc<dyn CredentialProvider>,
    selector: IdentitySelector,
}

impl EventGateway {
    pub fn new(
        config: &CourierConfig,
        codec: PayloadCodec,
        publisher: Arc<dyn EventPublisher>,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Self {
        Self {
            codec,
            publisher,
            credentials,
            selector: IdentitySelector::from_config(config),
        }
    }

    /// Publish one event to `topic_endpoint`.
    ///
    /// Returns the event as published, with `data` possibly replaced by a
    /// claim-check envelope.
    pub async fn publish(
        &self,
        mut event: EventEnvelope,
        topic_endpoint: &str,
    ) -> ChannelResult<EventEnvelope> {
        event.data = self.codec.wrap_value(event.data).await?;
        let credential =
            ScopedCredential::acquire(Arc::clone(&self.credentials), &self.selector).await?;
        self.publisher
            .publish(&credential, topic_endpoint, vec![event.clone()])
            .await?;
        tracing::debug!(topic_endpoint, event_id = %event.id, "event published");
        Ok(event)
    }
}

impl std::fmt::Debug for EventGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventGateway")
            .field("selector", &self.selector)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_identity::StaticCredentialProvider;
    use courier_store::{InMemoryConnector, StoreAccess};
    use courier_types::BlobLocator;
    use serde_json::json;

    const TOPIC: &str = "https://evgt-airlock.westeurope-1.eventgrid.azure.net/api/events";

    type Fixture = (
        EventGateway,
        Arc<InMemoryEventPublisher>,
        Arc<InMemoryConnector>,
    );

    fn gateway(threshold: usize) -> Fixture {
        let config = CourierConfig {
            offload_storage_account_name: Some("stgmsgs".into()),
            offload_threshold_bytes: threshold,
            ..Default::default()
        };
        let credentials = Arc::new(StaticCredentialProvider::new());
        let connector = Arc::new(InMemoryConnector::new());
        let store = StoreAccess::from_config(&config, connector.clone(), credentials.clone());
        let publisher = Arc::new(InMemoryEventPublisher::new());
        let gateway = EventGateway::new(
            &config,
            PayloadCodec::new(&config, store),
            publisher.clone(),
            credentials,
        );
        (gateway, publisher, connector)
    }

    #[test]
    fn envelope_serializes_camel_case() {
        let event = EventEnvelope::new("/requests/1", "StatusChanged", json!({ "s": 1 }));
        let value = serde_json::to_value(&event).unwrap();
        assert!(value.get("eventType").is_some());
        assert!(value.get("dataVersion").is_some());
        assert!(uuid::Uuid::parse_str(&event.id).is_ok());
    }

    #[tokio::test]
    async fn small_event_data_is_published_as_is() {
        let (gateway, publisher, connector) = gateway(1_000);
        let data = json!({ "request_id": "r-1", "new_status": "approved" });
        let event = EventEnvelope::new("/requests/r-1", "StatusChanged", data.clone());

        let published = gateway.publish(event, TOPIC).await.unwrap();
        assert_eq!(published.data, data);
        assert_eq!(publisher.events(TOPIC), vec![published]);
        assert_eq!(connector.connections(), 0);
    }

    #[tokio::test]
    async fn large_event_data_is_claim_checked() {
        let (gateway, publisher, connector) = gateway(100);
        let data = json!({ "files": vec!["f".repeat(50); 10] });
        let event = EventEnvelope::new("/requests/r-2", "StatusChanged", data.clone());

        let published = gateway.publish(event, TOPIC).await.unwrap();
        let path = published.data["claim_check"].as_str().unwrap();
        let locator = BlobLocator::parse_path(path).unwrap();
        let stored = connector
            .account("stgmsgs")
            .blob(&locator.container, &locator.name)
            .unwrap();
        assert_eq!(stored, serde_json::to_string(&data).unwrap());
        assert_eq!(publisher.events(TOPIC).len(), 1);
    }
}

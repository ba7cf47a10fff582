use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A message on the channel: an opaque text body plus broker metadata.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelMessage {
    pub body: String,
    pub correlation_id: Option<String>,
    pub session_id: Option<String>,
    pub application_properties: BTreeMap<String, String>,
}

impl ChannelMessage {
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            ..Default::default()
        }
    }

    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }

    pub fn with_session_id(mut self, id: impl Into<String>) -> Self {
        self.session_id = Some(id.into());
        self
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.application_properties.insert(key.into(), value.into());
        self
    }

    /// The same message with a different body; all metadata is kept.
    pub fn with_body(self, body: String) -> Self {
        Self { body, ..self }
    }
}

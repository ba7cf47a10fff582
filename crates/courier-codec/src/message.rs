use courier_types::{BlobLocator, FormatError, CLAIM_CHECK_FIELD};
use serde_json::{Map, Value};

/// An outbound message body: either the payload itself or a pointer to it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EncodedMessage {
    /// Serialized payload, sent byte-for-byte.
    Inline(String),
    /// Payload stored at this locator.
    ClaimCheck(BlobLocator),
}

impl EncodedMessage {
    pub fn is_claim_check(&self) -> bool {
        matches!(self, Self::ClaimCheck(_))
    }

    /// The locator, if this is a claim check.
    pub fn locator(&self) -> Option<&BlobLocator> {
        match self {
            Self::ClaimCheck(locator) => Some(locator),
            Self::Inline(_) => None,
        }
    }

    /// The claim-check envelope object for `locator`.
    pub fn envelope(locator: &BlobLocator) -> Value {
        let mut map = Map::with_capacity(1);
        map.insert(CLAIM_CHECK_FIELD.to_string(), Value::String(locator.to_path()));
        Value::Object(map)
    }

    /// The text placed on the channel.
    pub fn into_body(self) -> String {
        match self {
            Self::Inline(text) => text,
            Self::ClaimCheck(locator) => Self::envelope(&locator).to_string(),
        }
    }
}

/// What a received body turned out to be.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParsedBody {
    /// Not JSON at all; delivered as-is.
    NotJson,
    /// JSON without a claim-check field; delivered as-is.
    OtherJson,
    /// A claim-check envelope carrying this path.
    ClaimCheck(String),
}

impl ParsedBody {
    /// Classify a raw body.
    ///
    /// Only a JSON object can carry a claim check. A `claim_check` field whose
    /// value is not a string is malformed.
    pub fn parse(raw: &str) -> Result<Self, FormatError> {
        let Ok(value) = serde_json::from_str::<Value>(raw) else {
            return Ok(Self::NotJson);
        };
        match value {
            Value::Object(mut map) => match map.remove(CLAIM_CHECK_FIELD) {
                Some(Value::String(path)) => Ok(Self::ClaimCheck(path)),
                Some(_) => Err(FormatError::NonStringClaimCheck),
                None => Ok(Self::OtherJson),
            },
            _ => Ok(Self::OtherJson),
        }
    }
}

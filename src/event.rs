use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Schema describing one storage bucket notification record.
pub const STORAGE_NOTIFICATION_SCHEMA: &str =
    "iglu:com.amazon.aws.lambda/s3_notification_event/jsonschema/1-0-0";

/// Schema wrapping an envelope into an unstructured tracker event.
pub const UNSTRUCT_EVENT_SCHEMA: &str =
    "iglu:com.snowplowanalytics.snowplow/unstruct_event/jsonschema/1-0-0";

/// Schema of the bulk payload document posted to the collector.
pub const PAYLOAD_DATA_SCHEMA: &str =
    "iglu:com.snowplowanalytics.snowplow/payload_data/jsonschema/1-0-4";

/// Schema-tagged JSON wrapper. The relay never inspects `data`; records pass
/// through exactly as the notification delivered them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelfDescribingEnvelope {
    pub schema: String,
    pub data: Value,
}

impl SelfDescribingEnvelope {
    pub fn new(schema: impl Into<String>, data: Value) -> Self {
        Self {
            schema: schema.into(),
            data,
        }
    }
}

/// Notification document pushed by the storage service: an array of opaque
/// record objects under a `Records` key.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StorageNotification {
    #[serde(rename = "Records")]
    pub records: Vec<Value>,
}

impl StorageNotification {
    pub fn from_json(raw: &str) -> Result<Self, NotificationError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Wraps every record into a schema-tagged envelope, untouched.
    pub fn envelopes(&self) -> Vec<SelfDescribingEnvelope> {
        self.records
            .iter()
            .cloned()
            .map(|record| SelfDescribingEnvelope::new(STORAGE_NOTIFICATION_SCHEMA, record))
            .collect()
    }
}

/// Errors surfaced while decoding a notification document.
#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("notification document could not be parsed: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Collector wire form of one envelope. Field names follow the collector's
/// tracker protocol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerPayload {
    /// Event type marker; always `ue` for unstructured events.
    pub e: String,
    /// Device platform; the relay runs server-side.
    pub p: String,
    /// Tracker namespace.
    pub tna: String,
    /// Application id taken from the relay configuration.
    pub aid: String,
    /// Base64-encoded unstructured-event envelope.
    pub ue_px: String,
}

/// Builds tracker payloads for a fixed namespace and application id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventTracker {
    namespace: String,
    app_id: String,
}

impl EventTracker {
    pub fn new(namespace: impl Into<String>, app_id: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            app_id: app_id.into(),
        }
    }

    /// Encodes one envelope into its collector wire form.
    pub fn payload(
        &self,
        envelope: &SelfDescribingEnvelope,
    ) -> Result<TrackerPayload, serde_json::Error> {
        let wrapped =
            SelfDescribingEnvelope::new(UNSTRUCT_EVENT_SCHEMA, serde_json::to_value(envelope)?);
        let encoded = general_purpose::STANDARD.encode(serde_json::to_string(&wrapped)?);
        Ok(TrackerPayload {
            e: "ue".into(),
            p: "srv".into(),
            tna: self.namespace.clone(),
            aid: self.app_id.clone(),
            ue_px: encoded,
        })
    }
}

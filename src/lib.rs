//! Relay for storage bucket notifications, forwarding each record to an
//! analytics collector and blocking until the whole batch is acknowledged.

pub mod app;
pub mod config;
pub mod delivery;
pub mod emitter;
pub mod event;
pub mod handler;
pub mod identity;
pub mod logging;

pub use config::{ConfigError, RelayConfig};
pub use delivery::{
    AsyncEmitter, CompletionCallback, DeliveryCoordinator, DeliveryError, DeliveryLog,
    DeliveryMetrics, DeliveryOutcome, DeliveryTelemetry,
};
pub use emitter::{
    BatchEmitter, CollectorTransport, EventTransport, TransportError, COLLECTOR_PATH,
};
pub use event::{
    EventTracker, NotificationError, SelfDescribingEnvelope, StorageNotification, TrackerPayload,
    PAYLOAD_DATA_SCHEMA, STORAGE_NOTIFICATION_SCHEMA, UNSTRUCT_EVENT_SCHEMA,
};
pub use handler::{
    relay, relay_events, resolve_config, RelayError, RelayRequest, RelaySummary,
    TRACKER_NAMESPACE,
};
pub use identity::{
    region_from_arn, EnvFunctionMetadata, FunctionMetadata, IdentityError, MetadataError,
    FUNCTION_DESCRIPTION_VAR,
};
pub use logging::{LogLevel, LoggingError, RelayLogger};

use crate::config::{ConfigError, RelayConfig};
use crate::delivery::{DeliveryCoordinator, DeliveryError};
use crate::emitter::{BatchEmitter, CollectorTransport, EventTransport, TransportError};
use crate::event::{EventTracker, NotificationError, SelfDescribingEnvelope, StorageNotification};
use crate::identity::{region_from_arn, FunctionMetadata, IdentityError, MetadataError};
use std::time::Duration;
use thiserror::Error;

/// Namespace stamped on every tracker payload the relay produces.
pub const TRACKER_NAMESPACE: &str = "main";

/// One relay invocation: the notification to forward plus the identity of
/// the host function whose description carries the configuration.
#[derive(Debug, Clone)]
pub struct RelayRequest {
    pub notification: StorageNotification,
    pub invoked_arn: String,
    pub function_name: String,
}

/// Summary returned after a fully delivered batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelaySummary {
    pub events: usize,
    pub region: String,
    pub app_id: String,
}

/// Errors surfaced by the relay pipeline.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("notification could not be decoded: {0}")]
    Notification(#[from] NotificationError),
    #[error("function identity could not be resolved: {0}")]
    Identity(#[from] IdentityError),
    #[error("function metadata lookup failed: {0}")]
    Metadata(#[from] MetadataError),
    #[error("relay configuration is invalid: {0}")]
    Config(#[from] ConfigError),
    #[error("payload encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("collector transport could not be constructed: {0}")]
    Transport(#[from] TransportError),
    #[error("delivery failed: {0}")]
    Delivery(#[from] DeliveryError),
}

/// Resolves the relay configuration for an invocation: region from the
/// invoked ARN, description blob from the control plane, then the parsed
/// config. The collector URL is validated here, before anything is sent.
pub fn resolve_config<M: FunctionMetadata>(
    invoked_arn: &str,
    function_name: &str,
    metadata: &M,
) -> Result<(RelayConfig, String), RelayError> {
    let region = region_from_arn(invoked_arn)?.to_string();
    let description = metadata.describe(&region, function_name)?;
    let config = RelayConfig::from_description(description.trim())?;
    config.collector_endpoint()?;
    Ok((config, region))
}

/// Encodes the envelopes into tracker payloads and drives them through a
/// batching emitter over the given transport, blocking until the whole batch
/// is accounted for. The emitter is sized to the batch so the collector sees
/// a single bulk POST.
pub fn relay_events<T>(
    envelopes: Vec<SelfDescribingEnvelope>,
    config: &RelayConfig,
    transport: T,
    coordinator: &mut DeliveryCoordinator,
    timeout: Duration,
) -> Result<usize, RelayError>
where
    T: EventTransport + Send + 'static,
{
    let tracker = EventTracker::new(TRACKER_NAMESPACE, config.app_id());
    let payloads = envelopes
        .iter()
        .map(|envelope| tracker.payload(envelope))
        .collect::<Result<Vec<_>, _>>()?;
    let count = payloads.len();
    let mut emitter = BatchEmitter::new(transport, count.max(1));
    coordinator.submit_and_wait(payloads, &mut emitter, timeout)?;
    emitter.shutdown();
    Ok(count)
}

/// Full relay pipeline over the real collector transport.
pub fn relay<M: FunctionMetadata>(
    request: &RelayRequest,
    metadata: &M,
    coordinator: &mut DeliveryCoordinator,
    timeout: Duration,
) -> Result<RelaySummary, RelayError> {
    let (config, region) = resolve_config(&request.invoked_arn, &request.function_name, metadata)?;
    let transport = CollectorTransport::new(config.collector_endpoint()?)?;
    let events = relay_events(
        request.notification.envelopes(),
        &config,
        transport,
        coordinator,
        timeout,
    )?;
    Ok(RelaySummary {
        events,
        region,
        app_id: config.app_id().to_string(),
    })
}

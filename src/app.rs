use crate::delivery::DeliveryCoordinator;
use crate::event::StorageNotification;
use crate::handler::{relay, RelayRequest};
use crate::identity::EnvFunctionMetadata;
use crate::logging::{LogLevel, RelayLogger};
use anyhow::{Context, Result};
use std::env;
use std::io::Read;
use std::time::Duration;

const DEFAULT_DELIVERY_TIMEOUT_MS: u64 = 50_000;

/// Binary entrypoint. Reads one notification document from stdin, resolves
/// the relay configuration from the host function's identity, and blocks
/// until the batch is delivered or the deadline passes.
pub fn run() -> Result<()> {
    let mut logger = RelayLogger::to_stderr();
    let mut raw = String::new();
    std::io::stdin()
        .read_to_string(&mut raw)
        .context("failed to read notification from stdin")?;
    let notification =
        StorageNotification::from_json(&raw).context("notification document is invalid")?;
    let invoked_arn = env::var("EVRELAY_INVOKED_ARN").context("EVRELAY_INVOKED_ARN is not set")?;
    let function_name =
        env::var("EVRELAY_FUNCTION_NAME").context("EVRELAY_FUNCTION_NAME is not set")?;
    let timeout = delivery_timeout()?;
    let metadata = EnvFunctionMetadata::new();
    let mut coordinator = DeliveryCoordinator::new();
    let request = RelayRequest {
        notification,
        invoked_arn,
        function_name,
    };
    let summary = relay(&request, &metadata, &mut coordinator, timeout)?;
    logger
        .log(
            LogLevel::Info,
            "evrelay::app",
            &format!(
                "relayed {} events for app {} in region {}",
                summary.events, summary.app_id, summary.region
            ),
        )
        .context("failed to emit relay summary log")?;
    Ok(())
}

fn delivery_timeout() -> Result<Duration> {
    match env::var("EVRELAY_DELIVERY_TIMEOUT_MS") {
        Ok(value) => {
            let ms: u64 = value.parse().with_context(|| {
                format!("EVRELAY_DELIVERY_TIMEOUT_MS is not a valid duration: {value:?}")
            })?;
            Ok(Duration::from_millis(ms))
        }
        Err(_) => Ok(Duration::from_millis(DEFAULT_DELIVERY_TIMEOUT_MS)),
    }
}

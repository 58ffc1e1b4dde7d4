use evrelay::{
    relay_events, resolve_config, DeliveryCoordinator, DeliveryError, EventTransport,
    FunctionMetadata, MetadataError, RelayError, StorageNotification, TrackerPayload,
    TransportError,
};
use serde_json::json;
use std::sync::{Arc, Mutex};
use std::time::Duration;

struct FakeMetadata {
    description: String,
}

impl FunctionMetadata for FakeMetadata {
    fn describe(&self, _region: &str, _function_name: &str) -> Result<String, MetadataError> {
        Ok(self.description.clone())
    }
}

#[derive(Clone)]
struct FixedStatusTransport {
    status: u16,
    posts: Arc<Mutex<Vec<usize>>>,
}

impl FixedStatusTransport {
    fn new(status: u16) -> Self {
        Self {
            status,
            posts: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl EventTransport for FixedStatusTransport {
    fn post(&mut self, payloads: &[TrackerPayload]) -> Result<u16, TransportError> {
        self.posts.lock().unwrap().push(payloads.len());
        Ok(self.status)
    }
}

fn notification(records: usize) -> StorageNotification {
    let records: Vec<_> = (0..records)
        .map(|idx| json!({"eventName": "ObjectCreated:Put", "sequence": idx}))
        .collect();
    let raw = json!({ "Records": records }).to_string();
    StorageNotification::from_json(&raw).expect("notification should parse")
}

const ARN: &str = "arn:aws:lambda:eu-west-1:123456789012:function:relay";

fn metadata() -> FakeMetadata {
    FakeMetadata {
        description:
            "{\"collector_url\": \"http://collector.example.com\", \"app_id\": \"storage-relay\"}"
                .into(),
    }
}

#[test]
fn hundred_record_notification_relays_in_one_post() {
    let (config, region) =
        resolve_config(ARN, "relay", &metadata()).expect("config should resolve");
    assert_eq!(region, "eu-west-1");
    let transport = FixedStatusTransport::new(200);
    let posts = Arc::clone(&transport.posts);
    let mut coordinator = DeliveryCoordinator::new();
    let events = relay_events(
        notification(100).envelopes(),
        &config,
        transport,
        &mut coordinator,
        Duration::from_secs(5),
    )
    .expect("relay should succeed");
    assert_eq!(events, 100);
    assert_eq!(posts.lock().unwrap().as_slice(), &[100]);
    assert_eq!(coordinator.telemetry().metrics().delivered_total, 100);
}

#[test]
fn collector_rejection_surfaces_as_partial_failure() {
    let (config, _) = resolve_config(ARN, "relay", &metadata()).expect("config should resolve");
    let transport = FixedStatusTransport::new(503);
    let mut coordinator = DeliveryCoordinator::new();
    let err = relay_events(
        notification(100).envelopes(),
        &config,
        transport,
        &mut coordinator,
        Duration::from_secs(5),
    )
    .expect_err("collector rejection must fail the relay");
    assert!(matches!(
        err,
        RelayError::Delivery(DeliveryError::PartialFailure(100))
    ));
}

#[test]
fn empty_notification_relays_nothing() {
    let (config, _) = resolve_config(ARN, "relay", &metadata()).expect("config should resolve");
    let transport = FixedStatusTransport::new(200);
    let posts = Arc::clone(&transport.posts);
    let mut coordinator = DeliveryCoordinator::new();
    let events = relay_events(
        notification(0).envelopes(),
        &config,
        transport,
        &mut coordinator,
        Duration::from_secs(5),
    )
    .expect("empty batch should resolve");
    assert_eq!(events, 0);
    assert!(posts.lock().unwrap().is_empty());
}

#[test]
fn payloads_carry_the_configured_app_id() {
    let (config, _) = resolve_config(ARN, "relay", &metadata()).expect("config should resolve");

    #[derive(Clone)]
    struct CapturingTransport {
        seen: Arc<Mutex<Vec<TrackerPayload>>>,
    }
    impl EventTransport for CapturingTransport {
        fn post(&mut self, payloads: &[TrackerPayload]) -> Result<u16, TransportError> {
            self.seen.lock().unwrap().extend(payloads.to_vec());
            Ok(200)
        }
    }
    let seen = Arc::new(Mutex::new(Vec::new()));
    let transport = CapturingTransport {
        seen: Arc::clone(&seen),
    };
    let mut coordinator = DeliveryCoordinator::new();
    relay_events(
        notification(3).envelopes(),
        &config,
        transport,
        &mut coordinator,
        Duration::from_secs(5),
    )
    .expect("relay should succeed");
    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 3);
    assert!(seen.iter().all(|payload| payload.aid == "storage-relay"));
    assert!(seen.iter().all(|payload| payload.tna == "main"));
}

use evrelay::{ConfigError, RelayConfig};
use serde_json::json;

fn description(collector_url: Option<&str>, app_id: Option<&str>) -> String {
    let mut fields = serde_json::Map::new();
    if let Some(url) = collector_url {
        fields.insert("collector_url".into(), json!(url));
    }
    if let Some(app_id) = app_id {
        fields.insert("app_id".into(), json!(app_id));
    }
    serde_json::Value::Object(fields).to_string()
}

#[test]
fn happy_path_exposes_raw_values() {
    let config = RelayConfig::from_description(&description(
        Some("http://collector.example.com"),
        Some("storage-relay"),
    ))
    .expect("config should parse");
    assert_eq!(config.collector_url(), "http://collector.example.com");
    assert_eq!(config.app_id(), "storage-relay");
}

#[test]
fn malformed_json_is_rejected() {
    let err = RelayConfig::from_description("{").expect_err("truncated JSON must fail");
    assert!(matches!(err, ConfigError::Unparseable { .. }));
}

#[test]
fn non_object_json_is_rejected() {
    let err = RelayConfig::from_description("42").expect_err("scalar JSON must fail");
    assert!(matches!(err, ConfigError::Unparseable { .. }));
}

#[test]
fn missing_collector_url_is_rejected() {
    let err = RelayConfig::from_description(&description(None, Some("app")))
        .expect_err("missing collector_url must fail");
    match err {
        ConfigError::MissingField { field, .. } => assert_eq!(field, "collector_url"),
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn missing_app_id_is_rejected() {
    let err = RelayConfig::from_description(&description(Some("http://c"), None))
        .expect_err("missing app_id must fail");
    match err {
        ConfigError::MissingField { field, .. } => assert_eq!(field, "app_id"),
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn non_string_field_counts_as_missing() {
    let blob = r#"{"collector_url": 7, "app_id": "app"}"#;
    let err = RelayConfig::from_description(blob).expect_err("numeric URL must fail");
    match err {
        ConfigError::MissingField { field, .. } => assert_eq!(field, "collector_url"),
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn error_message_quotes_the_offending_blob() {
    let err = RelayConfig::from_description(&description(None, Some("app")))
        .expect_err("missing collector_url must fail");
    let message = err.to_string();
    assert!(message.contains("collector_url"));
    assert!(message.contains("app"));
}

#[test]
fn collector_endpoint_parses_a_valid_url() {
    let config = RelayConfig::from_description(&description(
        Some("http://hello.world.co.uk"),
        Some("abc"),
    ))
    .expect("config should parse");
    let endpoint = config.collector_endpoint().expect("URL should parse");
    assert_eq!(endpoint.host_str(), Some("hello.world.co.uk"));
}

#[test]
fn collector_endpoint_rejects_garbage() {
    let config =
        RelayConfig::from_description(&description(Some("aaaaaaaa"), Some("abc")))
            .expect("config itself parses");
    let err = config
        .collector_endpoint()
        .expect_err("schemeless URL must fail");
    assert!(matches!(err, ConfigError::InvalidCollectorUrl { .. }));
}

use reqwest::Url;
use serde_json::{Map, Value};
use thiserror::Error;

/// Relay configuration inflated from the JSON blob stored in the host
/// function's description field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    collector_url: String,
    app_id: String,
}

impl RelayConfig {
    /// Parses the description blob. Requires `collector_url` and `app_id`
    /// string fields; anything else in the blob is ignored.
    pub fn from_description(description: &str) -> Result<Self, ConfigError> {
        let fields: Map<String, Value> =
            serde_json::from_str(description).map_err(|source| ConfigError::Unparseable {
                description: description.to_string(),
                source,
            })?;
        let collector_url = require_string(&fields, description, "collector_url")?;
        let app_id = require_string(&fields, description, "app_id")?;
        Ok(Self {
            collector_url,
            app_id,
        })
    }

    /// The collector URL exactly as configured.
    pub fn collector_url(&self) -> &str {
        &self.collector_url
    }

    /// The application id exactly as configured.
    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    /// Validates and parses the configured collector URL.
    pub fn collector_endpoint(&self) -> Result<Url, ConfigError> {
        Url::parse(&self.collector_url).map_err(|err| ConfigError::InvalidCollectorUrl {
            url: self.collector_url.clone(),
            message: err.to_string(),
        })
    }
}

fn require_string(
    fields: &Map<String, Value>,
    description: &str,
    field: &'static str,
) -> Result<String, ConfigError> {
    fields
        .get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ConfigError::MissingField {
            description: description.to_string(),
            field,
        })
}

/// Errors surfaced while inflating the relay configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config JSON in the function description ({description:?}) could not be parsed: {source}")]
    Unparseable {
        description: String,
        source: serde_json::Error,
    },
    #[error("config JSON in the function description ({description:?}) does not contain a {field} field")]
    MissingField {
        description: String,
        field: &'static str,
    },
    #[error("collector URL {url:?} is invalid: {message}")]
    InvalidCollectorUrl { url: String, message: String },
}

use std::env;
use thiserror::Error;

/// Environment variable consulted by [`EnvFunctionMetadata`].
pub const FUNCTION_DESCRIPTION_VAR: &str = "EVRELAY_FUNCTION_DESCRIPTION";

/// Extracts the region from a resource name. The region is the fourth
/// colon-separated field of an ARN.
pub fn region_from_arn(arn: &str) -> Result<&str, IdentityError> {
    if arn.trim().is_empty() {
        return Err(IdentityError::EmptyArn);
    }
    arn.split(':')
        .nth(3)
        .filter(|region| !region.is_empty())
        .ok_or_else(|| IdentityError::MalformedArn(arn.to_string()))
}

/// Errors surfaced while resolving the host function's identity.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdentityError {
    #[error("cannot extract a region from an empty ARN")]
    EmptyArn,
    #[error("could not find a region in ARN {0:?}")]
    MalformedArn(String),
}

/// Capability seam over the cloud control plane: given a region and a
/// function name, return the function's description field.
pub trait FunctionMetadata {
    fn describe(&self, region: &str, function_name: &str) -> Result<String, MetadataError>;
}

/// Errors surfaced by a metadata lookup.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MetadataError {
    #[error("no description is available for function {function:?}")]
    DescriptionUnavailable { function: String },
    #[error("metadata lookup failed: {0}")]
    Lookup(String),
}

/// Metadata source backed by the process environment. The control-plane SDK
/// binding is environment surface; deployments export the description blob
/// under [`FUNCTION_DESCRIPTION_VAR`].
#[derive(Debug, Default, Clone, Copy)]
pub struct EnvFunctionMetadata;

impl EnvFunctionMetadata {
    pub fn new() -> Self {
        Self
    }
}

impl FunctionMetadata for EnvFunctionMetadata {
    fn describe(&self, _region: &str, function_name: &str) -> Result<String, MetadataError> {
        env::var(FUNCTION_DESCRIPTION_VAR).map_err(|_| MetadataError::DescriptionUnavailable {
            function: function_name.to_string(),
        })
    }
}

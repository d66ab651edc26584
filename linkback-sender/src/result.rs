use crate::error::{LinkbackError, Result};
use serde::{Deserialize, Serialize};
use url::Url;

/// A single source → target notification to deliver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkbackRequest {
    pub source: Url,
    pub target: Url,
}

impl LinkbackRequest {
    /// Both URLs must be absolute.
    pub fn new(source: &str, target: &str) -> Result<Self> {
        Ok(Self {
            source: parse_absolute(source)?,
            target: parse_absolute(target)?,
        })
    }
}

fn parse_absolute(raw: &str) -> Result<Url> {
    Url::parse(raw).map_err(|e| LinkbackError::InvalidUrl(format!("{}: {}", raw, e)))
}

/// Outcome of endpoint discovery for a target URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndpointResult {
    Found(String),
    NotFound,
}

impl EndpointResult {
    pub fn endpoint(&self) -> Option<&str> {
        match self {
            Self::Found(endpoint) => Some(endpoint),
            Self::NotFound => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureReason {
    /// The target does not advertise a pingback endpoint.
    NoEndpoint,
    /// The endpoint was found but the call failed.
    Remote { code: i32, description: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum PingbackOutcome {
    Success,
    Failure(FailureReason),
}

impl PingbackOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    pub(crate) fn remote(err: &LinkbackError) -> Self {
        Self::Failure(FailureReason::Remote {
            code: err.fault_code(),
            description: err.description(),
        })
    }
}

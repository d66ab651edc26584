use thiserror::Error;

/// XML-RPC fault code reported when the endpoint could not be reached.
pub const TRANSPORT_ERROR_CODE: i32 = -32300;

/// XML-RPC fault code reported when the endpoint's reply could not be parsed.
pub const PARSE_ERROR_CODE: i32 = -32700;

#[derive(Error, Debug)]
pub enum LinkbackError {
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP error: {status} {reason}")]
    HttpStatus { status: u16, reason: String },

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Fault {code}: {description}")]
    Fault { code: i32, description: String },

    #[error("HTTP client error: {0}")]
    Client(String),
}

impl LinkbackError {
    pub(crate) fn from_status(status: reqwest::StatusCode) -> Self {
        Self::HttpStatus {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
        }
    }

    /// Numeric code reported for this error when a pingback call fails.
    pub fn fault_code(&self) -> i32 {
        match self {
            Self::Fault { code, .. } => *code,
            Self::HttpStatus { status, .. } => i32::from(*status),
            Self::Parse(_) => PARSE_ERROR_CODE,
            Self::Transport(_) | Self::InvalidUrl(_) | Self::Client(_) => TRANSPORT_ERROR_CODE,
        }
    }

    /// Human readable description paired with [`fault_code`](Self::fault_code).
    pub fn description(&self) -> String {
        match self {
            Self::Fault { description, .. } => description.clone(),
            Self::HttpStatus { reason, .. } => reason.clone(),
            Self::Transport(e) => e.to_string(),
            Self::InvalidUrl(msg) | Self::Parse(msg) | Self::Client(msg) => msg.clone(),
        }
    }
}

pub type Result<T> = std::result::Result<T, LinkbackError>;

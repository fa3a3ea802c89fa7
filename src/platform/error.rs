//! Client error types with transient/permanent classification.
//!
//! Adapters never retry on their own; the classification is for callers that
//! run a retry policy (see the incoming-message poller).

use std::time::Duration;

/// Error from a social platform client.
#[derive(Debug)]
pub struct ClientError {
    /// The kind of error
    pub kind: ClientErrorKind,
    /// HTTP status code, if applicable
    pub status_code: Option<u16>,
    /// Error message
    pub message: String,
}

impl ClientError {
    fn new(kind: ClientErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            status_code: None,
            message: message.into(),
        }
    }

    /// Transport failure (connect, timeout, body read).
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ClientErrorKind::Network, message)
    }

    /// Non-2xx response.
    pub fn http(status_code: u16, message: impl Into<String>) -> Self {
        Self {
            kind: ClientErrorKind::Http,
            status_code: Some(status_code),
            message: message.into(),
        }
    }

    /// Malformed payload.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::new(ClientErrorKind::Parse, message)
    }

    /// The service answered but had nothing for the request.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ClientErrorKind::NotFound, message)
    }

    /// A write was attempted before `connect()`.
    pub fn not_connected(operation: &str) -> Self {
        Self::new(
            ClientErrorKind::NotConnected,
            format!("{} requires a connected signer; call connect() first", operation),
        )
    }

    /// The backend does not offer this operation.
    pub fn unsupported(operation: &str) -> Self {
        Self::new(
            ClientErrorKind::Unsupported,
            format!("{} is not supported by this client", operation),
        )
    }

    /// The signer refused or failed to sign.
    pub fn signing(message: impl Into<String>) -> Self {
        Self::new(ClientErrorKind::Signing, message)
    }

    /// A setting the operation needs is missing.
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ClientErrorKind::Config, message)
    }

    /// Map a reqwest failure onto a network error.
    pub fn from_reqwest(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::network(format!("Request timeout: {}", e))
        } else if e.is_connect() {
            Self::network(format!("Connection failed: {}", e))
        } else if e.is_decode() {
            Self::parse(format!("Failed to decode response: {}", e))
        } else {
            Self::network(format!("Request failed: {}", e))
        }
    }

    /// Check if this error is transient and worth retrying.
    pub fn is_transient(&self) -> bool {
        match self.kind {
            ClientErrorKind::Network => true,
            ClientErrorKind::Http => self
                .status_code
                .map(|code| classify_http_status(code).is_transient())
                .unwrap_or(false),
            _ => false,
        }
    }

    /// Suggested delay before retry attempt `attempt` (0-based).
    ///
    /// Exponential backoff from a per-status base, capped at 60 seconds.
    pub fn suggested_delay(&self, attempt: u32) -> Duration {
        let base_delay = match (self.kind, self.status_code) {
            (ClientErrorKind::Http, Some(429)) => Duration::from_secs(5),
            (ClientErrorKind::Http, _) => Duration::from_secs(2),
            _ => Duration::from_secs(1),
        };

        let multiplier = 2u64.saturating_pow(attempt);
        let delay_secs = base_delay.as_secs().saturating_mul(multiplier);

        Duration::from_secs(delay_secs.min(60))
    }
}

impl std::fmt::Display for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.status_code {
            Some(code) => write!(f, "{} (HTTP {}): {}", self.kind, code, self.message),
            None => write!(f, "{}: {}", self.kind, self.message),
        }
    }
}

impl std::error::Error for ClientError {}

/// Classification of client errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientErrorKind {
    /// Connection failed, timeout, truncated body
    Network,
    /// Service answered with a non-2xx status
    Http,
    /// Response could not be parsed
    Parse,
    /// Lookup returned nothing
    NotFound,
    /// Write attempted while disconnected
    NotConnected,
    /// Operation not offered by this backend
    Unsupported,
    /// Signing the outgoing message failed
    Signing,
    /// Missing setting needed by the operation
    Config,
}

impl std::fmt::Display for ClientErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientErrorKind::Network => write!(f, "Network error"),
            ClientErrorKind::Http => write!(f, "HTTP error"),
            ClientErrorKind::Parse => write!(f, "Parse error"),
            ClientErrorKind::NotFound => write!(f, "Not found"),
            ClientErrorKind::NotConnected => write!(f, "Not connected"),
            ClientErrorKind::Unsupported => write!(f, "Unsupported operation"),
            ClientErrorKind::Signing => write!(f, "Signing error"),
            ClientErrorKind::Config => write!(f, "Configuration error"),
        }
    }
}

/// Whether an HTTP status is worth retrying.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    RateLimited,
    ServerError,
    ClientError,
}

impl StatusClass {
    pub fn is_transient(&self) -> bool {
        matches!(self, StatusClass::RateLimited | StatusClass::ServerError)
    }
}

/// Classify an HTTP status code.
pub fn classify_http_status(status: u16) -> StatusClass {
    match status {
        429 => StatusClass::RateLimited,
        400..=499 => StatusClass::ClientError,
        _ => StatusClass::ServerError,
    }
}

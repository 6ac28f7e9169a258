//! Classification of failed backend calls
//!
//! Every screen routes its caught errors through here so the
//! connectivity-vs-application distinction stays in one place.

use std::fmt;

/// Message shown when no response arrived at all
pub const SERVER_UNREACHABLE_MESSAGE: &str =
    "AgroSmart server is unreachable. Check that the backend is running and try again.";

/// Fallback message when an error response has no usable body
pub const GENERIC_ERROR_MESSAGE: &str = "The server returned an unexpected error.";

/// A failed backend call, tagged by the transport layer.
///
/// `Network` means no response was received (connection refused, DNS
/// failure, timeout). `Http` means a response arrived with an error
/// status. `Cancelled` means the caller abandoned the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallError {
    Network(String),
    Http { status: u16, body: String },
    Cancelled,
}

impl fmt::Display for CallError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallError::Network(detail) => write!(f, "network failure: {}", detail),
            CallError::Http { status, .. } => write!(f, "HTTP {}", status),
            CallError::Cancelled => write!(f, "request cancelled"),
        }
    }
}

/// The verdict on a failed call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// The backend is unreachable; the connectivity store must record a failure
    ServerDown { message: String },
    /// The backend responded with an application-level error; connectivity is fine
    Application { status: u16, message: String },
    /// The request was cancelled by its caller; nothing to report or render
    Ignored,
}

impl Classification {
    pub fn is_server_down(&self) -> bool {
        matches!(self, Classification::ServerDown { .. })
    }

    /// User-facing message, if this classification carries one
    pub fn message(&self) -> Option<&str> {
        match self {
            Classification::ServerDown { message } => Some(message),
            Classification::Application { message, .. } => Some(message),
            Classification::Ignored => None,
        }
    }
}

/// Classify a failed call. Pure, no side effects.
pub fn classify(error: &CallError) -> Classification {
    match error {
        CallError::Network(_) => Classification::ServerDown {
            message: SERVER_UNREACHABLE_MESSAGE.to_string(),
        },
        CallError::Http { status, body } => Classification::Application {
            status: *status,
            message: extract_message(body).unwrap_or_else(|| GENERIC_ERROR_MESSAGE.to_string()),
        },
        CallError::Cancelled => Classification::Ignored,
    }
}

/// Pull a human-readable message out of a JSON error body.
///
/// The backend is inconsistent about the field name, so both `message`
/// and `error` are accepted.
fn extract_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    for key in ["message", "error"] {
        if let Some(message) = value.get(key).and_then(|v| v.as_str()) {
            return Some(message.to_string());
        }
    }
    None
}

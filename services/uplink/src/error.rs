//! Error types for the uplink service

/// Errors that can occur in the uplink service
#[derive(Debug, thiserror::Error)]
pub enum UplinkError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP client error: {0}")]
    Http(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for uplink operations
pub type Result<T> = std::result::Result<T, UplinkError>;

use axum::http::StatusCode;
use std::io;

/// Error type for classifying, rendering and configuring the relay
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("{}", unknown_event_message(.label.as_deref()))]
    UnknownEvent { label: Option<String> },

    #[error("Missing required field '{path}'")]
    MissingField { path: String },

    #[error("Malformed timestamp in '{path}': {value:?}")]
    MalformedTimestamp { path: String, value: String },

    #[error("Invalid payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    #[error("TOML parsing error: {0}")]
    TomlParseError(#[from] toml::de::Error),
}

fn unknown_event_message(label: Option<&str>) -> String {
    match label {
        Some(label) => format!("Invalid event '{}'", label),
        None => "Invalid event".to_string(),
    }
}

impl RelayError {
    pub fn missing(path: impl Into<String>) -> Self {
        RelayError::MissingField { path: path.into() }
    }

    /// HTTP status a webhook sender sees for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            RelayError::UnknownEvent { .. } | RelayError::InvalidPayload(_) => {
                StatusCode::BAD_REQUEST
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Helper type for Results that use RelayError
pub type Result<T> = std::result::Result<T, RelayError>;

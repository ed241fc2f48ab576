//! Satchel error types

/// Satchel error types
///
/// `Clone` so that the outcome of a single token refresh can be handed to
/// every request that waited on it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SatchelError {
    // Transport errors
    #[error("HTTP error: {0}")]
    Http(String),

    /// Non-2xx response, normalised.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    // Data errors
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("JSON error: {0}")]
    Decode(String),

    // Session errors
    /// The request that owned the in-flight refresh was dropped before the
    /// refresh completed.
    #[error("token refresh abandoned before completion")]
    RefreshAbandoned,

    #[error("credential storage error: {0}")]
    Storage(String),

    #[error("configuration error: {0}")]
    Configuration(String),
}

impl SatchelError {
    /// Build an `Api` error.
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        SatchelError::Api {
            status,
            message: message.into(),
        }
    }

    /// HTTP status carried by the error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            SatchelError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the server refused the session (HTTP 401).
    ///
    /// Route guards treat this as "not authenticated".
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    /// Whether retrying the same request later might succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            SatchelError::Http(_) => true,
            SatchelError::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for SatchelError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            SatchelError::Decode(err.to_string())
        } else {
            SatchelError::Http(err.to_string())
        }
    }
}

impl From<serde_json::Error> for SatchelError {
    fn from(err: serde_json::Error) -> Self {
        SatchelError::Decode(err.to_string())
    }
}

/// Result type alias for Satchel operations
pub type Result<T> = std::result::Result<T, SatchelError>;

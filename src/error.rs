use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    /// Network failure before any HTTP status was received
    #[error("Transport error: {0}")]
    Transport(String),

    /// Request timed out at the transport layer
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// Server answered with a 4xx or 5xx status
    #[error("Server returned status {status}: {body}")]
    Server { status: u16, body: String },

    /// Successful response that lacks a field the workflow needs
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The search job reported a failed status
    #[error("Search {search_id} failed with status '{status}'")]
    SearchFailed { search_id: String, status: String },

    /// The status poll exceeded the configured poll budget
    #[error("Search {search_id} still pending after {polls} status checks")]
    PollLimitExceeded { search_id: String, polls: u32 },

    /// The caller cancelled the workflow
    #[error("Search cancelled")]
    Cancelled,

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid state transition
    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),
}

impl AppError {
    /// Get error code string
    pub fn error_code(&self) -> &str {
        match self {
            AppError::Transport(_) => "TRANSPORT_ERROR",
            AppError::Timeout(_) => "TIMEOUT",
            AppError::Server { .. } => "SERVER_ERROR",
            AppError::Protocol(_) => "PROTOCOL_ERROR",
            AppError::SearchFailed { .. } => "SEARCH_FAILED",
            AppError::PollLimitExceeded { .. } => "POLL_LIMIT_EXCEEDED",
            AppError::Cancelled => "CANCELLED",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Configuration(_) => "CONFIGURATION_ERROR",
            AppError::Serialization(_) => "SERIALIZATION_ERROR",
            AppError::Io(_) => "IO_ERROR",
            AppError::InvalidStateTransition(_) => "INVALID_STATE_TRANSITION",
        }
    }

    /// HTTP status carried by a server error, if any
    pub fn http_status(&self) -> Option<u16> {
        match self {
            AppError::Server { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the failure happened before the server produced a response.
    /// Only these are eligible for the opt-in poll retry.
    pub fn is_transient(&self) -> bool {
        matches!(self, AppError::Transport(_) | AppError::Timeout(_))
    }
}

/// Conversion from reqwest::Error
impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AppError::Timeout(err.to_string())
        } else if err.is_connect() {
            AppError::Transport(format!("Failed to connect: {}", err))
        } else if err.is_decode() {
            AppError::Protocol(format!("Undecodable response body: {}", err))
        } else {
            AppError::Transport(err.to_string())
        }
    }
}

/// Conversion from serde_json::Error
impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Conversion from validator::ValidationErrors
impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(err.to_string())
    }
}

/// Conversion from config::ConfigError
impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Configuration(err.to_string())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, AppError>;

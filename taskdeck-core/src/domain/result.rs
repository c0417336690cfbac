//! Result and error types for the core library

use std::collections::BTreeMap;

use thiserror::Error;

/// Core library error type
///
/// Every failure that reaches a user action is one of these. Authentication
/// failures on ordinary API calls are recovered once by the refresh
/// interceptor before they surface as `SessionExpired`.
#[derive(Error, Debug)]
pub enum Error {
    /// Bad login/register credentials
    #[error("Credentials rejected: {0}")]
    CredentialsRejected(String),

    /// The session could not be refreshed and has been cleared
    #[error("Session expired: {0}")]
    SessionExpired(String),

    /// Field-level validation failure (client-side or from the server)
    #[error("Validation failed: {}", format_validation(.message, .field_errors))]
    ValidationFailed {
        message: String,
        field_errors: BTreeMap<String, String>,
    },

    /// Transport failure (connection refused, timeout, ...)
    #[error("Network unavailable: {0}")]
    NetworkUnavailable(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Server error (HTTP {status}): {message}")]
    ServerError { status: u16, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    /// Persisted token store failure
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

fn format_validation(message: &str, field_errors: &BTreeMap<String, String>) -> String {
    if field_errors.is_empty() {
        return message.to_string();
    }
    let fields = field_errors
        .iter()
        .map(|(field, msg)| format!("{}: {}", field, msg))
        .collect::<Vec<_>>()
        .join(", ");
    format!("{} ({})", message, fields)
}

impl Error {
    /// Create a validation error without field details
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::ValidationFailed {
            message: msg.into(),
            field_errors: BTreeMap::new(),
        }
    }

    /// Create a validation error for a single field
    pub fn field(field: impl Into<String>, msg: impl Into<String>) -> Self {
        let msg = msg.into();
        let mut field_errors = BTreeMap::new();
        field_errors.insert(field.into(), msg.clone());
        Self::ValidationFailed {
            message: msg,
            field_errors,
        }
    }

    /// Create a storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Field → message pairs, empty for non-validation errors
    pub fn field_errors(&self) -> Option<&BTreeMap<String, String>> {
        match self {
            Self::ValidationFailed { field_errors, .. } => Some(field_errors),
            _ => None,
        }
    }

    /// Short event name used by the event log
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CredentialsRejected(_) => "credentials_rejected",
            Self::SessionExpired(_) => "session_expired",
            Self::ValidationFailed { .. } => "validation_failed",
            Self::NetworkUnavailable(_) => "network_unavailable",
            Self::NotFound(_) => "not_found",
            Self::ServerError { .. } => "server_error",
            Self::Config(_) => "config_error",
            Self::Storage(_) => "storage_error",
            Self::Io(_) => "io_error",
            Self::Json(_) => "json_error",
        }
    }
}

/// Core library result type
pub type Result<T> = std::result::Result<T, Error>;

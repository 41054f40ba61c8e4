//! Error types for the middleman-tools library.
//!
//! Every failure a caller can observe is a [`MiddlemanError`]. The variants
//! form a closed set: one per HTTP status class the API documents, plus
//! connection, validation and configuration failures raised locally.
//!
//! [`ErrorKind`] is the field-less mirror of those variants. Adapters (CLI,
//! tool wrappers, the MCP server) use it to report *which* kind of failure
//! happened without re-deriving it from the message text.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// All errors returned by the middleman-tools library.
///
/// Each HTTP-derived variant carries the message the remote service sent,
/// when it sent one. `Display` falls back to a kind-specific default.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MiddlemanError {
    // ── HTTP status errors ───────────────────────────────────────────────
    /// HTTP 402: the account has run out of credit.
    #[error("{}", or_default(.message, "Not enough credit"))]
    NotEnoughCredit { message: Option<String> },

    /// HTTP 401 or 403: the API key was rejected.
    #[error(
        "{}",
        or_default(.message, "Forbidden: authentication failed or access denied")
    )]
    Forbidden { status: u16, message: Option<String> },

    /// HTTP 404: unknown endpoint or template id.
    #[error("{}", or_default(.message, "Resource not found"))]
    NotFound { message: Option<String> },

    /// HTTP 5xx.
    #[error("{}", or_default(.message, "Internal server error"))]
    Internal { status: u16, message: Option<String> },

    /// HTTP 422 (`status` is set), or a response/input that failed local
    /// validation (`status` is `None`).
    #[error("{}", or_default(.message, "Validation error"))]
    Validation {
        status: Option<u16>,
        message: Option<String>,
    },

    /// Any other non-2xx status.
    #[error("{}", api_message(.status, .message))]
    Api { status: u16, message: Option<String> },

    // ── Transport errors ─────────────────────────────────────────────────
    /// DNS failure, refused connection, timeout or a broken response stream.
    #[error("{}", or_default(.message, "Failed to connect to the Middleman API"))]
    Connection { message: Option<String> },

    // ── Config errors ────────────────────────────────────────────────────
    /// Client configuration is unusable (missing key, malformed base URL…).
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

fn or_default<'a>(message: &'a Option<String>, default: &'a str) -> &'a str {
    message.as_deref().unwrap_or(default)
}

fn api_message(status: &u16, message: &Option<String>) -> String {
    match message {
        Some(m) => m.clone(),
        None => format!("Unexpected HTTP status {status}"),
    }
}

impl MiddlemanError {
    /// Shorthand for a [`MiddlemanError::Validation`] with a message.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            status: None,
            message: Some(message.into()),
        }
    }

    /// Shorthand for a [`MiddlemanError::Connection`] with a message.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: Some(message.into()),
        }
    }

    /// Build the error for a non-2xx `status`.
    ///
    /// Returns `None` for 2xx (and 1xx/3xx never reach here because reqwest
    /// follows redirects).
    pub fn from_status(status: u16, message: Option<String>) -> Option<Self> {
        let kind = ErrorKind::from_status(status)?;
        Some(match kind {
            ErrorKind::NotEnoughCredit => Self::NotEnoughCredit { message },
            ErrorKind::Forbidden => Self::Forbidden { status, message },
            ErrorKind::NotFound => Self::NotFound { message },
            ErrorKind::Internal => Self::Internal { status, message },
            ErrorKind::Validation => Self::Validation {
                status: Some(status),
                message: message.map(|m| format!("Validation error: {m}")),
            },
            ErrorKind::Api => Self::Api { status, message },
            // from_status never yields the local-only kinds.
            ErrorKind::Connection | ErrorKind::InvalidConfig => Self::Api { status, message },
        })
    }

    /// The closed kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotEnoughCredit { .. } => ErrorKind::NotEnoughCredit,
            Self::Forbidden { .. } => ErrorKind::Forbidden,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Internal { .. } => ErrorKind::Internal,
            Self::Validation { .. } => ErrorKind::Validation,
            Self::Api { .. } => ErrorKind::Api,
            Self::Connection { .. } => ErrorKind::Connection,
            Self::InvalidConfig(_) => ErrorKind::InvalidConfig,
        }
    }

    /// HTTP status that produced this error, when there was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::NotEnoughCredit { .. } => Some(402),
            Self::NotFound { .. } => Some(404),
            Self::Forbidden { status, .. }
            | Self::Internal { status, .. }
            | Self::Api { status, .. } => Some(*status),
            Self::Validation { status, .. } => *status,
            Self::Connection { .. } | Self::InvalidConfig(_) => None,
        }
    }

    /// The remote (or locally attached) message, without the default text.
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::NotEnoughCredit { message }
            | Self::Forbidden { message, .. }
            | Self::NotFound { message }
            | Self::Internal { message, .. }
            | Self::Validation { message, .. }
            | Self::Api { message, .. }
            | Self::Connection { message } => message.as_deref(),
            Self::InvalidConfig(m) => Some(m),
        }
    }
}

/// Field-less discriminant of [`MiddlemanError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotEnoughCredit,
    Forbidden,
    NotFound,
    Internal,
    Validation,
    Api,
    Connection,
    InvalidConfig,
}

impl ErrorKind {
    /// Map an HTTP status code to the error kind it raises.
    ///
    /// | Status | Kind |
    /// |--------|------|
    /// | 2xx | `None` |
    /// | 402 | `NotEnoughCredit` |
    /// | 401, 403 | `Forbidden` |
    /// | 404 | `NotFound` |
    /// | 422 | `Validation` |
    /// | ≥ 500 | `Internal` |
    /// | anything else | `Api` |
    pub fn from_status(status: u16) -> Option<Self> {
        match status {
            200..=299 => None,
            402 => Some(Self::NotEnoughCredit),
            401 | 403 => Some(Self::Forbidden),
            404 => Some(Self::NotFound),
            422 => Some(Self::Validation),
            500.. => Some(Self::Internal),
            _ => Some(Self::Api),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotEnoughCredit => "not_enough_credit",
            Self::Forbidden => "forbidden",
            Self::NotFound => "not_found",
            Self::Internal => "internal",
            Self::Validation => "validation",
            Self::Api => "api",
            Self::Connection => "connection",
            Self::InvalidConfig => "invalid_config",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//! Error types for toolshelf.
//!
//! A unified error type with explicit variants for transport,
//! authentication, protocol, input validation and storage failures.

use std::fmt;
use thiserror::Error;

/// The unified error type for toolshelf operations.
///
/// `Clone` so that a single in-flight refresh can hand the same outcome to
/// every caller waiting on it.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// Network transport errors (connection, timeout, generic HTTP).
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The backend rejected a session or refresh token.
    #[error("authentication error: {0}")]
    Auth(#[from] AuthError),

    /// Unexpected or malformed responses.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Input validation errors (empty token, bad URL, bad stored JSON).
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInputError),

    /// The durable key-value store could not be used.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl Error {
    /// Flatten this error into the kind recorded on the session.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Transport(_) => ErrorKind::Network,
            Error::Auth(AuthError::SessionInvalid { status }) => {
                ErrorKind::SessionInvalid { status: *status }
            }
            Error::Auth(AuthError::RefreshInvalid) => ErrorKind::RefreshInvalid,
            Error::Auth(AuthError::InvalidCredentials { .. }) => ErrorKind::InvalidCredentials,
            Error::Protocol(_) => ErrorKind::Protocol,
            Error::InvalidInput(_) => ErrorKind::Validation,
            Error::Storage(_) => ErrorKind::Storage,
        }
    }

    /// HTTP status attached to this error, if the backend answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Auth(AuthError::SessionInvalid { status }) => Some(*status),
            Error::Protocol(err) => err.status,
            _ => None,
        }
    }

    /// True when the access token was rejected as invalid and a refresh may help.
    pub fn is_refreshable(&self) -> bool {
        self.status() == Some(401) && matches!(self, Error::Auth(_))
    }
}

/// Transport-level errors.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// Network connection failed.
    #[error("connection failed: {message}")]
    Connection { message: String },

    /// Request timed out.
    #[error("request timed out after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    /// Generic HTTP error.
    #[error("HTTP error: {message}")]
    Http { message: String },
}

/// Authentication-related errors.
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    /// The backend refused the access token with a non-2xx status.
    #[error("session rejected with HTTP {status}")]
    SessionInvalid { status: u16 },

    /// Refresh token is expired or revoked.
    #[error("refresh token invalid")]
    RefreshInvalid,

    /// Login or registration was refused.
    #[error("invalid credentials: {message}")]
    InvalidCredentials { message: String },
}

/// Protocol-level errors: the backend answered, but not in a usable way.
#[derive(Debug, Clone)]
pub struct ProtocolError {
    /// HTTP status code, when the failure is tied to one.
    pub status: Option<u16>,
    /// Description of what was wrong.
    pub message: String,
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(status) = self.status {
            write!(f, "HTTP {}: ", status)?;
        }
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ProtocolError {}

impl ProtocolError {
    /// Create a new protocol error.
    pub fn new(status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// A 2xx response whose body could not be used.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(None, message)
    }
}

/// Input validation errors.
#[derive(Debug, Clone, Error)]
pub enum InvalidInputError {
    /// A token was empty.
    #[error("{name} must not be empty")]
    EmptyToken { name: &'static str },

    /// Invalid API base URL.
    #[error("invalid API URL '{value}': {reason}")]
    ApiUrl { value: String, reason: String },

    /// Generic invalid input.
    #[error("invalid input: {message}")]
    Other { message: String },
}

/// Storage errors from a [`TokenStore`](crate::TokenStore).
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    /// The backing store could not be read or written.
    #[error("storage unavailable: {message}")]
    Unavailable { message: String },

    /// The backing store exists but its contents are unreadable.
    #[error("storage corrupt: {message}")]
    Corrupt { message: String },
}

/// Flattened error classification recorded as `Session::last_error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// No response was received.
    Network,
    /// The server explicitly rejected the access token.
    SessionInvalid { status: u16 },
    /// The refresh token was rejected.
    RefreshInvalid,
    /// Login/registration refused.
    InvalidCredentials,
    /// Malformed or unexpected response.
    Protocol,
    /// Programmer error, such as an empty token.
    Validation,
    /// Storage could not be used.
    Storage,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Network => write!(f, "network error"),
            ErrorKind::SessionInvalid { status } => write!(f, "session invalid (HTTP {})", status),
            ErrorKind::RefreshInvalid => write!(f, "refresh token invalid"),
            ErrorKind::InvalidCredentials => write!(f, "invalid credentials"),
            ErrorKind::Protocol => write!(f, "protocol error"),
            ErrorKind::Validation => write!(f, "validation error"),
            ErrorKind::Storage => write!(f, "storage unavailable"),
        }
    }
}

//! Error types for the vision link.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use vision_link::{ConnectionManager, Result};
//!
//! async fn example(link: &ConnectionManager) -> Result<i32> {
//!     let response = link.send_and_parse("GET_COUNT").await?;
//!     response.get_int("count")
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Configuration | [`Error::Config`], [`Error::InvalidArgument`] |
//! | Transport | [`Error::Connection`], [`Error::Protocol`], [`Error::Timeout`] |
//! | Remote | [`Error::Remote`] |
//! | Data | [`Error::KeyNotFound`], [`Error::Format`] |
//! | External | [`Error::Io`], [`Error::Json`], [`Error::Url`], [`Error::Image`], [`Error::Base64`] |
//!
//! Transport errors always leave the client disconnected so the next command
//! starts with a fresh TCP handshake. Remote and data errors never touch the
//! connection.

// ============================================================================
// Imports
// ============================================================================

use std::io::{Error as IoError, ErrorKind};
use std::result::Result as StdResult;

use thiserror::Error;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Each variant includes relevant context for debugging.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Configuration error.
    ///
    /// Returned when client options are invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// Invalid argument passed to an operation.
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Description of the invalid argument.
        message: String,
    },

    // ========================================================================
    // Transport Errors
    // ========================================================================
    /// TCP connection could not be established.
    ///
    /// Covers DNS failures, refused connections and connect timeouts.
    #[error("Connection to {endpoint} failed: {message}")]
    Connection {
        /// Target `host:port`.
        endpoint: String,
        /// Description of the failure.
        message: String,
    },

    /// Peer closed or dropped the connection during an exchange.
    #[error("Protocol error: {message}")]
    Protocol {
        /// Description of the protocol violation.
        message: String,
    },

    /// Operation timeout.
    ///
    /// Returned when a command round trip exceeds the configured budget.
    #[error("Timeout after {timeout_ms}ms: {operation}")]
    Timeout {
        /// Description of the operation that timed out.
        operation: String,
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    // ========================================================================
    // Remote Errors
    // ========================================================================
    /// The remote service reported a failure inside its response payload.
    #[error("Remote service reported an error: {response}")]
    Remote {
        /// The raw response that carried the error sentinel.
        response: String,
    },

    // ========================================================================
    // Data Errors
    // ========================================================================
    /// Key missing from the parsed response.
    #[error("Key not found: '{key}'")]
    KeyNotFound {
        /// The requested key.
        key: String,
    },

    /// Value could not be converted to the requested type.
    #[error("Invalid {expected} value {value:?} for key '{key}'{}", index_suffix(.index))]
    Format {
        /// The requested key.
        key: String,
        /// Offending element index for array accessors.
        index: Option<usize>,
        /// The raw value that failed to parse.
        value: String,
        /// Name of the requested type.
        expected: &'static str,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// JSON deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Endpoint URL parse error.
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// Image decode or encode error.
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// Base64 decode error.
    #[error("Base64 error: {0}")]
    Base64(#[from] base64::DecodeError),
}

fn index_suffix(index: &Option<usize>) -> String {
    match index {
        Some(index) => format!(" at index {index}"),
        None => String::new(),
    }
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates an invalid argument error.
    #[inline]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Creates a connection error.
    #[inline]
    pub fn connection(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Connection {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    /// Creates a protocol error.
    #[inline]
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Creates a timeout error.
    #[inline]
    pub fn timeout(operation: impl Into<String>, timeout_ms: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            timeout_ms,
        }
    }

    /// Creates a remote error carrying the raw response.
    #[inline]
    pub fn remote(response: impl Into<String>) -> Self {
        Self::Remote {
            response: response.into(),
        }
    }

    /// Creates a key not found error.
    #[inline]
    pub fn key_not_found(key: impl Into<String>) -> Self {
        Self::KeyNotFound { key: key.into() }
    }

    /// Creates a format error for a scalar value.
    #[inline]
    pub fn format(
        key: impl Into<String>,
        value: impl Into<String>,
        expected: &'static str,
    ) -> Self {
        Self::Format {
            key: key.into(),
            index: None,
            value: value.into(),
            expected,
        }
    }

    /// Creates a format error for an array element.
    #[inline]
    pub fn element_format(
        key: impl Into<String>,
        index: usize,
        value: impl Into<String>,
        expected: &'static str,
    ) -> Self {
        Self::Format {
            key: key.into(),
            index: Some(index),
            value: value.into(),
            expected,
        }
    }

    /// Classifies an I/O failure that happened mid-exchange.
    ///
    /// Resets and broken pipes mean the peer dropped the connection, which is
    /// reported as [`Error::Protocol`]. Anything else stays [`Error::Io`].
    pub(crate) fn exchange_io(err: IoError) -> Self {
        match err.kind() {
            ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::BrokenPipe
            | ErrorKind::UnexpectedEof => {
                Self::protocol(format!("connection dropped mid-exchange: {err}"))
            }
            _ => Self::Io(err),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a timeout error.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Returns `true` if this error came from the transport layer.
    ///
    /// Transport errors leave the client disconnected.
    #[inline]
    #[must_use]
    pub fn is_transport_error(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. } | Self::Protocol { .. } | Self::Timeout { .. } | Self::Io(_)
        )
    }

    /// Returns `true` if the remote service reported a failure.
    #[inline]
    #[must_use]
    pub fn is_remote_error(&self) -> bool {
        matches!(self, Self::Remote { .. })
    }

    /// Returns `true` if this is a strict accessor error.
    #[inline]
    #[must_use]
    pub fn is_data_error(&self) -> bool {
        matches!(self, Self::KeyNotFound { .. } | Self::Format { .. })
    }
}

// ============================================================================
// Tests
// ============================================================================

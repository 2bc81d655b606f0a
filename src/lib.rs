//! Vision Link - Resilient TCP client for line-oriented vision services.
//!
//! This library talks to an industrial vision service over a single TCP
//! socket and turns its delimited-text responses into typed values.
//!
//! # Architecture
//!
//! The client follows a request/response model over one connection:
//!
//! - **Local End (Rust)**: Sends a command, waits for exactly one response
//! - **Remote End (Vision service)**: Answers each command with one line
//!
//! Key design principles:
//!
//! - One [`ConnectionManager`] owns at most one socket, opened lazily
//! - Commands are serialized so responses never interleave
//! - Any transport failure closes the socket; the next command reconnects
//! - Responses are `key:value` pairs with bracketed arrays
//!
//! # Quick Start
//!
//! ```no_run
//! use vision_link::{ConnectionManager, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let link = ConnectionManager::builder()
//!         .host("192.168.0.20")
//!         .port(5000)
//!         .send_terminator("\r")
//!         .receive_terminator("\r")
//!         .build()?;
//!
//!     let result = link.send_and_parse("TRIGGER").await?;
//!     let passed = result.get_bool("pass")?;
//!     let xs = result.get_double_array("x")?;
//!     println!("pass={passed} x={xs:?}");
//!
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`client`] | Options and builder |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`protocol`] | Response parser and typed accessors |
//! | [`transport`] | Socket lifecycle and framing |
//! | [`workspace`] | Input/output directories and image saving |

// ============================================================================
// Modules
// ============================================================================

/// Connection options and builder.
///
/// Use [`ConnectionManager::builder()`] to create a configured client.
pub mod client;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Response protocol.
///
/// Parses delimited `key:value` text into a [`ParsedResponse`].
pub mod protocol;

/// TCP transport layer.
///
/// Owns the socket, framing and reconnect policy.
pub mod transport;

/// Filesystem helpers.
///
/// Directory layout and image saving for deployments.
pub mod workspace;

// ============================================================================
// Re-exports
// ============================================================================

// Client types
pub use client::{ClientBuilder, ClientOptions};

// Error types
pub use error::{Error, Result};

// Protocol types
pub use protocol::{FieldValue, ParsedResponse, Separators};

// Transport types
pub use transport::{ConnectionManager, ConnectionState, Terminators};

// Workspace types
pub use workspace::{ImageFormat, PathProvider, Workspace};

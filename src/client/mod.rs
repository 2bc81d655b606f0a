//! Client configuration.
//!
//! # Components
//!
//! | Type | Description |
//! |------|-------------|
//! | [`ClientOptions`] | Target, timeout and terminators |
//! | [`ClientBuilder`] | Fluent builder producing a [`ConnectionManager`] |
//!
//! [`ConnectionManager`]: crate::ConnectionManager

// ============================================================================
// Submodules
// ============================================================================

/// Fluent builder for the connection manager.
pub mod builder;

/// Connection options.
pub mod options;

// ============================================================================
// Re-exports
// ============================================================================

pub use builder::ClientBuilder;
pub use options::{ClientOptions, DEFAULT_HOST, DEFAULT_PORT, DEFAULT_TIMEOUT_MS};

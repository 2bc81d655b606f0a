//! Builder pattern for connection manager configuration.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use vision_link::ConnectionManager;
//!
//! # fn example() -> vision_link::Result<()> {
//! let link = ConnectionManager::builder()
//!     .host("192.168.0.20")
//!     .port(2000)
//!     .timeout(Duration::from_secs(3))
//!     .send_terminator("\r")
//!     .receive_terminator("\r")
//!     .build()?;
//! # let _ = link;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use crate::error::Result;
use crate::transport::ConnectionManager;

use super::options::ClientOptions;

// ============================================================================
// ClientBuilder
// ============================================================================

/// Builder for configuring a [`ConnectionManager`].
///
/// Use [`ConnectionManager::builder()`] to create a new builder.
#[derive(Debug, Default, Clone)]
pub struct ClientBuilder {
    options: ClientOptions,
}

// ============================================================================
// ClientBuilder Implementation
// ============================================================================

impl ClientBuilder {
    /// Creates a builder with default options.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces all options at once.
    #[inline]
    #[must_use]
    pub fn options(mut self, options: ClientOptions) -> Self {
        self.options = options;
        self
    }

    /// Sets the host name or IP address.
    #[inline]
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.options.host = host.into();
        self
    }

    /// Sets the TCP port.
    #[inline]
    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.options.port = port;
        self
    }

    /// Sets the connect and round-trip timeout.
    #[inline]
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.options = self.options.with_timeout(timeout);
        self
    }

    /// Sets the terminator appended to outgoing commands.
    #[inline]
    #[must_use]
    pub fn send_terminator(mut self, terminator: impl Into<String>) -> Self {
        self.options.send_terminator = Some(terminator.into());
        self
    }

    /// Sets the terminator that ends incoming responses.
    #[inline]
    #[must_use]
    pub fn receive_terminator(mut self, terminator: impl Into<String>) -> Self {
        self.options.receive_terminator = Some(terminator.into());
        self
    }

    /// Builds the manager with validation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`](crate::Error::Config) if the host is blank
    /// or the timeout is zero.
    pub fn build(self) -> Result<ConnectionManager> {
        ConnectionManager::new(self.options)
    }
}

// ============================================================================
// Tests
// ============================================================================

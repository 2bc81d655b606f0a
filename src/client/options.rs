//! Connection target and framing options.
//!
//! Options can be built in code, deserialized from JSON, or read from a
//! `tcp://` endpoint URL.
//!
//! # Example
//!
//! ```ignore
//! use std::time::Duration;
//! use vision_link::ClientOptions;
//!
//! let options = ClientOptions::new("10.0.0.12", 2000)
//!     .with_timeout(Duration::from_secs(2))
//!     .with_send_terminator("\r")
//!     .with_receive_terminator("\r");
//!
//! let same = ClientOptions::from_url("tcp://10.0.0.12:2000?timeoutMs=2000&send=%0D&receive=%0D")?;
//! assert_eq!(options, same);
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Error, Result};
use crate::transport::Terminators;

// ============================================================================
// Constants
// ============================================================================

/// Default host of the vision service.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default port of the vision service.
pub const DEFAULT_PORT: u16 = 5000;

/// Default connect and round-trip timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u32 = 5000;

/// URL scheme accepted by [`ClientOptions::from_url`].
const URL_SCHEME: &str = "tcp";

// ============================================================================
// ClientOptions
// ============================================================================

/// Connection target, timeout and terminators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ClientOptions {
    /// Host name or IP address.
    pub host: String,

    /// TCP port.
    pub port: u16,

    /// Timeout applied to connect and to each command round trip.
    pub timeout_ms: u32,

    /// Appended to every outgoing command.
    pub send_terminator: Option<String>,

    /// Marks the end of an incoming response.
    pub receive_terminator: Option<String>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            send_terminator: None,
            receive_terminator: None,
        }
    }
}

// ============================================================================
// Constructors
// ============================================================================

impl ClientOptions {
    /// Creates options for a host and port with default timeout.
    #[inline]
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Default::default()
        }
    }

    /// Deserializes options from JSON.
    ///
    /// Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// - [`Error::Json`] if the document is malformed
    /// - [`Error::Config`] if the resulting options are invalid
    pub fn from_json(json: &str) -> Result<Self> {
        let options: Self = serde_json::from_str(json)?;
        options.validate()?;
        Ok(options)
    }

    /// Reads options from a `tcp://host:port` URL.
    ///
    /// Recognised query parameters: `timeoutMs`, `send`, `receive`.
    /// Terminators are percent-decoded, so `%0D` is a carriage return.
    ///
    /// # Errors
    ///
    /// - [`Error::Url`] if the URL does not parse
    /// - [`Error::Config`] for a wrong scheme, missing port or bad timeout
    pub fn from_url(endpoint: &str) -> Result<Self> {
        let url = Url::parse(endpoint)?;

        if url.scheme() != URL_SCHEME {
            return Err(Error::config(format!(
                "unsupported scheme '{}', expected '{URL_SCHEME}'",
                url.scheme()
            )));
        }

        let host = url
            .host_str()
            .ok_or_else(|| Error::config(format!("missing host in {endpoint}")))?
            .trim_start_matches('[')
            .trim_end_matches(']')
            .to_string();
        let port = url
            .port()
            .ok_or_else(|| Error::config(format!("missing port in {endpoint}")))?;

        let mut options = Self::new(host, port);
        for (name, value) in url.query_pairs() {
            match name.as_ref() {
                "timeoutMs" => {
                    options.timeout_ms = value.parse().map_err(|_| {
                        Error::config(format!("invalid timeoutMs '{value}' in {endpoint}"))
                    })?;
                }
                "send" => options.send_terminator = Some(value.into_owned()),
                "receive" => options.receive_terminator = Some(value.into_owned()),
                _ => {}
            }
        }

        options.validate()?;
        Ok(options)
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl ClientOptions {
    /// Sets the host.
    #[inline]
    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Sets the port.
    #[inline]
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the timeout, saturating at `u32::MAX` milliseconds.
    #[inline]
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = u32::try_from(timeout.as_millis()).unwrap_or(u32::MAX);
        self
    }

    /// Sets the send terminator.
    #[inline]
    #[must_use]
    pub fn with_send_terminator(mut self, terminator: impl Into<String>) -> Self {
        self.send_terminator = Some(terminator.into());
        self
    }

    /// Sets the receive terminator.
    #[inline]
    #[must_use]
    pub fn with_receive_terminator(mut self, terminator: impl Into<String>) -> Self {
        self.receive_terminator = Some(terminator.into());
        self
    }
}

// ============================================================================
// Accessors
// ============================================================================

impl ClientOptions {
    /// Returns the timeout as a [`Duration`].
    #[inline]
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(u64::from(self.timeout_ms))
    }

    /// Returns `host:port`, bracketing IPv6 literals.
    #[must_use]
    pub fn endpoint(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    /// Returns the terminators with empty values normalised away.
    #[must_use]
    pub fn terminators(&self) -> Terminators {
        Terminators::new(
            self.send_terminator.as_deref(),
            self.receive_terminator.as_deref(),
        )
    }

    /// Checks that the options can be used to connect.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the host is blank or the timeout is zero.
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(Error::config("host must not be empty"));
        }
        if self.timeout_ms == 0 {
            return Err(Error::config("timeout must be greater than zero"));
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

//! Terminator-based framing over an unframed byte stream.
//!
//! There is no length prefix on the wire. Outgoing commands optionally get a
//! send terminator appended; incoming responses are either taken from a
//! single read (no receive terminator) or accumulated until the receive
//! terminator shows up.

// ============================================================================
// Imports
// ============================================================================

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::trace;

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Size of each read from the socket.
pub(crate) const READ_CHUNK_SIZE: usize = 4096;

// ============================================================================
// Terminators
// ============================================================================

/// Send and receive terminators for one connection.
///
/// Empty strings are treated as "no terminator".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Terminators {
    send: Option<String>,
    receive: Option<String>,
}

impl Terminators {
    /// Creates a terminator pair.
    #[must_use]
    pub fn new(send: Option<&str>, receive: Option<&str>) -> Self {
        Self {
            send: normalize(send),
            receive: normalize(receive),
        }
    }

    /// No framing on either side.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Returns the send terminator, if any.
    #[inline]
    #[must_use]
    pub fn send(&self) -> Option<&str> {
        self.send.as_deref()
    }

    /// Returns the receive terminator, if any.
    #[inline]
    #[must_use]
    pub fn receive(&self) -> Option<&str> {
        self.receive.as_deref()
    }

    /// Appends the send terminator to a command.
    #[must_use]
    pub fn frame_command(&self, command: &str) -> String {
        match self.send() {
            Some(terminator) => format!("{command}{terminator}"),
            None => command.to_string(),
        }
    }
}

fn normalize(terminator: Option<&str>) -> Option<String> {
    terminator
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

// ============================================================================
// Writing
// ============================================================================

/// Writes a framed command and flushes it.
///
/// Returns the number of bytes written.
///
/// # Errors
///
/// - [`Error::Protocol`] if the peer dropped the connection
/// - [`Error::Io`] for other write failures
pub async fn write_command<W>(
    writer: &mut W,
    command: &str,
    terminators: &Terminators,
) -> Result<usize>
where
    W: AsyncWrite + Unpin,
{
    let framed = terminators.frame_command(command);
    let bytes = framed.as_bytes();

    writer.write_all(bytes).await.map_err(Error::exchange_io)?;
    writer.flush().await.map_err(Error::exchange_io)?;

    trace!(bytes = bytes.len(), "Command written");
    Ok(bytes.len())
}

// ============================================================================
// Reading
// ============================================================================

/// Reads one response.
///
/// Without a terminator, exactly one read is performed and its bytes are the
/// response. With a terminator, chunks are accumulated until the decoded text
/// contains it, and its first occurrence is removed.
///
/// # Errors
///
/// - [`Error::Protocol`] if the peer closes before a full response arrives
/// - [`Error::Io`] for other read failures
pub async fn read_response<R>(reader: &mut R, terminator: Option<&str>) -> Result<String>
where
    R: AsyncRead + Unpin,
{
    match terminator {
        None => read_single(reader).await,
        Some(terminator) => read_until_terminator(reader, terminator).await,
    }
}

async fn read_single<R>(reader: &mut R) -> Result<String>
where
    R: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; READ_CHUNK_SIZE];
    let read = reader.read(&mut buf).await.map_err(Error::exchange_io)?;
    if read == 0 {
        return Err(Error::protocol(
            "connection closed by peer before a response was received",
        ));
    }

    trace!(bytes = read, "Response read");
    Ok(String::from_utf8_lossy(&buf[..read]).into_owned())
}

async fn read_until_terminator<R>(reader: &mut R, terminator: &str) -> Result<String>
where
    R: AsyncRead + Unpin,
{
    let mut accumulated = Vec::with_capacity(READ_CHUNK_SIZE);
    let mut chunk = vec![0u8; READ_CHUNK_SIZE];

    loop {
        let read = reader.read(&mut chunk).await.map_err(Error::exchange_io)?;
        if read == 0 {
            return Err(Error::protocol(format!(
                "connection closed by peer after {} bytes without terminator {:?}",
                accumulated.len(),
                terminator
            )));
        }
        accumulated.extend_from_slice(&chunk[..read]);

        let text = String::from_utf8_lossy(&accumulated);
        if text.contains(terminator) {
            trace!(bytes = accumulated.len(), "Framed response read");
            return Ok(text.replacen(terminator, "", 1));
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

//! Single-connection TCP client with lazy reconnect.
//!
//! The manager owns at most one socket. Two gates guard it:
//!
//! - the **connection gate** serializes (re)connect attempts so concurrent
//!   callers never open duplicate sockets;
//! - the **exchange gate** serializes command/response cycles so bytes from
//!   different commands never interleave.
//!
//! Keeping them separate lets [`ConnectionManager::connect`] probe the
//! service without queueing behind a long command.
//!
//! # Failure Policy
//!
//! Any transport failure during an exchange drops the socket, so the next
//! command performs a fresh TCP handshake. Reconfiguring the target or
//! disconnecting also drops it, and an exchange still running on the old
//! socket fails with [`Error::Protocol`].

// ============================================================================
// Imports
// ============================================================================

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::{Mutex, RwLock};
use tokio::net::TcpStream;
use tokio::sync::Mutex as AsyncMutex;
use tokio::sync::watch;
use tokio::time::timeout;
use tracing::{debug, info, trace, warn};

use crate::client::{ClientBuilder, ClientOptions};
use crate::error::{Error, Result};
use crate::protocol::{ParsedResponse, Separators};

use super::framing::{READ_CHUNK_SIZE, Terminators, read_response, write_command};

// ============================================================================
// Constants
// ============================================================================

/// Upper bound for waiting on the connection gate.
const CONNECT_GATE_TIMEOUT: Duration = Duration::from_secs(5);

// ============================================================================
// ConnectionState
// ============================================================================

/// Observable lifecycle state of the managed connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No socket.
    Disconnected,
    /// A connect attempt is in flight.
    Connecting,
    /// A socket is open.
    Connected,
}

// ============================================================================
// Link
// ============================================================================

/// One open socket.
#[derive(Clone)]
struct Link {
    /// Distinguishes sockets so a failed exchange only tears down its own.
    id: u64,
    peer: SocketAddr,
    stream: Arc<AsyncMutex<TcpStream>>,
    /// Set to `true` once the link is dropped from the slot.
    invalidated: Arc<watch::Sender<bool>>,
}

impl Link {
    /// Signals any exchange still holding this link to abandon it.
    fn invalidate(&self) {
        self.invalidated.send_replace(true);
    }
}

// ============================================================================
// ConnectingGuard
// ============================================================================

/// Holds the `connecting` flag up for the lifetime of a connect attempt.
///
/// Resets it on drop, so a cancelled attempt does not leave the manager
/// reporting [`ConnectionState::Connecting`].
struct ConnectingGuard<'a>(&'a AtomicBool);

impl<'a> ConnectingGuard<'a> {
    fn enter(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for ConnectingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

// ============================================================================
// ConnectionManager
// ============================================================================

/// Resilient single-socket client for a line-oriented vision service.
///
/// # Thread Safety
///
/// `ConnectionManager` is `Send + Sync`. Share one instance behind an
/// [`Arc`]; concurrent commands are queued and run one at a time.
///
/// # Example
///
/// ```no_run
/// use vision_link::ConnectionManager;
///
/// # async fn example() -> vision_link::Result<()> {
/// let link = ConnectionManager::builder()
///     .host("127.0.0.1")
///     .port(5000)
///     .receive_terminator("\r")
///     .build()?;
///
/// let response = link.send_and_parse("GET_RESULT").await?;
/// let score = response.get_double("score")?;
/// # let _ = score;
/// # Ok(())
/// # }
/// ```
pub struct ConnectionManager {
    options: RwLock<ClientOptions>,
    link: Mutex<Option<Link>>,
    connecting: AtomicBool,
    /// Bumped on every reconfiguration.
    config_epoch: AtomicU64,
    next_link_id: AtomicU64,
    connect_gate: AsyncMutex<()>,
    exchange_gate: AsyncMutex<()>,
}

// ============================================================================
// ConnectionManager - Constructors
// ============================================================================

impl ConnectionManager {
    /// Creates a manager from validated options.
    ///
    /// No I/O happens until the first command or [`connect`](Self::connect).
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the options are invalid.
    pub fn new(options: ClientOptions) -> Result<Self> {
        options.validate()?;

        Ok(Self {
            options: RwLock::new(options),
            link: Mutex::new(None),
            connecting: AtomicBool::new(false),
            config_epoch: AtomicU64::new(0),
            next_link_id: AtomicU64::new(1),
            connect_gate: AsyncMutex::new(()),
            exchange_gate: AsyncMutex::new(()),
        })
    }

    /// Returns a builder for configuring a manager.
    #[inline]
    #[must_use]
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }
}

// ============================================================================
// ConnectionManager - Configuration
// ============================================================================

impl ConnectionManager {
    /// Changes the target and timeout.
    ///
    /// Drops any open socket; the next command reconnects.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the new values are invalid. The previous
    /// configuration is kept in that case.
    pub fn configure(&self, host: impl Into<String>, port: u16, timeout: Duration) -> Result<()> {
        let updated = self
            .options()
            .with_host(host)
            .with_port(port)
            .with_timeout(timeout);
        updated.validate()?;

        debug!(endpoint = %updated.endpoint(), timeout_ms = updated.timeout_ms, "Reconfigured");

        *self.options.write() = updated;
        self.config_epoch.fetch_add(1, Ordering::SeqCst);
        self.disconnect();
        Ok(())
    }

    /// Sets the send and receive terminators.
    ///
    /// Empty strings mean "none". Takes effect on the next command; an
    /// exchange already in flight keeps the terminators it started with.
    pub fn configure_terminators(&self, send: Option<&str>, receive: Option<&str>) {
        let mut options = self.options.write();
        options.send_terminator = send.map(str::to_string);
        options.receive_terminator = receive.map(str::to_string);

        debug!(?send, ?receive, "Terminators configured");
    }

    /// Returns a copy of the current options.
    #[must_use]
    pub fn options(&self) -> ClientOptions {
        self.options.read().clone()
    }
}

// ============================================================================
// ConnectionManager - Lifecycle
// ============================================================================

impl ConnectionManager {
    /// Opens a connection if none is open.
    ///
    /// Never fails; returns whether a connection is open afterwards.
    pub async fn connect(&self) -> bool {
        match self.ensure_connected().await {
            Ok(_) => true,
            Err(e) => {
                debug!(error = %e, "Connect attempt failed");
                false
            }
        }
    }

    /// Closes the connection. Safe to call when already disconnected.
    ///
    /// An exchange still running on the closed socket fails with
    /// [`Error::Protocol`].
    pub fn disconnect(&self) {
        let taken = self.link.lock().take();
        if let Some(link) = taken {
            link.invalidate();
            debug!(peer = %link.peer, "Disconnected");
        }
    }

    /// Returns `true` if a socket is open and still reports a peer.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        let slot = self.link.lock();
        match slot.as_ref() {
            None => false,
            // Busy with an exchange, so the stream is in use.
            Some(link) => match link.stream.try_lock() {
                Ok(stream) => stream.peer_addr().is_ok(),
                Err(_) => true,
            },
        }
    }

    /// Returns the lifecycle state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        if self.is_connected() {
            ConnectionState::Connected
        } else if self.connecting.load(Ordering::SeqCst) {
            ConnectionState::Connecting
        } else {
            ConnectionState::Disconnected
        }
    }

    /// Returns the open link, connecting first if needed.
    async fn ensure_connected(&self) -> Result<Link> {
        if let Some(link) = self.current_link() {
            return Ok(link);
        }

        let (endpoint, host, port, connect_timeout) = {
            let options = self.options.read();
            (
                options.endpoint(),
                options.host.clone(),
                options.port,
                options.timeout(),
            )
        };

        let _gate = timeout(CONNECT_GATE_TIMEOUT, self.connect_gate.lock())
            .await
            .map_err(|_| {
                Error::connection(
                    &endpoint,
                    format!(
                        "timed out after {}ms waiting for another connect attempt",
                        CONNECT_GATE_TIMEOUT.as_millis()
                    ),
                )
            })?;

        // Another caller may have connected while we waited.
        if let Some(link) = self.current_link() {
            return Ok(link);
        }

        let epoch = self.config_epoch.load(Ordering::SeqCst);
        let opened = {
            let _connecting = ConnectingGuard::enter(&self.connecting);
            open_stream(&endpoint, &host, port, connect_timeout).await
        };
        let (stream, peer) = opened?;

        if self.config_epoch.load(Ordering::SeqCst) != epoch {
            return Err(Error::connection(
                &endpoint,
                "configuration changed while connecting",
            ));
        }

        let link = Link {
            id: self.next_link_id.fetch_add(1, Ordering::SeqCst),
            peer,
            stream: Arc::new(AsyncMutex::new(stream)),
            invalidated: Arc::new(watch::Sender::new(false)),
        };
        *self.link.lock() = Some(link.clone());

        info!(%peer, link_id = link.id, "Connected to vision service");
        Ok(link)
    }

    fn current_link(&self) -> Option<Link> {
        self.link.lock().clone()
    }

    /// Drops the socket if it is still the one identified by `link_id`.
    fn teardown(&self, link_id: u64) {
        let mut slot = self.link.lock();
        if let Some(link) = slot.take_if(|link| link.id == link_id) {
            link.invalidate();
        }
    }
}

// ============================================================================
// ConnectionManager - Commands
// ============================================================================

impl ConnectionManager {
    /// Sends a command and returns the raw response.
    ///
    /// Connects first if needed. Concurrent calls are queued.
    ///
    /// # Errors
    ///
    /// - [`Error::Connection`] if no connection could be established
    /// - [`Error::Protocol`] if the peer closed or reset the connection
    /// - [`Error::Timeout`] if the round trip exceeded the timeout
    ///
    /// Every error except [`Error::Connection`] closes the socket first.
    pub async fn send_command(&self, command: &str) -> Result<String> {
        self.ensure_connected().await?;

        let _turn = self.exchange_gate.lock().await;

        // The previous holder may have torn the socket down.
        let link = self.ensure_connected().await?;

        let (terminators, budget) = {
            let options = self.options.read();
            (options.terminators(), options.timeout())
        };

        let invalidated = link.invalidated.subscribe();
        let result = {
            let mut stream = link.stream.lock().await;
            tokio::select! {
                outcome = timeout(budget, exchange(&mut stream, command, &terminators, budget)) => {
                    match outcome {
                        Ok(result) => result,
                        Err(_) => Err(Error::timeout(
                            format!("command {command:?} to {}", link.peer),
                            budget.as_millis() as u64,
                        )),
                    }
                }
                () = wait_invalidated(invalidated) => Err(Error::protocol(
                    "connection invalidated by disconnect or reconfiguration",
                )),
            }
        };

        match result {
            Ok(response) => {
                trace!(link_id = link.id, bytes = response.len(), "Exchange completed");
                Ok(response)
            }
            Err(e) => {
                warn!(
                    link_id = link.id,
                    peer = %link.peer,
                    error = %e,
                    "Exchange failed, closing connection"
                );
                self.teardown(link.id);
                Err(e)
            }
        }
    }

    /// Sends a command and parses the response with default separators.
    ///
    /// # Errors
    ///
    /// Any error from [`send_command`](Self::send_command), or
    /// [`Error::Remote`] if the response reports a failure.
    pub async fn send_and_parse(&self, command: &str) -> Result<ParsedResponse> {
        self.send_and_parse_with(command, &Separators::default()).await
    }

    /// Sends a command and parses the response with custom separators.
    ///
    /// # Errors
    ///
    /// Any error from [`send_command`](Self::send_command), or
    /// [`Error::Remote`] if the response reports a failure.
    pub async fn send_and_parse_with(
        &self,
        command: &str,
        separators: &Separators,
    ) -> Result<ParsedResponse> {
        let raw = self.send_command(command).await?;
        ParsedResponse::parse_with(raw, separators)
    }

    /// Parses a response string without any I/O.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Remote`] if the response reports a failure.
    pub fn parse(&self, response: &str, separators: &Separators) -> Result<ParsedResponse> {
        ParsedResponse::parse_with(response, separators)
    }
}

// ============================================================================
// Socket Helpers
// ============================================================================

async fn open_stream(
    endpoint: &str,
    host: &str,
    port: u16,
    connect_timeout: Duration,
) -> Result<(TcpStream, SocketAddr)> {
    debug!(endpoint, "Connecting");

    let stream = match timeout(connect_timeout, TcpStream::connect((host, port))).await {
        Ok(Ok(stream)) => stream,
        Ok(Err(e)) => return Err(Error::connection(endpoint, e.to_string())),
        Err(_) => {
            return Err(Error::connection(
                endpoint,
                format!("connect timed out after {}ms", connect_timeout.as_millis()),
            ));
        }
    };

    stream
        .set_nodelay(true)
        .map_err(|e| Error::connection(endpoint, e.to_string()))?;
    let peer = stream
        .peer_addr()
        .map_err(|e| Error::connection(endpoint, e.to_string()))?;

    Ok((stream, peer))
}

/// Resolves once the link has been invalidated.
async fn wait_invalidated(mut invalidated: watch::Receiver<bool>) {
    while !*invalidated.borrow_and_update() {
        if invalidated.changed().await.is_err() {
            return;
        }
    }
}

/// One drain/write/read cycle on an exclusively held stream.
async fn exchange(
    stream: &mut TcpStream,
    command: &str,
    terminators: &Terminators,
    budget: Duration,
) -> Result<String> {
    let discarded = drain_stale(stream, Instant::now() + budget);
    if discarded > 0 {
        warn!(bytes = discarded, "Discarded stale bytes before command");
    }

    write_command(stream, command, terminators).await?;
    read_response(stream, terminators.receive()).await
}

/// Discards bytes already buffered on the socket.
///
/// Best effort: stops at the first would-block, EOF, error or the deadline.
fn drain_stale(stream: &TcpStream, deadline: Instant) -> usize {
    let mut buf = [0u8; READ_CHUNK_SIZE];
    let mut discarded = 0;

    while Instant::now() < deadline {
        match stream.try_read(&mut buf) {
            Ok(0) | Err(_) => break,
            Ok(read) => discarded += read,
        }
    }

    discarded
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    async fn listener() -> (TcpListener, u16) {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let port = listener.local_addr().expect("addr").port();
        (listener, port)
    }

    fn manager(port: u16) -> ConnectionManager {
        ConnectionManager::new(
            ClientOptions::new("127.0.0.1", port).with_timeout(Duration::from_secs(2)),
        )
        .expect("valid options")
    }

    #[test]
    fn test_constants() {
        assert_eq!(CONNECT_GATE_TIMEOUT.as_secs(), 5);
    }

    #[test]
    fn test_new_rejects_invalid_options() {
        let result = ConnectionManager::new(ClientOptions::new("", 1));
        assert!(matches!(result, Err(Error::Config { .. })));
    }

    #[test]
    fn test_starts_disconnected() {
        let link = manager(1);
        assert!(!link.is_connected());
        assert_eq!(link.state(), ConnectionState::Disconnected);
        link.disconnect();
        link.disconnect();
        assert!(!link.is_connected());
    }

    #[test]
    fn test_configure_keeps_old_values_on_error() {
        let link = manager(4000);
        assert!(link.configure("", 1, Duration::from_secs(1)).is_err());
        assert_eq!(link.options().port, 4000);

        link.configure("localhost", 4001, Duration::from_millis(100))
            .expect("valid configuration");
        let options = link.options();
        assert_eq!(options.host, "localhost");
        assert_eq!(options.port, 4001);
        assert_eq!(options.timeout_ms, 100);
    }

    #[test]
    fn test_configure_terminators() {
        let link = manager(4000);
        link.configure_terminators(Some("\r"), Some(""));
        let terminators = link.options().terminators();
        assert_eq!(terminators.send(), Some("\r"));
        assert_eq!(terminators.receive(), None);
    }

    #[test]
    fn test_parse_is_pure() {
        let link = manager(1);
        let seps = Separators::new(";", "=").unwrap();
        let response = link.parse("a=1;b=[2,3]", &seps).unwrap();
        assert_eq!(response.get_int("a").unwrap(), 1);
        assert!(!link.is_connected());
    }

    #[test]
    fn test_connecting_state_follows_guard() {
        let link = manager(1);
        {
            let _connecting = ConnectingGuard::enter(&link.connecting);
            assert_eq!(link.state(), ConnectionState::Connecting);
        }
        assert_eq!(link.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_cancelled_connect_resets_connecting_state() {
        let link = manager(1);

        // Hold the gate so the attempt stays pending until it is cancelled.
        let gate = link.connect_gate.lock().await;
        let attempt = async {
            let _connecting = ConnectingGuard::enter(&link.connecting);
            link.connect().await
        };
        let cancelled = timeout(Duration::from_millis(50), attempt).await;
        drop(gate);

        assert!(cancelled.is_err());
        assert_eq!(link.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_connect_and_disconnect() {
        let (listener, port) = listener().await;
        let accept = tokio::spawn(async move { listener.accept().await.map(|(s, _)| s) });

        let link = manager(port);
        assert!(link.connect().await);
        assert!(link.is_connected());
        assert_eq!(link.state(), ConnectionState::Connected);

        // Second connect reuses the open socket.
        assert!(link.connect().await);

        link.disconnect();
        assert!(!link.is_connected());
        drop(accept.await);
    }

    #[tokio::test]
    async fn test_connect_refused_returns_false() {
        let (listener, port) = listener().await;
        drop(listener);

        let link = manager(port);
        assert!(!link.connect().await);

        let err = link.send_command("PING").await.unwrap_err();
        assert!(matches!(err, Error::Connection { .. }));
        assert!(err.to_string().contains(&format!("127.0.0.1:{port}")));
    }

    #[tokio::test]
    async fn test_configure_drops_connection() {
        let (listener, port) = listener().await;
        let accept = tokio::spawn(async move { listener.accept().await.map(|(s, _)| s) });

        let link = manager(port);
        assert!(link.connect().await);

        link.configure("127.0.0.1", port, Duration::from_secs(1))
            .expect("valid configuration");
        assert!(!link.is_connected());
        drop(accept.await);
    }

    #[tokio::test]
    async fn test_drain_discards_stale_bytes() {
        let (listener, port) = listener().await;
        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.expect("accept");
            socket.write_all(b"stale").await.expect("write stale");
            let mut buf = [0u8; 64];
            let read = socket.read(&mut buf).await.expect("read");
            assert_eq!(&buf[..read], b"PING");
            socket.write_all(b"pong").await.expect("write");
        });

        let link = manager(port);
        assert!(link.connect().await);
        tokio::time::sleep(Duration::from_millis(100)).await;

        let response = link.send_command("PING").await.unwrap();
        assert_eq!(response, "pong");
        server.await.expect("server task");
    }
}

//! End-to-end tests against an in-process TCP peer.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use futures_util::future::join_all;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use vision_link::{ConnectionManager, ConnectionState, Error};

// ============================================================================
// Helpers
// ============================================================================

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("vision_link=debug")
        .with_test_writer()
        .try_init();
}

async fn bind() -> Result<(TcpListener, u16)> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let port = listener.local_addr()?.port();
    Ok((listener, port))
}

fn client(port: u16, timeout: Duration) -> Result<ConnectionManager> {
    Ok(ConnectionManager::builder()
        .host("127.0.0.1")
        .port(port)
        .timeout(timeout)
        .build()?)
}

async fn read_some(socket: &mut TcpStream) -> Result<String> {
    let mut buf = [0u8; 256];
    let read = socket.read(&mut buf).await?;
    Ok(String::from_utf8_lossy(&buf[..read]).into_owned())
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn closed_peer_fails_then_reconnects() -> Result<()> {
    init_tracing();
    let (listener, port) = bind().await?;

    let server = tokio::spawn(async move {
        // First socket: read the command and hang up without answering.
        let (mut first, _) = listener.accept().await?;
        assert_eq!(read_some(&mut first).await?, "STATUS");
        drop(first);

        // Second socket: answer normally.
        let (mut second, _) = listener.accept().await?;
        assert_eq!(read_some(&mut second).await?, "STATUS");
        second.write_all(b"ready:1").await?;
        anyhow::Ok(())
    });

    let link = client(port, Duration::from_secs(2))?;

    let err = link.send_command("STATUS").await.unwrap_err();
    assert!(matches!(err, Error::Protocol { .. }), "got {err:?}");
    assert!(err.is_transport_error());
    assert!(!link.is_connected());

    let response = link.send_and_parse("STATUS").await?;
    assert_eq!(response.get_int("ready")?, 1);
    assert!(link.is_connected());

    server.await??;
    Ok(())
}

#[tokio::test]
async fn chunked_response_is_joined_until_terminator() -> Result<()> {
    init_tracing();
    let (listener, port) = bind().await?;

    let server = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await?;
        assert_eq!(read_some(&mut socket).await?, "GET\r");
        socket.write_all(b"A:1").await?;
        socket.flush().await?;
        tokio::time::sleep(Duration::from_millis(50)).await;
        socket.write_all(b",B:2\r").await?;
        anyhow::Ok(())
    });

    let link = client(port, Duration::from_secs(2))?;
    link.configure_terminators(Some("\r"), Some("\r"));

    let response = link.send_command("GET").await?;
    assert_eq!(response, "A:1,B:2");

    server.await??;
    Ok(())
}

#[tokio::test]
async fn silent_peer_times_out_and_drops_connection() -> Result<()> {
    init_tracing();
    let (listener, port) = bind().await?;

    let server = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await?;
        let _ = read_some(&mut socket).await?;
        // Hold the socket open without answering.
        tokio::time::sleep(Duration::from_millis(600)).await;
        anyhow::Ok(())
    });

    let link = client(port, Duration::from_millis(200))?;

    let err = link.send_command("TRIGGER").await.unwrap_err();
    assert!(err.is_timeout(), "got {err:?}");
    assert!(!link.is_connected());
    assert_eq!(link.state(), ConnectionState::Disconnected);

    server.await??;
    Ok(())
}

#[tokio::test]
async fn refused_connection_reports_endpoint() -> Result<()> {
    let (listener, port) = bind().await?;
    drop(listener);

    let link = client(port, Duration::from_millis(500))?;

    assert!(!link.connect().await);
    let err = link.send_and_parse("PING").await.unwrap_err();
    assert!(matches!(err, Error::Connection { .. }), "got {err:?}");
    assert!(err.to_string().contains(&format!("127.0.0.1:{port}")));
    Ok(())
}

#[tokio::test]
async fn remote_error_keeps_connection_open() -> Result<()> {
    init_tracing();
    let (listener, port) = bind().await?;

    let server = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await?;
        assert_eq!(read_some(&mut socket).await?, "BAD");
        socket.write_all(b"Error: unknown command").await?;
        assert_eq!(read_some(&mut socket).await?, "GOOD");
        socket.write_all(b"score:0.75,ids:[3,4]").await?;
        anyhow::Ok(())
    });

    let link = client(port, Duration::from_secs(2))?;

    let err = link.send_and_parse("BAD").await.unwrap_err();
    assert!(err.is_remote_error(), "got {err:?}");
    assert!(link.is_connected());

    let response = link.send_and_parse("GOOD").await?;
    assert_eq!(response.get_double("score")?, 0.75);
    assert_eq!(response.get_int_array("ids")?, vec![3, 4]);

    server.await??;
    Ok(())
}

#[tokio::test]
async fn concurrent_commands_are_serialized() -> Result<()> {
    init_tracing();
    let (listener, port) = bind().await?;

    // Line echo on a single accepted socket.
    let server = tokio::spawn(async move {
        let (socket, _) = listener.accept().await?;
        let (read, mut write) = socket.into_split();
        let mut lines = BufReader::new(read).lines();
        while let Some(line) = lines.next_line().await? {
            write.write_all(format!("{line}\n").as_bytes()).await?;
        }
        anyhow::Ok(())
    });

    let link = Arc::new(client(port, Duration::from_secs(5))?);
    link.configure_terminators(Some("\n"), Some("\n"));

    let calls = (0..16).map(|i| {
        let link = Arc::clone(&link);
        async move {
            let command = format!("cmd-{i}");
            let response = link.send_command(&command).await;
            (command, response)
        }
    });

    for (command, response) in join_all(calls).await {
        assert_eq!(response?, command);
    }

    link.disconnect();
    drop(link);
    server.await??;
    Ok(())
}

#[tokio::test]
async fn reconfigure_cuts_off_in_flight_exchange() -> Result<()> {
    init_tracing();
    let (listener, port) = bind().await?;

    let server = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await?;
        assert_eq!(read_some(&mut socket).await?, "GET");
        tokio::time::sleep(Duration::from_millis(300)).await;
        // The client may already be gone.
        let _ = socket.write_all(b"old:1").await;
        anyhow::Ok(())
    });

    let link = Arc::new(client(port, Duration::from_secs(2))?);
    let in_flight = tokio::spawn({
        let link = Arc::clone(&link);
        async move { link.send_command("GET").await }
    });

    tokio::time::sleep(Duration::from_millis(100)).await;
    link.configure("127.0.0.1", 1, Duration::from_secs(1))?;

    let err = in_flight.await?.unwrap_err();
    assert!(matches!(err, Error::Protocol { .. }), "got {err:?}");
    assert!(err.to_string().contains("invalidated"));
    assert!(!link.is_connected());

    server.await??;
    Ok(())
}

#[tokio::test]
async fn disconnect_cuts_off_in_flight_exchange() -> Result<()> {
    init_tracing();
    let (listener, port) = bind().await?;

    let server = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await?;
        let _ = read_some(&mut socket).await?;
        tokio::time::sleep(Duration::from_millis(300)).await;
        let _ = socket.write_all(b"late:1").await;
        anyhow::Ok(())
    });

    let link = Arc::new(client(port, Duration::from_secs(2))?);
    let in_flight = tokio::spawn({
        let link = Arc::clone(&link);
        async move { link.send_command("GET").await }
    });

    tokio::time::sleep(Duration::from_millis(100)).await;
    link.disconnect();

    let err = in_flight.await?.unwrap_err();
    assert!(matches!(err, Error::Protocol { .. }), "got {err:?}");

    server.await??;
    Ok(())
}

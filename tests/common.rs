//! Common test utilities: an ephemeral-port proxy listener plus a loopback
//! TCP echo target, in the shape of this crate's own integration tests.

#![allow(dead_code)]

use socks5_relay::Listener;
use std::net::SocketAddr;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};

/// Start a proxy listener on an ephemeral loopback port and return its
/// address along with the background task driving the accept loop.
pub async fn spawn_proxy() -> anyhow::Result<(SocketAddr, JoinHandle<()>)> {
    let listener = Listener::bind(0).await?;
    let addr = listener.local_addr()?;
    let handle = tokio::spawn(async move {
        listener.serve().await;
    });
    Ok((addr, handle))
}

/// Spawn a TCP echo server on an ephemeral loopback port: every byte read
/// is written straight back, in order.
pub async fn spawn_echo_server() -> anyhow::Result<(SocketAddr, JoinHandle<()>)> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    let handle = tokio::spawn(async move {
        loop {
            let Ok((mut stream, _peer)) = listener.accept().await else {
                break;
            };
            tokio::spawn(async move {
                let mut buf = [0u8; 4096];
                loop {
                    match stream.read(&mut buf).await {
                        Ok(0) => break,
                        Ok(n) => {
                            if stream.write_all(&buf[..n]).await.is_err() {
                                break;
                            }
                        }
                        Err(_) => break,
                    }
                }
            });
        }
    });

    Ok((addr, handle))
}

/// Spawn a TCP target that writes `payload` then closes its write side,
/// used to test the mid-relay half-close scenario.
pub async fn spawn_write_then_close(
    payload: Vec<u8>,
) -> anyhow::Result<(SocketAddr, JoinHandle<()>)> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    let handle = tokio::spawn(async move {
        if let Ok((mut stream, _peer)) = listener.accept().await {
            let _ = stream.write_all(&payload).await;
            let _ = stream.shutdown().await;
        }
    });

    Ok((addr, handle))
}

/// Complete a no-auth SOCKS5 handshake on `conn`, asserting the expected
/// `05 00` reply.
pub async fn handshake_no_auth(conn: &mut TcpStream) -> anyhow::Result<()> {
    conn.write_all(&[0x05, 0x01, 0x00]).await?;
    let mut reply = [0u8; 2];
    conn.read_exact(&mut reply).await?;
    anyhow::ensure!(
        reply == [0x05, 0x00],
        "unexpected handshake reply: {reply:?}"
    );
    Ok(())
}

/// Send an IPv4 CONNECT request and read back the 10-byte success reply.
pub async fn connect_ipv4(conn: &mut TcpStream, addr: SocketAddr) -> anyhow::Result<[u8; 10]> {
    let SocketAddr::V4(v4) = addr else {
        anyhow::bail!("connect_ipv4 requires an IPv4 address");
    };
    let mut req = vec![0x05, 0x01, 0x00, 0x01];
    req.extend_from_slice(&v4.ip().octets());
    req.extend_from_slice(&v4.port().to_be_bytes());
    conn.write_all(&req).await?;

    let mut reply = [0u8; 10];
    conn.read_exact(&mut reply).await?;
    Ok(reply)
}

/// Poll until a TCP connect to `addr` succeeds or the timeout elapses.
pub async fn wait_for_listening(addr: SocketAddr, timeout: Duration) -> bool {
    let start = std::time::Instant::now();
    while start.elapsed() < timeout {
        if TcpStream::connect(addr).await.is_ok() {
            return true;
        }
        sleep(Duration::from_millis(10)).await;
    }
    false
}

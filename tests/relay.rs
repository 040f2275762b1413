//! Relay-phase scenarios: large echoed payloads spanning multiple
//! 8192-byte buffer iterations, and a mid-relay target close.

mod common;

use anyhow::Result;
use common::*;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::Duration;

async fn open_relay(proxy_addr: std::net::SocketAddr, target_addr: std::net::SocketAddr) -> Result<TcpStream> {
    let mut conn = TcpStream::connect(proxy_addr).await?;
    handshake_no_auth(&mut conn).await?;
    let reply = connect_ipv4(&mut conn, target_addr).await?;
    assert_eq!(reply[1], 0x00, "REP=succeeded");
    Ok(conn)
}

#[tokio::test]
async fn large_echo_round_trip_preserves_order() -> Result<()> {
    let (proxy_addr, _proxy) = spawn_proxy().await?;
    assert!(wait_for_listening(proxy_addr, Duration::from_secs(1)).await);
    let (echo_addr, _echo) = spawn_echo_server().await?;

    let conn = open_relay(proxy_addr, echo_addr).await?;

    // 100_000 bytes, deterministic content so order is checkable without a
    // real RNG (forces >12 iterations of the 8192-byte relay buffer).
    let payload: Vec<u8> = (0..100_000u32).map(|i| (i % 256) as u8).collect();
    let mut received = vec![0u8; payload.len()];

    // Write and read concurrently on the same stream (via shared `&TcpStream`
    // refs) so a send-buffer-sized payload can't deadlock the test the way a
    // write-then-read sequence would.
    let (mut rd, mut wr) = (&conn, &conn);
    tokio::try_join!(wr.write_all(&payload), rd.read_exact(&mut received))?;

    assert_eq!(received, payload);

    Ok(())
}

#[tokio::test]
async fn mid_relay_target_close_yields_clean_client_close() -> Result<()> {
    let (proxy_addr, _proxy) = spawn_proxy().await?;
    assert!(wait_for_listening(proxy_addr, Duration::from_secs(1)).await);

    let payload = vec![0xABu8; 5000];
    let (target_addr, _target) = spawn_write_then_close(payload.clone()).await?;

    let mut conn = open_relay(proxy_addr, target_addr).await?;

    let mut received = vec![0u8; payload.len()];
    conn.read_exact(&mut received).await?;
    assert_eq!(received, payload);

    // Target closed its write side; the relay should close the client's
    // connection too rather than hanging.
    let mut probe = [0u8; 1];
    let n = conn.read(&mut probe).await?;
    assert_eq!(n, 0, "client should observe a clean close");

    Ok(())
}

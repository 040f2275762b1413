//! Bidirectional byte relay: the post-handshake half of a session.
//!
//! The source drives both directions through one `do_read`/`do_write` pair
//! keyed on an integer bitmask. Here each direction is its own small
//! `async fn` (`pump_client_to_target`, `pump_target_to_client`) run as a
//! separate task, which keeps the two control paths textually separate
//! without losing the source's core trick: a read, then a matching full
//! write, then the next read — nothing else in flight per direction.

use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, trace, warn};

use crate::net::close_both_directions;

/// Run both relay directions for a session to completion.
///
/// Takes ownership of the inbound and outbound sockets and the two buffers
/// handed off from the handshake phase; the sockets are dropped (and thus
/// closed) once both directions have finished.
pub async fn run(session_id: u32, inbound: TcpStream, outbound: TcpStream, in_buf: Vec<u8>, out_buf: Vec<u8>) {
    let inbound = Arc::new(inbound);
    let outbound = Arc::new(outbound);

    let c2t = tokio::spawn(pump(
        session_id,
        "c2t",
        Arc::clone(&inbound),
        Arc::clone(&outbound),
        in_buf,
    ));
    let t2c = tokio::spawn(pump(
        session_id,
        "t2c",
        Arc::clone(&outbound),
        Arc::clone(&inbound),
        out_buf,
    ));

    let (c2t_result, t2c_result) = tokio::join!(c2t, t2c);
    if let Err(err) = c2t_result {
        warn!(session_id, "client->target task panicked: {err}");
    }
    if let Err(err) = t2c_result {
        warn!(session_id, "target->client task panicked: {err}");
    }

    debug!(session_id, "relay finished, both directions closed");
}

/// One direction's copy loop: read at most one buffer's worth from `src`,
/// write every one of those bytes to `dst`, then read again. Any read
/// error, write error, or zero-length read shuts down both sockets so the
/// peer direction's next I/O fails and unwinds too.
async fn pump(session_id: u32, label: &'static str, src: Arc<TcpStream>, dst: Arc<TcpStream>, mut buf: Vec<u8>) {
    loop {
        let n = match (&*src).read(&mut buf).await {
            Ok(0) => {
                debug!(session_id, label, "read EOF, closing both sockets");
                break;
            }
            Ok(n) => n,
            Err(err) => {
                warn!(session_id, label, "read error: {err}, closing both sockets");
                break;
            }
        };

        if let Err(err) = (&*dst).write_all(&buf[..n]).await {
            warn!(session_id, label, "write error: {err}, closing both sockets");
            break;
        }
        trace!(session_id, label, bytes = n, "forwarded");
    }

    close_both_directions(&src, label);
    close_both_directions(&dst, label);
}

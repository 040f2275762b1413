//! Accept loop: binds a TCP acceptor and hands each accepted socket to a
//! freshly constructed [`Session`]. Mirrors `Server::do_accept` in the
//! source — the listener keeps no reference to a session once spawned.

use crate::error::Result;
use crate::session::Session;
use std::sync::atomic::{AtomicU32, Ordering};
use tokio::net::TcpListener;
use tracing::{error, info, info_span, Instrument};

/// Default per-direction buffer size. Hardcoded per the spec rather than a
/// runtime option — see design notes on buffer sizing.
pub const DEFAULT_BUFFER_SIZE: usize = 8192;

/// A bound SOCKS5 listener.
pub struct Listener {
    acceptor: TcpListener,
    buffer_size: usize,
    next_session_id: AtomicU32,
}

impl Listener {
    /// Bind on `0.0.0.0:{port}` with the default buffer size.
    pub async fn bind(port: u16) -> Result<Self> {
        Self::bind_with_buffer_size(port, DEFAULT_BUFFER_SIZE).await
    }

    /// Bind on `0.0.0.0:{port}` with an explicit per-direction buffer size.
    pub async fn bind_with_buffer_size(port: u16, buffer_size: usize) -> Result<Self> {
        let acceptor = TcpListener::bind(("0.0.0.0", port)).await?;
        Ok(Self {
            acceptor,
            buffer_size,
            next_session_id: AtomicU32::new(0),
        })
    }

    /// Address the listener ended up bound to (useful for port 0 in tests).
    pub fn local_addr(&self) -> Result<std::net::SocketAddr> {
        Ok(self.acceptor.local_addr()?)
    }

    /// Accept connections forever. Accept errors are logged and never stop
    /// the loop; each accepted socket is handed to a new [`Session`] running
    /// in its own task, so one session's failure can never affect another.
    pub async fn serve(&self) {
        info!(addr = ?self.acceptor.local_addr(), "listening");
        loop {
            match self.acceptor.accept().await {
                Ok((stream, peer_addr)) => {
                    let session_id = self.next_session_id.fetch_add(1, Ordering::Relaxed);
                    let span = info_span!("session", session_id, %peer_addr);
                    let session = Session::new(session_id, stream, self.buffer_size);
                    tokio::spawn(session.run().instrument(span));
                }
                Err(err) => {
                    error!("accept error: {err}");
                }
            }
        }
    }
}

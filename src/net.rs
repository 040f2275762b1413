//! TCP socket tuning shared by the inbound and outbound sides of a session.

use std::time::Duration;
use tokio::net::TcpStream;
use tracing::debug;

/// Enable low-latency options on a TCP stream (best-effort; failures are
/// logged but never fail the caller).
pub fn configure_tcp_stream(stream: &TcpStream, context: &str) {
    if let Err(err) = stream.set_nodelay(true) {
        debug!("failed to enable TCP_NODELAY for {context}: {err}");
    }

    #[cfg(any(unix, windows))]
    {
        use socket2::{SockRef, TcpKeepalive};

        let keepalive = TcpKeepalive::new()
            .with_time(Duration::from_secs(120))
            .with_interval(Duration::from_secs(30));

        if let Err(err) = SockRef::from(stream).set_tcp_keepalive(&keepalive) {
            debug!("failed to configure TCP keepalive for {context}: {err}");
        }
    }
}

/// Shut down both halves of the underlying socket so that any pending read
/// on another task sharing this stream observes EOF/error immediately.
///
/// This is how the relay propagates failure between its two directions
/// without a shared cancellation channel: closing the descriptor is enough.
pub fn close_both_directions(stream: &TcpStream, context: &str) {
    use socket2::SockRef;

    if let Err(err) = SockRef::from(stream).shutdown(std::net::Shutdown::Both) {
        // Already shut down or the peer beat us to it; not worth logging above debug.
        debug!("shutdown({context}) was a no-op: {err}");
    }
}

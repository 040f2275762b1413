//! Per-connection SOCKS5 state machine: handshake, request, resolve,
//! connect, and the reply that hands off into the relay.
//!
//! The source expresses this as a chain of callbacks each scheduling the
//! next (`read_socks5_handshake` -> `write_socks5_handshake` -> ...). Here
//! the same ordering is an explicit [`Phase`] enum driven by a single
//! linear `async fn`, so the sequencing invariant (no phase's I/O overlaps
//! the next) falls out of normal `.await` ordering instead of needing to be
//! maintained by hand across callbacks.

use crate::error::{ProxyError, Result};
use crate::net::configure_tcp_stream;
use crate::protocol::{self, Target};
use crate::relay;
use crate::resolve::resolve_target;
use std::net::SocketAddrV4;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, info, warn};

/// Phase sequence a session walks through exactly once, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    HandshakeRead,
    HandshakeWrite,
    RequestRead,
    Resolve,
    Connect,
    ReplyWrite,
    Relay,
    Closed,
}

/// A DNS-lookup handle scoped to one session. Kept as a distinct (if
/// zero-sized) type so a session genuinely owns a resolver value per the
/// data model, rather than reaching for a bare free function.
struct Resolver;

impl Resolver {
    async fn resolve(&self, target: &Target) -> Result<std::net::SocketAddr> {
        resolve_target(&target.host, &target.port).await
    }
}

/// One accepted client connection, from handshake through relay handoff.
pub struct Session {
    id: u32,
    inbound: TcpStream,
    outbound: Option<TcpStream>,
    resolver: Resolver,
    in_buf: Vec<u8>,
    out_buf: Vec<u8>,
    remote_host: String,
    remote_port: String,
    phase: Phase,
}

impl Session {
    /// Construct a session for a freshly accepted inbound socket.
    pub fn new(id: u32, inbound: TcpStream, buffer_size: usize) -> Self {
        configure_tcp_stream(&inbound, "inbound");
        Self {
            id,
            inbound,
            outbound: None,
            resolver: Resolver,
            in_buf: vec![0u8; buffer_size],
            out_buf: vec![0u8; buffer_size],
            remote_host: String::new(),
            remote_port: String::new(),
            phase: Phase::HandshakeRead,
        }
    }

    /// Drive the session from handshake to relay, logging and returning on
    /// the first failure. Never panics on malformed client input; every
    /// rejection is a plain session close.
    pub async fn run(self) {
        let id = self.id;
        match self.drive().await {
            Ok((inbound, outbound, in_buf, out_buf)) => {
                info!(session_id = id, "entering relay");
                relay::run(id, inbound, outbound, in_buf, out_buf).await;
            }
            Err(err) => {
                warn!(session_id = id, "session closed: {err}");
            }
        }
    }

    /// Walk the handshake/request/resolve/connect/reply phases in order and,
    /// on success, hand back the two sockets and two buffers for the relay
    /// phase to own — the same buffers used during the handshake/request
    /// framing above, not freshly allocated ones.
    async fn drive(mut self) -> Result<(TcpStream, TcpStream, Vec<u8>, Vec<u8>)> {
        self.read_handshake().await?;
        self.write_handshake().await?;
        self.read_request().await?;
        let target = Target {
            host: self.remote_host.clone(),
            port: self.remote_port.clone(),
        };
        self.connect(&target).await?;
        self.write_reply().await?;
        self.enter(Phase::Relay);

        let outbound = self
            .outbound
            .expect("connect() always populates outbound before returning Ok");
        Ok((self.inbound, outbound, self.in_buf, self.out_buf))
    }

    fn enter(&mut self, phase: Phase) {
        debug!(session_id = self.id, ?phase, "phase transition");
        self.phase = phase;
    }

    async fn read_handshake(&mut self) -> Result<()> {
        self.enter(Phase::HandshakeRead);
        let len = self.inbound.read(&mut self.in_buf).await?;
        if len == 0 {
            return Err(ProxyError::Protocol(
                "client closed before sending handshake".into(),
            ));
        }
        let method = protocol::select_method(&self.in_buf, len)?;
        self.in_buf[1] = method;
        Ok(())
    }

    async fn write_handshake(&mut self) -> Result<()> {
        self.enter(Phase::HandshakeWrite);
        self.inbound
            .write_all(&self.in_buf[..protocol::HANDSHAKE_REPLY_LEN])
            .await?;
        if self.in_buf[1] == protocol::NO_ACCEPTABLE_METHODS {
            return Err(ProxyError::Protocol(
                "no acceptable authentication method offered".into(),
            ));
        }
        Ok(())
    }

    async fn read_request(&mut self) -> Result<()> {
        self.enter(Phase::RequestRead);
        let len = self.inbound.read(&mut self.in_buf).await?;
        if len == 0 {
            return Err(ProxyError::Protocol(
                "client closed before sending request".into(),
            ));
        }
        let target = protocol::parse_request(&self.in_buf, len)?;
        self.remote_host = target.host;
        self.remote_port = target.port;
        Ok(())
    }

    async fn connect(&mut self, target: &Target) -> Result<()> {
        self.enter(Phase::Resolve);
        let addr = self.resolver.resolve(target).await?;

        self.enter(Phase::Connect);
        let stream = TcpStream::connect(addr)
            .await
            .map_err(|source| ProxyError::Connect {
                host: target.host.clone(),
                port: target.port.clone(),
                source,
            })?;
        debug!(session_id = self.id, %addr, "connected to target");
        configure_tcp_stream(&stream, "outbound");
        self.outbound = Some(stream);
        Ok(())
    }

    async fn write_reply(&mut self) -> Result<()> {
        self.enter(Phase::ReplyWrite);
        let outbound = self
            .outbound
            .as_ref()
            .expect("connect succeeded before write_reply");
        let remote = outbound.peer_addr()?;
        let v4 = match remote {
            std::net::SocketAddr::V4(v4) => v4,
            // This implementation's resolver only ever produces the address
            // family the host resolves to; an IPv6 target can't be
            // represented by the ATYP_IPV4-only reply format, so it is
            // reported with an unspecified address rather than failing the
            // otherwise-successful connect.
            std::net::SocketAddr::V6(v6) => {
                SocketAddrV4::new(std::net::Ipv4Addr::UNSPECIFIED, v6.port())
            }
        };
        let reply = protocol::build_connect_reply(v4);
        self.inbound.write_all(&reply).await?;
        Ok(())
    }
}

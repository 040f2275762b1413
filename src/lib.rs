//! A SOCKS5 TCP proxy: no-auth handshake, CONNECT, and a bidirectional
//! relay engine.
//!
//! [`listener::Listener`] accepts inbound sockets and hands each one to a
//! fresh [`session::Session`], which negotiates the SOCKS5 handshake,
//! resolves and connects to the requested target, then hands both sockets
//! off to [`relay::run`] for the lifetime of the connection.

pub mod error;
pub mod listener;
pub mod net;
pub mod protocol;
pub mod relay;
pub mod resolve;
pub mod session;

pub use error::{ProxyError, Result};
pub use listener::{Listener, DEFAULT_BUFFER_SIZE};

//! Error types for the proxy core.

use thiserror::Error;

/// Errors produced while driving a session through its handshake, request,
/// resolve, connect, or relay phases.
#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("protocol violation: {0}")]
    Protocol(String),

    #[error("resolution failed for {host}:{port}: {reason}")]
    Resolution {
        host: String,
        port: String,
        reason: String,
    },

    #[error("connect to {host}:{port} failed: {source}")]
    Connect {
        host: String,
        port: String,
        #[source]
        source: std::io::Error,
    },

    #[error("configuration error: {0}")]
    Config(String),
}

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ProxyError>;

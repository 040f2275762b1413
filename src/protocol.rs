//! SOCKS5 wire constants and request parsing (RFC 1928 subset).
//!
//! Only the "no authentication" method and the CONNECT command are
//! understood; BIND, UDP ASSOCIATE, GSSAPI, and the IPv6 address type are
//! rejected rather than implemented.

use crate::error::{ProxyError, Result};
use std::net::Ipv4Addr;

pub const VERSION: u8 = 0x05;

pub const NO_AUTH_REQUIRED: u8 = 0x00;
pub const NO_ACCEPTABLE_METHODS: u8 = 0xFF;

pub const CMD_CONNECT: u8 = 0x01;

pub const RSV: u8 = 0x00;

pub const ATYP_IPV4: u8 = 0x01;
pub const ATYP_DOMAIN: u8 = 0x03;
pub const ATYP_IPV6: u8 = 0x04;

pub const REP_SUCCEEDED: u8 = 0x00;

/// Length of the method-selection reply (VER, METHOD).
pub const HANDSHAKE_REPLY_LEN: usize = 2;
/// Length of the CONNECT success reply (VER, REP, RSV, ATYP, 4-byte addr, 2-byte port).
pub const CONNECT_REPLY_LEN: usize = 10;

/// The target endpoint requested by a CONNECT, in the string form the
/// resolver expects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub host: String,
    pub port: String,
}

/// Inspect the client greeting in `buf[..len]` and return the method byte
/// to send back: [`NO_AUTH_REQUIRED`] if offered, else [`NO_ACCEPTABLE_METHODS`].
///
/// Layout: VER(1) | NMETHODS(1) | METHODS(NMETHODS).
pub fn select_method(buf: &[u8], len: usize) -> Result<u8> {
    if len < 2 {
        return Err(ProxyError::Protocol(format!(
            "handshake too short: {len} bytes"
        )));
    }
    if buf[0] != VERSION {
        return Err(ProxyError::Protocol(format!(
            "unsupported SOCKS version in handshake: 0x{:02x}",
            buf[0]
        )));
    }
    let nmethods = buf[1] as usize;
    if len < 2 + nmethods {
        return Err(ProxyError::Protocol(format!(
            "handshake declares {nmethods} methods but only {} bytes follow",
            len - 2
        )));
    }
    let methods = &buf[2..2 + nmethods];
    if methods.contains(&NO_AUTH_REQUIRED) {
        Ok(NO_AUTH_REQUIRED)
    } else {
        Ok(NO_ACCEPTABLE_METHODS)
    }
}

/// Parse a CONNECT request from `buf[..len]` into a [`Target`].
///
/// Layout: VER(1) | CMD(1) | RSV(1) | ATYP(1) | DST.ADDR | DST.PORT(2).
pub fn parse_request(buf: &[u8], len: usize) -> Result<Target> {
    if len < 4 {
        return Err(ProxyError::Protocol(format!(
            "request too short: {len} bytes"
        )));
    }
    if buf[0] != VERSION {
        return Err(ProxyError::Protocol(format!(
            "unsupported SOCKS version in request: 0x{:02x}",
            buf[0]
        )));
    }
    if buf[1] != CMD_CONNECT {
        return Err(ProxyError::Protocol(format!(
            "unsupported command: 0x{:02x} (only CONNECT is supported)",
            buf[1]
        )));
    }

    match buf[3] {
        ATYP_IPV4 => {
            if len != 10 {
                return Err(ProxyError::Protocol(format!(
                    "IPv4 request length must be 10, got {len}"
                )));
            }
            let ip = Ipv4Addr::new(buf[4], buf[5], buf[6], buf[7]);
            let port = u16::from_be_bytes([buf[8], buf[9]]);
            Ok(Target {
                host: ip.to_string(),
                port: port.to_string(),
            })
        }
        ATYP_DOMAIN => {
            let host_len = buf[4] as usize;
            let expected = 5 + host_len + 2;
            if len != expected {
                return Err(ProxyError::Protocol(format!(
                    "domain request length must be {expected}, got {len}"
                )));
            }
            let host = std::str::from_utf8(&buf[5..5 + host_len])
                .map_err(|_| ProxyError::Protocol("domain name is not valid UTF-8".into()))?
                .to_string();
            let port = u16::from_be_bytes([buf[5 + host_len], buf[6 + host_len]]);
            Ok(Target {
                host,
                port: port.to_string(),
            })
        }
        ATYP_IPV6 => Err(ProxyError::Protocol(
            "IPv6 address type is not supported".into(),
        )),
        other => Err(ProxyError::Protocol(format!(
            "unsupported address type: 0x{other:02x}"
        ))),
    }
}

/// Build the 10-byte CONNECT success reply reporting `addr` as BND.ADDR/BND.PORT.
///
/// Matches the source's behavior of reporting the outbound socket's remote
/// endpoint (the target) rather than the proxy's own bound address, which
/// RFC 1928 technically specifies. See design notes for the rationale.
pub fn build_connect_reply(addr: std::net::SocketAddrV4) -> [u8; CONNECT_REPLY_LEN] {
    let mut reply = [0u8; CONNECT_REPLY_LEN];
    reply[0] = VERSION;
    reply[1] = REP_SUCCEEDED;
    reply[2] = RSV;
    reply[3] = ATYP_IPV4;
    reply[4..8].copy_from_slice(&addr.ip().octets());
    reply[8..10].copy_from_slice(&addr.port().to_be_bytes());
    reply
}

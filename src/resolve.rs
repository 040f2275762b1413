//! Destination resolution: turn (host, port) strings into a connectable
//! [`SocketAddr`], the way `Session::do_resolve` does in the source.

use crate::error::{ProxyError, Result};
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use tokio::net::lookup_host;

/// Bound on a single resolution attempt. The distilled spec has no
/// application-level timeouts in the Relay phase, but an unbounded resolver
/// call is a latent hang outside of it, so this is guarded ambiently.
const RESOLVE_TIMEOUT: Duration = Duration::from_secs(10);

/// Resolve `host:port` to a single socket address, taking the first entry
/// the resolver returns (matching the source's `*it` on the resolver
/// iterator). Literal IP addresses are parsed directly, skipping the
/// resolver entirely.
pub async fn resolve_target(host: &str, port: &str) -> Result<SocketAddr> {
    let port_num: u16 = port.parse().map_err(|_| ProxyError::Resolution {
        host: host.to_string(),
        port: port.to_string(),
        reason: "port is not a valid u16".to_string(),
    })?;

    if let Ok(ip) = host.parse::<IpAddr>() {
        return Ok(SocketAddr::new(ip, port_num));
    }

    let lookup = tokio::time::timeout(RESOLVE_TIMEOUT, lookup_host((host, port_num)))
        .await
        .map_err(|_| ProxyError::Resolution {
            host: host.to_string(),
            port: port.to_string(),
            reason: format!("timed out after {}s", RESOLVE_TIMEOUT.as_secs()),
        })?
        .map_err(|e| ProxyError::Resolution {
            host: host.to_string(),
            port: port.to_string(),
            reason: e.to_string(),
        })?;

    lookup
        .into_iter()
        .next()
        .ok_or_else(|| ProxyError::Resolution {
            host: host.to_string(),
            port: port.to_string(),
            reason: "resolver returned no addresses".to_string(),
        })
}

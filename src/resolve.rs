//! Name resolution collaborator. Blocking, synchronous, and invoked exactly
//! once at session init — see `original_source/srcs/network.c`'s
//! `resolveHost`, which this mirrors via `std::net`'s `getaddrinfo` wrapper
//! instead of calling into libc directly.

use std::net::{IpAddr, SocketAddr, ToSocketAddrs};

use thiserror::Error;

use crate::codec::Family;

#[derive(Debug, Error)]
#[error("{destination}: Name or service not known")]
pub struct ResolveError {
    pub destination: String,
}

#[derive(Debug, Clone)]
pub struct ResolvedTarget {
    pub text: String,
    pub family: Family,
    pub ip: IpAddr,
    pub addr_text: String,
}

/// Resolves `destination` to a single address, preferring the first result
/// `getaddrinfo` (via `ToSocketAddrs`) returns. Numeric addresses take a
/// fast path that never touches the resolver.
pub fn resolve(destination: &str) -> Result<ResolvedTarget, ResolveError> {
    if let Ok(ip) = destination.parse::<IpAddr>() {
        return Ok(build(destination, ip));
    }

    let mut addrs = (destination, 0u16)
        .to_socket_addrs()
        .map_err(|_| ResolveError {
            destination: destination.to_string(),
        })?;

    let addr: SocketAddr = addrs.next().ok_or_else(|| ResolveError {
        destination: destination.to_string(),
    })?;

    Ok(build(destination, addr.ip()))
}

fn build(text: &str, ip: IpAddr) -> ResolvedTarget {
    let family = match ip {
        IpAddr::V4(_) => Family::V4,
        IpAddr::V6(_) => Family::V6,
    };
    ResolvedTarget {
        text: text.to_string(),
        family,
        ip,
        addr_text: ip.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_v4_resolves_without_lookup() {
        let target = resolve("127.0.0.1").unwrap();
        assert_eq!(target.family, Family::V4);
        assert_eq!(target.addr_text, "127.0.0.1");
        assert_eq!(target.text, "127.0.0.1");
    }

    #[test]
    fn numeric_v6_resolves_without_lookup() {
        let target = resolve("::1").unwrap();
        assert_eq!(target.family, Family::V6);
        assert_eq!(target.addr_text, "::1");
    }

    #[test]
    fn binary_form_matches_textual_form() {
        let target = resolve("203.0.113.7").unwrap();
        assert_eq!(target.ip.to_string(), target.addr_text);
    }
}

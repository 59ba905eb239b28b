//! Raw socket pair: one ICMPv4, one ICMPv6, both non-blocking. Grounded in
//! `probe.rs`'s `ProbeEngine::new` and `original_source/srcs/network.c`'s
//! `createSocket`.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use socket2::{Domain, Protocol, Socket, Type};

use crate::codec::Family;

pub struct SocketPair {
    v4: Socket,
    v6: Socket,
}

impl SocketPair {
    /// Opens both raw sockets and sets the outgoing TTL / hop limit on each.
    /// Raw ICMP sockets require `CAP_NET_RAW` (or root).
    pub fn open(ttl: u16) -> Result<Self> {
        let v4 = Socket::new(Domain::IPV4, Type::RAW, Some(Protocol::ICMPV4))
            .context("cannot create raw ICMPv4 socket (needs CAP_NET_RAW / root)")?;
        v4.set_nonblocking(true).context("cannot set ICMPv4 socket non-blocking")?;
        v4.set_ttl(ttl as u32).context("cannot set IP_TTL")?;

        let v6 = Socket::new(Domain::IPV6, Type::RAW, Some(Protocol::ICMPV6))
            .context("cannot create raw ICMPv6 socket (needs CAP_NET_RAW / root)")?;
        v6.set_nonblocking(true).context("cannot set ICMPv6 socket non-blocking")?;
        v6.set_unicast_hops_v6(ttl as u32).context("cannot set IPV6_UNICAST_HOPS")?;

        Ok(Self { v4, v6 })
    }

    pub fn for_family(&self, family: Family) -> &Socket {
        match family {
            Family::V4 => &self.v4,
            Family::V6 => &self.v6,
        }
    }

    pub fn v4(&self) -> &Socket {
        &self.v4
    }

    pub fn v6(&self) -> &Socket {
        &self.v6
    }

    pub fn send_to(&self, family: Family, bytes: &[u8], dest: SocketAddr) -> std::io::Result<usize> {
        self.for_family(family).send_to(bytes, &dest.into())
    }
}

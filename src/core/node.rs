//! Overlay participants.

use std::net::{IpAddr, SocketAddr};

#[cfg(feature = "codec")]
use bincode::{Decode, Encode};

use crate::core::id::Id;

/// An overlay participant as seen from the local node.
///
/// Nodes are immutable once constructed and shared between the routing structures as
/// `Arc<Node>`; each structure decides independently whether to keep a reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Node {
    addr: SocketAddr,
    id: Id,
    // Lower is closer in the underlying network.
    proximity: u64,
}

impl Node {
    pub fn new(addr: SocketAddr, id: Id, proximity: u64) -> Self {
        Self {
            addr,
            id,
            proximity,
        }
    }

    /// Builds a node from its wire description, estimating proximity from the addresses.
    pub fn from_info(info: NodeInfo, local_addr: SocketAddr) -> Self {
        let proximity = Self::estimate_proximity(local_addr, info.addr);

        Self {
            addr: info.addr,
            id: info.id,
            proximity,
        }
    }

    /// Returns the node's listening address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Returns the node's overlay identifier.
    pub fn id(&self) -> &Id {
        &self.id
    }

    /// Returns the proximity metric, lower is closer.
    pub fn proximity(&self) -> u64 {
        self.proximity
    }

    /// Returns the wire description of this node.
    pub fn info(&self) -> NodeInfo {
        NodeInfo {
            addr: self.addr,
            id: self.id.clone(),
        }
    }

    /// Estimates the network distance between two addresses when no measurement is available.
    ///
    /// Addresses are compared numerically (IPv4 mapped into IPv6), the IP difference dominates
    /// and the port difference breaks ties between endpoints on the same host.
    pub fn estimate_proximity(a: SocketAddr, b: SocketAddr) -> u64 {
        fn ip_bits(ip: IpAddr) -> u128 {
            match ip {
                IpAddr::V4(v4) => u128::from(v4.to_ipv6_mapped()),
                IpAddr::V6(v6) => u128::from(v6),
            }
        }

        let ip_diff = u64::try_from(ip_bits(a.ip()).abs_diff(ip_bits(b.ip()))).unwrap_or(u64::MAX);
        let port_diff = u64::from(a.port().abs_diff(b.port()));

        ip_diff.saturating_mul(1 << 16).saturating_add(port_diff)
    }
}

/// The (address, port, identifier) triple exchanged between peers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "codec", derive(Encode, Decode))]
pub struct NodeInfo {
    pub addr: SocketAddr,
    pub id: Id,
}

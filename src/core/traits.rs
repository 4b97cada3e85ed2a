use crate::core::{
    error::Result,
    node::{Node, NodeInfo},
};

/// The request/response exchanges the lazy repair routines need from the transport.
///
/// Any failure to reach the peer or to read a well-formed response (timeout, refused
/// connection, malformed or mismatched message) is reported as an `Err`; the repair routines
/// treat every error the same way and move on to the next candidate.
///
/// Implementations are called without the routing state's lock held, so they're free to block
/// on the network for as long as they need.
#[async_trait::async_trait]
pub trait PeerExchange {
    /// Asks `peer` for its leaf set (both sides).
    async fn request_leaf_set(&self, peer: &Node) -> Result<Vec<NodeInfo>>;

    /// Asks `peer` for its neighbour set.
    async fn request_neighbour_set(&self, peer: &Node) -> Result<Vec<NodeInfo>>;
}

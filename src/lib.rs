//! Routing state and next-hop selection for a [Pastry](https://doi.org/10.1007/3-540-45518-3_18)
//! overlay node.
//!
//! Every node keeps a bounded, partial view of the overlay:
//!
//! 1. a routing table indexed by `[shared prefix length][next digit]`,
//! 2. a leaf set holding the nodes numerically nearest on either side,
//! 3. a neighbour set holding the nodes nearest in the underlying network.
//!
//! [`RoutingState`] uses that view to pick, for any identifier, a next hop that is strictly
//! closer to it (or the local node, when no better node is known).
//!
//! ## Sync
//!
//! [`SyncRoutingState`] shares one [`RoutingState`] between tasks behind a single lock and runs
//! the lazy repair rounds that refresh the leaf and neighbour sets through a [`PeerExchange`]
//! when a peer stops answering.
//!
//! ## Codec
//!
//! The [`codec`] and [`tcp`] modules provide a length-delimited wire format and a TCP
//! [`PeerExchange`] for the repair requests.

#![cfg_attr(doc_cfg, feature(doc_cfg))]

#[cfg(feature = "codec")]
#[cfg_attr(doc_cfg, doc(cfg(feature = "codec")))]
pub mod codec;
#[cfg(feature = "codec")]
#[cfg_attr(doc_cfg, doc(cfg(feature = "codec")))]
pub mod tcp;

mod core;
mod router;

#[cfg(feature = "sync")]
pub use crate::core::traits::PeerExchange;
pub use crate::core::{
    config::Config,
    distance::{is_better_node, prefix_match_len},
    error::{Error, Result},
    id::Id,
    leaf_set::{LeafSet, Side},
    message,
    neighbour_set::NeighbourSet,
    node::{Node, NodeInfo},
    routing_table::RoutingTable,
};
#[cfg(feature = "sync")]
pub use crate::router::{RepairOutcome, SyncRoutingState};
pub use crate::router::RoutingState;

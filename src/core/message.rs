//! Repair exchange message types.

#[cfg(feature = "codec")]
use bincode::{Decode, Encode};

use crate::core::node::NodeInfo;

/// Messages exchanged while repairing the leaf and neighbour sets.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "codec", derive(Encode, Decode))]
pub enum Message {
    /// Asks a peer for its leaf set, both sides.
    RequestLeafSet { sender: NodeInfo },
    /// LEAF_SET is the correct response to REQUEST_LEAF_SET.
    LeafSet { nodes: Vec<NodeInfo> },

    /// Asks a peer for its neighbour set.
    RequestNeighbourSet { sender: NodeInfo },
    /// NEIGHBOUR_SET is the correct response to REQUEST_NEIGHBOUR_SET.
    NeighbourSet { nodes: Vec<NodeInfo> },
}

impl Message {
    pub fn variant_as_str(&self) -> &str {
        match self {
            Message::RequestLeafSet { .. } => "request_leaf_set",
            Message::LeafSet { .. } => "leaf_set",
            Message::RequestNeighbourSet { .. } => "request_neighbour_set",
            Message::NeighbourSet { .. } => "neighbour_set",
        }
    }

    pub fn is_response(&self) -> bool {
        matches!(self, Message::LeafSet { .. } | Message::NeighbourSet { .. })
    }

    /// Returns the requesting node for request variants.
    pub fn sender(&self) -> Option<&NodeInfo> {
        match self {
            Message::RequestLeafSet { sender } | Message::RequestNeighbourSet { sender } => {
                Some(sender)
            }
            _ => None,
        }
    }
}

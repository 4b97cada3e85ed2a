use std::{collections::HashMap, sync::Arc};

use parking_lot::Mutex;
use tracing::debug;

use crate::{
    core::{
        config::Config,
        error::Result,
        id::Id,
        leaf_set::Side,
        message::Message,
        node::{Node, NodeInfo},
    },
    router::RoutingState,
};

#[cfg_attr(doc_cfg, doc(cfg(feature = "sync")))]
#[derive(Debug, Clone)]
/// A routing state handle suitable for sharing between tasks and threads.
///
/// It wraps [`RoutingState`] in a single exclusive lock: every read or write of the routing
/// structures, the join counters and the data store happens under that lock, so operations that
/// span several structures (such as the next hop scan) see a consistent view. Accessors return
/// copies, never live references.
pub struct SyncRoutingState {
    local: Arc<Node>,
    state: Arc<Mutex<RoutingState>>,
}

impl SyncRoutingState {
    pub fn new(local: Node, config: Config) -> Result<Self> {
        Ok(Self::from(RoutingState::new(local, config)?))
    }

    /// Returns the local node, fixed for the lifetime of the state.
    pub fn local(&self) -> Arc<Node> {
        Arc::clone(&self.local)
    }

    pub fn local_id(&self) -> &Id {
        self.local.id()
    }

    /// Runs `f` with the lock held.
    ///
    /// `f` must not block on the network.
    pub fn with<T>(&self, f: impl FnOnce(&mut RoutingState) -> T) -> T {
        f(&mut *self.state.lock())
    }

    pub fn rows(&self) -> usize {
        self.state.lock().rows()
    }

    pub fn cols(&self) -> usize {
        self.state.lock().cols()
    }

    /// Builds a node from its wire description, estimating its proximity to the local node.
    pub fn node_from_info(&self, info: NodeInfo) -> Arc<Node> {
        Arc::new(Node::from_info(info, self.local.addr()))
    }

    // ROUTING

    /// Returns the best known next hop towards `target`, the local node when it is the closest.
    pub fn next_hop(&self, target: &Id) -> Arc<Node> {
        self.state.lock().next_hop(target)
    }

    /// Records that a node was heard from, offering it to every routing structure.
    pub fn record_contact(&self, node: Arc<Node>) {
        self.state.lock().update_all_state(node)
    }

    /// Removes a node that was detected as failed from every routing structure.
    pub fn remove_node(&self, id: &Id) {
        self.state.lock().delete_from_all(id)
    }

    pub fn add_to_leaf_set(&self, node: Arc<Node>) -> bool {
        self.state.lock().add_to_leaf_set(node)
    }

    pub fn add_to_neighbour_set(&self, node: Arc<Node>) -> bool {
        self.state.lock().add_to_neighbour_set(node)
    }

    pub fn add_to_routing_table(&self, node: Arc<Node>, prefix_hint: Option<usize>) -> bool {
        self.state.lock().add_to_routing_table(node, prefix_hint)
    }

    pub fn update_routing_table(&self, row: impl IntoIterator<Item = Arc<Node>>, index: usize) {
        self.state.lock().update_routing_table(row, index)
    }

    pub fn find_in_leaf_set(&self, id: &Id) -> Option<Side> {
        self.state.lock().find_in_leaf_set(id)
    }

    pub fn find_in_neighbour_set(&self, id: &Id) -> Option<Arc<Node>> {
        self.state.lock().find_in_neighbour_set(id)
    }

    pub fn find_in_routing_table(&self, id: &Id) -> Option<(usize, usize)> {
        self.state.lock().find_in_routing_table(id)
    }

    // SNAPSHOTS

    /// Copies the routing table matrix.
    pub fn routing_table(&self) -> Vec<Vec<Option<Arc<Node>>>> {
        self.state.lock().routing_table().to_vec()
    }

    /// Copies the leaf set as (left, right), each side in ascending identifier order.
    pub fn leaf_set(&self) -> (Vec<Arc<Node>>, Vec<Arc<Node>>) {
        let state = self.state.lock();
        let leaf_set = state.leaf_set();

        (leaf_set.to_vec(Side::Left), leaf_set.to_vec(Side::Right))
    }

    /// Copies the neighbour set from the closest to the farthest member.
    pub fn neighbour_set(&self) -> Vec<Arc<Node>> {
        self.state.lock().neighbour_set().to_vec()
    }

    // JOIN PROGRESS

    pub fn total_route_length(&self) -> usize {
        self.state.lock().total_route_length()
    }

    pub fn set_total_route_length(&self, length: usize) {
        self.state.lock().set_total_route_length(length)
    }

    pub fn received_update_count(&self) -> usize {
        self.state.lock().received_update_count()
    }

    pub fn increment_received_update_count(&self, n: usize) {
        self.state.lock().increment_received_update_count(n)
    }

    pub fn is_join_complete(&self) -> bool {
        self.state.lock().is_join_complete()
    }

    pub fn reset_update_values(&self) {
        self.state.lock().reset_update_values()
    }

    // LOCAL DATA STORE

    pub fn put(&self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.state.lock().put(key, value)
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.state.lock().get(key).cloned()
    }

    pub fn delete(&self, key: &str) -> Option<String> {
        self.state.lock().delete(key)
    }

    /// Copies the whole data store.
    pub fn store_snapshot(&self) -> HashMap<String, String> {
        self.state.lock().store().clone()
    }

    // MESSAGE PROCESSING

    /// Answers a repair request, recording the requesting peer as a contact.
    ///
    /// A sender whose identifier doesn't fit the overlay still gets an answer but isn't recorded.
    /// Returns `None` for messages that aren't requests.
    pub fn respond(&self, message: Message) -> Option<Message> {
        let mut state = self.state.lock();

        // Answer before recording the sender so it isn't echoed back to itself.
        let response = match &message {
            Message::RequestLeafSet { .. } => Message::LeafSet {
                nodes: state.leaf_set().iter().map(|node| node.info()).collect(),
            },
            Message::RequestNeighbourSet { .. } => Message::NeighbourSet {
                nodes: state.neighbour_set().iter().map(|node| node.info()).collect(),
            },
            Message::LeafSet { .. } | Message::NeighbourSet { .. } => return None,
        };

        // Identifiers off the wire are only recorded if they fit the overlay.
        match message.sender() {
            Some(sender) if sender.id.fits(state.config()) => {
                state.update_all_state(self.node_from_info(sender.clone()));
            }
            Some(sender) => {
                debug!(addr = %sender.addr, id = %sender.id, "not recording malformed sender");
            }
            None => {}
        }

        Some(response)
    }
}

impl From<RoutingState> for SyncRoutingState {
    fn from(state: RoutingState) -> Self {
        Self {
            local: Arc::clone(state.local()),
            state: Arc::new(Mutex::new(state)),
        }
    }
}

//! Core routing state implementation.

use std::{collections::HashMap, sync::Arc};

use tracing::{info, trace};

use crate::core::{
    config::Config,
    distance::{is_better_node, prefix_match_len},
    error::Result,
    id::Id,
    leaf_set::{LeafSet, Side},
    neighbour_set::NeighbourSet,
    node::Node,
    routing_table::RoutingTable,
};

#[cfg(feature = "sync")]
mod repair;
#[cfg(feature = "sync")]
mod sync;
#[cfg(feature = "sync")]
#[cfg_attr(doc_cfg, doc(cfg(feature = "sync")))]
pub use repair::RepairOutcome;
#[cfg(feature = "sync")]
#[cfg_attr(doc_cfg, doc(cfg(feature = "sync")))]
pub use sync::SyncRoutingState;

/// A node's partial view of the overlay.
///
/// Owns the routing table, the leaf set and the neighbour set, along with the join progress
/// counters and the data hosted at this node. Methods take `&mut self`; wrap the state in
/// [`SyncRoutingState`] to share it between tasks behind a single lock.
#[derive(Debug, Clone)]
pub struct RoutingState {
    config: Config,
    local: Arc<Node>,
    routing_table: RoutingTable,
    leaf_set: LeafSet,
    neighbour_set: NeighbourSet,
    // Number of routing table rows expected to report during a join.
    total_route_length: usize,
    // Number of rows heard from so far.
    received_update_count: usize,
    store: HashMap<String, String>,
}

impl RoutingState {
    /// Creates the routing state for the local node, dimensions are fixed from `config`.
    pub fn new(local: Node, config: Config) -> Result<Self> {
        config.validate()?;

        let local_id = local.id().clone();
        let rows = config.rows();

        Ok(Self {
            config,
            local: Arc::new(local),
            routing_table: RoutingTable::new(local_id.clone(), rows, config.cols()),
            leaf_set: LeafSet::new(local_id.clone(), config.leaf_set_side_capacity()),
            neighbour_set: NeighbourSet::new(local_id, config.neighbour_set_capacity()),
            total_route_length: rows,
            received_update_count: 0,
            store: HashMap::new(),
        })
    }

    /// Returns the local node.
    pub fn local(&self) -> &Arc<Node> {
        &self.local
    }

    /// Returns this node's local identifier.
    pub fn local_id(&self) -> &Id {
        self.local.id()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn rows(&self) -> usize {
        self.routing_table.rows()
    }

    pub fn cols(&self) -> usize {
        self.routing_table.cols()
    }

    pub fn routing_table(&self) -> &RoutingTable {
        &self.routing_table
    }

    pub fn leaf_set(&self) -> &LeafSet {
        &self.leaf_set
    }

    pub fn neighbour_set(&self) -> &NeighbourSet {
        &self.neighbour_set
    }

    // NEXT HOP SELECTION

    /// Selects the best known next hop towards `target`.
    ///
    /// Never fails: if no known node is closer to the target than the local node, the local node
    /// is returned and the message should be delivered here. `target` is expected to differ from
    /// the local identifier.
    pub fn next_hop(&self, target: &Id) -> Arc<Node> {
        // 1. The target falls within the leaf set: the closest member (or us) is the destination.
        if self.leaf_set.covers(target) {
            return self.closest(self.leaf_set.iter().map(Some), target);
        }

        // 2. A routing table entry sharing a longer prefix with the target.
        let prefix = prefix_match_len(self.local_id(), target);
        if prefix < self.rows() {
            if let Some(node) = target
                .digit(prefix)
                .and_then(|digit| self.routing_table.get(prefix, digit as usize))
            {
                return Arc::clone(node);
            }
        }

        // 3. Gap in the routing table: anything we know that is closer than us.
        let candidates = self
            .leaf_set
            .iter()
            .map(Some)
            .chain(self.routing_table.cells())
            .chain(self.neighbour_set.iter().map(Some));
        let closest = self.closest(candidates, target);

        info!(
            addr = %closest.addr(),
            id = %closest.id(),
            "next best route for {target}"
        );

        closest
    }

    /// Scans the candidates for the node closest to `target`, starting from the local node.
    fn closest<'a>(
        &'a self,
        candidates: impl Iterator<Item = Option<&'a Arc<Node>>>,
        target: &Id,
    ) -> Arc<Node> {
        let bits = self.config.digit_bits;
        let mut closest = &self.local;
        for candidate in candidates.flatten() {
            if is_better_node(Some(candidate.as_ref()), closest, target, bits) {
                closest = candidate;
            }
        }

        Arc::clone(closest)
    }

    // STATE UPDATES

    /// Offers the node to the leaf set, the neighbour set and the routing table, in that order.
    ///
    /// Each structure decides on its own whether to keep the node; calling this repeatedly with
    /// the same node leaves the state unchanged.
    pub fn update_all_state(&mut self, node: Arc<Node>) {
        self.add_to_leaf_set(Arc::clone(&node));
        self.add_to_neighbour_set(Arc::clone(&node));
        self.add_to_routing_table(node, None);
    }

    /// Removes the node from every structure holding it.
    pub fn delete_from_all(&mut self, id: &Id) {
        self.remove_from_leaf_set(id);
        self.remove_from_neighbour_set(id);
        self.remove_from_routing_table(id);
    }

    pub fn add_to_leaf_set(&mut self, node: Arc<Node>) -> bool {
        self.leaf_set.add(node)
    }

    pub fn add_to_neighbour_set(&mut self, node: Arc<Node>) -> bool {
        self.neighbour_set.add(node)
    }

    pub fn add_to_routing_table(&mut self, node: Arc<Node>, prefix_hint: Option<usize>) -> bool {
        self.routing_table.add(node, prefix_hint)
    }

    /// Inserts a routing table row received from a peer, every entry placed in row `index`.
    pub fn update_routing_table(&mut self, row: impl IntoIterator<Item = Arc<Node>>, index: usize) {
        for node in row {
            self.routing_table.add(node, Some(index));
        }
    }

    pub fn remove_from_leaf_set(&mut self, id: &Id) -> bool {
        self.leaf_set.remove(id)
    }

    pub fn remove_from_neighbour_set(&mut self, id: &Id) -> bool {
        self.neighbour_set.remove(id)
    }

    pub fn remove_from_routing_table(&mut self, id: &Id) -> bool {
        self.routing_table.remove(id)
    }

    // LOOKUPS

    pub fn find_in_leaf_set(&self, id: &Id) -> Option<Side> {
        self.leaf_set.find(id)
    }

    pub fn find_in_neighbour_set(&self, id: &Id) -> Option<Arc<Node>> {
        self.neighbour_set.find(id).cloned()
    }

    /// Returns the identifier's routing table cell if it is occupied.
    pub fn find_in_routing_table(&self, id: &Id) -> Option<(usize, usize)> {
        self.routing_table.find(id)
    }

    // JOIN PROGRESS

    pub fn total_route_length(&self) -> usize {
        self.total_route_length
    }

    pub fn set_total_route_length(&mut self, length: usize) {
        self.total_route_length = length;
    }

    pub fn received_update_count(&self) -> usize {
        self.received_update_count
    }

    pub fn increment_received_update_count(&mut self, n: usize) {
        self.received_update_count += n;
        trace!(
            received = self.received_update_count,
            expected = self.total_route_length,
            "received routing state update"
        );
    }

    /// Returns `true` once every expected routing table row has reported.
    pub fn is_join_complete(&self) -> bool {
        self.received_update_count >= self.total_route_length
    }

    /// Restores the counters once a join or stabilisation round completes.
    pub fn reset_update_values(&mut self) {
        trace!("resetting routing state update counters");
        self.total_route_length = self.rows();
        self.received_update_count = 0;
    }

    // LOCAL DATA STORE

    /// Stores a value, returning the previous value for the key.
    pub fn put(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.store.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&String> {
        self.store.get(key)
    }

    pub fn delete(&mut self, key: &str) -> Option<String> {
        self.store.remove(key)
    }

    pub fn store(&self) -> &HashMap<String, String> {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;

    use super::*;

    // Produces a local address from the supplied port.
    fn localhost_with_port(port: u16) -> SocketAddr {
        format!("127.0.0.1:{port}").parse().unwrap()
    }

    fn config() -> Config {
        Config {
            overlay_size: 16,
            digit_bits: 2,
            id_len: 4,
        }
    }

    fn id(s: &str) -> Id {
        Id::parse(s, &config()).unwrap()
    }

    fn node(s: &str, proximity: u64) -> Arc<Node> {
        Arc::new(Node::new(localhost_with_port(1), id(s), proximity))
    }

    fn state(local: &str) -> RoutingState {
        RoutingState::new(Node::new(localhost_with_port(0), id(local), 0), config()).unwrap()
    }

    #[test]
    fn new() {
        let state = state("1200");
        assert_eq!(state.rows(), 2);
        assert_eq!(state.cols(), 4);
        assert_eq!(state.total_route_length(), 2);
        assert_eq!(state.received_update_count(), 0);
        assert!(state.routing_table().is_empty());
        assert!(state.leaf_set().is_empty());
        assert!(state.neighbour_set().is_empty());
    }

    #[test]
    fn new_rejects_invalid_config() {
        let local = Node::new(localhost_with_port(0), id("1200"), 0);
        let config = Config {
            digit_bits: 7,
            ..config()
        };
        assert!(RoutingState::new(local, config).is_err());
    }

    #[test]
    fn update_all_state() {
        let mut state = state("1200");
        state.update_all_state(node("1300", 3));

        assert_eq!(state.find_in_leaf_set(&id("1300")), Some(Side::Right));
        assert!(state.find_in_neighbour_set(&id("1300")).is_some());
        assert_eq!(state.find_in_routing_table(&id("1300")), Some((1, 3)));
    }

    #[test]
    fn update_all_state_self() {
        let mut state = state("1200");
        state.update_all_state(node("1200", 3));

        assert!(state.leaf_set().is_empty());
        assert!(state.neighbour_set().is_empty());
        assert!(state.routing_table().is_empty());
    }

    #[test]
    fn update_all_state_is_idempotent() {
        let mut once = state("1200");
        let mut twice = state("1200");
        for s in ["0123", "1300", "2001", "1210"] {
            once.update_all_state(node(s, 4));
            twice.update_all_state(node(s, 4));
            twice.update_all_state(node(s, 4));
        }

        let leaf_ids = |s: &RoutingState| -> Vec<Id> {
            s.leaf_set().iter().map(|n| n.id().clone()).collect()
        };
        let neighbour_ids = |s: &RoutingState| -> Vec<Id> {
            s.neighbour_set().iter().map(|n| n.id().clone()).collect()
        };
        let table_ids = |s: &RoutingState| -> Vec<Option<Id>> {
            s.routing_table()
                .cells()
                .map(|cell| cell.map(|n| n.id().clone()))
                .collect()
        };

        assert_eq!(leaf_ids(&once), leaf_ids(&twice));
        assert_eq!(neighbour_ids(&once), neighbour_ids(&twice));
        assert_eq!(table_ids(&once), table_ids(&twice));
    }

    #[test]
    fn delete_from_all() {
        let mut state = state("1200");
        state.update_all_state(node("1300", 3));
        state.delete_from_all(&id("1300"));

        assert_eq!(state.find_in_leaf_set(&id("1300")), None);
        assert!(state.find_in_neighbour_set(&id("1300")).is_none());
        assert_eq!(state.find_in_routing_table(&id("1300")), None);

        // Deleting an unknown node is a no-op.
        state.delete_from_all(&id("3333"));
    }

    #[test]
    fn next_hop_without_state_is_local() {
        let state = state("1200");
        assert_eq!(state.next_hop(&id("3000")).id(), &id("1200"));
    }

    #[test]
    fn next_hop_in_leaf_set() {
        let mut state = state("1200");
        state.add_to_leaf_set(node("1100", 0));
        state.add_to_leaf_set(node("1133", 0));
        state.add_to_leaf_set(node("1230", 0));
        state.add_to_leaf_set(node("1302", 0));

        // 1131 is two away from 1133 and three away from us.
        assert_eq!(state.next_hop(&id("1131")).id(), &id("1133"));
        assert_eq!(state.next_hop(&id("1301")).id(), &id("1302"));
        // Closest to ourselves: deliver here.
        assert_eq!(state.next_hop(&id("1201")).id(), &id("1200"));
    }

    #[test]
    fn next_hop_leaf_set_beats_routing_table() {
        let mut state = state("1200");
        state.add_to_leaf_set(node("1302", 0));
        // Would match prefix 1 digit 3 in the routing table.
        state.add_to_routing_table(node("1330", 0), None);

        assert_eq!(state.next_hop(&id("1301")).id(), &id("1302"));
    }

    #[test]
    fn next_hop_from_routing_table() {
        let mut state = state("1200");
        state.add_to_leaf_set(node("1201", 0));
        state.add_to_routing_table(node("3333", 0), None);

        // Outside the leaf set span, prefix 0 digit 3 is occupied.
        let hop = state.next_hop(&id("3000"));
        assert_eq!(hop.id(), &id("3333"));
        assert!(prefix_match_len(hop.id(), &id("3000")) > prefix_match_len(&id("1200"), &id("3000")));
    }

    #[test]
    fn next_hop_fallback_scan() {
        let mut state = state("1200");
        // Row 0 digit 3 stays empty.
        state.add_to_routing_table(node("2000", 0), None);
        state.add_to_neighbour_set(node("2333", 0));

        assert_eq!(state.next_hop(&id("3001")).id(), &id("2333"));
    }

    #[test]
    fn next_hop_fallback_to_local() {
        let mut state = state("1200");
        state.add_to_neighbour_set(node("0000", 0));

        // 0000 is farther from both targets than we are.
        assert_eq!(state.next_hop(&id("3000")).id(), &id("1200"));
        assert_eq!(state.next_hop(&id("1203")).id(), &id("1200"));
    }

    #[test]
    fn next_hop_is_deterministic() {
        let mut state = state("1200");
        for (s, p) in [("0123", 5), ("1300", 3), ("2001", 9), ("1033", 1), ("3210", 2)] {
            state.update_all_state(node(s, p));
        }

        for target in ["0000", "1111", "2222", "3333", "1301"] {
            let target = id(target);
            let first = state.next_hop(&target);
            for _ in 0..5 {
                assert_eq!(state.next_hop(&target).id(), first.id());
            }
        }
    }

    #[test]
    fn update_routing_table_row() {
        let mut state = state("1200");
        state.update_routing_table([node("0000", 1), node("2000", 1), node("1300", 1)], 0);

        assert_eq!(state.routing_table().get(0, 0).unwrap().id(), &id("0000"));
        assert_eq!(state.routing_table().get(0, 2).unwrap().id(), &id("2000"));
        // 1300 shares one digit with us: hinted into row 0, digit 1.
        assert_eq!(state.routing_table().get(0, 1).unwrap().id(), &id("1300"));
    }

    #[test]
    fn join_counters() {
        let mut state = state("1200");
        assert!(!state.is_join_complete());

        state.set_total_route_length(1);
        state.increment_received_update_count(1);
        assert!(state.is_join_complete());

        state.reset_update_values();
        assert_eq!(state.total_route_length(), state.rows());
        assert_eq!(state.received_update_count(), 0);
    }

    #[test]
    fn data_store() {
        let mut state = state("1200");
        assert_eq!(state.put("key", "value"), None);
        assert_eq!(state.get("key"), Some(&"value".to_string()));
        assert_eq!(state.put("key", "other"), Some("value".to_string()));
        assert_eq!(state.store().len(), 1);
        assert_eq!(state.delete("key"), Some("other".to_string()));
        assert_eq!(state.get("key"), None);
    }
}

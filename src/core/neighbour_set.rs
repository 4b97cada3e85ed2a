//! The neighbour set: the nodes closest to the local node in the underlying network.

use std::sync::Arc;

use tracing::debug;

use crate::core::{id::Id, node::Node};

/// A capped set of nodes ordered by ascending proximity.
///
/// Only used as a last-resort candidate source while routing, never for correctness.
#[derive(Debug, Clone)]
pub struct NeighbourSet {
    local_id: Id,
    capacity: usize,
    // Sorted by (proximity, id) so equal proximities still order deterministically.
    nodes: Vec<Arc<Node>>,
}

impl NeighbourSet {
    pub fn new(local_id: Id, capacity: usize) -> Self {
        Self {
            local_id,
            capacity,
            nodes: Vec::with_capacity(capacity + 1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Inserts a node, replacing any entry with the same identifier so updated proximity is
    /// captured. Returns `true` if the node is a member once the call completes.
    pub fn add(&mut self, node: Arc<Node>) -> bool {
        if *node.id() == self.local_id {
            return false;
        }

        self.remove(node.id());

        let i = {
            let key = (node.proximity(), node.id());
            self.nodes
                .partition_point(|n| (n.proximity(), n.id()) < key)
        };
        self.nodes.insert(i, node);

        if self.nodes.len() > self.capacity {
            if let Some(evicted) = self.nodes.pop() {
                debug!(
                    id = %evicted.id(),
                    proximity = evicted.proximity(),
                    "evicted farthest neighbour"
                );
            }
        }

        i < self.nodes.len()
    }

    /// Removes the node with this identifier, returning `true` if it was present.
    pub fn remove(&mut self, id: &Id) -> bool {
        match self.nodes.iter().position(|n| n.id() == id) {
            Some(i) => {
                self.nodes.remove(i);
                true
            }
            None => false,
        }
    }

    pub fn find(&self, id: &Id) -> Option<&Arc<Node>> {
        self.nodes.iter().find(|n| n.id() == id)
    }

    /// Iterates members from the closest to the farthest.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Arc<Node>> {
        self.nodes.iter()
    }

    pub fn to_vec(&self) -> Vec<Arc<Node>> {
        self.nodes.clone()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use rand::{thread_rng, Rng};

    use super::*;
    use crate::core::config::Config;

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
        Arc::new(Node::new("127.0.0.1:0".parse().unwrap(), id(s), proximity))
    }

    fn ids(set: &NeighbourSet) -> Vec<String> {
        set.iter().map(|n| n.id().to_string()).collect()
    }

    #[test]
    fn add_self() {
        let mut set = NeighbourSet::new(id("0000"), 4);
        assert!(!set.add(node("0000", 1)));
        assert!(set.is_empty());
    }

    #[test]
    fn add_orders_by_proximity() {
        let mut set = NeighbourSet::new(id("0000"), 4);
        assert!(set.add(node("0001", 30)));
        assert!(set.add(node("0002", 10)));
        assert!(set.add(node("0003", 20)));

        assert_eq!(ids(&set), ["0002", "0003", "0001"]);
    }

    #[test]
    fn add_replaces_same_id() {
        let mut set = NeighbourSet::new(id("0000"), 4);
        set.add(node("0001", 30));
        set.add(node("0002", 10));

        // Same identifier, better proximity.
        assert!(set.add(node("0001", 5)));
        assert_eq!(set.len(), 2);
        assert_eq!(ids(&set), ["0001", "0002"]);
        assert_eq!(set.find(&id("0001")).unwrap().proximity(), 5);
    }

    #[test]
    fn add_evicts_farthest() {
        let mut set = NeighbourSet::new(id("0000"), 2);
        set.add(node("0001", 10));
        set.add(node("0002", 20));

        assert!(set.add(node("0003", 15)));
        assert_eq!(ids(&set), ["0001", "0003"]);

        // Worse than every member: rejected.
        assert!(!set.add(node("0010", 99)));
        assert_eq!(ids(&set), ["0001", "0003"]);
    }

    #[test]
    fn equal_proximity_is_not_a_duplicate() {
        let mut set = NeighbourSet::new(id("0000"), 4);
        assert!(set.add(node("0002", 10)));
        assert!(set.add(node("0001", 10)));
        assert_eq!(ids(&set), ["0001", "0002"]);
    }

    #[test]
    fn remove() {
        let mut set = NeighbourSet::new(id("0000"), 4);
        set.add(node("0001", 10));
        assert!(set.remove(&id("0001")));
        assert!(!set.remove(&id("0001")));
        assert!(set.find(&id("0001")).is_none());
    }

    #[test]
    fn capacity_holds_under_random_inserts() {
        let config = config();
        let mut rng = thread_rng();
        let local = Id::random(&config);
        let mut set = NeighbourSet::new(local.clone(), config.neighbour_set_capacity());

        for _ in 0..500 {
            set.add(Arc::new(Node::new(
                "127.0.0.1:0".parse().unwrap(),
                Id::random(&config),
                rng.gen_range(0..100),
            )));

            assert!(set.len() <= set.capacity());
            assert!(set.find(&local).is_none());
            assert!(set
                .iter()
                .zip(set.iter().skip(1))
                .all(|(a, b)| a.proximity() <= b.proximity()));
        }
    }
}

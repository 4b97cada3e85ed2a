//! The leaf set: the nodes numerically nearest the local identifier.

use std::{collections::BTreeMap, sync::Arc};

use tracing::debug;

use crate::core::{id::Id, node::Node};

/// The half of the leaf set a node lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    /// Identifiers below the local identifier.
    Left,
    /// Identifiers above the local identifier.
    Right,
}

/// Two capped sets of nodes, ordered by identifier, on either side of the local node.
///
/// Each side keeps the `capacity` members closest to the local identifier: when a side
/// overflows, the member farthest from the local node is evicted (the smallest identifier on the
/// left, the largest on the right).
#[derive(Debug, Clone)]
pub struct LeafSet {
    local_id: Id,
    capacity: usize,
    left: BTreeMap<Id, Arc<Node>>,
    right: BTreeMap<Id, Arc<Node>>,
}

impl LeafSet {
    /// Creates an empty leaf set holding at most `capacity` nodes per side.
    pub fn new(local_id: Id, capacity: usize) -> Self {
        Self {
            local_id,
            capacity,
            left: BTreeMap::new(),
            right: BTreeMap::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the side an identifier belongs on, `None` for the local identifier.
    pub fn side_for(&self, id: &Id) -> Option<Side> {
        if *id < self.local_id {
            Some(Side::Left)
        } else if *id > self.local_id {
            Some(Side::Right)
        } else {
            None
        }
    }

    /// Inserts a node, returning `true` if it is a member once the call completes.
    ///
    /// Inserting an identifier that is already present keeps the existing entry.
    pub fn add(&mut self, node: Arc<Node>) -> bool {
        let side = match self.side_for(node.id()) {
            Some(side) => side,
            None => return false,
        };

        let capacity = self.capacity;
        let id = node.id().clone();
        let members = self.side_mut(side);
        members.entry(id.clone()).or_insert(node);

        if members.len() > capacity {
            let evicted = match side {
                Side::Left => members.pop_first(),
                Side::Right => members.pop_last(),
            };

            if let Some((evicted_id, _)) = evicted {
                debug!(?side, id = %evicted_id, "evicted farthest leaf");
            }
        }

        self.side(side).contains_key(&id)
    }

    /// Removes the node with this identifier from whichever side holds it.
    pub fn remove(&mut self, id: &Id) -> bool {
        self.left.remove(id).is_some() || self.right.remove(id).is_some()
    }

    /// Returns the side holding this identifier, if any.
    pub fn find(&self, id: &Id) -> Option<Side> {
        if self.left.contains_key(id) {
            Some(Side::Left)
        } else if self.right.contains_key(id) {
            Some(Side::Right)
        } else {
            None
        }
    }

    /// Iterates one side in ascending identifier order.
    pub fn iter_side(&self, side: Side) -> impl DoubleEndedIterator<Item = &Arc<Node>> {
        self.side(side).values()
    }

    /// Iterates the left side then the right side, each in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Node>> {
        self.left.values().chain(self.right.values())
    }

    /// Copies one side in ascending identifier order.
    pub fn to_vec(&self, side: Side) -> Vec<Arc<Node>> {
        self.iter_side(side).cloned().collect()
    }

    /// The identifiers bounding the leaf set, an empty side is bounded by the local identifier.
    ///
    /// Returns `None` if both sides are empty.
    pub fn span(&self) -> Option<(&Id, &Id)> {
        if self.is_empty() {
            return None;
        }

        let min = self.left.keys().next().unwrap_or(&self.local_id);
        let max = self.right.keys().next_back().unwrap_or(&self.local_id);

        Some((min, max))
    }

    /// Returns `true` if the identifier lies within the leaf set's span.
    pub fn covers(&self, id: &Id) -> bool {
        matches!(self.span(), Some((min, max)) if min <= id && id <= max)
    }

    pub fn len(&self) -> usize {
        self.left.len() + self.right.len()
    }

    pub fn side_len(&self, side: Side) -> usize {
        self.side(side).len()
    }

    pub fn is_empty(&self) -> bool {
        self.left.is_empty() && self.right.is_empty()
    }

    fn side(&self, side: Side) -> &BTreeMap<Id, Arc<Node>> {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    fn side_mut(&mut self, side: Side) -> &mut BTreeMap<Id, Arc<Node>> {
        match side {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        }
    }
}

//! Lazy repair of the leaf and neighbour sets.
//!
//! When a peer referenced by the leaf or neighbour set stops answering, the node asks another
//! member of the same structure for its own view and merges whatever improves local state. A
//! round walks a snapshot of the candidates, farthest first, and stops at the first peer that
//! answers; an unreachable peer is never retried within the same round.
//!
//! The routing state's lock is taken only to snapshot the candidates and to merge a response,
//! never across a peer exchange, so routing carries on while a round waits on the network.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::{
    core::{
        id::Id,
        leaf_set::Side,
        node::{Node, NodeInfo},
        traits::PeerExchange,
    },
    router::{RoutingState, SyncRoutingState},
};

/// Summary of a repair round.
///
/// Rounds never fail: an exhausted candidate list just ends the round, possibly with nothing
/// merged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepairOutcome {
    /// The peer whose response was merged, if any answered.
    pub contacted: Option<Id>,
    /// The number of returned entries accepted into the repaired structure.
    pub merged: usize,
    /// The peers that couldn't be reached, in the order they were tried.
    pub failed: Vec<Id>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    LeafSet(Side),
    NeighbourSet,
}

impl SyncRoutingState {
    /// Refreshes one side of the leaf set from the members of that side, farthest first.
    ///
    /// Only returned entries belonging on `side` are merged.
    pub async fn repair_leaf_set<E>(&self, exchange: &E, side: Side) -> RepairOutcome
    where
        E: PeerExchange + Sync + ?Sized,
    {
        self.repair(exchange, Target::LeafSet(side), usize::MAX).await
    }

    /// Like [`repair_leaf_set`](Self::repair_leaf_set), contacting at most `max_attempts` peers.
    pub async fn repair_leaf_set_within<E>(
        &self,
        exchange: &E,
        side: Side,
        max_attempts: usize,
    ) -> RepairOutcome
    where
        E: PeerExchange + Sync + ?Sized,
    {
        self.repair(exchange, Target::LeafSet(side), max_attempts)
            .await
    }

    /// Refreshes the neighbour set from its members, starting with the farthest.
    pub async fn repair_neighbour_set<E>(&self, exchange: &E) -> RepairOutcome
    where
        E: PeerExchange + Sync + ?Sized,
    {
        self.repair(exchange, Target::NeighbourSet, usize::MAX)
            .await
    }

    /// Like [`repair_neighbour_set`](Self::repair_neighbour_set), contacting at most
    /// `max_attempts` peers.
    pub async fn repair_neighbour_set_within<E>(
        &self,
        exchange: &E,
        max_attempts: usize,
    ) -> RepairOutcome
    where
        E: PeerExchange + Sync + ?Sized,
    {
        self.repair(exchange, Target::NeighbourSet, max_attempts)
            .await
    }

    async fn repair<E>(&self, exchange: &E, target: Target, max_attempts: usize) -> RepairOutcome
    where
        E: PeerExchange + Sync + ?Sized,
    {
        // A copied candidate list, the live structure may change while we wait on peers.
        let candidates = self.with(|state| candidates(state, target));

        let mut outcome = RepairOutcome::default();
        for peer in candidates.into_iter().take(max_attempts) {
            let response = match target {
                Target::LeafSet(_) => exchange.request_leaf_set(&peer).await,
                Target::NeighbourSet => exchange.request_neighbour_set(&peer).await,
            };

            match response {
                Ok(nodes) => {
                    outcome.merged = self.merge(target, nodes);
                    outcome.contacted = Some(peer.id().clone());

                    debug!(
                        ?target,
                        peer = %peer.id(),
                        merged = outcome.merged,
                        "repair round completed"
                    );
                    break;
                }
                Err(e) => {
                    warn!(?target, peer = %peer.id(), "repair candidate unreachable: {e}");
                    outcome.failed.push(peer.id().clone());
                }
            }
        }

        if outcome.contacted.is_none() {
            debug!(?target, failed = outcome.failed.len(), "repair candidates exhausted");
        }

        outcome
    }

    fn merge(&self, target: Target, nodes: Vec<NodeInfo>) -> usize {
        let local_addr = self.local().addr();

        self.with(|state| {
            let config = *state.config();
            let local_id = state.local_id().clone();

            let mut merged = 0;
            for info in nodes {
                if !info.id.fits(&config) {
                    continue;
                }

                let belongs = match target {
                    Target::LeafSet(Side::Left) => info.id < local_id,
                    Target::LeafSet(Side::Right) => info.id > local_id,
                    Target::NeighbourSet => true,
                };
                if !belongs {
                    continue;
                }

                let node = Arc::new(Node::from_info(info, local_addr));
                let accepted = match target {
                    Target::LeafSet(_) => state.add_to_leaf_set(node),
                    Target::NeighbourSet => state.add_to_neighbour_set(node),
                };
                if accepted {
                    merged += 1;
                }
            }

            merged
        })
    }
}

// Farthest members first: the smallest identifiers on the left, the largest on the right, the
// worst proximity in the neighbour set.
fn candidates(state: &RoutingState, target: Target) -> Vec<Arc<Node>> {
    match target {
        Target::LeafSet(Side::Left) => state.leaf_set().iter_side(Side::Left).cloned().collect(),
        Target::LeafSet(Side::Right) => state
            .leaf_set()
            .iter_side(Side::Right)
            .rev()
            .cloned()
            .collect(),
        Target::NeighbourSet => state.neighbour_set().iter().rev().cloned().collect(),
    }
}

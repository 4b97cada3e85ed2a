//! Prefix and distance comparisons shared by the routing structures.
//!
//! Identifiers are treated as unsigned integers in base `2^b` and the distance between two of
//! them is their absolute numeric difference. The same metric orders the leaf set, bounds its
//! span, and picks the closest member in every next-hop scan.

use crate::core::{id::Id, node::Node};

/// Length of the longest common prefix of two identifiers.
///
/// During routing this doubles as the number of hops already made towards the target.
pub fn prefix_match_len(a: &Id, b: &Id) -> usize {
    a.prefix_match_len(b)
}

/// Returns `true` if `candidate` is strictly closer to `target` than `best`.
///
/// Ties keep `best` so repeated scans over unchanged state pick the same node.
pub fn is_better_node(candidate: Option<&Node>, best: &Node, target: &Id, bits: u8) -> bool {
    match candidate {
        Some(candidate) => {
            candidate.id().distance(target, bits) < best.id().distance(target, bits)
        }
        None => false,
    }
}

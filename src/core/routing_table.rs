//! The prefix-indexed routing table.

use std::sync::Arc;

use tracing::debug;

use crate::core::{distance::prefix_match_len, id::Id, node::Node};

/// A `rows x cols` matrix of nodes.
///
/// Cell `[p][d]` holds at most one node sharing exactly `p` leading digits with the local
/// identifier and whose next digit is `d`. When two candidates compete for a cell, the one with
/// the smaller proximity is kept.
#[derive(Debug, Clone)]
pub struct RoutingTable {
    // The node's local identifier.
    local_id: Id,
    rows: usize,
    cols: usize,
    cells: Vec<Vec<Option<Arc<Node>>>>,
}

impl RoutingTable {
    /// Creates an empty routing table.
    pub fn new(local_id: Id, rows: usize, cols: usize) -> Self {
        Self {
            local_id,
            rows,
            cols,
            cells: vec![vec![None; cols]; rows],
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Returns the cell an identifier belongs in.
    ///
    /// `None` for the local identifier and for identifiers sharing `rows` or more digits with it,
    /// which are only reachable through the leaf set.
    pub fn position(&self, id: &Id) -> Option<(usize, usize)> {
        let prefix = prefix_match_len(&self.local_id, id);
        self.position_with_prefix(id, prefix)
    }

    fn position_with_prefix(&self, id: &Id, prefix: usize) -> Option<(usize, usize)> {
        if prefix >= self.rows {
            return None;
        }

        let digit = id.digit(prefix)? as usize;
        (digit < self.cols).then_some((prefix, digit))
    }

    /// Inserts a node, returning `true` if it occupies its cell once the call completes.
    ///
    /// `prefix_hint` places the node in a given row (used when a whole row is received from a
    /// peer while joining); a hint longer than the node's real prefix with the local identifier
    /// is rejected. An occupant with the same identifier is replaced, otherwise the smaller
    /// proximity wins and ties keep the occupant.
    pub fn add(&mut self, node: Arc<Node>, prefix_hint: Option<usize>) -> bool {
        if *node.id() == self.local_id {
            return false;
        }

        let actual = prefix_match_len(&self.local_id, node.id());
        let prefix = match prefix_hint {
            Some(hint) if hint > actual => return false,
            Some(hint) => hint,
            None => actual,
        };

        let (row, col) = match self.position_with_prefix(node.id(), prefix) {
            Some(pos) => pos,
            None => return false,
        };

        let cell = &mut self.cells[row][col];
        let keep_occupant = cell.as_ref().is_some_and(|occupant| {
            occupant.id() != node.id() && occupant.proximity() <= node.proximity()
        });
        if keep_occupant {
            return false;
        }

        if let Some(replaced) = cell.replace(node) {
            debug!(row, col, id = %replaced.id(), "replaced routing table entry");
        }

        true
    }

    /// Clears the node's cell if that cell holds the same identifier.
    pub fn remove(&mut self, id: &Id) -> bool {
        let (row, col) = match self.position(id) {
            Some(pos) => pos,
            None => return false,
        };

        let cell = &mut self.cells[row][col];
        if cell.as_ref().is_some_and(|occupant| occupant.id() == id) {
            *cell = None;
            return true;
        }

        false
    }

    /// Returns the position of the identifier's cell if that cell is occupied by any node.
    pub fn find(&self, id: &Id) -> Option<(usize, usize)> {
        self.position(id)
            .filter(|&(row, col)| self.cells[row][col].is_some())
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&Arc<Node>> {
        self.cells.get(row)?.get(col)?.as_ref()
    }

    /// Iterates every cell in row-major order, including empty ones.
    pub fn cells(&self) -> impl Iterator<Item = Option<&Arc<Node>>> {
        self.cells
            .iter()
            .flat_map(|row| row.iter().map(Option::as_ref))
    }

    /// Iterates the occupied cells in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Node>> {
        self.cells.iter().flatten().flatten()
    }

    /// Copies the whole matrix.
    pub fn to_vec(&self) -> Vec<Vec<Option<Arc<Node>>>> {
        self.cells.clone()
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }
}

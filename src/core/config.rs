//! Overlay parameters fixing the dimensions of the routing state.

use crate::core::error::{Error, Result};

/// Overlay parameters.
///
/// These are supplied once at startup; the routing table and set capacities derived from them
/// never change for the lifetime of a [`RoutingState`](crate::RoutingState).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// The expected number of nodes in the overlay (`N`).
    pub overlay_size: usize,
    /// The number of bits per identifier digit (`b`), the alphabet has `2^b` symbols.
    pub digit_bits: u8,
    /// The number of digits in an identifier.
    pub id_len: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            overlay_size: 1 << 16,
            digit_bits: 4,
            id_len: 8,
        }
    }
}

impl Config {
    /// Checks the parameters are usable, identifiers must fit in 128 bits.
    pub fn validate(&self) -> Result<()> {
        if self.overlay_size < 2 {
            return Err(Error::InvalidConfig(format!(
                "overlay size must be at least 2, got {}",
                self.overlay_size
            )));
        }

        if !(1..=4).contains(&self.digit_bits) {
            return Err(Error::InvalidConfig(format!(
                "digit bits must be in 1..=4, got {}",
                self.digit_bits
            )));
        }

        if self.id_len == 0 || self.id_len * self.digit_bits as usize > u128::BITS as usize {
            return Err(Error::InvalidConfig(format!(
                "{} digits of {} bits don't fit in an identifier",
                self.id_len, self.digit_bits
            )));
        }

        // Every row needs a digit to index its columns.
        if self.id_len < self.rows() {
            return Err(Error::InvalidConfig(format!(
                "{} digits can't address {} routing table rows",
                self.id_len,
                self.rows()
            )));
        }

        Ok(())
    }

    /// Number of routing table rows: the smallest `r` with `(2^b)^r >= N`.
    pub fn rows(&self) -> usize {
        // Integer form of ceil(ln(N) / ln(2^b)), floats misround exact powers.
        let base = self.cols();
        let mut rows = 0;
        let mut reach = 1usize;
        while reach < self.overlay_size {
            reach = reach.saturating_mul(base);
            rows += 1;
        }

        rows
    }

    /// Number of routing table columns, one per digit value.
    pub fn cols(&self) -> usize {
        1 << self.digit_bits
    }

    /// Maximum number of nodes on each side of the leaf set.
    pub fn leaf_set_side_capacity(&self) -> usize {
        self.cols() / 2
    }

    /// Maximum number of nodes in the neighbour set.
    pub fn neighbour_set_capacity(&self) -> usize {
        self.cols()
    }
}

//! Foundational and often-reused types.

pub(crate) mod config;
pub(crate) mod distance;
pub(crate) mod error;
pub(crate) mod id;
pub(crate) mod leaf_set;
pub mod message;
pub(crate) mod neighbour_set;
pub(crate) mod node;
pub(crate) mod routing_table;
#[cfg(feature = "sync")]
pub(crate) mod traits;

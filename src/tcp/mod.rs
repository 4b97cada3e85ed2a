//! Repair exchanges over TCP.
//!
//! Every exchange opens a fresh connection to the peer, sends one request frame and waits for
//! exactly one response frame. [`serve`] answers those requests from a [`SyncRoutingState`].
//!
//! [`SyncRoutingState`]: crate::SyncRoutingState

mod exchange;
mod server;

pub use exchange::TcpExchange;
pub use server::serve;

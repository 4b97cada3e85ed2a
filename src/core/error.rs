//! Crate error type.

use std::io;

/// Errors surfaced by construction, parsing and peer exchanges.
///
/// Routing operations themselves never fail: invalid input (such as the local node) is ignored
/// and a gap in the routing table simply falls through to the next selection step.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid identifier: {0}")]
    InvalidId(String),

    #[error(transparent)]
    /// Transparent [std::io::Error]
    Io(#[from] io::Error),

    /// The peer didn't answer in time.
    #[error("peer exchange timed out")]
    Timeout,

    /// The peer closed the connection before responding.
    #[error("connection closed before a response was received")]
    ConnectionClosed,

    /// The peer answered with a message that doesn't match the request.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error("codec error: {0}")]
    Codec(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

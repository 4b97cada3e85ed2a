use std::{net::SocketAddr, time::Duration};

use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_util::codec::Framed;

use crate::{
    codec::MessageCodec,
    core::{
        error::{Error, Result},
        message::Message,
        node::{Node, NodeInfo},
        traits::PeerExchange,
    },
};

/// A [`PeerExchange`] opening one TCP connection per request.
#[derive(Debug, Clone)]
pub struct TcpExchange {
    // Sent along with every request so the peer can record us.
    local: NodeInfo,
    timeout: Duration,
}

impl TcpExchange {
    /// Default upper bound on connecting, sending and receiving for a single exchange.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

    pub fn new(local: NodeInfo) -> Self {
        Self {
            local,
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn exchange(&self, peer: &Node, request: Message) -> Result<Message> {
        match tokio::time::timeout(self.timeout, round_trip(peer.addr(), request)).await {
            Ok(response) => response,
            Err(_elapsed) => Err(Error::Timeout),
        }
    }
}

async fn round_trip(addr: SocketAddr, request: Message) -> Result<Message> {
    let stream = TcpStream::connect(addr).await?;
    let mut framed = Framed::new(stream, MessageCodec::new());

    framed.send(request).await?;

    match framed.next().await {
        Some(response) => response,
        None => Err(Error::ConnectionClosed),
    }
}

#[async_trait::async_trait]
impl PeerExchange for TcpExchange {
    async fn request_leaf_set(&self, peer: &Node) -> Result<Vec<NodeInfo>> {
        let request = Message::RequestLeafSet {
            sender: self.local.clone(),
        };

        match self.exchange(peer, request).await? {
            Message::LeafSet { nodes } => Ok(nodes),
            other => Err(Error::UnexpectedResponse(other.variant_as_str().into())),
        }
    }

    async fn request_neighbour_set(&self, peer: &Node) -> Result<Vec<NodeInfo>> {
        let request = Message::RequestNeighbourSet {
            sender: self.local.clone(),
        };

        match self.exchange(peer, request).await? {
            Message::NeighbourSet { nodes } => Ok(nodes),
            other => Err(Error::UnexpectedResponse(other.variant_as_str().into())),
        }
    }
}

#![allow(dead_code)]

use std::{collections::HashMap, net::SocketAddr, sync::Arc};

use parking_lot::Mutex;
use pastry::{Config, Error, Id, Node, NodeInfo, PeerExchange, Result, SyncRoutingState};
use tracing_subscriber::{fmt, EnvFilter};

pub fn enable_tracing() {
    fmt()
        .with_test_writer()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
}

// b = 2, N = 16: 2 rows, 4 columns, 2 nodes per leaf set side.
pub fn small_config() -> Config {
    Config {
        overlay_size: 16,
        digit_bits: 2,
        id_len: 4,
    }
}

// b = 4, N = 256: 2 rows, 16 columns, 8 nodes per leaf set side.
pub fn hex_config() -> Config {
    Config {
        overlay_size: 256,
        digit_bits: 4,
        id_len: 4,
    }
}

pub fn localhost_with_port(port: u16) -> SocketAddr {
    format!("127.0.0.1:{port}").parse().unwrap()
}

pub fn id(s: &str, config: &Config) -> Id {
    Id::parse(s, config).unwrap()
}

pub fn node(s: &str, config: &Config, port: u16, proximity: u64) -> Arc<Node> {
    Arc::new(Node::new(localhost_with_port(port), id(s, config), proximity))
}

pub fn info(s: &str, config: &Config, port: u16) -> NodeInfo {
    NodeInfo {
        addr: localhost_with_port(port),
        id: id(s, config),
    }
}

pub fn state(local: &str, config: Config) -> SyncRoutingState {
    SyncRoutingState::new(Node::new(localhost_with_port(0), id(local, &config), 0), config)
        .unwrap()
}

pub fn ids(nodes: &[Arc<Node>]) -> Vec<String> {
    nodes.iter().map(|n| n.id().to_string()).collect()
}

/// A peer exchange answering from a fixed script: peers without an entry (or scripted with
/// `None`) fail as if unreachable. Every contacted peer is recorded in order.
#[derive(Default)]
pub struct ScriptedExchange {
    pub leaf_sets: HashMap<Id, Option<Vec<NodeInfo>>>,
    pub neighbour_sets: HashMap<Id, Option<Vec<NodeInfo>>>,
    pub calls: Mutex<Vec<Id>>,
}

impl ScriptedExchange {
    pub fn calls(&self) -> Vec<Id> {
        self.calls.lock().clone()
    }
}

#[async_trait::async_trait]
impl PeerExchange for ScriptedExchange {
    async fn request_leaf_set(&self, peer: &Node) -> Result<Vec<NodeInfo>> {
        self.calls.lock().push(peer.id().clone());
        self.leaf_sets
            .get(peer.id())
            .cloned()
            .flatten()
            .ok_or_else(|| Error::Io(std::io::ErrorKind::ConnectionRefused.into()))
    }

    async fn request_neighbour_set(&self, peer: &Node) -> Result<Vec<NodeInfo>> {
        self.calls.lock().push(peer.id().clone());
        self.neighbour_sets
            .get(peer.id())
            .cloned()
            .flatten()
            .ok_or(Error::Timeout)
    }
}

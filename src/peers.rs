use std::collections::HashMap;

use tokio::sync::RwLock;

/// Allowed-countries string of every configured peer.
#[derive(Debug, Default)]
pub struct PeerTable {
    peers: RwLock<HashMap<String, String>>,
}

impl PeerTable {
    pub fn new(peers: HashMap<String, String>) -> Self {
        Self {
            peers: RwLock::new(peers),
        }
    }

    pub async fn allowed_countries(&self, peer: &str) -> Option<String> {
        self.peers.read().await.get(peer).cloned()
    }

    /// Sets the policy of a peer and returns the previous one, if any.
    pub async fn update(&self, peer: &str, allowed_countries: &str) -> Option<String> {
        self.peers
            .write()
            .await
            .insert(peer.to_string(), allowed_countries.to_string())
    }

    /// Peer names in alphabetical order.
    pub async fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.peers.read().await.keys().cloned().collect();
        names.sort();
        names
    }
}

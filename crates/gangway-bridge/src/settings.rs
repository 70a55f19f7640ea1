//! Session-wide engine settings carried by the bridge.

use serde::{Deserialize, Serialize};

/// Standard public DHT routers seeded into new sessions.
const DEFAULT_DHT_BOOTSTRAP_NODES: [&str; 4] = [
    "router.utorrent.com:6881",
    "router.bittorrent.com:6881",
    "dht.transmissionbt.com:6881",
    "router.bitcomet.com:6881",
];

/// Session-wide parameters handed to the engine at startup.
///
/// The bridge passes the struct through verbatim; validation and
/// interpretation belong to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSettings {
    /// User agent advertised to trackers.
    pub user_agent: String,
    /// Fingerprint prefix baked into generated peer identifiers.
    pub peer_fingerprint: String,
    /// Client version string sent in the extension handshake, when it
    /// should differ from the user agent.
    pub handshake_client_version: Option<String>,
    /// Global download rate limit in bytes per second; `None` for
    /// unlimited.
    pub download_rate_limit: Option<u64>,
    /// Global upload rate limit in bytes per second; `None` for
    /// unlimited.
    pub upload_rate_limit: Option<u64>,
    /// Extra DHT bootstrap nodes appended to the engine defaults.
    pub dht_bootstrap_nodes: Vec<String>,
    /// Interval between engine status-update batches, in milliseconds;
    /// `None` disables periodic updates.
    pub stats_interval_ms: Option<u64>,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            user_agent: concat!("gangway/", env!("CARGO_PKG_VERSION")).to_string(),
            peer_fingerprint: "GW".to_string(),
            handshake_client_version: None,
            download_rate_limit: None,
            upload_rate_limit: None,
            dht_bootstrap_nodes: DEFAULT_DHT_BOOTSTRAP_NODES
                .iter()
                .map(|node| (*node).to_string())
                .collect(),
            stats_interval_ms: Some(1_000),
        }
    }
}

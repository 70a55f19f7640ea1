//! Torrent-level value types shared across the bridge.

use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Engine-assigned identifier for a torrent.
///
/// Stable for the lifetime of the torrent within one engine session and
/// unique across all events of that session. Not persistent across
/// engine restarts; hosts that need durable identity must key on
/// something else (info-hash, save path) and map it themselves.
pub type HandleId = u64;

/// Phases the engine reports for a torrent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TorrentState {
    /// Waiting in the checking queue.
    QueuedForChecking,
    /// Verifying existing data against piece hashes.
    CheckingFiles,
    /// Fetching metadata from the swarm (magnet startup).
    DownloadingMetadata,
    /// Actively downloading payload data.
    Downloading,
    /// All requested data is present.
    Finished,
    /// Finished and uploading to the swarm.
    Seeding,
    /// Allocating storage on disk.
    Allocating,
    /// Validating a fast-resume payload.
    CheckingResumeData,
}

impl TorrentState {
    /// Whether torrent metadata (file list, piece layout) is available
    /// in this state.
    #[must_use]
    pub const fn is_metadata_ready(self) -> bool {
        matches!(self, Self::Downloading | Self::Finished | Self::Seeding)
    }
}

/// Point-in-time transfer statistics for one torrent.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TorrentStats {
    /// Total number of bytes the torrent requests.
    pub total_bytes: u64,
    /// Bytes downloaded and verified so far.
    pub downloaded_bytes: u64,
    /// Bytes uploaded over the lifetime of the torrent.
    pub uploaded_bytes: u64,
    /// Download payload rate in bytes per second.
    pub download_rate: u64,
    /// Upload payload rate in bytes per second.
    pub upload_rate: u64,
    /// Completion ratio in `0.0..=1.0`.
    pub progress: f32,
}

/// One torrent's entry inside a batched status-update alert.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TorrentStatus {
    /// Torrent the statistics belong to.
    pub handle: HandleId,
    /// Statistics captured when the engine posted the update.
    pub stats: TorrentStats,
}

/// Session-wide transfer counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SessionStats {
    /// Payload bytes downloaded across all torrents.
    pub payload_download: u64,
    /// Payload bytes uploaded across all torrents.
    pub payload_upload: u64,
    /// Peer connections currently open.
    pub num_peers: u32,
    /// Nodes currently known to the DHT.
    pub dht_nodes: u32,
}

/// Opaque fast-resume payload produced by the engine.
///
/// The bytes are engine-defined (bencoded in practice) and only
/// meaningful when handed back to the same engine. The listener decides
/// where the payload is stored.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResumeData {
    bytes: Vec<u8>,
}

impl ResumeData {
    /// Wrap an engine-produced resume payload.
    #[must_use]
    pub const fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Raw payload bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Payload length in bytes.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the engine produced an empty payload.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Persist the payload to `path`, overwriting any previous file.
    ///
    /// # Errors
    ///
    /// Returns the underlying IO error when the file cannot be written.
    pub fn write_to_file(&self, path: impl AsRef<Path>) -> io::Result<()> {
        std::fs::write(path, &self.bytes)
    }
}

impl From<Vec<u8>> for ResumeData {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new(bytes)
    }
}

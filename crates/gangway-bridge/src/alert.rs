//! Adapter-boundary form of engine notifications.

use gangway_core::{HandleId, ResumeData, SessionStats, TorrentState, TorrentStatus};

/// One engine notification, already discriminated at the adapter
/// boundary.
///
/// The engine's own queue carries opaque records; whatever adapter
/// copies a record out of the engine assigns the discriminant, so
/// downstream code dispatches with an exhaustive match instead of
/// runtime type probing. The set is wider than what reaches the
/// listener: kinds with no listener counterpart are dropped during
/// classification.
#[derive(Debug, Clone, PartialEq)]
pub enum Alert {
    /// A torrent was added to the session.
    TorrentAdded {
        /// Torrent the alert belongs to.
        handle: HandleId,
    },
    /// Metadata for a magnet-started torrent arrived from the swarm.
    MetadataReceived {
        /// Torrent the alert belongs to.
        handle: HandleId,
    },
    /// Existing data finished verifying against piece hashes.
    TorrentChecked {
        /// Torrent the alert belongs to.
        handle: HandleId,
    },
    /// The engine produced a fast-resume payload.
    SaveResumeData {
        /// Torrent the alert belongs to.
        handle: HandleId,
        /// Opaque resume payload.
        payload: ResumeData,
    },
    /// A piece completed and passed its hash check.
    PieceFinished {
        /// Torrent the alert belongs to.
        handle: HandleId,
        /// Piece that finished.
        piece: u32,
    },
    /// A block inside a piece started downloading.
    BlockDownloading {
        /// Torrent the alert belongs to.
        handle: HandleId,
        /// Piece the block belongs to.
        piece: u32,
        /// Block index within the piece.
        block: u32,
    },
    /// The torrent moved to a new phase.
    StateChanged {
        /// Torrent the alert belongs to.
        handle: HandleId,
        /// Phase the torrent entered.
        state: TorrentState,
    },
    /// Batched per-torrent statistics, one entry per torrent that
    /// changed since the last update.
    StateUpdate {
        /// Per-torrent statistics in engine order.
        statuses: Vec<TorrentStatus>,
    },
    /// A file inside the torrent completed.
    FileCompleted {
        /// Torrent the alert belongs to.
        handle: HandleId,
        /// Index of the completed file.
        file: u32,
    },
    /// The torrent was removed from the session.
    TorrentRemoved {
        /// Torrent the alert belongs to; may already be invalid.
        handle: HandleId,
        /// Display name, valid even when the handle is not.
        name: String,
    },
    /// Session-wide statistics snapshot.
    SessionStats {
        /// Counters captured by the engine.
        stats: SessionStats,
    },
    /// Tracker announce round-trip finished. Not surfaced to listeners.
    TrackerAnnounce {
        /// Torrent the alert belongs to.
        handle: HandleId,
        /// Announce URL that was contacted.
        url: String,
    },
    /// A peer connection was established. Not surfaced to listeners.
    PeerConnected {
        /// Torrent the alert belongs to.
        handle: HandleId,
    },
    /// Free-form engine log line. Not surfaced to listeners.
    LogMessage {
        /// Message text.
        message: String,
    },
}

impl Alert {
    /// Machine-friendly discriminator for logging.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::TorrentAdded { .. } => "torrent_added",
            Self::MetadataReceived { .. } => "metadata_received",
            Self::TorrentChecked { .. } => "torrent_checked",
            Self::SaveResumeData { .. } => "save_resume_data",
            Self::PieceFinished { .. } => "piece_finished",
            Self::BlockDownloading { .. } => "block_downloading",
            Self::StateChanged { .. } => "state_changed",
            Self::StateUpdate { .. } => "state_update",
            Self::FileCompleted { .. } => "file_completed",
            Self::TorrentRemoved { .. } => "torrent_removed",
            Self::SessionStats { .. } => "session_stats",
            Self::TrackerAnnounce { .. } => "tracker_announce",
            Self::PeerConnected { .. } => "peer_connected",
            Self::LogMessage { .. } => "log_message",
        }
    }
}

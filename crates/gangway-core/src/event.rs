//! Typed events and the host listener contract.

use serde::{Deserialize, Serialize};

use crate::model::{HandleId, ResumeData, SessionStats, TorrentState, TorrentStats};

/// Typed translation of one engine alert.
///
/// Events are transient: constructed, delivered to the [`Listener`] and
/// discarded within a single dispatch call. Every variant except
/// [`Event::SessionStats`] identifies its torrent by [`HandleId`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A torrent was added to the session.
    TorrentAdded {
        /// Torrent the event belongs to.
        handle: HandleId,
    },
    /// Metadata for a magnet-started torrent arrived from the swarm.
    MetadataReceived {
        /// Torrent the event belongs to.
        handle: HandleId,
    },
    /// Existing data finished verifying against piece hashes.
    Checked {
        /// Torrent the event belongs to.
        handle: HandleId,
    },
    /// The engine produced a fast-resume payload.
    SaveResumeData {
        /// Torrent the event belongs to.
        handle: HandleId,
        /// Opaque resume payload to persist.
        payload: ResumeData,
    },
    /// The torrent moved to a new phase.
    TorrentStateChanged {
        /// Torrent the event belongs to.
        handle: HandleId,
        /// Phase the torrent entered.
        state: TorrentState,
    },
    /// A block inside a piece started downloading.
    BlockDownloading {
        /// Torrent the event belongs to.
        handle: HandleId,
        /// Piece the block belongs to.
        piece: u32,
        /// Block index within the piece.
        block: u32,
    },
    /// A piece completed and passed its hash check.
    PieceFinished {
        /// Torrent the event belongs to.
        handle: HandleId,
        /// Piece that finished.
        piece: u32,
    },
    /// Periodic per-torrent statistics snapshot.
    StatusUpdate {
        /// Torrent the event belongs to.
        handle: HandleId,
        /// Statistics captured by the engine.
        stats: TorrentStats,
    },
    /// A file inside the torrent completed.
    FileCompleted {
        /// Torrent the event belongs to.
        handle: HandleId,
        /// Index of the completed file.
        file: u32,
    },
    /// The torrent was removed from the session.
    TorrentRemoved {
        /// Torrent the event belongs to. May be stale by the time the
        /// event is delivered; `name` remains valid.
        handle: HandleId,
        /// Display name of the removed torrent.
        name: String,
    },
    /// Session-wide statistics snapshot.
    SessionStats {
        /// Counters captured by the engine.
        stats: SessionStats,
    },
}

impl Event {
    /// Machine-friendly discriminator, matching the serialized tag.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::TorrentAdded { .. } => "torrent_added",
            Self::MetadataReceived { .. } => "metadata_received",
            Self::Checked { .. } => "checked",
            Self::SaveResumeData { .. } => "save_resume_data",
            Self::TorrentStateChanged { .. } => "torrent_state_changed",
            Self::BlockDownloading { .. } => "block_downloading",
            Self::PieceFinished { .. } => "piece_finished",
            Self::StatusUpdate { .. } => "status_update",
            Self::FileCompleted { .. } => "file_completed",
            Self::TorrentRemoved { .. } => "torrent_removed",
            Self::SessionStats { .. } => "session_stats",
        }
    }

    /// Torrent the event belongs to, when it has one.
    #[must_use]
    pub const fn handle(&self) -> Option<HandleId> {
        match self {
            Self::TorrentAdded { handle }
            | Self::MetadataReceived { handle }
            | Self::Checked { handle }
            | Self::SaveResumeData { handle, .. }
            | Self::TorrentStateChanged { handle, .. }
            | Self::BlockDownloading { handle, .. }
            | Self::PieceFinished { handle, .. }
            | Self::StatusUpdate { handle, .. }
            | Self::FileCompleted { handle, .. }
            | Self::TorrentRemoved { handle, .. } => Some(*handle),
            Self::SessionStats { .. } => None,
        }
    }
}

/// Host-side receiver for typed events.
///
/// One handler per [`Event`] variant; every handler defaults to a no-op
/// so implementers override only what they consume. Handlers run on the
/// thread that called event dispatch, while the listener exclusion lock
/// is held: they must return promptly, must not block indefinitely, and
/// must not re-enter dispatch (the lock is not reentrant).
#[allow(unused_variables)]
pub trait Listener: Send {
    /// A torrent was added to the session.
    fn on_torrent_added(&mut self, handle: HandleId) {}

    /// Metadata arrived for a magnet-started torrent.
    fn on_metadata_received(&mut self, handle: HandleId) {}

    /// Existing data finished verifying.
    fn on_checked(&mut self, handle: HandleId) {}

    /// A fast-resume payload is ready to persist.
    fn on_save_resume_data(&mut self, handle: HandleId, payload: &ResumeData) {}

    /// The torrent moved to a new phase.
    fn on_torrent_state_changed(&mut self, handle: HandleId, state: TorrentState) {}

    /// A block inside a piece started downloading.
    fn on_block_downloading(&mut self, handle: HandleId, piece: u32, block: u32) {}

    /// A piece completed and passed its hash check.
    fn on_piece_finished(&mut self, handle: HandleId, piece: u32) {}

    /// Periodic per-torrent statistics snapshot.
    fn on_status_update(&mut self, handle: HandleId, stats: TorrentStats) {}

    /// A file inside the torrent completed.
    fn on_file_completed(&mut self, handle: HandleId, file: u32) {}

    /// The torrent was removed from the session.
    fn on_torrent_removed(&mut self, handle: HandleId, name: &str) {}

    /// Session-wide statistics snapshot.
    fn on_session_stats(&mut self, stats: SessionStats) {}
}

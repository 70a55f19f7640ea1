//! Classification of engine alerts into typed events.

use gangway_core::Event;
use tracing::debug;

use crate::alert::Alert;

/// Map one engine alert onto the events delivered to the listener.
///
/// Alert kinds are matched in a fixed order, so classification is
/// deterministic even for engines whose records could structurally
/// decode more than one way. A batched state-update expands into one
/// [`Event::StatusUpdate`] per entry, preserving entry order. Kinds
/// with no listener counterpart yield an empty vector; dropping them is
/// normal operation, not an error.
#[must_use]
pub fn classify(alert: Alert) -> Vec<Event> {
    match alert {
        Alert::TorrentAdded { handle } => vec![Event::TorrentAdded { handle }],
        Alert::MetadataReceived { handle } => vec![Event::MetadataReceived { handle }],
        Alert::TorrentChecked { handle } => vec![Event::Checked { handle }],
        Alert::SaveResumeData { handle, payload } => {
            vec![Event::SaveResumeData { handle, payload }]
        }
        Alert::PieceFinished { handle, piece } => vec![Event::PieceFinished { handle, piece }],
        Alert::BlockDownloading {
            handle,
            piece,
            block,
        } => vec![Event::BlockDownloading {
            handle,
            piece,
            block,
        }],
        Alert::StateChanged { handle, state } => {
            vec![Event::TorrentStateChanged { handle, state }]
        }
        Alert::StateUpdate { statuses } => statuses
            .into_iter()
            .map(|status| Event::StatusUpdate {
                handle: status.handle,
                stats: status.stats,
            })
            .collect(),
        Alert::FileCompleted { handle, file } => vec![Event::FileCompleted { handle, file }],
        Alert::TorrentRemoved { handle, name } => vec![Event::TorrentRemoved { handle, name }],
        Alert::SessionStats { stats } => vec![Event::SessionStats { stats }],
        other => {
            debug!(kind = other.kind(), "ignored unrecognized alert");
            Vec::new()
        }
    }
}

//! Per-connection peer filtering over engine wire-protocol callbacks.
//!
//! A [`PeerFilterFactory`] is consulted once per torrent; private
//! torrents opt out entirely. For every new connection on a filtered
//! torrent the engine obtains a [`PeerFilterSession`] and feeds it each
//! wire-protocol callback inline. The session evaluates the active
//! predicate against a fresh [`PeerSnapshot`] and issues at most one
//! disconnect command per connection.

use std::sync::{Arc, RwLock};

use gangway_core::{FilterOutcome, PeerFilter, PeerSnapshot};
use tracing::debug;

use crate::engine::{DisconnectReason, PeerHandle, WireEvent};

/// Copy the peer's identity and statistics out of the engine.
///
/// Pure copy-out at the moment of the call: no side effects, no
/// blocking, and nothing in the returned value refers back to
/// engine-owned memory.
#[must_use]
pub fn capture_snapshot(peer: &dyn PeerHandle) -> PeerSnapshot {
    PeerSnapshot {
        peer_id: peer.peer_id(),
        client: peer.client(),
        endpoint: peer.endpoint(),
        progress: peer.progress(),
        total_download: peer.total_download(),
        total_upload: peer.total_upload(),
        flags: peer.flags(),
    }
}

type SharedPredicate = Arc<RwLock<Option<Arc<dyn PeerFilter>>>>;

/// Creates per-torrent filters and owns the replaceable predicate slot.
///
/// The predicate is read at evaluation time, so replacing or clearing
/// it takes effect on existing connections as well as new ones. With no
/// predicate installed every evaluation passes without being invoked.
#[derive(Default)]
pub struct PeerFilterFactory {
    predicate: SharedPredicate,
}

impl PeerFilterFactory {
    /// Create a factory with no predicate installed.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the active predicate, or clear it with `None`.
    pub fn set_predicate(&self, predicate: Option<Arc<dyn PeerFilter>>) {
        *self.predicate.write().expect("peer filter lock poisoned") = predicate;
    }

    /// Per-torrent attachment point, called once per torrent with its
    /// private flag. Private torrents get no filtering at all: no
    /// session is created for any of their connections.
    #[must_use]
    pub fn attach(&self, private: bool) -> Option<TorrentPeerFilter> {
        if private {
            debug!("peer filtering disabled for private torrent");
            return None;
        }
        Some(TorrentPeerFilter {
            predicate: Arc::clone(&self.predicate),
        })
    }
}

/// Per-torrent filter handle; hands out one session per connection.
pub struct TorrentPeerFilter {
    predicate: SharedPredicate,
}

impl TorrentPeerFilter {
    /// Create the filtering state machine for a new peer connection.
    #[must_use]
    pub fn new_connection(&self) -> PeerFilterSession {
        PeerFilterSession {
            predicate: Arc::clone(&self.predicate),
            state: FilterState::Active {
                skip_non_handshake: false,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FilterState {
    Active { skip_non_handshake: bool },
    Decided,
}

/// Per-connection filtering state machine.
///
/// Lives exactly as long as the underlying connection and is driven
/// inline from the engine's wire-protocol callbacks, so evaluation must
/// never block, sleep or perform IO. After a positive match the session
/// is `Decided`: the disconnect command has been issued once and every
/// further callback is ignored.
pub struct PeerFilterSession {
    predicate: SharedPredicate,
    state: FilterState,
}

impl PeerFilterSession {
    /// Feed one wire-protocol callback for this connection.
    ///
    /// Handshake-class events are always evaluated. Non-handshake
    /// events are evaluated unless an earlier outcome requested
    /// `stop_further_checks`; a later handshake-class evaluation is
    /// authoritative and reassigns that short-circuit from its own
    /// outcome.
    pub fn on_wire_event(&mut self, peer: &dyn PeerHandle, event: WireEvent) {
        let FilterState::Active { skip_non_handshake } = self.state else {
            return;
        };
        let handshake_class = event.is_handshake_class();
        if skip_non_handshake && !handshake_class {
            return;
        }

        let Some(predicate) = self.current_predicate() else {
            return;
        };
        let snapshot = capture_snapshot(peer);
        let outcome = predicate.evaluate(&snapshot, handshake_class);

        if outcome.matched {
            peer.disconnect(DisconnectReason::FilterMatched);
            self.state = FilterState::Decided;
            debug!(
                endpoint = %snapshot.endpoint,
                client = %snapshot.client,
                "peer matched filter, disconnect issued"
            );
        } else if handshake_class {
            self.state = FilterState::Active {
                skip_non_handshake: outcome.stop_further_checks,
            };
        } else if outcome.stop_further_checks {
            self.state = FilterState::Active {
                skip_non_handshake: true,
            };
        }
    }

    /// Whether a positive match has already been recorded.
    #[must_use]
    pub const fn is_decided(&self) -> bool {
        matches!(self.state, FilterState::Decided)
    }

    fn current_predicate(&self) -> Option<Arc<dyn PeerFilter>> {
        self.predicate
            .read()
            .expect("peer filter lock poisoned")
            .clone()
    }
}

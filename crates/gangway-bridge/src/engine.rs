//! Engine-facing boundary consumed by the bridge.
//!
//! The BitTorrent engine itself is an external collaborator. These
//! traits describe the narrow surface the bridge relies on: an alert
//! queue with an atomic drain, a per-connection peer-info/disconnect
//! handle, and a handful of session commands. The engine calls into the
//! bridge through [`crate::filter::PeerFilterFactory`] and the
//! [`crate::dispatch::AlertNotify`] wake signal it receives at setup.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Result;
use gangway_core::{PeerFlags, PeerId};

use crate::alert::Alert;
use crate::dispatch::AlertNotify;
use crate::settings::SessionSettings;

/// Handle to a live engine session.
///
/// The bridge only queries and commands the session; it never mutates
/// engine state directly and owns no engine threads.
pub trait EngineSession: Send + Sync {
    /// Atomically drain every currently pending alert, in production
    /// order. A single call empties the queue; the bridge never polls
    /// alert-by-alert.
    ///
    /// # Errors
    ///
    /// Returns an error when the engine cannot service the drain. The
    /// bridge treats this as best-effort: it logs and retries on the
    /// next natural call, never automatically.
    fn drain_alerts(&self) -> Result<Vec<Alert>>;

    /// Park the calling thread until alerts are pending or `timeout`
    /// elapses. Returns whether alerts are pending; a timeout return
    /// has no side effects.
    fn wait_for_alert(&self, timeout: Duration) -> bool;

    /// Register the payload-free wake signal. The engine may call
    /// [`AlertNotify::wake`] from any internal thread whenever alerts
    /// become pending; it must never invoke host callbacks itself.
    fn set_alert_notify(&self, notify: AlertNotify);

    /// Apply session-wide settings.
    ///
    /// # Errors
    ///
    /// Returns an error when the engine rejects the settings.
    fn apply_settings(&self, settings: &SessionSettings) -> Result<()>;

    /// Ask the engine to enqueue a session-stats alert.
    ///
    /// # Errors
    ///
    /// Returns an error when the command cannot be issued.
    fn post_session_stats(&self) -> Result<()>;
}

/// Reference to one live peer connection inside the engine.
///
/// Accessors copy individual fields out of the connection at call time;
/// [`crate::filter::capture_snapshot`] assembles them into an owned
/// [`gangway_core::PeerSnapshot`].
pub trait PeerHandle {
    /// Handshake peer identifier.
    fn peer_id(&self) -> PeerId;
    /// Client software string advertised by the peer.
    fn client(&self) -> String;
    /// Remote address and port of the connection.
    fn endpoint(&self) -> SocketAddr;
    /// Peer's download progress ratio in `0.0..=1.0`.
    fn progress(&self) -> f32;
    /// Cumulative bytes received from the peer.
    fn total_download(&self) -> u64;
    /// Cumulative bytes sent to the peer.
    fn total_upload(&self) -> u64;
    /// Connection flags reported by the engine.
    fn flags(&self) -> PeerFlags;

    /// Ask the engine to drop the connection. Fire-and-forget: a
    /// failing disconnect is the engine's concern and is not retried.
    fn disconnect(&self, reason: DisconnectReason);
}

/// Reason code attached to an engine disconnect command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectReason {
    /// The peer matched the active filter policy.
    FilterMatched,
}

impl DisconnectReason {
    /// Numeric code handed to the engine.
    #[must_use]
    pub const fn as_code(self) -> u32 {
        match self {
            Self::FilterMatched => 1,
        }
    }
}

/// Wire-protocol callbacks the engine reports for one connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireEvent {
    /// BitTorrent handshake completed.
    Handshake,
    /// Extension-protocol handshake completed.
    ExtensionHandshake,
    /// The peer announced interest.
    Interested,
    /// The peer withdrew interest.
    NotInterested,
    /// The peer announced it has a piece.
    Have {
        /// Piece the peer announced.
        piece: u32,
    },
    /// The peer announced it no longer offers a piece.
    DontHave {
        /// Piece the peer withdrew.
        piece: u32,
    },
    /// The peer sent its full piece bitfield.
    Bitfield,
    /// The peer claims every piece.
    HaveAll,
    /// The peer claims no pieces.
    HaveNone,
    /// The peer requested a block.
    Request {
        /// Piece the request targets.
        piece: u32,
    },
}

impl WireEvent {
    /// Handshake-class events are authoritative re-evaluation points
    /// for filtering: they bypass any requested short-circuit.
    #[must_use]
    pub const fn is_handshake_class(self) -> bool {
        matches!(self, Self::Handshake | Self::ExtensionHandshake)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_handshakes_are_handshake_class() {
        assert!(WireEvent::Handshake.is_handshake_class());
        assert!(WireEvent::ExtensionHandshake.is_handshake_class());

        let rest = [
            WireEvent::Interested,
            WireEvent::NotInterested,
            WireEvent::Have { piece: 3 },
            WireEvent::DontHave { piece: 3 },
            WireEvent::Bitfield,
            WireEvent::HaveAll,
            WireEvent::HaveNone,
            WireEvent::Request { piece: 3 },
        ];
        for event in rest {
            assert!(!event.is_handshake_class(), "{event:?}");
        }
    }

    #[test]
    fn disconnect_reason_maps_to_code() {
        assert_eq!(DisconnectReason::FilterMatched.as_code(), 1);
    }
}

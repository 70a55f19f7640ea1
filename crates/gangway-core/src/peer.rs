//! Peer identity and filtering primitives.

use std::fmt::{self, Debug, Formatter};
use std::net::SocketAddr;
use std::ops::BitOr;

use serde::{Deserialize, Serialize};

/// 20-byte peer identifier exchanged in the BitTorrent handshake.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PeerId(pub [u8; 20]);

impl PeerId {
    /// Raw identifier bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Leading eight bytes, which Azureus-style clients use as a
    /// `-XX1234-` software/version prefix.
    #[must_use]
    pub fn client_prefix(&self) -> &[u8] {
        &self.0[..8]
    }
}

impl Debug for PeerId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str("PeerId(")?;
        for byte in &self.0 {
            write!(formatter, "{byte:02x}")?;
        }
        formatter.write_str(")")
    }
}

/// Connection flags reported for a peer, as a compact bitmask.
///
/// Flag assignments mirror what the engine reports per connection; the
/// filter treats the mask as opaque beyond membership tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PeerFlags(u32);

impl PeerFlags {
    /// We are interested in the peer.
    pub const INTERESTING: Self = Self(1);
    /// We have choked the peer.
    pub const CHOKED: Self = Self(1 << 1);
    /// The peer is interested in us.
    pub const REMOTE_INTERESTED: Self = Self(1 << 2);
    /// The peer has choked us.
    pub const REMOTE_CHOKED: Self = Self(1 << 3);
    /// The peer supports the extension protocol.
    pub const SUPPORTS_EXTENSIONS: Self = Self(1 << 4);
    /// We initiated the connection.
    pub const OUTGOING_CONNECTION: Self = Self(1 << 5);
    /// The connection is encrypted.
    pub const ENCRYPTED: Self = Self(1 << 6);
    /// The peer already has every piece.
    pub const SEED: Self = Self(1 << 7);
    /// The connection runs over uTP rather than TCP.
    pub const UTP_SOCKET: Self = Self(1 << 8);

    /// Mask with no flags set.
    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Reconstruct a mask from its raw bits.
    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Raw bit representation.
    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Whether every flag in `other` is set in `self`.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for PeerFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Immutable point-in-time description of one peer connection.
///
/// Captured fresh for every filter evaluation; holds no reference into
/// engine-owned state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeerSnapshot {
    /// Handshake peer identifier.
    pub peer_id: PeerId,
    /// Client software string advertised by the peer.
    pub client: String,
    /// Remote address and port of the connection.
    pub endpoint: SocketAddr,
    /// Peer's download progress ratio in `0.0..=1.0`.
    pub progress: f32,
    /// Cumulative bytes received from the peer.
    pub total_download: u64,
    /// Cumulative bytes sent to the peer.
    pub total_upload: u64,
    /// Connection flags reported by the engine.
    pub flags: PeerFlags,
}

/// Verdict returned by a filter evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FilterOutcome {
    /// The peer matched the filter and should be disconnected.
    pub matched: bool,
    /// Skip further evaluations on this connection, except at
    /// handshake-class events.
    pub stop_further_checks: bool,
}

impl FilterOutcome {
    /// Keep the peer; evaluate again on the next event.
    pub const PASS: Self = Self {
        matched: false,
        stop_further_checks: false,
    };
    /// Keep the peer; only re-evaluate at handshake-class events.
    pub const PASS_AND_STOP: Self = Self {
        matched: false,
        stop_further_checks: true,
    };
    /// Drop the peer.
    pub const MATCHED: Self = Self {
        matched: true,
        stop_further_checks: false,
    };
}

/// Full filtering contract: the decision sees the snapshot plus the
/// class of the triggering wire event.
///
/// Evaluations run inline on the engine's networking thread and must
/// not block, sleep or perform IO.
pub trait PeerFilter: Send + Sync {
    /// Decide whether the peer should be kept or dropped.
    ///
    /// `handshake_class` is `true` for handshake and extension-handshake
    /// events, which are always evaluated regardless of any previously
    /// requested short-circuit.
    fn evaluate(&self, peer: &PeerSnapshot, handshake_class: bool) -> FilterOutcome;
}

/// Simplified host-facing predicate: return `true` to drop the peer.
pub trait FilterPredicate: Send + Sync {
    /// Whether the peer should be disconnected.
    fn on_filter(&self, peer: &PeerSnapshot) -> bool;
}

impl<P: FilterPredicate> PeerFilter for P {
    fn evaluate(&self, peer: &PeerSnapshot, _handshake_class: bool) -> FilterOutcome {
        if self.on_filter(peer) {
            FilterOutcome::MATCHED
        } else {
            FilterOutcome::PASS
        }
    }
}

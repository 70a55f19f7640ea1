#![deny(unsafe_code)]
#![warn(missing_docs, clippy::all, rustdoc::broken_intra_doc_links)]

//! Host-facing types for the gangway engine bridge.
//!
//! This crate defines the typed surface a host application consumes:
//! the [`Event`] enum and [`Listener`] trait for alert delivery, the
//! peer identity/filtering primitives ([`PeerSnapshot`], [`PeerFilter`],
//! [`FilterPredicate`]), and the torrent-level value types both sides of
//! the bridge exchange. The engine-facing adapter lives in
//! `gangway-bridge`; nothing in this crate touches the engine directly.

/// Error types for host-facing bridge operations.
pub mod error;
/// Typed events and the host listener contract.
pub mod event;
/// Torrent-level value types shared across the bridge.
pub mod model;
/// Peer identity and filtering primitives.
pub mod peer;

pub use error::{BridgeError, BridgeResult};
pub use event::{Event, Listener};
pub use model::{HandleId, ResumeData, SessionStats, TorrentState, TorrentStats, TorrentStatus};
pub use peer::{FilterOutcome, FilterPredicate, PeerFilter, PeerFlags, PeerId, PeerSnapshot};

#![deny(unsafe_code)]
#![warn(missing_docs, clippy::all, rustdoc::broken_intra_doc_links)]

//! Bridge between an external BitTorrent engine and a managed host.
//!
//! Two subsystems make up the crate:
//!
//! - **Alert dispatch**: the engine signals "alerts pending" through a
//!   payload-free [`AlertNotify`]; the host later drains the whole
//!   batch with [`EngineBridge::process_events`] on a thread it
//!   nominates, and each alert is classified into a typed
//!   [`gangway_core::Event`] delivered under the listener exclusion
//!   lock, in production order.
//! - **Peer wire filtering**: per connection, a [`PeerFilterSession`]
//!   observes handshake and post-handshake wire messages, evaluates the
//!   registered policy against a fresh peer snapshot, and issues at
//!   most one disconnect command. Private torrents are exempt.
//!
//! The engine itself stays behind the [`EngineSession`] and
//! [`PeerHandle`] traits; [`stub`] provides in-memory doubles for
//! testing hosts without a real engine.

pub mod alert;
pub mod classify;
pub mod dispatch;
pub mod engine;
pub mod filter;
pub mod settings;
pub mod stub;

pub use alert::Alert;
pub use classify::classify;
pub use dispatch::{AlertDispatcher, AlertNotify, ListenerSlot};
pub use engine::{DisconnectReason, EngineSession, PeerHandle, WireEvent};
pub use filter::{
    PeerFilterFactory, PeerFilterSession, TorrentPeerFilter, capture_snapshot,
};
pub use settings::SessionSettings;

use std::sync::Arc;
use std::time::Duration;

use gangway_core::{BridgeError, BridgeResult, Listener, PeerFilter};
use tracing::info;

/// Facade tying the dispatcher, listener slot and peer filter to one
/// engine session.
///
/// The bridge owns no threads: `process_events` runs on whichever
/// thread the host calls it from, and filter evaluations run inline on
/// the engine's networking thread.
pub struct EngineBridge {
    session: Arc<dyn EngineSession>,
    slot: ListenerSlot,
    dispatcher: AlertDispatcher,
    notify: AlertNotify,
    filter: Arc<PeerFilterFactory>,
}

impl EngineBridge {
    /// Wrap a live engine session, registering the wake signal with it.
    #[must_use]
    pub fn new(session: Arc<dyn EngineSession>) -> Self {
        let notify = AlertNotify::new();
        session.set_alert_notify(notify.clone());
        let dispatcher = AlertDispatcher::new(&session);
        info!("engine bridge initialized");
        Self {
            session,
            slot: ListenerSlot::new(),
            dispatcher,
            notify,
            filter: Arc::new(PeerFilterFactory::new()),
        }
    }

    /// Wrap a session and apply `settings` before anything else runs.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::SettingsRejected`] when the engine
    /// refuses the settings.
    pub fn with_settings(
        session: Arc<dyn EngineSession>,
        settings: &SessionSettings,
    ) -> BridgeResult<Self> {
        let bridge = Self::new(session);
        bridge.apply_settings(settings)?;
        Ok(bridge)
    }

    /// Install or replace the host listener.
    pub fn set_listener(&self, listener: Box<dyn Listener>) {
        self.slot.install(listener);
    }

    /// Remove the host listener, serializing with in-flight delivery.
    pub fn clear_listener(&self) {
        self.slot.clear();
    }

    /// The listener slot, for hosts that drive a [`AlertDispatcher`]
    /// themselves.
    #[must_use]
    pub const fn listener_slot(&self) -> &ListenerSlot {
        &self.slot
    }

    /// Drain pending alerts and deliver them to the installed listener.
    /// Returns the number of events delivered.
    ///
    /// Call this from a thread the host trusts with callbacks, never
    /// from inside a listener handler. Typical shape:
    ///
    /// ```no_run
    /// # async fn drive(bridge: gangway_bridge::EngineBridge) {
    /// let notify = bridge.notify();
    /// loop {
    ///     notify.notified().await;
    ///     bridge.process_events();
    /// }
    /// # }
    /// ```
    pub fn process_events(&self) -> usize {
        self.dispatcher.process_events(&self.slot)
    }

    /// A dispatcher bound to this bridge's engine session.
    #[must_use]
    pub fn dispatcher(&self) -> AlertDispatcher {
        self.dispatcher.clone()
    }

    /// The wake signal the engine fires when alerts become pending.
    #[must_use]
    pub fn notify(&self) -> AlertNotify {
        self.notify.clone()
    }

    /// Park the calling thread until alerts are pending or `timeout`
    /// elapses. Returns whether alerts are pending.
    #[must_use]
    pub fn wait_for_alert(&self, timeout: Duration) -> bool {
        self.session.wait_for_alert(timeout)
    }

    /// Register the peer filter policy, replacing any previous one.
    /// Takes effect on existing connections as well as new ones.
    pub fn set_peer_filter(&self, predicate: Arc<dyn PeerFilter>) {
        self.filter.set_predicate(Some(predicate));
    }

    /// Remove the peer filter policy; connections pass unfiltered.
    pub fn clear_peer_filter(&self) {
        self.filter.set_predicate(None);
    }

    /// The factory the engine consults once per torrent to set up
    /// connection filtering.
    #[must_use]
    pub fn peer_filter(&self) -> Arc<PeerFilterFactory> {
        Arc::clone(&self.filter)
    }

    /// Apply session-wide settings to the engine.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::SettingsRejected`] when the engine
    /// refuses the settings.
    pub fn apply_settings(&self, settings: &SessionSettings) -> BridgeResult<()> {
        self.session
            .apply_settings(settings)
            .map_err(|err| BridgeError::SettingsRejected { source: err.into() })
    }

    /// Ask the engine to enqueue a session-stats alert, which arrives
    /// through the regular dispatch path as
    /// [`gangway_core::Event::SessionStats`].
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::CommandFailed`] when the command cannot
    /// be issued.
    pub fn request_session_stats(&self) -> BridgeResult<()> {
        self.session
            .post_session_stats()
            .map_err(|err| BridgeError::CommandFailed {
                operation: "post_session_stats",
                source: err.into(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stub::StubEngine;
    use gangway_core::{HandleId, SessionStats};
    use std::sync::Mutex;

    #[derive(Default)]
    struct CollectingListener {
        log: Arc<Mutex<Vec<String>>>,
    }

    impl Listener for CollectingListener {
        fn on_torrent_added(&mut self, handle: HandleId) {
            self.log
                .lock()
                .expect("log poisoned")
                .push(format!("added:{handle}"));
        }

        fn on_piece_finished(&mut self, handle: HandleId, piece: u32) {
            self.log
                .lock()
                .expect("log poisoned")
                .push(format!("piece:{handle}:{piece}"));
        }

        fn on_metadata_received(&mut self, handle: HandleId) {
            self.log
                .lock()
                .expect("log poisoned")
                .push(format!("metadata:{handle}"));
        }

        fn on_session_stats(&mut self, _stats: SessionStats) {
            self.log
                .lock()
                .expect("log poisoned")
                .push("session_stats".to_string());
        }
    }

    fn bridge_with_listener() -> (Arc<StubEngine>, EngineBridge, Arc<Mutex<Vec<String>>>) {
        let engine = Arc::new(StubEngine::new());
        let bridge = EngineBridge::new(engine.clone());
        let log = Arc::new(Mutex::new(Vec::new()));
        bridge.set_listener(Box::new(CollectingListener { log: log.clone() }));
        (engine, bridge, log)
    }

    #[test]
    fn events_reach_the_listener_in_alert_order() {
        let (engine, bridge, log) = bridge_with_listener();

        engine.push_alert(Alert::TorrentAdded { handle: 1 });
        engine.push_alert(Alert::PieceFinished {
            handle: 1,
            piece: 5,
        });
        engine.push_alert(Alert::MetadataReceived { handle: 1 });

        assert_eq!(bridge.process_events(), 3);
        assert_eq!(
            *log.lock().expect("log poisoned"),
            vec!["added:1", "piece:1:5", "metadata:1"]
        );
    }

    #[test]
    fn cleared_listener_receives_nothing() {
        let (engine, bridge, log) = bridge_with_listener();

        bridge.clear_listener();
        engine.push_alert(Alert::TorrentAdded { handle: 1 });

        assert_eq!(bridge.process_events(), 0);
        assert!(log.lock().expect("log poisoned").is_empty());
    }

    #[test]
    fn settings_are_applied_at_construction() {
        let engine = Arc::new(StubEngine::new());
        let settings = SessionSettings {
            user_agent: "host/2.0".to_string(),
            ..SessionSettings::default()
        };

        let _bridge = EngineBridge::with_settings(engine.clone(), &settings)
            .expect("settings application");

        let applied = engine.applied_settings().expect("settings recorded");
        assert_eq!(applied.user_agent, "host/2.0");
        assert_eq!(applied, settings);
    }

    #[test]
    fn rejected_settings_surface_as_bridge_error() {
        let engine = Arc::new(StubEngine::new());
        engine.reject_next_settings();

        let err = EngineBridge::with_settings(engine, &SessionSettings::default())
            .err()
            .expect("settings rejection");
        assert!(matches!(err, BridgeError::SettingsRejected { .. }));
    }

    #[test]
    fn session_stats_request_round_trips_through_dispatch() {
        let (engine, bridge, log) = bridge_with_listener();

        bridge
            .request_session_stats()
            .expect("stats request accepted");
        assert_eq!(engine.stats_requests(), 1);

        assert_eq!(bridge.process_events(), 1);
        assert_eq!(*log.lock().expect("log poisoned"), vec!["session_stats"]);
    }

    #[test]
    fn wait_for_alert_reports_pending_alerts() {
        let (engine, bridge, _log) = bridge_with_listener();

        assert!(!bridge.wait_for_alert(Duration::from_millis(5)));
        engine.push_alert(Alert::TorrentAdded { handle: 1 });
        assert!(bridge.wait_for_alert(Duration::from_millis(5)));
    }
}

//! Batch dispatch of engine alerts to the host listener.
//!
//! Delivery is split in two phases. The engine fires [`AlertNotify`]
//! from whichever internal thread produced an alert; the signal carries
//! no payload and runs no host code. The host then calls
//! [`AlertDispatcher::process_events`] from a thread it nominates,
//! which drains the whole pending batch in one call and delivers the
//! resulting events under the listener exclusion lock. Host callbacks
//! therefore never run on an engine-internal thread.

use std::sync::{Arc, Mutex, MutexGuard, Weak};

use gangway_core::{Event, Listener};
use tokio::sync::Notify;
use tracing::{debug, warn};

use crate::classify::classify;
use crate::engine::EngineSession;

/// Payload-free wake signal shared between the engine and the host.
///
/// The engine calls [`wake`](Self::wake) from any internal thread when
/// alerts become pending; the host awaits
/// [`notified`](Self::notified) and schedules a `process_events` call
/// on a thread of its own choosing. Wakes coalesce: many `wake` calls
/// before the host gets around to draining resolve to a single permit.
#[derive(Clone, Default)]
pub struct AlertNotify {
    inner: Arc<Notify>,
}

impl AlertNotify {
    /// Create an unsignalled wake handle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal that alerts are pending. Never invokes listener handlers.
    pub fn wake(&self) {
        self.inner.notify_one();
    }

    /// Wait until the next wake signal. Returns immediately when a
    /// wake fired since the last wait.
    pub async fn notified(&self) {
        self.inner.notified().await;
    }
}

/// Synchronization wrapper owning the listener exclusion lock.
///
/// The same lock serializes delivery, replacement and removal: once
/// [`clear`](Self::clear) returns, no handler of the removed listener
/// is running or will run. The lock is not reentrant; handlers must not
/// call back into dispatch.
#[derive(Default)]
pub struct ListenerSlot {
    inner: Mutex<Option<Box<dyn Listener>>>,
}

impl ListenerSlot {
    /// Create an empty slot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install or replace the listener, serializing with any in-flight
    /// delivery.
    pub fn install(&self, listener: Box<dyn Listener>) {
        *self.lock() = Some(listener);
    }

    /// Remove the listener. Blocks until an in-flight delivery batch
    /// finishes.
    pub fn clear(&self) {
        *self.lock() = None;
    }

    /// Whether a listener is currently installed.
    #[must_use]
    pub fn is_installed(&self) -> bool {
        self.lock().is_some()
    }

    fn lock(&self) -> MutexGuard<'_, Option<Box<dyn Listener>>> {
        self.inner.lock().expect("listener slot mutex poisoned")
    }
}

/// Drains the engine's pending alerts and delivers typed events.
///
/// Holds only a weak reference to the engine session, so a dispatcher
/// outliving its bridge degrades to a no-op instead of keeping the
/// session alive.
#[derive(Clone)]
pub struct AlertDispatcher {
    session: Weak<dyn EngineSession>,
}

impl AlertDispatcher {
    /// Bind a dispatcher to an engine session.
    #[must_use]
    pub fn new(session: &Arc<dyn EngineSession>) -> Self {
        Self {
            session: Arc::downgrade(session),
        }
    }

    /// Drain the full pending batch and deliver it to the listener in
    /// `slot`, in alert production order. Returns the number of events
    /// delivered.
    ///
    /// No-op when the session is gone or no listener is installed.
    /// Alerts drained after the listener was cleared are discarded.
    /// Concurrent calls on the same slot serialize on its lock; callers
    /// must not invoke this from inside a listener handler.
    pub fn process_events(&self, slot: &ListenerSlot) -> usize {
        let Some(session) = self.session.upgrade() else {
            debug!("alert dispatch skipped: engine session gone");
            return 0;
        };
        if !slot.is_installed() {
            return 0;
        }

        let alerts = match session.drain_alerts() {
            Ok(alerts) => alerts,
            Err(err) => {
                warn!(error = %err, "alert drain failed");
                return 0;
            }
        };
        if alerts.is_empty() {
            return 0;
        }

        let mut guard = slot.lock();
        let Some(listener) = guard.as_mut() else {
            return 0;
        };

        let mut delivered = 0;
        for alert in alerts {
            for event in classify(alert) {
                deliver(listener.as_mut(), event);
                delivered += 1;
            }
        }
        delivered
    }
}

fn deliver(listener: &mut dyn Listener, event: Event) {
    match event {
        Event::TorrentAdded { handle } => listener.on_torrent_added(handle),
        Event::MetadataReceived { handle } => listener.on_metadata_received(handle),
        Event::Checked { handle } => listener.on_checked(handle),
        Event::SaveResumeData { handle, payload } => {
            listener.on_save_resume_data(handle, &payload);
        }
        Event::TorrentStateChanged { handle, state } => {
            listener.on_torrent_state_changed(handle, state);
        }
        Event::BlockDownloading {
            handle,
            piece,
            block,
        } => listener.on_block_downloading(handle, piece, block),
        Event::PieceFinished { handle, piece } => listener.on_piece_finished(handle, piece),
        Event::StatusUpdate { handle, stats } => listener.on_status_update(handle, stats),
        Event::FileCompleted { handle, file } => listener.on_file_completed(handle, file),
        Event::TorrentRemoved { handle, name } => listener.on_torrent_removed(handle, &name),
        Event::SessionStats { stats } => listener.on_session_stats(stats),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alert::Alert;
    use crate::stub::StubEngine;
    use gangway_core::{HandleId, TorrentStats, TorrentStatus};
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;

    #[derive(Default)]
    struct Journal {
        calls: Mutex<Vec<String>>,
    }

    impl Journal {
        fn record(&self, entry: String) {
            self.calls.lock().expect("journal poisoned").push(entry);
        }

        fn entries(&self) -> Vec<String> {
            self.calls.lock().expect("journal poisoned").clone()
        }
    }

    struct RecordingListener {
        journal: Arc<Journal>,
    }

    impl Listener for RecordingListener {
        fn on_torrent_added(&mut self, handle: HandleId) {
            self.journal.record(format!("added:{handle}"));
        }

        fn on_metadata_received(&mut self, handle: HandleId) {
            self.journal.record(format!("metadata:{handle}"));
        }

        fn on_piece_finished(&mut self, handle: HandleId, piece: u32) {
            self.journal.record(format!("piece:{handle}:{piece}"));
        }

        fn on_status_update(&mut self, handle: HandleId, stats: TorrentStats) {
            self.journal
                .record(format!("status:{handle}:{}", stats.downloaded_bytes));
        }
    }

    fn engine_with_dispatcher() -> (Arc<StubEngine>, AlertDispatcher) {
        let engine = Arc::new(StubEngine::new());
        let session: Arc<dyn EngineSession> = engine.clone();
        let dispatcher = AlertDispatcher::new(&session);
        (engine, dispatcher)
    }

    #[test]
    fn batch_is_delivered_in_production_order() {
        let (engine, dispatcher) = engine_with_dispatcher();
        let slot = ListenerSlot::new();
        let journal = Arc::new(Journal::default());
        slot.install(Box::new(RecordingListener {
            journal: journal.clone(),
        }));

        engine.push_alert(Alert::TorrentAdded { handle: 1 });
        engine.push_alert(Alert::PieceFinished {
            handle: 1,
            piece: 5,
        });
        engine.push_alert(Alert::MetadataReceived { handle: 1 });

        assert_eq!(dispatcher.process_events(&slot), 3);
        assert_eq!(journal.entries(), vec!["added:1", "piece:1:5", "metadata:1"]);

        // The queue was drained in one call; nothing is left behind.
        assert_eq!(dispatcher.process_events(&slot), 0);
        assert_eq!(engine.drain_count(), 1);
    }

    #[test]
    fn unclassifiable_alerts_are_dropped_without_breaking_order() {
        let (engine, dispatcher) = engine_with_dispatcher();
        let slot = ListenerSlot::new();
        let journal = Arc::new(Journal::default());
        slot.install(Box::new(RecordingListener {
            journal: journal.clone(),
        }));

        engine.push_alert(Alert::TorrentAdded { handle: 2 });
        engine.push_alert(Alert::PeerConnected { handle: 2 });
        engine.push_alert(Alert::LogMessage {
            message: "noise".to_string(),
        });
        engine.push_alert(Alert::MetadataReceived { handle: 2 });

        assert_eq!(dispatcher.process_events(&slot), 2);
        assert_eq!(journal.entries(), vec!["added:2", "metadata:2"]);
    }

    #[test]
    fn state_update_expands_in_sub_order() {
        let (engine, dispatcher) = engine_with_dispatcher();
        let slot = ListenerSlot::new();
        let journal = Arc::new(Journal::default());
        slot.install(Box::new(RecordingListener {
            journal: journal.clone(),
        }));

        engine.push_alert(Alert::StateUpdate {
            statuses: vec![
                TorrentStatus {
                    handle: 7,
                    stats: TorrentStats {
                        downloaded_bytes: 10,
                        ..TorrentStats::default()
                    },
                },
                TorrentStatus {
                    handle: 8,
                    stats: TorrentStats {
                        downloaded_bytes: 20,
                        ..TorrentStats::default()
                    },
                },
                TorrentStatus {
                    handle: 9,
                    stats: TorrentStats {
                        downloaded_bytes: 30,
                        ..TorrentStats::default()
                    },
                },
            ],
        });

        assert_eq!(dispatcher.process_events(&slot), 3);
        assert_eq!(
            journal.entries(),
            vec!["status:7:10", "status:8:20", "status:9:30"]
        );
    }

    #[test]
    fn missing_listener_is_a_no_op() {
        let (engine, dispatcher) = engine_with_dispatcher();
        let slot = ListenerSlot::new();

        engine.push_alert(Alert::TorrentAdded { handle: 1 });

        assert_eq!(dispatcher.process_events(&slot), 0);
        // Nothing was drained either: the pending alert survives until a
        // listener shows up.
        assert_eq!(engine.drain_count(), 0);

        let journal = Arc::new(Journal::default());
        slot.install(Box::new(RecordingListener {
            journal: journal.clone(),
        }));
        assert_eq!(dispatcher.process_events(&slot), 1);
        assert_eq!(journal.entries(), vec!["added:1"]);
    }

    #[test]
    fn dead_session_is_a_no_op() {
        let (engine, dispatcher) = engine_with_dispatcher();
        let slot = ListenerSlot::new();
        slot.install(Box::new(RecordingListener {
            journal: Arc::new(Journal::default()),
        }));

        drop(engine);
        assert_eq!(dispatcher.process_events(&slot), 0);
    }

    #[test]
    fn drain_failure_logs_and_recovers_on_next_call() {
        let (engine, dispatcher) = engine_with_dispatcher();
        let slot = ListenerSlot::new();
        let journal = Arc::new(Journal::default());
        slot.install(Box::new(RecordingListener {
            journal: journal.clone(),
        }));

        engine.push_alert(Alert::TorrentAdded { handle: 4 });
        engine.fail_next_drain();

        assert_eq!(dispatcher.process_events(&slot), 0);
        assert!(journal.entries().is_empty());

        assert_eq!(dispatcher.process_events(&slot), 1);
        assert_eq!(journal.entries(), vec!["added:4"]);
    }

    struct OverlapProbe {
        busy: Arc<AtomicBool>,
        overlaps: Arc<AtomicUsize>,
        delivered: Arc<AtomicUsize>,
    }

    impl Listener for OverlapProbe {
        fn on_torrent_added(&mut self, _handle: HandleId) {
            if self.busy.swap(true, Ordering::SeqCst) {
                self.overlaps.fetch_add(1, Ordering::SeqCst);
            }
            std::thread::sleep(Duration::from_millis(1));
            self.busy.store(false, Ordering::SeqCst);
            self.delivered.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn concurrent_process_events_serialize_on_the_slot_lock() {
        let (engine, dispatcher) = engine_with_dispatcher();
        let slot = Arc::new(ListenerSlot::new());
        let overlaps = Arc::new(AtomicUsize::new(0));
        let delivered = Arc::new(AtomicUsize::new(0));
        slot.install(Box::new(OverlapProbe {
            busy: Arc::new(AtomicBool::new(false)),
            overlaps: overlaps.clone(),
            delivered: delivered.clone(),
        }));

        for handle in 0..32 {
            engine.push_alert(Alert::TorrentAdded { handle });
        }

        let threads: Vec<_> = (0..4)
            .map(|_| {
                let dispatcher = dispatcher.clone();
                let slot = slot.clone();
                std::thread::spawn(move || dispatcher.process_events(&slot))
            })
            .collect();
        let total: usize = threads
            .into_iter()
            .map(|thread| thread.join().expect("dispatch thread panicked"))
            .sum();

        assert_eq!(total, 32);
        assert_eq!(delivered.load(Ordering::SeqCst), 32);
        assert_eq!(overlaps.load(Ordering::SeqCst), 0, "handlers interleaved");
    }

    #[tokio::test]
    async fn wakes_coalesce_to_a_single_permit() {
        let notify = AlertNotify::new();
        notify.wake();
        notify.wake();
        notify.wake();

        // One pending permit resolves the first wait immediately.
        tokio::time::timeout(Duration::from_millis(50), notify.notified())
            .await
            .expect("first wait should resolve");

        // The permits coalesced, so a second wait must block.
        assert!(
            tokio::time::timeout(Duration::from_millis(20), notify.notified())
                .await
                .is_err(),
            "coalesced wakes should leave no extra permit"
        );
    }
}

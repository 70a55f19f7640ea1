//! In-memory test doubles for the engine boundary.
//!
//! [`StubEngine`] implements [`EngineSession`] over plain collections
//! and [`StubPeer`] implements [`PeerHandle`] while recording
//! disconnect commands. Both exist to exercise the bridge; neither
//! speaks any BitTorrent.

use std::collections::VecDeque;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Condvar, Mutex};
use std::time::Duration;

use anyhow::{Result, anyhow};
use gangway_core::{PeerFlags, PeerId, SessionStats};

use crate::alert::Alert;
use crate::dispatch::AlertNotify;
use crate::engine::{DisconnectReason, EngineSession, PeerHandle};
use crate::settings::SessionSettings;

/// In-memory engine double backing dispatcher and facade tests.
#[derive(Default)]
pub struct StubEngine {
    queue: Mutex<VecDeque<Alert>>,
    pending: Condvar,
    notify: Mutex<Option<AlertNotify>>,
    applied: Mutex<Option<SessionSettings>>,
    drains: AtomicUsize,
    fail_drain: AtomicBool,
    reject_settings: AtomicBool,
    stats_requests: AtomicUsize,
}

impl StubEngine {
    /// Create an engine double with an empty alert queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an alert and fire the wake signal, as the engine would
    /// from one of its internal threads.
    pub fn push_alert(&self, alert: Alert) {
        self.queue
            .lock()
            .expect("stub queue poisoned")
            .push_back(alert);
        self.pending.notify_all();
        if let Some(notify) = self.notify.lock().expect("stub notify poisoned").as_ref() {
            notify.wake();
        }
    }

    /// Number of drain calls serviced so far.
    #[must_use]
    pub fn drain_count(&self) -> usize {
        self.drains.load(Ordering::SeqCst)
    }

    /// Make the next drain call fail once.
    pub fn fail_next_drain(&self) {
        self.fail_drain.store(true, Ordering::SeqCst);
    }

    /// Make the next settings application fail once.
    pub fn reject_next_settings(&self) {
        self.reject_settings.store(true, Ordering::SeqCst);
    }

    /// Number of session-stats requests received.
    #[must_use]
    pub fn stats_requests(&self) -> usize {
        self.stats_requests.load(Ordering::SeqCst)
    }

    /// Settings most recently applied, if any.
    #[must_use]
    pub fn applied_settings(&self) -> Option<SessionSettings> {
        self.applied
            .lock()
            .expect("stub settings poisoned")
            .clone()
    }
}

impl EngineSession for StubEngine {
    fn drain_alerts(&self) -> Result<Vec<Alert>> {
        if self.fail_drain.swap(false, Ordering::SeqCst) {
            return Err(anyhow!("simulated drain failure"));
        }
        self.drains.fetch_add(1, Ordering::SeqCst);
        let mut queue = self.queue.lock().expect("stub queue poisoned");
        Ok(queue.drain(..).collect())
    }

    fn wait_for_alert(&self, timeout: Duration) -> bool {
        let queue = self.queue.lock().expect("stub queue poisoned");
        if !queue.is_empty() {
            return true;
        }
        let (queue, _timed_out) = self
            .pending
            .wait_timeout_while(queue, timeout, |pending| pending.is_empty())
            .expect("stub queue poisoned");
        !queue.is_empty()
    }

    fn set_alert_notify(&self, notify: AlertNotify) {
        *self.notify.lock().expect("stub notify poisoned") = Some(notify);
    }

    fn apply_settings(&self, settings: &SessionSettings) -> Result<()> {
        if self.reject_settings.swap(false, Ordering::SeqCst) {
            return Err(anyhow!("simulated settings rejection"));
        }
        *self.applied.lock().expect("stub settings poisoned") = Some(settings.clone());
        Ok(())
    }

    fn post_session_stats(&self) -> Result<()> {
        self.stats_requests.fetch_add(1, Ordering::SeqCst);
        self.push_alert(Alert::SessionStats {
            stats: SessionStats::default(),
        });
        Ok(())
    }
}

/// Peer-connection double recording disconnect commands.
pub struct StubPeer {
    peer_id: PeerId,
    client: String,
    endpoint: SocketAddr,
    progress: f32,
    total_download: u64,
    total_upload: u64,
    flags: PeerFlags,
    disconnects: AtomicUsize,
    last_reason: Mutex<Option<DisconnectReason>>,
}

impl StubPeer {
    /// Create a peer double advertising `client`.
    #[must_use]
    pub fn new(client: impl Into<String>) -> Self {
        Self {
            peer_id: PeerId(*b"-GW0100-stubpeer0000"),
            client: client.into(),
            endpoint: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 6881),
            progress: 0.0,
            total_download: 0,
            total_upload: 0,
            flags: PeerFlags::empty(),
            disconnects: AtomicUsize::new(0),
            last_reason: Mutex::new(None),
        }
    }

    /// Override the reported download progress.
    #[must_use]
    pub fn with_progress(mut self, progress: f32) -> Self {
        self.progress = progress;
        self
    }

    /// Override the reported connection flags.
    #[must_use]
    pub fn with_flags(mut self, flags: PeerFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Number of disconnect commands received.
    #[must_use]
    pub fn disconnect_count(&self) -> usize {
        self.disconnects.load(Ordering::SeqCst)
    }

    /// Reason attached to the most recent disconnect command.
    #[must_use]
    pub fn last_reason(&self) -> Option<DisconnectReason> {
        *self.last_reason.lock().expect("stub reason poisoned")
    }
}

impl PeerHandle for StubPeer {
    fn peer_id(&self) -> PeerId {
        self.peer_id
    }

    fn client(&self) -> String {
        self.client.clone()
    }

    fn endpoint(&self) -> SocketAddr {
        self.endpoint
    }

    fn progress(&self) -> f32 {
        self.progress
    }

    fn total_download(&self) -> u64 {
        self.total_download
    }

    fn total_upload(&self) -> u64 {
        self.total_upload
    }

    fn flags(&self) -> PeerFlags {
        self.flags
    }

    fn disconnect(&self, reason: DisconnectReason) {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
        *self.last_reason.lock().expect("stub reason poisoned") = Some(reason);
    }
}

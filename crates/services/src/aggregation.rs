//! Real-time progress aggregation for a coach's dashboard.
//!
//! One engine per open coach session. The engine subscribes to the roster
//! stream and the check-ins stream exactly once each, then folds every
//! emission into a fresh [`DashboardSnapshot`] published through a `watch`
//! channel: single writer (the worker task), many readers, always a fully
//! formed snapshot. Emissions are full replacements, so recomputation is
//! idempotent and indifferent to arrival order; `watch` semantics coalesce
//! bursts into the latest value instead of queueing them.

use std::sync::Arc;

use checkin_core::model::{CheckIn, ClientRosterEntry, CoachId, ProgressStats};
use chrono::{DateTime, Utc};
use storage::feed::{CheckInFeed, DEFAULT_WINDOW_SIZE};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::Clock;
use crate::error::AggregationError;
use crate::session::{AuthState, Role, Session};

/// How often a dead input stream is re-tried, and how many times.
const RESUBSCRIBE_DELAY_MS: u64 = 200;
const RESUBSCRIBE_ATTEMPTS: u32 = 5;

/// Where the dashboard session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashboardPhase {
    /// Subscriptions are being established; nothing meaningful yet.
    RosterLoading,
    /// The roster snapshot has arrived; stats not yet computed.
    RosterReady,
    /// Roster and check-ins are both known and stats are current.
    StatsReady,
    /// The session ended; no further updates will be published.
    Closed,
}

/// The atomically swapped dashboard view-model.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardSnapshot {
    pub phase: DashboardPhase,
    pub stats: ProgressStats,
    pub roster: Vec<ClientRosterEntry>,
    pub recent: Vec<CheckIn>,
    /// True while an input stream is interrupted and the numbers may lag.
    pub stale: bool,
    pub computed_at: DateTime<Utc>,
}

impl DashboardSnapshot {
    fn loading(now: DateTime<Utc>) -> Self {
        Self {
            phase: DashboardPhase::RosterLoading,
            stats: ProgressStats::default(),
            roster: Vec::new(),
            recent: Vec::new(),
            stale: false,
            computed_at: now,
        }
    }
}

/// Builder for per-session dashboard workers.
#[derive(Clone)]
pub struct AggregationEngine {
    clock: Clock,
    feed: Arc<CheckInFeed>,
    window: u32,
}

impl AggregationEngine {
    #[must_use]
    pub fn new(clock: Clock, feed: Arc<CheckInFeed>) -> Self {
        Self {
            clock,
            feed,
            window: DEFAULT_WINDOW_SIZE,
        }
    }

    /// Override the aggregation window size (most recent N check-ins).
    #[must_use]
    pub fn with_window(self, window: u32) -> Self {
        Self { window, ..self }
    }

    /// Open a dashboard for the currently signed-in coach.
    ///
    /// Subscribes both input streams once, spawns the worker, and returns a
    /// handle for reading snapshots and tearing the session down. Any later
    /// session transition on `auth` closes the worker; dropping the
    /// `AuthState` itself counts as a transition, so `auth` must outlive the
    /// dashboard.
    ///
    /// # Errors
    ///
    /// Returns `AggregationError::NotACoach` for client sessions,
    /// `SessionError::Unauthenticated` when signed out, and storage errors
    /// from the initial subscriptions.
    pub async fn start(&self, auth: &AuthState) -> Result<DashboardHandle, AggregationError> {
        let session = auth.current_session()?;
        let coach_id = match (&session.role, &session.coach_id) {
            (Role::Coach, Some(id)) => id.clone(),
            _ => return Err(AggregationError::NotACoach),
        };

        let roster_rx = self.feed.subscribe_roster(&coach_id).await?;
        let check_ins_rx = self
            .feed
            .subscribe_check_ins(&coach_id, self.window)
            .await?;
        let session_rx = auth.subscribe();

        let (out_tx, out_rx) = watch::channel(DashboardSnapshot::loading(self.clock.now()));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let worker = DashboardWorker {
            clock: self.clock,
            feed: Arc::clone(&self.feed),
            coach_id,
            window: self.window,
            session: session.clone(),
            roster_rx,
            check_ins_rx,
            session_rx,
            shutdown_rx,
            out: out_tx,
            roster: Vec::new(),
            recent: Vec::new(),
            stale: false,
        };
        let task = tokio::spawn(worker.run());

        Ok(DashboardHandle {
            snapshots: out_rx,
            shutdown: shutdown_tx,
            task,
        })
    }
}

/// Reader + teardown handle for one open dashboard.
#[derive(Debug)]
pub struct DashboardHandle {
    snapshots: watch::Receiver<DashboardSnapshot>,
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl DashboardHandle {
    /// A receiver for snapshot updates; cheap to clone per reader.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<DashboardSnapshot> {
        self.snapshots.clone()
    }

    /// The latest fully formed snapshot.
    #[must_use]
    pub fn latest(&self) -> DashboardSnapshot {
        self.snapshots.borrow().clone()
    }

    /// Stop the worker and wait for it to finish.
    ///
    /// When this returns, no further snapshot will be delivered.
    pub async fn close(self) {
        let _ = self.shutdown.send(true);
        let _ = self.task.await;
    }
}

struct DashboardWorker {
    clock: Clock,
    feed: Arc<CheckInFeed>,
    coach_id: CoachId,
    window: u32,
    session: Session,
    roster_rx: watch::Receiver<Vec<ClientRosterEntry>>,
    check_ins_rx: watch::Receiver<Vec<CheckIn>>,
    session_rx: watch::Receiver<Option<Session>>,
    shutdown_rx: watch::Receiver<bool>,
    out: watch::Sender<DashboardSnapshot>,
    roster: Vec<ClientRosterEntry>,
    recent: Vec<CheckIn>,
    stale: bool,
}

enum StreamKind {
    Roster,
    CheckIns,
}

impl DashboardWorker {
    async fn run(mut self) {
        // Subscriptions were seeded with real snapshots, so both inputs are
        // already known: surface the roster, then the computed stats.
        self.roster = self.roster_rx.borrow_and_update().clone();
        self.publish(DashboardPhase::RosterReady);
        self.recent = self.check_ins_rx.borrow_and_update().clone();
        self.publish(DashboardPhase::StatsReady);

        loop {
            tokio::select! {
                res = self.roster_rx.changed() => match res {
                    Ok(()) => {
                        self.roster = self.roster_rx.borrow_and_update().clone();
                        self.stale = false;
                        self.publish(DashboardPhase::StatsReady);
                    }
                    Err(_) => {
                        if !self.recover(StreamKind::Roster).await {
                            self.publish(DashboardPhase::Closed);
                            return;
                        }
                    }
                },
                res = self.check_ins_rx.changed() => match res {
                    Ok(()) => {
                        self.recent = self.check_ins_rx.borrow_and_update().clone();
                        self.stale = false;
                        self.publish(DashboardPhase::StatsReady);
                    }
                    Err(_) => {
                        if !self.recover(StreamKind::CheckIns).await {
                            self.publish(DashboardPhase::Closed);
                            return;
                        }
                    }
                },
                res = self.session_rx.changed() => {
                    // Any transition (sign-out, role switch, new sign-in)
                    // invalidates a dashboard scoped to the old session.
                    let changed = match res {
                        Ok(()) => self.session_rx.borrow_and_update().as_ref() != Some(&self.session),
                        Err(_) => true,
                    };
                    if changed {
                        tracing::debug!(coach = %self.coach_id, "session changed, closing dashboard");
                        self.publish(DashboardPhase::Closed);
                        return;
                    }
                },
                _ = self.shutdown_rx.changed() => {
                    // Explicit teardown: stop silently so nothing is
                    // delivered after close() returns.
                    return;
                },
            }
        }
    }

    /// Recompute stats from the latest pair and swap the snapshot in whole.
    fn publish(&self, phase: DashboardPhase) {
        let now = self.clock.now();
        let stats = if phase == DashboardPhase::RosterReady {
            ProgressStats::default()
        } else {
            ProgressStats::compute(&self.roster, &self.recent, now)
        };
        self.out.send_replace(DashboardSnapshot {
            phase,
            stats,
            roster: self.roster.clone(),
            recent: self.recent.clone(),
            stale: self.stale,
            computed_at: now,
        });
    }

    /// An input channel died: mark the snapshot stale and resubscribe.
    ///
    /// Returns false when recovery is exhausted and the dashboard must close.
    async fn recover(&mut self, kind: StreamKind) -> bool {
        self.stale = true;
        self.publish(DashboardPhase::StatsReady);

        let label = match kind {
            StreamKind::Roster => "roster",
            StreamKind::CheckIns => "check-ins",
        };
        tracing::warn!(coach = %self.coach_id, stream = label, "stream interrupted, resubscribing");

        for attempt in 1..=RESUBSCRIBE_ATTEMPTS {
            let result = match kind {
                StreamKind::Roster => self
                    .feed
                    .subscribe_roster(&self.coach_id)
                    .await
                    .map(|rx| self.roster_rx = rx),
                StreamKind::CheckIns => self
                    .feed
                    .subscribe_check_ins(&self.coach_id, self.window)
                    .await
                    .map(|rx| self.check_ins_rx = rx),
            };
            match result {
                Ok(()) => {
                    // The fresh subscription carries a current snapshot;
                    // fold it in and clear the stale flag.
                    match kind {
                        StreamKind::Roster => {
                            self.roster = self.roster_rx.borrow_and_update().clone();
                        }
                        StreamKind::CheckIns => {
                            self.recent = self.check_ins_rx.borrow_and_update().clone();
                        }
                    }
                    self.stale = false;
                    self.publish(DashboardPhase::StatsReady);
                    return true;
                }
                Err(e) => {
                    tracing::warn!(
                        coach = %self.coach_id,
                        stream = label,
                        attempt,
                        error = %e,
                        "resubscription failed"
                    );
                    tokio::time::sleep(std::time::Duration::from_millis(RESUBSCRIBE_DELAY_MS)).await;
                }
            }
        }

        tracing::error!(coach = %self.coach_id, stream = label, "stream unrecoverable");
        false
    }
}

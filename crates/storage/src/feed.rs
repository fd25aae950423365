//! Change feed over the repositories.
//!
//! One roster `watch` channel per coach, one check-in channel per
//! `(coach, window)` pair, so concurrent subscribers with different window
//! sizes each see their own snapshot. Every emission carries a full
//! replacement snapshot (the re-read aggregation window or roster), never a
//! delta, so consumers stay correct under duplicate or reordered wakeups.
//! Writes route through the feed: persist first, then republish.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use checkin_core::model::{CheckIn, CheckInId, ClientRosterEntry, CoachId};
use tokio::sync::watch;

use crate::repository::{CheckInRepository, RosterRepository, StorageError};

/// Default aggregation window: the ten most recent check-ins per coach.
pub const DEFAULT_WINDOW_SIZE: u32 = 10;

struct CoachChannels {
    check_ins: HashMap<u32, watch::Sender<Vec<CheckIn>>>,
    roster: watch::Sender<Vec<ClientRosterEntry>>,
}

impl CoachChannels {
    fn new() -> Self {
        let (roster, _) = watch::channel(Vec::new());
        Self {
            check_ins: HashMap::new(),
            roster,
        }
    }
}

/// Publishes per-coach snapshot streams on top of any repository backend.
pub struct CheckInFeed {
    check_ins: Arc<dyn CheckInRepository>,
    roster: Arc<dyn RosterRepository>,
    channels: Mutex<HashMap<CoachId, CoachChannels>>,
}

impl CheckInFeed {
    #[must_use]
    pub fn new(check_ins: Arc<dyn CheckInRepository>, roster: Arc<dyn RosterRepository>) -> Self {
        Self {
            check_ins,
            roster,
            channels: Mutex::new(HashMap::new()),
        }
    }

    /// Subscribe to a coach's check-in window.
    ///
    /// The receiver's current value is the snapshot as of the call; later
    /// writes wake it with fresh full snapshots. Subscribers asking for
    /// different window sizes get independent channels.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the initial window cannot be read.
    pub async fn subscribe_check_ins(
        &self,
        coach_id: &CoachId,
        window: u32,
    ) -> Result<watch::Receiver<Vec<CheckIn>>, StorageError> {
        let sender = self.check_in_sender(coach_id, window)?;
        let snapshot = self.check_ins.list_recent_for_coach(coach_id, window).await?;
        sender.send_replace(snapshot);
        Ok(sender.subscribe())
    }

    /// Subscribe to a coach's client roster.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the initial roster cannot be read.
    pub async fn subscribe_roster(
        &self,
        coach_id: &CoachId,
    ) -> Result<watch::Receiver<Vec<ClientRosterEntry>>, StorageError> {
        let sender = self.roster_sender(coach_id)?;
        let snapshot = self.roster.list_roster(coach_id).await?;
        sender.send_replace(snapshot);
        Ok(sender.subscribe())
    }

    /// Persist a check-in, then republish the owning coach's windows.
    ///
    /// # Errors
    ///
    /// Propagates the repository error; `Conflict` means the document
    /// already exists and nothing was written.
    pub async fn create_check_in(&self, check_in: &CheckIn) -> Result<CheckInId, StorageError> {
        let id = self.check_ins.create_check_in(check_in).await?;
        self.republish_check_ins(check_in.coach_id()).await?;
        Ok(id)
    }

    /// Persist a roster entry, then republish the owning coach's roster.
    ///
    /// # Errors
    ///
    /// Propagates the repository error.
    pub async fn upsert_roster_entry(&self, entry: &ClientRosterEntry) -> Result<(), StorageError> {
        self.roster.upsert_entry(entry).await?;
        self.republish_roster(&entry.coach_id).await
    }

    /// Drop a coach's channels, closing every open subscription.
    ///
    /// Subscribers observe the close and must resubscribe to resume; the
    /// next subscription rebuilds the channels with a fresh snapshot.
    pub fn invalidate(&self, coach_id: &CoachId) -> Result<(), StorageError> {
        let mut guard = self
            .channels
            .lock()
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        guard.remove(coach_id);
        Ok(())
    }

    async fn republish_check_ins(&self, coach_id: &CoachId) -> Result<(), StorageError> {
        for (window, sender) in self.check_in_senders(coach_id)? {
            let snapshot = self
                .check_ins
                .list_recent_for_coach(coach_id, window)
                .await?;
            sender.send_replace(snapshot);
        }
        Ok(())
    }

    async fn republish_roster(&self, coach_id: &CoachId) -> Result<(), StorageError> {
        let Some(sender) = self.existing_roster_sender(coach_id)? else {
            return Ok(());
        };
        let snapshot = self.roster.list_roster(coach_id).await?;
        sender.send_replace(snapshot);
        Ok(())
    }

    // Lock discipline: the channel map guard is never held across an await.
    fn check_in_sender(
        &self,
        coach_id: &CoachId,
        window: u32,
    ) -> Result<watch::Sender<Vec<CheckIn>>, StorageError> {
        let mut guard = self
            .channels
            .lock()
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        let channels = guard.entry(coach_id.clone()).or_insert_with(CoachChannels::new);
        let sender = channels.check_ins.entry(window).or_insert_with(|| {
            let (sender, _) = watch::channel(Vec::new());
            sender
        });
        Ok(sender.clone())
    }

    fn roster_sender(
        &self,
        coach_id: &CoachId,
    ) -> Result<watch::Sender<Vec<ClientRosterEntry>>, StorageError> {
        let mut guard = self
            .channels
            .lock()
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        let channels = guard.entry(coach_id.clone()).or_insert_with(CoachChannels::new);
        Ok(channels.roster.clone())
    }

    fn check_in_senders(
        &self,
        coach_id: &CoachId,
    ) -> Result<Vec<(u32, watch::Sender<Vec<CheckIn>>)>, StorageError> {
        let guard = self
            .channels
            .lock()
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        Ok(guard
            .get(coach_id)
            .map(|c| {
                c.check_ins
                    .iter()
                    .map(|(window, sender)| (*window, sender.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }

    fn existing_roster_sender(
        &self,
        coach_id: &CoachId,
    ) -> Result<Option<watch::Sender<Vec<ClientRosterEntry>>>, StorageError> {
        let guard = self
            .channels
            .lock()
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
        Ok(guard.get(coach_id).map(|c| c.roster.clone()))
    }
}

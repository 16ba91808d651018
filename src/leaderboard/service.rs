//! Leaderboard service: personal-best submission, ranking and live top-N feeds.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};

use super::error::LeaderboardError;
use super::record::{Rank, ScoreRecord, ScoreSubmission, is_personal_best};
use super::store::ScoreStore;
use crate::games::factor::GameMode;

/// Result of a score submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The submission became the player's stored personal best.
    Accepted(ScoreRecord),
    /// The stored record is at least as good; nothing was persisted.
    NotPersonalBest,
}

impl SubmitOutcome {
    /// Returns true if the submission was stored.
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted(_))
    }
}

#[derive(Debug)]
struct Slot {
    limit: usize,
    sender: mpsc::UnboundedSender<Vec<ScoreRecord>>,
    active: Arc<AtomicBool>,
}

impl Slot {
    fn close(&self) {
        self.active.store(false, Ordering::SeqCst);
    }

    fn deliver(&self, records: Vec<ScoreRecord>) -> bool {
        self.active.load(Ordering::SeqCst) && self.sender.send(records).is_ok()
    }
}

type Slots = Arc<Mutex<HashMap<GameMode, Slot>>>;

fn lock_slots(slots: &Mutex<HashMap<GameMode, Slot>>) -> MutexGuard<'_, HashMap<GameMode, Slot>> {
    slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Leaderboard over a [`ScoreStore`].
///
/// Clones share the store and the subscription table.
#[derive(Debug)]
pub struct Leaderboard<S: ScoreStore> {
    store: Arc<S>,
    slots: Slots,
}

impl<S: ScoreStore> Clone for Leaderboard<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            slots: Arc::clone(&self.slots),
        }
    }
}

impl<S: ScoreStore> Leaderboard<S> {
    /// Creates a leaderboard over `store`.
    #[instrument(skip(store))]
    pub fn new(store: S) -> Self {
        info!("Creating Leaderboard");
        Self {
            store: Arc::new(store),
            slots: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Returns the backing store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Stores `submission` if it beats the player's personal best for its mode.
    ///
    /// # Errors
    ///
    /// Returns [`LeaderboardError`] if the store fails. The previous personal
    /// best is left untouched in that case.
    #[instrument(skip(self, submission), fields(
        user_id = %submission.user_id(),
        mode = %submission.mode(),
        numbers_factored = submission.numbers_factored(),
        undos = submission.undos()
    ))]
    pub async fn submit_score(
        &self,
        submission: &ScoreSubmission,
    ) -> Result<SubmitOutcome, LeaderboardError> {
        let stored = self
            .store
            .personal_best(submission.user_id(), *submission.mode())
            .await?;

        if !is_personal_best(submission.key(), stored.as_ref().map(ScoreRecord::key)) {
            info!("Submission is not a personal best");
            return Ok(SubmitOutcome::NotPersonalBest);
        }

        let record = self.store.replace_personal_best(submission).await?;
        info!(record_id = record.id(), "Personal best accepted");
        self.notify(*submission.mode()).await;
        Ok(SubmitOutcome::Accepted(record))
    }

    /// Returns up to `n` records for `mode`, best first.
    ///
    /// # Errors
    ///
    /// Returns [`LeaderboardError`] if the store fails.
    #[instrument(skip(self))]
    pub async fn top_n(&self, mode: GameMode, n: usize) -> Result<Vec<ScoreRecord>, LeaderboardError> {
        self.store.top_n(mode, n).await
    }

    /// Returns the player's stored record for `mode`, if any.
    ///
    /// # Errors
    ///
    /// Returns [`LeaderboardError`] if the store fails.
    #[instrument(skip(self))]
    pub async fn personal_best(
        &self,
        user_id: &str,
        mode: GameMode,
    ) -> Result<Option<ScoreRecord>, LeaderboardError> {
        self.store.personal_best(user_id, mode).await
    }

    /// Computes the player's 1-based position for `mode`.
    ///
    /// The position is one plus the number of records that strictly outrank
    /// the player's personal best.
    ///
    /// # Errors
    ///
    /// Returns [`LeaderboardError`] if the store fails.
    #[instrument(skip(self))]
    pub async fn rank_of(&self, user_id: &str, mode: GameMode) -> Result<Rank, LeaderboardError> {
        let Some(best) = self.store.personal_best(user_id, mode).await? else {
            debug!("No stored score");
            return Ok(Rank::Unranked);
        };
        let ahead = self.store.count_outranking(mode, best.key()).await?;
        let rank = Rank::Ranked(ahead + 1);
        debug!(%rank, "Rank computed");
        Ok(rank)
    }

    /// Opens a live top-N feed for `mode`.
    ///
    /// The current top-N is delivered first, then again after every accepted
    /// submission for `mode`. Only one feed per mode is live: opening a new
    /// one ends the previous feed.
    ///
    /// # Errors
    ///
    /// Returns [`LeaderboardError`] if the initial query fails; no feed is
    /// registered then.
    #[instrument(skip(self))]
    pub async fn subscribe_top_n(
        &self,
        mode: GameMode,
        n: usize,
    ) -> Result<TopNSubscription, LeaderboardError> {
        let initial = self.store.top_n(mode, n).await?;

        let (sender, receiver) = mpsc::unbounded_channel();
        let active = Arc::new(AtomicBool::new(true));
        let slot = Slot {
            limit: n,
            sender,
            active: Arc::clone(&active),
        };
        slot.deliver(initial);

        if let Some(previous) = lock_slots(&self.slots).insert(mode, slot) {
            debug!("Superseding previous subscription");
            previous.close();
        }

        info!("Top-N subscription opened");
        Ok(TopNSubscription {
            mode,
            receiver,
            active,
            slots: Arc::clone(&self.slots),
        })
    }

    /// Returns true if `mode` has a live subscription.
    pub fn has_subscription(&self, mode: GameMode) -> bool {
        lock_slots(&self.slots)
            .get(&mode)
            .is_some_and(|slot| slot.active.load(Ordering::SeqCst))
    }

    async fn notify(&self, mode: GameMode) {
        let limit = match lock_slots(&self.slots).get(&mode) {
            Some(slot) if slot.active.load(Ordering::SeqCst) => slot.limit,
            _ => return,
        };

        let records = match self.store.top_n(mode, limit).await {
            Ok(records) => records,
            Err(e) => {
                warn!(error = %e, "Failed to refresh subscribed top-N");
                return;
            }
        };

        let mut slots = lock_slots(&self.slots);
        if let Some(slot) = slots.get(&mode)
            && !slot.deliver(records)
        {
            debug!("Subscriber gone, dropping slot");
            slots.remove(&mode);
        }
    }
}

/// Live top-N feed for one mode.
///
/// Dropping the subscription unsubscribes it.
#[derive(Debug)]
pub struct TopNSubscription {
    mode: GameMode,
    receiver: mpsc::UnboundedReceiver<Vec<ScoreRecord>>,
    active: Arc<AtomicBool>,
    slots: Slots,
}

impl TopNSubscription {
    /// Returns the subscribed mode.
    pub fn mode(&self) -> GameMode {
        self.mode
    }

    /// Returns true until the feed is unsubscribed or superseded.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Waits for the next update. Returns `None` once the feed has ended.
    pub async fn next(&mut self) -> Option<Vec<ScoreRecord>> {
        if !self.is_active() {
            return None;
        }
        let update = self.receiver.recv().await?;
        self.is_active().then_some(update)
    }

    /// Returns a pending update without waiting.
    pub fn try_next(&mut self) -> Option<Vec<ScoreRecord>> {
        if !self.is_active() {
            return None;
        }
        self.receiver.try_recv().ok()
    }

    /// Ends the feed. No updates are delivered afterwards.
    #[instrument(skip(self), fields(mode = %self.mode))]
    pub fn unsubscribe(mut self) {
        self.teardown();
        info!("Top-N subscription closed");
    }

    fn teardown(&mut self) {
        if !self.active.swap(false, Ordering::SeqCst) {
            return;
        }
        self.receiver.close();
        let mut slots = lock_slots(&self.slots);
        if slots
            .get(&self.mode)
            .is_some_and(|slot| Arc::ptr_eq(&slot.active, &self.active))
        {
            slots.remove(&self.mode);
        }
    }
}

impl Drop for TopNSubscription {
    fn drop(&mut self) {
        self.teardown();
    }
}

use super::{
    db_structs::{NewRatingVote, PlayerRatingState, RatingVote},
    error::StoreError,
    store::{DowngradeStep, RatingStep, RatingStore, VoteApplication}
};
use crate::model::structures::event_kind::EventRef;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use itertools::Itertools;
use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicI32, Ordering},
        Arc
    }
};
use tokio::sync::{Mutex, RwLock};

/// In-process [`RatingStore`]. Each rating sits behind its own mutex, which is the
/// per-player exclusive section; votes are guarded by one shared mutex taken after it.
#[derive(Default)]
pub struct MemoryStore {
    ratings: RwLock<HashMap<i32, Arc<Mutex<PlayerRatingState>>>>,
    votes: Mutex<Vec<RatingVote>>,
    participations: RwLock<Vec<(i32, EventRef, DateTime<Utc>)>>,
    next_vote_id: AtomicI32
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that a player took part in an event starting at `started_at`.
    pub async fn record_participation(&self, player_id: i32, event: EventRef, started_at: DateTime<Utc>) {
        self.participations
            .write()
            .await
            .push((player_id, event, started_at));
    }

    /// Snapshot of every stored vote, in insertion order.
    pub async fn votes(&self) -> Vec<RatingVote> {
        self.votes.lock().await.clone()
    }

    async fn cell(&self, player_id: i32) -> Result<Arc<Mutex<PlayerRatingState>>, StoreError> {
        self.ratings
            .read()
            .await
            .get(&player_id)
            .cloned()
            .ok_or(StoreError::RatingNotFound(player_id))
    }
}

#[async_trait]
impl RatingStore for MemoryStore {
    async fn player_ids(&self) -> Result<Vec<i32>, StoreError> {
        Ok(self.ratings.read().await.keys().copied().sorted().collect())
    }

    async fn rating(&self, player_id: i32) -> Result<Option<PlayerRatingState>, StoreError> {
        let cell = self.ratings.read().await.get(&player_id).cloned();

        match cell {
            Some(cell) => Ok(Some(cell.lock().await.clone())),
            None => Ok(None)
        }
    }

    async fn create_rating(&self, state: &PlayerRatingState) -> Result<(), StoreError> {
        let mut ratings = self.ratings.write().await;

        if ratings.contains_key(&state.player_id) {
            return Err(StoreError::RatingExists(state.player_id));
        }

        ratings.insert(state.player_id, Arc::new(Mutex::new(state.clone())));
        Ok(())
    }

    async fn pending_votes(&self) -> Result<Vec<RatingVote>, StoreError> {
        let votes = self.votes.lock().await;

        Ok(votes
            .iter()
            .filter(|v| !v.is_counted)
            .sorted_by_key(|v| (v.created_at, v.id))
            .cloned()
            .collect())
    }

    async fn apply_vote(&self, vote: &RatingVote, step: &RatingStep<'_>) -> Result<VoteApplication, StoreError> {
        let cell = self.cell(vote.rated_id).await?;
        let mut state = cell.lock().await;
        let mut votes = self.votes.lock().await;

        let stored = votes
            .iter_mut()
            .find(|v| v.id == vote.id)
            .ok_or(StoreError::VoteNotFound(vote.id))?;

        if stored.is_counted {
            return Ok(VoteApplication::AlreadyCounted);
        }

        let transition = step(&state)?;

        // Nothing below can fail, so both writes land together.
        if transition.changes_state() {
            *state = transition.after.clone();
        }
        stored.is_counted = true;

        Ok(VoteApplication::Applied(transition))
    }

    async fn stale_ratings(&self, cutoff: DateTime<Utc>) -> Result<Vec<PlayerRatingState>, StoreError> {
        let cells = self.ratings.read().await.values().cloned().collect::<Vec<_>>();
        let mut stale = Vec::new();

        for cell in cells {
            let state = cell.lock().await;
            if state.updated_at < cutoff {
                stale.push(state.clone());
            }
        }

        stale.sort_by_key(|s| s.player_id);
        Ok(stale)
    }

    async fn was_active_since(&self, player_id: i32, since: DateTime<Utc>) -> Result<bool, StoreError> {
        Ok(self
            .participations
            .read()
            .await
            .iter()
            .any(|(p, _, started_at)| *p == player_id && *started_at >= since))
    }

    async fn apply_downgrade(
        &self,
        player_id: i32,
        step: &DowngradeStep<'_>
    ) -> Result<Option<(PlayerRatingState, PlayerRatingState)>, StoreError> {
        let cell = self.cell(player_id).await?;
        let mut state = cell.lock().await;

        match step(&state) {
            Some(next) => {
                let before = std::mem::replace(&mut *state, next.clone());
                Ok(Some((before, next)))
            }
            None => Ok(None)
        }
    }

    async fn participated(&self, player_id: i32, event: EventRef) -> Result<bool, StoreError> {
        Ok(self
            .participations
            .read()
            .await
            .iter()
            .any(|(p, e, _)| *p == player_id && *e == event))
    }

    async fn votes_for_pair(&self, rater_id: i32, rated_id: i32) -> Result<Vec<RatingVote>, StoreError> {
        let votes = self.votes.lock().await;

        Ok(votes
            .iter()
            .filter(|v| v.rater_id == rater_id && v.rated_id == rated_id)
            .sorted_by_key(|v| (v.created_at, v.id))
            .cloned()
            .collect())
    }

    async fn insert_vote(&self, vote: &NewRatingVote) -> Result<RatingVote, StoreError> {
        let mut votes = self.votes.lock().await;

        if votes
            .iter()
            .any(|v| v.rater_id == vote.rater_id && v.rated_id == vote.rated_id && v.event == vote.event)
        {
            return Err(StoreError::DuplicateVote {
                rater_id: vote.rater_id,
                rated_id: vote.rated_id,
                event: vote.event
            });
        }

        let id = self.next_vote_id.fetch_add(1, Ordering::SeqCst) + 1;
        let stored = RatingVote {
            id,
            rater_id: vote.rater_id,
            rated_id: vote.rated_id,
            event: vote.event,
            value: vote.value,
            created_at: vote.created_at,
            is_counted: false
        };

        votes.push(stored.clone());
        Ok(stored)
    }
}

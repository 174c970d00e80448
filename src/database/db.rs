use super::{
    db_structs::{NewRatingVote, PlayerRatingState, RatingVote},
    error::StoreError,
    store::{DowngradeStep, RatingStep, RatingStore, VoteApplication}
};
use crate::model::structures::{
    event_kind::{EventKind, EventRef},
    grade::Grade
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use postgres_types::ToSql;
use std::{
    str::FromStr,
    sync::atomic::{AtomicUsize, Ordering}
};
use tokio::sync::{Mutex, MutexGuard};
use tokio_postgres::{Client, NoTls, Row};
use tracing::{debug, error, info};

const SCHEMA: &str = include_str!("../../sql/schema.sql");

const RATING_COLUMNS: &str = "player_id, grade, level_mark, value, updated_at";
const VOTE_EVENT_CONSTRAINT: &str = "uq_player_rating_votes_event";

const VOTE_COLUMNS: &str = "id, rater_id, rated_id, event_kind, event_id, value, created_at, is_counted";

/// PostgreSQL-backed [`RatingStore`].
///
/// Rating and vote writes run in one transaction that holds `FOR UPDATE` locks on
/// the player's rating row and on the vote row, so other processor instances
/// serialize on the same player.
///
/// Each connection runs one transaction at a time, so the pool size caps how many
/// players a batch can update in parallel.
pub struct DbClient {
    clients: Vec<Mutex<Client>>,
    next: AtomicUsize
}

impl DbClient {
    // Connect to the database and return a DbClient instance
    pub async fn connect(connection_str: &str) -> Result<Self, StoreError> {
        Self::connect_pool(connection_str, 1).await
    }

    /// Opens `size` connections (at least one).
    pub async fn connect_pool(connection_str: &str, size: usize) -> Result<Self, StoreError> {
        let mut clients = Vec::with_capacity(size.max(1));

        for _ in 0..size.max(1) {
            let (client, connection) = tokio_postgres::connect(connection_str, NoTls).await?;

            // Spawn the connection object to run in the background
            tokio::spawn(async move {
                if let Err(e) = connection.await {
                    error!("connection error: {}", e);
                }
            });

            clients.push(Mutex::new(client));
        }

        debug!(connections = clients.len(), "Connected to database");

        Ok(DbClient {
            clients,
            next: AtomicUsize::new(0)
        })
    }

    pub fn pool_size(&self) -> usize {
        self.clients.len()
    }

    /// An idle connection if there is one, otherwise the next one in turn.
    async fn client(&self) -> MutexGuard<'_, Client> {
        for client in &self.clients {
            if let Ok(guard) = client.try_lock() {
                return guard;
            }
        }

        let index = self.next.fetch_add(1, Ordering::Relaxed) % self.clients.len();
        self.clients[index].lock().await
    }

    /// Creates any missing tables. Safe to run against an initialized database.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        self.client().await.batch_execute(SCHEMA).await?;
        info!("Database schema verified");
        Ok(())
    }

    fn rating_from_row(row: &Row) -> Result<PlayerRatingState, StoreError> {
        let grade: String = row.try_get("grade")?;
        let level_mark: i16 = row.try_get("level_mark")?;

        Ok(PlayerRatingState {
            player_id: row.try_get("player_id")?,
            grade: Grade::from_str(&grade).map_err(|_| StoreError::CorruptRow {
                table: "player_ratings",
                reason: format!("unknown grade '{}'", grade)
            })?,
            level_mark: u8::try_from(level_mark).map_err(|_| StoreError::CorruptRow {
                table: "player_ratings",
                reason: format!("level mark {} out of range", level_mark)
            })?,
            value: row.try_get("value")?,
            updated_at: row.try_get("updated_at")?
        })
    }

    fn vote_from_row(row: &Row) -> Result<RatingVote, StoreError> {
        let event_kind: String = row.try_get("event_kind")?;

        Ok(RatingVote {
            id: row.try_get("id")?,
            rater_id: row.try_get("rater_id")?,
            rated_id: row.try_get("rated_id")?,
            event: EventRef {
                kind: EventKind::from_str(&event_kind).map_err(|_| StoreError::CorruptRow {
                    table: "player_rating_votes",
                    reason: format!("unknown event kind '{}'", event_kind)
                })?,
                id: row.try_get("event_id")?
            },
            value: row.try_get("value")?,
            created_at: row.try_get("created_at")?,
            is_counted: row.try_get("is_counted")?
        })
    }

    fn rating_params(state: &PlayerRatingState) -> (String, i16, i32, DateTime<Utc>) {
        (
            state.grade.to_string(),
            state.level_mark as i16,
            state.value,
            state.updated_at
        )
    }
}

#[async_trait]
impl RatingStore for DbClient {
    async fn player_ids(&self) -> Result<Vec<i32>, StoreError> {
        let client = self.client().await;
        let rows = client
            .query("SELECT player_id FROM player_ratings ORDER BY player_id", &[])
            .await?;

        Ok(rows.iter().map(|row| row.get("player_id")).collect())
    }

    async fn rating(&self, player_id: i32) -> Result<Option<PlayerRatingState>, StoreError> {
        let client = self.client().await;
        let query = format!("SELECT {} FROM player_ratings WHERE player_id = $1", RATING_COLUMNS);
        let row = client.query_opt(query.as_str(), &[&player_id]).await?;

        row.as_ref().map(Self::rating_from_row).transpose()
    }

    async fn create_rating(&self, state: &PlayerRatingState) -> Result<(), StoreError> {
        let client = self.client().await;
        let (grade, level_mark, value, updated_at) = Self::rating_params(state);
        let values: &[&(dyn ToSql + Sync)] = &[&state.player_id, &grade, &level_mark, &value, &updated_at];

        let inserted = client
            .execute(
                "INSERT INTO player_ratings (player_id, grade, level_mark, value, updated_at) \
                VALUES ($1, $2, $3, $4, $5) ON CONFLICT (player_id) DO NOTHING",
                values
            )
            .await?;

        if inserted == 0 {
            return Err(StoreError::RatingExists(state.player_id));
        }

        Ok(())
    }

    async fn pending_votes(&self) -> Result<Vec<RatingVote>, StoreError> {
        let client = self.client().await;
        let query = format!(
            "SELECT {} FROM player_rating_votes WHERE is_counted = FALSE ORDER BY created_at, id",
            VOTE_COLUMNS
        );
        let rows = client.query(query.as_str(), &[]).await?;

        rows.iter().map(Self::vote_from_row).collect()
    }

    async fn apply_vote(&self, vote: &RatingVote, step: &RatingStep<'_>) -> Result<VoteApplication, StoreError> {
        let mut client = self.client().await;
        let tx = client.transaction().await?;

        // Lock order: rating row first, then the vote row.
        let rating_query = format!(
            "SELECT {} FROM player_ratings WHERE player_id = $1 FOR UPDATE",
            RATING_COLUMNS
        );
        let rating_row = tx
            .query_opt(rating_query.as_str(), &[&vote.rated_id])
            .await?
            .ok_or(StoreError::RatingNotFound(vote.rated_id))?;

        let counted: bool = tx
            .query_opt(
                "SELECT is_counted FROM player_rating_votes WHERE id = $1 FOR UPDATE",
                &[&vote.id]
            )
            .await?
            .ok_or(StoreError::VoteNotFound(vote.id))?
            .try_get("is_counted")?;

        if counted {
            tx.rollback().await?;
            debug!(vote_id = vote.id, "Vote already counted, skipping");
            return Ok(VoteApplication::AlreadyCounted);
        }

        let state = Self::rating_from_row(&rating_row)?;
        // An error here drops `tx`, which rolls the transaction back.
        let transition = step(&state)?;

        if transition.changes_state() {
            let (grade, level_mark, value, updated_at) = Self::rating_params(&transition.after);
            let values: &[&(dyn ToSql + Sync)] = &[&grade, &level_mark, &value, &updated_at, &vote.rated_id];

            tx.execute(
                "UPDATE player_ratings SET grade = $1, level_mark = $2, value = $3, updated_at = $4 \
                WHERE player_id = $5",
                values
            )
            .await?;
        }

        tx.execute(
            "UPDATE player_rating_votes SET is_counted = TRUE WHERE id = $1",
            &[&vote.id]
        )
        .await?;

        tx.commit().await?;

        Ok(VoteApplication::Applied(transition))
    }

    async fn stale_ratings(&self, cutoff: DateTime<Utc>) -> Result<Vec<PlayerRatingState>, StoreError> {
        let client = self.client().await;
        let query = format!(
            "SELECT {} FROM player_ratings WHERE updated_at < $1 ORDER BY player_id",
            RATING_COLUMNS
        );
        let rows = client.query(query.as_str(), &[&cutoff]).await?;

        rows.iter().map(Self::rating_from_row).collect()
    }

    async fn was_active_since(&self, player_id: i32, since: DateTime<Utc>) -> Result<bool, StoreError> {
        let client = self.client().await;
        let row = client
            .query_one(
                "SELECT EXISTS (SELECT 1 FROM event_participants WHERE player_id = $1 AND started_at >= $2)",
                &[&player_id, &since]
            )
            .await?;

        Ok(row.try_get(0)?)
    }

    async fn apply_downgrade(
        &self,
        player_id: i32,
        step: &DowngradeStep<'_>
    ) -> Result<Option<(PlayerRatingState, PlayerRatingState)>, StoreError> {
        let mut client = self.client().await;
        let tx = client.transaction().await?;

        let query = format!(
            "SELECT {} FROM player_ratings WHERE player_id = $1 FOR UPDATE",
            RATING_COLUMNS
        );
        let row = tx
            .query_opt(query.as_str(), &[&player_id])
            .await?
            .ok_or(StoreError::RatingNotFound(player_id))?;
        let before = Self::rating_from_row(&row)?;

        let after = match step(&before) {
            Some(after) => after,
            None => {
                tx.rollback().await?;
                return Ok(None);
            }
        };

        let (grade, level_mark, value, updated_at) = Self::rating_params(&after);
        let values: &[&(dyn ToSql + Sync)] = &[&grade, &level_mark, &value, &updated_at, &player_id];
        tx.execute(
            "UPDATE player_ratings SET grade = $1, level_mark = $2, value = $3, updated_at = $4 \
            WHERE player_id = $5",
            values
        )
        .await?;
        tx.commit().await?;

        Ok(Some((before, after)))
    }

    async fn participated(&self, player_id: i32, event: EventRef) -> Result<bool, StoreError> {
        let client = self.client().await;
        let kind = event.kind.to_string();
        let row = client
            .query_one(
                "SELECT EXISTS (SELECT 1 FROM event_participants \
                WHERE player_id = $1 AND event_kind = $2 AND event_id = $3)",
                &[&player_id, &kind, &event.id]
            )
            .await?;

        Ok(row.try_get(0)?)
    }

    async fn votes_for_pair(&self, rater_id: i32, rated_id: i32) -> Result<Vec<RatingVote>, StoreError> {
        let client = self.client().await;
        let query = format!(
            "SELECT {} FROM player_rating_votes WHERE rater_id = $1 AND rated_id = $2 ORDER BY created_at, id",
            VOTE_COLUMNS
        );
        let rows = client.query(query.as_str(), &[&rater_id, &rated_id]).await?;

        rows.iter().map(Self::vote_from_row).collect()
    }

    async fn insert_vote(&self, vote: &NewRatingVote) -> Result<RatingVote, StoreError> {
        let client = self.client().await;
        let kind = vote.event.kind.to_string();
        let values: &[&(dyn ToSql + Sync)] = &[
            &vote.rater_id,
            &vote.rated_id,
            &kind,
            &vote.event.id,
            &vote.value,
            &vote.created_at
        ];

        let row = client
            .query_one(
                "INSERT INTO player_rating_votes (rater_id, rated_id, event_kind, event_id, value, created_at) \
                VALUES ($1, $2, $3, $4, $5, $6) RETURNING id",
                values
            )
            .await
            .map_err(|e| {
                if e.as_db_error().and_then(|db| db.constraint()) == Some(VOTE_EVENT_CONSTRAINT) {
                    StoreError::DuplicateVote {
                        rater_id: vote.rater_id,
                        rated_id: vote.rated_id,
                        event: vote.event
                    }
                } else {
                    StoreError::Postgres(e)
                }
            })?;

        Ok(RatingVote {
            id: row.try_get("id")?,
            rater_id: vote.rater_id,
            rated_id: vote.rated_id,
            event: vote.event,
            value: vote.value,
            created_at: vote.created_at,
            is_counted: false
        })
    }
}

use crate::{
    database::{
        db_structs::RatingVote,
        error::StoreError,
        store::{RatingStore, VoteApplication}
    },
    model::{
        ladder::GradeLadder,
        policy::RatingPolicy,
        rating_updater::update_player_rating,
        structures::{
            grade_change::{GradeChange, GradeChangeKind},
            rating_transition::{RatingOutcome, RatingTransition}
        }
    },
    utils::progress_utils::progress_bar
};
use chrono::Utc;
use futures::{stream, StreamExt};
use indexmap::IndexMap;
use serde::Serialize;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc
};
use tracing::{debug, error, info, warn};

/// Per-vote counts of one batch run.
#[derive(Serialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct RatingStats {
    pub unchanged: usize,
    pub updated: usize,
    pub upgraded: usize,
    pub downgraded: usize,
    /// Updates that hit the first or last tier and were clamped (also counted in `updated`)
    pub clamped: usize,
    /// Votes another run counted first
    pub already_counted: usize,
    pub failed: usize,
    /// Players with no pending votes
    pub idle_players: usize,
    /// Players skipped because the run was stopped
    pub cancelled_players: usize
}

impl RatingStats {
    fn record(&mut self, application: &VoteApplication) {
        match application {
            VoteApplication::AlreadyCounted => self.already_counted += 1,
            VoteApplication::Applied(transition) => {
                match transition.outcome {
                    RatingOutcome::Unchanged => self.unchanged += 1,
                    RatingOutcome::Updated => self.updated += 1,
                    RatingOutcome::Upgraded => self.upgraded += 1,
                    RatingOutcome::Downgraded => self.downgraded += 1
                }

                if transition.boundary.is_some() {
                    self.clamped += 1;
                }
            }
        }
    }

    fn merge(&mut self, other: &RatingStats) {
        self.unchanged += other.unchanged;
        self.updated += other.updated;
        self.upgraded += other.upgraded;
        self.downgraded += other.downgraded;
        self.clamped += other.clamped;
        self.already_counted += other.already_counted;
        self.failed += other.failed;
        self.idle_players += other.idle_players;
        self.cancelled_players += other.cancelled_players;
    }

    /// Votes counted by this run.
    pub fn applied(&self) -> usize {
        self.unchanged + self.updated + self.upgraded + self.downgraded
    }
}

#[derive(Serialize, Debug, Default, Clone, PartialEq)]
pub struct RatingReport {
    pub stats: RatingStats,
    pub grade_changes: Vec<GradeChange>
}

#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Players processed at the same time. A store that runs one write at a time
    /// (such as a [`DbClient`](crate::database::db::DbClient) with a single connection)
    /// still applies them one by one.
    pub concurrency: usize,
    /// Checked before each player; once set, remaining players are left for the next run
    pub stop: Arc<AtomicBool>
}

impl Default for BatchOptions {
    fn default() -> Self {
        BatchOptions {
            concurrency: 4,
            stop: Arc::new(AtomicBool::new(false))
        }
    }
}

/// # Rating batch
///
/// Drains every uncounted vote, grouped by rated player in creation order.
///
/// - Votes of one player are applied one at a time, oldest first.
/// - Different players run concurrently, up to `options.concurrency`.
/// - A failed vote is logged and stops that player's remaining votes for this run.
///   They stay pending; other players are unaffected.
/// - Counted votes are never re-applied, so the batch can be re-run at any time.
pub async fn update_players_rating<S: RatingStore + ?Sized>(
    store: &S,
    ladder: &GradeLadder,
    policy: &RatingPolicy,
    options: &BatchOptions
) -> Result<RatingReport, StoreError> {
    let player_ids = store.player_ids().await?;
    let votes = group_by_rated_player(store.pending_votes().await?);

    let mut report = RatingReport::default();
    report.stats.idle_players = player_ids.iter().filter(|id| !votes.contains_key(*id)).count();

    info!(
        players = votes.len(),
        votes = votes.values().map(Vec::len).sum::<usize>(),
        "Applying pending rating votes"
    );

    let bar = progress_bar(votes.len() as u64, "Applying rating votes".to_string());
    let concurrency = options.concurrency.max(1);

    let results = stream::iter(votes)
        .map(|(player_id, player_votes)| {
            let stop = &options.stop;
            async move { process_player(store, ladder, policy, player_id, player_votes, stop).await }
        })
        .buffer_unordered(concurrency)
        .inspect(|_| bar.inc(1))
        .collect::<Vec<_>>()
        .await;

    bar.finish_and_clear();

    for (stats, changes) in results {
        report.stats.merge(&stats);
        report.grade_changes.extend(changes);
    }

    report.grade_changes.sort_by_key(|c| (c.changed_at, c.player_id));

    info!(
        updated = report.stats.updated,
        upgraded = report.stats.upgraded,
        downgraded = report.stats.downgraded,
        unchanged = report.stats.unchanged,
        clamped = report.stats.clamped,
        failed = report.stats.failed,
        "Rating batch complete"
    );

    Ok(report)
}

/// Groups votes by rated player, keeping players and votes in the order they were seen.
fn group_by_rated_player(votes: Vec<RatingVote>) -> IndexMap<i32, Vec<RatingVote>> {
    let mut grouped: IndexMap<i32, Vec<RatingVote>> = IndexMap::new();

    for vote in votes {
        grouped.entry(vote.rated_id).or_default().push(vote);
    }

    grouped
}

async fn process_player<S: RatingStore + ?Sized>(
    store: &S,
    ladder: &GradeLadder,
    policy: &RatingPolicy,
    player_id: i32,
    votes: Vec<RatingVote>,
    stop: &AtomicBool
) -> (RatingStats, Vec<GradeChange>) {
    let mut stats = RatingStats::default();
    let mut changes = Vec::new();

    if stop.load(Ordering::SeqCst) {
        debug!(player_id, "Batch stopped, leaving votes pending");
        stats.cancelled_players = 1;
        return (stats, changes);
    }

    for vote in &votes {
        match update_player_rating(store, ladder, policy, vote, Utc::now()).await {
            Ok(application) => {
                if let VoteApplication::Applied(transition) = &application {
                    log_transition(player_id, vote.id, transition);

                    if let Some(change) = grade_change(transition) {
                        changes.push(change);
                    }
                }

                stats.record(&application);
            }
            Err(e) => {
                error!(
                    player_id,
                    vote_id = vote.id,
                    error = %e,
                    "Failed to apply rating vote, remaining votes for this player stay pending"
                );
                stats.failed += 1;
                break;
            }
        }
    }

    (stats, changes)
}

fn grade_change(transition: &RatingTransition) -> Option<GradeChange> {
    let kind = match transition.outcome {
        RatingOutcome::Upgraded => GradeChangeKind::Upgrade,
        RatingOutcome::Downgraded => GradeChangeKind::Downgrade,
        _ => return None
    };

    Some(GradeChange::new(kind, &transition.before, &transition.after))
}

fn log_transition(player_id: i32, vote_id: i32, transition: &RatingTransition) {
    match (transition.outcome, transition.boundary) {
        (RatingOutcome::Upgraded, _) | (RatingOutcome::Downgraded, _) => info!(
            player_id,
            vote_id,
            from = %transition.before.code(),
            to = %transition.after.code(),
            outcome = ?transition.outcome,
            "Player changed tier"
        ),
        (_, Some(boundary)) => warn!(
            player_id,
            vote_id,
            tier = %transition.after.code(),
            ?boundary,
            "Ladder boundary reached, rating clamped"
        ),
        _ => debug!(
            player_id,
            vote_id,
            before = transition.before.value,
            after = transition.after.value,
            outcome = ?transition.outcome,
            "Vote applied"
        )
    }
}

use crate::{
    database::{db_structs::PlayerRatingState, error::StoreError, store::RatingStore},
    model::{
        error::GradingError,
        policy::RatingPolicy,
        structures::grade_change::{GradeChange, GradeChangeKind}
    }
};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{debug, error, info};

#[derive(Serialize, Debug, Default, Clone, PartialEq)]
pub struct DowngradeReport {
    pub downgraded: usize,
    pub failed: usize,
    pub grade_changes: Vec<GradeChange>
}

/// # How this works
/// - A player qualifies when their rating was last updated more than `days` ago
///   and they have not taken part in any event within the same window.
/// - A qualifying player loses exactly one level inside their grade and restarts
///   at the baseline value. The grade itself never changes, so level 1 is a floor.
/// - Each player is re-checked under the rating lock before writing, so a vote
///   applied in the meantime cancels the downgrade.
///
/// Failures for one player are logged and counted; the sweep moves on.
pub async fn downgrade_inactive_players<S: RatingStore + ?Sized>(
    store: &S,
    policy: &RatingPolicy,
    days: i64,
    now: DateTime<Utc>
) -> Result<DowngradeReport, StoreError> {
    let cutoff = inactivity_cutoff(now, days)?;
    let candidates = store.stale_ratings(cutoff).await?;
    let mut report = DowngradeReport::default();

    info!(candidates = candidates.len(), days, "Checking for inactive players");

    for state in candidates {
        if state.level_mark <= 1 {
            debug!(player_id = state.player_id, "Already at the lowest level of the grade");
            continue;
        }

        match sweep_player(store, policy, &state, cutoff, now).await {
            Ok(Some(change)) => {
                info!(
                    player_id = change.player_id,
                    from = %change.previous_code,
                    to = %change.current_code,
                    "Downgraded inactive player"
                );
                report.downgraded += 1;
                report.grade_changes.push(change);
            }
            Ok(None) => {}
            Err(e) => {
                error!(player_id = state.player_id, error = %e, "Failed to downgrade inactive player");
                report.failed += 1;
            }
        }
    }

    info!(downgraded = report.downgraded, failed = report.failed, "Inactivity sweep complete");
    Ok(report)
}

async fn sweep_player<S: RatingStore + ?Sized>(
    store: &S,
    policy: &RatingPolicy,
    state: &PlayerRatingState,
    cutoff: DateTime<Utc>,
    now: DateTime<Utc>
) -> Result<Option<GradeChange>, StoreError> {
    if store.was_active_since(state.player_id, cutoff).await? {
        return Ok(None);
    }

    let result = store
        .apply_downgrade(state.player_id, &|locked: &PlayerRatingState| {
            downgraded_state(locked, policy, cutoff, now)
        })
        .await?;

    Ok(result.map(|(before, after)| GradeChange::new(GradeChangeKind::Inactivity, &before, &after)))
}

/// Start of the inactivity window. `days` must be positive and keep the cutoff on the calendar.
pub fn inactivity_cutoff(now: DateTime<Utc>, days: i64) -> Result<DateTime<Utc>, GradingError> {
    if days <= 0 {
        return Err(GradingError::InvalidInactivityWindow(days));
    }

    Duration::try_days(days)
        .and_then(|window| now.checked_sub_signed(window))
        .ok_or(GradingError::InvalidInactivityWindow(days))
}

/// The state after an inactivity downgrade, or `None` if the player does not qualify.
pub fn downgraded_state(
    state: &PlayerRatingState,
    policy: &RatingPolicy,
    cutoff: DateTime<Utc>,
    now: DateTime<Utc>
) -> Option<PlayerRatingState> {
    if state.updated_at >= cutoff || state.level_mark <= 1 {
        return None;
    }

    Some(PlayerRatingState {
        level_mark: state.level_mark - 1,
        value: policy.baseline,
        updated_at: now,
        ..state.clone()
    })
}

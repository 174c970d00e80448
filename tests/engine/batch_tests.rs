use chrono::{Duration, Utc};
use grade_processor::{
    database::{db_structs::NewRatingVote, memory::MemoryStore, store::RatingStore},
    model::{
        ladder::GradeLadder,
        rating_processor::BatchOptions,
        structures::{event_kind::EventRef, grade_change::GradeChangeKind},
        GradeSystem
    },
    utils::test_utils::{generate_new_vote, generate_random_votes, generate_rating_state}
};
use std::sync::atomic::Ordering;

use crate::{
    common::{init_test_env, store_with},
    flaky_store::FlakyStore
};

async fn cast(store: &MemoryStore, votes: &[(i32, i32, f64)]) {
    let start = Utc::now() - Duration::minutes(10);

    for (i, (rater_id, rated_id, value)) in votes.iter().enumerate() {
        let vote = NewRatingVote {
            event: EventRef::game(i as i32 + 1),
            ..generate_new_vote(*rater_id, *rated_id, *value, start + Duration::seconds(i as i64))
        };
        store.insert_vote(&vote).await.unwrap();
    }
}

async fn code_and_value(store: &impl RatingStore, player_id: i32) -> (String, i32) {
    let state = store.rating(player_id).await.unwrap().unwrap();
    (state.code(), state.value)
}

#[tokio::test]
async fn test_upgrade_then_update() {
    init_test_env();
    let store = store_with(&[(1, "L:3", 10), (2, "P:1", 6)], Utc::now()).await;
    cast(&store, &[(2, 1, 3.0), (2, 1, 3.0)]).await;

    let report = GradeSystem::setup()
        .update_players_rating(&store, &BatchOptions::default())
        .await
        .unwrap();

    assert_eq!(code_and_value(&store, 1).await, ("M:1".to_string(), 3));
    assert_eq!(report.stats.upgraded, 1);
    assert_eq!(report.stats.updated, 1);
    assert_eq!(report.stats.idle_players, 1);
    assert_eq!(report.grade_changes.len(), 1);

    let change = &report.grade_changes[0];
    assert_eq!(change.kind, GradeChangeKind::Upgrade);
    assert_eq!(change.previous_code, "L:3");
    assert_eq!(change.current_code, "M:1");
}

#[tokio::test]
async fn test_downgrade_resets_to_max() {
    init_test_env();
    let store = store_with(&[(1, "M:1", 1), (2, "P:1", 6)], Utc::now()).await;
    cast(&store, &[(2, 1, -3.0)]).await;

    let report = GradeSystem::setup()
        .update_players_rating(&store, &BatchOptions::default())
        .await
        .unwrap();

    assert_eq!(code_and_value(&store, 1).await, ("L:3".to_string(), 12));
    assert_eq!(report.stats.downgraded, 1);
    assert_eq!(report.grade_changes[0].kind, GradeChangeKind::Downgrade);
}

#[tokio::test]
async fn test_ladder_ends_clamp() {
    init_test_env();
    let store = store_with(&[(1, "L:1", 0), (2, "P:3", 12), (3, "H:2", 6)], Utc::now()).await;
    cast(&store, &[(3, 1, -1.0), (3, 2, 1.0)]).await;

    let report = GradeSystem::setup()
        .update_players_rating(&store, &BatchOptions::default())
        .await
        .unwrap();

    assert_eq!(code_and_value(&store, 1).await, ("L:1".to_string(), 0));
    assert_eq!(code_and_value(&store, 2).await, ("P:3".to_string(), 12));
    assert_eq!(report.stats.updated, 2);
    assert_eq!(report.stats.clamped, 2);
    assert!(report.grade_changes.is_empty());
    assert!(store.pending_votes().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_rerun_applies_nothing() {
    init_test_env();
    let store = store_with(&[(1, "M:2", 6), (2, "H:1", 6)], Utc::now()).await;
    cast(&store, &[(2, 1, 1.0), (1, 2, -0.5)]).await;
    let system = GradeSystem::setup();

    let first = system.update_players_rating(&store, &BatchOptions::default()).await.unwrap();
    let after_first = (code_and_value(&store, 1).await, code_and_value(&store, 2).await);
    let second = system.update_players_rating(&store, &BatchOptions::default()).await.unwrap();

    assert_eq!(first.stats.applied(), 2);
    assert_eq!(second.stats.applied(), 0);
    assert_eq!(second.stats.idle_players, 2);
    assert_eq!(
        (code_and_value(&store, 1).await, code_and_value(&store, 2).await),
        after_first
    );
}

#[tokio::test]
async fn test_confirm_votes_leave_rating_untouched() {
    init_test_env();
    let then = Utc::now() - Duration::days(5);
    let store = store_with(&[(1, "M:2", 4), (2, "H:1", 6)], then).await;
    cast(&store, &[(2, 1, 0.0), (2, 1, 0.0)]).await;

    let report = GradeSystem::setup()
        .update_players_rating(&store, &BatchOptions::default())
        .await
        .unwrap();

    assert_eq!(report.stats.unchanged, 2);
    assert_eq!(store.rating(1).await.unwrap(), Some(generate_rating_state(1, "M:2", 4, then)));
    assert!(store.pending_votes().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_half_votes_are_symmetric() {
    init_test_env();
    let store = store_with(&[(1, "L:2", 6), (2, "H:2", 6)], Utc::now()).await;
    cast(&store, &[(2, 1, 0.5), (2, 1, -0.5)]).await;

    GradeSystem::setup()
        .update_players_rating(&store, &BatchOptions::default())
        .await
        .unwrap();

    assert_eq!(code_and_value(&store, 1).await, ("L:2".to_string(), 6));
}

#[tokio::test]
async fn test_failed_player_does_not_block_others() {
    init_test_env();
    let inner = store_with(&[(1, "L:2", 6), (2, "L:2", 6), (3, "M:1", 6)], Utc::now()).await;
    cast(&inner, &[(3, 1, 1.0), (3, 2, 1.0), (3, 1, 1.0)]).await;
    let store = FlakyStore {
        inner,
        failing_player: 1
    };

    let report = GradeSystem::setup()
        .update_players_rating(&store, &BatchOptions::default())
        .await
        .unwrap();

    assert_eq!(report.stats.failed, 1);
    assert_eq!(report.stats.updated, 1);
    assert_eq!(code_and_value(&store, 1).await, ("L:2".to_string(), 6));
    assert_eq!(code_and_value(&store, 2).await, ("L:2".to_string(), 7));

    let pending = store.pending_votes().await.unwrap();
    assert_eq!(pending.len(), 2);
    assert!(pending.iter().all(|v| v.rated_id == 1));
}

#[tokio::test]
async fn test_stopped_batch_leaves_votes_pending() {
    init_test_env();
    let store = store_with(&[(1, "L:2", 6), (2, "L:2", 6), (3, "L:2", 6)], Utc::now()).await;
    cast(&store, &[(3, 1, 1.0), (3, 2, 1.0)]).await;
    let options = BatchOptions::default();
    options.stop.store(true, Ordering::SeqCst);

    let report = GradeSystem::setup().update_players_rating(&store, &options).await.unwrap();

    assert_eq!(report.stats.cancelled_players, 2);
    assert_eq!(report.stats.applied(), 0);
    assert_eq!(store.pending_votes().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_random_votes_stay_on_the_ladder() {
    init_test_env();
    let n_players = 12;
    let ladder = GradeLadder::setup();
    let store = MemoryStore::new();
    for player_id in 1..=n_players {
        store
            .create_rating(&generate_rating_state(player_id, "M:2", 6, Utc::now()))
            .await
            .unwrap();
    }
    for vote in generate_random_votes(n_players, 600, 42, Utc::now() - Duration::hours(1)) {
        store.insert_vote(&vote).await.unwrap();
    }

    let report = GradeSystem::setup()
        .update_players_rating(&store, &BatchOptions::default())
        .await
        .unwrap();

    assert_eq!(report.stats.applied(), 600);
    assert_eq!(report.stats.failed, 0);
    assert!(store.pending_votes().await.unwrap().is_empty());

    for player_id in 1..=n_players {
        let state = store.rating(player_id).await.unwrap().unwrap();
        assert!(state.tier(&ladder).is_ok());
        assert!((0..=12).contains(&state.value), "{} out of bounds", state.value);
    }
}

#[tokio::test]
async fn test_concurrency_does_not_change_results() {
    init_test_env();
    let n_players = 8;
    let votes = generate_random_votes(n_players, 300, 7, Utc::now() - Duration::hours(1));
    let mut results = Vec::new();

    for concurrency in [1, 8] {
        let store = MemoryStore::new();
        for player_id in 1..=n_players {
            store
                .create_rating(&generate_rating_state(player_id, "L:2", 6, Utc::now()))
                .await
                .unwrap();
        }
        for vote in &votes {
            store.insert_vote(vote).await.unwrap();
        }

        let options = BatchOptions {
            concurrency,
            ..BatchOptions::default()
        };
        GradeSystem::setup().update_players_rating(&store, &options).await.unwrap();

        let mut states = Vec::new();
        for player_id in 1..=n_players {
            states.push(code_and_value(&store, player_id).await);
        }
        results.push(states);
    }

    assert_eq!(results[0], results[1]);
}

#[tokio::test]
async fn test_overlapping_batches_apply_each_vote_once() {
    init_test_env();
    let n_players = 10;
    let store = MemoryStore::new();
    for player_id in 1..=n_players {
        store
            .create_rating(&generate_rating_state(player_id, "H:2", 6, Utc::now()))
            .await
            .unwrap();
    }
    let votes = generate_random_votes(n_players, 400, 11, Utc::now() - Duration::hours(1));
    for vote in &votes {
        store.insert_vote(vote).await.unwrap();
    }

    let system = GradeSystem::setup();
    let options = BatchOptions {
        concurrency: 8,
        ..BatchOptions::default()
    };
    let (first, second) = tokio::join!(
        system.update_players_rating(&store, &options),
        system.update_players_rating(&store, &options)
    );
    let (first, second) = (first.unwrap(), second.unwrap());

    assert_eq!(first.stats.applied() + second.stats.applied(), votes.len());
    assert_eq!(first.stats.failed + second.stats.failed, 0);
    assert!(store.pending_votes().await.unwrap().is_empty());
    assert!(store.votes().await.iter().all(|v| v.is_counted));

    // Same end state as applying every vote once, in order
    let sequential = MemoryStore::new();
    for player_id in 1..=n_players {
        sequential
            .create_rating(&generate_rating_state(player_id, "H:2", 6, Utc::now()))
            .await
            .unwrap();
    }
    for vote in &votes {
        sequential.insert_vote(vote).await.unwrap();
    }
    system.update_players_rating(&sequential, &BatchOptions::default()).await.unwrap();

    for player_id in 1..=n_players {
        assert_eq!(
            code_and_value(&store, player_id).await,
            code_and_value(&sequential, player_id).await
        );
    }
}

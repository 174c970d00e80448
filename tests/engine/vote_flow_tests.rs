use chrono::{Duration, Utc};
use grade_processor::{
    database::{error::StoreError, memory::MemoryStore, store::RatingStore},
    model::{
        ballot::{cast_vote, BallotError, VoteLimit, VoteRequest},
        player_setup::initialize_player_rating,
        rating_processor::BatchOptions,
        structures::{event_kind::EventRef, grade::Grade},
        GradeSystem
    }
};

use crate::common::init_test_env;

async fn registered_players(system: &GradeSystem) -> MemoryStore {
    let store = MemoryStore::new();
    let now = Utc::now() - Duration::days(1);

    initialize_player_rating(&store, &system.ladder, &system.policy, 1, Some(Grade::Pro), now)
        .await
        .unwrap();
    initialize_player_rating(&store, &system.ladder, &system.policy, 2, None, now)
        .await
        .unwrap();

    for event in [EventRef::game(1), EventRef::game(2)] {
        store.record_participation(1, event, now).await;
        store.record_participation(2, event, now).await;
    }

    store
}

#[tokio::test]
async fn test_cast_votes_are_applied_by_the_batch() {
    init_test_env();
    let system = GradeSystem::setup();
    let store = registered_players(&system).await;
    let now = Utc::now();

    for (event, direction) in [(EventRef::game(1), 1), (EventRef::game(2), 1)] {
        let request = VoteRequest {
            rater_id: 1,
            rated_id: 2,
            event,
            direction
        };
        cast_vote(&store, &system.ladder, &system.coefficients, &VoteLimit::default(), &request, now)
            .await
            .unwrap();
    }

    let report = system
        .update_players_rating(&store, &BatchOptions::default())
        .await
        .unwrap();

    // PRO rating LIGHT is worth 3 per vote, landing exactly on the maximum
    let state = store.rating(2).await.unwrap().unwrap();
    assert_eq!(report.stats.updated, 2);
    assert_eq!(report.stats.upgraded, 0);
    assert_eq!(state.code(), "L:2");
    assert_eq!(state.value, 12);
}

#[tokio::test]
async fn test_registering_twice_fails() {
    init_test_env();
    let system = GradeSystem::setup();
    let store = registered_players(&system).await;

    let result = initialize_player_rating(&store, &system.ladder, &system.policy, 2, None, Utc::now()).await;

    assert!(matches!(result, Err(StoreError::RatingExists(2))));
    assert_eq!(store.rating(1).await.unwrap().unwrap().code(), "P:2");
}

#[tokio::test]
async fn test_rejected_vote_is_not_stored() {
    init_test_env();
    let system = GradeSystem::setup();
    let store = registered_players(&system).await;
    let request = VoteRequest {
        rater_id: 2,
        rated_id: 2,
        event: EventRef::game(1),
        direction: 1
    };

    let result = cast_vote(
        &store,
        &system.ladder,
        &system.coefficients,
        &VoteLimit::default(),
        &request,
        Utc::now()
    )
    .await;

    assert!(matches!(result, Err(BallotError::SelfRating(2))));
    assert!(store.pending_votes().await.unwrap().is_empty());
}

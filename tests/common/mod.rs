use grade_processor::{
    database::{memory::MemoryStore, store::RatingStore},
    utils::test_utils::generate_rating_state
};
use chrono::{DateTime, Utc};
use std::sync::Once;

static INIT: Once = Once::new();

/// Initialize test environment with RUST_LOG=WARN
pub fn init_test_env() {
    INIT.call_once(|| {
        std::env::set_var("RUST_LOG", "warn");
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
    });
}

/// Memory store holding one rating per `(player_id, tier code, value)`.
pub async fn store_with(ratings: &[(i32, &str, i32)], updated_at: DateTime<Utc>) -> MemoryStore {
    let store = MemoryStore::new();

    for (player_id, code, value) in ratings {
        store
            .create_rating(&generate_rating_state(*player_id, code, *value, updated_at))
            .await
            .expect("Failed to create rating");
    }

    store
}

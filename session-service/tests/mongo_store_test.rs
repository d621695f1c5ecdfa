//! MongoDB session store tests.
//!
//! Run only when `TEST_MONGODB_URI` is set, e.g.
//! `TEST_MONGODB_URI=mongodb://localhost:27017 cargo test -p session-service --test mongo_store_test`.
//! Each test uses its own throwaway database.

use chrono::{Duration, TimeZone, Utc};
use session_service::models::{AnalysisSummary, Mood, Session, SessionMetadata};
use session_service::services::{MongoSessionStore, SessionStore, StoreError};
use uuid::Uuid;

async fn store() -> Option<MongoSessionStore> {
    let Ok(uri) = std::env::var("TEST_MONGODB_URI") else {
        eprintln!("Skipping test: TEST_MONGODB_URI is not set");
        return None;
    };
    let db_name = format!("session_test_{}", Uuid::new_v4().simple());
    let store = MongoSessionStore::connect(&uri, &db_name)
        .await
        .expect("Failed to connect to MongoDB");
    store
        .initialize_indexes()
        .await
        .expect("Failed to create indexes");
    Some(store)
}

fn session(session_id: &str, user_id: &str, mood: Mood, score: u8) -> Session {
    Session::new(
        session_id.to_string(),
        user_id.to_string(),
        "User: hello\nAssistant: hi there".to_string(),
        AnalysisSummary {
            overall_mood: mood,
            mood_score: score,
            stress_triggers: vec!["work".to_string()],
            suggestions: vec!["Rest".to_string()],
            key_topics: vec!["day".to_string()],
            ai_generated_summary: "A brief chat.".to_string(),
        },
        SessionMetadata {
            message_count: 2,
            session_duration: 3.0,
            model: "mock-model".to_string(),
            processing_time: 12,
        },
    )
}

#[tokio::test]
async fn save_and_find_round_trip() {
    let Some(store) = store().await else { return };

    let saved = store.save(session("s1", "u1", Mood::Mixed, 6)).await.unwrap();
    assert!(saved.id.is_some());

    let found = store.find_by_id("s1").await.unwrap().unwrap();
    assert_eq!(found.summary, saved.summary);
    assert_eq!(found.metadata, saved.metadata);
    assert_eq!(found.date, saved.date);
    assert_eq!(found.conversation_text, saved.conversation_text);

    store.drop_database().await.unwrap();
}

#[tokio::test]
async fn duplicate_session_id_is_rejected() {
    let Some(store) = store().await else { return };

    store.save(session("dup", "u1", Mood::Neutral, 5)).await.unwrap();
    let result = store.save(session("dup", "u1", Mood::Neutral, 5)).await;
    assert!(matches!(result, Err(StoreError::DuplicateId(_))));

    store.drop_database().await.unwrap();
}

#[tokio::test]
async fn listing_and_aggregation_follow_date_order() {
    let Some(store) = store().await else { return };
    let base = Utc::now() - Duration::days(2);

    for (i, (mood, score)) in [(Mood::Negative, 2), (Mood::Positive, 8), (Mood::Positive, 9)]
        .into_iter()
        .enumerate()
    {
        let mut s = session(&format!("s{}", i), "u1", mood, score);
        s.date = base + Duration::hours(i as i64);
        store.save(s).await.unwrap();
    }
    let mut old = session("old", "u1", Mood::Negative, 1);
    old.date = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
    store.save(old).await.unwrap();

    let page = store.find_by_user("u1", 2, 0).await.unwrap();
    assert_eq!(page.total, 4);
    let ids: Vec<_> = page.sessions.iter().map(|s| s.session_id.as_str()).collect();
    assert_eq!(ids, vec!["s2", "s1"]);

    let aggregate = store
        .aggregate_mood("u1", Utc::now() - Duration::days(30))
        .await
        .unwrap();
    assert_eq!(aggregate.count, 3);
    assert_eq!(aggregate.trend[0].score, 2);
    assert_eq!(aggregate.trend[2].score, 9);
    assert_eq!(aggregate.mood_distribution.get(&Mood::Positive), Some(&2));

    let empty = store.aggregate_mood("nobody", base).await.unwrap();
    assert_eq!(empty.count, 0);
    assert_eq!(empty.average_score, 0.0);

    store.drop_database().await.unwrap();
}

#[tokio::test]
async fn session_dated_exactly_at_window_start_is_counted() {
    let Some(store) = store().await else { return };
    let since = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();

    let mut edge = session("edge", "u1", Mood::Mixed, 6);
    edge.date = since;
    store.save(edge).await.unwrap();
    let mut before = session("before", "u1", Mood::Negative, 2);
    before.date = since - Duration::milliseconds(1);
    store.save(before).await.unwrap();

    let aggregate = store.aggregate_mood("u1", since).await.unwrap();
    assert_eq!(aggregate.count, 1);
    assert_eq!(aggregate.trend[0].date, since);
    assert_eq!(aggregate.trend[0].score, 6);

    store.drop_database().await.unwrap();
}

//! In-process session store for development and tests.

use super::{SessionStore, StoreError, prepare_for_save};
use crate::models::{MoodAggregate, MoodTrendPoint, Session, SessionPage, SessionSummaryView};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

/// Sessions kept in insertion order.
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<Vec<Session>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn save(&self, session: Session) -> Result<Session, StoreError> {
        let session = prepare_for_save(session)?;

        let mut sessions = self.sessions.write().await;
        if sessions.iter().any(|s| s.session_id == session.session_id) {
            return Err(StoreError::DuplicateId(session.session_id));
        }
        sessions.push(session.clone());
        Ok(session)
    }

    async fn find_by_id(&self, session_id: &str) -> Result<Option<Session>, StoreError> {
        let sessions = self.sessions.read().await;
        Ok(sessions.iter().find(|s| s.session_id == session_id).cloned())
    }

    async fn find_by_user(
        &self,
        user_id: &str,
        limit: u32,
        skip: u64,
    ) -> Result<SessionPage, StoreError> {
        let sessions = self.sessions.read().await;
        let mut owned: Vec<&Session> = sessions.iter().filter(|s| s.user_id == user_id).collect();
        // Stable: equal dates keep insertion order.
        owned.sort_by(|a, b| b.date.cmp(&a.date));

        let total = owned.len() as u64;
        let page = owned
            .into_iter()
            .skip(usize::try_from(skip).unwrap_or(usize::MAX))
            .take(limit as usize)
            .map(SessionSummaryView::from)
            .collect();

        Ok(SessionPage {
            sessions: page,
            total,
        })
    }

    async fn aggregate_mood(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> Result<MoodAggregate, StoreError> {
        let sessions = self.sessions.read().await;
        let mut points: Vec<MoodTrendPoint> = sessions
            .iter()
            .filter(|s| s.user_id == user_id && s.date >= since)
            .map(|s| MoodTrendPoint {
                date: s.date,
                mood: s.summary.overall_mood,
                score: s.summary.mood_score,
            })
            .collect();
        points.sort_by(|a, b| a.date.cmp(&b.date));

        Ok(MoodAggregate::from_points(points))
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Mood;
    use crate::services::store::test_support::{dated, session};
    use chrono::{Duration, TimeZone};

    #[tokio::test]
    async fn duplicate_session_id_is_rejected() {
        let store = InMemorySessionStore::new();
        store.save(session("s1", "u1", Mood::Positive, 8)).await.unwrap();

        let result = store.save(session("s1", "u2", Mood::Negative, 2)).await;
        assert!(matches!(result, Err(StoreError::DuplicateId(id)) if id == "s1"));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn find_by_id_returns_stored_record() {
        let store = InMemorySessionStore::new();
        let saved = store.save(session("s1", "u1", Mood::Mixed, 6)).await.unwrap();

        let found = store.find_by_id("s1").await.unwrap().unwrap();
        assert_eq!(found.date, saved.date);
        assert_eq!(found.summary, saved.summary);
        assert!(store.find_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn listing_is_newest_first_with_stable_ties() {
        let store = InMemorySessionStore::new();
        let base = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();

        store.save(dated(session("old", "u1", Mood::Neutral, 5), base)).await.unwrap();
        store
            .save(dated(session("tie-a", "u1", Mood::Neutral, 5), base + Duration::hours(1)))
            .await
            .unwrap();
        store
            .save(dated(session("tie-b", "u1", Mood::Neutral, 5), base + Duration::hours(1)))
            .await
            .unwrap();
        store.save(dated(session("other", "u2", Mood::Neutral, 5), base)).await.unwrap();

        let page = store.find_by_user("u1", 10, 0).await.unwrap();
        let ids: Vec<_> = page.sessions.iter().map(|s| s.session_id.as_str()).collect();
        assert_eq!(ids, vec!["tie-a", "tie-b", "old"]);
        assert_eq!(page.total, 3);

        let page = store.find_by_user("u1", 1, 1).await.unwrap();
        assert_eq!(page.sessions.len(), 1);
        assert_eq!(page.sessions[0].session_id, "tie-b");
        assert_eq!(page.total, 3);
    }

    #[tokio::test]
    async fn empty_window_aggregates_to_zero() {
        let store = InMemorySessionStore::new();
        let aggregate = store.aggregate_mood("nobody", Utc::now()).await.unwrap();
        assert_eq!(aggregate, MoodAggregate::default());
    }

    #[tokio::test]
    async fn aggregate_respects_window_and_orders_ascending() {
        let store = InMemorySessionStore::new();
        let now = Utc::now();

        store
            .save(dated(session("ancient", "u1", Mood::Negative, 1), now - Duration::days(60)))
            .await
            .unwrap();
        store
            .save(dated(session("recent", "u1", Mood::Positive, 9), now - Duration::days(1)))
            .await
            .unwrap();
        store
            .save(dated(session("older", "u1", Mood::Negative, 4), now - Duration::days(5)))
            .await
            .unwrap();

        let aggregate = store
            .aggregate_mood("u1", now - Duration::days(30))
            .await
            .unwrap();
        assert_eq!(aggregate.count, 2);
        assert!((aggregate.average_score - 6.5).abs() < f64::EPSILON);
        assert_eq!(aggregate.trend[0].score, 4);
        assert_eq!(aggregate.trend[1].score, 9);
        assert_eq!(aggregate.mood_distribution.get(&Mood::Negative), Some(&1));
    }

    #[tokio::test]
    async fn session_dated_exactly_at_window_start_is_counted() {
        let store = InMemorySessionStore::new();
        let since = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();

        store
            .save(dated(session("edge", "u1", Mood::Mixed, 6), since))
            .await
            .unwrap();
        store
            .save(dated(
                session("before", "u1", Mood::Negative, 2),
                since - Duration::milliseconds(1),
            ))
            .await
            .unwrap();

        let aggregate = store.aggregate_mood("u1", since).await.unwrap();
        assert_eq!(aggregate.count, 1);
        assert_eq!(aggregate.trend[0].date, since);
        assert_eq!(aggregate.trend[0].score, 6);
    }
}

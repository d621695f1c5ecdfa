//! MongoDB-backed session store.

use super::{SessionStore, StoreError, prepare_for_save};
use crate::models::{Mood, MoodAggregate, MoodTrendPoint, Session, SessionPage, SessionSummaryView};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::{
    Client as MongoClient, Collection, Database, IndexModel,
    bson::{DateTime as BsonDateTime, doc},
    error::{ErrorKind, WriteFailure},
    options::{FindOptions, IndexOptions},
};
use serde::Deserialize;

const SESSIONS_COLLECTION: &str = "sessions";
const DUPLICATE_KEY_CODE: i32 = 11000;

#[derive(Clone)]
pub struct MongoSessionStore {
    client: MongoClient,
    db: Database,
}

/// Projection of a session used for mood aggregation.
#[derive(Debug, Deserialize)]
struct MoodSample {
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    date: DateTime<Utc>,
    summary: MoodSampleSummary,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MoodSampleSummary {
    overall_mood: Mood,
    mood_score: u8,
}

fn database_error(operation: &'static str, e: mongodb::error::Error) -> StoreError {
    tracing::error!(operation, "MongoDB operation failed: {}", e);
    crate::services::metrics::record_store_error(operation);
    StoreError::Database(e.to_string())
}

fn is_duplicate_key(e: &mongodb::error::Error) -> bool {
    matches!(
        e.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(we)) if we.code == DUPLICATE_KEY_CODE
    )
}

impl MongoSessionStore {
    pub async fn connect(uri: &str, database: &str) -> Result<Self, StoreError> {
        tracing::info!("Connecting to MongoDB");
        let client = MongoClient::with_uri_str(uri)
            .await
            .map_err(|e| database_error("connect", e))?;
        let db = client.database(database);
        tracing::info!(database = %database, "Connected to MongoDB database");
        Ok(Self { client, db })
    }

    pub async fn initialize_indexes(&self) -> Result<(), StoreError> {
        tracing::info!("Creating MongoDB indexes for session-service");
        let sessions = self.sessions();

        let indexes = [
            ("session_id_idx", doc! { "sessionId": 1 }, true),
            ("user_date_idx", doc! { "userId": 1, "date": -1 }, false),
            ("mood_date_idx", doc! { "summary.overallMood": 1, "date": -1 }, false),
        ];

        for (name, keys, unique) in indexes {
            let index = IndexModel::builder()
                .keys(keys)
                .options(
                    IndexOptions::builder()
                        .name(name.to_string())
                        .unique(unique)
                        .build(),
                )
                .build();

            sessions
                .create_index(index, None)
                .await
                .map_err(|e| database_error("create_index", e))?;
        }

        tracing::info!("Successfully created session indexes");
        Ok(())
    }

    pub fn sessions(&self) -> Collection<Session> {
        self.db.collection(SESSIONS_COLLECTION)
    }

    /// Drop the backing database. Used by tests against throwaway databases.
    pub async fn drop_database(&self) -> Result<(), StoreError> {
        self.db
            .drop(None)
            .await
            .map_err(|e| database_error("drop_database", e))
    }
}

#[async_trait]
impl SessionStore for MongoSessionStore {
    #[tracing::instrument(skip(self, session), fields(session_id = %session.session_id))]
    async fn save(&self, session: Session) -> Result<Session, StoreError> {
        let mut session = prepare_for_save(session)?;
        session.id = None;

        let result = self.sessions().insert_one(&session, None).await.map_err(|e| {
            if is_duplicate_key(&e) {
                StoreError::DuplicateId(session.session_id.clone())
            } else {
                database_error("insert_session", e)
            }
        })?;

        session.id = result.inserted_id.as_object_id();
        Ok(session)
    }

    #[tracing::instrument(skip(self))]
    async fn find_by_id(&self, session_id: &str) -> Result<Option<Session>, StoreError> {
        self.sessions()
            .find_one(doc! { "sessionId": session_id }, None)
            .await
            .map_err(|e| database_error("find_session", e))
    }

    #[tracing::instrument(skip(self))]
    async fn find_by_user(
        &self,
        user_id: &str,
        limit: u32,
        skip: u64,
    ) -> Result<SessionPage, StoreError> {
        let filter = doc! { "userId": user_id };

        let options = FindOptions::builder()
            .sort(doc! { "date": -1, "_id": 1 })
            .skip(skip)
            .limit(i64::from(limit))
            .projection(doc! { "conversationText": 0 })
            .build();

        let sessions: Vec<Session> = self
            .sessions()
            .find(filter.clone(), options)
            .await
            .map_err(|e| database_error("find_user_sessions", e))?
            .try_collect()
            .await
            .map_err(|e| database_error("find_user_sessions", e))?;

        let total = self
            .sessions()
            .count_documents(filter, None)
            .await
            .map_err(|e| database_error("count_user_sessions", e))?;

        Ok(SessionPage {
            sessions: sessions.iter().map(SessionSummaryView::from).collect(),
            total,
        })
    }

    #[tracing::instrument(skip(self))]
    async fn aggregate_mood(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> Result<MoodAggregate, StoreError> {
        let filter = doc! {
            "userId": user_id,
            "date": { "$gte": BsonDateTime::from_millis(since.timestamp_millis()) }
        };

        let options = FindOptions::builder()
            .sort(doc! { "date": 1, "_id": 1 })
            .projection(doc! { "date": 1, "summary.overallMood": 1, "summary.moodScore": 1 })
            .build();

        let samples: Vec<MoodSample> = self
            .sessions()
            .clone_with_type::<MoodSample>()
            .find(filter, options)
            .await
            .map_err(|e| database_error("aggregate_mood", e))?
            .try_collect()
            .await
            .map_err(|e| database_error("aggregate_mood", e))?;

        let points = samples
            .into_iter()
            .map(|s| MoodTrendPoint {
                date: s.date,
                mood: s.summary.overall_mood,
                score: s.summary.mood_score,
            })
            .collect();

        Ok(MoodAggregate::from_points(points))
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        self.client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await
            .map_err(|e| database_error("ping", e))?;
        Ok(())
    }
}

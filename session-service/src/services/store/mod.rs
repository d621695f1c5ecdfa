//! Session persistence.
//!
//! [`SessionStore`] owns persisted sessions. Both backends enforce the same
//! rules: unique `sessionId`, record constraints checked before writing,
//! newest-first listing with insertion order breaking date ties.

mod memory;
mod mongo;

pub use memory::InMemorySessionStore;
pub use mongo::MongoSessionStore;

use crate::models::{MoodAggregate, Session, SessionPage};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Session {0} already exists")]
    DuplicateId(String),

    #[error("Session violates a record constraint: {0}")]
    ConstraintViolation(String),

    #[error("Database error: {0}")]
    Database(String),
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Persist a new session, generating `session_id` when empty.
    async fn save(&self, session: Session) -> Result<Session, StoreError>;

    async fn find_by_id(&self, session_id: &str) -> Result<Option<Session>, StoreError>;

    /// One page of a user's sessions, newest first, plus the user's total.
    async fn find_by_user(
        &self,
        user_id: &str,
        limit: u32,
        skip: u64,
    ) -> Result<SessionPage, StoreError>;

    /// Mood statistics over the user's sessions dated at or after `since`.
    async fn aggregate_mood(
        &self,
        user_id: &str,
        since: DateTime<Utc>,
    ) -> Result<MoodAggregate, StoreError>;

    async fn health_check(&self) -> Result<(), StoreError>;
}

/// Fill in a missing id, normalize the timestamp to the millisecond precision
/// the database keeps, and check record constraints.
pub(crate) fn prepare_for_save(mut session: Session) -> Result<Session, StoreError> {
    if session.session_id.trim().is_empty() {
        session.session_id = Uuid::new_v4().to_string();
    }
    if let Some(date) = DateTime::from_timestamp_millis(session.date.timestamp_millis()) {
        session.date = date;
    }
    session
        .check_constraints()
        .map_err(StoreError::ConstraintViolation)?;
    Ok(session)
}

//! Session orchestration: validate, analyze, persist, query.

use super::analysis::AnalysisEngine;
use super::error::SessionError;
use super::metrics;
use super::store::SessionStore;
use crate::dtos::{QuickMoodRequest, SaveSessionRequest};
use crate::models::{MoodAggregate, QuickMood, Session, SessionMetadata, SessionPage};
use chrono::{Duration, Utc};
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;
use validator::Validate;

pub const DEFAULT_PAGE_LIMIT: u32 = 10;
pub const MAX_PAGE_LIMIT: u32 = 100;
pub const MAX_ANALYTICS_DAYS: i64 = 3650;

/// A persisted session and the end-to-end time it took.
#[derive(Debug, Clone)]
pub struct SavedSession {
    pub session: Session,
    pub total_processing_time: i64,
}

#[derive(Clone)]
pub struct SessionService {
    engine: AnalysisEngine,
    store: Arc<dyn SessionStore>,
    analytics_default_days: i64,
}

impl SessionService {
    pub fn new(
        engine: AnalysisEngine,
        store: Arc<dyn SessionStore>,
        analytics_default_days: i64,
    ) -> Self {
        Self {
            engine,
            store,
            analytics_default_days,
        }
    }

    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    /// Validate, analyze and persist one transcript.
    #[tracing::instrument(skip(self, request), fields(user_id = tracing::field::Empty))]
    pub async fn save_session(
        &self,
        request: SaveSessionRequest,
    ) -> Result<SavedSession, SessionError> {
        let start = Instant::now();
        let validated = request.validate_all()?;
        tracing::Span::current().record("user_id", validated.user_id.as_str());

        let session_id = Uuid::new_v4().to_string();
        tracing::info!(session_id = %session_id, "Processing session");

        let message_count = validated
            .message_count
            .unwrap_or_else(|| count_messages(&validated.conversation_text));

        let analysis = self
            .engine
            .analyze(&validated.conversation_text, &validated.user_id)
            .await?;

        let session = Session::new(
            session_id,
            validated.user_id,
            validated.conversation_text,
            analysis.summary,
            SessionMetadata {
                message_count,
                session_duration: validated.session_duration,
                model: analysis.metadata.model,
                processing_time: analysis.metadata.processing_time,
            },
        );

        let session = self.store.save(session).await?;
        metrics::record_session_saved();

        let total_processing_time = start.elapsed().as_millis() as i64;
        tracing::info!(
            session_id = %session.session_id,
            total_processing_time,
            "Session saved"
        );

        Ok(SavedSession {
            session,
            total_processing_time,
        })
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_session(&self, session_id: &str) -> Result<Session, SessionError> {
        self.store
            .find_by_id(session_id)
            .await?
            .ok_or(SessionError::NotFound)
    }

    /// Returns the page with the effective `limit` and `skip`.
    #[tracing::instrument(skip(self))]
    pub async fn list_user_sessions(
        &self,
        user_id: &str,
        limit: Option<i64>,
        skip: Option<i64>,
    ) -> Result<(SessionPage, u32, u64), SessionError> {
        let limit = limit
            .map(|l| l.clamp(1, i64::from(MAX_PAGE_LIMIT)) as u32)
            .unwrap_or(DEFAULT_PAGE_LIMIT);
        let skip = match skip {
            None => 0,
            Some(s) if s >= 0 => s as u64,
            Some(_) => {
                return Err(SessionError::InvalidQuery(
                    "skip must be a non-negative integer".to_string(),
                ));
            }
        };

        let page = self.store.find_by_user(user_id, limit, skip).await?;
        Ok((page, limit, skip))
    }

    /// Mood analytics over the trailing `days` (default from configuration).
    /// Returns the effective window length with the aggregate.
    #[tracing::instrument(skip(self))]
    pub async fn mood_analytics(
        &self,
        user_id: &str,
        days: Option<i64>,
    ) -> Result<(i64, MoodAggregate), SessionError> {
        let days = days.unwrap_or(self.analytics_default_days);
        if !(1..=MAX_ANALYTICS_DAYS).contains(&days) {
            return Err(SessionError::InvalidQuery(format!(
                "days must be between 1 and {}",
                MAX_ANALYTICS_DAYS
            )));
        }

        let since = Utc::now() - Duration::days(days);
        let aggregate = self.store.aggregate_mood(user_id, since).await?;
        Ok((days, aggregate))
    }

    pub async fn quick_mood(&self, request: QuickMoodRequest) -> Result<QuickMood, SessionError> {
        request.validate()?;
        Ok(self.engine.quick_mood(&request.conversation_text).await)
    }
}

/// Lines carrying a speaker tag; at least 1.
pub fn count_messages(transcript: &str) -> u32 {
    let count = transcript
        .lines()
        .filter(|line| {
            !line.trim().is_empty() && (line.contains("User:") || line.contains("Assistant:"))
        })
        .count();
    u32::try_from(count).unwrap_or(u32::MAX).max(1)
}

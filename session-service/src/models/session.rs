//! Persisted conversation session with its analysis.

use super::analysis::{
    AnalysisSummary, MAX_KEY_TOPICS, MAX_KEY_TOPIC_CHARS, MAX_MOOD_SCORE, MAX_STRESS_TRIGGERS,
    MAX_STRESS_TRIGGER_CHARS, MAX_SUGGESTIONS, MAX_SUGGESTION_CHARS, MAX_SUMMARY_CHARS,
    MIN_MOOD_SCORE, Mood,
};
use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// Upper bound on stored transcript length, in characters.
pub const MAX_CONVERSATION_CHARS: usize = 50_000;

/// One analysed conversation. Append-only: created once, never updated.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    /// Unique session identifier.
    pub session_id: String,

    /// Caller-supplied owner id. Not checked against any user registry.
    pub user_id: String,

    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub date: DateTime<Utc>,

    /// Raw transcript, kept for audit. Omitted from list projections.
    #[serde(default)]
    pub conversation_text: String,

    pub summary: AnalysisSummary,

    pub metadata: SessionMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionMetadata {
    pub message_count: u32,
    /// Minutes.
    pub session_duration: f64,
    pub model: String,
    /// Milliseconds spent in analysis.
    pub processing_time: i64,
}

impl Session {
    pub fn new(
        session_id: String,
        user_id: String,
        conversation_text: String,
        summary: AnalysisSummary,
        metadata: SessionMetadata,
    ) -> Self {
        Self {
            id: None,
            session_id,
            user_id,
            date: Utc::now(),
            conversation_text,
            summary,
            metadata,
        }
    }

    /// Check the persisted-record constraints.
    ///
    /// Returns a description of the first violated constraint. Messages never
    /// include transcript content.
    pub fn check_constraints(&self) -> Result<(), String> {
        if self.session_id.trim().is_empty() {
            return Err("sessionId must not be empty".to_string());
        }
        if self.user_id.is_empty() {
            return Err("userId must not be empty".to_string());
        }
        if self.conversation_text.chars().count() > MAX_CONVERSATION_CHARS {
            return Err(format!(
                "conversationText exceeds {} characters",
                MAX_CONVERSATION_CHARS
            ));
        }

        let summary = &self.summary;
        if !(MIN_MOOD_SCORE..=MAX_MOOD_SCORE).contains(&summary.mood_score) {
            return Err(format!(
                "summary.moodScore {} is outside [{}, {}]",
                summary.mood_score, MIN_MOOD_SCORE, MAX_MOOD_SCORE
            ));
        }
        check_list(
            "summary.stressTriggers",
            &summary.stress_triggers,
            MAX_STRESS_TRIGGERS,
            MAX_STRESS_TRIGGER_CHARS,
        )?;
        check_list(
            "summary.suggestions",
            &summary.suggestions,
            MAX_SUGGESTIONS,
            MAX_SUGGESTION_CHARS,
        )?;
        check_list(
            "summary.keyTopics",
            &summary.key_topics,
            MAX_KEY_TOPICS,
            MAX_KEY_TOPIC_CHARS,
        )?;
        if summary.ai_generated_summary.is_empty()
            || summary.ai_generated_summary.chars().count() > MAX_SUMMARY_CHARS
        {
            return Err(format!(
                "summary.aiGeneratedSummary must be 1 to {} characters",
                MAX_SUMMARY_CHARS
            ));
        }

        if self.metadata.message_count < 1 {
            return Err("metadata.messageCount must be at least 1".to_string());
        }
        if !self.metadata.session_duration.is_finite() || self.metadata.session_duration < 0.0 {
            return Err("metadata.sessionDuration must be a non-negative number".to_string());
        }

        Ok(())
    }
}

fn check_list(field: &str, items: &[String], max_items: usize, max_chars: usize) -> Result<(), String> {
    if items.len() > max_items {
        return Err(format!("{} has more than {} entries", field, max_items));
    }
    if items.iter().any(|item| item.chars().count() > max_chars) {
        return Err(format!(
            "{} has an entry longer than {} characters",
            field, max_chars
        ));
    }
    Ok(())
}

/// List projection of a session: summary fields only, no transcript.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummaryView {
    pub session_id: String,
    pub user_id: String,
    pub date: DateTime<Utc>,
    pub overall_mood: Mood,
    pub mood_score: u8,
    pub message_count: u32,
    pub ai_generated_summary: String,
    pub suggestions: Vec<String>,
}

impl From<&Session> for SessionSummaryView {
    fn from(session: &Session) -> Self {
        Self {
            session_id: session.session_id.clone(),
            user_id: session.user_id.clone(),
            date: session.date,
            overall_mood: session.summary.overall_mood,
            mood_score: session.summary.mood_score,
            message_count: session.metadata.message_count,
            ai_generated_summary: session.summary.ai_generated_summary.clone(),
            suggestions: session.summary.suggestions.clone(),
        }
    }
}

/// One page of a user's sessions plus the user's total session count.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionPage {
    pub sessions: Vec<SessionSummaryView>,
    pub total: u64,
}

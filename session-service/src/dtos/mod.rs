//! Request and response bodies for the session HTTP API.

use crate::models::{
    AnalysisSummary, MAX_CONVERSATION_CHARS, Mood, MoodAggregate, QuickMood, Session,
    SessionMetadata, SessionPage, SessionSummaryView,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::borrow::Cow;
use std::collections::BTreeMap;
use validator::{Validate, ValidateLength, ValidationError, ValidationErrors};

const MIN_CONVERSATION_CHARS: u64 = 10;
const MAX_USER_ID_CHARS: u64 = 100;

// ============================================================================
// Requests
// ============================================================================

/// Body of `POST /api/session/save`.
///
/// Every field is a loose JSON value; `validate_all` reports wrong types as
/// field violations.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveSessionRequest {
    #[serde(default)]
    pub conversation_text: Value,

    #[serde(default)]
    pub user_id: Value,

    /// Minutes. Numbers or numeric strings.
    #[serde(default)]
    pub session_duration: Option<Value>,

    /// Positive integer. Numbers or numeric strings.
    #[serde(default)]
    pub message_count: Option<Value>,
}

/// A save request whose fields have been checked and converted.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedSave {
    pub conversation_text: String,
    pub user_id: String,
    pub session_duration: f64,
    pub message_count: Option<u32>,
}

impl SaveSessionRequest {
    /// Run every field check, collecting all violations.
    pub fn validate_all(&self) -> Result<ValidatedSave, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let conversation_text = match bounded_text(
            &self.conversation_text,
            MIN_CONVERSATION_CHARS,
            MAX_CONVERSATION_CHARS as u64,
        ) {
            Ok(text) => Some(text),
            Err(TextViolation::NotAString) => {
                errors.add(
                    "conversation_text",
                    violation("string", "Conversation text must be a string"),
                );
                None
            }
            Err(TextViolation::Length) => {
                errors.add(
                    "conversation_text",
                    violation(
                        "length",
                        "Conversation text must be between 10 and 50,000 characters",
                    ),
                );
                None
            }
        };

        let user_id = match bounded_text(&self.user_id, 1, MAX_USER_ID_CHARS) {
            Ok(id) => Some(id),
            Err(TextViolation::NotAString) => {
                errors.add("user_id", violation("string", "User ID must be a string"));
                None
            }
            Err(TextViolation::Length) => {
                errors.add(
                    "user_id",
                    violation(
                        "length",
                        "User ID is required and must be at most 100 characters",
                    ),
                );
                None
            }
        };

        let session_duration = match &self.session_duration {
            None => Some(0.0),
            Some(value) => non_negative_number(value),
        };
        if session_duration.is_none() {
            errors.add(
                "session_duration",
                violation("numeric", "Session duration must be a non-negative number"),
            );
        }

        let message_count = match &self.message_count {
            None => Some(None),
            Some(value) => positive_integer(value).map(Some),
        };
        if message_count.is_none() {
            errors.add(
                "message_count",
                violation("positive_integer", "Message count must be a positive integer"),
            );
        }

        match (conversation_text, user_id, session_duration, message_count) {
            (Some(conversation_text), Some(user_id), Some(session_duration), Some(message_count))
                if errors.is_empty() =>
            {
                Ok(ValidatedSave {
                    conversation_text,
                    user_id,
                    session_duration,
                    message_count,
                })
            }
            _ => Err(errors),
        }
    }
}

enum TextViolation {
    NotAString,
    Length,
}

/// A string whose character count lies in `min..=max`. Missing counts as empty.
fn bounded_text(value: &Value, min: u64, max: u64) -> Result<String, TextViolation> {
    let text = match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        _ => return Err(TextViolation::NotAString),
    };
    if text.validate_length(Some(min), Some(max), None) {
        Ok(text)
    } else {
        Err(TextViolation::Length)
    }
}

fn violation(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Borrowed(message));
    error
}

fn numeric(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) if !s.trim().is_empty() => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|n| n.is_finite())
}

fn non_negative_number(value: &Value) -> Option<f64> {
    numeric(value).filter(|n| *n >= 0.0)
}

fn positive_integer(value: &Value) -> Option<u32> {
    numeric(value)
        .filter(|n| n.fract() == 0.0 && *n >= 1.0 && *n <= f64::from(u32::MAX))
        .map(|n| n as u32)
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct QuickMoodRequest {
    #[serde(default)]
    #[validate(length(
        min = 10,
        max = 50000,
        message = "Conversation text must be between 10 and 50,000 characters"
    ))]
    pub conversation_text: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserSessionsQuery {
    pub limit: Option<i64>,
    pub skip: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnalyticsQuery {
    pub days: Option<i64>,
}

// ============================================================================
// Responses
// ============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub session_id: String,
    pub user_id: String,
    pub date: DateTime<Utc>,
    pub summary: AnalysisSummary,
    pub metadata: SessionResponseMetadata,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponseMetadata {
    pub message_count: u32,
    pub session_duration: f64,
    pub model: String,
    pub processing_time: i64,
    /// Milliseconds from request receipt to persisted record.
    pub total_processing_time: i64,
}

impl SessionResponse {
    pub fn new(session: Session, total_processing_time: i64) -> Self {
        Self {
            session_id: session.session_id,
            user_id: session.user_id,
            date: session.date,
            summary: session.summary,
            metadata: SessionResponseMetadata {
                message_count: session.metadata.message_count,
                session_duration: session.metadata.session_duration,
                model: session.metadata.model,
                processing_time: session.metadata.processing_time,
                total_processing_time,
            },
            message: "Session saved successfully".to_string(),
        }
    }
}

/// Full session minus the transcript.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDetailResponse {
    pub session_id: String,
    pub user_id: String,
    pub date: DateTime<Utc>,
    pub summary: AnalysisSummary,
    pub metadata: SessionMetadata,
    pub has_conversation_text: bool,
}

impl From<Session> for SessionDetailResponse {
    fn from(session: Session) -> Self {
        Self {
            has_conversation_text: !session.conversation_text.is_empty(),
            session_id: session.session_id,
            user_id: session.user_id,
            date: session.date,
            summary: session.summary,
            metadata: session.metadata,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummaryResponse {
    pub session_id: String,
    pub user_id: String,
    pub date: DateTime<Utc>,
    pub overall_mood: Mood,
    pub mood_score: u8,
    pub message_count: u32,
    pub ai_generated_summary: String,
    pub suggestions: Vec<String>,
}

impl From<SessionSummaryView> for SessionSummaryResponse {
    fn from(view: SessionSummaryView) -> Self {
        Self {
            session_id: view.session_id,
            user_id: view.user_id,
            date: view.date,
            overall_mood: view.overall_mood,
            mood_score: view.mood_score,
            message_count: view.message_count,
            ai_generated_summary: view.ai_generated_summary,
            suggestions: view.suggestions,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total: u64,
    pub limit: u32,
    pub skip: u64,
    pub has_more: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserSessionsResponse {
    pub sessions: Vec<SessionSummaryResponse>,
    pub pagination: Pagination,
}

impl UserSessionsResponse {
    pub fn new(page: SessionPage, limit: u32, skip: u64) -> Self {
        Self {
            pagination: Pagination {
                total: page.total,
                limit,
                skip,
                has_more: page.total > skip.saturating_add(u64::from(limit)),
            },
            sessions: page.sessions.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MoodTrendEntry {
    /// `YYYY-MM-DD`, UTC.
    pub date: String,
    pub mood: Mood,
    pub score: u8,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoodAnalyticsResponse {
    pub period: String,
    pub total_sessions: u64,
    pub average_mood_score: f64,
    pub mood_distribution: BTreeMap<Mood, u64>,
    pub mood_trend: Vec<MoodTrendEntry>,
}

impl MoodAnalyticsResponse {
    pub fn new(days: i64, aggregate: MoodAggregate) -> Self {
        Self {
            period: format!("{} days", days),
            total_sessions: aggregate.count,
            average_mood_score: (aggregate.average_score * 100.0).round() / 100.0,
            mood_distribution: aggregate.mood_distribution,
            mood_trend: aggregate
                .trend
                .into_iter()
                .map(|point| MoodTrendEntry {
                    date: point.date.format("%Y-%m-%d").to_string(),
                    mood: point.mood,
                    score: point.score,
                })
                .collect(),
        }
    }
}

pub type QuickMoodResponse = QuickMood;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MoodTrendPoint;
    use chrono::TimeZone;
    use serde_json::json;

    fn request(text_len: usize) -> SaveSessionRequest {
        SaveSessionRequest {
            conversation_text: json!("x".repeat(text_len)),
            user_id: json!("u1"),
            ..Default::default()
        }
    }

    fn fields(errors: &ValidationErrors) -> Vec<String> {
        let mut fields: Vec<String> = errors.field_errors().keys().map(|k| k.to_string()).collect();
        fields.sort();
        fields
    }

    #[test]
    fn conversation_length_bounds() {
        let errors = request(9).validate_all().unwrap_err();
        assert_eq!(fields(&errors), vec!["conversation_text"]);

        assert!(request(10).validate_all().is_ok());
        assert!(request(50_000).validate_all().is_ok());
        assert!(request(50_001).validate_all().is_err());
    }

    #[test]
    fn every_violation_is_listed() {
        let req = SaveSessionRequest {
            conversation_text: json!("short"),
            user_id: json!("u".repeat(101)),
            session_duration: Some(json!("ten")),
            message_count: Some(json!(0)),
        };
        let errors = req.validate_all().unwrap_err();
        assert_eq!(
            fields(&errors),
            vec!["conversation_text", "message_count", "session_duration", "user_id"]
        );
    }

    #[test]
    fn wrong_types_are_reported_per_field() {
        let req = SaveSessionRequest {
            conversation_text: json!("short"),
            user_id: json!(42),
            ..Default::default()
        };
        let errors = req.validate_all().unwrap_err();
        let field_errors = errors.field_errors();
        assert_eq!(field_errors["user_id"][0].code, "string");
        assert_eq!(field_errors["conversation_text"][0].code, "length");

        let missing = SaveSessionRequest::default().validate_all().unwrap_err();
        assert_eq!(fields(&missing), vec!["conversation_text", "user_id"]);
        assert_eq!(missing.field_errors()["user_id"][0].code, "length");
    }

    #[test]
    fn validated_request_carries_text_fields() {
        let validated = request(12).validate_all().unwrap();
        assert_eq!(validated.conversation_text, "x".repeat(12));
        assert_eq!(validated.user_id, "u1");
    }

    #[test]
    fn optional_fields_accept_numbers_and_numeric_strings() {
        let mut req = request(20);
        req.session_duration = Some(json!("12.5"));
        req.message_count = Some(json!(4));
        let validated = req.validate_all().unwrap();
        assert_eq!(validated.session_duration, 12.5);
        assert_eq!(validated.message_count, Some(4));

        req.message_count = Some(json!("7"));
        assert_eq!(req.validate_all().unwrap().message_count, Some(7));
    }

    #[test]
    fn absent_optionals_default() {
        let validated = request(20).validate_all().unwrap();
        assert_eq!(validated.session_duration, 0.0);
        assert_eq!(validated.message_count, None);
    }

    #[test]
    fn fractional_or_negative_counts_are_rejected() {
        for bad in [json!(2.5), json!(-1), json!("abc"), json!(true)] {
            let mut req = request(20);
            req.message_count = Some(bad);
            assert!(req.validate_all().is_err());
        }

        let mut req = request(20);
        req.session_duration = Some(json!(-3));
        assert!(req.validate_all().is_err());
    }

    #[test]
    fn has_more_reflects_remaining_sessions() {
        let page = SessionPage {
            sessions: vec![],
            total: 12,
        };
        assert!(UserSessionsResponse::new(page.clone(), 10, 0).pagination.has_more);
        assert!(!UserSessionsResponse::new(page, 10, 2).pagination.has_more);
    }

    #[test]
    fn analytics_rounds_and_formats_dates() {
        let aggregate = MoodAggregate::from_points(vec![
            MoodTrendPoint {
                date: Utc.with_ymd_and_hms(2024, 6, 1, 23, 59, 0).unwrap(),
                mood: Mood::Positive,
                score: 7,
            },
            MoodTrendPoint {
                date: Utc.with_ymd_and_hms(2024, 6, 2, 8, 0, 0).unwrap(),
                mood: Mood::Negative,
                score: 3,
            },
            MoodTrendPoint {
                date: Utc.with_ymd_and_hms(2024, 6, 3, 8, 0, 0).unwrap(),
                mood: Mood::Negative,
                score: 3,
            },
        ]);

        let response = MoodAnalyticsResponse::new(30, aggregate);
        assert_eq!(response.period, "30 days");
        assert_eq!(response.average_mood_score, 4.33);
        assert_eq!(response.mood_trend[0].date, "2024-06-01");

        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["moodDistribution"]["negative"], 2);
        assert_eq!(value["moodDistribution"]["positive"], 1);
        assert_eq!(value["totalSessions"], 3);
    }

    #[test]
    fn detail_flags_transcript_presence() {
        let mut session = crate::services::store::test_support::session(
            "s1",
            "u1",
            Mood::Neutral,
            5,
        );
        let detail = SessionDetailResponse::from(session.clone());
        assert!(detail.has_conversation_text);

        session.conversation_text.clear();
        let value = serde_json::to_value(SessionDetailResponse::from(session)).unwrap();
        assert_eq!(value["hasConversationText"], false);
        assert!(value.get("conversationText").is_none());
    }
}

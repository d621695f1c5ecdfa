//! Structured analysis of a conversation transcript.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Maximum number of stress triggers kept from a model response.
pub const MAX_STRESS_TRIGGERS: usize = 5;
/// Maximum characters per stress trigger.
pub const MAX_STRESS_TRIGGER_CHARS: usize = 500;
/// Maximum number of suggestions kept from a model response.
pub const MAX_SUGGESTIONS: usize = 5;
/// Maximum characters per suggestion.
pub const MAX_SUGGESTION_CHARS: usize = 1000;
/// Maximum number of key topics kept from a model response.
pub const MAX_KEY_TOPICS: usize = 10;
/// Maximum characters per key topic.
pub const MAX_KEY_TOPIC_CHARS: usize = 100;
/// Maximum characters of the narrative summary.
pub const MAX_SUMMARY_CHARS: usize = 2000;

pub const MIN_MOOD_SCORE: u8 = 1;
pub const MAX_MOOD_SCORE: u8 = 10;
pub const DEFAULT_MOOD_SCORE: u8 = 5;

/// Dominant emotional tone of a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Positive,
    #[default]
    Neutral,
    Negative,
    Mixed,
}

impl Mood {
    pub const ALL: [Mood; 4] = [Mood::Positive, Mood::Neutral, Mood::Negative, Mood::Mixed];

    pub fn as_str(&self) -> &'static str {
        match self {
            Mood::Positive => "positive",
            Mood::Neutral => "neutral",
            Mood::Negative => "negative",
            Mood::Mixed => "mixed",
        }
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Exact, case-sensitive match against the four mood literals.
impl FromStr for Mood {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Mood::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| format!("Invalid mood: {}", s))
    }
}

/// The validated analysis fields, without processing metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisSummary {
    pub overall_mood: Mood,
    pub mood_score: u8,
    pub stress_triggers: Vec<String>,
    pub suggestions: Vec<String>,
    pub key_topics: Vec<String>,
    pub ai_generated_summary: String,
}

/// How the analysis was produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisMetadata {
    /// Wall-clock time of prompt, model call and parsing, in milliseconds.
    pub processing_time: i64,
    pub model: String,
    pub user_id: String,
}

/// Analysis summary plus metadata, as returned by the analysis engine.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisResult {
    pub summary: AnalysisSummary,
    pub metadata: AnalysisMetadata,
}

/// Lightweight mood assessment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuickMood {
    pub overall_mood: Mood,
    pub mood_score: u8,
}

impl Default for QuickMood {
    fn default() -> Self {
        Self {
            overall_mood: Mood::Neutral,
            mood_score: DEFAULT_MOOD_SCORE,
        }
    }
}

//! Domain models for the session service.

pub mod analysis;
pub mod analytics;
pub mod session;

pub use analysis::{AnalysisMetadata, AnalysisResult, AnalysisSummary, Mood, QuickMood};
pub use analytics::{MoodAggregate, MoodTrendPoint};
pub use session::{
    MAX_CONVERSATION_CHARS, Session, SessionMetadata, SessionPage, SessionSummaryView,
};

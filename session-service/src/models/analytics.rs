//! Mood aggregation over a time window.

use super::analysis::Mood;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// A single point on a user's mood timeline.
#[derive(Debug, Clone, PartialEq)]
pub struct MoodTrendPoint {
    pub date: DateTime<Utc>,
    pub mood: Mood,
    pub score: u8,
}

/// Aggregated mood statistics for one user over a window.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MoodAggregate {
    pub count: u64,
    /// Arithmetic mean of mood scores; 0 for an empty window.
    pub average_score: f64,
    /// Sessions per mood. Moods with no sessions are absent.
    pub mood_distribution: BTreeMap<Mood, u64>,
    /// Ascending by date.
    pub trend: Vec<MoodTrendPoint>,
}

impl MoodAggregate {
    /// Aggregate samples already ordered ascending by date.
    pub fn from_points(points: Vec<MoodTrendPoint>) -> Self {
        let mut aggregate = MoodAggregate::default();
        let mut score_total: u64 = 0;

        for point in &points {
            aggregate.count += 1;
            score_total += u64::from(point.score);
            *aggregate.mood_distribution.entry(point.mood).or_insert(0) += 1;
        }

        if aggregate.count > 0 {
            aggregate.average_score = score_total as f64 / aggregate.count as f64;
        }
        aggregate.trend = points;
        aggregate
    }
}

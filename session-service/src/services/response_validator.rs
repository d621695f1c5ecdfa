//! Validation of raw model output into an [`AnalysisSummary`].
//!
//! Model output is untrusted free text. Every field is checked on its own and
//! replaced by a fixed default when it does not conform, so callers always get
//! a complete record and never an error.

use crate::models::analysis::{
    AnalysisSummary, DEFAULT_MOOD_SCORE, MAX_KEY_TOPICS, MAX_KEY_TOPIC_CHARS, MAX_MOOD_SCORE,
    MAX_STRESS_TRIGGERS, MAX_STRESS_TRIGGER_CHARS, MAX_SUGGESTIONS, MAX_SUGGESTION_CHARS,
    MAX_SUMMARY_CHARS, MIN_MOOD_SCORE, Mood, QuickMood,
};
use serde_json::{Map, Value};

/// Summary used when the model supplies none.
pub const DEFAULT_SUMMARY: &str = "Conversation analyzed successfully.";

pub const FALLBACK_SUGGESTIONS: [&str; 3] = [
    "Continue expressing your feelings",
    "Practice mindfulness exercises",
    "Maintain regular sleep schedule",
];

pub const FALLBACK_KEY_TOPICS: [&str; 2] = ["general wellness", "emotional support"];

pub const FALLBACK_SUMMARY: &str = "The user engaged in a wellness conversation. Analysis details \
could not be fully processed, but the interaction shows positive engagement with mental health support.";

/// How a raw response was turned into a summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseOutcome {
    /// A JSON object was decoded and validated field by field.
    Parsed,
    /// The text contained no `{...}` span; the fallback record was used.
    NoJsonObject,
    /// A `{...}` span was found but did not decode to an object.
    InvalidJson,
}

impl ParseOutcome {
    pub fn is_fallback(&self) -> bool {
        !matches!(self, ParseOutcome::Parsed)
    }

    /// Metrics label for fallbacks.
    pub fn reason(&self) -> &'static str {
        match self {
            ParseOutcome::Parsed => "parsed",
            ParseOutcome::NoJsonObject => "no_json_object",
            ParseOutcome::InvalidJson => "invalid_json",
        }
    }
}

/// The deterministic record substituted for unparseable output.
pub fn fallback_analysis() -> AnalysisSummary {
    AnalysisSummary {
        overall_mood: Mood::Neutral,
        mood_score: DEFAULT_MOOD_SCORE,
        stress_triggers: Vec::new(),
        suggestions: FALLBACK_SUGGESTIONS.iter().map(|s| s.to_string()).collect(),
        key_topics: FALLBACK_KEY_TOPICS.iter().map(|s| s.to_string()).collect(),
        ai_generated_summary: FALLBACK_SUMMARY.to_string(),
    }
}

/// Parse raw model text into a summary. Never fails.
pub fn parse_analysis(raw: &str) -> AnalysisSummary {
    parse_with_outcome(raw).0
}

/// Parse raw model text, also reporting whether the fallback was used.
pub fn parse_with_outcome(raw: &str) -> (AnalysisSummary, ParseOutcome) {
    let object = match decode_object(raw) {
        Ok(object) => object,
        Err(outcome) => return (fallback_analysis(), outcome),
    };

    let summary = AnalysisSummary {
        overall_mood: validate_mood(object.get("overallMood")),
        mood_score: validate_mood_score(object.get("moodScore")),
        stress_triggers: bounded_strings(
            object.get("stressTriggers"),
            MAX_STRESS_TRIGGERS,
            MAX_STRESS_TRIGGER_CHARS,
        ),
        suggestions: bounded_strings(
            object.get("suggestions"),
            MAX_SUGGESTIONS,
            MAX_SUGGESTION_CHARS,
        ),
        key_topics: bounded_strings(object.get("keyTopics"), MAX_KEY_TOPICS, MAX_KEY_TOPIC_CHARS),
        ai_generated_summary: match object.get("aiGeneratedSummary") {
            Some(value) if is_truthy(value) => truncate_chars(&stringify(value), MAX_SUMMARY_CHARS),
            _ => DEFAULT_SUMMARY.to_string(),
        },
    };

    (summary, ParseOutcome::Parsed)
}

/// Parse a `{"mood": ..., "score": ...}` reply. Anything unusable yields
/// neutral/5.
pub fn parse_quick_mood(raw: &str) -> QuickMood {
    match decode_object(raw) {
        Ok(object) => QuickMood {
            overall_mood: validate_mood(object.get("mood")),
            mood_score: validate_mood_score(object.get("score")),
        },
        Err(_) => QuickMood::default(),
    }
}

/// Greedy span from the first `{` to the last `}`.
fn extract_object_span(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    (start < end).then(|| &raw[start..=end])
}

fn decode_object(raw: &str) -> Result<Map<String, Value>, ParseOutcome> {
    let span = extract_object_span(raw).ok_or(ParseOutcome::NoJsonObject)?;
    match serde_json::from_str::<Value>(span) {
        Ok(Value::Object(object)) => Ok(object),
        _ => Err(ParseOutcome::InvalidJson),
    }
}

/// Exact match against the four mood literals; anything else is neutral.
fn validate_mood(value: Option<&Value>) -> Mood {
    value
        .and_then(Value::as_str)
        .and_then(|s| s.parse().ok())
        .unwrap_or(Mood::Neutral)
}

/// Any value that coerces to an integer in [1, 10]. Anything else is 5.
///
/// Coercion is loose: `true` is 1, numeric strings parse after trimming, and
/// a one-element array takes its element's value.
fn validate_mood_score(value: Option<&Value>) -> u8 {
    match value.and_then(loose_number) {
        Some(n)
            if n.is_finite()
                && n.fract() == 0.0
                && n >= f64::from(MIN_MOOD_SCORE)
                && n <= f64::from(MAX_MOOD_SCORE) =>
        {
            n as u8
        }
        _ => DEFAULT_MOOD_SCORE,
    }
}

fn loose_number(value: &Value) -> Option<f64> {
    match value {
        Value::Null => Some(0.0),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Number(n) => n.as_f64(),
        Value::String(s) => numeric_text(s),
        Value::Array(items) => match items.as_slice() {
            [] => Some(0.0),
            [Value::Bool(_)] | [Value::Object(_)] => None,
            [only] => loose_number(only),
            _ => None,
        },
        Value::Object(_) => None,
    }
}

fn numeric_text(text: &str) -> Option<f64> {
    let text = text.trim();
    if text.is_empty() {
        return Some(0.0);
    }
    text.parse::<f64>().ok()
}

/// First `max_items` elements, each stringified and cut to `max_chars`.
/// Non-arrays yield an empty list.
fn bounded_strings(value: Option<&Value>, max_items: usize, max_chars: usize) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .take(max_items)
            .map(|item| truncate_chars(&stringify(item), max_chars))
            .collect(),
        _ => Vec::new(),
    }
}

fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::String(s) => !s.is_empty(),
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Cut `s` to at most `max_chars` characters.
pub fn truncate_chars(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn conformant() -> Value {
        json!({
            "overallMood": "negative",
            "moodScore": 3,
            "stressTriggers": ["exams", "sleep"],
            "suggestions": ["Take breaks", "Talk to a friend", "Go outside"],
            "keyTopics": ["school", "anxiety"],
            "aiGeneratedSummary": "The user is anxious about exams."
        })
    }

    #[test]
    fn text_without_object_yields_exact_fallback() {
        for raw in ["", "I cannot help with that.", "}{", "only a { brace"] {
            let (summary, outcome) = parse_with_outcome(raw);
            assert_eq!(summary, fallback_analysis(), "input {:?}", raw);
            assert_eq!(outcome, ParseOutcome::NoJsonObject);
        }
    }

    #[test]
    fn undecodable_object_yields_fallback() {
        let (summary, outcome) = parse_with_outcome("here: {overallMood: positive}");
        assert_eq!(summary, fallback_analysis());
        assert_eq!(outcome, ParseOutcome::InvalidJson);
        assert!(outcome.is_fallback());
    }

    #[test]
    fn fallback_record_contents() {
        let fallback = fallback_analysis();
        assert_eq!(fallback.overall_mood, Mood::Neutral);
        assert_eq!(fallback.mood_score, 5);
        assert!(fallback.stress_triggers.is_empty());
        assert_eq!(fallback.suggestions.len(), 3);
        assert_eq!(fallback.key_topics, vec!["general wellness", "emotional support"]);
        assert_eq!(fallback.ai_generated_summary, FALLBACK_SUMMARY);
    }

    #[test]
    fn conformant_object_keeps_every_value() {
        let raw = format!("Sure! Here is the analysis:\n```json\n{}\n```", conformant());
        let (summary, outcome) = parse_with_outcome(&raw);
        assert_eq!(outcome, ParseOutcome::Parsed);
        assert_eq!(summary.overall_mood, Mood::Negative);
        assert_eq!(summary.mood_score, 3);
        assert_eq!(summary.stress_triggers, vec!["exams", "sleep"]);
        assert_eq!(
            summary.suggestions,
            vec!["Take breaks", "Talk to a friend", "Go outside"]
        );
        assert_eq!(summary.key_topics, vec!["school", "anxiety"]);
        assert_eq!(summary.ai_generated_summary, "The user is anxious about exams.");
    }

    #[test]
    fn invalid_scores_become_five() {
        for score in [
            json!(0),
            json!(11),
            json!(-3),
            json!(7.5),
            json!("high"),
            json!(null),
            json!(false),
            json!([true]),
            json!([1, 2]),
            json!({"v": 7}),
        ] {
            let mut value = conformant();
            value["moodScore"] = score.clone();
            let summary = parse_analysis(&value.to_string());
            assert_eq!(summary.mood_score, 5, "score {}", score);
        }
    }

    #[test]
    fn numeric_scores_are_coerced() {
        for (score, expected) in [
            (json!("8"), 8),
            (json!(" 2 "), 2),
            (json!(10.0), 10),
            (json!(1), 1),
            (json!(true), 1),
            (json!([7]), 7),
            (json!(["9"]), 9),
        ] {
            let mut value = conformant();
            value["moodScore"] = score;
            assert_eq!(parse_analysis(&value.to_string()).mood_score, expected);
        }
    }

    #[test]
    fn unknown_or_miscased_mood_is_neutral() {
        for mood in [json!("Positive"), json!("happy"), json!(3), json!(null)] {
            let mut value = conformant();
            value["overallMood"] = mood;
            assert_eq!(parse_analysis(&value.to_string()).overall_mood, Mood::Neutral);
        }
    }

    #[test]
    fn long_lists_keep_first_entries_in_order() {
        let mut value = conformant();
        value["stressTriggers"] = json!(["t1", "t2", "t3", "t4", "t5", "t6", "t7", "t8"]);
        value["suggestions"] = json!(["s1", "s2", "s3", "s4", "s5", "s6"]);
        value["keyTopics"] = json!((1..=12).map(|i| format!("k{}", i)).collect::<Vec<_>>());

        let summary = parse_analysis(&value.to_string());
        assert_eq!(summary.stress_triggers, vec!["t1", "t2", "t3", "t4", "t5"]);
        assert_eq!(summary.suggestions, vec!["s1", "s2", "s3", "s4", "s5"]);
        assert_eq!(summary.key_topics.len(), 10);
        assert_eq!(summary.key_topics[0], "k1");
        assert_eq!(summary.key_topics[9], "k10");
    }

    #[test]
    fn list_entries_are_stringified_and_truncated() {
        let mut value = conformant();
        value["stressTriggers"] = json!(["a".repeat(600), 42, {"k": "v"}]);
        value["keyTopics"] = json!(["é".repeat(150)]);

        let summary = parse_analysis(&value.to_string());
        assert_eq!(summary.stress_triggers[0].chars().count(), 500);
        assert_eq!(summary.stress_triggers[1], "42");
        assert_eq!(summary.stress_triggers[2], r#"{"k":"v"}"#);
        assert_eq!(summary.key_topics[0], "é".repeat(100));
    }

    #[test]
    fn non_array_lists_are_empty() {
        let mut value = conformant();
        value["suggestions"] = json!("just breathe");
        value.as_object_mut().unwrap().remove("keyTopics");

        let summary = parse_analysis(&value.to_string());
        assert!(summary.suggestions.is_empty());
        assert!(summary.key_topics.is_empty());
    }

    #[test]
    fn falsy_summary_gets_default_sentence() {
        for summary in [json!(""), json!(null), json!(false), json!(0)] {
            let mut value = conformant();
            value["aiGeneratedSummary"] = summary;
            assert_eq!(parse_analysis(&value.to_string()).ai_generated_summary, DEFAULT_SUMMARY);
        }

        let mut value = conformant();
        value.as_object_mut().unwrap().remove("aiGeneratedSummary");
        assert_eq!(parse_analysis(&value.to_string()).ai_generated_summary, DEFAULT_SUMMARY);
    }

    #[test]
    fn long_summary_is_truncated() {
        let mut value = conformant();
        value["aiGeneratedSummary"] = json!("s".repeat(2500));
        assert_eq!(parse_analysis(&value.to_string()).ai_generated_summary.len(), 2000);
    }

    #[test]
    fn quick_mood_parses_and_defaults() {
        let mood = parse_quick_mood(r#"Result: {"mood": "positive", "score": 9}"#);
        assert_eq!(mood.overall_mood, Mood::Positive);
        assert_eq!(mood.mood_score, 9);

        let mood = parse_quick_mood(r#"{"mood": "ecstatic", "score": 42}"#);
        assert_eq!(mood, QuickMood::default());

        assert_eq!(parse_quick_mood("no idea"), QuickMood::default());
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("hi", 5), "hi");
        assert_eq!(truncate_chars("", 0), "");
    }
}

//! Prompt templates for conversation analysis.

const ANALYSIS_PREAMBLE: &str = "You are a compassionate AI wellness analyst. Analyze the following \
conversation between a user and a wellness chatbot and provide insights that help track the \
user's mental health journey.";

const ANALYSIS_SCHEMA: &str = r#"Respond with a single JSON object with exactly this structure:

{
  "overallMood": "positive|neutral|negative|mixed",
  "moodScore": <integer from 1 to 10, where 1 is very negative and 10 is very positive>,
  "stressTriggers": ["trigger1", "trigger2"],
  "suggestions": ["suggestion1", "suggestion2", "suggestion3"],
  "keyTopics": ["topic1", "topic2"],
  "aiGeneratedSummary": "A compassionate 2-3 sentence summary of the user's emotional state and main concerns"
}

Guidelines:
- overallMood: the dominant emotional tone of the conversation
- moodScore: overall positivity or negativity, in the context of mental health
- stressTriggers: specific things causing stress or anxiety (at most 5)
- suggestions: 3 to 5 actionable, gentle wellness suggestions
- keyTopics: main themes discussed (emotions, situations)
- aiGeneratedSummary: written as if briefing a mental health professional

Focus on empathy, actionable insights and respect for the user's emotional state. Do not make clinical diagnoses."#;

const QUICK_MOOD_INSTRUCTIONS: &str = "Briefly analyze this wellness conversation, rate the user's \
mood on a scale of 1 to 10 and categorize it.";

const QUICK_MOOD_SCHEMA: &str =
    r#"Respond with just: {"mood": "positive|neutral|negative|mixed", "score": <1-10>}"#;

/// Render the full analysis prompt. The transcript is embedded verbatim.
pub fn build_analysis_prompt(transcript: &str) -> String {
    format!(
        "{}\n\nCONVERSATION:\n{}\n\n{}",
        ANALYSIS_PREAMBLE, transcript, ANALYSIS_SCHEMA
    )
}

/// Render the short mood-only prompt.
pub fn build_quick_mood_prompt(transcript: &str) -> String {
    format!(
        "{}\n\nCONVERSATION:\n{}\n\n{}",
        QUICK_MOOD_INSTRUCTIONS, transcript, QUICK_MOOD_SCHEMA
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRANSCRIPT: &str = "User: I feel anxious\nAssistant: Let's breathe together";

    #[test]
    fn analysis_prompt_embeds_transcript_verbatim() {
        let prompt = build_analysis_prompt(TRANSCRIPT);
        assert!(prompt.contains(TRANSCRIPT));
        assert!(prompt.contains("CONVERSATION:\nUser: I feel anxious"));
    }

    #[test]
    fn analysis_prompt_names_every_field() {
        let prompt = build_analysis_prompt(TRANSCRIPT);
        for field in [
            "overallMood",
            "moodScore",
            "stressTriggers",
            "suggestions",
            "keyTopics",
            "aiGeneratedSummary",
        ] {
            assert!(prompt.contains(field), "missing {}", field);
        }
        assert!(prompt.contains("positive|neutral|negative|mixed"));
        assert!(prompt.contains("Do not make clinical diagnoses"));
    }

    #[test]
    fn prompt_is_deterministic() {
        assert_eq!(build_analysis_prompt(TRANSCRIPT), build_analysis_prompt(TRANSCRIPT));
    }

    #[test]
    fn long_transcripts_are_not_cut() {
        let transcript = "User: ".to_string() + &"a".repeat(49_000);
        let prompt = build_analysis_prompt(&transcript);
        assert!(prompt.contains(&transcript));
    }

    #[test]
    fn quick_mood_prompt_asks_for_mood_and_score() {
        let prompt = build_quick_mood_prompt(TRANSCRIPT);
        assert!(prompt.contains(TRANSCRIPT));
        assert!(prompt.contains(r#"{"mood":"#));
        assert!(prompt.contains(r#""score":"#));
    }
}

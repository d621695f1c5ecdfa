//! Mock text provider for tests and offline development.

use super::{FinishReason, GenerationParams, ProviderError, ProviderResponse, TextProvider};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Canned analysis returned when no reply is scripted.
pub const DEFAULT_MOCK_ANALYSIS: &str = r#"{
  "overallMood": "neutral",
  "moodScore": 6,
  "stressTriggers": [],
  "suggestions": ["Take a short walk", "Keep a gratitude journal"],
  "keyTopics": ["daily check-in"],
  "aiGeneratedSummary": "The user checked in and shared how their day went."
}"#;

/// Prompts retained for inspection; older ones are dropped.
pub const MAX_RECORDED_PROMPTS: usize = 16;

/// A scripted reply.
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Return this completion text.
    Text(String),
    /// Return this text as if generation hit the output token limit.
    Truncated(String),
    /// Fail with an API error carrying this message.
    Fail(String),
}

/// Mock text provider.
///
/// Scripted replies are consumed in order; once the queue is empty every call
/// gets the fallback reply.
pub struct MockTextProvider {
    model: String,
    queue: Mutex<VecDeque<MockReply>>,
    fallback: MockReply,
    delay: Duration,
    calls: AtomicUsize,
    prompts: Mutex<VecDeque<String>>,
    last_params: Mutex<Option<GenerationParams>>,
}

impl Default for MockTextProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTextProvider {
    pub fn new() -> Self {
        Self {
            model: "mock-model".to_string(),
            queue: Mutex::new(VecDeque::new()),
            fallback: MockReply::Text(DEFAULT_MOCK_ANALYSIS.to_string()),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(VecDeque::new()),
            last_params: Mutex::new(None),
        }
    }

    /// Always answer with `text`.
    pub fn replying(text: impl Into<String>) -> Self {
        Self::new().with_fallback(MockReply::Text(text.into()))
    }

    /// Always fail.
    pub fn failing(message: impl Into<String>) -> Self {
        Self::new().with_fallback(MockReply::Fail(message.into()))
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_fallback(mut self, reply: MockReply) -> Self {
        self.fallback = reply;
        self
    }

    /// Simulated latency per call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Queue a one-shot reply.
    pub fn push_reply(&self, reply: MockReply) {
        if let Ok(mut queue) = self.queue.lock() {
            queue.push_back(reply);
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// The most recent prompts, oldest first, at most [`MAX_RECORDED_PROMPTS`].
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .map(|p| p.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Parameters of the most recent call.
    pub fn last_params(&self) -> Option<GenerationParams> {
        self.last_params.lock().ok().and_then(|p| p.clone())
    }

    fn next_reply(&self) -> MockReply {
        self.queue
            .lock()
            .ok()
            .and_then(|mut q| q.pop_front())
            .unwrap_or_else(|| self.fallback.clone())
    }
}

#[async_trait]
impl TextProvider for MockTextProvider {
    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<ProviderResponse, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_params.lock() {
            *last = Some(params.clone());
        }
        if let Ok(mut prompts) = self.prompts.lock() {
            if prompts.len() == MAX_RECORDED_PROMPTS {
                prompts.pop_front();
            }
            prompts.push_back(prompt.to_string());
        }

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        match self.next_reply() {
            MockReply::Text(text) => Ok(ProviderResponse {
                output_tokens: text.len() as i32 / 4,
                text,
                input_tokens: prompt.len() as i32 / 4,
                finish_reason: FinishReason::Complete,
            }),
            MockReply::Truncated(text) => Ok(ProviderResponse {
                output_tokens: text.len() as i32 / 4,
                text,
                input_tokens: prompt.len() as i32 / 4,
                finish_reason: FinishReason::Length,
            }),
            MockReply::Fail(message) => Err(ProviderError::ApiError(message)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scripted_replies_then_fallback() {
        let provider = MockTextProvider::replying("fallback");
        provider.push_reply(MockReply::Text("first".to_string()));
        provider.push_reply(MockReply::Fail("boom".to_string()));

        let params = GenerationParams::default();
        assert_eq!(provider.generate("a", &params).await.unwrap().text, "first");
        assert!(provider.generate("b", &params).await.is_err());
        assert_eq!(provider.generate("c", &params).await.unwrap().text, "fallback");

        assert_eq!(provider.call_count(), 3);
        assert_eq!(provider.prompts(), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn recorded_prompts_are_capped_to_the_most_recent() {
        let provider = MockTextProvider::new();
        let params = GenerationParams::default();

        for i in 0..MAX_RECORDED_PROMPTS + 5 {
            provider.generate(&format!("p{}", i), &params).await.unwrap();
        }

        let prompts = provider.prompts();
        assert_eq!(prompts.len(), MAX_RECORDED_PROMPTS);
        assert_eq!(prompts[0], "p5");
        assert_eq!(
            prompts.last().map(String::as_str),
            Some(format!("p{}", MAX_RECORDED_PROMPTS + 4).as_str())
        );
        assert_eq!(provider.call_count(), MAX_RECORDED_PROMPTS + 5);
    }
}

//! Analysis engine: prompt, model call, validation, metadata.

use super::error::ModelInvocationError;
use super::metrics;
use super::prompt::{build_analysis_prompt, build_quick_mood_prompt};
use super::providers::{FinishReason, GenerationParams, TextProvider};
use super::response_validator::{ParseOutcome, parse_quick_mood, parse_with_outcome};
use crate::models::{AnalysisMetadata, AnalysisResult, QuickMood};
use std::sync::Arc;
use std::time::Instant;

/// Runs transcripts through the injected model provider.
///
/// The provider is chosen once at startup and is read-only afterwards.
#[derive(Clone)]
pub struct AnalysisEngine {
    provider: Arc<dyn TextProvider>,
    params: GenerationParams,
}

impl AnalysisEngine {
    pub fn new(provider: Arc<dyn TextProvider>) -> Self {
        Self {
            provider,
            params: GenerationParams {
                json_output: true,
                ..Default::default()
            },
        }
    }

    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.params.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<i32>) -> Self {
        self.params.max_tokens = max_tokens;
        self
    }

    pub fn model(&self) -> &str {
        self.provider.model()
    }

    /// Analyze a transcript.
    ///
    /// Fails only when the provider call fails; unusable model output is
    /// replaced by the fallback record.
    #[tracing::instrument(skip(self, transcript), fields(model = %self.provider.model(), transcript_chars = transcript.len()))]
    pub async fn analyze(
        &self,
        transcript: &str,
        user_id: &str,
    ) -> Result<AnalysisResult, ModelInvocationError> {
        let start = Instant::now();
        let model = self.provider.model().to_string();
        let prompt = build_analysis_prompt(transcript);

        let call_start = Instant::now();
        let response = self.provider.generate(&prompt, &self.params).await;
        metrics::record_provider_latency(&model, call_start.elapsed());

        let response = response.map_err(|source| {
            metrics::record_analysis(&model, "provider_error");
            ModelInvocationError {
                model: model.clone(),
                source,
            }
        })?;

        if response.finish_reason == FinishReason::Length {
            tracing::warn!(
                output_tokens = response.output_tokens,
                "Model response truncated at the output token limit"
            );
            metrics::record_truncation(&model);
        }

        let (summary, outcome) = parse_with_outcome(&response.text);
        if outcome.is_fallback() {
            tracing::warn!(
                reason = outcome.reason(),
                response_chars = response.text.len(),
                "Model response unusable, substituting fallback analysis"
            );
            metrics::record_fallback(outcome.reason());
            metrics::record_analysis(&model, "fallback");
        } else {
            metrics::record_analysis(&model, ParseOutcome::Parsed.reason());
        }

        let processing_time = start.elapsed().as_millis() as i64;
        tracing::debug!(
            processing_time,
            input_tokens = response.input_tokens,
            output_tokens = response.output_tokens,
            "Analysis complete"
        );

        Ok(AnalysisResult {
            summary,
            metadata: AnalysisMetadata {
                processing_time,
                model,
                user_id: user_id.to_string(),
            },
        })
    }

    /// Cheap mood estimate. Never fails: any error yields neutral/5.
    #[tracing::instrument(skip(self, transcript), fields(model = %self.provider.model()))]
    pub async fn quick_mood(&self, transcript: &str) -> QuickMood {
        let prompt = build_quick_mood_prompt(transcript);
        match self.provider.generate(&prompt, &self.params).await {
            Ok(response) => parse_quick_mood(&response.text),
            Err(e) => {
                tracing::warn!(kind = e.kind(), "Quick mood analysis failed: {}", e);
                QuickMood::default()
            }
        }
    }
}

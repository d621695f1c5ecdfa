//! Service-level error taxonomy and its mapping onto HTTP errors.

use super::providers::ProviderError;
use super::store::StoreError;
use service_core::error::AppError;
use thiserror::Error;
use validator::ValidationErrors;

/// The model call itself failed. Malformed replies never produce this.
#[derive(Debug, Error)]
#[error("Model {model} invocation failed: {source}")]
pub struct ModelInvocationError {
    pub model: String,
    #[source]
    pub source: ProviderError,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error(transparent)]
    ModelInvocation(#[from] ModelInvocationError),

    #[error(transparent)]
    Persistence(#[from] StoreError),

    #[error("Session not found")]
    NotFound,

    #[error("{0}")]
    InvalidQuery(String),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::DatabaseError(anyhow::Error::new(err))
    }
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Validation(errors) => AppError::ValidationError(errors),
            SessionError::ModelInvocation(err) => {
                tracing::error!(model = %err.model, kind = err.source.kind(), "Analysis provider failed: {}", err.source);
                AppError::ServiceUnavailable("AI analysis service temporarily unavailable".to_string())
            }
            SessionError::Persistence(err) => err.into(),
            SessionError::NotFound => AppError::NotFound(anyhow::anyhow!("Session not found")),
            SessionError::InvalidQuery(msg) => AppError::BadRequest(anyhow::anyhow!(msg)),
        }
    }
}

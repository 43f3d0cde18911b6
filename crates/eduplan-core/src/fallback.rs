//! Sequential fallback across model candidates.
//!
//! Candidates are tried one at a time, in configured order. The first
//! non-empty response wins and later (costlier) candidates are never called.
//! An authentication failure ends the chain immediately since no other
//! model would accept the same key.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::client::{GeminiClient, ModelClient, ModelFailure, TransientReason};
use crate::config::{DEFAULT_ATTEMPT_TIMEOUT, GenerationConfig, ModelCandidates};

/// Why a fallback chain produced no text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FallbackError {
    #[error("no API credential configured")]
    NoCredential,

    #[error("credentials rejected by {model:?} (HTTP {status})")]
    AuthRejected { model: String, status: u16 },

    #[error("no model responded after {} attempts", failures.len())]
    AllModelsFailed { failures: Vec<ModelFailure> },

    #[error("generation cancelled")]
    Cancelled,
}

/// Runs one fallback chain per call. Holds only read-only configuration, so
/// a single instance can serve any number of concurrent callers.
pub struct FallbackOrchestrator {
    models: ModelCandidates,
    /// `None` when no credential is configured.
    client: Option<Arc<dyn ModelClient>>,
    attempt_timeout: Duration,
}

impl FallbackOrchestrator {
    pub fn new(models: ModelCandidates, client: Arc<dyn ModelClient>) -> Self {
        Self {
            models,
            client: Some(client),
            attempt_timeout: DEFAULT_ATTEMPT_TIMEOUT,
        }
    }

    /// An orchestrator that reports [`FallbackError::NoCredential`] for every
    /// call without touching the network.
    pub fn without_credential(models: ModelCandidates) -> Self {
        Self {
            models,
            client: None,
            attempt_timeout: DEFAULT_ATTEMPT_TIMEOUT,
        }
    }

    /// Build a Gemini-backed orchestrator from resolved configuration.
    pub fn from_config(config: &GenerationConfig) -> Result<Self, reqwest::Error> {
        let orchestrator = match GeminiClient::from_config(config)? {
            Some(client) => {
                if let Some(key) = &config.api_key {
                    tracing::info!(
                        key = %key.fingerprint(),
                        models = config.models.len(),
                        "generation credential loaded"
                    );
                }
                Self::new(config.models.clone(), Arc::new(client))
            }
            None => {
                tracing::warn!("GEMINI_API_KEY is not configured; generation requests will fail");
                Self::without_credential(config.models.clone())
            }
        };
        Ok(orchestrator.with_attempt_timeout(config.attempt_timeout))
    }

    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = timeout;
        self
    }

    pub fn models(&self) -> &ModelCandidates {
        &self.models
    }

    pub fn has_credential(&self) -> bool {
        self.client.is_some()
    }

    /// Run the chain to completion.
    pub async fn generate(&self, prompt: &str) -> Result<String, FallbackError> {
        self.generate_cancellable(prompt, &CancellationToken::new())
            .await
    }

    /// Run the chain, aborting the in-flight attempt when `cancel` fires.
    pub async fn generate_cancellable(
        &self,
        prompt: &str,
        cancel: &CancellationToken,
    ) -> Result<String, FallbackError> {
        let Some(client) = &self.client else {
            tracing::error!("generation requested without an API credential");
            return Err(FallbackError::NoCredential);
        };

        let mut failures = Vec::new();

        for (attempt, model) in self.models.iter().enumerate() {
            if cancel.is_cancelled() {
                return Err(FallbackError::Cancelled);
            }

            tracing::debug!(model = %model, attempt = attempt + 1, "trying candidate");

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::info!(model = %model, "generation cancelled mid-attempt");
                    return Err(FallbackError::Cancelled);
                }
                r = tokio::time::timeout(self.attempt_timeout, client.invoke(model, prompt)) => r,
            };

            let result = match outcome {
                Ok(result) => result,
                Err(_elapsed) => Err(ModelFailure::transient(model, TransientReason::Timeout)),
            };

            match result {
                Ok(text) if !text.trim().is_empty() => {
                    tracing::info!(model = %model, attempt = attempt + 1, "generation succeeded");
                    return Ok(text);
                }
                Ok(_) => {
                    failures.push(ModelFailure::transient(model, TransientReason::EmptyText));
                }
                Err(ModelFailure::Auth { model, status }) => {
                    tracing::error!(
                        model = %model,
                        status,
                        "authentication rejected; check GEMINI_API_KEY"
                    );
                    return Err(FallbackError::AuthRejected { model, status });
                }
                Err(failure @ ModelFailure::Transient { .. }) => {
                    tracing::warn!(error = %failure, "candidate failed, falling back");
                    failures.push(failure);
                }
            }
        }

        tracing::error!(attempts = failures.len(), "no model responded");
        Err(FallbackError::AllModelsFailed { failures })
    }
}

impl std::fmt::Debug for FallbackOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FallbackOrchestrator")
            .field("models", &self.models)
            .field("has_credential", &self.client.is_some())
            .field("attempt_timeout", &self.attempt_timeout)
            .finish()
    }
}

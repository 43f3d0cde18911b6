//! End-to-end generation: request in, reconciled content out.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::client::ModelClient;
use crate::config::{GenerationConfig, ModelCandidates};
use crate::content::GeneratedContent;
use crate::fallback::{FallbackError, FallbackOrchestrator};
use crate::prompt::build_prompt;
use crate::request::{GenerationRequest, RequestError};
use crate::response::{self, ParseError, ValidationPolicy};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Everything that can stop a generation call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    #[error(transparent)]
    InvalidRequest(#[from] RequestError),

    #[error("no API credential configured (set GEMINI_API_KEY)")]
    NoCredential,

    #[error("credentials rejected by {model:?} (HTTP {status})")]
    AuthRejected { model: String, status: u16 },

    #[error("no model produced a response after {attempts} attempts")]
    AllModelsFailed { attempts: usize },

    /// Text came back but could not be used. `excerpt` is the raw response,
    /// before sanitizing, so operators see what the model actually sent.
    #[error("{reason}")]
    InvalidResponseShape { reason: ParseError, excerpt: String },

    #[error("generation cancelled")]
    Cancelled,
}

impl PipelineError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::InvalidRequest(_) => FailureKind::InvalidRequest,
            Self::NoCredential => FailureKind::NoCredential,
            Self::AuthRejected { .. } => FailureKind::AuthRejected,
            Self::AllModelsFailed { .. } => FailureKind::AllModelsFailed,
            Self::InvalidResponseShape { .. } => FailureKind::InvalidResponseShape,
            Self::Cancelled => FailureKind::Cancelled,
        }
    }
}

impl From<FallbackError> for PipelineError {
    fn from(err: FallbackError) -> Self {
        match err {
            FallbackError::NoCredential => Self::NoCredential,
            FallbackError::AuthRejected { model, status } => Self::AuthRejected { model, status },
            FallbackError::AllModelsFailed { failures } => Self::AllModelsFailed {
                attempts: failures.len(),
            },
            FallbackError::Cancelled => Self::Cancelled,
        }
    }
}

/// Machine-readable failure category, reported to callers alongside the
/// human-readable message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    InvalidRequest,
    NoCredential,
    AuthRejected,
    AllModelsFailed,
    InvalidResponseShape,
    Cancelled,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::InvalidRequest => "invalid_request",
            Self::NoCredential => "no_credential",
            Self::AuthRejected => "auth_rejected",
            Self::AllModelsFailed => "all_models_failed",
            Self::InvalidResponseShape => "invalid_response_shape",
            Self::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

impl FromStr for FailureKind {
    type Err = FailureKindParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "invalid_request" => Ok(Self::InvalidRequest),
            "no_credential" => Ok(Self::NoCredential),
            "auth_rejected" => Ok(Self::AuthRejected),
            "all_models_failed" => Ok(Self::AllModelsFailed),
            "invalid_response_shape" => Ok(Self::InvalidResponseShape),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(FailureKindParseError(other.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`FailureKind`] string.
#[derive(Debug, Clone, Error)]
#[error("invalid failure kind: {0:?}")]
pub struct FailureKindParseError(pub String);

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Validate, prompt, generate, sanitize, parse, reconcile.
///
/// Stateless between calls: clone it (or share it behind an `Arc`) and run
/// as many requests concurrently as needed. Each call runs its own
/// sequential fallback chain.
#[derive(Debug, Clone)]
pub struct GenerationPipeline {
    orchestrator: Arc<FallbackOrchestrator>,
    policy: ValidationPolicy,
}

impl GenerationPipeline {
    pub fn new(orchestrator: FallbackOrchestrator) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            policy: ValidationPolicy::default(),
        }
    }

    /// Pipeline over an arbitrary client. Mostly useful in tests.
    pub fn with_client(models: ModelCandidates, client: Arc<dyn ModelClient>) -> Self {
        Self::new(FallbackOrchestrator::new(models, client))
    }

    pub fn from_config(config: &GenerationConfig) -> Result<Self, reqwest::Error> {
        Ok(Self::new(FallbackOrchestrator::from_config(config)?))
    }

    pub fn with_policy(mut self, policy: ValidationPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn orchestrator(&self) -> &FallbackOrchestrator {
        &self.orchestrator
    }

    pub async fn run(&self, request: &GenerationRequest) -> Result<GeneratedContent, PipelineError> {
        self.run_cancellable(request, &CancellationToken::new())
            .await
    }

    /// Run one request. Dropping the returned future also cancels it.
    pub async fn run_cancellable(
        &self,
        request: &GenerationRequest,
        cancel: &CancellationToken,
    ) -> Result<GeneratedContent, PipelineError> {
        let use_case = request.use_case();

        if let Err(err) = request.validate() {
            tracing::warn!(use_case = %use_case, missing = ?err.missing, "rejecting incomplete request");
            return Err(err.into());
        }

        let prompt = build_prompt(request);
        tracing::info!(use_case = %use_case, prompt_chars = prompt.len(), "generating");

        let raw = self.orchestrator.generate_cancellable(&prompt, cancel).await?;

        let clean = response::sanitize(&raw);
        let content = response::parse_and_validate_with(&clean, use_case, self.policy).map_err(
            |reason| {
                tracing::error!(use_case = %use_case, error = %reason, "model output rejected");
                PipelineError::InvalidResponseShape {
                    reason,
                    excerpt: response::excerpt(&raw),
                }
            },
        )?;

        Ok(response::reconcile(content, request))
    }
}

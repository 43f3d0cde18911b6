//! The `ModelClient` trait and its closed failure set.
//!
//! The orchestrator matches on [`ModelFailure`] exhaustively, so status-code
//! inspection lives in exactly one place: the concrete client.

use async_trait::async_trait;
use thiserror::Error;

/// Issues a single generation request against one model.
///
/// Object-safe so the orchestrator can hold an `Arc<dyn ModelClient>` and
/// tests can swap in a scripted implementation.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Send `prompt` to `model` and return the generated text.
    async fn invoke(&self, model: &str, prompt: &str) -> Result<String, ModelFailure>;
}

/// Why a single attempt failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelFailure {
    /// Credentials rejected (HTTP 401/403). Not model-specific: every other
    /// candidate would fail the same way.
    #[error("credentials rejected while calling {model:?} (HTTP {status})")]
    Auth { model: String, status: u16 },

    /// Specific to this model or attempt. Safe to try the next candidate.
    #[error("model {model:?} failed: {reason}")]
    Transient {
        model: String,
        reason: TransientReason,
    },
}

impl ModelFailure {
    pub fn transient(model: impl Into<String>, reason: TransientReason) -> Self {
        Self::Transient {
            model: model.into(),
            reason,
        }
    }

    pub fn model(&self) -> &str {
        match self {
            Self::Auth { model, .. } | Self::Transient { model, .. } => model,
        }
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth { .. })
    }
}

/// Detail for [`ModelFailure::Transient`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransientReason {
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("attempt timed out")]
    Timeout,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("malformed response envelope: {0}")]
    MalformedEnvelope(String),

    #[error("response carried no text")]
    EmptyText,
}

// Compile-time assertion: ModelClient must be object-safe.
const _: () = {
    fn _assert_object_safe(_: &dyn ModelClient) {}
};

//! Process-wide generation configuration.
//!
//! Loaded once at startup and immutable afterwards. Tests construct their
//! own [`GenerationConfig`] with short candidate lists instead of reading
//! the environment.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use sha2::{Digest, Sha256};
use thiserror::Error;

/// Models tried in order when no list is configured: fastest first, most
/// general fallback last.
pub const DEFAULT_MODELS: [&str; 4] = [
    "gemini-2.5-flash",
    "gemini-2.5-pro",
    "gemini-2.0-flash",
    "gemini-pro-latest",
];

/// Root of the Generative Language API.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Upper bound for a single model attempt.
pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("model candidate list must not be empty")]
    NoModels,

    #[error("model identifier must not be blank")]
    BlankModel,
}

// ---------------------------------------------------------------------------
// ApiKey
// ---------------------------------------------------------------------------

/// A Gemini API key. `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Wrap a key, trimming whitespace. Returns `None` for blank input so
    /// an empty env var counts as "no credential".
    pub fn new(key: impl AsRef<str>) -> Option<Self> {
        let trimmed = key.as_ref().trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    /// First 12 hex chars of the key's SHA-256, safe to log.
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(self.0.as_bytes());
        hex::encode(&digest[..6])
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ApiKey(sha256:{})", self.fingerprint())
    }
}

// ---------------------------------------------------------------------------
// ModelCandidates
// ---------------------------------------------------------------------------

/// Ordered, immutable list of model identifiers.
///
/// Cheap to clone; concurrent chains share the same backing slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelCandidates(Arc<[String]>);

impl ModelCandidates {
    pub fn new<I, S>(models: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let models: Vec<String> = models
            .into_iter()
            .map(|m| m.into().trim().to_string())
            .collect();
        if models.is_empty() {
            return Err(ConfigError::NoModels);
        }
        if models.iter().any(|m| m.is_empty()) {
            return Err(ConfigError::BlankModel);
        }
        Ok(Self(models.into()))
    }

    /// Parse a comma-separated list such as `gemini-2.5-flash,gemini-pro-latest`.
    pub fn parse_list(list: &str) -> Result<Self, ConfigError> {
        Self::new(list.split(',').map(str::trim).filter(|m| !m.is_empty()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for ModelCandidates {
    fn default() -> Self {
        Self(DEFAULT_MODELS.iter().map(|m| m.to_string()).collect())
    }
}

// ---------------------------------------------------------------------------
// GenerationConfig
// ---------------------------------------------------------------------------

/// Everything the pipeline needs to talk to the model API.
#[derive(Debug, Clone)]
pub struct GenerationConfig {
    /// `None` means generation reports `NoCredential` without network calls.
    pub api_key: Option<ApiKey>,
    pub models: ModelCandidates,
    pub base_url: String,
    pub attempt_timeout: Duration,
}

impl GenerationConfig {
    pub fn new(api_key: Option<ApiKey>) -> Self {
        Self {
            api_key,
            models: ModelCandidates::default(),
            base_url: DEFAULT_BASE_URL.to_string(),
            attempt_timeout: DEFAULT_ATTEMPT_TIMEOUT,
        }
    }

    pub fn with_models(mut self, models: ModelCandidates) -> Self {
        self.models = models;
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = timeout;
        self
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self::new(None)
    }
}

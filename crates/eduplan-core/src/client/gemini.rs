//! Gemini `generateContent` client (API key based).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use thiserror::Error;

use super::trait_def::{ModelClient, ModelFailure, TransientReason};
use crate::config::{ApiKey, GenerationConfig};
use crate::response::excerpt;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for the Generative Language REST API.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: Client,
    base_url: String,
    api_key: ApiKey,
}

impl GeminiClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: ApiKey,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let http = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        })
    }

    /// Build a client from resolved configuration. Returns `Ok(None)` when no
    /// credential is configured.
    pub fn from_config(config: &GenerationConfig) -> Result<Option<Self>, reqwest::Error> {
        match &config.api_key {
            Some(key) => Self::new(&config.base_url, key.clone(), config.attempt_timeout).map(Some),
            None => Ok(None),
        }
    }

    fn generate_url(&self, model: &str) -> String {
        format!("{}/v1beta/models/{model}:generateContent", self.base_url)
    }

    /// List catalogue models that support `generateContent`.
    pub async fn list_models(&self) -> Result<Vec<ModelInfo>, CatalogError> {
        let url = format!("{}/v1beta/models", self.base_url);
        let resp = self
            .http
            .get(&url)
            .query(&[("key", self.api_key.expose())])
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;
        if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            return Err(CatalogError::Unauthorized {
                status: status.as_u16(),
            });
        }
        if !status.is_success() {
            return Err(CatalogError::Http {
                status: status.as_u16(),
                body: excerpt(&body),
            });
        }

        let catalog: CatalogResponse = serde_json::from_str(&body)?;
        Ok(catalog
            .models
            .into_iter()
            .filter(|m| {
                m.supported_generation_methods
                    .iter()
                    .any(|method| method == "generateContent")
            })
            .map(ModelInfo::from)
            .collect())
    }

    async fn request(&self, model: &str, prompt: &str) -> Result<String, ModelFailure> {
        let body = serde_json::json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });

        let resp = self
            .http
            .post(self.generate_url(model))
            .query(&[("key", self.api_key.expose())])
            .json(&body)
            .send()
            .await
            .map_err(|e| ModelFailure::transient(model, classify_transport(&e)))?;

        let status = resp.status();
        if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            return Err(ModelFailure::Auth {
                model: model.to_string(),
                status: status.as_u16(),
            });
        }

        let text = resp
            .text()
            .await
            .map_err(|e| ModelFailure::transient(model, classify_transport(&e)))?;

        if !status.is_success() {
            return Err(ModelFailure::transient(
                model,
                TransientReason::Http {
                    status: status.as_u16(),
                    body: excerpt(&text),
                },
            ));
        }

        extract_text(&text).map_err(|reason| ModelFailure::transient(model, reason))
    }
}

#[async_trait]
impl ModelClient for GeminiClient {
    async fn invoke(&self, model: &str, prompt: &str) -> Result<String, ModelFailure> {
        tracing::info!(model = %model, "requesting generation");
        let result = self.request(model, prompt).await;
        match &result {
            Ok(text) => tracing::info!(model = %model, chars = text.len(), "model responded"),
            Err(e) => tracing::warn!(model = %model, error = %e, "model attempt failed"),
        }
        result
    }
}

fn classify_transport(err: &reqwest::Error) -> TransientReason {
    if err.is_timeout() {
        TransientReason::Timeout
    } else {
        TransientReason::Transport(err.to_string())
    }
}

// ---------------------------------------------------------------------------
// Response envelope
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
    #[serde(rename = "inlineData")]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
struct InlineData {
    data: Option<String>,
}

/// Pull the first candidate's text out of a `generateContent` body, falling
/// back to its inline data payload when the text field is absent or empty.
fn extract_text(body: &str) -> Result<String, TransientReason> {
    let envelope: GenerateResponse = serde_json::from_str(body)
        .map_err(|e| TransientReason::MalformedEnvelope(e.to_string()))?;

    let part = envelope
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .and_then(|c| c.parts.into_iter().next())
        .ok_or(TransientReason::EmptyText)?;

    let text = part
        .text
        .filter(|t| !t.is_empty())
        .or_else(|| part.inline_data.and_then(|d| d.data))
        .filter(|t| !t.is_empty());

    text.ok_or(TransientReason::EmptyText)
}

// ---------------------------------------------------------------------------
// Model catalogue
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct CatalogResponse {
    #[serde(default)]
    models: Vec<CatalogModel>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CatalogModel {
    name: String,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    supported_generation_methods: Vec<String>,
}

/// A catalogue entry usable as a fallback candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelInfo {
    /// Short identifier, e.g. `gemini-2.5-flash`.
    pub id: String,
    pub display_name: Option<String>,
    pub methods: Vec<String>,
}

impl From<CatalogModel> for ModelInfo {
    fn from(m: CatalogModel) -> Self {
        let id = m
            .name
            .strip_prefix("models/")
            .unwrap_or(&m.name)
            .to_string();
        Self {
            id,
            display_name: m.display_name,
            methods: m.supported_generation_methods,
        }
    }
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("credentials rejected while listing models (HTTP {status})")]
    Unauthorized { status: u16 },

    #[error("model listing failed with HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("model listing request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("model listing returned malformed JSON: {0}")]
    Malformed(#[from] serde_json::Error),
}

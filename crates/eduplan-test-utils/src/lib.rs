//! Shared test utilities for eduplan integration tests.
//!
//! Provides a scripted [`ModelClient`] so pipeline and HTTP tests never hit
//! the network, plus canned model responses for each document kind.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{Value, json};

use eduplan_core::{ModelCandidates, ModelClient, ModelFailure, TransientReason};
use eduplan_store::MemoryStore;

// ---------------------------------------------------------------------------
// Scripted client
// ---------------------------------------------------------------------------

/// What a scripted model does when invoked.
#[derive(Debug, Clone)]
pub enum Outcome {
    /// Return this text.
    Text(String),
    /// Reject the credential with this status (401 or 403).
    Auth(u16),
    /// Fail with a non-auth HTTP status.
    Http(u16),
    /// Never answer. Only useful with a short attempt timeout.
    Stall,
}

/// A [`ModelClient`] whose answers are fixed per model id.
///
/// Every invocation is recorded, in order, together with the prompt it
/// received. Models without a script answer HTTP 404.
#[derive(Debug, Default)]
pub struct ScriptedClient {
    script: HashMap<String, Outcome>,
    calls: Mutex<Vec<(String, String)>>,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(mut self, model: &str, outcome: Outcome) -> Self {
        self.script.insert(model.to_string(), outcome);
        self
    }

    pub fn text(self, model: &str, text: impl Into<String>) -> Self {
        self.on(model, Outcome::Text(text.into()))
    }

    /// Model ids in the order they were invoked.
    pub fn attempts(&self) -> Vec<String> {
        self.calls
            .lock()
            .expect("calls lock poisoned")
            .iter()
            .map(|(model, _)| model.clone())
            .collect()
    }

    /// Prompts in the order they were received.
    pub fn prompts(&self) -> Vec<String> {
        self.calls
            .lock()
            .expect("calls lock poisoned")
            .iter()
            .map(|(_, prompt)| prompt.clone())
            .collect()
    }

    pub fn into_shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}

#[async_trait]
impl ModelClient for ScriptedClient {
    async fn invoke(&self, model: &str, prompt: &str) -> Result<String, ModelFailure> {
        self.calls
            .lock()
            .expect("calls lock poisoned")
            .push((model.to_string(), prompt.to_string()));

        match self.script.get(model) {
            Some(Outcome::Text(text)) => Ok(text.clone()),
            Some(Outcome::Auth(status)) => Err(ModelFailure::Auth {
                model: model.to_string(),
                status: *status,
            }),
            Some(Outcome::Http(status)) => Err(ModelFailure::transient(
                model,
                TransientReason::Http {
                    status: *status,
                    body: "scripted failure".to_string(),
                },
            )),
            Some(Outcome::Stall) => std::future::pending().await,
            None => Err(ModelFailure::transient(
                model,
                TransientReason::Http {
                    status: 404,
                    body: "model not found".to_string(),
                },
            )),
        }
    }
}

/// Candidate list from string literals.
pub fn models(ids: &[&str]) -> ModelCandidates {
    ModelCandidates::new(ids.iter().copied()).expect("non-empty model list")
}

/// A fresh, empty in-memory record store.
pub fn fresh_store() -> Arc<MemoryStore> {
    Arc::new(MemoryStore::new())
}

// ---------------------------------------------------------------------------
// Canned responses
// ---------------------------------------------------------------------------

/// Wrap `body` the way models usually do despite being told not to.
pub fn fenced(body: &str) -> String {
    format!("```json\n{body}\n```")
}

pub fn lesson_json(subject: &str, grade: &str, topic: &str) -> Value {
    json!({
        "asignatura": subject,
        "grado": grade,
        "tema": topic,
        "duracion": "45-60 minutos",
        "objetivos": ["Comparar fracciones con igual denominador"],
        "actividades": {
            "inicio": { "duracion": "15 minutos", "actividades": ["Saludo"] },
            "desarrollo": { "duracion": "30 minutos", "actividades": ["Práctica guiada"] },
            "cierre": { "duracion": "10 minutos", "actividades": ["Síntesis"] }
        },
        "recursos": ["Tablero"]
    })
}

pub fn term_plan_json(subject: &str, grade: &str, period: &str) -> Value {
    json!({
        "asignatura": subject,
        "grado": grade,
        "periodo": period,
        "tema": "Tema del periodo",
        "objetivos": ["Objetivo del periodo"],
        "actividades": {
            "inicio": ["Motivación"],
            "desarrollo": ["Trabajo colaborativo"],
            "cierre": ["Reflexión"]
        }
    })
}

pub fn curriculum_json(subject: &str, grade: &str, periods: u32) -> Value {
    let periodos: Vec<Value> = (1..=periods)
        .map(|n| {
            json!({
                "numero": n,
                "nombre": format!("Periodo {n}"),
                "competencias": ["Competencia"],
                "contenidos": []
            })
        })
        .collect();
    json!({
        "asignatura": subject,
        "grado": grade,
        "nivel": "Básica primaria",
        "edades": "8-9 años",
        "periodos": periodos
    })
}

use serde::Serialize;
use serde_json::Value;

use crate::request::UseCase;

/// A parsed and validated model response.
///
/// For every use case except [`UseCase::SectionRefinement`] the body is a
/// JSON object that passed minimal-shape validation. The pipeline hands it
/// to the caller and never persists it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct GeneratedContent {
    #[serde(skip)]
    use_case: UseCase,
    body: Value,
}

impl GeneratedContent {
    pub(crate) fn new(use_case: UseCase, body: Value) -> Self {
        Self { use_case, body }
    }

    pub fn use_case(&self) -> UseCase {
        self.use_case
    }

    pub fn body(&self) -> &Value {
        &self.body
    }

    pub(crate) fn body_mut(&mut self) -> &mut Value {
        &mut self.body
    }

    /// Top-level string field, if present.
    pub fn text(&self, field: &str) -> Option<&str> {
        self.body.get(field).and_then(Value::as_str)
    }

    pub fn into_body(self) -> Value {
        self.body
    }
}

//! JSON parsing with minimal-shape validation per use case.
//!
//! Only top-level keys are checked. Nested structure (per-period standards,
//! competencies, indicators and so on) is whatever the model produced.

use serde_json::Value;
use thiserror::Error;

use super::excerpt;
use crate::content::GeneratedContent;
use crate::request::UseCase;

/// Knobs the caller can turn on top of the fixed per-use-case rules.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationPolicy {
    /// Reject curriculum maps whose `periodos` array is empty.
    pub require_non_empty_periods: bool,
}

/// The model's output could not be used.
///
/// Every variant carries an excerpt of at most
/// [`EXCERPT_LIMIT`](super::EXCERPT_LIMIT) characters of the offending text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("response is not valid JSON: {message}")]
    InvalidJson { message: String, excerpt: String },

    #[error("response JSON is not an object")]
    NotAnObject { excerpt: String },

    #[error("response JSON lacks the expected structure (missing {field:?})")]
    MissingField { field: &'static str, excerpt: String },

    #[error("field {field:?} must be an array")]
    NotAnArray { field: &'static str, excerpt: String },

    #[error("field {field:?} must not be empty")]
    EmptyArray { field: &'static str, excerpt: String },
}

impl ParseError {
    pub fn excerpt(&self) -> &str {
        match self {
            Self::InvalidJson { excerpt, .. }
            | Self::NotAnObject { excerpt }
            | Self::MissingField { excerpt, .. }
            | Self::NotAnArray { excerpt, .. }
            | Self::EmptyArray { excerpt, .. } => excerpt,
        }
    }

    /// `true` when the text parsed but had the wrong shape.
    pub fn is_shape_error(&self) -> bool {
        !matches!(self, Self::InvalidJson { .. })
    }
}

/// Parse `text` and check it against the default [`ValidationPolicy`].
pub fn parse_and_validate(text: &str, use_case: UseCase) -> Result<GeneratedContent, ParseError> {
    parse_and_validate_with(text, use_case, ValidationPolicy::default())
}

/// Parse `text` and check the top-level shape `use_case` requires.
pub fn parse_and_validate_with(
    text: &str,
    use_case: UseCase,
    policy: ValidationPolicy,
) -> Result<GeneratedContent, ParseError> {
    let value: Value = serde_json::from_str(text).map_err(|e| ParseError::InvalidJson {
        message: e.to_string(),
        excerpt: excerpt(text),
    })?;

    match use_case {
        UseCase::LessonSession | UseCase::TermPlan => {
            let obj = value.as_object().ok_or_else(|| ParseError::NotAnObject {
                excerpt: excerpt(text),
            })?;
            for field in ["objetivos", "actividades"] {
                if !obj.get(field).is_some_and(is_filled) {
                    return Err(ParseError::MissingField {
                        field,
                        excerpt: excerpt(text),
                    });
                }
            }
        }
        UseCase::CurriculumMap => {
            let obj = value.as_object().ok_or_else(|| ParseError::NotAnObject {
                excerpt: excerpt(text),
            })?;
            let periods = obj.get("periodos").ok_or_else(|| ParseError::MissingField {
                field: "periodos",
                excerpt: excerpt(text),
            })?;
            let periods = periods.as_array().ok_or_else(|| ParseError::NotAnArray {
                field: "periodos",
                excerpt: excerpt(text),
            })?;
            if policy.require_non_empty_periods && periods.is_empty() {
                return Err(ParseError::EmptyArray {
                    field: "periodos",
                    excerpt: excerpt(text),
                });
            }
        }
        UseCase::SectionRefinement => {}
    }

    Ok(GeneratedContent::new(use_case, value))
}

/// Null, `false`, `""`, `[]` and `{}` count as missing.
fn is_filled(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(_) => true,
        Value::String(s) => !s.trim().is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

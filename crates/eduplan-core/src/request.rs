//! Generation requests: use cases, caller parameters, and required-field
//! checks performed before any prompt is built.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Which prompt template and validation rule apply to a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UseCase {
    CurriculumMap,
    TermPlan,
    LessonSession,
    SectionRefinement,
}

impl fmt::Display for UseCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::CurriculumMap => "curriculum_map",
            Self::TermPlan => "term_plan",
            Self::LessonSession => "lesson_session",
            Self::SectionRefinement => "section_refinement",
        };
        f.write_str(s)
    }
}

impl FromStr for UseCase {
    type Err = UseCaseParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "curriculum_map" => Ok(Self::CurriculumMap),
            "term_plan" => Ok(Self::TermPlan),
            "lesson_session" => Ok(Self::LessonSession),
            "section_refinement" => Ok(Self::SectionRefinement),
            other => Err(UseCaseParseError(other.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`UseCase`] string.
#[derive(Debug, Clone, Error)]
#[error("invalid use case: {0:?}")]
pub struct UseCaseParseError(pub String);

/// The three kinds of document the service produces.
///
/// The path names (`curriculum`, `planeadores`, `clases`) are the ones the
/// HTTP surface and the record store use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentKind {
    #[serde(rename = "curriculum")]
    CurriculumMap,
    #[serde(rename = "planeadores")]
    TermPlan,
    #[serde(rename = "clases")]
    LessonSession,
}

impl DocumentKind {
    pub const ALL: [DocumentKind; 3] = [Self::CurriculumMap, Self::TermPlan, Self::LessonSession];

    /// Short phrase used inside refinement prompts.
    pub fn label(self) -> &'static str {
        match self {
            Self::CurriculumMap => "malla curricular",
            Self::TermPlan => "planeador de clase",
            Self::LessonSession => "planeación de clase",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::CurriculumMap => "curriculum",
            Self::TermPlan => "planeadores",
            Self::LessonSession => "clases",
        };
        f.write_str(s)
    }
}

impl FromStr for DocumentKind {
    type Err = DocumentKindParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "curriculum" => Ok(Self::CurriculumMap),
            "planeadores" => Ok(Self::TermPlan),
            "clases" => Ok(Self::LessonSession),
            other => Err(DocumentKindParseError(other.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`DocumentKind`] string.
#[derive(Debug, Clone, Error)]
#[error("invalid document kind: {0:?} (expected curriculum, planeadores, or clases)")]
pub struct DocumentKindParseError(pub String);

impl From<DocumentKind> for UseCase {
    fn from(kind: DocumentKind) -> Self {
        match kind {
            DocumentKind::CurriculumMap => Self::CurriculumMap,
            DocumentKind::TermPlan => Self::TermPlan,
            DocumentKind::LessonSession => Self::LessonSession,
        }
    }
}

// ---------------------------------------------------------------------------
// Parameters
// ---------------------------------------------------------------------------

/// Parameters for a curriculum map ("malla curricular").
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurriculumParams {
    #[serde(rename = "asignatura", default, deserialize_with = "flexible::text")]
    pub subject: String,
    #[serde(rename = "grado", default, deserialize_with = "flexible::text")]
    pub grade: String,
    #[serde(rename = "nivel", default, deserialize_with = "flexible::text")]
    pub level: String,
    #[serde(rename = "edades", default, deserialize_with = "flexible::text")]
    pub ages: String,
    /// Number of academic periods to generate. Zero means "not supplied".
    #[serde(rename = "periodos", default, deserialize_with = "flexible::count")]
    pub period_count: u32,
    /// Academic year the map applies to. Filled in at the edge when absent.
    #[serde(rename = "anio", default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
}

/// Parameters for a term lesson plan ("planeador").
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermPlanParams {
    #[serde(rename = "asignatura", default, deserialize_with = "flexible::text")]
    pub subject: String,
    #[serde(rename = "grado", default, deserialize_with = "flexible::text")]
    pub grade: String,
    #[serde(rename = "periodo", default, deserialize_with = "flexible::text")]
    pub period: String,
    #[serde(
        rename = "tema",
        default,
        deserialize_with = "flexible::optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub topic: Option<String>,
}

/// Parameters for a single-session lesson plan ("clase").
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonParams {
    #[serde(rename = "asignatura", default, deserialize_with = "flexible::text")]
    pub subject: String,
    #[serde(rename = "grado", default, deserialize_with = "flexible::text")]
    pub grade: String,
    #[serde(
        rename = "tema",
        default,
        deserialize_with = "flexible::optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub topic: Option<String>,
}

/// Request to rewrite one section of an existing document.
///
/// The model returns the whole updated document, not a patch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefinementRequest {
    /// Kind of document being refined. Set by the caller's route.
    #[serde(skip, default = "default_document")]
    pub document: DocumentKind,
    #[serde(rename = "contenido", default)]
    pub content: Value,
    #[serde(rename = "seccion", default, deserialize_with = "flexible::text")]
    pub section: String,
    #[serde(rename = "instrucciones", default, deserialize_with = "flexible::text")]
    pub instructions: String,
}

fn default_document() -> DocumentKind {
    DocumentKind::CurriculumMap
}

impl RefinementRequest {
    pub fn new(
        document: DocumentKind,
        content: Value,
        section: impl Into<String>,
        instructions: impl Into<String>,
    ) -> Self {
        Self {
            document,
            content,
            section: section.into(),
            instructions: instructions.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/// Missing or blank required parameters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("missing required fields: {}", missing.join(", "))]
pub struct RequestError {
    /// Every field the use case requires.
    pub required: Vec<&'static str>,
    /// The subset that was absent or blank.
    pub missing: Vec<&'static str>,
}

/// A single generation call: a use case plus its parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationRequest {
    CurriculumMap(CurriculumParams),
    TermPlan(TermPlanParams),
    LessonSession(LessonParams),
    SectionRefinement(RefinementRequest),
}

impl GenerationRequest {
    pub fn use_case(&self) -> UseCase {
        match self {
            Self::CurriculumMap(_) => UseCase::CurriculumMap,
            Self::TermPlan(_) => UseCase::TermPlan,
            Self::LessonSession(_) => UseCase::LessonSession,
            Self::SectionRefinement(_) => UseCase::SectionRefinement,
        }
    }

    /// Check that every required parameter is present and non-blank.
    pub fn validate(&self) -> Result<(), RequestError> {
        let checks: Vec<(&'static str, bool)> = match self {
            Self::CurriculumMap(p) => vec![
                ("asignatura", is_present(&p.subject)),
                ("grado", is_present(&p.grade)),
                ("nivel", is_present(&p.level)),
                ("edades", is_present(&p.ages)),
                ("periodos", p.period_count > 0),
            ],
            Self::TermPlan(p) => vec![
                ("asignatura", is_present(&p.subject)),
                ("grado", is_present(&p.grade)),
                ("periodo", is_present(&p.period)),
            ],
            Self::LessonSession(p) => vec![
                ("asignatura", is_present(&p.subject)),
                ("grado", is_present(&p.grade)),
            ],
            Self::SectionRefinement(r) => vec![
                ("contenido", !r.content.is_null()),
                ("seccion", is_present(&r.section)),
                ("instrucciones", is_present(&r.instructions)),
            ],
        };

        let missing: Vec<&'static str> = checks
            .iter()
            .filter(|(_, ok)| !ok)
            .map(|(name, _)| *name)
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(RequestError {
                required: checks.iter().map(|(name, _)| *name).collect(),
                missing,
            })
        }
    }

    /// Fields the model is asked to echo back, paired with the caller's
    /// value. The optional topic is included only when it was supplied.
    pub fn echoed_fields(&self) -> Vec<(&'static str, &str)> {
        match self {
            Self::CurriculumMap(p) => vec![
                ("asignatura", p.subject.as_str()),
                ("grado", p.grade.as_str()),
                ("nivel", p.level.as_str()),
                ("edades", p.ages.as_str()),
            ],
            Self::TermPlan(p) => {
                let mut fields = vec![
                    ("asignatura", p.subject.as_str()),
                    ("grado", p.grade.as_str()),
                    ("periodo", p.period.as_str()),
                ];
                if let Some(topic) = supplied(&p.topic) {
                    fields.push(("tema", topic));
                }
                fields
            }
            Self::LessonSession(p) => {
                let mut fields = vec![
                    ("asignatura", p.subject.as_str()),
                    ("grado", p.grade.as_str()),
                ];
                if let Some(topic) = supplied(&p.topic) {
                    fields.push(("tema", topic));
                }
                fields
            }
            Self::SectionRefinement(_) => vec![],
        }
    }
}

fn is_present(value: &str) -> bool {
    !value.trim().is_empty()
}

/// The topic counts as supplied only when it is non-blank.
pub(crate) fn supplied(topic: &Option<String>) -> Option<&str> {
    topic.as_deref().filter(|t| is_present(t))
}

// ---------------------------------------------------------------------------
// Lenient field decoding
// ---------------------------------------------------------------------------

/// Form posts send numbers and strings interchangeably (`"periodos": "4"`
/// or `4`, `"grado": 3`, `"userId": 7`). These helpers accept either.
pub mod flexible {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scalar {
        Text(String),
        Int(i64),
        Float(f64),
        Bool(bool),
    }

    impl Scalar {
        fn into_string(self) -> String {
            match self {
                Self::Text(s) => s,
                Self::Int(n) => n.to_string(),
                Self::Float(n) => n.to_string(),
                Self::Bool(b) => b.to_string(),
            }
        }
    }

    pub fn text<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        let value: Option<Scalar> = Option::deserialize(d)?;
        Ok(value.map(Scalar::into_string).unwrap_or_default())
    }

    pub fn optional_text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        let value: Option<Scalar> = Option::deserialize(d)?;
        Ok(value.map(Scalar::into_string))
    }

    pub fn count<'de, D: Deserializer<'de>>(d: D) -> Result<u32, D::Error> {
        Ok(optional_count(d)?.unwrap_or(0))
    }

    /// Like [`count`], but keeps "not supplied" distinct from zero.
    pub fn optional_count<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u32>, D::Error> {
        let value: Option<Scalar> = Option::deserialize(d)?;
        match value {
            None => Ok(None),
            Some(Scalar::Int(n)) => u32::try_from(n).map(Some).map_err(D::Error::custom),
            Some(Scalar::Text(s)) if s.trim().is_empty() => Ok(None),
            Some(Scalar::Text(s)) => s
                .trim()
                .parse::<u32>()
                .map(Some)
                .map_err(|_| D::Error::custom(format!("invalid period count {s:?}"))),
            Some(other) => Err(D::Error::custom(format!(
                "invalid period count {:?}",
                other.into_string()
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

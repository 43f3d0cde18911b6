use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use eduplan_core::DocumentKind;
use eduplan_core::request::flexible;

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// A document to persist, as posted by the client.
///
/// Which metadata fields are meaningful depends on `kind`: curriculum maps
/// carry level, ages, period count and year; term plans carry period and
/// topic; lessons carry topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRecord {
    /// Set from the route, never from the body.
    #[serde(skip, default = "default_kind")]
    pub kind: DocumentKind,
    /// Numeric ids from the web client are kept as their decimal text.
    #[serde(default, deserialize_with = "flexible::text")]
    pub user_id: String,
    #[serde(rename = "asignatura", default, deserialize_with = "flexible::text")]
    pub subject: String,
    #[serde(rename = "grado", default, deserialize_with = "flexible::text")]
    pub grade: String,
    #[serde(rename = "nivel", default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    #[serde(rename = "edades", default, skip_serializing_if = "Option::is_none")]
    pub ages: Option<String>,
    #[serde(
        rename = "periodos",
        default,
        deserialize_with = "flexible::optional_count",
        skip_serializing_if = "Option::is_none"
    )]
    pub period_count: Option<u32>,
    #[serde(rename = "anio", default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(
        rename = "periodo",
        default,
        deserialize_with = "flexible::optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub period: Option<String>,
    #[serde(rename = "tema", default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    /// Generated document. A missing body is stored as `{}`.
    #[serde(rename = "contenido", default)]
    pub content: Value,
}

fn default_kind() -> DocumentKind {
    DocumentKind::CurriculumMap
}

impl NewRecord {
    pub fn new(kind: DocumentKind, user_id: impl Into<String>, content: Value) -> Self {
        Self {
            kind,
            user_id: user_id.into(),
            subject: String::new(),
            grade: String::new(),
            level: None,
            ages: None,
            period_count: None,
            year: None,
            period: None,
            topic: None,
            content,
        }
    }
}

/// A persisted document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredRecord {
    pub id: Uuid,
    pub kind: DocumentKind,
    pub user_id: String,
    #[serde(rename = "asignatura")]
    pub subject: String,
    #[serde(rename = "grado")]
    pub grade: String,
    #[serde(rename = "nivel", skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    #[serde(rename = "edades", skip_serializing_if = "Option::is_none")]
    pub ages: Option<String>,
    #[serde(rename = "periodos", skip_serializing_if = "Option::is_none")]
    pub period_count: Option<u32>,
    #[serde(rename = "anio", skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(rename = "periodo", skip_serializing_if = "Option::is_none")]
    pub period: Option<String>,
    #[serde(rename = "tema", skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(rename = "contenido")]
    pub content: Value,
    pub created_at: DateTime<Utc>,
}

impl StoredRecord {
    pub(crate) fn from_new(record: NewRecord, id: Uuid, created_at: DateTime<Utc>) -> Self {
        let content = if record.content.is_null() {
            Value::Object(Default::default())
        } else {
            record.content
        };
        Self {
            id,
            kind: record.kind,
            user_id: record.user_id,
            subject: record.subject,
            grade: record.grade,
            level: record.level,
            ages: record.ages,
            period_count: record.period_count,
            year: record.year,
            period: record.period,
            topic: record.topic,
            content,
            created_at,
        }
    }
}

//! Restore the caller's values for fields the model was asked to echo.
//!
//! Stored records are filtered by subject, grade and so on, so they must
//! carry exactly what the user typed, whatever spelling the model chose.

use serde_json::Value;

use crate::content::GeneratedContent;
use crate::request::GenerationRequest;

/// Overwrite every echoed field in `content` with the value from `request`.
///
/// Fields the caller did not supply (a blank topic, for instance) are left
/// as generated. Non-object bodies are returned untouched.
pub fn reconcile(mut content: GeneratedContent, request: &GenerationRequest) -> GeneratedContent {
    let fields = request.echoed_fields();
    let changed = apply(content.body_mut(), &fields);
    if !changed.is_empty() {
        tracing::debug!(
            use_case = %request.use_case(),
            fields = ?changed,
            "restored caller values for echoed fields"
        );
    }
    content
}

/// Returns the names of the fields that were rewritten.
fn apply(body: &mut Value, fields: &[(&'static str, &str)]) -> Vec<&'static str> {
    let Some(obj) = body.as_object_mut() else {
        return Vec::new();
    };

    let mut changed = Vec::new();
    for &(name, expected) in fields {
        if obj.get(name).and_then(Value::as_str) != Some(expected) {
            obj.insert(name.to_string(), Value::String(expected.to_string()));
            changed.push(name);
        }
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{
        CurriculumParams, DocumentKind, LessonParams, RefinementRequest, TermPlanParams, UseCase,
    };
    use crate::response::parse_and_validate;
    use serde_json::json;

    fn lesson_request(topic: Option<&str>) -> GenerationRequest {
        GenerationRequest::LessonSession(LessonParams {
            subject: "Matemáticas".to_string(),
            grade: "3°".to_string(),
            topic: topic.map(str::to_string),
        })
    }

    #[test]
    fn variant_spellings_are_overwritten() {
        let content = parse_and_validate(
            r#"{"asignatura":"Matematicas","grado":"3","tema":"fracciones",
                "objetivos":["x"],"actividades":{"inicio":{}}}"#,
            UseCase::LessonSession,
        )
        .unwrap();

        let content = reconcile(content, &lesson_request(Some("Fracciones")));
        assert_eq!(content.text("asignatura"), Some("Matemáticas"));
        assert_eq!(content.text("grado"), Some("3°"));
        assert_eq!(content.text("tema"), Some("Fracciones"));
    }

    #[test]
    fn missing_and_non_string_fields_are_filled() {
        let mut body = json!({ "grado": 3, "objetivos": ["x"] });
        let changed = apply(&mut body, &[("asignatura", "Inglés"), ("grado", "3")]);
        assert_eq!(changed, vec!["asignatura", "grado"]);
        assert_eq!(body["asignatura"], "Inglés");
        assert_eq!(body["grado"], "3");
    }

    #[test]
    fn unsupplied_topic_is_left_as_generated() {
        let content = parse_and_validate(
            r#"{"tema":"Suma de fracciones","objetivos":["x"],"actividades":["y"]}"#,
            UseCase::LessonSession,
        )
        .unwrap();
        let content = reconcile(content, &lesson_request(None));
        assert_eq!(content.text("tema"), Some("Suma de fracciones"));
    }

    #[test]
    fn term_plan_period_label_is_restored() {
        let request = GenerationRequest::TermPlan(TermPlanParams {
            subject: "Sociales".to_string(),
            grade: "7".to_string(),
            period: "2".to_string(),
            topic: None,
        });
        let content = parse_and_validate(
            r#"{"periodo":"Segundo periodo","objetivos":["x"],"actividades":["y"]}"#,
            UseCase::TermPlan,
        )
        .unwrap();
        let content = reconcile(content, &request);
        assert_eq!(content.text("periodo"), Some("2"));
        assert_eq!(content.text("asignatura"), Some("Sociales"));
    }

    #[test]
    fn curriculum_keeps_generated_periods() {
        let request = GenerationRequest::CurriculumMap(CurriculumParams {
            subject: "Ciencias".to_string(),
            grade: "5".to_string(),
            level: "Básica primaria".to_string(),
            ages: "10-11 años".to_string(),
            period_count: 2,
            year: Some(2025),
        });
        let content = parse_and_validate(
            r#"{"nivel":"Primaria","edades":"10 a 11","periodos":[{"numero":1},{"numero":2}]}"#,
            UseCase::CurriculumMap,
        )
        .unwrap();
        let content = reconcile(content, &request);
        assert_eq!(content.text("nivel"), Some("Básica primaria"));
        assert_eq!(content.text("edades"), Some("10-11 años"));
        assert_eq!(content.body()["periodos"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn refinement_is_untouched() {
        let request = GenerationRequest::SectionRefinement(RefinementRequest::new(
            DocumentKind::LessonSession,
            json!({ "asignatura": "Arte" }),
            "recursos",
            "Agregar material reciclado",
        ));
        let content =
            parse_and_validate(r#"{"asignatura":"Artes"}"#, UseCase::SectionRefinement).unwrap();
        let content = reconcile(content, &request);
        assert_eq!(content.text("asignatura"), Some("Artes"));
    }
}

//! Prompt construction, one template per use case.
//!
//! Every builder is a pure function of its parameters. The curriculum
//! template's validity year is a parameter too, so nothing here reads the
//! clock.

mod curriculum;
mod lesson;
mod refine;
mod term_plan;

use serde_json::Value;

use crate::request::GenerationRequest;

pub use curriculum::build_curriculum_prompt;
pub use lesson::build_lesson_prompt;
pub use refine::build_refinement_prompt;
pub use term_plan::build_term_plan_prompt;

// ---------------------------------------------------------------------------
// Shared blocks
// ---------------------------------------------------------------------------

/// National framework every generated document must cite.
const LEGAL_FRAMEWORK: &str = "📚 REFERENCIAS OBLIGATORIAS DEL MINISTERIO DE EDUCACIÓN NACIONAL DE COLOMBIA:
- Ley 115 de 1994 (Ley General de Educación)
- Decreto 1290 de 2009 (Evaluación del aprendizaje)
- Estándares Básicos de Competencias del MEN
- Derechos Básicos de Aprendizaje (DBA) vigentes
";

const SCHEMA_HEADER: &str =
    "📋 ESTRUCTURA JSON REQUERIDA (responde SOLO con este JSON, sin texto adicional):\n";

/// Closing instruction shared by the generation templates.
const JSON_ONLY: &str = "RESPONDE ÚNICAMENTE CON EL JSON VÁLIDO, SIN BLOQUES DE CÓDIGO MARKDOWN.";

/// Build the prompt text for `request`.
///
/// Does not validate the request; the pipeline calls
/// [`GenerationRequest::validate`] first.
pub fn build_prompt(request: &GenerationRequest) -> String {
    match request {
        GenerationRequest::CurriculumMap(p) => build_curriculum_prompt(p),
        GenerationRequest::TermPlan(p) => build_term_plan_prompt(p),
        GenerationRequest::LessonSession(p) => build_lesson_prompt(p),
        GenerationRequest::SectionRefinement(r) => build_refinement_prompt(r),
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Append the framework list followed by template-specific extra lines.
fn push_framework(prompt: &mut String, extra: &[&str]) {
    prompt.push_str(LEGAL_FRAMEWORK);
    for line in extra {
        prompt.push_str("- ");
        prompt.push_str(line);
        prompt.push('\n');
    }
    prompt.push('\n');
}

/// Append a numbered list of instructions under the critical-instructions
/// heading.
fn push_instructions(prompt: &mut String, items: &[String]) {
    prompt.push_str("⚠️ INSTRUCCIONES CRÍTICAS:\n");
    for (i, item) in items.iter().enumerate() {
        prompt.push_str(&format!("{}. {item}\n", i + 1));
    }
    prompt.push('\n');
}

/// Append the schema heading and the pretty-printed example document.
fn push_schema(prompt: &mut String, schema: &Value) {
    prompt.push_str(SCHEMA_HEADER);
    prompt.push_str(&format!("{schema:#}"));
    prompt.push_str("\n\n");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{
        CurriculumParams, DocumentKind, LessonParams, RefinementRequest, TermPlanParams,
    };
    use serde_json::json;

    fn all_requests() -> Vec<GenerationRequest> {
        vec![
            GenerationRequest::CurriculumMap(CurriculumParams {
                subject: "Ciencias Naturales".to_string(),
                grade: "5".to_string(),
                level: "Básica primaria".to_string(),
                ages: "10-11 años".to_string(),
                period_count: 4,
                year: Some(2025),
            }),
            GenerationRequest::TermPlan(TermPlanParams {
                subject: "Lenguaje".to_string(),
                grade: "8".to_string(),
                period: "3".to_string(),
                topic: Some("El ensayo argumentativo".to_string()),
            }),
            GenerationRequest::LessonSession(LessonParams {
                subject: "Matemáticas".to_string(),
                grade: "3°".to_string(),
                topic: Some("Fracciones".to_string()),
            }),
            GenerationRequest::SectionRefinement(RefinementRequest::new(
                DocumentKind::LessonSession,
                json!({ "recursos": ["Tablero"] }),
                "recursos",
                "Agregar material reciclado",
            )),
        ]
    }

    #[test]
    fn builders_are_deterministic() {
        for request in all_requests() {
            assert_eq!(build_prompt(&request), build_prompt(&request.clone()));
        }
    }

    #[test]
    fn every_template_demands_json_only() {
        for request in all_requests() {
            let prompt = build_prompt(&request);
            assert!(
                prompt.contains("JSON válido") || prompt.contains("JSON VÁLIDO"),
                "{} prompt lacks JSON-only instruction",
                request.use_case()
            );
        }
    }

    #[test]
    fn templates_differ_per_use_case() {
        let prompts: Vec<String> = all_requests().iter().map(build_prompt).collect();
        for (i, a) in prompts.iter().enumerate() {
            for b in &prompts[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn instructions_are_numbered() {
        let mut prompt = String::new();
        push_instructions(&mut prompt, &["uno".to_string(), "dos".to_string()]);
        assert!(prompt.contains("1. uno\n2. dos\n"));
    }

    #[test]
    fn schema_is_pretty_printed_in_insertion_order() {
        let mut prompt = String::new();
        push_schema(&mut prompt, &json!({ "zeta": 1, "alfa": 2 }));
        let zeta = prompt.find("\"zeta\"").unwrap();
        let alfa = prompt.find("\"alfa\"").unwrap();
        assert!(zeta < alfa);
        assert!(prompt.contains("\n  \"alfa\": 2"));
    }
}

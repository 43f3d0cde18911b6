use crate::request::RefinementRequest;

/// Prompt asking the model to rewrite one section and return the whole
/// document.
pub fn build_refinement_prompt(r: &RefinementRequest) -> String {
    // Value's Display is compact JSON, matching how the document was stored.
    let current = r.content.to_string();
    let mut prompt = String::with_capacity(current.len() + r.instructions.len() + 256);

    prompt.push_str(&format!(
        "Ajusta SOLO la sección \"{}\" del siguiente JSON de {}.\n",
        r.section,
        r.document.label()
    ));
    prompt.push_str("JSON actual:\n");
    prompt.push_str(&current);
    prompt.push_str("\nInstrucciones de ajuste:\n");
    prompt.push_str(&r.instructions);
    prompt.push_str(
        "\n\nDevuelve el JSON COMPLETO actualizado. \
         Responde únicamente con JSON válido, sin texto adicional.",
    );
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::DocumentKind;
    use serde_json::json;

    #[test]
    fn embeds_document_section_and_instructions() {
        let request = RefinementRequest::new(
            DocumentKind::TermPlan,
            json!({ "objetivos": ["Leer"], "actividades": ["Escribir"] }),
            "objetivos",
            "Hazlos medibles",
        );
        let prompt = build_refinement_prompt(&request);
        assert!(prompt.starts_with(
            "Ajusta SOLO la sección \"objetivos\" del siguiente JSON de planeador de clase.\n"
        ));
        assert!(prompt.contains(r#"{"objetivos":["Leer"],"actividades":["Escribir"]}"#));
        assert!(prompt.contains("Instrucciones de ajuste:\nHazlos medibles\n"));
        assert!(prompt.contains("JSON COMPLETO"));
    }

    #[test]
    fn label_follows_document_kind() {
        for kind in DocumentKind::ALL {
            let request = RefinementRequest::new(kind, json!({}), "x", "y");
            assert!(build_refinement_prompt(&request).contains(kind.label()));
        }
    }
}

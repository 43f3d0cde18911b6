use serde_json::json;

use super::{JSON_ONLY, push_framework, push_instructions, push_schema};
use crate::request::CurriculumParams;

/// Curriculum map prompt: one period object per academic period.
pub fn build_curriculum_prompt(p: &CurriculumParams) -> String {
    let mut prompt = String::with_capacity(4096);

    prompt.push_str(
        "Eres un experto en diseño curricular del sistema educativo colombiano. \
         Debes generar una malla curricular basándote ESTRICTAMENTE en:\n\n",
    );
    push_framework(
        &mut prompt,
        &[
            "Lineamientos Curriculares del área específica",
            "Orientaciones Pedagógicas del MEN para el área",
        ],
    );

    prompt.push_str("🎯 DATOS DE LA MALLA A GENERAR:\n");
    prompt.push_str(&format!("- Asignatura: {}\n", p.subject));
    prompt.push_str(&format!("- Grado: {}\n", p.grade));
    prompt.push_str(&format!("- Nivel Educativo: {}\n", p.level));
    prompt.push_str(&format!("- Rango de Edades: {}\n", p.ages));
    prompt.push_str(&format!(
        "- Número de Periodos Académicos: {}\n",
        p.period_count
    ));
    if let Some(year) = p.year {
        prompt.push_str(&format!("- Año de vigencia: {year}\n"));
    }
    prompt.push('\n');

    push_instructions(
        &mut prompt,
        &[
            format!("La malla DEBE estar alineada con el grado \"{}\" específico", p.grade),
            format!(
                "Los contenidos DEBEN corresponder a la asignatura \"{}\" únicamente",
                p.subject
            ),
            format!(
                "Las competencias DEBEN ser apropiadas para estudiantes de {}",
                p.ages
            ),
            format!("Usa los DBA del MEN para {} grado en {}", p.grade, p.subject),
            "Incluye estándares básicos de competencias del MEN para este nivel".to_string(),
            "Los indicadores de desempeño deben ser medibles y observables".to_string(),
            "Las estrategias metodológicas deben ser apropiadas para la edad".to_string(),
            "La evaluación debe seguir el Decreto 1290 de 2009".to_string(),
        ],
    );

    push_schema(&mut prompt, &schema(p));

    prompt.push_str(&format!(
        "GENERA {} PERIODOS COMPLETOS siguiendo esta estructura.\n",
        p.period_count
    ));
    prompt.push_str(JSON_ONLY);
    prompt
}

fn schema(p: &CurriculumParams) -> serde_json::Value {
    let year = match p.year {
        Some(year) => json!(year),
        None => json!("Año lectivo vigente"),
    };

    json!({
        "asignatura": p.subject,
        "grado": p.grade,
        "nivel": p.level,
        "edades": p.ages,
        "añoVigencia": year,
        "fundamentoLegal": "Ley 115 de 1994, Decreto 1290 de 2009, Estándares Básicos de Competencias MEN",
        "periodos": [{
            "numero": 1,
            "nombre": "Primer Periodo",
            "duracion": "10 semanas",
            "estandares": ["Estándar básico de competencia del MEN para este grado y área"],
            "dba": [format!("DBA específico del grado {} en {} según MEN", p.grade, p.subject)],
            "competencias": [format!(
                "Competencia específica del área {} apropiada para {} grado",
                p.subject, p.grade
            )],
            "indicadores": [format!(
                "Indicador de desempeño medible apropiado para estudiantes de {}",
                p.ages
            )],
            "contenidos": [{
                "eje": format!("Eje temático según lineamientos del MEN para {}", p.subject),
                "temas": [{
                    "nombre": format!("Tema específico del grado {}", p.grade),
                    "subtemas": ["Subtema 1", "Subtema 2"],
                    "tiempoSemanas": 3
                }]
            }],
            "estrategiasMetodologicas": [format!("Estrategia pedagógica apropiada para {}", p.ages)],
            "recursos": [format!("Recursos didácticos apropiados para {} grado", p.grade)],
            "evaluacion": {
                "criterios": ["Criterio de evaluación según Decreto 1290"],
                "instrumentos": ["Instrumento de evaluación apropiado"],
                "tiposEvaluacion": ["Heteroevaluación", "Autoevaluación", "Coevaluación"]
            }
        }]
    })
}

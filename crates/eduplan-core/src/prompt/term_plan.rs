use serde_json::json;

use super::{JSON_ONLY, push_framework, push_instructions, push_schema};
use crate::request::{TermPlanParams, supplied};

/// Term plan prompt covering one academic period.
pub fn build_term_plan_prompt(p: &TermPlanParams) -> String {
    let topic = supplied(&p.topic);
    let mut prompt = String::with_capacity(4096);

    prompt.push_str(
        "Eres un experto en diseño curricular y planeación pedagógica del sistema \
         educativo colombiano. Debes generar un PLANEADOR DE CLASE detallado basándote en:\n\n",
    );
    push_framework(
        &mut prompt,
        &[
            "Lineamientos Curriculares del área específica",
            "Modelo pedagógico constructivista y aprendizaje significativo",
        ],
    );

    prompt.push_str("🎯 DATOS DEL PLANEADOR A GENERAR:\n");
    prompt.push_str(&format!("- Asignatura: {}\n", p.subject));
    prompt.push_str(&format!("- Grado: {}\n", p.grade));
    prompt.push_str(&format!("- Periodo Académico: {}\n", p.period));
    prompt.push_str(&format!(
        "- Tema Central: {}\n",
        topic.unwrap_or("Tema del periodo según DBA")
    ));
    prompt.push_str("- Duración estimada: 1 periodo académico (10 semanas aproximadamente)\n\n");

    push_instructions(
        &mut prompt,
        &[
            format!("El planeador DEBE estar alineado con el grado \"{}\" específico", p.grade),
            format!(
                "Los contenidos DEBEN corresponder a la asignatura \"{}\" únicamente",
                p.subject
            ),
            "Las actividades deben seguir la estructura: INICIO → DESARROLLO → CIERRE".to_string(),
            format!("Usa los DBA del MEN para {} grado en {}", p.grade, p.subject),
            "Incluye estándares básicos de competencias del MEN para este nivel".to_string(),
            "Los objetivos deben ser SMART (específicos, medibles, alcanzables, relevantes, temporales)"
                .to_string(),
            "Las estrategias metodológicas deben promover el aprendizaje activo".to_string(),
            "La evaluación debe ser formativa y seguir el Decreto 1290 de 2009".to_string(),
            "Los recursos deben ser accesibles y pertinentes al contexto colombiano".to_string(),
        ],
    );

    push_schema(&mut prompt, &schema(p, topic));

    prompt.push_str("✅ GENERA UN PLANEADOR COMPLETO Y COHERENTE siguiendo esta estructura.\n");
    prompt.push_str(JSON_ONLY);
    prompt
}

fn schema(p: &TermPlanParams, topic: Option<&str>) -> serde_json::Value {
    json!({
        "asignatura": p.subject,
        "grado": p.grade,
        "periodo": p.period,
        "tema": topic.unwrap_or("Tema del periodo"),
        "duracion": "10 semanas",
        "fundamentoLegal": "Ley 115 de 1994, Decreto 1290 de 2009, Estándares MEN",
        "estandares": [format!(
            "Estándar básico de competencia del MEN para {} grado en {}",
            p.grade, p.subject
        )],
        "dba": [format!("DBA específico del grado {} en {} según MEN", p.grade, p.subject)],
        "objetivos": [
            format!(
                "Objetivo de aprendizaje específico, medible y alcanzable para el periodo {}",
                p.period
            ),
            format!("Objetivo que desarrolla competencias del área {}", p.subject)
        ],
        "competencias": [
            format!(
                "Competencia específica del área {} apropiada para {} grado",
                p.subject, p.grade
            ),
            "Competencia ciudadana o transversal pertinente"
        ],
        "contenidos": [
            {
                "semana": 1,
                "tema": "Subtema específico del tema central",
                "descripcion": "Descripción breve del contenido a trabajar"
            },
            {
                "semana": 2,
                "tema": "Siguiente subtema progresivo",
                "descripcion": "Descripción del contenido"
            }
        ],
        "actividades": {
            "inicio": [
                "Actividad de motivación y exploración de saberes previos (15-20 min)",
                "Presentación del objetivo de aprendizaje y contextualización"
            ],
            "desarrollo": [
                "Actividad de conceptualización y construcción de conocimiento (40-50 min)",
                "Trabajo colaborativo o individual aplicando lo aprendido",
                "Ejercicios prácticos con retroalimentación formativa"
            ],
            "cierre": [
                "Actividad de síntesis y reflexión sobre lo aprendido (10-15 min)",
                "Evaluación formativa y metacognición"
            ]
        },
        "estrategiasMetodologicas": [
            "Aprendizaje basado en problemas contextualizado",
            "Trabajo colaborativo en equipos heterogéneos",
            "Uso de TIC y recursos digitales educativos",
            "Diferenciación pedagógica según ritmos de aprendizaje"
        ],
        "recursos": [
            "Recurso didáctico específico y accesible",
            "Material tecnológico o digital pertinente",
            "Recursos del medio o contexto local colombiano"
        ],
        "evaluacion": {
            "criterios": [
                "Criterio de evaluación específico y observable",
                "Criterio que evalúa comprensión conceptual",
                "Criterio que evalúa aplicación práctica"
            ],
            "instrumentos": [
                "Rúbrica analítica para evaluar el desempeño",
                "Observación sistemática con registro",
                "Portafolio de evidencias del estudiante"
            ],
            "tipos": [
                "Heteroevaluación (docente evalúa estudiante)",
                "Autoevaluación (estudiante reflexiona sobre su proceso)",
                "Coevaluación (evaluación entre pares)"
            ],
            "momentos": {
                "diagnostica": "Exploración de saberes previos al inicio del periodo",
                "formativa": "Retroalimentación continua durante el desarrollo",
                "sumativa": "Valoración integral de aprendizajes al finalizar"
            }
        },
        "atencionDiversidad": [
            "Estrategia de apoyo para estudiantes con ritmo lento de aprendizaje",
            "Actividades de profundización para estudiantes avanzados",
            "Ajustes razonables según NEE (Necesidades Educativas Especiales)"
        ],
        "articulacionCurricular": {
            "transversalidad": "Conexión con otras áreas del conocimiento",
            "competenciasCiudadanas": "Desarrollo de convivencia, participación democrática",
            "proyectosPedagogicos": "Vinculación con proyectos institucionales (PRAE, educación sexual, etc.)"
        }
    })
}

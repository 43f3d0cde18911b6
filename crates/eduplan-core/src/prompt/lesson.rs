use serde_json::json;

use super::{JSON_ONLY, push_framework, push_instructions, push_schema};
use crate::request::{LessonParams, supplied};

/// Single-session lesson prompt: inicio, desarrollo and cierre with timings.
pub fn build_lesson_prompt(p: &LessonParams) -> String {
    let topic = supplied(&p.topic);
    let mut prompt = String::with_capacity(6144);

    prompt.push_str(
        "Eres un experto en diseño de clases y didáctica del sistema educativo colombiano. \
         Debes generar una PLANEACIÓN DE CLASE DETALLADA (sesión única) basándote en:\n\n",
    );
    push_framework(
        &mut prompt,
        &[
            "Modelo de clase estructurada: Inicio → Desarrollo → Cierre",
            "Enfoque por competencias y aprendizaje activo",
        ],
    );

    prompt.push_str("🎯 DATOS DE LA CLASE A GENERAR:\n");
    prompt.push_str(&format!("- Asignatura: {}\n", p.subject));
    prompt.push_str(&format!("- Grado: {}\n", p.grade));
    prompt.push_str(&format!(
        "- Tema de la clase: {}\n",
        topic.unwrap_or("Tema específico del currículo")
    ));
    prompt.push_str("- Duración: 1 sesión de clase (45-60 minutos aproximadamente)\n");
    prompt.push_str("- Enfoque: Clase práctica con actividades de aprendizaje activo\n\n");

    push_instructions(
        &mut prompt,
        &[
            format!("La clase DEBE estar alineada con el grado \"{}\" específico", p.grade),
            format!(
                "Los contenidos DEBEN corresponder a la asignatura \"{}\" únicamente",
                p.subject
            ),
            "Seguir la estructura temporal: INICIO (15 min) → DESARROLLO (30-35 min) → CIERRE (10 min)"
                .to_string(),
            "Los objetivos deben ser específicos para UNA SOLA SESIÓN de clase".to_string(),
            "Las actividades deben ser concretas, ejecutables y con tiempos definidos".to_string(),
            "Incluir estrategias de motivación y manejo de grupo".to_string(),
            "La evaluación debe ser formativa y continua durante la clase".to_string(),
            "Los recursos deben ser prácticos y disponibles en el aula colombiana".to_string(),
        ],
    );

    push_schema(&mut prompt, &schema(p, topic));

    prompt.push_str(
        "✅ GENERA UNA PLANEACIÓN DE CLASE COMPLETA, CONCRETA Y EJECUTABLE siguiendo esta estructura.\n",
    );
    prompt.push_str(JSON_ONLY);
    prompt
}

fn schema(p: &LessonParams, topic: Option<&str>) -> serde_json::Value {
    json!({
        "asignatura": p.subject,
        "grado": p.grade,
        "tema": topic.unwrap_or("Tema específico"),
        "duracion": "45-60 minutos",
        "fechaSugerida": "Sesión única dentro del periodo académico",
        "fundamentoLegal": "Estándares MEN, DBA vigentes",
        "estandar": format!(
            "Estándar básico de competencia del MEN para {} grado en {}",
            p.grade, p.subject
        ),
        "dba": format!(
            "DBA específico relacionado con el tema {}",
            topic.unwrap_or("del currículo")
        ),
        "objetivos": [
            "Objetivo específico de aprendizaje para esta sesión de clase",
            "Objetivo procedimental o actitudinal complementario"
        ],
        "competencias": [
            format!("Competencia específica del área {} que se desarrolla en esta clase", p.subject),
            "Competencia transversal (comunicativa, ciudadana, etc.)"
        ],
        "saberesPrevios": [
            "Conocimiento previo necesario que deben tener los estudiantes",
            "Concepto o habilidad base para esta clase"
        ],
        "actividades": {
            "inicio": {
                "duracion": "15 minutos",
                "actividades": [
                    "Saludo y toma de asistencia (2 min)",
                    "Actividad de motivación relacionada con el tema (5 min)",
                    "Exploración de saberes previos mediante preguntas orientadoras (5 min)",
                    "Presentación del objetivo de aprendizaje y agenda de la clase (3 min)"
                ],
                "estrategia": "Aprendizaje basado en indagación",
                "organizacion": "Trabajo en grupo completo"
            },
            "desarrollo": {
                "duracion": "30-35 minutos",
                "actividades": [
                    "Explicación del concepto central con ejemplos contextualizados (10 min)",
                    "Demostración práctica o modelamiento del docente (5 min)",
                    "Actividad práctica guiada en grupos pequeños (2-4 estudiantes) (10 min)",
                    "Socialización de resultados y retroalimentación formativa (5-10 min)"
                ],
                "estrategia": "Aprendizaje cooperativo y práctica guiada",
                "organizacion": "Grupos pequeños de 2-4 estudiantes",
                "diferenciacion": "Apoyo individualizado a estudiantes que lo requieran"
            },
            "cierre": {
                "duracion": "10 minutos",
                "actividades": [
                    "Síntesis colectiva de lo aprendido (4 min)",
                    "Metacognición: reflexión sobre cómo aprendieron (3 min)",
                    "Actividad de transferencia o tarea para la casa (2 min)",
                    "Despedida y proyección de la siguiente clase (1 min)"
                ],
                "estrategia": "Reflexión metacognitiva",
                "organizacion": "Trabajo individual y plenaria"
            }
        },
        "estrategiasDidacticas": [
            "Modelamiento del docente",
            "Trabajo colaborativo en equipos",
            "Uso de preguntas orientadoras",
            "Retroalimentación formativa continua"
        ],
        "estrategiasManejoGrupo": [
            "Establecimiento de normas claras al inicio",
            "Asignación de roles en trabajo grupal",
            "Monitoreo activo durante las actividades"
        ],
        "recursos": [
            "Tablero y marcadores",
            "Material concreto manipulable (especificar según tema)",
            "Fotocopias de guía de trabajo (1 por estudiante)"
        ],
        "evaluacion": {
            "tipo": "Evaluación formativa continua",
            "momentos": {
                "diagnostica": "Exploración de saberes previos en el inicio",
                "procesual": "Observación durante el desarrollo y retroalimentación inmediata",
                "final": "Síntesis y actividad de cierre"
            },
            "criterios": [
                "Comprende el concepto o procedimiento enseñado",
                "Aplica lo aprendido en situaciones prácticas"
            ],
            "instrumentos": [
                "Observación directa con registro anecdótico",
                "Preguntas orales durante la clase"
            ],
            "evidencias": [
                "Trabajo práctico desarrollado en la clase",
                "Participación oral documentada"
            ]
        },
        "atencionDiversidad": [
            "Explicación con múltiples representaciones (visual, auditiva, kinestésica)",
            "Tiempo adicional para estudiantes con NEE"
        ],
        "tareaCasa": {
            "descripcion": "Actividad corta de refuerzo o aplicación",
            "duracion": "15-20 minutos",
            "objetivo": "Consolidar el aprendizaje de la clase"
        },
        "reflexionDocente": {
            "preguntasGuia": [
                "¿Los estudiantes alcanzaron el objetivo de aprendizaje?",
                "¿Qué ajustes debo hacer para la próxima sesión?",
                "¿Qué estudiantes requieren apoyo adicional?"
            ]
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embeds_subject_grade_and_topic() {
        let prompt = build_lesson_prompt(&LessonParams {
            subject: "Matemáticas".to_string(),
            grade: "3°".to_string(),
            topic: Some("Fracciones".to_string()),
        });
        assert!(prompt.contains("- Asignatura: Matemáticas\n"));
        assert!(prompt.contains("- Grado: 3°\n"));
        assert!(prompt.contains("- Tema de la clase: Fracciones\n"));
        assert!(prompt.contains("DBA específico relacionado con el tema Fracciones"));
        assert!(prompt.contains("grado \"3°\" específico"));
    }

    #[test]
    fn no_topic_uses_curriculum_placeholder() {
        let prompt = build_lesson_prompt(&LessonParams {
            subject: "Inglés".to_string(),
            grade: "6".to_string(),
            topic: None,
        });
        assert!(prompt.contains("- Tema de la clase: Tema específico del currículo\n"));
        assert!(prompt.contains("\"tema\": \"Tema específico\""));
        assert!(prompt.ends_with(JSON_ONLY));
    }
}

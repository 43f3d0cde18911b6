use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Datelike;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use uuid::Uuid;

use eduplan_core::response::excerpt;
use eduplan_core::{
    CurriculumParams, DocumentKind, FailureKind, GenerationPipeline, GenerationRequest,
    LessonParams, PipelineError, RefinementRequest, RequestError, TermPlanParams,
};
use eduplan_store::{ContentStore, MemoryStore, NewRecord};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

pub struct AppError {
    status: StatusCode,
    message: String,
    kind: Option<FailureKind>,
    /// Extra top-level fields merged into the JSON body.
    extra: serde_json::Map<String, Value>,
}

impl AppError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            kind: None,
            extra: serde_json::Map::new(),
        }
    }

    fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.extra.insert(key.to_string(), value.into());
        self
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, msg)
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, msg)
    }

    pub fn missing_fields(err: &RequestError) -> Self {
        let mut app = Self::bad_request("Faltan datos requeridos")
            .with("required", err.required.clone())
            .with("missing", err.missing.clone());
        app.kind = Some(FailureKind::InvalidRequest);
        app
    }

    /// The full chain goes to the log; the client only sees the outermost
    /// message, bounded like any other diagnostic.
    pub fn internal(err: anyhow::Error) -> Self {
        tracing::error!(error = %format!("{err:#}"), "request failed");
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Error interno")
            .with("detalles", excerpt(&err.to_string()))
    }
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        let kind = err.kind();
        let mut app = match &err {
            PipelineError::InvalidRequest(missing) => return Self::missing_fields(missing),
            PipelineError::NoCredential => {
                Self::new(StatusCode::SERVICE_UNAVAILABLE, "La IA no está configurada")
            }
            PipelineError::AuthRejected { .. } | PipelineError::AllModelsFailed { .. } => {
                Self::new(StatusCode::BAD_GATEWAY, "La IA no pudo generar una respuesta")
            }
            PipelineError::InvalidResponseShape { reason, excerpt } => {
                let message = if reason.is_shape_error() {
                    "La IA devolvió JSON sin la estructura esperada"
                } else {
                    "La IA no devolvió JSON válido"
                };
                Self::new(StatusCode::BAD_GATEWAY, message).with("muestra", excerpt.as_str())
            }
            PipelineError::Cancelled => {
                Self::new(StatusCode::SERVICE_UNAVAILABLE, "Generación cancelada")
            }
        };
        app.kind = Some(kind);
        app.with("detalles", err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut body = serde_json::Map::new();
        body.insert("error".to_string(), Value::String(self.message));
        if let Some(kind) = self.kind {
            body.insert("kind".to_string(), Value::String(kind.to_string()));
        }
        body.extend(self.extra);
        (self.status, Json(Value::Object(body))).into_response()
    }
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct AppState {
    pipeline: GenerationPipeline,
    store: Arc<dyn ContentStore>,
    /// Cancelled on shutdown; every generation runs under a child token.
    shutdown: CancellationToken,
}

impl AppState {
    pub fn new(
        pipeline: GenerationPipeline,
        store: Arc<dyn ContentStore>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            pipeline,
            store,
            shutdown,
        }
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/{kind}", post(save_record))
        .route("/{kind}/generar", post(generate))
        .route("/{kind}/refinar", post(refine))
        .route("/{kind}/user/{user_id}", get(list_records))
        .route("/{kind}/{id}", get(get_record).delete(delete_record))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub async fn run_serve(pipeline: GenerationPipeline, bind: &str, port: u16) -> Result<()> {
    let shutdown = CancellationToken::new();
    let state = AppState::new(pipeline, Arc::new(MemoryStore::new()), shutdown.clone());
    let app = build_router(state);

    let addr: SocketAddr = format!("{bind}:{port}").parse()?;
    tracing::info!("eduplan serve listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await?;
    tracing::info!("eduplan serve shut down");
    Ok(())
}

async fn shutdown_signal(shutdown: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to install Ctrl+C handler");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested, cancelling in-flight generations");
    shutdown.cancel();
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

fn parse_kind(kind: &str) -> Result<DocumentKind, AppError> {
    kind.parse()
        .map_err(|_| AppError::not_found(format!("unknown document kind {kind:?}")))
}

fn decode<T: DeserializeOwned>(body: Value) -> Result<T, AppError> {
    serde_json::from_value(body).map_err(|e| AppError::bad_request(format!("invalid body: {e}")))
}

fn current_year() -> i32 {
    chrono::Local::now().year()
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    let orchestrator = state.pipeline.orchestrator();
    Json(json!({
        "status": "ok",
        "credential": orchestrator.has_credential(),
        "models": orchestrator.models().iter().collect::<Vec<_>>(),
    }))
}

async fn generate(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Json(body): Json<Value>,
) -> Result<Response, AppError> {
    let request = match parse_kind(&kind)? {
        DocumentKind::CurriculumMap => {
            let mut params: CurriculumParams = decode(body)?;
            params.year.get_or_insert_with(current_year);
            GenerationRequest::CurriculumMap(params)
        }
        DocumentKind::TermPlan => GenerationRequest::TermPlan(decode::<TermPlanParams>(body)?),
        DocumentKind::LessonSession => {
            GenerationRequest::LessonSession(decode::<LessonParams>(body)?)
        }
    };
    run_pipeline(&state, &request).await
}

async fn refine(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Json(body): Json<Value>,
) -> Result<Response, AppError> {
    let document = parse_kind(&kind)?;
    let mut refinement: RefinementRequest = decode(body)?;
    refinement.document = document;
    run_pipeline(&state, &GenerationRequest::SectionRefinement(refinement)).await
}

async fn run_pipeline(state: &AppState, request: &GenerationRequest) -> Result<Response, AppError> {
    let cancel = state.shutdown.child_token();
    let content = state.pipeline.run_cancellable(request, &cancel).await?;
    Ok(Json(json!({ "contenido": content })).into_response())
}

async fn save_record(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Json(body): Json<Value>,
) -> Result<Response, AppError> {
    let kind = parse_kind(&kind)?;
    let mut record: NewRecord = decode(body)?;
    record.kind = kind;

    if record.user_id.trim().is_empty() {
        return Err(AppError::bad_request("Faltan datos requeridos").with("required", vec!["userId"]));
    }
    if kind == DocumentKind::CurriculumMap {
        record.year.get_or_insert_with(current_year);
    }

    let stored = state.store.insert(record).await.map_err(AppError::internal)?;
    Ok((StatusCode::CREATED, Json(json!({ "id": stored.id }))).into_response())
}

async fn list_records(
    State(state): State<AppState>,
    Path((kind, user_id)): Path<(String, String)>,
) -> Result<Response, AppError> {
    let kind = parse_kind(&kind)?;
    let records = state
        .store
        .list_for_user(kind, &user_id)
        .await
        .map_err(AppError::internal)?;
    Ok(Json(records).into_response())
}

async fn get_record(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, Uuid)>,
) -> Result<Response, AppError> {
    let kind = parse_kind(&kind)?;
    let record = state
        .store
        .get(kind, id)
        .await
        .map_err(AppError::internal)?
        .ok_or_else(|| AppError::not_found(format!("{kind} record {id} not found")))?;
    Ok(Json(record).into_response())
}

async fn delete_record(
    State(state): State<AppState>,
    Path((kind, id)): Path<(String, Uuid)>,
) -> Result<Response, AppError> {
    let kind = parse_kind(&kind)?;
    if state.store.delete(kind, id).await.map_err(AppError::internal)? {
        Ok(StatusCode::NO_CONTENT.into_response())
    } else {
        Err(AppError::not_found(format!("{kind} record {id} not found")))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::{Value, json};
    use tokio_util::sync::CancellationToken;
    use tower::ServiceExt;

    use eduplan_core::{FallbackOrchestrator, GenerationPipeline, ModelCandidates};
    use eduplan_test_utils::{
        Outcome, ScriptedClient, curriculum_json, fenced, fresh_store, lesson_json, models,
        term_plan_json,
    };

    use super::{AppState, build_router};

    // -----------------------------------------------------------------------
    // HTTP helpers
    // -----------------------------------------------------------------------

    fn state_with(client: Arc<ScriptedClient>) -> AppState {
        AppState::new(
            GenerationPipeline::with_client(models(&["m1", "m2"]), client),
            fresh_store(),
            CancellationToken::new(),
        )
    }

    async fn send(
        state: AppState,
        method: &str,
        uri: &str,
        body: Option<Value>,
    ) -> axum::response::Response {
        let app = build_router(state);
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        app.oneshot(request).await.unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), 1_048_576)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    // -----------------------------------------------------------------------
    // Generation
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn generate_lesson_reconciles_fields() {
        let client = ScriptedClient::new()
            .on("m1", Outcome::Http(500))
            .text("m2", fenced(&lesson_json("Matematicas", "3", "fracciones").to_string()))
            .into_shared();

        let resp = send(
            state_with(client.clone()),
            "POST",
            "/clases/generar",
            Some(json!({ "asignatura": "Matemáticas", "grado": "3°", "tema": "Fracciones" })),
        )
        .await;

        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["contenido"]["asignatura"], "Matemáticas");
        assert_eq!(json["contenido"]["grado"], "3°");
        assert_eq!(json["contenido"]["tema"], "Fracciones");
        assert_eq!(client.attempts(), vec!["m1", "m2"]);
    }

    #[tokio::test]
    async fn generate_curriculum_fills_current_year() {
        let client = ScriptedClient::new()
            .text("m1", curriculum_json("Ciencias", "5", 2).to_string())
            .into_shared();

        let resp = send(
            state_with(client.clone()),
            "POST",
            "/curriculum/generar",
            Some(json!({
                "asignatura": "Ciencias", "grado": 5, "nivel": "Básica primaria",
                "edades": "10-11 años", "periodos": "2"
            })),
        )
        .await;

        assert_eq!(resp.status(), StatusCode::OK);
        let year = super::current_year().to_string();
        assert!(client.prompts()[0].contains(&year));
    }

    #[tokio::test]
    async fn missing_fields_return_required_list() {
        let client = ScriptedClient::new().into_shared();
        let resp = send(
            state_with(client.clone()),
            "POST",
            "/planeadores/generar",
            Some(json!({ "asignatura": "Sociales" })),
        )
        .await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let json = body_json(resp).await;
        assert_eq!(json["error"], "Faltan datos requeridos");
        assert_eq!(json["kind"], "invalid_request");
        assert_eq!(json["required"], json!(["asignatura", "grado", "periodo"]));
        assert_eq!(json["missing"], json!(["grado", "periodo"]));
        assert!(client.attempts().is_empty());
    }

    #[tokio::test]
    async fn invalid_json_from_model_carries_sample() {
        let client = ScriptedClient::new()
            .text("m1", "Lo siento, no puedo generar eso.")
            .into_shared();
        let resp = send(
            state_with(client),
            "POST",
            "/clases/generar",
            Some(json!({ "asignatura": "Arte", "grado": "2" })),
        )
        .await;

        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
        let json = body_json(resp).await;
        assert_eq!(json["error"], "La IA no devolvió JSON válido");
        assert_eq!(json["kind"], "invalid_response_shape");
        assert_eq!(json["muestra"], "Lo siento, no puedo generar eso.");
        assert!(json["detalles"].as_str().unwrap().contains("not valid JSON"));
    }

    #[tokio::test]
    async fn shape_violation_is_reported_separately() {
        let client = ScriptedClient::new()
            .text("m1", r#"{"asignatura":"Arte","objetivos":["a"]}"#)
            .into_shared();
        let resp = send(
            state_with(client),
            "POST",
            "/clases/generar",
            Some(json!({ "asignatura": "Arte", "grado": "2" })),
        )
        .await;

        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
        let json = body_json(resp).await;
        assert_eq!(json["error"], "La IA devolvió JSON sin la estructura esperada");
    }

    #[tokio::test]
    async fn exhausted_models_are_bad_gateway() {
        let client = ScriptedClient::new()
            .on("m1", Outcome::Http(500))
            .on("m2", Outcome::Http(503))
            .into_shared();
        let resp = send(
            state_with(client),
            "POST",
            "/clases/generar",
            Some(json!({ "asignatura": "Arte", "grado": "2" })),
        )
        .await;

        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(body_json(resp).await["kind"], "all_models_failed");
    }

    #[tokio::test]
    async fn auth_failure_is_reported() {
        let client = ScriptedClient::new().on("m1", Outcome::Auth(401)).into_shared();
        let resp = send(
            state_with(client.clone()),
            "POST",
            "/clases/generar",
            Some(json!({ "asignatura": "Arte", "grado": "2" })),
        )
        .await;

        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
        assert_eq!(body_json(resp).await["kind"], "auth_rejected");
        assert_eq!(client.attempts(), vec!["m1"]);
    }

    #[tokio::test]
    async fn no_credential_is_service_unavailable() {
        let state = AppState::new(
            GenerationPipeline::new(FallbackOrchestrator::without_credential(
                ModelCandidates::default(),
            )),
            fresh_store(),
            CancellationToken::new(),
        );
        let resp = send(
            state,
            "POST",
            "/clases/generar",
            Some(json!({ "asignatura": "Arte", "grado": "2" })),
        )
        .await;

        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body_json(resp).await["kind"], "no_credential");
    }

    #[tokio::test]
    async fn shutdown_cancels_generation() {
        let client = ScriptedClient::new().on("m1", Outcome::Stall).into_shared();
        let state = state_with(client);
        state.shutdown.cancel();

        let resp = send(
            state,
            "POST",
            "/clases/generar",
            Some(json!({ "asignatura": "Arte", "grado": "2" })),
        )
        .await;

        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body_json(resp).await["kind"], "cancelled");
    }

    #[tokio::test]
    async fn refine_uses_route_document_label() {
        let refined = term_plan_json("Sociales", "7", "2");
        let client = ScriptedClient::new()
            .text("m1", fenced(&refined.to_string()))
            .into_shared();

        let resp = send(
            state_with(client.clone()),
            "POST",
            "/planeadores/refinar",
            Some(json!({
                "contenido": { "objetivos": ["viejo"] },
                "seccion": "objetivos",
                "instrucciones": "Más concretos"
            })),
        )
        .await;

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["contenido"], refined);
        assert!(client.prompts()[0].contains("JSON de planeador de clase"));
    }

    #[tokio::test]
    async fn refine_requires_all_fields() {
        let client = ScriptedClient::new().into_shared();
        let resp = send(
            state_with(client),
            "POST",
            "/curriculum/refinar",
            Some(json!({ "seccion": "periodos" })),
        )
        .await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let json = body_json(resp).await;
        assert_eq!(json["required"], json!(["contenido", "seccion", "instrucciones"]));
    }

    #[tokio::test]
    async fn unknown_kind_is_not_found() {
        let client = ScriptedClient::new().into_shared();
        let resp = send(state_with(client), "POST", "/mallas/generar", Some(json!({}))).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    // -----------------------------------------------------------------------
    // Records
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn record_lifecycle() {
        let state = state_with(ScriptedClient::new().into_shared());

        let resp = send(
            state.clone(),
            "POST",
            "/curriculum",
            Some(json!({
                "userId": "docente-1",
                "asignatura": "Ciencias",
                "grado": "5",
                "nivel": "Básica primaria",
                "edades": "10-11",
                "periodos": 4,
                "contenido": curriculum_json("Ciencias", "5", 4)
            })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let id = body_json(resp).await["id"].as_str().unwrap().to_string();

        let resp = send(state.clone(), "GET", "/curriculum/user/docente-1", None).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let list = body_json(resp).await;
        let list = list.as_array().unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0]["id"], id);
        assert_eq!(list[0]["anio"], super::current_year());

        // Scoped per kind.
        let resp = send(state.clone(), "GET", &format!("/clases/{id}"), None).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = send(state.clone(), "GET", &format!("/curriculum/{id}"), None).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["contenido"]["periodos"].as_array().unwrap().len(), 4);

        let resp = send(state.clone(), "DELETE", &format!("/curriculum/{id}"), None).await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);

        let resp = send(state, "DELETE", &format!("/curriculum/{id}"), None).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn list_is_newest_first() {
        let state = state_with(ScriptedClient::new().into_shared());
        for topic in ["Primero", "Segundo"] {
            let resp = send(
                state.clone(),
                "POST",
                "/clases",
                Some(json!({
                    "userId": "docente-2", "asignatura": "Arte", "grado": "2",
                    "tema": topic, "contenido": {}
                })),
            )
            .await;
            assert_eq!(resp.status(), StatusCode::CREATED);
        }

        let list = body_json(send(state, "GET", "/clases/user/docente-2", None).await).await;
        let topics: Vec<&str> = list
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["tema"].as_str().unwrap())
            .collect();
        assert_eq!(topics, vec!["Segundo", "Primero"]);
    }

    #[tokio::test]
    async fn save_accepts_numeric_user_id() {
        let state = state_with(ScriptedClient::new().into_shared());
        let resp = send(
            state.clone(),
            "POST",
            "/planeadores",
            Some(json!({
                "userId": 7, "asignatura": "Sociales", "grado": 7,
                "periodo": 2, "contenido": term_plan_json("Sociales", "7", "2")
            })),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        let list = body_json(send(state, "GET", "/planeadores/user/7", None).await).await;
        let list = list.as_array().unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0]["userId"], "7");
        assert_eq!(list[0]["periodo"], "2");
    }

    #[test]
    fn internal_errors_hide_the_cause_chain() {
        let err = anyhow::anyhow!("disk path /var/secret unreadable").context("store write failed");
        let app = super::AppError::internal(err);
        assert_eq!(app.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(app.message, "Error interno");
        assert_eq!(app.extra["detalles"], "store write failed");
    }

    #[tokio::test]
    async fn save_requires_user_id() {
        let state = state_with(ScriptedClient::new().into_shared());
        let resp = send(state, "POST", "/planeadores", Some(json!({ "asignatura": "x" }))).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(resp).await["required"], json!(["userId"]));
    }

    #[tokio::test]
    async fn health_reports_models() {
        let state = state_with(ScriptedClient::new().into_shared());
        let resp = send(state, "GET", "/health", None).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["credential"], true);
        assert_eq!(json["models"], json!(["m1", "m2"]));
    }
}

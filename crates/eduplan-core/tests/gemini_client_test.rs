//! Gemini client behaviour against a mocked Generative Language API.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use eduplan_core::client::CatalogError;
use eduplan_core::{ApiKey, GeminiClient, ModelClient, ModelFailure, TransientReason};

const KEY: &str = "test-key";

fn client(server: &MockServer) -> GeminiClient {
    GeminiClient::new(
        server.uri(),
        ApiKey::new(KEY).unwrap(),
        Duration::from_secs(5),
    )
    .unwrap()
}

fn text_response(text: &str) -> serde_json::Value {
    json!({
        "candidates": [{ "content": { "parts": [{ "text": text }], "role": "model" } }]
    })
}

#[tokio::test]
async fn sends_prompt_and_key_and_returns_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.5-flash:generateContent"))
        .and(query_param("key", KEY))
        .and(body_partial_json(json!({
            "contents": [{ "parts": [{ "text": "hola" }] }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(text_response("{\"ok\":true}")))
        .expect(1)
        .mount(&server)
        .await;

    let text = client(&server).invoke("gemini-2.5-flash", "hola").await.unwrap();
    assert_eq!(text, "{\"ok\":true}");
}

#[tokio::test]
async fn inline_data_is_used_when_text_is_absent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/m:generateContent"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{ "content": { "parts": [
                { "inlineData": { "mimeType": "text/plain", "data": "inline payload" } }
            ] } }]
        })))
        .mount(&server)
        .await;

    assert_eq!(client(&server).invoke("m", "p").await.unwrap(), "inline payload");
}

#[tokio::test]
async fn unauthorized_and_forbidden_are_auth_failures() {
    for status in [401u16, 403] {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(status).set_body_string("API key not valid"))
            .mount(&server)
            .await;

        let err = client(&server).invoke("m", "p").await.unwrap_err();
        assert_eq!(
            err,
            ModelFailure::Auth {
                model: "m".to_string(),
                status
            }
        );
    }
}

#[tokio::test]
async fn server_error_is_transient_with_bounded_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("x".repeat(2_000)))
        .mount(&server)
        .await;

    let err = client(&server).invoke("m", "p").await.unwrap_err();
    match err {
        ModelFailure::Transient {
            model,
            reason: TransientReason::Http { status, body },
        } => {
            assert_eq!(model, "m");
            assert_eq!(status, 503);
            assert_eq!(body.len(), 500);
        }
        other => panic!("expected transient HTTP failure, got {other:?}"),
    }
}

#[tokio::test]
async fn blocked_prompt_without_candidates_is_empty_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "promptFeedback": { "blockReason": "SAFETY" }
        })))
        .mount(&server)
        .await;

    let err = client(&server).invoke("m", "p").await.unwrap_err();
    assert_eq!(err, ModelFailure::transient("m", TransientReason::EmptyText));
}

#[tokio::test]
async fn non_json_envelope_is_malformed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>proxy error</html>"))
        .mount(&server)
        .await;

    let err = client(&server).invoke("m", "p").await.unwrap_err();
    assert!(matches!(
        err,
        ModelFailure::Transient {
            reason: TransientReason::MalformedEnvelope(_),
            ..
        }
    ));
}

#[tokio::test]
async fn slow_server_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(text_response("late"))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let impatient = GeminiClient::new(
        server.uri(),
        ApiKey::new(KEY).unwrap(),
        Duration::from_millis(200),
    )
    .unwrap();
    let err = impatient.invoke("m", "p").await.unwrap_err();
    assert_eq!(err, ModelFailure::transient("m", TransientReason::Timeout));
}

#[tokio::test]
async fn list_models_keeps_generate_content_models() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1beta/models"))
        .and(query_param("key", KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "models": [
                {
                    "name": "models/gemini-2.5-flash",
                    "displayName": "Gemini 2.5 Flash",
                    "supportedGenerationMethods": ["generateContent", "countTokens"]
                },
                {
                    "name": "models/text-embedding-004",
                    "supportedGenerationMethods": ["embedContent"]
                }
            ]
        })))
        .mount(&server)
        .await;

    let models = client(&server).list_models().await.unwrap();
    assert_eq!(models.len(), 1);
    assert_eq!(models[0].id, "gemini-2.5-flash");
    assert_eq!(models[0].display_name.as_deref(), Some("Gemini 2.5 Flash"));
}

#[tokio::test]
async fn list_models_reports_rejected_key() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1beta/models"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let err = client(&server).list_models().await.unwrap_err();
    assert!(matches!(err, CatalogError::Unauthorized { status: 403 }));
}

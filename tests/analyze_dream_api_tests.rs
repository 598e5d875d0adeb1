// tests/analyze_dream_api_tests.rs
// End-to-end tests of POST /api/analyze-dream against the real router with
// mock identity and completion collaborators.

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use somnia_backend::config::Config;
use somnia_backend::errors::AppError;
use somnia_backend::test_helpers::{spawn_test_app, spawn_test_app_with_config};

const WELL_FORMED_ANALYSIS: &str = r#"{"title":"Flight","interpretation":"A sense of release from waking constraints.","mood":"Peaceful","keywords":["flying","ocean"]}"#;

fn analyze_request(body: &Value, auth: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri("/api/analyze-dream")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = auth {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn assert_analysis_schema(body: &Value) {
    assert!(body["title"].is_string());
    assert!(body["interpretation"].is_string());
    assert!(body["mood"].is_string());
    assert!(body["keywords"].is_array());
}

#[tokio::test]
async fn missing_dream_content_returns_400_without_upstream_call() {
    let app = spawn_test_app();

    let response = app
        .router
        .oneshot(analyze_request(&json!({}), Some("valid-token")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(
        body["error"],
        "dreamContent is required and must be a string"
    );
    assert_eq!(app.mock_ai_client.call_count(), 0);
    assert_eq!(app.mock_identity_verifier.call_count(), 0);
}

#[tokio::test]
async fn non_string_dream_content_returns_400_without_upstream_call() {
    let app = spawn_test_app();

    let response = app
        .router
        .oneshot(analyze_request(
            &json!({"dreamContent": 42}),
            Some("valid-token"),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(
        body["error"],
        "dreamContent is required and must be a string"
    );
    assert_eq!(app.mock_ai_client.call_count(), 0);
}

#[tokio::test]
async fn missing_authorization_header_returns_401_without_upstream_call() {
    let app = spawn_test_app();

    let response = app
        .router
        .oneshot(analyze_request(
            &json!({"dreamContent": "I was flying."}),
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Missing authorization header");
    assert_eq!(app.mock_ai_client.call_count(), 0);
    assert_eq!(app.mock_identity_verifier.call_count(), 0);
}

#[tokio::test]
async fn unverifiable_token_returns_401_without_upstream_call() {
    let app = spawn_test_app();
    app.mock_identity_verifier.reject_tokens();

    let response = app
        .router
        .oneshot(analyze_request(
            &json!({"dreamContent": "I was flying."}),
            Some("expired-token"),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Unauthorized - Invalid token");
    assert_eq!(app.mock_identity_verifier.call_count(), 1);
    assert_eq!(app.mock_ai_client.call_count(), 0);
}

#[tokio::test]
async fn well_formed_completion_is_returned_unmodified() {
    let app = spawn_test_app();
    app.mock_ai_client
        .set_text_response(WELL_FORMED_ANALYSIS.to_string());

    let response = app
        .router
        .oneshot(analyze_request(
            &json!({"dreamContent": "I was flying over the ocean."}),
            Some("valid-token"),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(
        body,
        serde_json::from_str::<Value>(WELL_FORMED_ANALYSIS).unwrap()
    );
    assert_eq!(app.mock_ai_client.call_count(), 1);
}

#[tokio::test]
async fn upstream_failure_returns_500_with_error_envelope() {
    let app = spawn_test_app();
    app.mock_ai_client.set_response(Err(AppError::UpstreamUnavailable(
        "OpenAI API error: model overloaded".to_string(),
    )));

    let response = app
        .router
        .oneshot(analyze_request(
            &json!({"dreamContent": "A storm over the city."}),
            Some("valid-token"),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body["error"], "OpenAI API error: model overloaded");
}

#[tokio::test]
async fn unparseable_completion_returns_500() {
    let app = spawn_test_app();
    app.mock_ai_client
        .set_text_response("The dream clearly means you are stressed.".to_string());

    let response = app
        .router
        .oneshot(analyze_request(
            &json!({"dreamContent": "A storm."}),
            Some("valid-token"),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Invalid JSON response from AI");
}

#[tokio::test]
async fn completion_missing_required_field_returns_500_not_partial_success() {
    let app = spawn_test_app();
    app.mock_ai_client.set_text_response(
        r#"{"title":"Storm","interpretation":"Turbulence ahead.","keywords":["storm"]}"#
            .to_string(),
    );

    let response = app
        .router
        .oneshot(analyze_request(
            &json!({"dreamContent": "A storm."}),
            Some("valid-token"),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body["error"], "AI response missing required fields");
}

#[tokio::test]
async fn completion_with_non_sequence_keywords_returns_500() {
    let app = spawn_test_app();
    app.mock_ai_client.set_text_response(
        r#"{"title":"Storm","interpretation":"Turbulence.","mood":"Anxious","keywords":"storm"}"#
            .to_string(),
    );

    let response = app
        .router
        .oneshot(analyze_request(
            &json!({"dreamContent": "A storm."}),
            Some("valid-token"),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body["error"], "AI response missing required fields");
}

#[tokio::test]
async fn syntactically_invalid_body_returns_400_json_envelope() {
    let app = spawn_test_app();

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/analyze-dream")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, "Bearer valid-token")
        .body(Body::from("{not json"))
        .unwrap();

    let response = app.router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    // Even a body the parser rejects outright must get the JSON envelope.
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().starts_with("Invalid JSON body"));
    assert_eq!(app.mock_ai_client.call_count(), 0);
    assert_eq!(app.mock_identity_verifier.call_count(), 0);
}

#[tokio::test]
async fn upstream_timeout_returns_500_error_envelope() {
    let config = Config {
        upstream_timeout_secs: 0,
        ..Config::default()
    };
    let app = spawn_test_app_with_config(config);
    app.mock_ai_client
        .set_text_response(WELL_FORMED_ANALYSIS.to_string());
    app.mock_ai_client
        .set_response_delay(std::time::Duration::from_millis(200));

    let response = app
        .router
        .oneshot(analyze_request(
            &json!({"dreamContent": "An endless corridor."}),
            Some("valid-token"),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("timed out"));
}

#[tokio::test]
async fn oversized_dream_content_returns_400_without_upstream_call() {
    let config = Config {
        max_dream_content_bytes: 128,
        ..Config::default()
    };
    let app = spawn_test_app_with_config(config);

    let response = app
        .router
        .oneshot(analyze_request(
            &json!({"dreamContent": "z".repeat(256)}),
            Some("valid-token"),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(app.mock_ai_client.call_count(), 0);
}

#[tokio::test]
async fn cors_preflight_returns_200_without_auth() {
    let app = spawn_test_app();

    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/analyze-dream")
        .header(header::ORIGIN, "https://app.example.com")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "authorization, content-type")
        .body(Body::empty())
        .unwrap();

    let response = app.router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response
        .headers()
        .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
    assert_eq!(app.mock_ai_client.call_count(), 0);
    assert_eq!(app.mock_identity_verifier.call_count(), 0);
}

// The completion collaborator is non-deterministic at temperature > 0, so
// repeated submissions of the same dream assert schema conformance only.
#[tokio::test]
async fn repeated_submissions_assert_schema_not_value_equality() {
    let app = spawn_test_app();
    let payload = json!({"dreamContent": "I was flying over the ocean."});

    app.mock_ai_client
        .set_text_response(WELL_FORMED_ANALYSIS.to_string());
    let first = app
        .router
        .clone()
        .oneshot(analyze_request(&payload, Some("valid-token")))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    let first_body = body_json(first).await;
    assert_analysis_schema(&first_body);

    app.mock_ai_client.set_text_response(
        r#"{"title":"Drifting","interpretation":"A wish for distance.","mood":"Wistful","keywords":["sky"]}"#
            .to_string(),
    );
    let second = app
        .router
        .clone()
        .oneshot(analyze_request(&payload, Some("valid-token")))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::OK);
    let second_body = body_json(second).await;
    assert_analysis_schema(&second_body);

    assert_eq!(app.mock_ai_client.call_count(), 2);
}

#[tokio::test]
async fn health_endpoint_reports_ok() {
    let app = spawn_test_app();

    let request = Request::builder()
        .method(Method::GET)
        .uri("/api/health")
        .body(Body::empty())
        .unwrap();

    let response = app.router.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
}

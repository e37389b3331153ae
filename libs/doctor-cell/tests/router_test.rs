// libs/doctor-cell/tests/router_test.rs
//
// Routing and authentication behaviour over the wire: bearer tokens,
// public versus protected routes, and the error body shape.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use doctor_cell::router::doctor_routes;
use doctor_cell::DoctorCellState;
use shared_storage::MemoryStore;
use shared_utils::test_utils::{JwtTestUtils, TestConfig, TestUser};

fn test_app() -> (Router, TestConfig) {
    let config = TestConfig::default();
    let store = Arc::new(MemoryStore::new());
    let state = DoctorCellState {
        config: config.to_arc(),
        directory: store.clone(),
        appointments: store,
    };
    (doctor_routes(state), config)
}

fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn protected_routes_require_a_token() {
    let (app, _config) = test_app();

    let request = Request::builder()
        .method("POST")
        .uri("/")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({"id": Uuid::new_v4(), "consultation_fee": 40.0}).to_string(),
        ))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("authorization"));
}

#[tokio::test]
async fn expired_tokens_are_rejected() {
    let (app, config) = test_app();
    let admin = TestUser::admin();
    let token = JwtTestUtils::create_expired_token(&admin, &config.jwt_secret);

    let request = Request::builder()
        .method("PUT")
        .uri(&format!("/{}/availability", Uuid::new_v4()))
        .header("authorization", bearer(&token))
        .header("content-type", "application/json")
        .body(Body::from(json!({"windows": []}).to_string()))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn doctor_lookup_is_public() {
    let (app, _config) = test_app();

    let request = Request::builder()
        .method("GET")
        .uri(&format!("/{}", Uuid::new_v4()))
        .body(Body::empty())
        .unwrap();

    // No token required; the unknown id still reports not found.
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn admin_token_registers_and_the_record_is_readable() {
    let (app, config) = test_app();
    let admin = TestUser::admin();
    let token = JwtTestUtils::create_test_token(&admin, &config.jwt_secret, None);
    let doctor_id = Uuid::new_v4();

    let request = Request::builder()
        .method("POST")
        .uri("/")
        .header("authorization", bearer(&token))
        .header("content-type", "application/json")
        .body(Body::from(
            json!({
                "id": doctor_id,
                "specialty": "dermatology",
                "consultation_fee": 95.0
            })
            .to_string(),
        ))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let request = Request::builder()
        .method("GET")
        .uri(&format!("/{}", doctor_id))
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["doctor"]["specialty"], "dermatology");
    assert_eq!(body["doctor"]["consultation_fee"], 95.0);
}

#[tokio::test]
async fn patient_token_cannot_register_doctors() {
    let (app, config) = test_app();
    let patient = TestUser::patient();
    let token = JwtTestUtils::create_test_token(&patient, &config.jwt_secret, None);

    let request = Request::builder()
        .method("POST")
        .uri("/")
        .header("authorization", bearer(&token))
        .header("content-type", "application/json")
        .body(Body::from(
            json!({"id": Uuid::new_v4(), "consultation_fee": 40.0}).to_string(),
        ))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use doctor_cell::router::doctor_routes;
use shared_store::{AppState, MemoryStore};
use shared_utils::test_utils::{JwtTestUtils, TestConfig, TestUser};

async fn app_with_users(users: &[&TestUser]) -> (Router, String) {
    let config = TestConfig::default();
    let store = Arc::new(MemoryStore::new());
    for user in users {
        store.insert_user(user.to_domain_user()).await;
    }
    let state = AppState::in_memory(config.to_arc(), store);
    (doctor_routes(state), config.jwt_secret)
}

fn put_availability(token: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("PUT")
        .uri("/availability")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn availability_routes_require_a_token() {
    let (app, _) = app_with_users(&[]).await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/available")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn doctor_can_set_and_read_back_availability() {
    let doctor = TestUser::doctor("doc@example.com");
    let (app, secret) = app_with_users(&[&doctor]).await;
    let token = JwtTestUtils::create_test_token(&doctor, &secret, Some(1));

    let response = app
        .clone()
        .oneshot(put_availability(
            &token,
            json!({
                "availability_slots": [
                    {"day": "Monday", "start_time": "09:00", "end_time": "17:00"}
                ]
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["availability_slots"][0]["day"], "Monday");

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/{}/availability", doctor.id))
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["availability_slots"][0]["start_time"], "09:00");
}

#[tokio::test]
async fn patient_gets_403_on_set_availability() {
    let patient = TestUser::patient("pat@example.com");
    let (app, secret) = app_with_users(&[&patient]).await;
    let token = JwtTestUtils::create_test_token(&patient, &secret, Some(1));

    let response = app
        .oneshot(put_availability(
            &token,
            json!({
                "availability_slots": [
                    {"day": "Monday", "start_time": "09:00", "end_time": "17:00"}
                ]
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn malformed_windows_get_400_with_error_body() {
    let doctor = TestUser::doctor("doc@example.com");
    let (app, secret) = app_with_users(&[&doctor]).await;
    let token = JwtTestUtils::create_test_token(&doctor, &secret, Some(1));

    let response = app
        .clone()
        .oneshot(put_availability(
            &token,
            json!({
                "availability_slots": [
                    {"day": "Monday", "start_time": "17:00", "end_time": "09:00"}
                ]
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "start_time must be before end_time");

    let response = app
        .oneshot(put_availability(&token, json!({})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_doctor_availability_is_404() {
    let doctor = TestUser::doctor("doc@example.com");
    let (app, secret) = app_with_users(&[&doctor]).await;
    let token = JwtTestUtils::create_test_token(&doctor, &secret, Some(1));

    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/{}/availability", uuid::Uuid::new_v4()))
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

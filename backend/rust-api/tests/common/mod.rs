#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use chrono::Utc;
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

use ujuzi_api::{
    config::Config,
    create_router,
    models::{ContentKind, CourseRecord, LessonRecord},
    services::AppState,
    store::MemoryStore,
};

pub fn test_config() -> Config {
    Config {
        mongo_uri: "mongodb://localhost:27017/ujuzi-test".to_string(),
        mongo_database: "ujuzi-test".to_string(),
        jwt_secret: "test-secret".to_string(),
        cookie_secure: false,
        elevenlabs_api_key: None,
        elevenlabs_api_url: "https://api.elevenlabs.io".to_string(),
    }
}

/// Router over a fresh in-memory store; the store handle is returned so tests
/// can seed catalog data and inspect record counts.
pub fn create_test_app() -> (Router, Arc<MemoryStore>) {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();

    let store = Arc::new(MemoryStore::new());
    let app_state = Arc::new(AppState::new(test_config(), store.clone()));

    (create_router(app_state), store)
}

pub fn course_record(id: &str, title: &str) -> CourseRecord {
    let now = Utc::now();
    CourseRecord {
        id: id.to_string(),
        title: title.to_string(),
        description: format!("{} description", title),
        long_description: None,
        category: "Digital Literacy".to_string(),
        level: "Beginner".to_string(),
        duration: "4 weeks".to_string(),
        price: 0.0,
        image_url: None,
        instructor_id: None,
        rating: None,
        students_count: 0,
        is_published: true,
        created_at: now,
        updated_at: now,
    }
}

pub fn lesson_record(course_id: &str, order_index: i32) -> LessonRecord {
    let now = Utc::now();
    LessonRecord {
        id: Uuid::new_v4().to_string(),
        course_id: course_id.to_string(),
        title: format!("Lesson {}", order_index + 1),
        description: None,
        content_kind: ContentKind::Text,
        content: Some(format!("Lesson {} body", order_index + 1)),
        video_url: None,
        duration_minutes: 10,
        order_index,
        is_free_preview: order_index == 0,
        is_published: true,
        created_at: now,
        updated_at: now,
    }
}

/// Seed a published course with `lesson_count` ordered lessons; returns the
/// lesson ids in order.
pub fn seed_course(store: &MemoryStore, course_id: &str, lesson_count: usize) -> Vec<String> {
    store.seed_course(course_record(course_id, "Test Course"));

    (0..lesson_count)
        .map(|i| {
            let lesson = lesson_record(course_id, i as i32);
            let id = lesson.id.clone();
            store.seed_lesson(lesson);
            id
        })
        .collect()
}

pub async fn register_and_login(app: &Router) -> (String, String) {
    let email = format!("learner-{}@test.com", Uuid::new_v4());
    let register_body = serde_json::json!({
        "email": email,
        "password": "Learner123!@#",
        "name": "Test Learner",
    });

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/auth/register")
                .header("content-type", "application/json")
                .body(Body::from(register_body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    if status != StatusCode::CREATED {
        panic!(
            "registration failed: {} body {}",
            status,
            String::from_utf8_lossy(&bytes)
        );
    }

    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    let user_id = json["user"]["id"].as_str().unwrap().to_string();
    let token = json["access_token"].as_str().unwrap().to_string();

    (user_id, token)
}

pub async fn get_csrf_token(app: &Router) -> (String, String) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/api/v1/auth/csrf-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let csrf_cookie = response
        .headers()
        .get_all("set-cookie")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|header| header.starts_with("csrf_token="))
        .and_then(|header| header.split(';').next())
        .and_then(|pair| pair.split('=').nth(1))
        .unwrap_or("")
        .to_string();

    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    let csrf_token = json["csrf_token"].as_str().unwrap().to_string();

    (csrf_token, csrf_cookie)
}

/// POST to an auth+CSRF protected route and return (status, body).
pub async fn authed_post(
    app: &Router,
    uri: &str,
    token: &str,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let (csrf_token, csrf_cookie) = get_csrf_token(app).await;

    let builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("authorization", format!("Bearer {}", token))
        .header("x-csrf-token", &csrf_token)
        .header("cookie", format!("csrf_token={}", csrf_cookie));

    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    (status, json)
}

pub async fn authed_get(
    app: &Router,
    uri: &str,
    token: &str,
) -> (StatusCode, serde_json::Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri(uri)
                .header("authorization", format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    (status, json)
}

pub async fn get_json(app: &Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("GET")
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    (status, json)
}

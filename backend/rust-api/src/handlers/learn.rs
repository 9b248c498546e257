use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use std::sync::Arc;
use validator::Validate;

use crate::{
    errors::ApiError,
    extractors::AppJson,
    middlewares::auth::JwtClaims,
    models::review::CreateReviewRequest,
    services::{
        catalog_service::CatalogService,
        progress_service::{EnrollOutcome, ProgressService},
        AppState,
    },
};

/// POST /api/v1/learn/courses/{id}/enroll - Enroll the caller in a course.
/// Re-enrolling answers 200 with the existing enrollment instead of creating
/// a second record.
pub async fn enroll(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
    Path(course_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    tracing::info!("Enroll request: learner={}, course={}", claims.sub, course_id);

    let service = ProgressService::new(state.store.clone());

    let (status, enrollment) = match service.enroll(&claims.sub, &course_id).await? {
        EnrollOutcome::Enrolled(e) => (StatusCode::CREATED, e),
        EnrollOutcome::AlreadyEnrolled(e) => (StatusCode::OK, e),
    };

    Ok((
        status,
        Json(crate::models::EnrollmentView::from_record(&enrollment)),
    ))
}

/// GET /api/v1/learn/courses/{id} - Player state: course, ordered lessons,
/// enrollment and completion set
pub async fn course_state(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
    Path(course_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let service = ProgressService::new(state.store.clone());
    let view = service.course_state(&claims.sub, &course_id).await?;
    Ok(Json(view))
}

/// POST /api/v1/learn/lessons/{id}/complete - Mark a lesson completed and
/// recompute course progress
pub async fn complete_lesson(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
    Path(lesson_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    tracing::info!(
        "Lesson completion: learner={}, lesson={}",
        claims.sub,
        lesson_id
    );

    let service = ProgressService::new(state.store.clone());
    let view = service.complete_lesson(&claims.sub, &lesson_id).await?;
    Ok(Json(view))
}

/// GET /api/v1/learn/dashboard - Enrollments plus learning stats
pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
) -> Result<impl IntoResponse, ApiError> {
    let service = ProgressService::new(state.store.clone());
    let view = service.dashboard(&claims.sub).await?;
    Ok(Json(view))
}

/// POST /api/v1/learn/courses/{id}/reviews - Leave a review (enrolled
/// learners only)
pub async fn create_review(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
    Path(course_id): Path<String>,
    AppJson(req): AppJson<CreateReviewRequest>,
) -> Result<impl IntoResponse, ApiError> {
    req.validate()?;

    let service = CatalogService::new(state.store.clone());
    let review = service.create_review(&claims.sub, &course_id, &req).await?;
    Ok((StatusCode::CREATED, Json(review)))
}

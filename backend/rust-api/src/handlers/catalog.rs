use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;

use crate::{
    errors::ApiError,
    extractors::OptionalClaims,
    models::course::CourseListQuery,
    services::{catalog_service::CatalogService, AppState},
};

/// GET /api/v1/catalog/courses - Published courses, optionally filtered
pub async fn list_courses(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CourseListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let service = CatalogService::new(state.store.clone());
    let courses = service.list_courses(query.into_filter()).await?;
    Ok(Json(serde_json::json!({ "courses": courses })))
}

/// GET /api/v1/catalog/courses/featured - Landing page strip
pub async fn featured_courses(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let service = CatalogService::new(state.store.clone());
    let courses = service.featured_courses().await?;
    Ok(Json(serde_json::json!({ "courses": courses })))
}

/// GET /api/v1/catalog/categories
pub async fn list_categories(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let service = CatalogService::new(state.store.clone());
    let categories = service.list_categories().await?;
    Ok(Json(serde_json::json!({ "categories": categories })))
}

/// GET /api/v1/catalog/courses/{id} - Course page; personalizes for a
/// signed-in learner when the optional auth middleware attached claims
pub async fn get_course(
    State(state): State<Arc<AppState>>,
    Path(course_id): Path<String>,
    OptionalClaims(claims): OptionalClaims,
) -> Result<impl IntoResponse, ApiError> {
    let learner_id = claims.as_ref().map(|c| c.sub.as_str());

    let service = CatalogService::new(state.store.clone());
    let detail = service.course_detail(&course_id, learner_id).await?;
    Ok(Json(detail))
}

/// GET /api/v1/catalog/courses/{id}/reviews
pub async fn course_reviews(
    State(state): State<Arc<AppState>>,
    Path(course_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let service = CatalogService::new(state.store.clone());
    let reviews = service.course_reviews(&course_id).await?;
    Ok(Json(reviews))
}

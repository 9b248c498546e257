use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use std::sync::Arc;
use validator::Validate;

use crate::{
    errors::ApiError,
    extractors::AppJson,
    middlewares::{
        auth::{JwtClaims, JwtService},
        csrf,
    },
    models::user::{LoginRequest, RegisterRequest},
    services::{auth_service::AuthService, AppState},
};

const REFRESH_COOKIE_NAME: &str = "refresh_token";
const REFRESH_COOKIE_PATH: &str = "/api/v1/auth";

fn refresh_cookie(state: &AppState, token: String) -> Cookie<'static> {
    Cookie::build((REFRESH_COOKIE_NAME, token))
        .path(REFRESH_COOKIE_PATH)
        .http_only(true)
        .secure(state.config.cookie_secure)
        .same_site(axum_extra::extract::cookie::SameSite::Strict)
        .max_age(time::Duration::days(30))
        .build()
}

/// POST /api/v1/auth/register - Register a new learner account
pub async fn register(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    AppJson(req): AppJson<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    req.validate()?;

    tracing::info!("Registering new user: {}", req.email);

    let jwt_service = JwtService::new(&state.config.jwt_secret);
    let service = AuthService::new(state.store.clone(), jwt_service);

    let issued = service.register(req).await?;

    let jar = jar.add(refresh_cookie(&state, issued.refresh_token));
    Ok((StatusCode::CREATED, jar, Json(issued.response)))
}

/// POST /api/v1/auth/login - Login with email and password
pub async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    AppJson(req): AppJson<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    req.validate()?;

    tracing::info!("Login attempt for user: {}", req.email);

    let jwt_service = JwtService::new(&state.config.jwt_secret);
    let service = AuthService::new(state.store.clone(), jwt_service);

    let issued = service.login(req).await?;

    let jar = jar.add(refresh_cookie(&state, issued.refresh_token));
    Ok((StatusCode::OK, jar, Json(issued.response)))
}

/// POST /api/v1/auth/refresh - Rotate the refresh token and mint a new
/// access token
pub async fn refresh_token(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<impl IntoResponse, ApiError> {
    let token = jar
        .get(REFRESH_COOKIE_NAME)
        .map(|c| c.value().to_string())
        .ok_or(ApiError::AuthRequired)?;

    let jwt_service = JwtService::new(&state.config.jwt_secret);
    let service = AuthService::new(state.store.clone(), jwt_service);

    let issued = service.refresh(&token).await?;

    let jar = jar.add(refresh_cookie(&state, issued.refresh_token));
    Ok((StatusCode::OK, jar, Json(issued.response)))
}

/// POST /api/v1/auth/logout - Revoke the refresh token and clear the cookie
pub async fn logout(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Result<impl IntoResponse, ApiError> {
    if let Some(cookie) = jar.get(REFRESH_COOKIE_NAME) {
        let jwt_service = JwtService::new(&state.config.jwt_secret);
        let service = AuthService::new(state.store.clone(), jwt_service);
        service.logout(cookie.value()).await?;
    }

    let removal = Cookie::build((REFRESH_COOKIE_NAME, ""))
        .path(REFRESH_COOKIE_PATH)
        .build();
    let jar = jar.remove(removal);

    Ok((StatusCode::NO_CONTENT, jar))
}

/// GET /api/v1/auth/me - Current user profile
pub async fn get_current_user(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
) -> Result<impl IntoResponse, ApiError> {
    let jwt_service = JwtService::new(&state.config.jwt_secret);
    let service = AuthService::new(state.store.clone(), jwt_service);

    let profile = service.current_user(&claims.sub).await?;
    Ok(Json(profile))
}

/// GET /api/v1/auth/csrf-token - Issue a CSRF token for the double-submit
/// cookie check
pub async fn get_csrf_token() -> impl IntoResponse {
    let token = csrf::generate_csrf_token();
    let response = Json(serde_json::json!({ "csrf_token": token })).into_response();
    csrf::set_csrf_cookie(response, &token)
}

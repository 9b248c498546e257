#![allow(dead_code)]

use axum::{
    extract::Request,
    http::{header, HeaderValue, Method},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod config;
pub mod errors;
pub mod extractors;
pub mod handlers;
pub mod metrics;
pub mod middlewares;
pub mod models;
pub mod services;
pub mod store;

pub use config::Config;
pub use services::AppState;

/// CSP middleware adds Content-Security-Policy header to all responses
async fn csp_middleware(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    response.headers_mut().insert(
        header::CONTENT_SECURITY_POLICY,
        HeaderValue::from_static(
            "default-src 'self'; \
             script-src 'self' 'unsafe-inline'; \
             style-src 'self' 'unsafe-inline'; \
             img-src 'self' data: https:; \
             connect-src 'self'",
        ),
    );
    response
}

pub fn create_router(app_state: std::sync::Arc<services::AppState>) -> Router {
    // The catalog is consumed by the public marketing site as well
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_origin(tower_http::cors::Any); // TODO: restrict to specific origins in production

    Router::new()
        // Public endpoints (no auth required)
        .route("/health", get(handlers::health_check))
        // Metrics endpoint with Basic Auth protection
        .route(
            "/metrics",
            get(handlers::metrics_handler)
                .layer(middleware::from_fn(handlers::metrics_auth_middleware)),
        )
        // Auth endpoints (mixed: some public, some protected)
        .nest("/api/v1/auth", auth_routes(app_state.clone()))
        // Public catalog; personalizes when a valid token is present
        .nest(
            "/api/v1/catalog",
            catalog_routes()
                .layer(cors)
                .layer(middleware::from_fn_with_state(
                    app_state.clone(),
                    middlewares::auth::optional_auth_middleware,
                )),
        )
        // Learner surface (requires JWT)
        .nest(
            "/api/v1/learn",
            learn_routes()
                .layer(middleware::from_fn(middlewares::csrf::csrf_middleware))
                .layer(middleware::from_fn_with_state(
                    app_state.clone(),
                    middlewares::auth::auth_middleware,
                )),
        )
        // Stateless speech proxy
        .route("/api/v1/speech/demo", post(handlers::speech::generate_demo_speech))
        .with_state(app_state)
        .layer(middleware::from_fn(csp_middleware)) // Apply CSP to all responses
        .layer(middleware::from_fn(
            middlewares::metrics::metrics_middleware,
        ))
        .layer(middleware::from_fn(
            middlewares::trace::trace_context_middleware,
        ))
        .layer(TraceLayer::new_for_http())
}

fn catalog_routes() -> Router<std::sync::Arc<services::AppState>> {
    Router::new()
        .route("/categories", get(handlers::catalog::list_categories))
        .route("/courses", get(handlers::catalog::list_courses))
        .route("/courses/featured", get(handlers::catalog::featured_courses))
        .route("/courses/{id}", get(handlers::catalog::get_course))
        .route("/courses/{id}/reviews", get(handlers::catalog::course_reviews))
}

fn learn_routes() -> Router<std::sync::Arc<services::AppState>> {
    Router::new()
        .route("/dashboard", get(handlers::learn::dashboard))
        .route("/courses/{id}", get(handlers::learn::course_state))
        .route("/courses/{id}/enroll", post(handlers::learn::enroll))
        .route("/courses/{id}/reviews", post(handlers::learn::create_review))
        .route(
            "/lessons/{id}/complete",
            post(handlers::learn::complete_lesson),
        )
}

fn auth_routes(
    app_state: std::sync::Arc<services::AppState>,
) -> Router<std::sync::Arc<services::AppState>> {
    // Public routes
    let public_routes = Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login))
        .route("/refresh", post(handlers::auth::refresh_token))
        // CSRF token endpoint (public, no auth required)
        .route("/csrf-token", get(handlers::auth::get_csrf_token));

    // Protected routes (require JWT auth + CSRF protection)
    let protected_routes = Router::new()
        .route("/me", get(handlers::auth::get_current_user))
        .route("/logout", post(handlers::auth::logout))
        .route_layer(middleware::from_fn(middlewares::csrf::csrf_middleware))
        .route_layer(middleware::from_fn_with_state(
            app_state.clone(),
            middlewares::auth::auth_middleware,
        ));

    public_routes.merge(protected_routes)
}

//! API service routes

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderName, HeaderValue, Method, header},
    middleware,
    routing::{get, post, put},
};
use chrono::{Local, NaiveDate};
use tower_http::{
    cors::CorsLayer, services::ServeDir, set_header::SetResponseHeaderLayer, trace::TraceLayer,
};

use crate::{
    error::ApiError,
    middleware::{auth_middleware, rate_limit_middleware},
    state::{AppState, UPLOADS_PREFIX},
};

pub mod auth;
pub mod diaries;
pub mod health;
pub mod memorials;
pub mod messages;
pub mod photos;
pub mod todos;

/// Body limit for every request except photo uploads
const DEFAULT_BODY_LIMIT: usize = 10 * 1024 * 1024;

/// Create the router for the API service
pub fn create_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/auth/profile", get(auth::profile))
        .route("/auth/settings", put(auth::update_settings))
        .nest("/diaries", diaries::router())
        .nest("/photos", photos::router(&state.upload_limits))
        .nest("/memorials", memorials::router())
        .nest("/todos", todos::router())
        .nest("/messages", messages::router())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let api_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/auth/login", post(auth::login))
        .merge(protected_routes)
        .fallback(endpoint_not_found)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ));

    Router::new()
        .nest("/api", api_routes)
        .nest_service(UPLOADS_PREFIX, ServeDir::new(&state.config.upload_dir))
        .layer(DefaultBodyLimit::max(DEFAULT_BODY_LIMIT))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("SAMEORIGIN"),
        ))
        .layer(cors_layer(&state))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(state: &AppState) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(state.config.allowed_origins.clone())
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::PATCH,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-requested-with"),
        ])
}

async fn endpoint_not_found() -> ApiError {
    ApiError::not_found("Endpoint not found")
}

/// Today's calendar date on the server
pub(crate) fn today() -> NaiveDate {
    Local::now().date_naive()
}

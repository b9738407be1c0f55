//! Authentication and rate limiting middleware

use std::net::SocketAddr;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    middleware::Next,
    response::Response,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use tracing::debug;
use uuid::Uuid;

use crate::{error::ApiError, models::user::User, state::AppState};

/// Authenticated user information
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub user: User,
}

/// Validate the bearer token and load the account it names
pub async fn auth_middleware(
    State(state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let TypedHeader(Authorization(bearer)) = bearer.ok_or_else(ApiError::unauthorized)?;

    let claims = state.jwt_service.validate_token(bearer.token()).inspect_err(|e| {
        debug!("Rejected token: {}", e);
    })?;

    let user = state
        .user_repository
        .find_active_by_id(claims.sub)
        .await?
        .ok_or_else(|| ApiError::Auth("Account not found".to_string()))?;

    req.extensions_mut().insert(AuthUser { id: user.id, user });

    Ok(next.run(req).await)
}

/// Reject callers that exceeded their request budget
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let key = client_key(&req);
    if !state.rate_limiter.is_allowed(&key).await {
        return Err(ApiError::TooManyRequests);
    }
    Ok(next.run(req).await)
}

/// Address used to key the rate limiter
fn client_key<B>(req: &Request<B>) -> String {
    if let Some(ConnectInfo(addr)) = req.extensions().get::<ConnectInfo<SocketAddr>>() {
        return addr.ip().to_string();
    }
    req.headers()
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|ip| ip.trim().to_string())
        .filter(|ip| !ip.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}

//! Shared-password login and account settings

use axum::{Extension, extract::State};
use tracing::{info, warn};

use crate::{
    error::{ApiError, ApiResult},
    extract::AppJson,
    middleware::AuthUser,
    models::user::{
        ACCOUNT_USERNAME, LoginRequest, LoginResponse, ProfileResponse, UpdateSettingsRequest,
    },
    password::{hash_password, verify_password},
    state::AppState,
};

/// Exchange the shared password for a session token
///
/// Before the account exists only the configured default password is
/// accepted, and the first successful login creates the account with it.
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> ApiResult<AppJson<LoginResponse>> {
    let password = payload
        .password
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ApiError::validation("Please enter the password"))?;

    let user = match state
        .user_repository
        .find_by_username(ACCOUNT_USERNAME)
        .await?
    {
        Some(user) => {
            if !verify_password(&password, &user.password_hash).await? {
                warn!("Rejected login with wrong password");
                return Err(ApiError::Auth("Incorrect password".to_string()));
            }
            user
        }
        None => {
            if password != state.config.default_password {
                warn!("Rejected first login with a password other than the default");
                return Err(ApiError::Auth("Incorrect password".to_string()));
            }
            let password_hash = hash_password(&password).await?;
            state
                .user_repository
                .create_if_absent(ACCOUNT_USERNAME, &password_hash)
                .await?
        }
    };

    if !user.is_active {
        return Err(ApiError::Auth("Account is disabled".to_string()));
    }

    let token = state.jwt_service.generate_token(user.id)?;
    info!("User {} logged in", user.id);

    Ok(AppJson(LoginResponse {
        success: true,
        token,
        user: (&user).into(),
    }))
}

pub async fn profile(Extension(auth): Extension<AuthUser>) -> AppJson<ProfileResponse> {
    AppJson(ProfileResponse::new(&auth.user))
}

/// Partial settings update; omitted or blank fields keep their value
pub async fn update_settings(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    AppJson(payload): AppJson<UpdateSettingsRequest>,
) -> ApiResult<AppJson<ProfileResponse>> {
    let settings = payload.apply(&auth.user);
    settings.check()?;
    let user = state
        .user_repository
        .update_settings(auth.id, &settings)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(AppJson(ProfileResponse::new(&user)))
}

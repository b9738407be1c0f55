use axum::{
    Extension, Router,
    extract::State,
    http::StatusCode,
    routing::get,
};
use chrono::Duration;
use uuid::Uuid;

use super::today;
use crate::{
    error::{ApiError, ApiResult},
    extract::{AppJson, AppPath},
    middleware::AuthUser,
    models::{
        DataResponse, MessageResponse,
        memorial::{
            CreateMemorialRequest, Memorial, UPCOMING_WINDOW_DAYS, UpcomingMemorial,
            UpdateMemorialRequest, upcoming,
        },
    },
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_memorials).post(create_memorial))
        .route("/upcoming", get(upcoming_memorials))
        .route(
            "/:id",
            get(get_memorial).put(update_memorial).delete(delete_memorial),
        )
}

fn not_found() -> ApiError {
    ApiError::not_found("Memorial not found")
}

pub async fn list_memorials(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<AppJson<DataResponse<Vec<Memorial>>>> {
    let memorials = state.memorial_repository.list(auth.id).await?;
    Ok(AppJson(DataResponse::new(memorials)))
}

/// Memorials falling within the next window, recurring ones projected onto the calendar
pub async fn upcoming_memorials(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<AppJson<DataResponse<Vec<UpcomingMemorial>>>> {
    let today = today();
    let candidates = state
        .memorial_repository
        .upcoming_candidates(auth.id, today, today + Duration::days(UPCOMING_WINDOW_DAYS))
        .await?;
    Ok(AppJson(DataResponse::new(upcoming(candidates, today))))
}

pub async fn create_memorial(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    AppJson(payload): AppJson<CreateMemorialRequest>,
) -> ApiResult<(StatusCode, AppJson<DataResponse<Memorial>>)> {
    let fields = payload.into_fields()?;
    fields.check()?;
    let memorial = state.memorial_repository.create(auth.id, &fields).await?;
    Ok((StatusCode::CREATED, AppJson(DataResponse::new(memorial))))
}

pub async fn get_memorial(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<AppJson<DataResponse<Memorial>>> {
    let memorial = state
        .memorial_repository
        .find(auth.id, id)
        .await?
        .ok_or_else(not_found)?;
    Ok(AppJson(DataResponse::new(memorial)))
}

pub async fn update_memorial(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<UpdateMemorialRequest>,
) -> ApiResult<AppJson<DataResponse<Memorial>>> {
    let current = state
        .memorial_repository
        .find(auth.id, id)
        .await?
        .ok_or_else(not_found)?;
    let fields = payload.apply(&current);
    fields.check()?;
    let memorial = state
        .memorial_repository
        .update(auth.id, id, &fields)
        .await?
        .ok_or_else(not_found)?;
    Ok(AppJson(DataResponse::new(memorial)))
}

pub async fn delete_memorial(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<AppJson<MessageResponse>> {
    if !state.memorial_repository.delete(auth.id, id).await? {
        return Err(not_found());
    }
    Ok(AppJson(MessageResponse::new("Memorial deleted")))
}

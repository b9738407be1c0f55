use axum::{
    Extension, Router,
    extract::State,
    http::StatusCode,
    routing::get,
};
use uuid::Uuid;

use super::today;
use crate::{
    error::{ApiError, ApiResult},
    extract::{AppJson, AppPath, AppQuery},
    middleware::AuthUser,
    models::{
        DataResponse, MessageResponse, PageResponse, Pagination,
        diary::{CreateDiaryRequest, Diary, DiaryListQuery, DiarySearchQuery, UpdateDiaryRequest},
    },
    repositories::diary::DiaryFilter,
    state::AppState,
    validation::{page_offset, page_params},
};

const DEFAULT_PAGE_SIZE: i64 = 10;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_diaries).post(create_diary))
        .route("/search", get(search_diaries))
        .route("/:id", get(get_diary).put(update_diary).delete(delete_diary))
}

fn not_found() -> ApiError {
    ApiError::not_found("Diary not found")
}

pub async fn list_diaries(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    AppQuery(query): AppQuery<DiaryListQuery>,
) -> ApiResult<AppJson<PageResponse<Diary>>> {
    let (page, limit) = page_params(query.page, query.limit, DEFAULT_PAGE_SIZE);
    let filter = DiaryFilter {
        text: None,
        mood: query.mood,
        weather: query.weather,
    };
    let offset = page_offset(page, limit);
    let (diaries, total) = state
        .diary_repository
        .list(auth.id, &filter, limit, offset)
        .await?;

    Ok(AppJson(PageResponse::new(
        diaries,
        Pagination::new(total, page, limit),
    )))
}

pub async fn search_diaries(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    AppQuery(query): AppQuery<DiarySearchQuery>,
) -> ApiResult<AppJson<DataResponse<Vec<Diary>>>> {
    let filter = DiaryFilter {
        text: query.q,
        mood: query.mood,
        weather: query.weather,
    };
    let diaries = state.diary_repository.search(auth.id, &filter).await?;
    Ok(AppJson(DataResponse::new(diaries)))
}

pub async fn create_diary(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    AppJson(payload): AppJson<CreateDiaryRequest>,
) -> ApiResult<(StatusCode, AppJson<DataResponse<Diary>>)> {
    let fields = payload.into_fields(today())?;
    fields.check()?;
    let diary = state.diary_repository.create(auth.id, &fields).await?;
    Ok((StatusCode::CREATED, AppJson(DataResponse::new(diary))))
}

pub async fn get_diary(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<AppJson<DataResponse<Diary>>> {
    let diary = state
        .diary_repository
        .find(auth.id, id)
        .await?
        .ok_or_else(not_found)?;
    Ok(AppJson(DataResponse::new(diary)))
}

pub async fn update_diary(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<UpdateDiaryRequest>,
) -> ApiResult<AppJson<DataResponse<Diary>>> {
    let current = state
        .diary_repository
        .find(auth.id, id)
        .await?
        .ok_or_else(not_found)?;
    let fields = payload.apply(&current);
    fields.check()?;
    let diary = state
        .diary_repository
        .update(auth.id, id, &fields)
        .await?
        .ok_or_else(not_found)?;
    Ok(AppJson(DataResponse::new(diary)))
}

pub async fn delete_diary(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<AppJson<MessageResponse>> {
    if !state.diary_repository.delete(auth.id, id).await? {
        return Err(not_found());
    }
    Ok(AppJson(MessageResponse::new("Diary deleted")))
}

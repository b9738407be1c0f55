use axum::{
    Extension, Router,
    extract::State,
    http::StatusCode,
    routing::{get, patch},
};
use chrono::Utc;
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    extract::{AppJson, AppPath, AppQuery},
    middleware::AuthUser,
    models::{
        DataResponse, MessageResponse,
        todo::{CreateTodoRequest, Todo, TodoQuery, UpdateTodoRequest},
    },
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_todos).post(create_todo))
        .route("/:id", get(get_todo).put(update_todo).delete(delete_todo))
        .route("/:id/toggle", patch(toggle_todo))
}

fn not_found() -> ApiError {
    ApiError::not_found("Todo not found")
}

/// Incomplete first, then by descending priority, then oldest first
pub async fn list_todos(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    AppQuery(query): AppQuery<TodoQuery>,
) -> ApiResult<AppJson<DataResponse<Vec<Todo>>>> {
    let todos = state.todo_repository.list(auth.id, &query).await?;
    Ok(AppJson(DataResponse::new(todos)))
}

pub async fn create_todo(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    AppJson(payload): AppJson<CreateTodoRequest>,
) -> ApiResult<(StatusCode, AppJson<DataResponse<Todo>>)> {
    let fields = payload.into_fields(Utc::now())?;
    fields.check()?;
    let todo = state.todo_repository.create(auth.id, &fields).await?;
    Ok((StatusCode::CREATED, AppJson(DataResponse::new(todo))))
}

pub async fn get_todo(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<AppJson<DataResponse<Todo>>> {
    let todo = state
        .todo_repository
        .find(auth.id, id)
        .await?
        .ok_or_else(not_found)?;
    Ok(AppJson(DataResponse::new(todo)))
}

pub async fn update_todo(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<UpdateTodoRequest>,
) -> ApiResult<AppJson<DataResponse<Todo>>> {
    let current = state
        .todo_repository
        .find(auth.id, id)
        .await?
        .ok_or_else(not_found)?;
    let fields = payload.apply(&current, Utc::now());
    fields.check()?;
    let todo = state
        .todo_repository
        .update(auth.id, id, &fields)
        .await?
        .ok_or_else(not_found)?;
    Ok(AppJson(DataResponse::new(todo)))
}

pub async fn toggle_todo(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<AppJson<DataResponse<Todo>>> {
    let todo = state
        .todo_repository
        .toggle(auth.id, id)
        .await?
        .ok_or_else(not_found)?;
    Ok(AppJson(DataResponse::new(todo)))
}

pub async fn delete_todo(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<AppJson<MessageResponse>> {
    if !state.todo_repository.delete(auth.id, id).await? {
        return Err(not_found());
    }
    Ok(AppJson(MessageResponse::new("Todo deleted")))
}

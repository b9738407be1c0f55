use axum::{
    Extension, Router,
    extract::State,
    http::StatusCode,
    routing::get,
};
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    extract::{AppJson, AppPath, AppQuery},
    middleware::AuthUser,
    models::{
        DataResponse, MessageResponse,
        message::{CreateMessageRequest, Message, MessageQuery, UpdateMessageRequest},
    },
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_messages).post(create_message))
        .route("/special", get(special_messages))
        .route(
            "/:id",
            get(get_message).put(update_message).delete(delete_message),
        )
}

fn not_found() -> ApiError {
    ApiError::not_found("Message not found")
}

pub async fn list_messages(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    AppQuery(query): AppQuery<MessageQuery>,
) -> ApiResult<AppJson<DataResponse<Vec<Message>>>> {
    let messages = state
        .message_repository
        .list(auth.id, query.special)
        .await?;
    Ok(AppJson(DataResponse::new(messages)))
}

pub async fn special_messages(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<AppJson<DataResponse<Vec<Message>>>> {
    let messages = state.message_repository.list(auth.id, Some(true)).await?;
    Ok(AppJson(DataResponse::new(messages)))
}

pub async fn create_message(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    AppJson(payload): AppJson<CreateMessageRequest>,
) -> ApiResult<(StatusCode, AppJson<DataResponse<Message>>)> {
    let (fields, message_date) = payload.into_fields()?;
    fields.check()?;
    let message = state
        .message_repository
        .create(auth.id, &fields, message_date)
        .await?;
    Ok((StatusCode::CREATED, AppJson(DataResponse::new(message))))
}

pub async fn get_message(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<AppJson<DataResponse<Message>>> {
    let message = state
        .message_repository
        .find(auth.id, id)
        .await?
        .ok_or_else(not_found)?;
    Ok(AppJson(DataResponse::new(message)))
}

pub async fn update_message(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<UpdateMessageRequest>,
) -> ApiResult<AppJson<DataResponse<Message>>> {
    let current = state
        .message_repository
        .find(auth.id, id)
        .await?
        .ok_or_else(not_found)?;
    let fields = payload.apply(&current);
    fields.check()?;
    let message = state
        .message_repository
        .update(auth.id, id, &fields)
        .await?
        .ok_or_else(not_found)?;
    Ok(AppJson(DataResponse::new(message)))
}

pub async fn delete_message(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<AppJson<MessageResponse>> {
    if !state.message_repository.delete(auth.id, id).await? {
        return Err(not_found());
    }
    Ok(AppJson(MessageResponse::new("Message deleted")))
}

//! Photo listing, upload pipeline and deletion

use axum::{
    Extension, Router,
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    routing::{get, post},
};
use media::{
    IncomingFile, ThumbnailGenerator, UploadLimits,
    upload::{photo_title, stored_name},
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    extract::{AppJson, AppPath, AppQuery},
    middleware::AuthUser,
    models::{
        DataResponse, FILE_NAME_MAX, MessageResponse, PageQuery, PageResponse, Pagination,
        TITLE_MAX,
        photo::{NewPhoto, Photo, UpdatePhotoRequest},
    },
    state::AppState,
    validation::{check_length, non_blank, page_offset, page_params},
};

const DEFAULT_PAGE_SIZE: i64 = 20;

/// Multipart field carrying the image files
pub const FILES_FIELD: &str = "photos";

pub fn router(limits: &UploadLimits) -> Router<AppState> {
    // Room for a full batch plus the text fields and multipart framing
    let upload_body_limit = limits.max_files * limits.max_file_size + 1024 * 1024;

    Router::new()
        .route("/", get(list_photos))
        .route(
            "/upload",
            post(upload_photos).layer(DefaultBodyLimit::max(upload_body_limit)),
        )
        .route("/:id", get(get_photo).put(update_photo).delete(delete_photo))
}

fn not_found() -> ApiError {
    ApiError::not_found("Photo not found")
}

/// Text fields and files of one upload request
#[derive(Debug, Default)]
pub struct UploadForm {
    pub title: Option<String>,
    pub description: Option<String>,
    pub files: Vec<IncomingFile>,
}

/// Read the whole multipart body, checking each file as it arrives
///
/// Nothing is written anywhere until the complete form has passed the
/// upload limits.
pub async fn read_upload_form(
    multipart: &mut Multipart,
    limits: &UploadLimits,
) -> ApiResult<UploadForm> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("title") => form.title = Some(field.text().await?),
            Some("description") => form.description = Some(field.text().await?),
            Some(FILES_FIELD) => {
                limits.check_count(form.files.len() + 1)?;
                let original_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field.bytes().await?.to_vec();
                let file = IncomingFile {
                    original_name,
                    content_type,
                    data,
                };
                limits.check_file(&file)?;
                form.files.push(file);
            }
            _ => {}
        }
    }

    limits.check_batch(&form.files)?;
    Ok(form)
}

pub async fn upload_photos(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    mut multipart: Multipart,
) -> ApiResult<(StatusCode, AppJson<DataResponse<Vec<Photo>>>)> {
    let form = read_upload_form(&mut multipart, &state.upload_limits).await?;
    let title = non_blank(form.title);
    let description = non_blank(form.description);
    let total = form.files.len();

    check_upload_names(title.as_deref(), &form.files)?;

    // Every file must decode before any of them is stored
    let mut rendered = Vec::with_capacity(total);
    for file in form.files {
        let thumbnail = state
            .thumbnail_generator
            .generate_thumbnail(&file.original_name, file.data.clone())
            .await?;
        rendered.push((file, thumbnail));
    }

    let store = &state.content_store;
    let mut photos = Vec::with_capacity(total);
    for (index, (file, thumbnail)) in rendered.into_iter().enumerate() {
        let filename = stored_name(&file.original_name);
        let thumbnail_name = ThumbnailGenerator::thumbnail_name(&filename);

        store.save(&filename, &file.data).await?;
        if let Err(e) = store.save(&thumbnail_name, &thumbnail).await {
            store.remove_best_effort(&[filename.as_str()]).await;
            return Err(e.into());
        }

        let new_photo = NewPhoto {
            title: match &title {
                Some(title) => photo_title(title, index, total),
                None => file.original_name.clone(),
            },
            description: description.clone(),
            url: store.url_for(&filename),
            thumbnail_url: store.url_for(&thumbnail_name),
            size: file.size() as i64,
            filename,
            original_name: file.original_name,
            mimetype: file.content_type,
        };

        match state.photo_repository.create(auth.id, &new_photo).await {
            Ok(photo) => photos.push(photo),
            Err(e) => {
                store
                    .remove_best_effort(&[new_photo.filename.as_str(), thumbnail_name.as_str()])
                    .await;
                return Err(e.into());
            }
        }
    }

    info!("Uploaded {} photos for user {}", photos.len(), auth.id);
    Ok((StatusCode::CREATED, AppJson(DataResponse::new(photos))))
}

/// Stored titles and original names must fit their columns
fn check_upload_names(title: Option<&str>, files: &[IncomingFile]) -> ApiResult<()> {
    let total = files.len();
    for (index, file) in files.iter().enumerate() {
        check_length(&file.original_name, FILE_NAME_MAX, "File name")?;
        match title {
            Some(title) => check_length(&photo_title(title, index, total), TITLE_MAX, "Title")?,
            None => check_length(&file.original_name, TITLE_MAX, "Title")?,
        }
    }
    Ok(())
}

pub async fn list_photos(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    AppQuery(query): AppQuery<PageQuery>,
) -> ApiResult<AppJson<PageResponse<Photo>>> {
    let (page, limit) = page_params(query.page, query.limit, DEFAULT_PAGE_SIZE);
    let (photos, total) = state
        .photo_repository
        .list(auth.id, limit, page_offset(page, limit))
        .await?;

    Ok(AppJson(PageResponse::new(
        photos,
        Pagination::new(total, page, limit),
    )))
}

pub async fn get_photo(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<AppJson<DataResponse<Photo>>> {
    let photo = state
        .photo_repository
        .find(auth.id, id)
        .await?
        .ok_or_else(not_found)?;
    Ok(AppJson(DataResponse::new(photo)))
}

pub async fn update_photo(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<UpdatePhotoRequest>,
) -> ApiResult<AppJson<DataResponse<Photo>>> {
    let current = state
        .photo_repository
        .find(auth.id, id)
        .await?
        .ok_or_else(not_found)?;
    let details = payload.apply(&current);
    details.check()?;
    let photo = state
        .photo_repository
        .update(auth.id, id, &details)
        .await?
        .ok_or_else(not_found)?;
    Ok(AppJson(DataResponse::new(photo)))
}

/// Delete the row and, best effort, both stored files
pub async fn delete_photo(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    AppPath(id): AppPath<Uuid>,
) -> ApiResult<AppJson<MessageResponse>> {
    let photo = state
        .photo_repository
        .find(auth.id, id)
        .await?
        .ok_or_else(not_found)?;

    let store = &state.content_store;
    let mut names = vec![photo.filename.as_str()];
    match photo.thumbnail_url.as_deref().map(|url| store.name_from_url(url)) {
        Some(Some(thumbnail)) => names.push(thumbnail),
        Some(None) => warn!("Photo {} has an unrecognised thumbnail URL", photo.id),
        None => {}
    }
    let removed = store.remove_best_effort(&names).await;
    if removed < names.len() {
        warn!(
            "Removed {} of {} files for photo {}",
            removed,
            names.len(),
            photo.id
        );
    }

    if !state.photo_repository.delete(auth.id, id).await? {
        return Err(not_found());
    }
    Ok(AppJson(MessageResponse::new("Photo deleted")))
}

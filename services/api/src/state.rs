//! Application state shared across handlers

use std::sync::Arc;

use media::{ContentStore, ThumbnailGenerator, UploadLimits};
use sqlx::PgPool;

use crate::config::ApiConfig;
use crate::jwt::JwtService;
use crate::rate_limiter::{RateLimiter, RateLimiterConfig};
use crate::repositories::{
    DiaryRepository, MemorialRepository, MessageRepository, PhotoRepository, TodoRepository,
    UserRepository,
};

/// URL prefix under which the content directory is served
pub const UPLOADS_PREFIX: &str = "/uploads";

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ApiConfig>,
    pub db_pool: PgPool,
    pub jwt_service: JwtService,
    pub rate_limiter: RateLimiter,
    pub content_store: ContentStore,
    pub thumbnail_generator: ThumbnailGenerator,
    pub upload_limits: UploadLimits,
    pub user_repository: UserRepository,
    pub diary_repository: DiaryRepository,
    pub photo_repository: PhotoRepository,
    pub memorial_repository: MemorialRepository,
    pub todo_repository: TodoRepository,
    pub message_repository: MessageRepository,
}

impl AppState {
    pub fn new(config: ApiConfig, pool: PgPool) -> Self {
        let jwt_service = JwtService::new(&config.jwt_secret, config.jwt_expiry);
        let rate_limiter = RateLimiter::new(RateLimiterConfig {
            max_requests: config.rate_limit_max_requests,
            window: config.rate_limit_window,
        });
        let content_store = ContentStore::new(config.upload_dir.clone(), UPLOADS_PREFIX);

        Self {
            config: Arc::new(config),
            jwt_service,
            rate_limiter,
            content_store,
            thumbnail_generator: ThumbnailGenerator::default(),
            upload_limits: UploadLimits::default(),
            user_repository: UserRepository::new(pool.clone()),
            diary_repository: DiaryRepository::new(pool.clone()),
            photo_repository: PhotoRepository::new(pool.clone()),
            memorial_repository: MemorialRepository::new(pool.clone()),
            todo_repository: TodoRepository::new(pool.clone()),
            message_repository: MessageRepository::new(pool.clone()),
            db_pool: pool,
        }
    }
}

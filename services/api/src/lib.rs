//! REST API for the Love Nest journal
//!
//! One shared account logs in with a shared password and manages diaries,
//! photos, memorials, todos and messages. Uploaded photos are served from
//! the content directory under `/uploads`.

pub mod config;
pub mod error;
pub mod extract;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod password;
pub mod rate_limiter;
pub mod repositories;
pub mod routes;
pub mod state;
pub mod validation;

pub use config::ApiConfig;
pub use routes::create_router;
pub use state::AppState;

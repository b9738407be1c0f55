//! Photo pipeline for the Love Nest application
//!
//! Accepts uploaded image files, checks them against the upload rules,
//! renders fixed-size thumbnails and keeps originals and thumbnails in a
//! content directory that the API serves statically.

pub mod error;
pub mod storage;
pub mod thumbnail_generator;
pub mod upload;

pub use error::{MediaError, MediaResult};
pub use storage::ContentStore;
pub use thumbnail_generator::ThumbnailGenerator;
pub use upload::{IncomingFile, UploadLimits};

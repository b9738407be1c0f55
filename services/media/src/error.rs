//! Error types for the photo pipeline

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MediaError {
    /// The upload carried no files at all
    #[error("Please select at least one photo to upload")]
    NoFiles,

    /// Extension or MIME type is not one of the accepted image formats
    #[error("Only image files are supported (jpeg, jpg, png, gif, webp): {0}")]
    UnsupportedType(String),

    /// A single file is over the size cap
    #[error("File {name} exceeds the size limit (max {limit_mb}MB)")]
    FileTooLarge { name: String, limit_mb: usize },

    /// More files than allowed in one request
    #[error("Too many files (max {limit} per upload)")]
    TooManyFiles { limit: usize },

    /// The bytes could not be decoded as an image
    #[error("Could not read image {name}: {source}")]
    Decode {
        name: String,
        #[source]
        source: image::ImageError,
    },

    /// Thumbnail encoding failed
    #[error("Thumbnail encoding failed: {0}")]
    Encode(#[source] image::ImageError),

    /// A stored name that would escape the content directory
    #[error("Invalid stored file name: {0}")]
    InvalidName(String),

    /// Filesystem error while storing or removing files
    #[error("Storage error: {0}")]
    Io(#[from] std::io::Error),

    /// The blocking worker panicked or was cancelled
    #[error("Thumbnail worker failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl MediaError {
    /// True for errors caused by the upload limits (size/count)
    pub fn is_limit(&self) -> bool {
        matches!(
            self,
            MediaError::FileTooLarge { .. } | MediaError::TooManyFiles { .. }
        )
    }

    /// True for errors caused by the client's input rather than the server
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            MediaError::NoFiles
                | MediaError::UnsupportedType(_)
                | MediaError::FileTooLarge { .. }
                | MediaError::TooManyFiles { .. }
                | MediaError::Decode { .. }
        )
    }
}

pub type MediaResult<T> = Result<T, MediaError>;

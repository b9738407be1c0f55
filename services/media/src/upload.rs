//! Upload acceptance rules and stored-name generation

use std::path::Path;

use uuid::Uuid;

use crate::error::{MediaError, MediaResult};

/// Extensions (and MIME subtypes) accepted for photos
pub const ALLOWED_IMAGE_TYPES: [&str; 5] = ["jpeg", "jpg", "png", "gif", "webp"];

/// One file received from a multipart upload, fully buffered
#[derive(Debug, Clone)]
pub struct IncomingFile {
    pub original_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

impl IncomingFile {
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Lower-cased extension of the original file name, if any
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.original_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
    }
}

/// Limits applied to a single upload request
#[derive(Debug, Clone, Copy)]
pub struct UploadLimits {
    /// Maximum size of one file in bytes
    pub max_file_size: usize,
    /// Maximum number of files in one request
    pub max_files: usize,
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            max_file_size: 10 * 1024 * 1024, // 10MB
            max_files: 5,
        }
    }
}

impl UploadLimits {
    /// Check that one more file still fits in the request
    pub fn check_count(&self, count: usize) -> MediaResult<()> {
        if count > self.max_files {
            return Err(MediaError::TooManyFiles {
                limit: self.max_files,
            });
        }
        Ok(())
    }

    /// Check a single file's type and size
    ///
    /// Both the extension and the declared MIME type must name an accepted
    /// image format.
    pub fn check_file(&self, file: &IncomingFile) -> MediaResult<()> {
        let extension_ok = file
            .extension()
            .is_some_and(|ext| ALLOWED_IMAGE_TYPES.contains(&ext.as_str()));

        let mime = file.content_type.to_ascii_lowercase();
        let mime_ok = mime
            .strip_prefix("image/")
            .is_some_and(|subtype| ALLOWED_IMAGE_TYPES.contains(&subtype));

        if !extension_ok || !mime_ok {
            return Err(MediaError::UnsupportedType(file.original_name.clone()));
        }

        if file.size() > self.max_file_size {
            return Err(MediaError::FileTooLarge {
                name: file.original_name.clone(),
                limit_mb: self.max_file_size / (1024 * 1024),
            });
        }

        Ok(())
    }

    /// Check a whole batch before anything is written
    pub fn check_batch(&self, files: &[IncomingFile]) -> MediaResult<()> {
        if files.is_empty() {
            return Err(MediaError::NoFiles);
        }
        self.check_count(files.len())?;
        files.iter().try_for_each(|file| self.check_file(file))
    }
}

/// Generate a collision-resistant stored name keeping the original extension
pub fn stored_name(original_name: &str) -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let suffix = Uuid::new_v4().simple();
    match Path::new(original_name)
        .extension()
        .and_then(|ext| ext.to_str())
    {
        Some(ext) => format!("{}-{}.{}", millis, suffix, ext.to_ascii_lowercase()),
        None => format!("{}-{}", millis, suffix),
    }
}

/// Title for the `index`-th (zero based) photo of an upload of `total` files
///
/// Multi-file uploads number their photos from 1 so each row stays
/// distinguishable.
pub fn photo_title(title: &str, index: usize, total: usize) -> String {
    if total > 1 {
        format!("{} {}", title, index + 1)
    } else {
        title.to_string()
    }
}

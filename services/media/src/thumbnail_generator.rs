use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::DynamicImage;
use tracing::info;

use crate::error::{MediaError, MediaResult};

/// Renders fixed-size, centre-cropped JPEG thumbnails
#[derive(Debug, Clone, Copy)]
pub struct ThumbnailGenerator {
    width: u32,
    height: u32,
    quality: u8,
}

impl Default for ThumbnailGenerator {
    fn default() -> Self {
        Self::new(300, 300, 80)
    }
}

impl ThumbnailGenerator {
    pub fn new(width: u32, height: u32, quality: u8) -> Self {
        Self {
            width,
            height,
            quality,
        }
    }

    /// Generate a thumbnail off the async runtime
    pub async fn generate_thumbnail(&self, name: &str, data: Vec<u8>) -> MediaResult<Vec<u8>> {
        info!("Generating thumbnail for photo: {}", name);

        let generator = *self;
        let name = name.to_string();
        tokio::task::spawn_blocking(move || generator.render(&name, &data)).await?
    }

    /// Decode `data`, cover-resize around the centre and encode as JPEG
    pub fn render(&self, name: &str, data: &[u8]) -> MediaResult<Vec<u8>> {
        let source = image::load_from_memory(data).map_err(|source| MediaError::Decode {
            name: name.to_string(),
            source,
        })?;

        let cropped = source.resize_to_fill(self.width, self.height, FilterType::Lanczos3);
        // JPEG has no alpha channel
        let rgb = DynamicImage::ImageRgb8(cropped.to_rgb8());

        let mut buffer = Cursor::new(Vec::new());
        let encoder = JpegEncoder::new_with_quality(&mut buffer, self.quality);
        rgb.write_with_encoder(encoder).map_err(MediaError::Encode)?;

        Ok(buffer.into_inner())
    }

    /// Stored name of the thumbnail belonging to `stored_name`
    pub fn thumbnail_name(stored_name: &str) -> String {
        // Thumbnails are always JPEG, whatever the original's format
        let stem = match stored_name.rsplit_once('.') {
            Some((stem, _)) => stem,
            None => stored_name,
        };
        format!("thumb_{}.jpg", stem)
    }
}

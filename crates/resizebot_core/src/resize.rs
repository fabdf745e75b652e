use std::io::Cursor;

use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResizeFailure {
    #[error("image is {actual}px wide, cannot resize to {requested}px")]
    TooSmall { requested: u32, actual: u32 },

    #[error("image could not be decoded or encoded: {0}")]
    Image(#[from] image::ImageError),
}

/// Scale an encoded image to a target width, keeping its aspect ratio and
/// its container format.
pub trait ImageResizer {
    fn resize_to_width(&self, bytes: &[u8], width: u32) -> Result<Vec<u8>, ResizeFailure>;
}

#[derive(Debug, Clone, Copy)]
pub struct ImageCrateResizer {
    filter: FilterType,
}

impl Default for ImageCrateResizer {
    fn default() -> Self {
        Self {
            filter: FilterType::Lanczos3,
        }
    }
}

impl ImageCrateResizer {
    pub fn with_filter(filter: FilterType) -> Self {
        Self { filter }
    }
}

impl ImageResizer for ImageCrateResizer {
    fn resize_to_width(&self, bytes: &[u8], width: u32) -> Result<Vec<u8>, ResizeFailure> {
        let format = image::guess_format(bytes)?;
        let source = image::load_from_memory_with_format(bytes, format)?;
        if width == 0 || width > source.width() {
            return Err(ResizeFailure::TooSmall {
                requested: width,
                actual: source.width(),
            });
        }

        let height = scaled_height(source.width(), source.height(), width);
        let mut resized = source.resize_exact(width, height, self.filter);
        if format == ImageFormat::Jpeg && resized.color().has_alpha() {
            resized = DynamicImage::ImageRgb8(resized.to_rgb8());
        }

        let mut cursor = Cursor::new(Vec::new());
        resized.write_to(&mut cursor, format)?;
        Ok(cursor.into_inner())
    }
}

/// Height that keeps the aspect ratio at `target_width`, never below 1px.
pub fn scaled_height(width: u32, height: u32, target_width: u32) -> u32 {
    if width == 0 {
        return 1;
    }
    let scaled = u64::from(height) * u64::from(target_width) / u64::from(width);
    u32::try_from(scaled).unwrap_or(u32::MAX).max(1)
}

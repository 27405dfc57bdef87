use std::path::Path;

use image::imageops::{self, FilterType};
use image::RgbaImage;

use crate::errors::CliError;
use crate::prompts::Segment;

/// Side length requested from the image service.
pub const GENERATION_SIZE: u32 = 1024;
/// Side length kept in memory and shown to the user.
pub const DISPLAY_SIZE: u32 = 512;

/// A downloaded image, scaled to the display resolution.
#[derive(Debug, Clone)]
pub struct GeneratedImage {
    pub segment: Segment,
    pub source_url: String,
    pub bitmap: RgbaImage,
}

impl GeneratedImage {
    pub fn width(&self) -> u32 {
        self.bitmap.width()
    }

    pub fn height(&self) -> u32 {
        self.bitmap.height()
    }

    pub fn save_png(&self, path: &Path) -> Result<(), CliError> {
        self.bitmap
            .save_with_format(path, image::ImageFormat::Png)
            .map_err(|e| CliError::Generic(format!("Failed writing {}: {e}", path.display())))
    }
}

/// Decode encoded image bytes and resample to a `size`×`size` square with
/// Lanczos3. Anything unreadable is a fetch failure.
pub fn decode_for_display(bytes: &[u8], size: u32) -> Result<RgbaImage, CliError> {
    let decoded = image::load_from_memory(bytes)?;
    let rgba = decoded.to_rgba8();
    if rgba.width() == size && rgba.height() == size {
        return Ok(rgba);
    }
    Ok(imageops::resize(&rgba, size, size, FilterType::Lanczos3))
}

#[cfg(test)]
pub(crate) fn encoded_png(size: u32, color: [u8; 4]) -> Vec<u8> {
    use std::io::Cursor;

    let img = RgbaImage::from_pixel(size, size, image::Rgba(color));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png)
        .expect("encode test png");
    out.into_inner()
}

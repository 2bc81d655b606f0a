//! Image saving helpers.
//!
//! Images arrive as encoded bytes (or base64 text) and are re-encoded into
//! the requested format before being written.

// ============================================================================
// Imports
// ============================================================================

use std::fs;
use std::io::Cursor;
use std::path::Path;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as Base64Standard;
use image::DynamicImage;
use image::codecs::jpeg::JpegEncoder;
use tracing::debug;

use crate::error::Result;

// ============================================================================
// ImageFormat
// ============================================================================

/// Output image format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ImageFormat {
    /// Lossless PNG.
    #[default]
    Png,
    /// JPEG with quality 1-100.
    Jpeg(u8),
}

impl ImageFormat {
    /// PNG format.
    #[inline]
    #[must_use]
    pub fn png() -> Self {
        Self::Png
    }

    /// JPEG format, clamping quality to 1-100.
    #[inline]
    #[must_use]
    pub fn jpeg(quality: u8) -> Self {
        Self::Jpeg(quality.clamp(1, 100))
    }

    /// File extension without the dot.
    #[must_use]
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg(_) => "jpg",
        }
    }
}

// ============================================================================
// Functions
// ============================================================================

/// Decodes `bytes` and re-encodes them as `format`.
///
/// # Errors
///
/// Returns [`Error::Image`](crate::Error::Image) if decoding or encoding
/// fails.
pub fn encode_image(bytes: &[u8], format: ImageFormat) -> Result<Vec<u8>> {
    let image = image::load_from_memory(bytes)?;
    let mut out = Vec::new();

    match format {
        ImageFormat::Png => {
            image.write_to(&mut Cursor::new(&mut out), image::ImageFormat::Png)?;
        }
        ImageFormat::Jpeg(quality) => {
            // JPEG has no alpha channel.
            let encoder = JpegEncoder::new_with_quality(&mut out, quality.clamp(1, 100));
            DynamicImage::ImageRgb8(image.to_rgb8()).write_with_encoder(encoder)?;
        }
    }

    Ok(out)
}

/// Saves encoded image bytes to `path` in `format`.
///
/// # Errors
///
/// - [`Error::Image`](crate::Error::Image) if the bytes are not an image
/// - [`Error::Io`](crate::Error::Io) if the file cannot be written
pub fn save_image(path: impl AsRef<Path>, bytes: &[u8], format: ImageFormat) -> Result<()> {
    let path = path.as_ref();
    let encoded = encode_image(bytes, format)?;
    fs::write(path, &encoded)?;

    debug!(path = %path.display(), bytes = encoded.len(), ?format, "Image saved");
    Ok(())
}

/// Saves a base64-encoded image to `path` in `format`.
///
/// # Errors
///
/// - [`Error::Base64`](crate::Error::Base64) if `data` is not valid base64
/// - any error from [`save_image`]
pub fn save_base64_image(path: impl AsRef<Path>, data: &str, format: ImageFormat) -> Result<()> {
    let bytes = Base64Standard.decode(data.trim())?;
    save_image(path, &bytes, format)
}

// ============================================================================
// Tests
// ============================================================================

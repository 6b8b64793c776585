//! Supported container formats and header-only detection.
//!
//! The engine only drives codecs for the formats listed here. Detection reads
//! the file signature and header, never the pixel data.

use crate::error::{CompressionError, Result};
use image::{ImageFormat, ImageReader};
use std::fmt;
use std::path::Path;

/// Image containers the engine can compress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SupportedFormat {
    /// JPEG, lossy re-encode or lossless metadata strip
    Jpeg,
    /// PNG, optimized with oxipng
    Png,
    /// WebP, lossy or lossless re-encode
    WebP,
}

impl SupportedFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            SupportedFormat::Jpeg => "jpg",
            SupportedFormat::Png => "png",
            SupportedFormat::WebP => "webp",
        }
    }

    pub fn to_image_format(&self) -> ImageFormat {
        match self {
            SupportedFormat::Jpeg => ImageFormat::Jpeg,
            SupportedFormat::Png => ImageFormat::Png,
            SupportedFormat::WebP => ImageFormat::WebP,
        }
    }

    pub fn from_image_format(format: ImageFormat) -> Option<Self> {
        match format {
            ImageFormat::Jpeg => Some(SupportedFormat::Jpeg),
            ImageFormat::Png => Some(SupportedFormat::Png),
            ImageFormat::WebP => Some(SupportedFormat::WebP),
            _ => None,
        }
    }

    pub fn all_formats() -> [SupportedFormat; 3] {
        [SupportedFormat::Jpeg, SupportedFormat::Png, SupportedFormat::WebP]
    }

    /// Detects the format from in-memory bytes (magic number only).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let format = image::guess_format(bytes)
            .map_err(|e| CompressionError::UnsupportedFormat(e.to_string()))?;
        Self::from_image_format(format)
            .ok_or_else(|| CompressionError::UnsupportedFormat(format!("{:?}", format)))
    }
}

impl fmt::Display for SupportedFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SupportedFormat::Jpeg => "JPEG",
            SupportedFormat::Png => "PNG",
            SupportedFormat::WebP => "WebP",
        };
        write!(f, "{}", name)
    }
}

/// Header information of an image file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageHeader {
    pub format: SupportedFormat,
    pub width: u32,
    pub height: u32,
}

/// Reads format and dimensions without decoding pixels.
///
/// The format is guessed from the file content rather than its extension, so
/// a `.jpg` holding PNG data is reported as PNG.
pub fn read_header(path: &Path) -> Result<ImageHeader> {
    if !path.exists() {
        return Err(CompressionError::FileNotFound(path.to_path_buf()));
    }

    let reader = ImageReader::open(path)?.with_guessed_format()?;
    let format = reader
        .format()
        .and_then(SupportedFormat::from_image_format)
        .ok_or_else(|| {
            CompressionError::UnsupportedFormat(format!(
                "{} is not a JPEG, PNG or WebP image",
                path.display()
            ))
        })?;

    let (width, height) = reader
        .into_dimensions()
        .map_err(|e| CompressionError::UnsupportedFormat(format!("{}: {}", path.display(), e)))?;

    Ok(ImageHeader {
        format,
        width,
        height,
    })
}

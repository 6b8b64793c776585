//! Codec parameter bundles and the compression-level mapping.
//!
//! Every run carries one bundle with a variant per format; the codec picks the
//! one matching the detected format of its input.

use crate::constants::{LEVEL_JPEG_MAX_QUALITY, LEVEL_JPEG_MIN_QUALITY, MAX_LEVEL};
use crate::options::{AdvancedParameters, CompressionOptions};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JpegParameters {
    /// 1..=100 re-encodes at that quality, 0 keeps the entropy-coded data as is
    pub quality: u8,
    pub copy_metadata: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PngParameters {
    pub iterations: u8,
    pub iterations_large: u8,
    pub lossy_8bit: bool,
    pub preserve_transparency: bool,
    pub keep_metadata: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WebpParameters {
    pub lossless: bool,
    /// 1..=100, ignored when `lossless`
    pub quality: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecParameters {
    pub jpeg: JpegParameters,
    pub png: PngParameters,
    pub webp: WebpParameters,
}

impl CodecParameters {
    /// Derives parameters from a single 0..=100 level.
    ///
    /// Higher levels never produce a higher JPEG quality, fewer PNG
    /// iterations, or switch off 8-bit reduction.
    pub fn from_level(level: u8, lossless: bool, keep_metadata: bool) -> Self {
        let level = level.min(MAX_LEVEL) as u32;

        let span = (LEVEL_JPEG_MAX_QUALITY - LEVEL_JPEG_MIN_QUALITY) as u32;
        let quality = if lossless {
            0
        } else {
            LEVEL_JPEG_MAX_QUALITY - (level * span / MAX_LEVEL as u32) as u8
        };

        let iterations = (level / 10) as u8;
        let iterations_large = (level / 20) as u8;

        Self {
            jpeg: JpegParameters {
                quality,
                copy_metadata: keep_metadata,
            },
            png: PngParameters {
                iterations,
                iterations_large,
                lossy_8bit: !lossless && level >= 60,
                preserve_transparency: true,
                keep_metadata,
            },
            webp: WebpParameters { lossless, quality },
        }
    }

    /// WebP has no advanced knobs of its own and shares the JPEG quality.
    pub fn from_advanced(advanced: &AdvancedParameters, lossless: bool, keep_metadata: bool) -> Self {
        Self {
            jpeg: JpegParameters {
                quality: if lossless { 0 } else { advanced.jpeg.quality },
                copy_metadata: advanced.jpeg.copy_metadata,
            },
            png: PngParameters {
                iterations: advanced.png.iterations,
                iterations_large: advanced.png.iterations_large,
                lossy_8bit: advanced.png.lossy_8bit,
                preserve_transparency: advanced.png.preserve_transparency,
                keep_metadata,
            },
            webp: WebpParameters {
                lossless,
                quality: advanced.jpeg.quality,
            },
        }
    }

    pub fn for_options(options: &CompressionOptions) -> Self {
        match &options.advanced {
            Some(advanced) => Self::from_advanced(advanced, options.lossless, options.keep_metadata),
            None => Self::from_level(options.level, options.lossless, options.keep_metadata),
        }
    }
}

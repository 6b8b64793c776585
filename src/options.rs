use crate::constants::{
    DEFAULT_JPEG_QUALITY, DEFAULT_LEVEL, DEFAULT_PNG_ITERATIONS, DEFAULT_PNG_ITERATIONS_LARGE,
    MAX_LEVEL, MAX_QUALITY, TRASH_DIR_NAME,
};
use crate::error::{CompressionError, Result};
use std::path::{Path, PathBuf};

/// How a resize computes its target dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitMode {
    /// Keep the original dimensions
    None,
    /// Exact dimensions. A zero side is derived from the other one, keeping
    /// the aspect ratio.
    Dimensions { width: u32, height: u32 },
    /// Longest side equals the value
    LongEdge(u32),
    /// Shortest side equals the value
    ShortEdge(u32),
    /// Both sides scaled by this percentage
    Percentage(u32),
    /// Aim for roughly this many bytes by scaling the pixel count
    FileSize(u64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizeOptions {
    pub fit: FitMode,
    pub do_not_enlarge: bool,
}

impl ResizeOptions {
    pub fn new(fit: FitMode) -> Self {
        Self {
            fit,
            do_not_enlarge: false,
        }
    }

    pub fn do_not_enlarge(mut self, value: bool) -> Self {
        self.do_not_enlarge = value;
        self
    }

    pub fn validate(&self) -> Result<()> {
        match self.fit {
            FitMode::Dimensions {
                width: 0,
                height: 0,
            } => Err(CompressionError::InvalidResize(
                "width and height cannot both be zero".to_string(),
            )),
            FitMode::LongEdge(0) | FitMode::ShortEdge(0) => Err(CompressionError::InvalidResize(
                "edge length must be positive".to_string(),
            )),
            FitMode::Percentage(0) => Err(CompressionError::InvalidResize(
                "percentage must be positive".to_string(),
            )),
            FitMode::FileSize(0) => Err(CompressionError::InvalidResize(
                "target file size must be positive".to_string(),
            )),
            _ => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdvancedJpeg {
    pub quality: u8,
    pub copy_metadata: bool,
}

impl Default for AdvancedJpeg {
    fn default() -> Self {
        Self {
            quality: DEFAULT_JPEG_QUALITY,
            copy_metadata: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdvancedPng {
    /// Zopfli iterations; zero selects the fast libdeflater backend
    pub iterations: u8,
    /// Iterations used for images above the large-image threshold
    pub iterations_large: u8,
    pub lossy_8bit: bool,
    pub preserve_transparency: bool,
}

impl Default for AdvancedPng {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_PNG_ITERATIONS,
            iterations_large: DEFAULT_PNG_ITERATIONS_LARGE,
            lossy_8bit: false,
            preserve_transparency: true,
        }
    }
}

/// Per-format knobs used instead of the single compression level
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AdvancedParameters {
    pub jpeg: AdvancedJpeg,
    pub png: AdvancedPng,
}

/// Immutable policy for one compression run.
///
/// Built once by the host and shared by reference with every worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressionOptions {
    pub output_path: PathBuf,
    pub same_folder_as_input: bool,
    pub keep_structure: bool,
    pub base_path: PathBuf,
    pub suffix: String,
    pub level: u8,
    pub lossless: bool,
    pub keep_metadata: bool,
    pub advanced: Option<AdvancedParameters>,
    pub resize: Option<ResizeOptions>,
    pub trash_dir: Option<PathBuf>,
}

impl CompressionOptions {
    pub fn new(output_path: impl Into<PathBuf>) -> Self {
        Self {
            output_path: output_path.into(),
            same_folder_as_input: false,
            keep_structure: false,
            base_path: PathBuf::new(),
            suffix: String::new(),
            level: DEFAULT_LEVEL,
            lossless: false,
            keep_metadata: true,
            advanced: None,
            resize: None,
            trash_dir: None,
        }
    }

    pub fn with_level(mut self, level: u8) -> Self {
        self.level = level;
        self
    }

    pub fn with_lossless(mut self, lossless: bool) -> Self {
        self.lossless = lossless;
        self
    }

    pub fn with_keep_metadata(mut self, keep: bool) -> Self {
        self.keep_metadata = keep;
        self
    }

    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    pub fn with_same_folder_as_input(mut self, same: bool) -> Self {
        self.same_folder_as_input = same;
        self
    }

    pub fn with_structure(mut self, base_path: impl Into<PathBuf>) -> Self {
        self.keep_structure = true;
        self.base_path = base_path.into();
        self
    }

    pub fn with_advanced(mut self, advanced: AdvancedParameters) -> Self {
        self.advanced = Some(advanced);
        self
    }

    pub fn with_resize(mut self, resize: ResizeOptions) -> Self {
        self.resize = Some(resize);
        self
    }

    pub fn with_trash_dir(mut self, trash_dir: impl Into<PathBuf>) -> Self {
        self.trash_dir = Some(trash_dir.into());
        self
    }

    pub fn is_advanced(&self) -> bool {
        self.advanced.is_some()
    }

    /// Directory that receives destinations displaced by a commit.
    pub fn trash_dir(&self) -> PathBuf {
        self.trash_dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join(TRASH_DIR_NAME))
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    pub fn validate(&self) -> Result<()> {
        if self.level > MAX_LEVEL {
            return Err(CompressionError::InvalidLevel(self.level));
        }

        if let Some(advanced) = &self.advanced {
            if advanced.jpeg.quality > MAX_QUALITY {
                return Err(CompressionError::InvalidQuality(advanced.jpeg.quality));
            }
        }

        if let Some(resize) = &self.resize {
            resize.validate()?;
        }

        if !self.same_folder_as_input && self.output_path.as_os_str().is_empty() {
            return Err(CompressionError::InvalidParameter(
                "an output path is required unless compressing into the input folder".to_string(),
            ));
        }

        Ok(())
    }
}

use crate::codec::{encode_image, Codec, ImageCodec};
use crate::constants::RESIZE_SAVE_QUALITY;
use crate::error::{CompressionError, Result};
use crate::formats::{read_header, SupportedFormat};
use crate::options::{CompressionOptions, ResizeOptions};
use crate::parameters::CodecParameters;
use crate::record::{CompressedInfo, ImageRecord};
use crate::resize::resize_image;
use crate::staging::{move_to_trash, restore_from_trash, OutputGuard, StagingFile};
use crate::verbose;
use image::ImageReader;
use std::fs;
use std::path::{Path, PathBuf};

/// Which commit branch a successful compression took
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompressionOutcome {
    /// The destination did not exist and now holds the result
    Written,
    /// An existing destination was moved to `trashed` and replaced
    Replaced { trashed: PathBuf },
    /// An existing destination was kept because the new result was not smaller
    Kept,
}

/// Directory an input's result is written to.
///
/// Writing next to the input wins over structure mirroring. With
/// `keep_structure`, the input's folder relative to `base_path` is recreated
/// under `output_path`; inputs outside `base_path` land in `output_path`.
pub fn resolve_output_dir(input: &Path, options: &CompressionOptions) -> PathBuf {
    let parent = input.parent().unwrap_or_else(|| Path::new(""));

    if options.same_folder_as_input {
        return parent.to_path_buf();
    }

    if options.keep_structure && !options.base_path.as_os_str().is_empty() {
        match parent.strip_prefix(&options.base_path) {
            Ok(relative) => return options.output_path.join(relative),
            Err(_) => verbose!(
                "{} is outside {}, writing to the output root",
                input.display(),
                options.base_path.display()
            ),
        }
    }

    options.output_path.clone()
}

/// `<stem><suffix>.<extension>` of `input`.
pub fn output_file_name(input: &Path, suffix: &str) -> Result<String> {
    let stem = input
        .file_stem()
        .ok_or_else(|| CompressionError::UnsupportedFormat("Invalid file name".to_string()))?
        .to_string_lossy();

    Ok(match input.extension() {
        Some(ext) => format!("{}{}.{}", stem, suffix, ext.to_string_lossy()),
        None => format!("{}{}", stem, suffix),
    })
}

pub fn resolve_output_path(input: &Path, options: &CompressionOptions) -> Result<PathBuf> {
    Ok(resolve_output_dir(input, options).join(output_file_name(input, &options.suffix)?))
}

/// Runs the per-image pipeline against a codec.
#[derive(Debug, Clone)]
pub struct CompressionEngine<C: Codec = ImageCodec> {
    codec: C,
}

impl Default for CompressionEngine<ImageCodec> {
    fn default() -> Self {
        Self::new(ImageCodec)
    }
}

impl<C: Codec> CompressionEngine<C> {
    pub fn new(codec: C) -> Self {
        Self { codec }
    }

    pub fn codec(&self) -> &C {
        &self.codec
    }

    /// Compresses one image according to `options`.
    ///
    /// On success the record's compressed fields describe the file now at
    /// the destination. On error the record is left exactly as it was and no
    /// staging file survives.
    ///
    /// # Errors
    /// * `FileNotFound` if the source disappeared since import
    /// * `DirectoryCreateError`, `TempFileError`, `ResizeSaveError`,
    ///   `CodecFailure`, `CommitError` for the matching pipeline step
    pub fn compress(
        &self,
        record: &mut ImageRecord,
        options: &CompressionOptions,
    ) -> Result<CompressionOutcome> {
        let input = record.path().to_path_buf();
        if !input.exists() {
            return Err(CompressionError::FileNotFound(input));
        }
        let input_size = fs::metadata(&input)?.len();

        let output_dir = resolve_output_dir(&input, options);
        fs::create_dir_all(&output_dir).map_err(|source| CompressionError::DirectoryCreateError {
            path: output_dir.clone(),
            source,
        })?;
        let output_path = output_dir.join(output_file_name(&input, &options.suffix)?);

        let destination_exists = output_path.exists();
        let staging = if destination_exists || options.resize.is_some() {
            Some(StagingFile::new_in(&output_dir, record.format().extension())?)
        } else {
            None
        };
        // removes a half-written direct output if anything below fails
        let direct_guard = staging.is_none().then(|| OutputGuard::new(&output_path));
        let target = staging
            .as_ref()
            .map(|s| s.path().to_path_buf())
            .unwrap_or_else(|| output_path.clone());

        verbose!(
            "{} -> {} ({})",
            input.display(),
            output_path.display(),
            if staging.is_some() { "staged" } else { "direct" }
        );

        let params = CodecParameters::for_options(options);

        let mut codec_input = input.clone();
        if let Some(resize) = &options.resize {
            if stage_resized(&input, record.format(), resize, input_size, &target)? {
                codec_input = target.clone();
            }
        }

        self.codec
            .compress(&codec_input, &target, &params)
            .map_err(|e| CompressionError::CodecFailure {
                path: input.clone(),
                code: e.code,
                message: e.message,
            })?;

        let outcome = match staging {
            None => {
                if let Some(guard) = direct_guard {
                    guard.disarm();
                }
                CompressionOutcome::Written
            }
            Some(staging) if destination_exists => {
                let staged_size = staging.len()?;
                if staged_size < input_size || options.resize.is_some() {
                    staging.copy_permissions_from(&output_path);
                    let trashed = move_to_trash(&output_path, &options.trash_dir())?;
                    if let Err(e) = staging.commit(&output_path) {
                        let _ = restore_from_trash(&trashed, &output_path);
                        return Err(e);
                    }
                    CompressionOutcome::Replaced { trashed }
                } else {
                    verbose!(
                        "Kept {}: {} bytes is not smaller than {}",
                        output_path.display(),
                        staged_size,
                        input_size
                    );
                    CompressionOutcome::Kept
                }
            }
            Some(staging) => {
                staging.copy_permissions_from(&input);
                staging.commit(&output_path)?;
                CompressionOutcome::Written
            }
        };

        // a kept destination need not be a readable image
        let header = read_header(&output_path).map_err(|e| CompressionError::CommitError {
            path: output_path.clone(),
            reason: e.to_string(),
        })?;
        let size = fs::metadata(&output_path)?.len();
        record.set_compressed(CompressedInfo {
            size,
            width: header.width,
            height: header.height,
            path: output_path,
        });

        Ok(outcome)
    }
}

/// Writes the resized image to `staging_path` at full quality.
///
/// Returns `false` without touching the staging file when the resize keeps
/// the original dimensions.
fn stage_resized(
    input: &Path,
    format: SupportedFormat,
    resize: &ResizeOptions,
    input_size: u64,
    staging_path: &Path,
) -> Result<bool> {
    let img = ImageReader::open(input)?.with_guessed_format()?.decode()?;

    let Some(resized) = resize_image(&img, resize, input_size) else {
        return Ok(false);
    };

    let save_error = |reason: String| CompressionError::ResizeSaveError {
        path: staging_path.to_path_buf(),
        reason,
    };
    let bytes = encode_image(&resized, format, RESIZE_SAVE_QUALITY)
        .map_err(|e| save_error(e.to_string()))?;
    fs::write(staging_path, bytes).map_err(|e| save_error(e.to_string()))?;

    Ok(true)
}

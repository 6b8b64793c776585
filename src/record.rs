use crate::error::{CompressionError, Result};
use crate::formats::{read_header, SupportedFormat};
use crate::utils::{format_file_size, format_resolution, strikethrough};
use std::fs;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageStatus {
    Uncompressed,
    Compressed,
}

/// Size, dimensions and location of a committed compression result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressedInfo {
    pub size: u64,
    pub width: u32,
    pub height: u32,
    pub path: PathBuf,
}

/// One imported image and what happened to it.
///
/// Records compare equal when their absolute source paths are equal; every
/// other field is ignored by `==` and `Hash`.
#[derive(Debug, Clone)]
pub struct ImageRecord {
    path: PathBuf,
    file_name: String,
    format: SupportedFormat,
    original_size: u64,
    width: u32,
    height: u32,
    compressed: Option<CompressedInfo>,
}

impl ImageRecord {
    /// Imports an image by reading its header only.
    ///
    /// # Errors
    /// * `FileNotFound` if `path` does not exist
    /// * `UnsupportedFormat` if the content is not a readable JPEG, PNG or WebP
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(CompressionError::FileNotFound(path.to_path_buf()));
        }

        let path = path.canonicalize()?;
        let header = read_header(&path)?;
        let original_size = fs::metadata(&path)?.len();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(Self {
            path,
            file_name,
            format: header.format,
            original_size,
            width: header.width,
            height: header.height,
            compressed: None,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn format(&self) -> SupportedFormat {
        self.format
    }

    pub fn original_size(&self) -> u64 {
        self.original_size
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn status(&self) -> ImageStatus {
        if self.compressed.is_some() {
            ImageStatus::Compressed
        } else {
            ImageStatus::Uncompressed
        }
    }

    pub fn compressed(&self) -> Option<&CompressedInfo> {
        self.compressed.as_ref()
    }

    pub fn compressed_size(&self) -> Option<u64> {
        self.compressed.as_ref().map(|c| c.size)
    }

    pub fn compressed_dimensions(&self) -> Option<(u32, u32)> {
        self.compressed.as_ref().map(|c| (c.width, c.height))
    }

    pub fn compressed_path(&self) -> Option<&Path> {
        self.compressed.as_ref().map(|c| c.path.as_path())
    }

    /// Only the engine marks a record compressed, and only after commit.
    pub(crate) fn set_compressed(&mut self, info: CompressedInfo) {
        self.compressed = Some(info);
    }

    pub fn formatted_size(&self) -> String {
        format_file_size(self.compressed_size().unwrap_or(self.original_size))
    }

    pub fn formatted_resolution(&self) -> String {
        let (width, height) = self.compressed_dimensions().unwrap_or((self.width, self.height));
        format_resolution(width, height)
    }

    /// Like `formatted_size`, with the original struck through when it changed.
    pub fn rich_formatted_size(&self) -> String {
        match self.compressed_size() {
            Some(size) if size != self.original_size => strikethrough(
                &format_file_size(self.original_size),
                &format_file_size(size),
            ),
            _ => format_file_size(self.original_size),
        }
    }

    pub fn rich_formatted_resolution(&self) -> String {
        let original = format_resolution(self.width, self.height);
        match self.compressed_dimensions() {
            Some((w, h)) if w != self.width || h != self.height => {
                strikethrough(&original, &format_resolution(w, h))
            }
            _ => original,
        }
    }

    /// compressed size / original size
    pub fn ratio(&self) -> Option<f64> {
        let size = self.compressed_size()?;
        if self.original_size == 0 {
            return None;
        }
        Some(size as f64 / self.original_size as f64)
    }

    pub fn saved_ratio_percent(&self) -> Option<i64> {
        self.ratio().map(|r| (100.0 - r * 100.0).round() as i64)
    }

    pub fn formatted_saved_ratio(&self) -> Option<String> {
        self.saved_ratio_percent().map(|p| format!("{}%", p))
    }
}

impl PartialEq for ImageRecord {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}

impl Eq for ImageRecord {}

impl Hash for ImageRecord {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.path.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat, RgbImage};
    use std::collections::HashSet;
    use tempfile::TempDir;

    fn write_png(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
        let path = dir.join(name);
        DynamicImage::ImageRgb8(RgbImage::new(width, height))
            .save_with_format(&path, ImageFormat::Png)
            .unwrap();
        path
    }

    #[test]
    fn test_new_reads_header() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_png(temp_dir.path(), "pic.png", 320, 200);

        let record = ImageRecord::new(&path).unwrap();
        assert_eq!(record.file_name(), "pic.png");
        assert_eq!(record.format(), SupportedFormat::Png);
        assert_eq!(record.dimensions(), (320, 200));
        assert_eq!(record.original_size(), fs::metadata(&path).unwrap().len());
        assert_eq!(record.status(), ImageStatus::Uncompressed);
        assert!(record.compressed().is_none());
        assert!(record.path().is_absolute());
    }

    #[test]
    fn test_new_rejects_unsupported() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("fake.jpg");
        fs::write(&path, b"fake image data").unwrap();

        assert!(matches!(
            ImageRecord::new(&path),
            Err(CompressionError::UnsupportedFormat(_))
        ));
        assert!(matches!(
            ImageRecord::new(temp_dir.path().join("missing.png")),
            Err(CompressionError::FileNotFound(_))
        ));
    }

    #[test]
    fn test_equality_by_path_only() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_png(temp_dir.path(), "same.png", 10, 10);
        let other = write_png(temp_dir.path(), "other.png", 10, 10);

        let a = ImageRecord::new(&path).unwrap();
        let mut b = ImageRecord::new(&path).unwrap();
        b.set_compressed(CompressedInfo {
            size: 1,
            width: 5,
            height: 5,
            path: other.clone(),
        });
        let c = ImageRecord::new(&other).unwrap();

        assert_eq!(a, b);
        assert_ne!(a, c);

        let set: HashSet<ImageRecord> = [a, b, c].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_formatting_uncompressed() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_png(temp_dir.path(), "plain.png", 64, 48);
        let record = ImageRecord::new(&path).unwrap();

        assert_eq!(record.formatted_resolution(), "64x48");
        assert_eq!(record.rich_formatted_resolution(), "64x48");
        assert_eq!(record.rich_formatted_size(), record.formatted_size());
        assert_eq!(record.ratio(), None);
        assert_eq!(record.saved_ratio_percent(), None);
    }

    #[test]
    fn test_formatting_compressed() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_png(temp_dir.path(), "big.png", 64, 48);
        let mut record = ImageRecord::new(&path).unwrap();
        let original = record.original_size();

        record.set_compressed(CompressedInfo {
            size: original / 4,
            width: 32,
            height: 24,
            path: path.clone(),
        });

        assert_eq!(record.status(), ImageStatus::Compressed);
        assert_eq!(record.formatted_resolution(), "32x24");
        assert_eq!(record.rich_formatted_resolution(), "~~64x48~~ 32x24");
        assert_eq!(record.formatted_size(), format_file_size(original / 4));
        assert!(record.rich_formatted_size().starts_with("~~"));

        let expected = (100.0 - 100.0 * ((original / 4) as f64 / original as f64)).round() as i64;
        assert_eq!(record.saved_ratio_percent(), Some(expected));
        assert_eq!(record.formatted_saved_ratio(), Some(format!("{}%", expected)));
    }

    #[test]
    fn test_rich_formatting_when_unchanged() {
        let temp_dir = TempDir::new().unwrap();
        let path = write_png(temp_dir.path(), "same.png", 16, 16);
        let mut record = ImageRecord::new(&path).unwrap();
        let original = record.original_size();

        record.set_compressed(CompressedInfo {
            size: original,
            width: 16,
            height: 16,
            path: path.clone(),
        });

        assert_eq!(record.rich_formatted_size(), format_file_size(original));
        assert_eq!(record.rich_formatted_resolution(), "16x16");
        assert_eq!(record.saved_ratio_percent(), Some(0));
    }
}

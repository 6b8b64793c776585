#![allow(dead_code)]

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ExtendedColorType, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Smooth gradient with a fine checker pattern, so encoders have real work
pub fn pattern_image(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
        let checker = if (x / 4 + y / 4) % 2 == 0 { 24 } else { 0 };
        Rgb([
            ((x * 255 / width.max(1)) as u8).saturating_add(checker),
            ((y * 255 / height.max(1)) as u8).saturating_add(checker),
            ((x + y) % 256) as u8,
        ])
    }))
}

pub fn write_jpeg(dir: &Path, name: &str, width: u32, height: u32, quality: u8) -> PathBuf {
    let path = dir.join(name);
    let writer = BufWriter::new(File::create(&path).unwrap());
    let rgb = pattern_image(width, height).to_rgb8();
    JpegEncoder::new_with_quality(writer, quality)
        .encode(rgb.as_raw(), width, height, ExtendedColorType::Rgb8)
        .unwrap();
    path
}

pub fn write_png(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    let path = dir.join(name);
    pattern_image(width, height)
        .save_with_format(&path, ImageFormat::Png)
        .unwrap();
    path
}

pub fn write_rgba_png(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    let path = dir.join(name);
    DynamicImage::ImageRgba8(RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x % 256) as u8, (y % 256) as u8, 90, if x < width / 2 { 255 } else { 64 }])
    }))
    .save_with_format(&path, ImageFormat::Png)
    .unwrap();
    path
}

pub fn write_webp(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    let path = dir.join(name);
    pattern_image(width, height)
        .save_with_format(&path, ImageFormat::WebP)
        .unwrap();
    path
}

/// A JPEG, a PNG and a WebP, plus a text file that must be ignored
pub fn create_test_image_files(dir: &Path) -> Vec<PathBuf> {
    let txt_file = dir.join("notes.txt");
    File::create(&txt_file)
        .unwrap()
        .write_all(b"not an image")
        .unwrap();

    vec![
        write_jpeg(dir, "photo.jpg", 320, 240, 95),
        write_png(dir, "chart.png", 160, 120),
        write_webp(dir, "icon.webp", 64, 64),
        txt_file,
    ]
}

pub fn create_nested_directory_structure(dir: &Path) -> PathBuf {
    let subdir = dir.join("subdir").join("deeper");
    fs::create_dir_all(&subdir).unwrap();
    write_png(&subdir, "nested.png", 48, 48);
    write_jpeg(&dir.join("subdir"), "middle.jpg", 64, 48, 95);
    subdir
}

pub fn create_temp_directory() -> TempDir {
    TempDir::new().unwrap()
}

pub fn create_test_output_directory(dir: &Path) -> PathBuf {
    let output_dir = dir.join("output");
    fs::create_dir(&output_dir).unwrap();
    output_dir
}

/// Regular files directly inside `dir`, sorted by name
pub fn list_files(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_file())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

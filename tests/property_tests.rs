use batch_squeeze::engine::{output_file_name, resolve_output_dir};
use batch_squeeze::resize::target_dimensions;
use batch_squeeze::utils::is_image_file;
use batch_squeeze::{CodecParameters, CompressionOptions, FitMode, ResizeOptions};
use proptest::prelude::*;
use std::path::{Path, PathBuf};

fn fit_mode() -> impl Strategy<Value = FitMode> {
    prop_oneof![
        (0u32..5000, 0u32..5000).prop_map(|(width, height)| FitMode::Dimensions { width, height }),
        (1u32..8000).prop_map(FitMode::LongEdge),
        (1u32..8000).prop_map(FitMode::ShortEdge),
        (1u32..400).prop_map(FitMode::Percentage),
        (1u64..50_000_000).prop_map(FitMode::FileSize),
    ]
}

proptest! {
    #[test]
    fn higher_level_never_raises_jpeg_quality(a in 0u8..=100u8, b in 0u8..=100u8) {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        let low_params = CodecParameters::from_level(low, false, true);
        let high_params = CodecParameters::from_level(high, false, true);

        prop_assert!(high_params.jpeg.quality <= low_params.jpeg.quality);
        prop_assert!(high_params.png.iterations >= low_params.png.iterations);
        prop_assert!(high_params.png.iterations_large <= high_params.png.iterations);
        prop_assert!(high_params.jpeg.quality >= 1);
    }

    #[test]
    fn lossless_level_always_uses_lossless_jpeg(level in 0u8..=100u8) {
        let params = CodecParameters::from_level(level, true, false);
        prop_assert_eq!(params.jpeg.quality, 0);
        prop_assert!(!params.png.lossy_8bit);
    }

    #[test]
    fn do_not_enlarge_never_enlarges(
        width in 1u32..6000,
        height in 1u32..6000,
        bytes in 0u64..100_000_000,
        fit in fit_mode()
    ) {
        let options = ResizeOptions::new(fit).do_not_enlarge(true);
        let (w, h) = target_dimensions((width, height), &options, bytes);
        prop_assert!(w <= width && h <= height);
    }

    #[test]
    fn resize_targets_are_never_empty(
        width in 1u32..6000,
        height in 1u32..6000,
        fit in fit_mode()
    ) {
        let (w, h) = target_dimensions((width, height), &ResizeOptions::new(fit), 1_000_000);
        prop_assert!(w >= 1 && h >= 1);
    }

    #[test]
    fn keep_structure_mirrors_relative_folder(
        base in prop::collection::vec("[a-z]{1,8}", 1..4),
        relative in prop::collection::vec("[a-z]{1,8}", 0..4),
        name in "[a-z]{1,8}\\.(png|jpg)"
    ) {
        let base_path: PathBuf = std::iter::once("/".to_string()).chain(base).collect();
        let relative_path: PathBuf = relative.iter().collect();
        let input = base_path.join(&relative_path).join(&name);

        let options = CompressionOptions::new("/out").with_structure(&base_path);
        prop_assert_eq!(resolve_output_dir(&input, &options), Path::new("/out").join(&relative_path));
    }

    #[test]
    fn output_name_keeps_extension(stem in "[a-zA-Z0-9_-]{1,12}", suffix in "[a-z_]{0,6}") {
        let input = PathBuf::from(format!("/in/{}.png", stem));
        let name = output_file_name(&input, &suffix).unwrap();
        prop_assert_eq!(name, format!("{}{}.png", stem, suffix));
    }

    #[test]
    fn is_image_file_recognizes_extensions(
        extension in prop::sample::select(&["jpg", "JPEG", "png", "webp", "bmp", "gif", "txt", "pdf"])
    ) {
        let filename = format!("test.{}", extension);
        let expected = matches!(extension.to_lowercase().as_str(), "jpg" | "jpeg" | "png" | "webp");
        prop_assert_eq!(is_image_file(Path::new(&filename)), expected);
    }
}

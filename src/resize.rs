use crate::options::{FitMode, ResizeOptions};
use crate::verbose;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};

fn scale(value: u32, numerator: f64, denominator: f64) -> u32 {
    ((value as f64 * numerator / denominator).round() as u32).max(1)
}

/// Computes the dimensions a resize would produce.
///
/// `original_bytes` feeds the file-size heuristic, which scales the pixel
/// count proportionally to the requested byte reduction and never grows an
/// image that is already under target.
pub fn target_dimensions(
    (width, height): (u32, u32),
    options: &ResizeOptions,
    original_bytes: u64,
) -> (u32, u32) {
    if width == 0 || height == 0 {
        return (width, height);
    }

    let (w, h) = (width as f64, height as f64);
    let target = match options.fit {
        FitMode::None => (width, height),
        FitMode::Dimensions {
            width: 0,
            height: 0,
        } => (width, height),
        FitMode::Dimensions {
            width: tw,
            height: 0,
        } => (tw, scale(height, tw as f64, w)),
        FitMode::Dimensions {
            width: 0,
            height: th,
        } => (scale(width, th as f64, h), th),
        FitMode::Dimensions {
            width: tw,
            height: th,
        } => (tw, th),
        FitMode::LongEdge(edge) => {
            if width >= height {
                (edge, scale(height, edge as f64, w))
            } else {
                (scale(width, edge as f64, h), edge)
            }
        }
        FitMode::ShortEdge(edge) => {
            if width <= height {
                (edge, scale(height, edge as f64, w))
            } else {
                (scale(width, edge as f64, h), edge)
            }
        }
        FitMode::Percentage(percent) => (
            scale(width, percent as f64, 100.0),
            scale(height, percent as f64, 100.0),
        ),
        FitMode::FileSize(target_bytes) => {
            if original_bytes == 0 || original_bytes <= target_bytes {
                (width, height)
            } else {
                let factor = (target_bytes as f64 / original_bytes as f64).sqrt();
                (scale(width, factor, 1.0), scale(height, factor, 1.0))
            }
        }
    };

    if options.do_not_enlarge && (target.0 > width || target.1 > height) {
        return (width, height);
    }

    target
}

/// Resizes `img` according to `options`.
///
/// Returns `None` when the computed dimensions equal the current ones, so the
/// caller can keep using the original file untouched.
pub fn resize_image(
    img: &DynamicImage,
    options: &ResizeOptions,
    original_bytes: u64,
) -> Option<DynamicImage> {
    let current = img.dimensions();
    let (width, height) = target_dimensions(current, options, original_bytes);

    if (width, height) == current {
        verbose!("Resize skipped, {}x{} already fits", current.0, current.1);
        return None;
    }

    verbose!(
        "Resizing {}x{} -> {}x{}",
        current.0,
        current.1,
        width,
        height
    );
    Some(img.resize_exact(width, height, FilterType::Lanczos3))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(fit: FitMode) -> ResizeOptions {
        ResizeOptions::new(fit)
    }

    #[test]
    fn test_exact_dimensions() {
        assert_eq!(
            target_dimensions(
                (2000, 1500),
                &opts(FitMode::Dimensions {
                    width: 800,
                    height: 600
                }),
                0
            ),
            (800, 600)
        );
    }

    #[test]
    fn test_single_side_keeps_aspect() {
        assert_eq!(
            target_dimensions(
                (2000, 1500),
                &opts(FitMode::Dimensions {
                    width: 1000,
                    height: 0
                }),
                0
            ),
            (1000, 750)
        );
        assert_eq!(
            target_dimensions(
                (2000, 1500),
                &opts(FitMode::Dimensions {
                    width: 0,
                    height: 300
                }),
                0
            ),
            (400, 300)
        );
    }

    #[test]
    fn test_long_and_short_edge() {
        assert_eq!(target_dimensions((1920, 1080), &opts(FitMode::LongEdge(960)), 0), (960, 540));
        assert_eq!(target_dimensions((1080, 1920), &opts(FitMode::LongEdge(960)), 0), (540, 960));
        assert_eq!(target_dimensions((1920, 1080), &opts(FitMode::ShortEdge(540)), 0), (960, 540));
    }

    #[test]
    fn test_percentage() {
        assert_eq!(target_dimensions((400, 300), &opts(FitMode::Percentage(50)), 0), (200, 150));
    }

    #[test]
    fn test_file_size_heuristic() {
        let options = opts(FitMode::FileSize(250_000));
        assert_eq!(target_dimensions((2000, 1000), &options, 1_000_000), (1000, 500));
        // already under target
        assert_eq!(target_dimensions((2000, 1000), &options, 100_000), (2000, 1000));
    }

    #[test]
    fn test_do_not_enlarge() {
        let grow = ResizeOptions::new(FitMode::LongEdge(4000)).do_not_enlarge(true);
        assert_eq!(target_dimensions((1920, 1080), &grow, 0), (1920, 1080));

        let allowed = ResizeOptions::new(FitMode::LongEdge(3840));
        assert_eq!(target_dimensions((1920, 1080), &allowed, 0), (3840, 2160));
    }

    #[test]
    fn test_resize_image_no_change() {
        let img = DynamicImage::new_rgb8(200, 100);
        let options = ResizeOptions::new(FitMode::Dimensions {
            width: 400,
            height: 200,
        })
        .do_not_enlarge(true);
        assert!(resize_image(&img, &options, 0).is_none());
        assert!(resize_image(&img, &opts(FitMode::None), 0).is_none());
    }

    #[test]
    fn test_resize_image_dimensions() {
        let img = DynamicImage::new_rgb8(2000, 1500);
        let resized = resize_image(&img, &opts(FitMode::LongEdge(1000)), 0).unwrap();
        assert_eq!(resized.dimensions(), (1000, 750));
    }
}

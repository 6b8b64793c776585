pub const DEFAULT_LEVEL: u8 = 50;
pub const MAX_LEVEL: u8 = 100;
pub const MAX_QUALITY: u8 = 100;

// JPEG quality range the simple level maps onto
pub const LEVEL_JPEG_MAX_QUALITY: u8 = 95;
pub const LEVEL_JPEG_MIN_QUALITY: u8 = 40;

/// Quality used when re-encoding a resized image before compression.
pub const RESIZE_SAVE_QUALITY: u8 = 100;

pub const DEFAULT_PNG_ITERATIONS: u8 = 10;
pub const DEFAULT_PNG_ITERATIONS_LARGE: u8 = 5;
pub const OXIPNG_PRESET: u8 = 4;
pub const LIBDEFLATER_LEVEL: u8 = 12;

// palette quantization used by the lossy 8-bit PNG mode
pub const PNG_QUANT_SPEED: i32 = 3;
pub const PNG_DITHERING_LEVEL: f32 = 1.0;

/// Images above this pixel count use the "large" PNG iteration budget.
pub const LARGE_PNG_PIXELS: u64 = 4_000_000;

pub const DEFAULT_JPEG_QUALITY: u8 = 80;

pub const TRASH_DIR_NAME: &str = "batch-squeeze-trash";
pub const STAGING_PREFIX: &str = ".squeeze-";

pub const MIN_AVAILABLE_MEMORY_MIB: u64 = 512;

pub const SUPPORTED_IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];

pub const PROGRESS_BAR_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}";

pub mod logger;

pub mod batch;
pub mod cli;
pub mod codec;
pub mod constants;
pub mod engine;
pub mod error;
pub mod folders;
pub mod formats;
pub mod options;
pub mod parameters;
pub mod record;
pub mod resize;
pub mod staging;
pub mod utils;

pub use batch::{
    BatchObserver, BatchScheduler, BatchSummary, CancellationToken, ItemReport, ItemStatus,
    NoopObserver, ProgressObserver,
};
pub use codec::{Codec, CodecError, ImageCodec};
pub use engine::{resolve_output_dir, resolve_output_path, CompressionEngine, CompressionOutcome};
pub use error::{CompressionError, Result};
pub use folders::FolderAggregator;
pub use formats::{read_header, ImageHeader, SupportedFormat};
pub use options::{
    AdvancedJpeg, AdvancedParameters, AdvancedPng, CompressionOptions, FitMode, ResizeOptions,
};
pub use parameters::{CodecParameters, JpegParameters, PngParameters, WebpParameters};
pub use record::{CompressedInfo, ImageRecord, ImageStatus};
pub use utils::{collect_image_files, is_image_file};

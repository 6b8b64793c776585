use crate::constants::DEFAULT_LEVEL;
use crate::error::Result;
use crate::options::{AdvancedParameters, CompressionOptions, FitMode, ResizeOptions};
use clap::{ArgAction, Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "batch-squeeze",
    about = "Batch image compression with safe, recoverable output",
    long_about = "batch-squeeze compresses JPEG, PNG and WebP images in parallel. \
                  Results are written to an output folder (optionally mirroring the input tree) \
                  or next to the inputs; existing files are only replaced by smaller results and \
                  are moved to a trash folder instead of being deleted.",
    version,
    after_help = "EXAMPLES:\n  \
    batch-squeeze compress ./photos -o ./out -r --keep-structure\n  \
    batch-squeeze compress \"./shots/*.png\" --same-folder --suffix _min -l 70\n  \
    batch-squeeze compress img.jpg -o ./out --long-edge 1920 --do-not-enlarge\n  \
    batch-squeeze info photo.png"
)]
pub struct Args {
    #[arg(short, long, global = true, help = "Only print errors")]
    pub quiet: bool,

    #[arg(short, long, global = true, help = "Print every pipeline step")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(
        about = "Compress images, directories or glob patterns",
        long_about = "Compress every image found in the given inputs. Inputs may be files, \
                      directories (use -r to descend) or glob patterns."
    )]
    Compress(CompressArgs),

    #[command(
        about = "Display image information",
        long_about = "Read an image header and show its format, dimensions and file size."
    )]
    Info {
        #[arg(help = "Image file path to analyze")]
        input: PathBuf,
    },
}

#[derive(ClapArgs, Debug, Clone)]
pub struct CompressArgs {
    #[arg(required = true, help = "Input files, directories or glob patterns")]
    pub inputs: Vec<String>,

    #[arg(
        short = 'o',
        long,
        help = "Output directory",
        long_help = "Directory that receives the results. Required unless --same-folder is given."
    )]
    pub output: Option<PathBuf>,

    #[arg(
        short = 'l',
        long,
        default_value_t = DEFAULT_LEVEL,
        help = "Compression level (0-100, default: 50)",
        long_help = "Single compression knob. Higher levels trade quality for size: \
                     lower JPEG quality, more PNG iterations, and 8-bit PNG reduction from 60 up."
    )]
    pub level: u8,

    #[arg(long, help = "Only apply lossless optimizations")]
    pub lossless: bool,

    #[arg(
        long,
        default_value_t = true,
        action = ArgAction::Set,
        help = "Keep EXIF and other metadata (true/false)"
    )]
    pub keep_metadata: bool,

    #[arg(long, default_value = "", help = "Suffix appended to output file names")]
    pub suffix: String,

    #[arg(long, help = "Write results next to their inputs")]
    pub same_folder: bool,

    #[arg(long, help = "Mirror the input folder structure under the output directory")]
    pub keep_structure: bool,

    #[arg(short = 'r', long, help = "Process subdirectories recursively")]
    pub recursive: bool,

    #[arg(short = 'w', long, help = "Target width in pixels")]
    pub width: Option<u32>,

    #[arg(short = 'H', long, help = "Target height in pixels")]
    pub height: Option<u32>,

    #[arg(
        long,
        conflicts_with_all = ["width", "height", "short_edge", "percentage", "target_size"],
        help = "Scale so the longest side has this length"
    )]
    pub long_edge: Option<u32>,

    #[arg(
        long,
        conflicts_with_all = ["width", "height", "percentage", "target_size"],
        help = "Scale so the shortest side has this length"
    )]
    pub short_edge: Option<u32>,

    #[arg(
        long,
        conflicts_with_all = ["width", "height", "target_size"],
        help = "Scale both sides by this percentage"
    )]
    pub percentage: Option<u32>,

    #[arg(
        long,
        conflicts_with_all = ["width", "height"],
        help = "Shrink to roughly this many bytes"
    )]
    pub target_size: Option<u64>,

    #[arg(long, help = "Never make an image larger than it is")]
    pub do_not_enlarge: bool,

    #[arg(long, help = "JPEG quality (0-100, 0 = lossless); enables advanced mode")]
    pub jpeg_quality: Option<u8>,

    #[arg(long, help = "PNG Zopfli iterations (0 = fast deflate); enables advanced mode")]
    pub png_iterations: Option<u8>,

    #[arg(long, help = "PNG iterations for large images; enables advanced mode")]
    pub png_iterations_large: Option<u8>,

    #[arg(long, help = "Quantize PNGs to a 256-color palette; enables advanced mode")]
    pub png_lossy_8bit: bool,

    #[arg(long, help = "Drop PNG alpha channels; enables advanced mode")]
    pub no_transparency: bool,

    #[arg(
        short = 'j',
        long,
        help = "Number of parallel threads (default: auto)",
        long_help = "Number of worker threads. Defaults to the CPU count and is capped by \
                     the number of images and available memory."
    )]
    pub threads: Option<usize>,

    #[arg(long, help = "Folder receiving replaced outputs (default: system temp)")]
    pub trash_dir: Option<PathBuf>,
}

impl CompressArgs {
    pub fn resize_options(&self) -> Option<ResizeOptions> {
        let fit = if let Some(edge) = self.long_edge {
            FitMode::LongEdge(edge)
        } else if let Some(edge) = self.short_edge {
            FitMode::ShortEdge(edge)
        } else if let Some(percent) = self.percentage {
            FitMode::Percentage(percent)
        } else if let Some(bytes) = self.target_size {
            FitMode::FileSize(bytes)
        } else if self.width.is_some() || self.height.is_some() {
            FitMode::Dimensions {
                width: self.width.unwrap_or(0),
                height: self.height.unwrap_or(0),
            }
        } else {
            return None;
        };

        Some(ResizeOptions::new(fit).do_not_enlarge(self.do_not_enlarge))
    }

    /// Advanced parameters when any per-format flag was given.
    pub fn advanced_parameters(&self) -> Option<AdvancedParameters> {
        let requested = self.jpeg_quality.is_some()
            || self.png_iterations.is_some()
            || self.png_iterations_large.is_some()
            || self.png_lossy_8bit
            || self.no_transparency;
        if !requested {
            return None;
        }

        let mut advanced = AdvancedParameters::default();
        advanced.jpeg.copy_metadata = self.keep_metadata;
        if let Some(quality) = self.jpeg_quality {
            advanced.jpeg.quality = quality;
        }
        if let Some(iterations) = self.png_iterations {
            advanced.png.iterations = iterations;
        }
        if let Some(iterations) = self.png_iterations_large {
            advanced.png.iterations_large = iterations;
        }
        advanced.png.lossy_8bit = self.png_lossy_8bit;
        advanced.png.preserve_transparency = !self.no_transparency;
        Some(advanced)
    }

    /// Builds validated options. `base_path` is the common root of the
    /// imported folders, used by `--keep-structure`.
    pub fn compression_options(&self, base_path: Option<PathBuf>) -> Result<CompressionOptions> {
        let mut options = CompressionOptions::new(self.output.clone().unwrap_or_default())
            .with_level(self.level)
            .with_lossless(self.lossless)
            .with_keep_metadata(self.keep_metadata)
            .with_suffix(self.suffix.clone())
            .with_same_folder_as_input(self.same_folder);

        if self.keep_structure {
            options = options.with_structure(base_path.unwrap_or_default());
        }
        if let Some(advanced) = self.advanced_parameters() {
            options = options.with_advanced(advanced);
        }
        if let Some(resize) = self.resize_options() {
            options = options.with_resize(resize);
        }
        if let Some(trash_dir) = &self.trash_dir {
            options = options.with_trash_dir(trash_dir);
        }

        options.validate()?;
        Ok(options)
    }
}

use anyhow::{Context, Result};
use batch_squeeze::cli::{Args, CompressArgs, Commands};
use batch_squeeze::logger::{self, Verbosity};
use batch_squeeze::utils::{collect_image_files, format_file_size};
use batch_squeeze::{
    info, success, warn, BatchScheduler, CompressionEngine, FolderAggregator, ImageRecord,
    ProgressObserver,
};
use clap::Parser;
use std::collections::HashSet;
use std::path::Path;

fn main() -> Result<()> {
    let args = Args::parse();
    logger::set_verbosity(Verbosity::from_flags(args.quiet, args.verbose));

    match args.command {
        Commands::Compress(compress) => run_compress(&compress),
        Commands::Info { input } => show_image_info(&input),
    }
}

fn run_compress(args: &CompressArgs) -> Result<()> {
    info!("🚀 Starting batch compression...");

    let (mut records, folders) = import_inputs(args)?;
    if records.is_empty() {
        warn!("No image files found in the input path");
        return Ok(());
    }
    info!("📊 Found {} image files to process", records.len());

    let options = args
        .compression_options(folders.base_path())
        .context("Invalid compression options")?;
    if options.same_folder_as_input {
        info!("📁 Output: next to each input");
    } else {
        info!("📁 Output: {}", options.output_path.display());
    }

    let mut scheduler = BatchScheduler::new(CompressionEngine::default());
    if let Some(threads) = args.threads {
        scheduler = scheduler.with_threads(threads);
    }

    let observer = ProgressObserver::new(records.len());
    let summary = scheduler
        .run(&mut records, &options, &observer)
        .context("Batch compression failed")?;

    if logger::is_verbose() {
        for record in records.iter().filter(|r| r.compressed().is_some()) {
            info!(
                "  {} {} {} (-{})",
                record.file_name(),
                record.rich_formatted_size(),
                record.rich_formatted_resolution(),
                record.formatted_saved_ratio().unwrap_or_default()
            );
        }
    }

    summary.print();
    if summary.failed == 0 && summary.skipped == 0 {
        success!("All {} images compressed", summary.compressed);
    }

    Ok(())
}

/// Collects records from every input. Directory inputs register the
/// directory itself so `--keep-structure` mirrors the tree below it.
fn import_inputs(args: &CompressArgs) -> Result<(Vec<ImageRecord>, FolderAggregator)> {
    let mut folders = FolderAggregator::new();
    let mut records = Vec::new();
    let mut seen = HashSet::new();

    for input in &args.inputs {
        let files = collect_image_files(input, args.recursive)
            .with_context(|| format!("Failed to collect images from {}", input))?;

        let mut imported = 0;
        for file in files {
            if !seen.insert(file.clone()) {
                continue;
            }
            match ImageRecord::new(&file) {
                Ok(record) => {
                    records.push(record);
                    imported += 1;
                }
                Err(e) => warn!("Skipping {}: {}", file.display(), e),
            }
        }

        let input_path = Path::new(input);
        if input_path.is_dir() && imported > 0 {
            let dir = input_path
                .canonicalize()
                .with_context(|| format!("Failed to resolve {}", input))?;
            folders.add_folder(&dir, imported);
        } else {
            for record in &records[records.len() - imported..] {
                folders.add(record.path());
            }
        }
    }

    Ok((records, folders))
}

fn show_image_info(input_path: &Path) -> Result<()> {
    let record = ImageRecord::new(input_path)
        .with_context(|| format!("Failed to read {}", input_path.display()))?;
    let (width, height) = record.dimensions();

    println!("📋 Basic Information:");
    println!("  📁 File: {}", record.path().display());
    println!("  🎭 Format: {}", record.format());
    println!("  📏 Dimensions: {}x{} pixels", width, height);
    println!(
        "  📦 File size: {} ({} bytes)",
        format_file_size(record.original_size()),
        record.original_size()
    );
    println!("  🔢 Total pixels: {}", width as u64 * height as u64);
    if height > 0 {
        println!("  📐 Aspect ratio: {:.2}:1", width as f64 / height as f64);
    }

    Ok(())
}

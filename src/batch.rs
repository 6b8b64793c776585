use crate::codec::{Codec, ImageCodec};
use crate::constants::{MIN_AVAILABLE_MEMORY_MIB, PROGRESS_BAR_TEMPLATE};
use crate::engine::{CompressionEngine, CompressionOutcome};
use crate::error::{CompressionError, Result};
use crate::options::CompressionOptions;
use crate::record::ImageRecord;
use crate::utils::{calculate_compression_ratio, format_file_size};
use crate::{error, info, logger, verbose};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use sysinfo::{MemoryRefreshKind, RefreshKind, System};

/// Shared stop flag for a running batch.
///
/// Items that have not started when the token is cancelled are reported as
/// skipped; items already running finish normally. A token stops at most one
/// `BatchScheduler::run`.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug)]
pub enum ItemStatus {
    Compressed(CompressionOutcome),
    Failed(CompressionError),
    Skipped,
}

/// Terminal state of one batch item
#[derive(Debug)]
pub struct ItemReport {
    /// Position of the record in the submitted slice
    pub index: usize,
    pub path: PathBuf,
    pub original_size: u64,
    pub compressed_size: Option<u64>,
    pub status: ItemStatus,
}

impl ItemReport {
    fn new(index: usize, record: &ImageRecord, status: ItemStatus) -> Self {
        let compressed_size = match status {
            ItemStatus::Compressed(_) => record.compressed_size(),
            _ => None,
        };
        Self {
            index,
            path: record.path().to_path_buf(),
            original_size: record.original_size(),
            compressed_size,
            status,
        }
    }

    pub fn is_compressed(&self) -> bool {
        matches!(self.status, ItemStatus::Compressed(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.status, ItemStatus::Failed(_))
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self.status, ItemStatus::Skipped)
    }
}

#[derive(Debug)]
pub struct BatchSummary {
    /// One report per record, in submission order
    pub reports: Vec<ItemReport>,
    pub compressed: usize,
    pub failed: usize,
    pub skipped: usize,
    /// Original bytes of the compressed items
    pub original_bytes: u64,
    pub compressed_bytes: u64,
    pub elapsed: Duration,
}

impl BatchSummary {
    pub fn total(&self) -> usize {
        self.reports.len()
    }

    /// Percentage of bytes saved across compressed items.
    pub fn saved_ratio(&self) -> f64 {
        calculate_compression_ratio(self.original_bytes, self.compressed_bytes)
    }

    pub fn files_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.compressed as f64 / secs
        } else {
            0.0
        }
    }

    pub fn print(&self) {
        info!("\n📊 Batch Compression Summary:");
        info!("  📁 Compressed: {}/{}", self.compressed, self.total());
        info!("  📊 Total original size: {}", format_file_size(self.original_bytes));
        info!("  📊 Total compressed size: {}", format_file_size(self.compressed_bytes));
        info!("  🎯 Overall saved: {:.1}%", self.saved_ratio());
        info!("  ⏱️  Total time: {:?}", self.elapsed);
        info!("  ⚡ Average speed: {:.2} files/second", self.files_per_second());
        if self.failed > 0 {
            info!("  ⚠️  Failed files: {}", self.failed);
        }
        if self.skipped > 0 {
            info!("  ⏭️  Skipped files: {}", self.skipped);
        }
    }
}

/// Receives batch progress. Called from worker threads.
pub trait BatchObserver: Sync {
    fn item_started(&self, _index: usize, _record: &ImageRecord) {}

    /// Fires once per item, in completion order.
    fn item_finished(&self, _report: &ItemReport) {}

    /// Fires exactly once, after every item is terminal.
    fn batch_finished(&self, _summary: &BatchSummary) {}
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl BatchObserver for NoopObserver {}

/// Drives an indicatif progress bar; hidden in quiet mode.
pub struct ProgressObserver {
    bar: ProgressBar,
}

impl ProgressObserver {
    pub fn new(total: usize) -> Self {
        let bar = if logger::is_quiet() {
            ProgressBar::hidden()
        } else {
            ProgressBar::new(total as u64)
        };
        let style = ProgressStyle::with_template(PROGRESS_BAR_TEMPLATE)
            .map(|s| s.progress_chars("#>-"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        bar.set_style(style);
        Self { bar }
    }
}

impl BatchObserver for ProgressObserver {
    fn item_started(&self, _index: usize, record: &ImageRecord) {
        self.bar.set_message(record.file_name().to_string());
    }

    fn item_finished(&self, _report: &ItemReport) {
        self.bar.inc(1);
    }

    fn batch_finished(&self, summary: &BatchSummary) {
        if summary.skipped > 0 {
            self.bar.abandon_with_message("⏹️  Batch cancelled");
        } else {
            self.bar.finish_with_message("✅ Batch compression complete");
        }
    }
}

/// Runs a `CompressionEngine` over many records in parallel.
pub struct BatchScheduler<C: Codec = ImageCodec> {
    engine: CompressionEngine<C>,
    threads: Option<usize>,
    cancellation: Mutex<CancellationToken>,
}

impl<C: Codec> BatchScheduler<C> {
    pub fn new(engine: CompressionEngine<C>) -> Self {
        Self {
            engine,
            threads: None,
            cancellation: Mutex::new(CancellationToken::new()),
        }
    }

    /// Worker count; defaults to the number of CPUs.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads.max(1));
        self
    }

    /// Token checked by the next `run`.
    pub fn with_cancellation(self, token: CancellationToken) -> Self {
        *lock(&self.cancellation) = token;
        self
    }

    /// Token of the next (or current) run. After a cancelled run the
    /// scheduler arms a fresh one, so fetch it again for each run.
    pub fn cancellation(&self) -> CancellationToken {
        lock(&self.cancellation).clone()
    }

    pub fn engine(&self) -> &CompressionEngine<C> {
        &self.engine
    }

    /// Compresses every record with `options`.
    ///
    /// Per-item failures are reported in the summary and never abort the
    /// run. Only invalid options or a worker pool that cannot be built make
    /// the whole run fail, before any item is touched.
    pub fn run(
        &self,
        records: &mut [ImageRecord],
        options: &CompressionOptions,
        observer: &dyn BatchObserver,
    ) -> Result<BatchSummary> {
        options.validate()?;

        let cancellation = self.cancellation();
        let start_time = Instant::now();
        let workers = self.worker_count(records);
        verbose!("Using {} parallel threads for {} images", workers, records.len());

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .build()
            .map_err(|e| CompressionError::ThreadPool(e.to_string()))?;

        let compressed = AtomicUsize::new(0);
        let failed = AtomicUsize::new(0);
        let skipped = AtomicUsize::new(0);
        let original_bytes = AtomicU64::new(0);
        let compressed_bytes = AtomicU64::new(0);
        let reports = Mutex::new(Vec::with_capacity(records.len()));

        pool.install(|| {
            records
                .par_iter_mut()
                .enumerate()
                .for_each(|(index, record)| {
                    let report =
                        self.process_item(index, record, options, &cancellation, observer);

                    match &report.status {
                        ItemStatus::Compressed(_) => {
                            compressed.fetch_add(1, Ordering::Relaxed);
                            original_bytes.fetch_add(report.original_size, Ordering::Relaxed);
                            compressed_bytes.fetch_add(
                                report.compressed_size.unwrap_or(report.original_size),
                                Ordering::Relaxed,
                            );
                        }
                        ItemStatus::Failed(_) => {
                            failed.fetch_add(1, Ordering::Relaxed);
                        }
                        ItemStatus::Skipped => {
                            skipped.fetch_add(1, Ordering::Relaxed);
                        }
                    }

                    observer.item_finished(&report);
                    lock(&reports).push(report);
                });
        });

        let mut reports = reports
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        reports.sort_by_key(|r| r.index);

        if cancellation.is_cancelled() {
            verbose!("Batch cancelled, arming a new token for the next run");
            *lock(&self.cancellation) = CancellationToken::new();
        }

        let summary = BatchSummary {
            reports,
            compressed: compressed.into_inner(),
            failed: failed.into_inner(),
            skipped: skipped.into_inner(),
            original_bytes: original_bytes.into_inner(),
            compressed_bytes: compressed_bytes.into_inner(),
            elapsed: start_time.elapsed(),
        };
        observer.batch_finished(&summary);

        Ok(summary)
    }

    fn process_item(
        &self,
        index: usize,
        record: &mut ImageRecord,
        options: &CompressionOptions,
        cancellation: &CancellationToken,
        observer: &dyn BatchObserver,
    ) -> ItemReport {
        if cancellation.is_cancelled() {
            return ItemReport::new(index, record, ItemStatus::Skipped);
        }

        observer.item_started(index, record);
        let status = match self.engine.compress(record, options) {
            Ok(outcome) => ItemStatus::Compressed(outcome),
            Err(e) => {
                error!("Failed to process {}: {}", record.path().display(), e);
                ItemStatus::Failed(e)
            }
        };
        ItemReport::new(index, record, status)
    }

    /// Requested (or CPU) worker count, capped by item count and by how many
    /// decoded images fit in available memory.
    fn worker_count(&self, records: &[ImageRecord]) -> usize {
        let baseline = self
            .threads
            .unwrap_or_else(num_cpus::get)
            .min(records.len())
            .max(1);
        if records.is_empty() {
            return baseline;
        }

        let mut sys =
            System::new_with_specifics(RefreshKind::new().with_memory(MemoryRefreshKind::new()));
        sys.refresh_memory();
        let available_mib = sys.available_memory() / (1024 * 1024);
        if available_mib == 0 {
            // unknown, e.g. some containers report nothing
            return baseline;
        }

        let decoded_bytes: u64 = records
            .iter()
            .map(|r| {
                let (w, h) = r.dimensions();
                w as u64 * h as u64 * 4
            })
            .sum();
        let avg_per_item_mib =
            ((decoded_bytes / records.len() as u64).div_ceil(1024 * 1024)).max(1);
        let memory_cap = (available_mib.saturating_sub(MIN_AVAILABLE_MEMORY_MIB)
            / avg_per_item_mib)
            .clamp(1, baseline as u64) as usize;

        baseline.min(memory_cap)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

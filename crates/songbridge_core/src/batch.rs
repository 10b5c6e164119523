use std::fmt;
use std::future::Future;
use std::time::Duration;

use crate::{FlowError, FlowResult, Pacer, PauseKind};

/// How a per-item flow resolved its item.
///
/// The flow supplies the discriminant ("already done" is a skip, not an add);
/// the orchestrator only counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemDisposition {
    Added,
    Skipped,
}

/// Window, pacing and progress parameters for one batch run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOptions {
    /// First index of the window; lets a partial run resume where it stopped.
    pub start_index: usize,
    /// Upper bound on processed items; `None` runs to the end of the list.
    pub max_items: Option<usize>,
    /// Client-side rate-limiting gap, applied between items but not after the
    /// last one.
    pub item_gap: Duration,
    /// Emit a progress signal every this many items (and on the final item).
    pub progress_every: usize,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            start_index: 0,
            max_items: None,
            item_gap: Duration::from_millis(2500),
            progress_every: 10,
        }
    }
}

/// A failed item, in window order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemError {
    pub label: String,
    pub error: FlowError,
}

/// Cumulative counters carried by each progress signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchProgress {
    /// Items processed so far within the window (1-based).
    pub processed: usize,
    /// Total items in the window.
    pub window_len: usize,
    pub added: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Receiver for periodic batch progress.
pub trait ProgressSink: Send + Sync {
    fn emit(&self, progress: BatchProgress);
}

/// A sink that drops all progress signals.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentProgress;

impl ProgressSink for SilentProgress {
    fn emit(&self, _progress: BatchProgress) {}
}

/// Final bookkeeping of a batch run. Mutated only by the orchestrator,
/// immutable once returned.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BatchReport {
    pub added: usize,
    pub skipped: usize,
    pub failed: usize,
    pub errors: Vec<ItemError>,
}

impl BatchReport {
    pub fn total_processed(&self) -> usize {
        self.added + self.skipped + self.failed
    }

    /// A batch succeeds only when no item failed; skips are fine.
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} added, {} skipped, {} failed",
            self.added, self.skipped, self.failed
        )
    }
}

/// Processes the window `[start_index, min(len, start_index + max_items))` of
/// `items` strictly in order, invoking `flow` once per item.
///
/// A single item's failure never aborts the batch: the error is recorded with
/// the item's label and the loop completes its window. Items are handed to
/// the flow by clone so the returned future owns its input. Progress is
/// emitted every `progress_every` items and on the final item of the window;
/// the inter-item gap is suspended through `pacer` between items only.
pub async fn run_batch<I, L, F, Fut>(
    items: &[I],
    options: &BatchOptions,
    pacer: &dyn Pacer,
    sink: &dyn ProgressSink,
    label: L,
    mut flow: F,
) -> BatchReport
where
    I: Clone,
    L: Fn(&I) -> String,
    F: FnMut(usize, I) -> Fut,
    Fut: Future<Output = FlowResult<ItemDisposition>>,
{
    let mut report = BatchReport::default();

    let start = options.start_index;
    if start >= items.len() {
        return report;
    }
    let end = match options.max_items {
        Some(max) => items.len().min(start.saturating_add(max)),
        None => items.len(),
    };

    let window_len = end - start;
    let progress_every = options.progress_every.max(1);

    for i in start..end {
        let item = &items[i];

        match flow(i, item.clone()).await {
            Ok(ItemDisposition::Added) => report.added += 1,
            Ok(ItemDisposition::Skipped) => report.skipped += 1,
            Err(error) => {
                report.failed += 1;
                report.errors.push(ItemError {
                    label: label(item),
                    error,
                });
            }
        }

        let processed = i - start + 1;
        if processed % progress_every == 0 || i == end - 1 {
            sink.emit(BatchProgress {
                processed,
                window_len,
                added: report.added,
                skipped: report.skipped,
                failed: report.failed,
            });
        }

        if i < end - 1 {
            pacer.pause(PauseKind::ItemGap, options.item_gap).await;
        }
    }

    report
}

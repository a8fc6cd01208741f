//! Batch loading of many markup files in parallel.

use crate::error::Result;
use crate::hooks::{EditorJson, markup_to_editor_json};
use crate::store::MarkupStore;
use mdxsync_core::TransformerSet;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Instant;

/// A single file to load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchInput {
    /// Caller identifier, echoed in the result.
    pub id: String,
    /// Path relative to the base directory.
    pub path: PathBuf,
}

/// Result for a single file in a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchResult {
    /// Identifier matching the input.
    pub id: String,
    /// Converted record fields (present on success).
    pub document: Option<EditorJson>,
    /// Error message (present on failure).
    pub error: Option<String>,
}

/// Statistics for a batch run.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchStats {
    /// Number of inputs, including any left unread after an early stop.
    pub total: u32,
    /// Number of files loaded.
    pub succeeded: u32,
    /// Number of files that could not be read.
    pub failed: u32,
    /// Wall-clock time in milliseconds.
    pub processing_time_ms: f64,
}

/// Options for batch loading.
#[derive(Debug, Clone, Default)]
pub struct BatchOptions {
    /// Maximum number of threads. Defaults to the global rayon pool.
    pub max_threads: Option<usize>,
    /// Keep going after a failure. Defaults to true.
    pub continue_on_error: Option<bool>,
}

/// All results plus statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchLoadResult {
    /// One result per processed input, in input order.
    pub results: Vec<BatchResult>,
    /// Processing statistics.
    pub stats: BatchStats,
}

/// Reads and converts every input below `base_dir`.
///
/// With `continue_on_error` disabled the files are processed in order and
/// the batch stops after the first failure.
pub fn load_documents<S: MarkupStore>(
    store: &S,
    base_dir: &Path,
    transformers: &TransformerSet,
    inputs: Vec<BatchInput>,
    options: &BatchOptions,
) -> Result<BatchLoadResult> {
    let start = Instant::now();
    let continue_on_error = options.continue_on_error.unwrap_or(true);

    let pool = match options.max_threads {
        Some(max_threads) => match rayon::ThreadPoolBuilder::new()
            .num_threads(max_threads)
            .build()
        {
            Ok(pool) => Some(pool),
            Err(err) => {
                log::warn!("Falling back to the global thread pool: {}", err);
                None
            }
        },
        None => None,
    };

    let total = inputs.len() as u32;
    let succeeded = AtomicU32::new(0);
    let failed = AtomicU32::new(0);

    let process_input = |input: BatchInput| -> BatchResult {
        match store.read_text(&base_dir.join(&input.path)) {
            Ok(markup) => {
                succeeded.fetch_add(1, Ordering::Relaxed);
                BatchResult {
                    id: input.id,
                    document: Some(markup_to_editor_json(&markup, transformers)),
                    error: None,
                }
            }
            Err(err) => {
                failed.fetch_add(1, Ordering::Relaxed);
                BatchResult {
                    id: input.id,
                    document: None,
                    error: Some(err.to_string()),
                }
            }
        }
    };

    let results: Vec<BatchResult> = if continue_on_error {
        match pool {
            Some(pool) => pool.install(|| inputs.into_par_iter().map(process_input).collect()),
            None => inputs.into_par_iter().map(process_input).collect(),
        }
    } else {
        let mut results = Vec::with_capacity(inputs.len());
        for input in inputs {
            let result = process_input(input);
            let stop = result.error.is_some();
            results.push(result);
            if stop {
                break;
            }
        }
        results
    };

    Ok(BatchLoadResult {
        results,
        stats: BatchStats {
            total,
            succeeded: succeeded.load(Ordering::Relaxed),
            failed: failed.load(Ordering::Relaxed),
            processing_time_ms: start.elapsed().as_secs_f64() * 1000.0,
        },
    })
}

//! Batch runs: one operation applied to many files in parallel.
//!
//! Items are decoded, transformed and encoded independently on the rayon
//! pool. Each completed item emits a [`BatchEvent`] through an optional
//! channel so the CLI can print progress while workers are busy.
//!
//! ## Output Structure
//!
//! ```text
//! out/
//! ├── manifest.json     # One entry per input, in input order
//! ├── beach.jpg
//! ├── beach-2.jpg       # Second input with the same file name
//! └── portrait.png
//! ```
//!
//! ## Failure Semantics
//!
//! A failing item does not abort the others; its manifest entry carries the
//! error message instead of an output. Callers that need the stricter
//! "first failure fails the whole batch" behavior use
//! [`BatchRun::into_all_or_nothing`].

use crate::imaging::operations;
use crate::imaging::{ImageBackend, ImageBlob, Limits, Percent, Quality, TargetFormat};
use crate::input::{self, InputError};
use crate::naming;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::Sender;
use thiserror::Error;
use tracing::{info, instrument, warn};

pub const MANIFEST_FILE: &str = "manifest.json";

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Input(#[from] InputError),
    #[error("{input}: {reason}")]
    Item { input: String, reason: String },
}

/// The transform applied to every item.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchOperation {
    Compress { quality: Quality, max_edge: u32 },
    Resize { percent: Percent },
    Convert { format: TargetFormat },
}

impl BatchOperation {
    pub fn label(&self) -> &'static str {
        match self {
            BatchOperation::Compress { .. } => "compress",
            BatchOperation::Resize { .. } => "resize",
            BatchOperation::Convert { .. } => "convert",
        }
    }

    /// Run the operation on one blob.
    ///
    /// Converted outputs keep the input stem: `converted.<ext>` would collide
    /// across a batch.
    pub fn apply(
        &self,
        backend: &impl ImageBackend,
        blob: &ImageBlob,
        limits: &Limits,
    ) -> operations::Result<ImageBlob> {
        match self {
            BatchOperation::Compress { quality, max_edge } => {
                operations::compress(backend, blob, *quality, *max_edge)
            }
            BatchOperation::Resize { percent } => {
                operations::resize_percentage(backend, blob, *percent, limits)
            }
            BatchOperation::Convert { format } => {
                let converted = operations::convert(backend, blob, format.extension())?;
                let name = naming::replace_extension(blob.name(), format.extension());
                let mime = converted.mime().to_string();
                Ok(ImageBlob::new(converted.into_bytes(), mime, name))
            }
        }
    }
}

/// Progress events emitted while a batch runs.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchEvent {
    Started {
        operation: &'static str,
        total: usize,
    },
    /// `completed` counts finished items, so events may arrive out of input order.
    ItemFinished {
        completed: usize,
        total: usize,
        input: String,
        outcome: ItemOutcome,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum ItemOutcome {
    Done { input_size: u64, output_size: u64 },
    Failed(String),
}

/// Manifest entry for one input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchItem {
    /// Input path as given or discovered.
    pub input: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_size: Option<u64>,
    #[serde(flatten)]
    pub result: ItemResult,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ItemResult {
    Ok {
        output: String,
        output_size: u64,
        sha256: String,
    },
    Failed {
        error: String,
    },
}

/// `manifest.json` contents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub operation: String,
    pub items: Vec<BatchItem>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.items
            .iter()
            .filter(|item| matches!(item.result, ItemResult::Ok { .. }))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.items.len() - self.succeeded()
    }
}

/// Report plus the output blobs, aligned with `report.items`.
#[derive(Debug)]
pub struct BatchRun {
    pub report: BatchReport,
    pub outputs: Vec<Option<ImageBlob>>,
}

impl BatchRun {
    /// All outputs, or the first failure in input order.
    pub fn into_all_or_nothing(self) -> Result<Vec<ImageBlob>, BatchError> {
        self.report
            .items
            .into_iter()
            .zip(self.outputs)
            .map(|(item, output)| match (item.result, output) {
                (ItemResult::Ok { .. }, Some(blob)) => Ok(blob),
                (ItemResult::Failed { error }, _) => Err(BatchError::Item {
                    input: item.input,
                    reason: error,
                }),
                (ItemResult::Ok { .. }, None) => Err(BatchError::Item {
                    input: item.input,
                    reason: "output missing".into(),
                }),
            })
            .collect()
    }
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// Apply `operation` to every input file on the current rayon pool.
///
/// Output names are deduplicated in input order, so the manifest is the same
/// regardless of which worker finishes first.
#[instrument(skip_all, fields(operation = operation.label(), items = inputs.len()))]
pub fn run_batch(
    backend: &impl ImageBackend,
    inputs: &[PathBuf],
    operation: &BatchOperation,
    limits: &Limits,
    events: Option<Sender<BatchEvent>>,
) -> BatchRun {
    let total = inputs.len();
    let completed = AtomicUsize::new(0);
    if let Some(tx) = &events {
        tx.send(BatchEvent::Started {
            operation: operation.label(),
            total,
        })
        .ok();
    }

    let results: Vec<(Option<u64>, Result<ImageBlob, String>)> = inputs
        .par_iter()
        .map_with(events, |events, path| {
            let (input_size, result) = process_item(backend, path, operation, limits);
            let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
            if let Some(tx) = events {
                let outcome = match &result {
                    Ok(blob) => ItemOutcome::Done {
                        input_size: input_size.unwrap_or(0),
                        output_size: blob.size(),
                    },
                    Err(reason) => ItemOutcome::Failed(reason.clone()),
                };
                tx.send(BatchEvent::ItemFinished {
                    completed: done,
                    total,
                    input: path.display().to_string(),
                    outcome,
                })
                .ok();
            }
            (input_size, result)
        })
        .collect();

    let mut taken = HashSet::new();
    let mut items = Vec::with_capacity(total);
    let mut outputs = Vec::with_capacity(total);
    for (path, (input_size, result)) in inputs.iter().zip(results) {
        let input = path.display().to_string();
        match result {
            Ok(blob) => {
                let name = naming::dedupe_name(blob.name(), &mut taken);
                let blob = if name == blob.name() {
                    blob
                } else {
                    let mime = blob.mime().to_string();
                    ImageBlob::new(blob.into_bytes(), mime, name)
                };
                items.push(BatchItem {
                    input,
                    input_size,
                    result: ItemResult::Ok {
                        output: blob.name().to_string(),
                        output_size: blob.size(),
                        sha256: sha256_hex(blob.bytes()),
                    },
                });
                outputs.push(Some(blob));
            }
            Err(error) => {
                warn!(input = %input, %error, "batch item failed");
                items.push(BatchItem {
                    input,
                    input_size,
                    result: ItemResult::Failed { error },
                });
                outputs.push(None);
            }
        }
    }

    let report = BatchReport {
        operation: operation.label().to_string(),
        items,
    };
    info!(
        succeeded = report.succeeded(),
        failed = report.failed(),
        "batch finished"
    );
    BatchRun { report, outputs }
}

fn process_item(
    backend: &impl ImageBackend,
    path: &Path,
    operation: &BatchOperation,
    limits: &Limits,
) -> (Option<u64>, Result<ImageBlob, String>) {
    let blob = match input::read_image(path, limits) {
        Ok(blob) => blob,
        Err(e) => return (None, Err(e.to_string())),
    };
    let input_size = Some(blob.size());
    (input_size, operation.apply(backend, &blob, limits).map_err(|e| e.to_string()))
}

/// Write every successful output and `manifest.json` into `out_dir`.
///
/// Returns the manifest path.
pub fn write_batch(run: &BatchRun, out_dir: &Path) -> Result<PathBuf, BatchError> {
    std::fs::create_dir_all(out_dir)?;
    for blob in run.outputs.iter().flatten() {
        std::fs::write(out_dir.join(blob.name()), blob.bytes())?;
    }
    let manifest_path = out_dir.join(MANIFEST_FILE);
    let json = serde_json::to_string_pretty(&run.report)?;
    std::fs::write(&manifest_path, json)?;
    Ok(manifest_path)
}

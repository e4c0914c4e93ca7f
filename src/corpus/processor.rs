// Parallel feature extraction over a corpus
//
// Fixed worker pool fed through a bounded job channel. Work is submitted one
// chunk at a time; the parent collects every result of a chunk, reports
// progress, and only then submits the next chunk.

use super::FeatureTable;
use crate::events::{load_event_table, EventTable, LoadError};
use crate::features::{BuildError, FeatureVector, FeatureVectorBuilder};
use crossbeam_channel::{bounded, unbounded, Receiver, Sender};
use std::borrow::Cow;
use std::fmt;
use std::ops::ControlFlow;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;

/// Pieces per chunk unless configured otherwise
pub const DEFAULT_CHUNK_SIZE: usize = 100;

/// One corpus item: something with a name that can produce an event table
pub trait PieceSource: Sync {
    /// Name used in the `file` column and in diagnostics
    fn identity(&self) -> String;

    fn load(&self) -> Result<Cow<'_, EventTable>, LoadError>;
}

impl PieceSource for PathBuf {
    fn identity(&self) -> String {
        self.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.to_string_lossy().into_owned())
    }

    fn load(&self) -> Result<Cow<'_, EventTable>, LoadError> {
        load_event_table(self).map(Cow::Owned)
    }
}

/// An already decoded piece
#[derive(Debug, Clone)]
pub struct InMemoryPiece {
    pub identity: String,
    pub table: EventTable,
}

impl InMemoryPiece {
    pub fn new(identity: impl Into<String>, table: EventTable) -> Self {
        Self {
            identity: identity.into(),
            table,
        }
    }
}

impl PieceSource for InMemoryPiece {
    fn identity(&self) -> String {
        self.identity.clone()
    }

    fn load(&self) -> Result<Cow<'_, EventTable>, LoadError> {
        Ok(Cow::Borrowed(&self.table))
    }
}

/// Why a piece is absent from the output table
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    MissingTempoColumn,
    EmptyTable,
    /// Unreadable or corrupt input
    Load(String),
    /// Unexpected failure while building the vector
    WorkerFailure(String),
}

impl From<BuildError> for SkipReason {
    fn from(err: BuildError) -> Self {
        match err {
            BuildError::MissingTempoColumn => SkipReason::MissingTempoColumn,
            BuildError::EmptyTable => SkipReason::EmptyTable,
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MissingTempoColumn => write!(f, "file does not contain tempo column"),
            SkipReason::EmptyTable => write!(f, "event table is empty"),
            SkipReason::Load(msg) => write!(f, "could not load input: {}", msg),
            SkipReason::WorkerFailure(msg) => write!(f, "worker failure: {}", msg),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SkippedPiece {
    pub identity: String,
    pub reason: SkipReason,
}

/// Progress notice emitted after each completed chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchProgress {
    /// 1-based chunk number
    pub batch: usize,
    pub batches: usize,
    pub processed: usize,
    pub total: usize,
    pub succeeded: usize,
    pub skipped: usize,
}

/// Outcome of a run that produced at least one row
#[derive(Debug, Clone)]
pub struct CorpusReport {
    pub table: FeatureTable,
    pub skipped: Vec<SkippedPiece>,
    /// True when the progress callback stopped the run early
    pub cancelled: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum CorpusError {
    /// Every piece was skipped, or there were none
    #[error("no usable input: {} pieces skipped", .skipped.len())]
    EmptyCorpusResult { skipped: Vec<SkippedPiece> },

    #[error("worker pool stopped unexpectedly")]
    PoolDisconnected,
}

type Outcome = Result<FeatureVector, SkipReason>;

/// Runs the feature builder over many pieces in parallel
#[derive(Debug, Clone)]
pub struct CorpusProcessor {
    workers: usize,
    chunk_size: usize,
    builder: FeatureVectorBuilder,
}

impl Default for CorpusProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl CorpusProcessor {
    /// Pool sized to the available parallelism, default chunk size
    pub fn new() -> Self {
        let workers = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        Self {
            workers,
            chunk_size: DEFAULT_CHUNK_SIZE,
            builder: FeatureVectorBuilder::new(),
        }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Process every input, logging a progress line per chunk.
    pub fn process<S: PieceSource>(&self, inputs: &[S]) -> Result<CorpusReport, CorpusError> {
        self.process_with_progress(inputs, |progress| {
            log::info!(
                "Processed {} of {} files (batch {}/{}, {} skipped so far)",
                progress.processed,
                progress.total,
                progress.batch,
                progress.batches,
                progress.skipped,
            );
            ControlFlow::Continue(())
        })
    }

    /// Process every input, calling `on_batch` after each chunk completes.
    ///
    /// Returning `ControlFlow::Break` from the callback stops the run before
    /// the next chunk is submitted; rows already collected are kept.
    pub fn process_with_progress<S, F>(
        &self,
        inputs: &[S],
        on_batch: F,
    ) -> Result<CorpusReport, CorpusError>
    where
        S: PieceSource,
        F: FnMut(&BatchProgress) -> ControlFlow<()>,
    {
        if inputs.is_empty() {
            return Err(CorpusError::EmptyCorpusResult { skipped: Vec::new() });
        }

        let workers = self.workers.min(inputs.len()).max(1);
        let (job_tx, job_rx) = bounded::<usize>(self.chunk_size);
        let (result_tx, result_rx) = unbounded::<(usize, Outcome)>();

        log::debug!(
            "Processing {} pieces with {} workers in chunks of {}",
            inputs.len(),
            workers,
            self.chunk_size
        );

        let collected = std::thread::scope(|scope| {
            for worker_id in 0..workers {
                let job_rx = job_rx.clone();
                let result_tx = result_tx.clone();
                let builder = self.builder;
                scope.spawn(move || worker_loop(worker_id, &builder, inputs, job_rx, result_tx));
            }
            drop(result_tx);

            let collected = self.drive_chunks(inputs, &job_tx, &result_rx, on_batch);
            // Closing the job channel lets idle workers exit so the scope can join
            drop(job_tx);
            collected
        })?;

        let (rows, skipped, cancelled) = collected;
        if rows.is_empty() {
            return Err(CorpusError::EmptyCorpusResult { skipped });
        }

        Ok(CorpusReport {
            table: FeatureTable::new(rows),
            skipped,
            cancelled,
        })
    }

    #[allow(clippy::type_complexity)]
    fn drive_chunks<S, F>(
        &self,
        inputs: &[S],
        job_tx: &Sender<usize>,
        result_rx: &Receiver<(usize, Outcome)>,
        mut on_batch: F,
    ) -> Result<(Vec<FeatureVector>, Vec<SkippedPiece>, bool), CorpusError>
    where
        S: PieceSource,
        F: FnMut(&BatchProgress) -> ControlFlow<()>,
    {
        let total = inputs.len();
        let batches = total.div_ceil(self.chunk_size);
        let mut rows = Vec::new();
        let mut skipped = Vec::new();

        for (batch_idx, start) in (0..total).step_by(self.chunk_size).enumerate() {
            let end = (start + self.chunk_size).min(total);

            for idx in start..end {
                job_tx.send(idx).map_err(|_| CorpusError::PoolDisconnected)?;
            }

            // Slot results by input index so output order never depends on scheduling
            let mut slots: Vec<Option<Outcome>> = (start..end).map(|_| None).collect();
            for _ in start..end {
                let (idx, outcome) = result_rx.recv().map_err(|_| CorpusError::PoolDisconnected)?;
                slots[idx - start] = Some(outcome);
            }

            for (offset, slot) in slots.into_iter().enumerate() {
                match slot {
                    Some(Ok(vector)) => rows.push(vector),
                    Some(Err(reason)) => skipped.push(SkippedPiece {
                        identity: inputs[start + offset].identity(),
                        reason,
                    }),
                    None => return Err(CorpusError::PoolDisconnected),
                }
            }

            let progress = BatchProgress {
                batch: batch_idx + 1,
                batches,
                processed: end,
                total,
                succeeded: rows.len(),
                skipped: skipped.len(),
            };
            if on_batch(&progress).is_break() {
                if end < total {
                    log::warn!("Run stopped after {} of {} files", end, total);
                    return Ok((rows, skipped, true));
                }
                break;
            }
        }

        Ok((rows, skipped, false))
    }
}

fn worker_loop<S: PieceSource>(
    worker_id: usize,
    builder: &FeatureVectorBuilder,
    inputs: &[S],
    jobs: Receiver<usize>,
    results: Sender<(usize, Outcome)>,
) {
    for idx in jobs.iter() {
        let outcome = process_piece(builder, &inputs[idx]);
        if results.send((idx, outcome)).is_err() {
            log::debug!("Worker {} exiting: result channel closed", worker_id);
            return;
        }
    }
}

/// Load and build one piece. Failures of any kind stay inside this call.
fn process_piece<S: PieceSource>(builder: &FeatureVectorBuilder, piece: &S) -> Outcome {
    let identity = piece.identity();

    let attempt = panic::catch_unwind(AssertUnwindSafe(|| -> Outcome {
        let table = piece.load().map_err(|e| SkipReason::Load(e.to_string()))?;
        builder.build(&identity, &table).map_err(SkipReason::from)
    }));

    let outcome = attempt.unwrap_or_else(|payload| {
        let message = panic_message(payload.as_ref());
        log::error!("Worker failure while processing {}: {}", identity, message);
        Err(SkipReason::WorkerFailure(message))
    });

    if let Err(ref reason) = outcome {
        if !matches!(reason, SkipReason::WorkerFailure(_)) {
            log::warn!("Skipping {}: {}", identity, reason);
        }
    }
    outcome
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

//! Event-driven signal pipeline.
//!
//! Stages run on a worker thread: generate signals, write them, read them back
//! and validate, then optionally simulate. The worker reports each stage over a
//! bounded channel and finishes with exactly one terminal event, either
//! [`PipelineEvent::Done`] or [`PipelineEvent::Failed`]. The caller waits for
//! that terminal event under a wall-clock timeout and writes the metrics file
//! itself once `Done` arrives, so a run that timed out leaves no metrics behind.

use crate::domain::error::RankfolioError;
use crate::domain::paper::{self, PaperResult};
use crate::domain::risk::RiskLimits;
use crate::domain::signal::{SignalRow, SignalSummary};
use crate::ports::price_port::PricePort;
use crate::ports::report_port::ReportPort;
use crate::ports::signal_port::SignalPort;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, SyncSender};
use std::thread;
use std::time::{Duration, Instant};

const EVENT_QUEUE_CAPACITY: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Requested,
    Generated,
    Validated,
    Simulated,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineStage::Requested => "requested",
            PipelineStage::Generated => "generated",
            PipelineStage::Validated => "validated",
            PipelineStage::Simulated => "simulated",
        };
        f.write_str(name)
    }
}

#[derive(Debug)]
pub enum PipelineEvent {
    Stage(PipelineStage),
    Done(PipelineReport),
    Failed(RankfolioError),
}

#[derive(Debug, Clone)]
pub struct PipelineRequest {
    pub signal_path: PathBuf,
    pub price_path: Option<PathBuf>,
    pub metrics_path: Option<PathBuf>,
    pub limits: RiskLimits,
    pub timeout: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineReport {
    pub signal_path: PathBuf,
    pub summary: SignalSummary,
    pub result: Option<PaperResult>,
    pub stages: Vec<PipelineStage>,
}

struct Emitter {
    tx: SyncSender<PipelineEvent>,
    stages: Vec<PipelineStage>,
    cancelled: Arc<AtomicBool>,
}

impl Emitter {
    fn stage(&mut self, stage: PipelineStage) -> Result<(), RankfolioError> {
        self.ensure_live()?;
        self.stages.push(stage);
        self.tx
            .send(PipelineEvent::Stage(stage))
            .map_err(|_| caller_gone())
    }

    /// Checked before every write the worker makes.
    fn ensure_live(&self) -> Result<(), RankfolioError> {
        if self.cancelled.load(Ordering::SeqCst) {
            return Err(caller_gone());
        }
        Ok(())
    }
}

fn caller_gone() -> RankfolioError {
    RankfolioError::PipelineFailed {
        reason: "caller stopped waiting".to_string(),
    }
}

fn execute<A, G>(
    adapter: &A,
    generate: G,
    request: &PipelineRequest,
    emitter: &mut Emitter,
) -> Result<PipelineReport, RankfolioError>
where
    A: SignalPort + PricePort,
    G: FnOnce() -> Result<Vec<SignalRow>, RankfolioError>,
{
    emitter.stage(PipelineStage::Requested)?;
    let rows = generate()?;
    emitter.ensure_live()?;
    adapter.write_signals(&request.signal_path, &rows)?;
    emitter.stage(PipelineStage::Generated)?;

    let rows = adapter.read_signals(&request.signal_path)?;
    let summary = SignalSummary::from_rows(&rows);
    if summary.duplicates > 0 {
        return Err(RankfolioError::DuplicateSignals {
            count: summary.duplicates,
        });
    }
    emitter.stage(PipelineStage::Validated)?;

    let result = match &request.price_path {
        Some(price_path) => {
            let prices = adapter.read_prices(price_path)?;
            let result = paper::run(&rows, &prices, &request.limits)?;
            emitter.stage(PipelineStage::Simulated)?;
            Some(result)
        }
        None => None,
    };

    Ok(PipelineReport {
        signal_path: request.signal_path.clone(),
        summary,
        result,
        stages: emitter.stages.clone(),
    })
}

/// Run the pipeline on a worker thread and wait for its terminal event.
///
/// On timeout the worker is cancelled and abandoned. It makes no further
/// writes, and the metrics file is only written here after `Done`.
pub fn run_pipeline<A, G>(
    adapter: A,
    generate: G,
    request: PipelineRequest,
) -> Result<PipelineReport, RankfolioError>
where
    A: SignalPort + PricePort + ReportPort + Clone + Send + 'static,
    G: FnOnce() -> Result<Vec<SignalRow>, RankfolioError> + Send + 'static,
{
    let (tx, rx) = mpsc::sync_channel(EVENT_QUEUE_CAPACITY);
    let timeout = request.timeout;
    let metrics_path = request.metrics_path.clone();
    let cancelled = Arc::new(AtomicBool::new(false));
    let worker_adapter = adapter.clone();
    let worker_cancelled = Arc::clone(&cancelled);

    thread::spawn(move || {
        let mut emitter = Emitter {
            tx: tx.clone(),
            stages: Vec::new(),
            cancelled: worker_cancelled,
        };
        let terminal = match execute(&worker_adapter, generate, &request, &mut emitter) {
            Ok(report) => PipelineEvent::Done(report),
            Err(e) => PipelineEvent::Failed(e),
        };
        let _ = tx.send(terminal);
    });

    let deadline = Instant::now() + timeout;
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match rx.recv_timeout(remaining) {
            Ok(PipelineEvent::Stage(stage)) => {
                tracing::info!(%stage, "pipeline stage");
            }
            Ok(PipelineEvent::Done(report)) => {
                if let (Some(path), Some(result)) = (&metrics_path, &report.result) {
                    adapter.save_result(path, result)?;
                }
                tracing::info!(path = %report.signal_path.display(), "pipeline done");
                return Ok(report);
            }
            Ok(PipelineEvent::Failed(e)) => {
                tracing::warn!(error = %e, "pipeline failed");
                return Err(e);
            }
            Err(RecvTimeoutError::Timeout) => {
                cancelled.store(true, Ordering::SeqCst);
                return Err(RankfolioError::PipelineTimeout { timeout });
            }
            Err(RecvTimeoutError::Disconnected) => {
                return Err(RankfolioError::PipelineFailed {
                    reason: "worker exited without a result".to_string(),
                });
            }
        }
    }
}

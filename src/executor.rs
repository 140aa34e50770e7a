//! Two-phase map/fold executor
//!
//! The executor moves through a fixed state machine:
//!
//! ```text
//! Idle -> MapPhase -> ReducePhase -> Done
//!           |             |
//!           +--> Failed <-+
//! ```
//!
//! The map phase fans every worker's `map` call out onto the runtime with
//! concurrency bounded by a semaphore, and joins all of them before any
//! reduce runs. The reduce phase is a strictly sequential left fold over
//! the workers in creation order, so the final result is deterministic
//! regardless of how map calls were scheduled. Map failures are recorded
//! per worker as a [`MapOutcome`] rather than thrown across the task
//! boundary; the configured [`ErrorPolicy`] decides what they mean for the
//! run as a whole.

use crate::config::{ErrorPolicy, ExecutorConfig};
use crate::error::{MapFoldError, MapFoldResult};
use crate::worker::Worker;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{watch, Semaphore};
use tracing::{debug, info, warn};

/// Callback invoked as each map call settles, in completion order
pub type ProgressFn = Arc<dyn Fn(&MapOutcome) + Send + Sync>;

/// Phase the executor is currently in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExecutorState {
    Idle,
    MapPhase,
    ReducePhase,
    Done,
    Failed,
}

/// How a single worker's map call ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MapStatus {
    Success,
    Failed,
    Cancelled,
}

/// Recorded result of one worker's map call.
///
/// Distinguishes "this worker failed" from "this worker produced a valid
/// zero-like partial result".
#[derive(Debug, Clone, Serialize)]
pub struct MapOutcome {
    pub locator: String,
    pub status: MapStatus,
    pub error: Option<String>,
    pub duration_secs: f64,
}

impl MapOutcome {
    fn from_result(locator: &str, duration: Duration, result: &MapFoldResult<()>) -> Self {
        let (status, error) = match result {
            Ok(()) => (MapStatus::Success, None),
            Err(MapFoldError::Cancelled) => (MapStatus::Cancelled, None),
            Err(e) => (MapStatus::Failed, Some(e.to_string())),
        };
        Self {
            locator: locator.to_string(),
            status,
            error,
            duration_secs: duration.as_secs_f64(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == MapStatus::Success
    }
}

/// Final output of a run, alongside the per-worker map outcomes
#[derive(Debug)]
pub struct ExecutionReport<T> {
    pub result: T,
    pub outcomes: Vec<MapOutcome>,
    pub started_at: DateTime<Utc>,
    pub duration: Duration,
    /// Number of reduce calls performed during the fold
    pub reduce_invocations: usize,
}

impl<T> ExecutionReport<T> {
    pub fn successful(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.successful()
    }

    pub fn summary(&self) -> String {
        format!(
            "{}/{} succeeded, {} failed in {:.2}s",
            self.successful(),
            self.outcomes.len(),
            self.failed(),
            self.duration.as_secs_f64()
        )
    }
}

/// Handle for cancelling an in-flight run from another task
#[derive(Debug, Clone)]
pub struct CancelHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

struct Mapped<W> {
    worker: W,
    outcome: MapOutcome,
    error: Option<MapFoldError>,
}

/// Runs the map phase fan-out and the ordered reduce fold
pub struct Executor {
    config: ExecutorConfig,
    state: ExecutorState,
    cancel_tx: Arc<watch::Sender<bool>>,
    cancel_rx: watch::Receiver<bool>,
    progress: Option<ProgressFn>,
}

impl Executor {
    pub fn new(config: ExecutorConfig) -> Self {
        let (cancel_tx, cancel_rx) = watch::channel(false);
        Self {
            config,
            state: ExecutorState::Idle,
            cancel_tx: Arc::new(cancel_tx),
            cancel_rx,
            progress: None,
        }
    }

    /// Attach a per-outcome progress callback
    pub fn with_progress(mut self, progress: ProgressFn) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Handle that cancels this executor's run when triggered
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            tx: Arc::clone(&self.cancel_tx),
        }
    }

    pub fn state(&self) -> ExecutorState {
        self.state
    }

    /// Execute every worker's map concurrently, then fold the partial
    /// results in creation order into a single output.
    pub async fn execute<W: Worker>(
        &mut self,
        workers: Vec<W>,
    ) -> MapFoldResult<ExecutionReport<W::Output>> {
        self.config.validate().map_err(|e| self.fail(e))?;

        if workers.is_empty() {
            return Err(self.fail(MapFoldError::NoInput));
        }

        let started_at = Utc::now();
        let start = Instant::now();
        let total = workers.len();

        self.state = ExecutorState::MapPhase;
        info!(
            "map phase: {} workers, max_parallel={}",
            total, self.config.max_parallel
        );
        let map_result = self.run_map_phase(workers).await;
        let mut mapped = map_result.map_err(|e| self.fail(e))?;

        // Barrier reached: every map call has settled.
        let outcomes: Vec<MapOutcome> = mapped.iter().map(|m| m.outcome.clone()).collect();

        if outcomes.iter().any(|o| o.status == MapStatus::Cancelled) {
            return Err(self.fail(MapFoldError::Cancelled));
        }

        let failed = outcomes.iter().filter(|o| !o.is_success()).count();
        if failed > 0 {
            match self.config.error_policy {
                ErrorPolicy::FailFast => {
                    let err = mapped
                        .iter_mut()
                        .find_map(|m| m.error.take())
                        .unwrap_or(MapFoldError::MapPhaseFailed { failed, total });
                    return Err(self.fail(err));
                }
                ErrorPolicy::Continue => {
                    warn!("{} of {} workers failed; folding the remainder", failed, total);
                }
            }
        }

        self.state = ExecutorState::ReducePhase;
        debug!("reduce phase: folding {} partial results", total - failed);

        let mut reduce_invocations = 0;
        let mut acc: Option<W> = None;
        for m in mapped {
            if !m.outcome.is_success() {
                continue;
            }
            match acc.as_mut() {
                None => acc = Some(m.worker),
                Some(first) => {
                    first.reduce(&m.worker).map_err(|e| self.fail(e))?;
                    reduce_invocations += 1;
                }
            }
        }

        let Some(acc) = acc else {
            // Only reachable under the tolerant policy with zero survivors.
            return Err(self.fail(MapFoldError::MapPhaseFailed { failed, total }));
        };
        let result = acc.into_output().ok_or_else(|| {
            self.fail(MapFoldError::general(
                "worker completed map without storing a partial result",
            ))
        })?;

        self.state = ExecutorState::Done;
        let report = ExecutionReport {
            result,
            outcomes,
            started_at,
            duration: start.elapsed(),
            reduce_invocations,
        };
        info!("execution complete: {}", report.summary());
        Ok(report)
    }

    async fn run_map_phase<W: Worker>(&self, workers: Vec<W>) -> MapFoldResult<Vec<Mapped<W>>> {
        let semaphore = Arc::new(Semaphore::new(self.config.max_parallel));

        let futures: Vec<_> = workers
            .into_iter()
            .map(|mut worker| {
                let semaphore = Arc::clone(&semaphore);
                let mut cancel = self.cancel_rx.clone();
                let progress = self.progress.clone();
                async move {
                    let _permit = semaphore.acquire().await.unwrap();
                    let start = Instant::now();
                    let result = if *cancel.borrow() {
                        Err(MapFoldError::Cancelled)
                    } else {
                        tokio::select! {
                            res = worker.map() => res,
                            _ = cancel.changed() => Err(MapFoldError::Cancelled),
                        }
                    };
                    let outcome = MapOutcome::from_result(worker.locator(), start.elapsed(), &result);
                    debug!(
                        "map settled for '{}': {:?} in {:.3}s",
                        outcome.locator, outcome.status, outcome.duration_secs
                    );
                    if let Some(progress) = &progress {
                        progress(&outcome);
                    }
                    Mapped {
                        worker,
                        outcome,
                        error: result.err(),
                    }
                }
            })
            .collect();

        // join_all returns workers in submission order regardless of
        // completion time, which fixes the fold order.
        let joined = join_all(futures);
        match self.config.timeout {
            Some(limit) => tokio::time::timeout(limit, joined).await.map_err(|_| {
                warn!("map phase did not finish within {:?}", limit);
                MapFoldError::MapPhaseTimeout { timeout: limit }
            }),
            None => Ok(joined.await),
        }
    }

    fn fail(&mut self, err: MapFoldError) -> MapFoldError {
        self.state = ExecutorState::Failed;
        err
    }
}

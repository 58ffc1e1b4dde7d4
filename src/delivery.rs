use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Callback invoked by an emitter once per resolved sub-batch.
pub type CompletionCallback = Arc<dyn Fn(DeliveryOutcome) + Send + Sync>;

/// Capability surface the coordinator requires from a delivery collaborator.
///
/// The emitter owns batching, transmission, and any retry policy. It must
/// invoke the registered callback from its own execution context(s) once per
/// sub-batch it resolves; the coordinator is defensive against emitters that
/// report more or fewer outcomes than were enqueued.
pub trait AsyncEmitter {
    type Item;

    /// Registers the completion callback. Must be called before `enqueue`.
    fn on_completion(&mut self, callback: CompletionCallback);

    /// Hands a batch to the emitter for asynchronous delivery.
    fn enqueue(&mut self, items: Vec<Self::Item>);
}

/// Counts reported by the emitter for one resolved sub-batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryOutcome {
    pub succeeded: u64,
    pub failed: u64,
}

impl DeliveryOutcome {
    pub fn new(succeeded: u64, failed: u64) -> Self {
        Self { succeeded, failed }
    }
}

/// Terminal failure of one batch submission.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("{0} events were reported failed by the collector")]
    PartialFailure(u64),
    #[error("delivery was not acknowledged within the configured deadline")]
    Timeout,
    #[error("delivery wait was interrupted before the batch resolved")]
    Interrupted,
}

/// Mutable counters shared between the waiter and emitter callbacks.
struct Progress {
    succeeded: u64,
    failed: u64,
    done: bool,
    overrun: u64,
}

/// Per-submission completion signal. Created fresh for every batch and
/// discarded once the waiter returns; late callbacks find `done` already set
/// and are dropped.
struct CompletionState {
    expected: u64,
    progress: Mutex<Progress>,
    resolved: Condvar,
}

struct ProgressSnapshot {
    succeeded: u64,
    failed: u64,
    overrun: u64,
}

impl CompletionState {
    fn new(expected: u64) -> Self {
        Self {
            expected,
            progress: Mutex::new(Progress {
                succeeded: 0,
                failed: 0,
                done: false,
                overrun: 0,
            }),
            resolved: Condvar::new(),
        }
    }

    /// Folds one emitter report into the counters. The predicate check and
    /// the `done` flip happen under the same guard, so concurrent reports can
    /// never wake the waiter twice or leave it sleeping past completion.
    fn record(&self, outcome: DeliveryOutcome) {
        let Ok(mut progress) = self.progress.lock() else {
            return;
        };
        if progress.done {
            return;
        }
        progress.succeeded = progress.succeeded.saturating_add(outcome.succeeded);
        progress.failed = progress.failed.saturating_add(outcome.failed);
        let observed = progress.succeeded.saturating_add(progress.failed);
        if observed >= self.expected {
            progress.overrun = observed - self.expected;
            progress.done = true;
            self.resolved.notify_one();
        }
    }

    /// Blocks the submitting context until the batch resolves or the deadline
    /// passes. On timeout the state is sealed so late reports become no-ops.
    fn wait(&self, timeout: Duration) -> Result<ProgressSnapshot, DeliveryError> {
        let deadline = Instant::now() + timeout;
        let mut progress = self
            .progress
            .lock()
            .map_err(|_| DeliveryError::Interrupted)?;
        while !progress.done {
            let remaining = match deadline.checked_duration_since(Instant::now()) {
                Some(remaining) if !remaining.is_zero() => remaining,
                _ => {
                    progress.done = true;
                    return Err(DeliveryError::Timeout);
                }
            };
            let (guard, wait) = self
                .resolved
                .wait_timeout(progress, remaining)
                .map_err(|_| DeliveryError::Interrupted)?;
            progress = guard;
            if wait.timed_out() && !progress.done {
                progress.done = true;
                return Err(DeliveryError::Timeout);
            }
        }
        Ok(ProgressSnapshot {
            succeeded: progress.succeeded,
            failed: progress.failed,
            overrun: progress.overrun,
        })
    }
}

/// Drives batch submission against an [`AsyncEmitter`] and converts its
/// callback-driven reporting into one synchronous aggregate verdict.
#[derive(Debug, Default)]
pub struct DeliveryCoordinator {
    telemetry: DeliveryTelemetry,
}

impl DeliveryCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded telemetry for all submissions driven by this coordinator.
    pub fn telemetry(&self) -> &DeliveryTelemetry {
        &self.telemetry
    }

    /// Submits `batch` and blocks until every item is accounted for as
    /// delivered or failed, the timeout elapses, or the wait is interrupted.
    ///
    /// An empty batch resolves immediately without contacting the emitter;
    /// zero items can never produce a callback.
    pub fn submit_and_wait<E: AsyncEmitter>(
        &mut self,
        batch: Vec<E::Item>,
        emitter: &mut E,
        timeout: Duration,
    ) -> Result<(), DeliveryError> {
        let expected = batch.len() as u64;
        self.telemetry.metrics.batches_total += 1;
        if batch.is_empty() {
            self.telemetry
                .record_log(0, "empty batch resolved without contacting the emitter");
            return Ok(());
        }
        let state = Arc::new(CompletionState::new(expected));
        let callback_state = Arc::clone(&state);
        emitter.on_completion(Arc::new(move |outcome| callback_state.record(outcome)));
        emitter.enqueue(batch);
        match state.wait(timeout) {
            Ok(snapshot) => {
                self.telemetry.metrics.delivered_total += snapshot.succeeded;
                self.telemetry.metrics.failed_total += snapshot.failed;
                if snapshot.overrun > 0 {
                    self.telemetry.metrics.overrun_anomalies_total += 1;
                    self.telemetry.record_log(
                        expected,
                        format!(
                            "emitter reported {} outcomes beyond the batch size",
                            snapshot.overrun
                        ),
                    );
                }
                if snapshot.failed > 0 {
                    self.telemetry.record_log(
                        expected,
                        format!("{} events were not accepted by the collector", snapshot.failed),
                    );
                    return Err(DeliveryError::PartialFailure(snapshot.failed));
                }
                self.telemetry.record_log(expected, "batch fully delivered");
                Ok(())
            }
            Err(err) => {
                if err == DeliveryError::Timeout {
                    self.telemetry.metrics.timeouts_total += 1;
                }
                self.telemetry
                    .record_log(expected, format!("batch did not resolve: {err}"));
                Err(err)
            }
        }
    }
}

/// Aggregated telemetry for delivery submissions.
#[derive(Debug, Default, Clone)]
pub struct DeliveryTelemetry {
    logs: Vec<DeliveryLog>,
    metrics: DeliveryMetrics,
}

impl DeliveryTelemetry {
    /// Structured logs emitted around batch submission.
    pub fn logs(&self) -> &[DeliveryLog] {
        &self.logs
    }

    /// Current counter snapshot.
    pub fn metrics(&self) -> &DeliveryMetrics {
        &self.metrics
    }

    fn record_log(&mut self, batch_size: u64, message: impl Into<String>) {
        self.logs.push(DeliveryLog {
            batch_size,
            message: message.into(),
        });
    }

    /// Renders the counters as Prometheus exposition text.
    pub fn render_metrics(&self) -> String {
        format!(
            "evrelay_batches_total {}\nevrelay_delivered_total {}\nevrelay_failed_total {}\nevrelay_timeouts_total {}\nevrelay_overrun_anomalies_total {}\n",
            self.metrics.batches_total,
            self.metrics.delivered_total,
            self.metrics.failed_total,
            self.metrics.timeouts_total,
            self.metrics.overrun_anomalies_total
        )
    }
}

/// Structured log line recorded per submission milestone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryLog {
    pub batch_size: u64,
    pub message: String,
}

/// Counters exposed via `/metrics`-style rendering.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryMetrics {
    pub batches_total: u64,
    pub delivered_total: u64,
    pub failed_total: u64,
    pub timeouts_total: u64,
    pub overrun_anomalies_total: u64,
}

//! Latest-wins job scheduler.
//!
//! [`JobScheduler`] is a thin handle over a control task that owns the only
//! mutable scheduling state: the current job and its execution context.
//! Commands arrive over a channel, so the control logic is single-threaded
//! even though contexts run in parallel with it.
//!
//! Guarantees:
//! - At most one job is current. A submission terminates the previous context
//!   before starting its own, and the superseded caller sees `Cancelled`.
//! - Every context report is checked against the current job id. Reports for
//!   anything else are dropped, however correct they are.
//! - Each job has a hard deadline; missing it terminates the context.

use std::future::{Future, pending};
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::task::{Context, Poll};
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::time::Instant;

use repsq_core::{ComputeOptions, ComputeRequest, decode_with_radix};
use repsq_types::{InputError, JobId, ModeSelection};

use crate::context::{ExecutionContext, TaggedReport};
use crate::executor::{ComputeJob, ContextReport, Executor};
use crate::state::{CancelReason, JobOutcome, JobState};

pub const DEFAULT_SAFE_DIGITS_EXACT: usize = 20_000;
pub const DEFAULT_HARD_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_WARNING_THRESHOLD: Duration = Duration::from_secs(2);

/// Caller-supplied limits, typically produced by an external benchmark.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerLimits {
    /// `Auto` submissions longer than this run as previews.
    pub safe_digits_exact: usize,
    /// Budget for jobs that do not name their own.
    pub hard_timeout: Duration,
    /// Completed jobs slower than this are logged at warn.
    pub warning_threshold: Duration,
}

impl Default for SchedulerLimits {
    fn default() -> Self {
        Self {
            safe_digits_exact: DEFAULT_SAFE_DIGITS_EXACT,
            hard_timeout: DEFAULT_HARD_TIMEOUT,
            warning_threshold: DEFAULT_WARNING_THRESHOLD,
        }
    }
}

/// An unvalidated submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobRequest {
    pub digits: String,
    pub base: u32,
    pub mode: ModeSelection,
    pub options: ComputeOptions,
    /// `None` uses [`SchedulerLimits::hard_timeout`].
    pub timeout: Option<Duration>,
}

impl JobRequest {
    #[must_use]
    pub fn new(digits: impl Into<String>, base: u32) -> Self {
        Self {
            digits: digits.into(),
            base,
            mode: ModeSelection::Exact,
            options: ComputeOptions::default(),
            timeout: None,
        }
    }

    #[must_use]
    pub fn with_mode(mut self, mode: ModeSelection) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn with_options(mut self, options: ComputeOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

enum Command {
    Submit {
        job: ComputeJob,
        reply: oneshot::Sender<JobOutcome>,
    },
    Cancel {
        reason: CancelReason,
    },
    Shutdown,
}

/// Resolves to the job's single terminal outcome.
///
/// If the scheduler goes away first, resolves to `Cancelled` with
/// [`CancelReason::SchedulerStopped`].
#[derive(Debug)]
#[must_use = "a JobHandle does nothing unless awaited"]
pub struct JobHandle {
    id: JobId,
    rx: oneshot::Receiver<JobOutcome>,
}

impl JobHandle {
    #[must_use]
    pub fn id(&self) -> JobId {
        self.id
    }
}

impl Future for JobHandle {
    type Output = JobOutcome;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<JobOutcome> {
        let job_id = self.id;
        Pin::new(&mut self.rx).poll(cx).map(|outcome| {
            outcome.unwrap_or(JobOutcome::Cancelled {
                job_id,
                reason: CancelReason::SchedulerStopped,
            })
        })
    }
}

/// Cloneable trigger for external auto-abort policies.
///
/// Firing it has the same effect as [`JobScheduler::cancel_current`].
#[derive(Debug, Clone)]
pub struct AbortSignal {
    commands: mpsc::UnboundedSender<Command>,
}

impl AbortSignal {
    /// Cancel whatever job is current. A no-op when idle or after shutdown.
    pub fn trigger(&self, reason: impl Into<String>) {
        let _ = self.commands.send(Command::Cancel {
            reason: CancelReason::Aborted {
                reason: reason.into(),
            },
        });
    }
}

impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Command::Submit { job, .. } => f.debug_struct("Submit").field("job_id", &job.id).finish(),
            Command::Cancel { reason } => f.debug_struct("Cancel").field("reason", reason).finish(),
            Command::Shutdown => f.write_str("Shutdown"),
        }
    }
}

pub struct JobScheduler {
    commands: mpsc::UnboundedSender<Command>,
    /// Next id to assign. Held across the send so ids reach the control
    /// task in submission order.
    next_id: Mutex<u64>,
    limits: SchedulerLimits,
}

impl JobScheduler {
    /// Spawn the control task with default limits. Requires a tokio runtime.
    #[must_use]
    pub fn new(executor: impl Executor) -> Self {
        Self::with_limits(executor, SchedulerLimits::default())
    }

    #[must_use]
    pub fn with_limits(executor: impl Executor, limits: SchedulerLimits) -> Self {
        let (commands, command_rx) = mpsc::unbounded_channel();
        let control = Control::new(Arc::new(executor), limits);
        tokio::spawn(control.run(command_rx));
        Self {
            commands,
            next_id: Mutex::new(1),
            limits,
        }
    }

    #[must_use]
    pub fn limits(&self) -> SchedulerLimits {
        self.limits
    }

    /// Validate and submit. Preempts any job in flight.
    ///
    /// Validation happens here, synchronously; an invalid request never gets
    /// a job id.
    pub fn submit(&self, request: JobRequest) -> Result<JobHandle, InputError> {
        let root = decode_with_radix(&request.digits, request.base)?;
        let mode = request
            .mode
            .resolve(root.significant_len(), self.limits.safe_digits_exact);
        let timeout = request
            .timeout
            .unwrap_or(self.limits.hard_timeout)
            .max(Duration::from_millis(1));

        let mut next_id = self.next_id.lock().unwrap_or_else(PoisonError::into_inner);
        let id = JobId::new(*next_id);
        *next_id += 1;
        let job = ComputeJob {
            id,
            request: ComputeRequest::new(root, mode).with_options(request.options),
            timeout,
        };

        let (reply, rx) = oneshot::channel();
        if let Err(err) = self.commands.send(Command::Submit { job, reply }) {
            // The reply sender is dropped with the command; the handle
            // resolves to SchedulerStopped.
            tracing::warn!(job_id = %id, "Scheduler control task is gone: {err}");
        }
        drop(next_id);
        Ok(JobHandle { id, rx })
    }

    /// Cancel the current job, if any, without a replacement.
    pub fn cancel_current(&self) {
        let _ = self.commands.send(Command::Cancel {
            reason: CancelReason::Requested,
        });
    }

    #[must_use]
    pub fn abort_signal(&self) -> AbortSignal {
        AbortSignal {
            commands: self.commands.clone(),
        }
    }
}

impl Drop for JobScheduler {
    fn drop(&mut self) {
        let _ = self.commands.send(Command::Shutdown);
    }
}

impl std::fmt::Debug for JobScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobScheduler")
            .field("limits", &self.limits)
            .finish_non_exhaustive()
    }
}

struct CurrentJob {
    state: JobState,
    context: ExecutionContext,
    reply: oneshot::Sender<JobOutcome>,
    /// `None` when the budget is too large to represent as an instant.
    deadline: Option<Instant>,
    budget: Duration,
}

impl CurrentJob {
    fn id(&self) -> JobId {
        self.context.job_id()
    }

    fn transition(&mut self, next: JobState) {
        match self.state.advance(next) {
            Ok(state) => {
                tracing::trace!(job_id = %self.id(), from = ?self.state, to = ?state, "Job transition");
                self.state = state;
            }
            Err(err) => tracing::error!(job_id = %self.id(), "{err}"),
        }
    }

    fn finish(mut self, outcome: JobOutcome) {
        self.transition(outcome.state());
        let _ = self.reply.send(outcome);
    }
}

/// The control task's state. Only `run` touches it.
struct Control {
    executor: Arc<dyn Executor>,
    limits: SchedulerLimits,
    current: Option<CurrentJob>,
    reports_tx: mpsc::UnboundedSender<TaggedReport>,
    reports_rx: mpsc::UnboundedReceiver<TaggedReport>,
}

impl Control {
    fn new(executor: Arc<dyn Executor>, limits: SchedulerLimits) -> Self {
        let (reports_tx, reports_rx) = mpsc::unbounded_channel();
        Self {
            executor,
            limits,
            current: None,
            reports_tx,
            reports_rx,
        }
    }

    async fn run(mut self, mut commands: mpsc::UnboundedReceiver<Command>) {
        tracing::debug!(backend = self.executor.name(), "Scheduler started");
        loop {
            let deadline = self.current.as_ref().and_then(|job| job.deadline);
            tokio::select! {
                command = commands.recv() => match command {
                    Some(Command::Submit { job, reply }) => self.start(job, reply),
                    Some(Command::Cancel { reason }) => self.cancel(reason),
                    Some(Command::Shutdown) | None => {
                        self.cancel(CancelReason::SchedulerStopped);
                        break;
                    }
                },
                Some((job_id, report)) = self.reports_rx.recv() => self.on_report(job_id, report),
                () = sleep_until(deadline) => self.on_deadline(),
            }
        }
        tracing::debug!("Scheduler stopped");
    }

    fn start(&mut self, job: ComputeJob, reply: oneshot::Sender<JobOutcome>) {
        let job_id = job.id;
        if let Some(previous) = self.current.take() {
            previous.context.terminate();
            let previous_id = previous.id();
            tracing::info!(job_id = %previous_id, superseded_by = %job_id, "Job preempted");
            previous.finish(JobOutcome::Cancelled {
                job_id: previous_id,
                reason: CancelReason::Superseded { by: job_id },
            });
        }

        let budget = job.timeout;
        tracing::debug!(
            job_id = %job_id,
            base = job.request.root.base().get(),
            digits = job.request.root.digit_count(),
            mode = job.request.mode.as_str(),
            timeout_ms = budget.as_millis(),
            backend = self.executor.name(),
            "Job started"
        );

        let context = ExecutionContext::spawn(job, self.executor.as_ref(), self.reports_tx.clone());
        let mut current = CurrentJob {
            state: JobState::Created,
            context,
            reply,
            deadline: Instant::now().checked_add(budget),
            budget,
        };
        current.transition(JobState::Running);
        self.current = Some(current);
    }

    fn cancel(&mut self, reason: CancelReason) {
        let Some(current) = self.current.take() else {
            return;
        };
        current.context.terminate();
        tracing::info!(job_id = %current.id(), reason = %reason, "Job cancelled");
        let job_id = current.id();
        current.finish(JobOutcome::Cancelled { job_id, reason });
    }

    fn on_report(&mut self, job_id: JobId, report: ContextReport) {
        let is_current = self.current.as_ref().is_some_and(|job| job.id() == job_id);
        if !is_current {
            tracing::debug!(job_id = %job_id, "Discarding stale result");
            return;
        }
        let Some(current) = self.current.take() else {
            return;
        };

        let elapsed = current.context.started().elapsed();
        let elapsed_ms = elapsed.as_millis();
        let outcome = match report {
            ContextReport::Finished(result) => {
                if elapsed > self.limits.warning_threshold {
                    tracing::warn!(
                        job_id = %job_id,
                        elapsed_ms,
                        threshold_ms = self.limits.warning_threshold.as_millis(),
                        "Job completed slowly"
                    );
                } else {
                    tracing::debug!(job_id = %job_id, elapsed_ms, "Job completed");
                }
                JobOutcome::Completed {
                    job_id,
                    result,
                    elapsed,
                }
            }
            ContextReport::Interrupted => {
                let detail = "computation stopped without a cancellation request".to_string();
                tracing::warn!(job_id = %job_id, elapsed_ms, reason = %detail, "Job errored");
                JobOutcome::Errored { job_id, detail }
            }
            ContextReport::Failed(detail) => {
                tracing::warn!(job_id = %job_id, elapsed_ms, reason = %detail, "Job errored");
                JobOutcome::Errored { job_id, detail }
            }
        };
        current.finish(outcome);
    }

    fn on_deadline(&mut self) {
        let Some(current) = self.current.take() else {
            return;
        };
        current.context.terminate();
        let job_id = current.id();
        let budget = current.budget;
        tracing::info!(job_id = %job_id, elapsed_ms = budget.as_millis(), "Job timed out");
        current.finish(JobOutcome::TimedOut { job_id, budget });
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => pending().await,
    }
}

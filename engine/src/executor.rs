//! Execution backends. An [`Executor`] runs one validated job to a
//! [`ContextReport`]; the scheduler owns spawning and termination.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;

use repsq_core::{ComputeError, ComputeRequest, compute};
use repsq_types::{ComputeResult, JobId};

/// A job that passed validation and has been assigned an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComputeJob {
    pub id: JobId,
    pub request: ComputeRequest,
    pub timeout: Duration,
}

/// How an execution context ended, before the scheduler decides whether
/// anyone still wants it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContextReport {
    Finished(Box<ComputeResult>),
    /// The convolution saw the interrupt flag at a checkpoint.
    Interrupted,
    Failed(String),
}

/// Runs a job inside an independently terminable unit of execution.
///
/// The returned future is spawned as a task and may be dropped at any await
/// point. Implementations must release their context (thread, child process)
/// when that happens, and should stop early once `interrupt` is set.
pub trait Executor: Send + Sync + 'static {
    fn name(&self) -> &'static str;

    fn execute(&self, job: ComputeJob, interrupt: Arc<AtomicBool>) -> BoxFuture<'static, ContextReport>;
}

/// Runs the pipeline on tokio's blocking pool.
///
/// Dropping the future detaches the thread; the interrupt flag then stops the
/// convolution at its next checkpoint.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadExecutor;

impl Executor for ThreadExecutor {
    fn name(&self) -> &'static str {
        "thread"
    }

    fn execute(&self, job: ComputeJob, interrupt: Arc<AtomicBool>) -> BoxFuture<'static, ContextReport> {
        async move {
            let task = tokio::task::spawn_blocking(move || compute(&job.request, interrupt.as_ref()));
            match task.await {
                Ok(Ok(result)) => ContextReport::Finished(Box::new(result)),
                Ok(Err(ComputeError::Interrupted(_))) => ContextReport::Interrupted,
                Err(err) => ContextReport::Failed(format!("compute thread failed: {err}")),
            }
        }
        .boxed()
    }
}

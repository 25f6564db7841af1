use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use futures_util::future::{AbortHandle, Abortable};
use tokio::sync::mpsc;

use repsq_types::JobId;

use crate::executor::{ComputeJob, ContextReport, Executor};

/// A report tagged with the job that produced it.
pub(crate) type TaggedReport = (JobId, ContextReport);

/// One running job: a spawned task plus the handles needed to tear it down.
///
/// The context never decides whether its report is still wanted; it only
/// tags the report with its job id and hands it to the scheduler.
#[derive(Debug)]
pub(crate) struct ExecutionContext {
    job_id: JobId,
    started: Instant,
    interrupt: Arc<AtomicBool>,
    abort_handle: AbortHandle,
}

impl ExecutionContext {
    pub(crate) fn spawn(
        job: ComputeJob,
        executor: &dyn Executor,
        reports: mpsc::UnboundedSender<TaggedReport>,
    ) -> Self {
        let job_id = job.id;
        let interrupt = Arc::new(AtomicBool::new(false));
        let (abort_handle, abort_registration) = AbortHandle::new_pair();

        let future = executor.execute(job, Arc::clone(&interrupt));
        let abortable = Abortable::new(future, abort_registration);
        tokio::spawn(async move {
            if let Ok(report) = abortable.await {
                let _ = reports.send((job_id, report));
            }
        });

        Self {
            job_id,
            started: Instant::now(),
            interrupt,
            abort_handle,
        }
    }

    pub(crate) fn job_id(&self) -> JobId {
        self.job_id
    }

    pub(crate) fn started(&self) -> Instant {
        self.started
    }

    /// Forcibly end the context. Never waits on the job.
    pub(crate) fn terminate(&self) {
        self.interrupt.store(true, Ordering::Release);
        self.abort_handle.abort();
    }

    #[cfg(test)]
    pub(crate) fn is_terminated(&self) -> bool {
        self.abort_handle.is_aborted()
    }
}

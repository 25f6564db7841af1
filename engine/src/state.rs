//! Job lifecycle: the per-job state machine and the terminal outcome callers see.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

use repsq_types::{ComputeResult, JobId};

/// `Created → Running → {Completed | Cancelled | TimedOut | Errored}`.
///
/// A job may also be cancelled before it ever runs. Terminal states are final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobState {
    Created,
    Running,
    Completed,
    Cancelled,
    TimedOut,
    Errored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid job transition {from:?} -> {to:?}")]
pub struct InvalidTransition {
    pub from: JobState,
    pub to: JobState,
}

impl JobState {
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(
            self,
            JobState::Completed | JobState::Cancelled | JobState::TimedOut | JobState::Errored
        )
    }

    pub fn advance(self, next: JobState) -> Result<JobState, InvalidTransition> {
        let allowed = match self {
            JobState::Created => matches!(next, JobState::Running | JobState::Cancelled),
            JobState::Running => next.is_terminal(),
            JobState::Completed | JobState::Cancelled | JobState::TimedOut | JobState::Errored => {
                false
            }
        };
        if allowed {
            Ok(next)
        } else {
            Err(InvalidTransition {
                from: self,
                to: next,
            })
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            JobState::Created => "created",
            JobState::Running => "running",
            JobState::Completed => "completed",
            JobState::Cancelled => "cancelled",
            JobState::TimedOut => "timed_out",
            JobState::Errored => "errored",
        }
    }
}

/// Why a job ended as cancelled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CancelReason {
    /// A newer submission became current.
    Superseded { by: JobId },
    /// `cancel_current` was called.
    Requested,
    /// An external abort signal fired.
    Aborted { reason: String },
    /// The scheduler was dropped or its control task is gone.
    SchedulerStopped,
}

impl fmt::Display for CancelReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CancelReason::Superseded { by } => write!(f, "superseded by {by}"),
            CancelReason::Requested => f.write_str("cancelled by request"),
            CancelReason::Aborted { reason } => write!(f, "aborted: {reason}"),
            CancelReason::SchedulerStopped => f.write_str("scheduler stopped"),
        }
    }
}

/// What a submitter's future resolves to. Exactly one per job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Completed {
        job_id: JobId,
        result: Box<ComputeResult>,
        elapsed: Duration,
    },
    Cancelled {
        job_id: JobId,
        reason: CancelReason,
    },
    TimedOut {
        job_id: JobId,
        budget: Duration,
    },
    Errored {
        job_id: JobId,
        detail: String,
    },
}

impl JobOutcome {
    #[must_use]
    pub fn job_id(&self) -> JobId {
        match self {
            JobOutcome::Completed { job_id, .. }
            | JobOutcome::Cancelled { job_id, .. }
            | JobOutcome::TimedOut { job_id, .. }
            | JobOutcome::Errored { job_id, .. } => *job_id,
        }
    }

    #[must_use]
    pub fn state(&self) -> JobState {
        match self {
            JobOutcome::Completed { .. } => JobState::Completed,
            JobOutcome::Cancelled { .. } => JobState::Cancelled,
            JobOutcome::TimedOut { .. } => JobState::TimedOut,
            JobOutcome::Errored { .. } => JobState::Errored,
        }
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        matches!(self, JobOutcome::Completed { .. })
    }

    #[must_use]
    pub fn result(&self) -> Option<&ComputeResult> {
        match self {
            JobOutcome::Completed { result, .. } => Some(result),
            _ => None,
        }
    }

    #[must_use]
    pub fn into_result(self) -> Option<ComputeResult> {
        match self {
            JobOutcome::Completed { result, .. } => Some(*result),
            _ => None,
        }
    }
}

impl fmt::Display for JobOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobOutcome::Completed { job_id, elapsed, .. } => {
                write!(f, "{job_id} completed in {} ms", elapsed.as_millis())
            }
            JobOutcome::Cancelled { job_id, reason } => write!(f, "{job_id} cancelled ({reason})"),
            JobOutcome::TimedOut { job_id, budget } => {
                write!(f, "{job_id} timed out after {} ms", budget.as_millis())
            }
            JobOutcome::Errored { job_id, detail } => write!(f, "{job_id} errored: {detail}"),
        }
    }
}

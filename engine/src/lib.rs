//! Job scheduling for repsq.
//!
//! The scheduler keeps at most one computation current, terminates execution
//! contexts on preemption, timeout, or cancellation, and never hands a caller
//! a result for a job that is no longer current. Execution contexts are
//! pluggable through [`Executor`]: a blocking thread or a `repsq worker`
//! child process.

// Pedantic lint configuration - these are intentional design choices
#![allow(clippy::missing_errors_doc)] // Result-returning functions are self-explanatory
#![allow(clippy::missing_panics_doc)] // Panics are documented in assertions

mod context;
mod executor;
mod process;
pub mod protocol;
mod scheduler;
mod state;
pub mod worker;

pub use executor::{ComputeJob, ContextReport, Executor, ThreadExecutor};
pub use process::ProcessExecutor;
pub use protocol::{PROTOCOL_VERSION, WorkerError, WorkerReply, WorkerRequest};
pub use scheduler::{
    AbortSignal, DEFAULT_HARD_TIMEOUT, DEFAULT_SAFE_DIGITS_EXACT, DEFAULT_WARNING_THRESHOLD,
    JobHandle, JobRequest, JobScheduler, SchedulerLimits,
};
pub use state::{CancelReason, InvalidTransition, JobOutcome, JobState};

//! Scheduler behavior with the in-process thread backend.

use std::time::Duration;

use repsq_core::{ComputeMode, PalindromeVerdict, encode};
use repsq_engine::{
    CancelReason, JobOutcome, JobRequest, JobScheduler, JobState, SchedulerLimits, ThreadExecutor,
};
use repsq_types::ModeSelection;

use crate::common::slow_root;

#[tokio::test]
async fn later_submission_wins() {
    let scheduler = JobScheduler::new(ThreadExecutor);

    let slow = scheduler.submit(JobRequest::new(slow_root(40_000), 10)).unwrap();
    let fast = scheduler.submit(JobRequest::new("101", 10)).unwrap();
    let slow_id = slow.id();
    let fast_id = fast.id();
    assert!(fast_id > slow_id);

    let slow = tokio::time::timeout(Duration::from_secs(5), slow)
        .await
        .expect("preemption is immediate");
    assert_eq!(
        slow,
        JobOutcome::Cancelled {
            job_id: slow_id,
            reason: CancelReason::Superseded { by: fast_id },
        }
    );

    let fast = fast.await;
    let result = fast.result().expect("latest job completes");
    assert_eq!(encode(result.normalized_digits()), "10201");
}

#[tokio::test]
async fn hard_timeout_terminates_long_jobs() {
    let scheduler = JobScheduler::new(ThreadExecutor);
    let handle = scheduler
        .submit(JobRequest::new(slow_root(40_000), 10).with_timeout(Duration::from_millis(50)))
        .unwrap();
    let outcome = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("timeout fires");
    assert_eq!(outcome.state(), JobState::TimedOut);

    // The scheduler stays usable after a timeout.
    let outcome = scheduler.submit(JobRequest::new("11", 2)).unwrap().await;
    assert!(outcome.is_completed());
}

#[tokio::test]
async fn auto_mode_previews_above_the_exact_limit() {
    let limits = SchedulerLimits {
        safe_digits_exact: 1_000,
        ..SchedulerLimits::default()
    };
    let scheduler = JobScheduler::with_limits(ThreadExecutor, limits);
    let outcome = scheduler
        .submit(JobRequest::new(slow_root(50_000), 10).with_mode(ModeSelection::Auto))
        .unwrap()
        .await;
    let result = outcome.result().expect("preview completes quickly");
    assert_eq!(result.mode(), ComputeMode::Preview);
    assert!(result.is_approximate());
    assert_eq!(result.palindrome_verdict(), PalindromeVerdict::Indeterminate);
}

#[tokio::test]
async fn abort_signal_from_another_task() {
    let scheduler = JobScheduler::new(ThreadExecutor);
    let handle = scheduler.submit(JobRequest::new(slow_root(40_000), 10)).unwrap();
    let signal = scheduler.abort_signal();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        signal.trigger("frame budget exceeded");
    });
    let outcome = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("abort is immediate");
    assert!(matches!(
        outcome,
        JobOutcome::Cancelled {
            reason: CancelReason::Aborted { .. },
            ..
        }
    ));
}

#[tokio::test]
async fn many_rapid_submissions() {
    let scheduler = JobScheduler::new(ThreadExecutor);
    let mut handles = Vec::new();
    for len in [30_000, 30_001, 30_002, 5] {
        handles.push(scheduler.submit(JobRequest::new(slow_root(len), 10)).unwrap());
    }
    let last = handles.pop().unwrap();
    for handle in handles {
        assert_eq!(handle.await.state(), JobState::Cancelled);
    }
    let outcome = last.await;
    assert_eq!(encode(outcome.result().unwrap().normalized_digits()), "152399025");
}

//! The subprocess execution context, driven through the built `repsq` binary.

use std::time::Duration;

use repsq_core::{PalindromeVerdict, encode};
use repsq_engine::{CancelReason, JobOutcome, JobRequest, JobScheduler, JobState, ProcessExecutor};

use crate::common::{repsq_bin, slow_root};

fn scheduler() -> JobScheduler {
    JobScheduler::new(ProcessExecutor::new(repsq_bin()))
}

#[tokio::test]
async fn worker_computes_exact_results() {
    let outcome = scheduler()
        .submit(JobRequest::new("1111111111", 10))
        .unwrap()
        .await;
    let result = outcome.result().expect("worker completes");
    assert_eq!(encode(result.normalized_digits()), "1234567900987654321");
    assert_eq!(result.palindrome_verdict(), PalindromeVerdict::NotPalindrome);
}

#[tokio::test]
async fn worker_results_match_in_process_results() {
    let root = slow_root(500);
    let remote = scheduler()
        .submit(JobRequest::new(root.clone(), 10))
        .unwrap()
        .await
        .into_result()
        .unwrap();
    let local = crate::common::exact(&root, 10);
    assert_eq!(remote.normalized_digits(), local.normalized_digits());
    assert_eq!(remote.peak(), local.peak());
    assert_eq!(remote.raw_coefficients(), local.raw_coefficients());
}

#[tokio::test]
async fn killed_worker_is_preempted() {
    let scheduler = scheduler();
    let slow = scheduler.submit(JobRequest::new(slow_root(60_000), 10)).unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    let fast = scheduler.submit(JobRequest::new("11", 2)).unwrap();
    let fast_id = fast.id();

    let slow = tokio::time::timeout(Duration::from_secs(5), slow).await.unwrap();
    assert!(matches!(
        slow,
        JobOutcome::Cancelled {
            reason: CancelReason::Superseded { by },
            ..
        } if by == fast_id
    ));
    let fast = fast.await;
    assert_eq!(encode(fast.result().unwrap().normalized_digits()), "1001");
}

#[tokio::test]
async fn worker_timeout() {
    let outcome = scheduler()
        .submit(JobRequest::new(slow_root(60_000), 10).with_timeout(Duration::from_millis(100)))
        .unwrap()
        .await;
    assert_eq!(outcome.state(), JobState::TimedOut);
}

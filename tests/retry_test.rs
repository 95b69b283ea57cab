//! Retry with exponential backoff

use declutter::crawl::{retry, retry_with_backoff};
use declutter::{DeclutterError, FetchError};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Instant;

mod common;

fn transient() -> DeclutterError {
    FetchError::Status {
        url: "https://example.com".to_string(),
        status: 503,
    }
    .into()
}

fn permanent() -> DeclutterError {
    FetchError::Status {
        url: "https://example.com".to_string(),
        status: 404,
    }
    .into()
}

#[tokio::test]
async fn test_transient_errors_are_retried_until_success() {
    let calls = AtomicU32::new(0);
    let counter = &calls;
    let policy = common::fast_retry(3);

    let attempted = retry_with_backoff(&policy, "flaky", move || async move {
        if counter.fetch_add(1, Ordering::SeqCst) < 2 {
            Err(transient())
        } else {
            Ok("done")
        }
    })
    .await;

    assert_eq!(attempted.result.unwrap(), "done");
    assert_eq!(attempted.attempts, 3);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_permanent_errors_fail_fast() {
    let calls = AtomicU32::new(0);
    let counter = &calls;
    let policy = common::fast_retry(5);

    let attempted = retry_with_backoff(&policy, "gone", move || async move {
        counter.fetch_add(1, Ordering::SeqCst);
        Err::<(), _>(permanent())
    })
    .await;

    assert!(attempted.result.is_err());
    assert_eq!(attempted.attempts, 1);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_gives_up_after_max_retries() {
    let calls = AtomicU32::new(0);
    let counter = &calls;
    let policy = common::fast_retry(2);
    let started = Instant::now();

    let result = retry(&policy, "down", move || async move {
        counter.fetch_add(1, Ordering::SeqCst);
        Err::<(), _>(transient())
    })
    .await;

    assert!(result.unwrap_err().is_transient());
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    // 10ms + 20ms of backoff
    assert!(started.elapsed().as_millis() >= 30);
}

#[tokio::test]
async fn test_zero_retries_means_one_attempt() {
    let calls = AtomicU32::new(0);
    let counter = &calls;
    let policy = declutter::RetryPolicy::none();

    let attempted = retry_with_backoff(&policy, "once", move || async move {
        counter.fetch_add(1, Ordering::SeqCst);
        Err::<(), _>(transient())
    })
    .await;

    assert_eq!(attempted.attempts, 1);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use parking_lot::Mutex;
use std::sync::Arc;

#[tokio::test]
async fn transient_errors_retry_until_success() {
    let calls = Arc::new(Mutex::new(0u32));
    let counter = Arc::clone(&calls);

    let result = run_with_retry(3, 0, &CancellationToken::new(), move || {
        let counter = Arc::clone(&counter);
        async move {
            let mut n = counter.lock();
            *n += 1;
            if *n < 3 {
                Err(FsError::Transient("flaky".to_string()))
            } else {
                Ok(*n)
            }
        }
    })
    .await;

    assert_eq!(result.unwrap(), 3);
    assert_eq!(*calls.lock(), 3);
}

#[tokio::test]
async fn transient_exhausts_after_retries() {
    let calls = Arc::new(Mutex::new(0u32));
    let counter = Arc::clone(&calls);

    let result: Result<(), _> = run_with_retry(3, 0, &CancellationToken::new(), move || {
        let counter = Arc::clone(&counter);
        async move {
            *counter.lock() += 1;
            Err(FsError::Transient("still down".to_string()))
        }
    })
    .await;

    assert!(matches!(result, Err(FsError::Transient(_))));
    assert_eq!(*calls.lock(), 3);
}

#[tokio::test]
async fn validation_errors_do_not_retry() {
    let calls = Arc::new(Mutex::new(0u32));
    let counter = Arc::clone(&calls);

    let result: Result<(), _> = run_with_retry(5, 0, &CancellationToken::new(), move || {
        let counter = Arc::clone(&counter);
        async move {
            *counter.lock() += 1;
            Err(FsError::Validation("bad remote".to_string()))
        }
    })
    .await;

    assert!(matches!(result, Err(FsError::Validation(_))));
    assert_eq!(*calls.lock(), 1);
}

#[tokio::test]
async fn zero_retries_still_attempts_once() {
    let result = run_with_retry(0, 0, &CancellationToken::new(), || async { Ok(7) }).await;
    assert_eq!(result.unwrap(), 7);
}

#[tokio::test]
async fn cancellation_collapses_attempts() {
    let cancel = CancellationToken::new();
    cancel.cancel();

    let calls = Arc::new(Mutex::new(0u32));
    let counter = Arc::clone(&calls);
    let result: Result<(), _> = run_with_retry(3, 0, &cancel, move || {
        let counter = Arc::clone(&counter);
        async move {
            *counter.lock() += 1;
            Err(FsError::Transient("x".to_string()))
        }
    })
    .await;

    assert!(matches!(result, Err(FsError::Cancelled)));
    assert_eq!(*calls.lock(), 0);
}

#[tokio::test(start_paused = true)]
async fn cancellation_interrupts_retry_sleep() {
    let cancel = CancellationToken::new();
    let inner = cancel.clone();

    let handle = tokio::spawn(async move {
        run_with_retry(3, 60, &inner, || async {
            Err::<(), _>(FsError::Transient("down".to_string()))
        })
        .await
    });

    // Let the first attempt fail and enter its sleep, then cancel
    tokio::time::sleep(Duration::from_secs(1)).await;
    cancel.cancel();
    let result = handle.await.unwrap();
    assert!(matches!(result, Err(FsError::Cancelled)));
}

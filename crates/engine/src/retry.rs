// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Retry policy around backend transfer calls

use drift_fs::FsError;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Run `op` up to `retries` times (at least once).
///
/// Only transient errors retry; validation and not-found fail
/// immediately. Cancellation collapses remaining attempts, including a
/// sleep in progress.
pub(crate) async fn run_with_retry<T, F, Fut>(
    retries: u32,
    sleep_secs: u32,
    cancel: &CancellationToken,
    mut op: F,
) -> Result<T, FsError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, FsError>>,
{
    let attempts = retries.max(1);

    for attempt in 1..=attempts {
        if cancel.is_cancelled() {
            return Err(FsError::Cancelled);
        }

        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() && attempt < attempts => {
                tracing::warn!(attempt, error = %e, "transfer attempt failed, retrying");
                if sleep_secs > 0 {
                    tokio::select! {
                        _ = cancel.cancelled() => return Err(FsError::Cancelled),
                        _ = tokio::time::sleep(Duration::from_secs(sleep_secs as u64)) => {}
                    }
                }
            }
            Err(e) => return Err(e),
        }
    }

    // attempts >= 1, so the loop always returns before this point
    Err(FsError::Transient("retries exhausted".to_string()))
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod tests;

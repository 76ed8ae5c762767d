//! Bounded polling shared by every asynchronous provider operation.

use super::errors::{CloudError, CloudResult};
use crate::constants::system::{DEFAULT_POLL_INTERVAL_SECONDS, DEFAULT_POLL_MAX_WAIT_SECONDS};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Polling cadence and total wait budget
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_wait: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECONDS),
            max_wait: Duration::from_secs(DEFAULT_POLL_MAX_WAIT_SECONDS),
        }
    }
}

impl PollPolicy {
    pub fn new(interval: Duration, max_wait: Duration) -> Self {
        Self { interval, max_wait }
    }
}

/// Fetch a value until `is_satisfied` accepts it.
///
/// `is_satisfied` may fail to abort early (for example on a failed provider
/// request). Exceeding `policy.max_wait` fails with [`CloudError::CloudConnection`].
pub async fn poll<T, F, Fut, P>(
    operation: &str,
    policy: &PollPolicy,
    mut fetch: F,
    mut is_satisfied: P,
) -> CloudResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = CloudResult<T>>,
    P: FnMut(&T) -> CloudResult<bool>,
{
    let started = Instant::now();
    let mut attempts: u32 = 0;

    loop {
        attempts += 1;
        let value = fetch().await?;
        if is_satisfied(&value)? {
            debug!(operation = operation, attempts = attempts, "POLL: Condition satisfied");
            return Ok(value);
        }

        let waited = started.elapsed();
        if waited + policy.interval > policy.max_wait {
            return Err(CloudError::CloudConnection {
                operation: operation.to_string(),
                waited,
            });
        }
        tokio::time::sleep(policy.interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test(start_paused = true)]
    async fn test_poll_returns_once_satisfied() {
        let calls = AtomicU32::new(0);
        let calls = &calls;
        let policy = PollPolicy::new(Duration::from_secs(1), Duration::from_secs(10));

        let value = poll(
            "count",
            &policy,
            move || async move { Ok(calls.fetch_add(1, Ordering::SeqCst) + 1) },
            |count| Ok(*count >= 3),
        )
        .await
        .unwrap();

        assert_eq!(value, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_times_out() {
        let policy = PollPolicy::new(Duration::from_secs(2), Duration::from_secs(5));
        let result = poll("never", &policy, || async { Ok(()) }, |_| Ok(false)).await;

        match result {
            Err(CloudError::CloudConnection { operation, waited }) => {
                assert_eq!(operation, "never");
                assert!(waited <= Duration::from_secs(5));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_fails_fast_when_predicate_errors() {
        let policy = PollPolicy::default();
        let result: CloudResult<()> = poll(
            "failing",
            &policy,
            || async { Ok(()) },
            |_| Err(CloudError::invalid_response("status", "FAILED")),
        )
        .await;
        assert!(matches!(result, Err(CloudError::InvalidResponse { .. })));
    }
}

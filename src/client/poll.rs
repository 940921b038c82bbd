//! Bounded retry loops.
//!
//! [`poll_until`] repeats a probe at a fixed interval until it yields a value,
//! the attempt budget runs out ([`AppError::Timeout`]), or the cancellation
//! token fires ([`AppError::Cancelled`]). [`retry_with_backoff`] retries a
//! fallible operation with a linearly growing delay, but only for network
//! failures. Deterministic errors are returned immediately.

use std::future::Future;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{AppError, ErrorKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl PollPolicy {
    pub fn new(max_attempts: u32, interval: Duration) -> Self {
        Self { max_attempts, interval }
    }
}

/// Sleep for `delay` unless `cancel` fires first.
async fn pause(delay: Duration, cancel: &CancellationToken) -> Result<(), AppError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(AppError::Cancelled),
        _ = tokio::time::sleep(delay) => Ok(()),
    }
}

/// Run `probe(attempt)` until it returns `Ok(Some(_))`.
///
/// `Ok(None)` means "not yet". Probe errors are logged and count as an
/// attempt; they never end the loop early.
pub async fn poll_until<T, F, Fut>(
    policy: PollPolicy,
    cancel: &CancellationToken,
    mut probe: F,
) -> Result<T, AppError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<Option<T>, AppError>>,
{
    for attempt in 1..=policy.max_attempts {
        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(AppError::Cancelled),
            outcome = probe(attempt) => outcome,
        };

        match outcome {
            Ok(Some(value)) => {
                info!(attempt, "poll satisfied");
                return Ok(value);
            }
            Ok(None) => debug!(attempt, max = policy.max_attempts, "poll pending"),
            Err(e) => debug!(attempt, max = policy.max_attempts, error = %e, "poll attempt failed"),
        }

        if attempt < policy.max_attempts {
            pause(policy.interval, cancel).await?;
        }
    }

    warn!(attempts = policy.max_attempts, "poll exhausted");
    Err(AppError::Timeout { attempts: policy.max_attempts })
}

/// Retry `op` on network failures, waiting `base_delay × attempt` between
/// tries. Returns the last error once `max_attempts` is spent.
pub async fn retry_with_backoff<T, F, Fut>(
    max_attempts: u32,
    base_delay: Duration,
    cancel: &CancellationToken,
    mut op: F,
) -> Result<T, AppError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, AppError>>,
{
    let mut attempt = 1;
    loop {
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(e) if e.kind() == ErrorKind::NetworkFailure && attempt < max_attempts => {
                warn!(attempt, error = %e, "request failed, retrying");
                pause(base_delay * attempt, cancel).await?;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn policy(max: u32) -> PollPolicy {
        PollPolicy::new(max, Duration::from_secs(5))
    }

    #[tokio::test(start_paused = true)]
    async fn returns_first_ready_value() {
        let cancel = CancellationToken::new();
        let got = poll_until(policy(5), &cancel, |attempt| async move {
            Ok(if attempt == 3 { Some(attempt) } else { None })
        })
        .await
        .unwrap();
        assert_eq!(got, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn times_out_after_exact_budget() {
        let calls = Arc::new(AtomicU32::new(0));
        let cancel = CancellationToken::new();
        let start = tokio::time::Instant::now();
        let counter = calls.clone();
        let err = poll_until::<(), _, _>(policy(4), &cancel, move |_| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(None)
            }
        })
        .await
        .unwrap_err();

        assert!(matches!(err, AppError::Timeout { attempts: 4 }));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        // three gaps between four attempts, no trailing sleep
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(15) && elapsed < Duration::from_secs(16), "{elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn probe_errors_do_not_stop_polling() {
        let cancel = CancellationToken::new();
        let got = poll_until(policy(3), &cancel, |attempt| async move {
            if attempt < 3 {
                Err(AppError::Network("connection refused".into()))
            } else {
                Ok(Some("done"))
            }
        })
        .await
        .unwrap();
        assert_eq!(got, "done");
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_interrupts_wait() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(7)).await;
            trigger.cancel();
        });
        let err = poll_until::<(), _, _>(policy(100), &cancel, |_| async { Ok(None) })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Cancelled));
    }

    #[tokio::test(start_paused = true)]
    async fn backoff_retries_network_errors_only() {
        let cancel = CancellationToken::new();
        let start = tokio::time::Instant::now();
        let got = retry_with_backoff(3, Duration::from_secs(1), &cancel, |attempt| async move {
            if attempt < 3 { Err(AppError::Network("503".into())) } else { Ok(attempt) }
        })
        .await
        .unwrap();
        assert_eq!(got, 3);
        // 1s after the first failure, 2s after the second
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(3) && elapsed < Duration::from_secs(4), "{elapsed:?}");

        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let err = retry_with_backoff::<(), _, _>(5, Duration::from_secs(1), &cancel, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            async { Err(AppError::InvalidFormat("bad memo".into())) }
        })
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::InvalidFormat(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn backoff_returns_last_network_error() {
        let cancel = CancellationToken::new();
        let err = retry_with_backoff::<(), _, _>(2, Duration::from_millis(10), &cancel, |attempt| async move {
            Err(AppError::Network(format!("fail {attempt}")))
        })
        .await
        .unwrap_err();
        assert!(err.to_string().contains("fail 2"));
    }
}

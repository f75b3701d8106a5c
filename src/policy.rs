//! Time budgets for polling and retry loops.

use crate::cancel::Cancellation;
use std::future::Future;
use std::time::Duration;
use tokio_retry2::strategy::FixedInterval;

/// Shortest pause between two attempts. Smaller intervals are raised to it.
pub const MIN_INTERVAL: Duration = Duration::from_millis(100);

/// How long an operation may keep retrying, and how long it waits between
/// attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Overall wall-clock budget.
    pub timeout: Duration,
    /// Pause between attempts. Never shorter than [`MIN_INTERVAL`] in effect.
    pub interval: Duration,
}

impl RetryPolicy {
    pub fn new(timeout: Duration, interval: Duration) -> Self {
        Self {
            timeout,
            interval: interval.max(MIN_INTERVAL),
        }
    }

    /// The pause actually applied between attempts.
    pub fn effective_interval(&self) -> Duration {
        self.interval.max(MIN_INTERVAL)
    }

    /// Budget for a copy to become available: 60 checks, 30 seconds apart.
    pub fn copy_wait() -> Self {
        Self::new(Duration::from_secs(30 * 60), Duration::from_secs(30))
    }

    /// Budget for a delete blocked by a snapshot that is still in use.
    pub fn delete() -> Self {
        Self::new(Duration::from_secs(5 * 60), Duration::from_secs(10))
    }

    /// Upper bound on retried attempts inside the budget. Never zero.
    pub fn max_attempts(&self) -> usize {
        let interval = self.effective_interval().as_millis();
        ((self.timeout.as_millis() / interval) as usize).max(1)
    }

    /// Unbounded fixed pacing; the budget is enforced by the caller.
    pub(crate) fn pacing(&self) -> FixedInterval {
        let millis = u64::try_from(self.effective_interval().as_millis()).unwrap_or(u64::MAX);
        FixedInterval::from_millis(millis)
    }

    /// Delays between attempts, capped at [`RetryPolicy::max_attempts`].
    pub(crate) fn strategy(&self) -> impl Iterator<Item = Duration> {
        self.pacing().take(self.max_attempts())
    }
}

/// How a bounded run ended.
#[derive(Debug)]
pub(crate) enum Bounded<T> {
    Done(T),
    TimedOut,
    Cancelled,
}

/// Runs `work` until it finishes, the policy's budget elapses or the caller
/// cancels, whichever comes first.
pub(crate) async fn run_bounded<F>(
    work: F,
    policy: &RetryPolicy,
    cancellation: &Cancellation,
) -> Bounded<F::Output>
where
    F: Future,
{
    let mut cancellation = cancellation.clone();
    tokio::select! {
        biased;
        _ = cancellation.cancelled() => Bounded::Cancelled,
        result = tokio::time::timeout(policy.timeout, work) => match result {
            Ok(output) => Bounded::Done(output),
            Err(_) => Bounded::TimedOut,
        },
    }
}

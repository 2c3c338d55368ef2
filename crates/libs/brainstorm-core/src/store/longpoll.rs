//! Bounded filesystem condition waits (long-polling).
//!
//! Waiters poll the filesystem because sibling agent processes write to the
//! same data root: no in-process subscription scheme can observe their
//! writes portably. The 2-second interval balances latency against I/O load
//! with five or more agents polling.

use crate::error::Result;
use tokio_util::sync::CancellationToken;

/// Interval between condition checks.
pub const POLL_INTERVAL: std::time::Duration = std::time::Duration::from_secs(2);

/// Terminal state of a long-poll wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The condition held before the deadline.
    Satisfied,
    /// The deadline elapsed; the caller may retry.
    TimedOut,
    /// The transport dropped; nobody is reading the response.
    Cancelled,
}

/// Poll `condition` every [`POLL_INTERVAL`] until it holds, the deadline
/// elapses, or `cancel` fires.
///
/// The condition is checked once immediately, so an already-satisfied wait
/// never sleeps. Cancellation is observed within one poll interval and the
/// waiter returns without mutating state.
pub async fn wait_until<F>(
    timeout: std::time::Duration,
    cancel: &CancellationToken,
    mut condition: F,
) -> Result<WaitOutcome>
where
    F: FnMut() -> Result<bool>,
{
    let deadline = std::time::Instant::now() + timeout;

    loop {
        if condition()? {
            return Ok(WaitOutcome::Satisfied);
        }

        let now = std::time::Instant::now();
        if now >= deadline {
            return Ok(WaitOutcome::TimedOut);
        }

        let nap = POLL_INTERVAL.min(deadline - now);
        tokio::select! {
            _ = cancel.cancelled() => return Ok(WaitOutcome::Cancelled),
            _ = tokio::time::sleep(nap) => {}
        }
    }
}

//! Time abstraction for deterministic testing.
//!
//! Decouples the gateway and feedback session state machines from the wall
//! clock so idle-timeout behavior (spec §4.3, §8 property 5) can be driven
//! with a fake clock in tests instead of real `sleep`s.

use std::future::Future;
use std::time::Duration;

/// Abstract source of monotonic time and of the `sleep` that the dispatch
/// worker (in `apns-client`) uses to wait for the idle timeout.
///
/// # Invariants
///
/// - `now()` never goes backwards within a single execution context.
pub trait Clock: Clone + Send + Sync + 'static {
    /// The specific instant type used by this clock.
    ///
    /// Production code uses `std::time::Instant`; tests can substitute a
    /// manually advanced fake.
    type Instant: Copy + Ord + Send + Sync + std::ops::Sub<Output = Duration>;

    /// Current time (monotonic).
    fn now(&self) -> Self::Instant;

    /// Sleeps for the specified duration.
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send;
}

/// Production clock backed by the real system clock and Tokio's timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    type Instant = std::time::Instant;

    fn now(&self) -> Self::Instant {
        std::time::Instant::now()
    }

    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn system_clock_now_is_monotonic() {
        let clock = SystemClock;
        let first = clock.now();
        clock.sleep(Duration::from_millis(1)).await;
        let second = clock.now();
        assert!(second >= first);
    }
}

//! Clock abstraction for deterministic testing.
//!
//! Decouples cache expiration from system time. Production code uses
//! [`SystemClock`]; tests drive a [`ManualClock`] forward explicitly so
//! TTL behavior is simulated instead of slept through.

#![allow(clippy::expect_used, reason = "Mutex poisoning should cause a panic")]

use std::{
    ops::Add,
    sync::{Arc, Mutex},
    time::Duration,
};

/// Abstract time source.
///
/// # Invariants
///
/// - `now()` never goes backwards within a single execution context.
pub trait Clock: Clone + Send + Sync + 'static {
    /// The specific instant type used by this clock.
    ///
    /// Production clocks use `std::time::Instant`; simulation clocks use
    /// virtual time.
    type Instant: Copy + Ord + Add<Duration, Output = Self::Instant> + Send + Sync;

    /// Current time (monotonic).
    fn now(&self) -> Self::Instant;

    /// Sleeps for the specified duration.
    ///
    /// Only the background purge driver awaits this; cache operations
    /// themselves never block on time.
    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send;
}

/// Clock backed by the operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    type Instant = std::time::Instant;

    fn now(&self) -> Self::Instant {
        std::time::Instant::now()
    }

    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }
}

/// Virtual clock advanced explicitly by the test driver.
///
/// Clones share the same underlying time, so a cache under test and the
/// test body observe identical instants. `sleep` advances the clock and
/// completes immediately.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    elapsed: Arc<Mutex<Duration>>,
}

impl ManualClock {
    /// Create a clock at virtual time zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance virtual time by `delta`.
    pub fn advance(&self, delta: Duration) {
        *self.elapsed.lock().expect("ManualClock mutex poisoned") += delta;
    }
}

impl Clock for ManualClock {
    /// Virtual time is the duration elapsed since the clock was created.
    type Instant = Duration;

    fn now(&self) -> Self::Instant {
        *self.elapsed.lock().expect("ManualClock mutex poisoned")
    }

    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        self.advance(duration);
        std::future::ready(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_starts_at_zero() {
        let clock = ManualClock::new();
        assert_eq!(clock.now(), Duration::ZERO);
    }

    #[test]
    fn advance_is_visible_to_clones() {
        let clock = ManualClock::new();
        let shared = clock.clone();

        clock.advance(Duration::from_secs(5));

        assert_eq!(shared.now(), Duration::from_secs(5));
    }

    #[test]
    fn poisoned_clock_fails_loudly() {
        let clock = ManualClock::new();
        let shared = clock.clone();
        let _ = std::thread::spawn(move || {
            let _guard = shared.elapsed.lock().unwrap();
            panic!("poison the clock");
        })
        .join();

        // A poisoned clock must panic, not freeze virtual time at zero.
        let result = std::panic::catch_unwind(|| clock.now());
        assert!(result.is_err());
    }

    #[test]
    fn expiration_arithmetic_on_virtual_time() {
        let clock = ManualClock::new();
        let expiration = clock.now() + Duration::from_secs(10);

        clock.advance(Duration::from_secs(9));
        assert!(clock.now() < expiration);

        clock.advance(Duration::from_secs(2));
        assert!(clock.now() > expiration);
    }
}

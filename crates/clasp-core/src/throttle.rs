//! Per-parameter rate limiting for single parameter updates.
//!
//! Timestamps are kept as atomics (nanoseconds since the throttle was
//! created, offset by one so that `0` means "never updated"). The audio
//! thread can therefore be rejected without touching the queue mutex.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Parameter ids below this bound are throttled; others always pass.
pub const MAX_THROTTLED_PARAMS: usize = 256;

/// Default minimum spacing between two updates of the same parameter (~60 Hz).
pub const DEFAULT_UPDATE_INTERVAL: Duration = Duration::from_millis(16);

/// Highest accepted update rate in Hz.
pub const MAX_UPDATE_RATE_HZ: u32 = 1000;

/// Drops single parameter updates that arrive faster than the update rate.
pub struct ParamThrottle {
    epoch: Instant,
    interval_nanos: AtomicU64,
    last: Box<[AtomicU64; MAX_THROTTLED_PARAMS]>,
}

impl ParamThrottle {
    /// Create a throttle with the default 16 ms interval.
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
            interval_nanos: AtomicU64::new(DEFAULT_UPDATE_INTERVAL.as_nanos() as u64),
            last: Box::new(std::array::from_fn(|_| AtomicU64::new(0))),
        }
    }

    /// Current minimum spacing between updates of one parameter.
    pub fn interval(&self) -> Duration {
        Duration::from_nanos(self.interval_nanos.load(Ordering::Relaxed))
    }

    /// Set the update rate. `hz` outside `1..=1000` is ignored.
    ///
    /// The interval is `1000 / hz` whole milliseconds, so 60 Hz yields 16 ms
    /// and 1000 Hz yields 1 ms.
    ///
    /// Returns whether the rate was applied.
    pub fn set_rate_hz(&self, hz: u32) -> bool {
        if hz == 0 || hz > MAX_UPDATE_RATE_HZ {
            return false;
        }
        let interval = Duration::from_millis(u64::from(1000 / hz));
        self.interval_nanos
            .store(interval.as_nanos() as u64, Ordering::Relaxed);
        true
    }

    /// Decide whether an update for `id` arriving now should be kept.
    pub fn accept(&self, id: u32) -> bool {
        self.accept_at(id, Instant::now())
    }

    /// Decide whether an update for `id` arriving at `now` should be kept.
    ///
    /// On acceptance the parameter's timestamp moves to `now`. Concurrent
    /// callers racing on the same id accept at most one update.
    pub fn accept_at(&self, id: u32, now: Instant) -> bool {
        let Some(slot) = self.last.get(id as usize) else {
            return true;
        };

        let stamp = now.saturating_duration_since(self.epoch).as_nanos() as u64 + 1;
        let previous = slot.load(Ordering::Acquire);

        if previous != 0 {
            let elapsed = stamp.saturating_sub(previous);
            if elapsed < self.interval_nanos.load(Ordering::Relaxed) {
                return false;
            }
        }

        slot.compare_exchange(previous, stamp, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Forget all timestamps so the next update of every parameter passes.
    pub fn reset(&self) {
        for slot in self.last.iter() {
            slot.store(0, Ordering::Release);
        }
    }

    /// Instant the throttle's clock starts from.
    pub fn epoch(&self) -> Instant {
        self.epoch
    }
}

impl Default for ParamThrottle {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ParamThrottle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParamThrottle")
            .field("interval", &self.interval())
            .finish_non_exhaustive()
    }
}

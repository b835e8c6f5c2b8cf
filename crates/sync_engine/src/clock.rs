//! Recording clocks
//!
//! Emission timestamps are wall-clock seconds. `SystemClock` reads the epoch
//! once and then advances with a monotonic `Instant`, so system time
//! adjustments during a run cannot make the ledger go backwards.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use chrono::Utc;
use contracts::Clock;

/// Wall-clock anchored monotonic clock
#[derive(Debug, Clone)]
pub struct SystemClock {
    epoch_s: f64,
    anchor: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        let now = Utc::now();
        let epoch_s = now.timestamp() as f64 + f64::from(now.timestamp_subsec_nanos()) * 1e-9;
        Self {
            epoch_s,
            anchor: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> f64 {
        self.epoch_s + self.anchor.elapsed().as_secs_f64()
    }
}

/// Settable clock
///
/// Stores the `f64` bit pattern in an atomic so it can be shared with the
/// synchronizer and moved from test code.
#[derive(Debug, Default)]
pub struct ManualClock {
    bits: AtomicU64,
}

impl ManualClock {
    pub fn new(start: f64) -> Self {
        Self {
            bits: AtomicU64::new(start.to_bits()),
        }
    }

    pub fn set(&self, time: f64) {
        self.bits.store(time.to_bits(), Ordering::SeqCst);
    }

    pub fn advance(&self, delta: f64) {
        let mut current = self.bits.load(Ordering::SeqCst);
        loop {
            let next = (f64::from_bits(current) + delta).to_bits();
            match self
                .bits
                .compare_exchange(current, next, Ordering::SeqCst, Ordering::SeqCst)
            {
                Ok(_) => return,
                Err(actual) => current = actual,
            }
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::SeqCst))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_clock_is_wall_clock_and_monotonic() {
        let clock = SystemClock::new();
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
        // after 2020-01-01
        assert!(a > 1_577_836_800.0);
    }

    #[test]
    fn manual_clock_moves_only_when_told() {
        let clock = ManualClock::new(1.0);
        assert_eq!(clock.now(), 1.0);
        clock.advance(0.5);
        assert_eq!(clock.now(), 1.5);
        clock.set(10.0);
        assert_eq!(clock.now(), 10.0);
    }
}

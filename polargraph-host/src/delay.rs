//! Blocking delay provider backed by the OS scheduler

use std::thread;
use std::time::Duration;

use embedded_hal::delay::DelayNs;

/// `DelayNs` implementation that sleeps the calling thread
///
/// Sub-millisecond pauses are only as precise as the OS allows; the link's
/// byte delay is a minimum, not an exact interval.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdDelay;

impl DelayNs for StdDelay {
    fn delay_ns(&mut self, ns: u32) {
        thread::sleep(Duration::from_nanos(ns as u64));
    }

    fn delay_ms(&mut self, ms: u32) {
        thread::sleep(Duration::from_millis(ms as u64));
    }
}

//! Wall-clock stopwatch for timing compress/decompress phases.

use std::time::{Duration, Instant};

/// Monotonic stopwatch. Not safe for concurrent start/stop pairs; each
/// measured phase uses its own instance or external serialization.
#[derive(Debug, Default)]
pub struct Stopwatch {
    started: Option<Instant>,
    elapsed: Duration,
}

impl Stopwatch {
    pub fn new() -> Stopwatch {
        Stopwatch::default()
    }

    /// Records the start instant. Calling `start` again overwrites the
    /// previous instant; nothing accumulates.
    pub fn start(&mut self) {
        self.started = Some(Instant::now());
    }

    /// Records the end instant and computes the elapsed duration. A stop
    /// without a preceding start leaves the previous duration in place.
    pub fn stop(&mut self) -> f64 {
        if let Some(started) = self.started {
            self.elapsed = started.elapsed();
        }
        self.elapsed.as_secs_f64()
    }

    /// Last computed duration in fractional seconds; 0.0 before any `stop`.
    pub fn elapsed(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }
}

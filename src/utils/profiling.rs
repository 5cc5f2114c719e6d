use std::time::{Duration, Instant};

/// Counters describing the most recent registry pass.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct ForcePassStats {
    /// Registrations whose generator was invoked.
    pub registrations_visited: usize,
    /// Invocations that ended in an `add_force` call.
    pub forces_applied: usize,
    /// Registrations skipped because the particle or generator handle was stale.
    pub stale_skipped: usize,
    pub elapsed: Duration,
}

impl ForcePassStats {
    pub fn report(&self) {
        log::debug!(
            "force pass: {} visited, {} applied, {} stale in {:.3} ms",
            self.registrations_visited,
            self.forces_applied,
            self.stale_skipped,
            self.elapsed.as_secs_f64() * 1000.0
        );
    }
}

/// Adds the lifetime of the guard to `output` when dropped.
pub struct DurationGuard<'a> {
    start: Instant,
    output: &'a mut Duration,
}

impl<'a> DurationGuard<'a> {
    pub fn new(output: &'a mut Duration) -> Self {
        Self {
            start: Instant::now(),
            output,
        }
    }
}

impl<'a> Drop for DurationGuard<'a> {
    fn drop(&mut self) {
        *self.output += self.start.elapsed();
    }
}

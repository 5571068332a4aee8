use std::time::Duration;

/// Doubling-wait backoff for consecutive rate-limit failures on one item:
/// 1, 2, 4, 8, 16, ... seconds. Reset after the item succeeds or is given up.
#[derive(Clone, Debug)]
pub struct Backoff {
    wait_secs: u64,
    attempts: u32,
}

impl Backoff {
    pub fn new() -> Self {
        Self { wait_secs: 1, attempts: 0 }
    }

    /// The wait to sleep for this failure; doubles the next one.
    pub fn next_wait(&mut self) -> Duration {
        let d = Duration::from_secs(self.wait_secs);
        self.wait_secs = self.wait_secs.saturating_mul(2);
        self.attempts += 1;
        d
    }

    /// Consecutive rate-limit failures since the last reset.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn reset(&mut self) {
        self.wait_secs = 1;
        self.attempts = 0;
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new()
    }
}

//! Retry back-off for `{io}`/`{bad-bin}` responses.
//!
//! Modeled on the teacher's `multitimer` crate, which schedules delays off
//! the platform's monotonic clock rather than busy-looping or depending on
//! an interrupt: there's no timer here either, just successive
//! `Platform::delay_ms` calls driven by a fixed sequence of durations.

use crate::platform::Platform;

const DELAYS_MS: [u32; 3] = [250, 500, 1000];

pub struct Backoff {
    attempt: usize,
    max_attempts: usize,
}

impl Backoff {
    pub fn new(max_attempts: usize) -> Self {
        Backoff {
            attempt: 0,
            max_attempts,
        }
    }

    /// Sleeps for the next back-off interval and returns `true`, or
    /// returns `false` without sleeping once attempts are exhausted.
    pub fn wait(&mut self, platform: &mut impl Platform) -> bool {
        if self.attempt >= self.max_attempts {
            return false;
        }
        let delay = DELAYS_MS[self.attempt.min(DELAYS_MS.len() - 1)];
        platform.delay_ms(delay);
        self.attempt += 1;
        true
    }
}

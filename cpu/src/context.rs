//! This module tracks how far through simulated time the emulation
//! has got.
//!
//! The 803 is a serial machine: everything it does takes a whole
//! number of word times, and a word time is a fixed 288 microseconds.
//! Peripheral pacing (for example the ten characters per second of
//! the paper tape punch) is expressed in word times too, so the
//! running count of word times since power-up is the only clock the
//! core and its peripherals need.  The caller separately keeps track
//! of real elapsed time and decides how many word times to emulate in
//! each call.
use core::time::Duration;

/// The duration of one 803 word time.
pub const WORD_TIME: Duration = Duration::from_micros(288);

#[derive(Debug, Default)]
pub struct Context {
    /// Word times emulated since the machine was created.  Advances
    /// even while the machine is stopped or powered off, because
    /// peripheral pacing deadlines are expressed against it.
    pub word_time_count: u64,
}

impl Context {
    #[must_use]
    pub fn new() -> Context {
        Context { word_time_count: 0 }
    }

    /// The simulated time elapsed since the machine was created.
    pub fn simulated_time(&self) -> Duration {
        WORD_TIME * u32::try_from(self.word_time_count).unwrap_or(u32::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simulated_time_advances_with_word_times() {
        let mut ctx = Context::new();
        ctx.word_time_count = 1000;
        assert_eq!(ctx.simulated_time(), Duration::from_micros(288_000));
    }
}

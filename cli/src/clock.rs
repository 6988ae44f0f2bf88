//! Pacing of the emulation loop against the wall clock.

use std::thread::sleep;
use std::time::{Duration, Instant};

use tracing::{event, Level};

/// Sleeping for less than this is not worth the system call; short
/// debts accumulate until they cross the threshold.
const MIN_SLEEP: Duration = Duration::from_millis(1);

/// If the emulation falls this far behind, stop trying to catch up.
const MAX_ARREARS: Duration = Duration::from_secs(1);

/// Paces a loop so that simulated time tracks wall-clock time (or a
/// fixed multiple of it).  Each call to [`Pacer::pace`] moves a
/// deadline forward by the simulated duration just emulated and
/// sleeps if we are ahead of it.
#[derive(Debug)]
pub struct Pacer {
    /// Wall seconds per simulated second; `None` runs flat out.
    scale: Option<f64>,
    deadline: Instant,
}

impl Pacer {
    /// `speed` is the speed-up factor relative to real time; `None`
    /// means unpaced.
    pub fn new(speed: Option<f64>) -> Pacer {
        Pacer {
            scale: speed.map(|s| 1.0 / s),
            deadline: Instant::now(),
        }
    }

    pub fn pace(&mut self, simulated: Duration) {
        let Some(scale) = self.scale else {
            return;
        };
        self.deadline += simulated.mul_f64(scale);
        let now = Instant::now();
        if let Some(ahead) = self.deadline.checked_duration_since(now) {
            if ahead >= MIN_SLEEP {
                sleep(ahead);
            }
        } else if now - self.deadline > MAX_ARREARS {
            event!(
                Level::DEBUG,
                "emulation fell {:?} behind real time; resetting the pace",
                now - self.deadline
            );
            self.deadline = now;
        }
    }
}

//! Leading-edge throttle
//!
//! A call runs only if at least `delay` has passed since the last call that
//! actually ran. Calls inside the window are dropped, never queued.

use parking_lot::Mutex;
use std::time::Duration;
use tokio::time::Instant;

pub struct Throttle {
    delay: Duration,
    last_run: Mutex<Option<Instant>>,
}

impl Throttle {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            last_run: Mutex::new(None),
        }
    }

    /// Run `f` unless the last executed call is less than `delay` ago
    pub fn run<R>(&self, f: impl FnOnce() -> R) -> Option<R> {
        {
            let mut last_run = self.last_run.lock();
            let now = Instant::now();
            if let Some(last) = *last_run {
                if now.duration_since(last) < self.delay {
                    return None;
                }
            }
            *last_run = Some(now);
        }
        Some(f())
    }
}

/// Wrap `f` so repeated calls within `delay` collapse to the first
pub fn throttle<A, R, F>(f: F, delay: Duration) -> impl Fn(A) -> Option<R>
where
    F: Fn(A) -> R,
{
    let gate = Throttle::new(delay);
    move |arg| gate.run(|| f(arg))
}

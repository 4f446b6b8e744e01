/// Progress-event throttling for the delete run.
///
/// Engines report after every item; on a 200k-item batch that is far more
/// than any frontend can usefully render. The throttle forwards only the
/// events that matter: the start and finish transitions always, and
/// intermediate events no closer together than a step of items or a slice
/// of wall time.
use std::time::{Duration, Instant};

/// Forward when this many items completed since the last forwarded event.
pub const FORWARD_ITEM_STEP: u64 = 25;

/// Forward when this much time elapsed since the last forwarded event.
pub const FORWARD_INTERVAL: Duration = Duration::from_millis(120);

/// Decides which raw progress callbacks are forwarded to the frontend.
pub struct ProgressThrottle {
    last: Option<(u64, Instant)>,
}

impl ProgressThrottle {
    pub fn new() -> Self {
        Self { last: None }
    }

    /// Should the event `(completed, total)` be forwarded now?
    ///
    /// Start (`completed == 0`) and finish (`completed == total`) always
    /// forward so the frontend never misses the transitions.
    pub fn should_forward(&mut self, completed: u64, total: u64) -> bool {
        self.should_forward_at(completed, total, Instant::now())
    }

    fn should_forward_at(&mut self, completed: u64, total: u64, now: Instant) -> bool {
        let forward = match self.last {
            None => true,
            Some(_) if completed == 0 || completed == total => true,
            Some((last_completed, last_at)) => {
                completed.saturating_sub(last_completed) >= FORWARD_ITEM_STEP
                    || now.duration_since(last_at) >= FORWARD_INTERVAL
            }
        };
        if forward {
            self.last = Some((completed, now));
        }
        forward
    }
}

impl Default for ProgressThrottle {
    fn default() -> Self {
        Self::new()
    }
}

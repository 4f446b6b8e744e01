/// Remaining-time estimation — sliding-window rate smoothing.
///
/// A naive `fraction / elapsed` average reacts slowly when deletion speed
/// changes mid-run (small files → one huge directory). The estimator keeps
/// a short window of `(time, fraction)` samples and derives the rate from
/// the window endpoints, falling back to the whole-run average while the
/// window is too thin to trust.
use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Samples older than this are discarded from the smoothing window.
pub const SMOOTHING_WINDOW: Duration = Duration::from_secs(30);

/// A run is "just started" while the completed fraction is at or below
/// this value; the smoothed rate is not trusted yet.
const STARTUP_FRACTION: f64 = 0.01;

/// Sliding-window progress-rate estimator for one run.
pub struct ProgressEstimator {
    started: Instant,
    samples: VecDeque<(Instant, f64)>,
}

impl ProgressEstimator {
    /// Start estimating now.
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    /// Start estimating with an explicit run start (deterministic tests).
    pub fn starting_at(started: Instant) -> Self {
        Self {
            started,
            samples: VecDeque::new(),
        }
    }

    /// Record the current completed fraction (clamped to `[0, 1]`).
    pub fn record(&mut self, fraction: f64) {
        self.record_at(Instant::now(), fraction);
    }

    /// Record a sample at an explicit instant (deterministic tests).
    pub fn record_at(&mut self, at: Instant, fraction: f64) {
        self.samples.push_back((at, fraction.clamp(0.0, 1.0)));
        while let Some(&(t, _)) = self.samples.front() {
            if at.duration_since(t) > SMOOTHING_WINDOW && self.samples.len() > 1 {
                self.samples.pop_front();
            } else {
                break;
            }
        }
    }

    /// Estimated time remaining, or `None` while no usable rate exists.
    ///
    /// Remaining = `(1 − fraction) / rate`, clamped to ≥ 0. The smoothed
    /// window rate is used when at least two samples exist and the run is
    /// past its startup phase; otherwise the whole-run average rate.
    pub fn remaining(&self) -> Option<Duration> {
        let &(newest_t, newest_f) = self.samples.back()?;

        let rate = self
            .smoothed_rate()
            .or_else(|| self.average_rate(newest_t, newest_f))?;

        let remaining_secs = ((1.0 - newest_f) / rate).max(0.0);
        if !remaining_secs.is_finite() {
            return None;
        }
        Some(Duration::from_secs_f64(remaining_secs))
    }

    /// Window-endpoint rate in fraction/second, if trustworthy.
    fn smoothed_rate(&self) -> Option<f64> {
        let &(newest_t, newest_f) = self.samples.back()?;
        if self.samples.len() < 2 || newest_f <= STARTUP_FRACTION {
            return None;
        }
        let &(oldest_t, oldest_f) = self.samples.front()?;
        // Floor the denominator at one second so a burst of samples in the
        // same instant cannot produce an absurd rate.
        let elapsed = newest_t.duration_since(oldest_t).as_secs_f64().max(1.0);
        let rate = (newest_f - oldest_f) / elapsed;
        (rate.is_finite() && rate > 0.0).then_some(rate)
    }

    /// Whole-run average rate in fraction/second.
    fn average_rate(&self, newest_t: Instant, newest_f: f64) -> Option<f64> {
        let elapsed = newest_t.duration_since(self.started).as_secs_f64().max(1.0);
        let rate = newest_f / elapsed;
        (rate.is_finite() && rate > 0.0).then_some(rate)
    }
}

impl Default for ProgressEstimator {
    fn default() -> Self {
        Self::new()
    }
}

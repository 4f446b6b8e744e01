/// UI-affine executor — marshals observable updates onto one consumer context.
///
/// Background workers never mutate frontend-visible state directly. Instead
/// they post jobs through an injected [`UiExecutor`]; the frontend decides
/// where and when those jobs run (typically once per frame). The core never
/// assumes a globally discoverable UI thread.
use crossbeam_channel::{bounded, Receiver, Sender};
use tracing::warn;

/// A unit of deferred work destined for the consumer's execution context.
pub type UiJob = Box<dyn FnOnce() + Send + 'static>;

/// Single-consumer executor injected into every component that publishes
/// observable state changes.
pub trait UiExecutor: Send + Sync {
    /// Schedule `job` to run on the consumer's context. Must not block for
    /// long; implementations may drop jobs only when shutting down.
    fn post(&self, job: UiJob);
}

/// Maximum jobs that may queue up in a [`ChannelExecutor`].
///
/// The frontend drains the channel once per frame. At 60 fps a burst of
/// 4 096 jobs gives publishers >60 seconds of headroom before back-pressure
/// causes `post` to drop; workers throttle their own output well below that.
pub const UI_JOB_CHANNEL_CAPACITY: usize = 4_096;

/// Channel-backed executor: jobs queue in a bounded channel and run when the
/// consumer calls [`UiJobPump::drain`].
pub struct ChannelExecutor {
    tx: Sender<UiJob>,
}

/// Consumer half of a [`ChannelExecutor`]. Owned by the frontend loop.
pub struct UiJobPump {
    rx: Receiver<UiJob>,
}

impl ChannelExecutor {
    /// Create a connected executor/pump pair.
    pub fn new() -> (Self, UiJobPump) {
        let (tx, rx) = bounded::<UiJob>(UI_JOB_CHANNEL_CAPACITY);
        (Self { tx }, UiJobPump { rx })
    }
}

impl UiExecutor for ChannelExecutor {
    fn post(&self, job: UiJob) {
        // try_send: a full channel means the consumer stopped draining
        // (window closed mid-run). Dropping the job is the only safe option.
        if self.tx.try_send(job).is_err() {
            warn!("UI job channel full or disconnected — dropping job");
        }
    }
}

impl UiJobPump {
    /// Run up to `budget` queued jobs without blocking.
    ///
    /// Returns the number of jobs executed so the caller knows whether a
    /// repaint is warranted. The budget prevents a backlog (e.g. after the
    /// window was hidden) from stalling the consumer for a perceptible
    /// duration.
    pub fn drain(&self, budget: usize) -> usize {
        let mut ran = 0usize;
        while ran < budget {
            match self.rx.try_recv() {
                Ok(job) => {
                    job();
                    ran += 1;
                }
                Err(_) => break,
            }
        }
        ran
    }
}

/// Executor that runs jobs immediately on the posting thread.
///
/// Used in tests and in headless frontends where no thread affinity exists.
#[derive(Clone, Copy, Debug, Default)]
pub struct InlineExecutor;

impl UiExecutor for InlineExecutor {
    fn post(&self, job: UiJob) {
        job();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Jobs posted to a channel executor must not run until drained.
    #[test]
    fn channel_executor_defers_until_drain() {
        let (exec, pump) = ChannelExecutor::new();
        let counter = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let c = counter.clone();
            exec.post(Box::new(move || {
                c.fetch_add(1, Ordering::SeqCst);
            }));
        }
        assert_eq!(counter.load(Ordering::SeqCst), 0, "must defer");

        let ran = pump.drain(usize::MAX);
        assert_eq!(ran, 3);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    /// The drain budget must cap how many jobs run per call.
    #[test]
    fn drain_respects_budget() {
        let (exec, pump) = ChannelExecutor::new();
        let counter = Arc::new(AtomicUsize::new(0));

        for _ in 0..10 {
            let c = counter.clone();
            exec.post(Box::new(move || {
                c.fetch_add(1, Ordering::SeqCst);
            }));
        }

        assert_eq!(pump.drain(4), 4);
        assert_eq!(counter.load(Ordering::SeqCst), 4);
        assert_eq!(pump.drain(usize::MAX), 6);
    }

    /// The inline executor runs jobs synchronously.
    #[test]
    fn inline_executor_runs_immediately() {
        let counter = Arc::new(AtomicUsize::new(0));
        let c = counter.clone();
        InlineExecutor.post(Box::new(move || {
            c.fetch_add(1, Ordering::SeqCst);
        }));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}

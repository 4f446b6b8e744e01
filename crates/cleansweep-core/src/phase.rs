/// Debounced three-state phase machine for the frontend.
///
/// The screen moves Setup → Preview → Celebration (and back via explicit
/// navigation). Transitions are animated, so each request first waits a
/// short lead delay (long enough for a "transitioning" indicator to
/// render), commits the new phase, then waits a settle delay before the
/// completion callback fires. Requests are latest-wins: a new request
/// supersedes any transition in flight, and a superseded transition's
/// callbacks must never fire.
use crate::exec::UiExecutor;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::debug;

/// Delay before the phase change is committed.
pub const LEAD_DELAY: Duration = Duration::from_millis(50);

/// Delay after the commit before completion is reported.
pub const SETTLE_DELAY: Duration = Duration::from_millis(250);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Setup,
    Preview,
    Celebration,
}

/// Notifications posted through the executor during a transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PhaseEvent {
    /// The phase change has been applied; the settle delay is running.
    Committed(Phase),
    /// The transition is fully complete.
    Settled(Phase),
}

pub type PhaseListener = Arc<dyn Fn(PhaseEvent) + Send + Sync>;

struct PhaseInner {
    // Bumped on every request and on dispose; an in-flight transition
    // whose generation is stale must go silent.
    generation: AtomicU64,
    current: parking_lot::Mutex<Phase>,
    transitioning: AtomicBool,
}

pub struct PhaseController {
    inner: Arc<PhaseInner>,
    executor: Arc<dyn UiExecutor>,
    listener: PhaseListener,
    lead: Duration,
    settle: Duration,
}

impl PhaseController {
    pub fn new(executor: Arc<dyn UiExecutor>, listener: PhaseListener) -> Self {
        Self::with_delays(executor, listener, LEAD_DELAY, SETTLE_DELAY)
    }

    /// Construct with explicit delays (fast tests, alternate animations).
    pub fn with_delays(
        executor: Arc<dyn UiExecutor>,
        listener: PhaseListener,
        lead: Duration,
        settle: Duration,
    ) -> Self {
        Self {
            inner: Arc::new(PhaseInner {
                generation: AtomicU64::new(0),
                current: parking_lot::Mutex::new(Phase::default()),
                transitioning: AtomicBool::new(false),
            }),
            executor,
            listener,
            lead,
            settle,
        }
    }

    /// The last committed phase.
    pub fn current(&self) -> Phase {
        *self.inner.current.lock()
    }

    /// Whether a transition is in flight.
    pub fn is_transitioning(&self) -> bool {
        self.inner.transitioning.load(Ordering::SeqCst)
    }

    /// Request a transition to `target`, superseding any transition in
    /// flight. Returns immediately; progress arrives as [`PhaseEvent`]s.
    pub fn transition_to(&self, target: Phase) {
        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.inner.transitioning.store(true, Ordering::SeqCst);
        debug!("phase transition to {target:?} (generation {generation})");

        let inner = Arc::clone(&self.inner);
        let executor = Arc::clone(&self.executor);
        let listener = Arc::clone(&self.listener);
        let lead = self.lead;
        let settle = self.settle;

        thread::Builder::new()
            .name("cleansweep-phase".into())
            .spawn(move || {
                let still_current = move |inner: &PhaseInner| {
                    inner.generation.load(Ordering::SeqCst) == generation
                };

                thread::sleep(lead);
                {
                    // The generation is re-read while holding the lock:
                    // checked-then-written without it, a stale transition
                    // paused here could overwrite a newer commit.
                    let mut current = inner.current.lock();
                    if !still_current(&inner) {
                        return;
                    }
                    *current = target;
                }
                {
                    // The closure re-checks the generation: the commit job
                    // may sit in the executor's queue while a newer request
                    // supersedes this one.
                    let inner = Arc::clone(&inner);
                    let listener = Arc::clone(&listener);
                    executor.post(Box::new(move || {
                        if still_current(&inner) {
                            listener(PhaseEvent::Committed(target));
                        }
                    }));
                }

                thread::sleep(settle);
                if !still_current(&inner) {
                    return;
                }
                executor.post(Box::new(move || {
                    if still_current(&inner) {
                        inner.transitioning.store(false, Ordering::SeqCst);
                        listener(PhaseEvent::Settled(target));
                    }
                }));
            })
            .expect("failed to spawn phase transition thread");
    }

    /// Cancel any in-flight transition and release its callbacks.
    pub fn dispose(&self) {
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
        self.inner.transitioning.store(false, Ordering::SeqCst);
    }
}

impl Drop for PhaseController {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// Sweep orchestration — coordinates one bulk-delete run end to end.
///
/// The orchestrator owns coordination only: elevation pre-checks, progress
/// throttling and ETA, reconciliation of the engine's per-item results, and
/// marshalling every observable update through the injected executor. The
/// actual removal mechanics live behind [`crate::engine::DeletionEngine`].
///
/// Exactly one run may be active per orchestrator; the run operates on an
/// immutable snapshot of the selection taken at invocation, so concurrent
/// selection edits are harmless.
pub mod progress;
pub mod reconcile;
pub mod risk;

use crate::engine::{DeleteOptions, DeletionEngine, Elevation, ElevationMode, ElevationPrompt, LockDetector};
use crate::estimate::ProgressEstimator;
use crate::exec::UiExecutor;
use crate::inspect::{InspectionHandle, LockInspector};
use crate::selection::SharedSelection;
use self::progress::ProgressThrottle;
use self::reconcile::{reconcile, SweepSummary};
use self::risk::{assess, is_protected_path, PendingRisk};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info, warn};

/// Events published to the frontend, always via the injected executor.
#[derive(Debug)]
pub enum SweepEvent {
    /// The run has been accepted and the engine is about to start.
    Started { total_items: u64, total_bytes: u64 },
    /// Throttled progress with the current remaining-time estimate.
    Progress {
        completed: u64,
        total: u64,
        remaining: Option<Duration>,
    },
    /// The run finished; reconciled results are attached. Reclaimed paths
    /// have already been removed from the selection model.
    Completed { summary: SweepSummary },
    /// Structural failure: the engine call itself failed. The orchestrator
    /// is idle again and may be re-entered.
    Failed { message: String },
    /// The run was abandoned in favour of an elevated restart.
    ElevationRequested,
}

/// Listener for [`SweepEvent`]s; invoked on the executor's context.
pub type SweepListener = Arc<dyn Fn(SweepEvent) + Send + Sync>;

/// Synchronous rejections of [`DeletionOrchestrator::start`].
#[derive(Debug, Error)]
pub enum RunError {
    #[error("a sweep is already running")]
    AlreadyRunning,
    #[error("nothing is selected")]
    NothingSelected,
    #[error("selection includes protected system paths, which the current options do not allow")]
    ProtectedPathsNotAllowed,
    #[error("elevation was declined by the user")]
    ElevationDeclined,
    #[error("elevated restart failed: {0}")]
    ElevationFailed(String),
}

/// Clears the run-active flag when the run ends, unwinds, or is abandoned.
struct RunGuard(Arc<AtomicBool>);

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

pub struct DeletionOrchestrator {
    selection: SharedSelection,
    engine: Arc<dyn DeletionEngine>,
    inspector: LockInspector,
    elevation: Arc<dyn Elevation>,
    prompt: Arc<dyn ElevationPrompt>,
    executor: Arc<dyn UiExecutor>,
    listener: SweepListener,
    run_active: Arc<AtomicBool>,
}

impl DeletionOrchestrator {
    pub fn new(
        selection: SharedSelection,
        engine: Arc<dyn DeletionEngine>,
        detector: Arc<dyn LockDetector>,
        elevation: Arc<dyn Elevation>,
        prompt: Arc<dyn ElevationPrompt>,
        executor: Arc<dyn UiExecutor>,
        listener: SweepListener,
    ) -> Self {
        Self {
            selection,
            engine,
            inspector: LockInspector::new(detector),
            elevation,
            prompt,
            executor,
            listener,
            run_active: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Whether a run is currently active.
    pub fn is_running(&self) -> bool {
        self.run_active.load(Ordering::SeqCst)
    }

    /// Advisory risk assessment of the current selection. Never blocks a run.
    pub fn assess(&self) -> Vec<PendingRisk> {
        assess(&self.selection.read().selected_items())
    }

    /// Kick off a lock inspection of the current selection (latest-wins).
    pub fn inspect_locks(&self) -> InspectionHandle {
        self.inspector.begin(self.selection.read().selected_pairs())
    }

    /// Start a delete run over the current selection snapshot.
    ///
    /// Returns immediately; results arrive as [`SweepEvent`]s. Protected
    /// paths in an unelevated process trigger the confirm-and-restart flow,
    /// and the run is abandoned — it never proceeds unelevated.
    pub fn start(&self, options: DeleteOptions) -> Result<(), RunError> {
        let items = self.selection.read().selected_items();
        if items.is_empty() {
            return Err(RunError::NothingSelected);
        }

        if self
            .run_active
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(RunError::AlreadyRunning);
        }
        let guard = RunGuard(Arc::clone(&self.run_active));

        let protected: Vec<&PathBuf> = items
            .iter()
            .filter(|i| is_protected_path(&i.path))
            .map(|i| &i.path)
            .collect();
        if !protected.is_empty() {
            if !options.allow_protected_paths {
                return Err(RunError::ProtectedPathsNotAllowed);
            }
            if self.elevation.current_mode() != ElevationMode::Administrator {
                return self.request_elevated_restart(protected.len());
                // `guard` drops here: the current run is abandoned.
            }
        }

        let items_total = items.len() as u64;
        let bytes_total: u64 = items.iter().map(|i| i.size).sum();
        info!("starting sweep of {items_total} item(s), {bytes_total} byte(s)");

        let engine = Arc::clone(&self.engine);
        let selection = Arc::clone(&self.selection);
        let executor = Arc::clone(&self.executor);
        let listener = Arc::clone(&self.listener);

        thread::Builder::new()
            .name("cleansweep-sweep".into())
            .spawn(move || {
                let _guard = guard;
                emit(
                    &executor,
                    &listener,
                    SweepEvent::Started {
                        total_items: items_total,
                        total_bytes: bytes_total,
                    },
                );

                let mut estimator = ProgressEstimator::new();
                let mut throttle = ProgressThrottle::new();
                let progress_listener = Arc::clone(&listener);
                let progress_executor = Arc::clone(&executor);
                let mut on_progress = move |completed: u64, total: u64| {
                    if !throttle.should_forward(completed, total) {
                        return;
                    }
                    let fraction = if total == 0 {
                        1.0
                    } else {
                        completed as f64 / total as f64
                    };
                    estimator.record(fraction);
                    emit(
                        &progress_executor,
                        &progress_listener,
                        SweepEvent::Progress {
                            completed,
                            total,
                            remaining: estimator.remaining(),
                        },
                    );
                };

                match engine.delete(&items, &mut on_progress, &options) {
                    Ok(outcome) => {
                        let summary = reconcile(&items, &outcome, options.missing_entry_policy);
                        info!(
                            "sweep finished: {} reclaimed byte(s), {} pending-reboot byte(s), {} failure(s)",
                            summary.reclaimed_bytes,
                            summary.pending_reboot_bytes,
                            summary.failures.len()
                        );
                        let removed: HashSet<PathBuf> =
                            summary.removed.iter().cloned().collect();
                        // Remove reclaimed items and publish the summary in
                        // one job so the frontend never observes them apart.
                        let listener = Arc::clone(&listener);
                        executor.post(Box::new(move || {
                            selection.write().remove_paths(&removed);
                            listener(SweepEvent::Completed { summary });
                        }));
                    }
                    Err(e) => {
                        // Structural failure tier: one failure record, then
                        // back to an idle, re-enterable state.
                        error!("deletion engine failed: {e:#}");
                        emit(
                            &executor,
                            &listener,
                            SweepEvent::Failed {
                                message: format!("deletion engine failed: {e}"),
                            },
                        );
                    }
                }
            })
            .expect("failed to spawn sweep thread");

        Ok(())
    }

    /// Confirm-and-restart flow for protected paths in an unelevated process.
    fn request_elevated_restart(&self, protected_count: usize) -> Result<(), RunError> {
        let reason = format!(
            "{protected_count} selected item(s) live under protected system paths; \
             administrator rights are required to remove them"
        );
        if !self.prompt.confirm(&reason) {
            return Err(RunError::ElevationDeclined);
        }

        let outcome = self.elevation.restart(ElevationMode::Administrator);
        if outcome.success || outcome.already_in_target_mode {
            info!("elevated restart requested — abandoning current run");
            emit(&self.executor, &self.listener, SweepEvent::ElevationRequested);
            Ok(())
        } else {
            let message = outcome
                .error_message
                .unwrap_or_else(|| "unknown error".to_owned());
            warn!("elevated restart failed: {message}");
            Err(RunError::ElevationFailed(message))
        }
    }
}

/// Marshal one event onto the consumer's context.
fn emit(executor: &Arc<dyn UiExecutor>, listener: &SweepListener, event: SweepEvent) {
    let listener = Arc::clone(listener);
    executor.post(Box::new(move || listener(event)));
}

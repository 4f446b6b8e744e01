/// Maintenance queue — serialized update/remove operations.
///
/// Requests against inventory items (package updates, removals) must never
/// run concurrently: package managers hold global locks and fail noisily
/// when raced. The queue accepts requests through a dedup/elevation gate,
/// appends them FIFO, and lazily runs exactly one worker loop that executes
/// them one at a time, recording a transcript per operation.
use crate::engine::{
    CommandOutcome, Elevation, ElevationMode, ElevationPrompt, MaintenanceKind,
    MaintenanceRequest, MaintenanceRunner,
};
use crate::exec::UiExecutor;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// winget exit codes meaning the tool structurally cannot perform the
/// action (no applicable installer / no applicable update). These are not
/// operator errors, so they are logged at reduced severity.
const NON_ACTIONABLE_EXIT_CODES: &[i32] = &[-1978335189, -1978335212];

/// Transcript fragments carrying the same meaning as the exit codes above,
/// matched case-insensitively against stdout and stderr lines.
const NON_ACTIONABLE_FRAGMENTS: &[&str] = &[
    "no applicable installer",
    "no applicable update",
    "no applicable upgrade",
    "no newer package versions",
    "install technology of the existing package is different",
];

/// One row of the package inventory, as presented by the embedding app.
#[derive(Clone, Debug)]
pub struct InventoryItem {
    /// Stable identity used for dedup across enqueues.
    pub key: String,
    pub display_name: String,
    /// Package manager responsible for the item, e.g. "winget".
    pub manager: String,
    /// Identifier as known to the manager's online catalog.
    pub catalog_id: Option<String>,
    /// Identifier as found in the local installed inventory.
    pub inventory_id: Option<String>,
    pub requires_admin: bool,
    pub installed_version: Option<String>,
    pub available_version: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OperationStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
}

impl OperationStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

/// One ledger entry: a request plus everything its execution produced.
#[derive(Clone, Debug)]
pub struct MaintenanceOperation {
    pub id: u64,
    pub item_key: String,
    pub display_name: String,
    pub kind: MaintenanceKind,
    pub status: OperationStatus,
    /// One-line result summary shown in the operation list.
    pub message: String,
    /// Captured stdout transcript.
    pub output: Vec<String>,
    /// Captured stderr transcript.
    pub errors: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    /// Original request, kept so a failed operation can be retried as-is.
    request: MaintenanceRequest,
}

/// Accepted enqueue results.
#[derive(Debug, PartialEq, Eq)]
pub enum EnqueueOutcome {
    /// Operation accepted; its ledger id.
    Queued(u64),
    /// The request needs elevation and an elevated restart was launched;
    /// nothing was queued in this process.
    RestartRequested,
}

#[derive(Debug, Error)]
pub enum EnqueueError {
    #[error("{0} is already queued")]
    AlreadyQueued(String),
    #[error("{0} has no usable package identifier")]
    UnresolvedPackageId(String),
    #[error("elevation was declined by the user")]
    ElevationDeclined,
    #[error("elevated restart failed: {0}")]
    ElevationFailed(String),
    #[error("the maintenance queue has been shut down")]
    Disposed,
}

/// Listener argument meaning the ledger changed as a whole (operations
/// were cleared) rather than a single operation. Operation ids start at 1.
pub const LEDGER_CHANGED: u64 = 0;

/// Notified (through the executor) with the id of a changed operation,
/// or [`LEDGER_CHANGED`] when the ledger was restructured.
pub type QueueListener = Arc<dyn Fn(u64) + Send + Sync>;

struct QueueInner {
    pending: Mutex<VecDeque<u64>>,
    operations: Mutex<Vec<MaintenanceOperation>>,
    worker_active: AtomicBool,
    disposed: AtomicBool,
    next_id: AtomicU64,
}

pub struct MaintenanceQueue {
    inner: Arc<QueueInner>,
    runner: Arc<dyn MaintenanceRunner>,
    elevation: Arc<dyn Elevation>,
    prompt: Arc<dyn ElevationPrompt>,
    executor: Arc<dyn UiExecutor>,
    listener: QueueListener,
}

impl MaintenanceQueue {
    pub fn new(
        runner: Arc<dyn MaintenanceRunner>,
        elevation: Arc<dyn Elevation>,
        prompt: Arc<dyn ElevationPrompt>,
        executor: Arc<dyn UiExecutor>,
        listener: QueueListener,
    ) -> Self {
        Self {
            inner: Arc::new(QueueInner {
                pending: Mutex::new(VecDeque::new()),
                operations: Mutex::new(Vec::new()),
                worker_active: AtomicBool::new(false),
                disposed: AtomicBool::new(false),
                next_id: AtomicU64::new(1),
            }),
            runner,
            elevation,
            prompt,
            executor,
            listener,
        }
    }

    /// Request `kind` against `item`.
    ///
    /// Rejected when the item already has a Pending or Running operation,
    /// or when no package identifier can be resolved. Requests that need
    /// administrative rights in an unelevated process go through the
    /// confirm-and-restart flow; nothing is queued in that case.
    pub fn enqueue(
        &self,
        item: &InventoryItem,
        kind: MaintenanceKind,
    ) -> Result<EnqueueOutcome, EnqueueError> {
        // Dedup first, so a duplicate is reported as such even when its
        // identifiers or elevation state would also reject it.
        self.reject_if_queued(&item.key, &item.display_name)?;

        // Catalog identifiers are preferred: the local inventory id can be
        // a display-name echo the manager does not accept as a target.
        let package_id = item
            .catalog_id
            .clone()
            .filter(|id| !id.is_empty())
            .or_else(|| item.inventory_id.clone().filter(|id| !id.is_empty()))
            .ok_or_else(|| EnqueueError::UnresolvedPackageId(item.display_name.clone()))?;

        self.enqueue_request(MaintenanceRequest {
            item_key: item.key.clone(),
            display_name: item.display_name.clone(),
            manager: item.manager.clone(),
            package_id,
            requires_admin: item.requires_admin,
            target_version: item.available_version.clone(),
            kind,
        })
    }

    /// Re-enqueue every Failed operation with its original request, through
    /// the same dedup and elevation gate as a fresh enqueue. Returns one
    /// result per retried operation.
    pub fn retry_failed(&self) -> Vec<Result<EnqueueOutcome, EnqueueError>> {
        let failed: Vec<MaintenanceRequest> = self
            .inner
            .operations
            .lock()
            .iter()
            .filter(|op| op.status == OperationStatus::Failed)
            .map(|op| op.request.clone())
            .collect();

        failed
            .into_iter()
            .map(|request| {
                let result = self.enqueue_request(request);
                if let Err(e) = &result {
                    debug!("retry skipped: {e}");
                }
                result
            })
            .collect()
    }

    /// Snapshot of the operation ledger, oldest first.
    pub fn operations(&self) -> Vec<MaintenanceOperation> {
        self.inner.operations.lock().clone()
    }

    /// Drop terminal operations from the ledger.
    pub fn clear_finished(&self) {
        self.inner
            .operations
            .lock()
            .retain(|op| !op.status.is_terminal());
        self.notify(LEDGER_CHANGED);
    }

    /// Stop accepting work and drop anything not yet started. The currently
    /// running operation, if any, finishes normally.
    pub fn dispose(&self) {
        self.inner.disposed.store(true, Ordering::SeqCst);
        self.inner.pending.lock().clear();
    }

    fn enqueue_request(
        &self,
        request: MaintenanceRequest,
    ) -> Result<EnqueueOutcome, EnqueueError> {
        if self.inner.disposed.load(Ordering::SeqCst) {
            return Err(EnqueueError::Disposed);
        }
        self.reject_if_queued(&request.item_key, &request.display_name)?;

        if request.requires_admin && self.elevation.current_mode() != ElevationMode::Administrator
        {
            return self.request_elevated_restart(&request);
        }

        let id = {
            // Re-checked under the insertion lock, so two concurrent
            // enqueues of the same item cannot both pass the gate above.
            let mut operations = self.inner.operations.lock();
            let duplicate = operations.iter().any(|op| {
                op.item_key == request.item_key
                    && matches!(op.status, OperationStatus::Pending | OperationStatus::Running)
            });
            if duplicate {
                return Err(EnqueueError::AlreadyQueued(request.display_name.clone()));
            }

            let id = self.inner.next_id.fetch_add(1, Ordering::SeqCst);
            info!(
                "queued {} of {} (operation {id})",
                request.kind.as_str(),
                request.display_name
            );
            operations.push(MaintenanceOperation {
                id,
                item_key: request.item_key.clone(),
                display_name: request.display_name.clone(),
                kind: request.kind,
                status: OperationStatus::Pending,
                message: "Waiting in queue".to_owned(),
                output: Vec::new(),
                errors: Vec::new(),
                created_at: Utc::now(),
                started_at: None,
                finished_at: None,
                request,
            });
            id
        };
        self.inner.pending.lock().push_back(id);
        self.notify(id);
        self.ensure_worker();
        Ok(EnqueueOutcome::Queued(id))
    }

    /// Reject when `item_key` already has a Pending or Running operation.
    fn reject_if_queued(&self, item_key: &str, display_name: &str) -> Result<(), EnqueueError> {
        let queued = self.inner.operations.lock().iter().any(|op| {
            op.item_key == item_key
                && matches!(op.status, OperationStatus::Pending | OperationStatus::Running)
        });
        if queued {
            return Err(EnqueueError::AlreadyQueued(display_name.to_owned()));
        }
        Ok(())
    }

    fn request_elevated_restart(
        &self,
        request: &MaintenanceRequest,
    ) -> Result<EnqueueOutcome, EnqueueError> {
        let reason = format!(
            "{} of {} requires administrator rights",
            request.kind.as_str(),
            request.display_name
        );
        if !self.prompt.confirm(&reason) {
            return Err(EnqueueError::ElevationDeclined);
        }
        let outcome = self.elevation.restart(ElevationMode::Administrator);
        if outcome.success || outcome.already_in_target_mode {
            info!("elevated restart requested for {}", request.display_name);
            Ok(EnqueueOutcome::RestartRequested)
        } else {
            let message = outcome
                .error_message
                .unwrap_or_else(|| "unknown error".to_owned());
            warn!("elevated restart failed: {message}");
            Err(EnqueueError::ElevationFailed(message))
        }
    }

    /// Start the worker loop unless one is already running.
    fn ensure_worker(&self) {
        if self
            .inner
            .worker_active
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return;
        }

        let inner = Arc::clone(&self.inner);
        let runner = Arc::clone(&self.runner);
        let executor = Arc::clone(&self.executor);
        let listener = Arc::clone(&self.listener);

        thread::Builder::new()
            .name("cleansweep-maint".into())
            .spawn(move || {
                while !inner.disposed.load(Ordering::SeqCst) {
                    let Some(id) = inner.pending.lock().pop_front() else {
                        inner.worker_active.store(false, Ordering::SeqCst);
                        // An enqueue may have raced the store above and lost
                        // its wakeup; reclaim the worker slot if so.
                        let more = !inner.pending.lock().is_empty();
                        if more
                            && inner
                                .worker_active
                                .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
                                .is_ok()
                        {
                            continue;
                        }
                        return;
                    };
                    run_operation(&inner, &runner, &executor, &listener, id);
                }
                inner.worker_active.store(false, Ordering::SeqCst);
            })
            .expect("failed to spawn maintenance worker thread");
    }

    fn notify(&self, id: u64) {
        let listener = Arc::clone(&self.listener);
        self.executor.post(Box::new(move || listener(id)));
    }
}

impl Drop for MaintenanceQueue {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// Execute one queued operation end to end.
fn run_operation(
    inner: &QueueInner,
    runner: &Arc<dyn MaintenanceRunner>,
    executor: &Arc<dyn UiExecutor>,
    listener: &QueueListener,
    id: u64,
) {
    let request = {
        let mut operations = inner.operations.lock();
        let Some(op) = operations.iter_mut().find(|op| op.id == id) else {
            // Cleared from the ledger while still queued.
            return;
        };
        op.status = OperationStatus::Running;
        op.message = format!("Running {}", op.kind.as_str());
        op.started_at = Some(Utc::now());
        op.request.clone()
    };
    notify(executor, listener, id);

    let result = runner.run(&request);

    let mut operations = inner.operations.lock();
    let Some(op) = operations.iter_mut().find(|op| op.id == id) else {
        return;
    };
    op.finished_at = Some(Utc::now());
    match result {
        Ok(outcome) => {
            op.output = outcome.output.clone();
            op.errors = outcome.errors.clone();
            op.message = if outcome.summary.is_empty() {
                format!("{} finished", op.kind.as_str())
            } else {
                outcome.summary.clone()
            };
            if outcome.success {
                op.status = OperationStatus::Succeeded;
                info!("{} of {} succeeded", op.kind.as_str(), op.display_name);
            } else {
                // Status stays Failed either way; only the log severity
                // distinguishes "the tool cannot do this" from a real error.
                op.status = OperationStatus::Failed;
                if is_non_actionable(&outcome) {
                    info!(
                        "{} of {} is not applicable: {}",
                        op.kind.as_str(),
                        op.display_name,
                        op.message
                    );
                } else {
                    error!(
                        "{} of {} failed: {}",
                        op.kind.as_str(),
                        op.display_name,
                        op.message
                    );
                }
            }
        }
        Err(e) => {
            op.status = OperationStatus::Failed;
            op.message = format!("{e}");
            op.errors.push(format!("{e:#}"));
            error!("{} of {} failed: {e:#}", op.kind.as_str(), op.display_name);
        }
    }
    drop(operations);
    notify(executor, listener, id);
}

fn notify(executor: &Arc<dyn UiExecutor>, listener: &QueueListener, id: u64) {
    let listener = Arc::clone(listener);
    executor.post(Box::new(move || listener(id)));
}

/// Does this failure mean the tool structurally cannot perform the action?
fn is_non_actionable(outcome: &CommandOutcome) -> bool {
    if let Some(code) = outcome.exit_code {
        if NON_ACTIONABLE_EXIT_CODES.contains(&code) {
            return true;
        }
    }
    outcome
        .output
        .iter()
        .chain(outcome.errors.iter())
        .any(|line| {
            let line = line.to_lowercase();
            NON_ACTIONABLE_FRAGMENTS.iter().any(|f| line.contains(f))
        })
}

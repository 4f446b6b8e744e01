/// End-to-end maintenance queue integration tests.
///
/// These tests exercise the real worker loop with an instrumented runner:
/// real thread spawning, real FIFO hand-off, and the serialization
/// invariant measured with a concurrency counter rather than assumed.
use cleansweep_core::engine::{
    CommandOutcome, Elevation, ElevationMode, ElevationPrompt, MaintenanceKind,
    MaintenanceRequest, MaintenanceRunner, RestartOutcome,
};
use cleansweep_core::exec::InlineExecutor;
use cleansweep_core::queue::{
    EnqueueError, EnqueueOutcome, InventoryItem, MaintenanceQueue, OperationStatus,
};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

// ── Helpers ──────────────────────────────────────────────────────────────────

struct AdminElevation;
impl Elevation for AdminElevation {
    fn current_mode(&self) -> ElevationMode {
        ElevationMode::Administrator
    }
    fn restart(&self, _mode: ElevationMode) -> RestartOutcome {
        RestartOutcome {
            success: false,
            already_in_target_mode: true,
            error_message: None,
        }
    }
}

struct YesPrompt;
impl ElevationPrompt for YesPrompt {
    fn confirm(&self, _reason: &str) -> bool {
        true
    }
}

/// Runner that records execution order and tracks how many invocations
/// overlap, holding each one briefly so overlap would actually be seen.
struct InstrumentedRunner {
    running: AtomicUsize,
    max_running: AtomicUsize,
    order: Mutex<Vec<String>>,
    /// Per-key failures remaining before the runner starts succeeding.
    failures_left: Mutex<std::collections::HashMap<String, usize>>,
}

impl InstrumentedRunner {
    fn new() -> Self {
        Self {
            running: AtomicUsize::new(0),
            max_running: AtomicUsize::new(0),
            order: Mutex::new(Vec::new()),
            failures_left: Mutex::new(std::collections::HashMap::new()),
        }
    }

    fn failing_first(keys: &[&str]) -> Self {
        let runner = Self::new();
        let mut failures = runner.failures_left.lock();
        for key in keys {
            failures.insert((*key).to_owned(), 1);
        }
        drop(failures);
        runner
    }
}

impl MaintenanceRunner for InstrumentedRunner {
    fn run(&self, request: &MaintenanceRequest) -> anyhow::Result<CommandOutcome> {
        let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_running.fetch_max(now, Ordering::SeqCst);
        self.order.lock().push(request.item_key.clone());

        // Long enough that two overlapping runs would be observed.
        std::thread::sleep(Duration::from_millis(20));

        let must_fail = {
            let mut failures = self.failures_left.lock();
            match failures.get_mut(&request.item_key) {
                Some(left) if *left > 0 => {
                    *left -= 1;
                    true
                }
                _ => false,
            }
        };

        self.running.fetch_sub(1, Ordering::SeqCst);
        Ok(CommandOutcome {
            success: !must_fail,
            summary: if must_fail {
                "Installer error".to_owned()
            } else {
                format!("{} completed", request.kind.as_str())
            },
            output: vec![format!("processed {}", request.package_id)],
            attempted: true,
            exit_code: Some(if must_fail { 1 } else { 0 }),
            ..CommandOutcome::default()
        })
    }
}

fn item(key: &str) -> InventoryItem {
    InventoryItem {
        key: key.to_owned(),
        display_name: format!("Package {key}"),
        manager: "winget".to_owned(),
        catalog_id: Some(format!("Vendor.{key}")),
        inventory_id: None,
        requires_admin: false,
        installed_version: Some("1.0".to_owned()),
        available_version: Some("2.0".to_owned()),
    }
}

fn queue_over(runner: Arc<InstrumentedRunner>) -> MaintenanceQueue {
    MaintenanceQueue::new(
        runner,
        Arc::new(AdminElevation),
        Arc::new(YesPrompt),
        Arc::new(InlineExecutor),
        Arc::new(|_| {}),
    )
}

/// Wait until every ledger operation is terminal (generous CI timeout).
fn drain(queue: &MaintenanceQueue) {
    let deadline = std::time::Instant::now() + Duration::from_secs(30);
    loop {
        if queue.operations().iter().all(|op| op.status.is_terminal()) {
            return;
        }
        assert!(
            std::time::Instant::now() < deadline,
            "queue did not drain within 30 seconds"
        );
        std::thread::sleep(Duration::from_millis(5));
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

/// A burst of enqueues must execute strictly one at a time, in FIFO order.
#[test]
fn burst_enqueue_serializes_execution() {
    let runner = Arc::new(InstrumentedRunner::new());
    let queue = queue_over(runner.clone());

    let keys = ["A", "B", "C", "D", "E"];
    for key in keys {
        assert!(matches!(
            queue.enqueue(&item(key), MaintenanceKind::Update),
            Ok(EnqueueOutcome::Queued(_))
        ));
    }
    drain(&queue);

    assert_eq!(
        runner.max_running.load(Ordering::SeqCst),
        1,
        "at most one operation may run at any instant"
    );
    assert_eq!(*runner.order.lock(), keys.map(String::from).to_vec());
    assert!(queue
        .operations()
        .iter()
        .all(|op| op.status == OperationStatus::Succeeded));
}

/// Enqueue Update for the same package twice back-to-back — the second
/// call is rejected and the queue grows by exactly one.
#[test]
fn back_to_back_duplicate_is_rejected() {
    let runner = Arc::new(InstrumentedRunner::new());
    let queue = queue_over(runner);
    let p = item("P");

    let first = queue.enqueue(&p, MaintenanceKind::Update);
    let second = queue.enqueue(&p, MaintenanceKind::Update);

    assert!(matches!(first, Ok(EnqueueOutcome::Queued(_))));
    assert!(matches!(second, Err(EnqueueError::AlreadyQueued(_))));
    assert_eq!(queue.operations().len(), 1);
    drain(&queue);
}

/// Failed operations retried through `retry_failed` must run again and
/// succeed once the underlying cause clears; succeeded ones are untouched.
#[test]
fn retry_failed_runs_operations_again() {
    let runner = Arc::new(InstrumentedRunner::failing_first(&["flaky"]));
    let queue = queue_over(runner.clone());

    queue.enqueue(&item("flaky"), MaintenanceKind::Update).unwrap();
    queue.enqueue(&item("solid"), MaintenanceKind::Remove).unwrap();
    drain(&queue);

    let statuses: Vec<OperationStatus> =
        queue.operations().iter().map(|op| op.status).collect();
    assert_eq!(statuses, vec![OperationStatus::Failed, OperationStatus::Succeeded]);

    let results = queue.retry_failed();
    assert_eq!(results.len(), 1, "only the failed operation retries");
    drain(&queue);

    let operations = queue.operations();
    assert_eq!(operations.len(), 3);
    let retried = &operations[2];
    assert_eq!(retried.item_key, "flaky");
    assert_eq!(retried.kind, MaintenanceKind::Update);
    assert_eq!(retried.status, OperationStatus::Succeeded);
    assert_eq!(runner.max_running.load(Ordering::SeqCst), 1);
}

/// The ledger records timestamps and transcripts for every operation.
#[test]
fn ledger_records_lifecycle_details() {
    let runner = Arc::new(InstrumentedRunner::new());
    let queue = queue_over(runner);

    queue.enqueue(&item("X"), MaintenanceKind::ForceRemove).unwrap();
    drain(&queue);

    let operations = queue.operations();
    let op = &operations[0];
    assert_eq!(op.display_name, "Package X");
    assert_eq!(op.message, "force-remove completed");
    assert_eq!(op.output, vec!["processed Vendor.X".to_owned()]);
    let started = op.started_at.expect("must record start");
    let finished = op.finished_at.expect("must record finish");
    assert!(op.created_at <= started);
    assert!(started <= finished);
}

/// A worker that went idle must be restarted by the next enqueue.
#[test]
fn worker_restarts_after_idle() {
    let runner = Arc::new(InstrumentedRunner::new());
    let queue = queue_over(runner.clone());

    queue.enqueue(&item("first"), MaintenanceKind::Update).unwrap();
    drain(&queue);

    queue.enqueue(&item("second"), MaintenanceKind::Update).unwrap();
    drain(&queue);

    assert_eq!(runner.order.lock().len(), 2);
    assert_eq!(queue.operations().len(), 2);
    assert_eq!(runner.max_running.load(Ordering::SeqCst), 1);
}

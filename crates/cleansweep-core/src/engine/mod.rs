/// Collaborator contracts — the seams between the orchestration core and
/// the mechanisms it delegates to.
///
/// The core owns *coordination*: sampling, throttling, reconciliation,
/// queueing. The actual file-deletion mechanics, lock detection, package
/// manager execution, and process elevation live behind these traits so
/// tests and non-Windows builds can substitute them freely.
///
/// [`fs::FsDeletionEngine`] is the built-in `std::fs` implementation of
/// [`DeletionEngine`]; real lock detection and package execution are
/// supplied by the embedding application.
pub mod fs;

use crate::cancel::CancelToken;
use crate::model::Item;
use serde::Serialize;
use std::path::PathBuf;

// ─── Deletion ────────────────────────────────────────────────────────────────

/// Final per-item outcome of a delete run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Disposition {
    /// Item was removed and its space reclaimed.
    Deleted,
    /// Item was intentionally not touched; see the entry reason.
    Skipped,
    /// Removal was attempted and failed.
    Failed,
    /// Removal is scheduled for the next OS restart; space not yet reclaimed.
    PendingReboot,
}

impl Disposition {
    /// Stable lowercase label for logs and report export.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Deleted => "deleted",
            Self::Skipped => "skipped",
            Self::Failed => "failed",
            Self::PendingReboot => "pending-reboot",
        }
    }
}

/// One per-item record returned by the deletion engine.
#[derive(Clone, Debug, Serialize)]
pub struct DeletionEntry {
    pub path: PathBuf,
    pub size_bytes: u64,
    pub is_dir: bool,
    pub disposition: Disposition,
    /// Engine-provided explanation, e.g. "not found" or "access denied".
    pub reason: String,
}

/// Aggregate result of one delete run.
///
/// Counters are derived from the entries via [`DeleteOutcome::record`] so
/// the two can never drift apart.
#[derive(Clone, Debug, Default, Serialize)]
pub struct DeleteOutcome {
    pub entries: Vec<DeletionEntry>,
    pub deleted_count: u64,
    pub skipped_count: u64,
    pub failed_count: u64,
    pub pending_reboot_count: u64,
    pub bytes_deleted: u64,
    pub bytes_skipped: u64,
    pub bytes_failed: u64,
    pub bytes_pending_reboot: u64,
}

impl DeleteOutcome {
    /// Append an entry, updating the matching count/byte totals.
    pub fn record(&mut self, entry: DeletionEntry) {
        match entry.disposition {
            Disposition::Deleted => {
                self.deleted_count += 1;
                self.bytes_deleted += entry.size_bytes;
            }
            Disposition::Skipped => {
                self.skipped_count += 1;
                self.bytes_skipped += entry.size_bytes;
            }
            Disposition::Failed => {
                self.failed_count += 1;
                self.bytes_failed += entry.size_bytes;
            }
            Disposition::PendingReboot => {
                self.pending_reboot_count += 1;
                self.bytes_pending_reboot += entry.size_bytes;
            }
        }
        self.entries.push(entry);
    }
}

/// Policy for selection items the engine returned no entry for.
///
/// The historically observed behavior is `TreatAsDeleted`: an absent entry
/// means the engine removed the item without comment. That silently turns
/// an engine omission bug into reported success, so the policy is an
/// explicit option rather than an implicit rule; cautious callers can pick
/// `TreatAsFailed`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub enum MissingEntryPolicy {
    /// Absent entries count as successfully deleted (observed default).
    #[default]
    TreatAsDeleted,
    /// Absent entries count as failures and stay visible.
    TreatAsFailed,
}

/// User-chosen options for one delete run.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct DeleteOptions {
    /// Prefer moving items to the recycle bin over permanent deletion.
    pub prefer_recycle_bin: bool,
    /// Allow permanent deletion when the recycle bin is unavailable.
    pub allow_permanent_fallback: bool,
    /// Skip items held open by another process instead of failing them.
    pub skip_locked: bool,
    /// Retake ownership and retry when the OS reports access denied.
    pub take_ownership_on_access_denied: bool,
    /// Permit items under protected/system paths (requires elevation).
    pub allow_protected_paths: bool,
    /// How to treat selection items absent from the engine's entries.
    pub missing_entry_policy: MissingEntryPolicy,
}

impl Default for DeleteOptions {
    fn default() -> Self {
        Self {
            prefer_recycle_bin: true,
            allow_permanent_fallback: true,
            skip_locked: true,
            take_ownership_on_access_denied: false,
            allow_protected_paths: false,
            missing_entry_policy: MissingEntryPolicy::default(),
        }
    }
}

/// The bulk file-deletion collaborator.
///
/// `on_progress(completed, total)` is invoked from the engine's own thread
/// after each item; the orchestrator throttles before forwarding, so
/// engines may call it as often as they like.
pub trait DeletionEngine: Send + Sync {
    fn delete(
        &self,
        items: &[Item],
        on_progress: &mut dyn FnMut(u64, u64),
        options: &DeleteOptions,
    ) -> anyhow::Result<DeleteOutcome>;
}

// ─── Lock detection ──────────────────────────────────────────────────────────

/// A process found holding one or more sampled paths open.
#[derive(Clone, Debug, Serialize)]
pub struct ResourceLockInfo {
    pub process_id: u32,
    pub display_name: String,
    /// `true` for Windows services (closed via the service manager).
    pub is_service: bool,
    /// `true` for processes that must never be terminated.
    pub is_critical: bool,
    /// `true` if the restart manager can relaunch it after close.
    pub is_restartable: bool,
    /// Which of the inspected paths this process holds.
    pub resource_paths: Vec<PathBuf>,
}

/// How to ask lock holders to release their handles.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CloseMode {
    /// Ask applications to shut down and save state.
    Graceful,
    /// Terminate without waiting.
    Force,
}

/// The lock-detection collaborator (Windows restart manager or equivalent).
pub trait LockDetector: Send + Sync {
    /// Report processes holding any of `paths`. Implementations should poll
    /// `token` between expensive steps and return early when cancelled;
    /// results returned after cancellation are discarded by the caller.
    fn inspect(
        &self,
        paths: &[PathBuf],
        token: &CancelToken,
    ) -> anyhow::Result<Vec<ResourceLockInfo>>;

    /// Ask the given processes to release their handles.
    /// Returns a human-readable status line.
    fn close(&self, process_ids: &[u32], mode: CloseMode) -> anyhow::Result<String>;
}

// ─── Package maintenance ─────────────────────────────────────────────────────

/// The operation requested against one inventory item.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MaintenanceKind {
    Update,
    Remove,
    ForceRemove,
}

impl MaintenanceKind {
    /// Stable lowercase label for logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Update => "update",
            Self::Remove => "remove",
            Self::ForceRemove => "force-remove",
        }
    }
}

/// A fully-resolved maintenance request, ready for the worker.
#[derive(Clone, Debug)]
pub struct MaintenanceRequest {
    /// Stable identity of the inventory item (dedup key).
    pub item_key: String,
    /// Name shown in the operation list and logs.
    pub display_name: String,
    /// Package manager responsible for the item, e.g. "winget".
    pub manager: String,
    /// Resolved package identifier (catalog-sourced when available).
    pub package_id: String,
    /// Whether execution needs administrative rights.
    pub requires_admin: bool,
    /// Pin to a specific version; `None` means latest.
    pub target_version: Option<String>,
    pub kind: MaintenanceKind,
}

/// Result of running one maintenance command.
#[derive(Clone, Debug, Default)]
pub struct CommandOutcome {
    pub success: bool,
    /// One-line result summary for the operation message.
    pub summary: String,
    /// Captured stdout lines.
    pub output: Vec<String>,
    /// Captured stderr lines.
    pub errors: Vec<String>,
    pub exit_code: Option<i32>,
    /// `false` when the tool refused before attempting anything.
    pub attempted: bool,
    pub status_before: Option<String>,
    pub status_after: Option<String>,
    pub installed_version: Option<String>,
    pub latest_version: Option<String>,
}

/// The maintenance-execution collaborator (package manager frontend).
pub trait MaintenanceRunner: Send + Sync {
    fn run(&self, request: &MaintenanceRequest) -> anyhow::Result<CommandOutcome>;
}

// ─── Elevation ───────────────────────────────────────────────────────────────

/// Privilege level of the current process.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ElevationMode {
    Standard,
    Administrator,
}

/// Result of requesting an elevated restart.
#[derive(Clone, Debug)]
pub struct RestartOutcome {
    pub success: bool,
    pub already_in_target_mode: bool,
    pub error_message: Option<String>,
}

/// Elevation query/restart collaborator.
pub trait Elevation: Send + Sync {
    fn current_mode(&self) -> ElevationMode;

    /// Launch a new instance in `mode`. On success the caller abandons the
    /// current operation; this process is expected to exit shortly after.
    /// Failures are reported, never auto-retried.
    fn restart(&self, mode: ElevationMode) -> RestartOutcome;
}

/// Asks the user to confirm an elevation-requiring action.
///
/// Frontends show a dialog; headless embeddings can hardcode an answer.
pub trait ElevationPrompt: Send + Sync {
    fn confirm(&self, reason: &str) -> bool;
}

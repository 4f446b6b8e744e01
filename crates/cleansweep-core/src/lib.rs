/// CleanSweep Core — cleanup orchestration, lock inspection, and maintenance queueing.
///
/// This crate contains all business logic with zero UI dependencies.
/// It is designed to be reusable across different frontends (GUI, CLI, TUI).
///
/// # Modules
///
/// - [`model`] — Target groups, items, and display formatting.
/// - [`selection`] — Shared selection state container with change listeners.
/// - [`catalog`] — Filesystem walk that builds cleanup target groups.
/// - [`engine`] — Collaborator contracts (deletion, locks, maintenance, elevation).
/// - [`inspect`] — Sampled, cancellable lock inspection of the current selection.
/// - [`estimate`] — Sliding-window rate smoothing for remaining-time estimates.
/// - [`sweep`] — The deletion orchestrator: pre-checks, progress, reconciliation.
/// - [`phase`] — Debounced three-state UI phase machine.
/// - [`queue`] — Single-worker FIFO queue for package update/remove operations.
/// - [`exec`] — Injected UI-affine executor used to marshal observable updates.
/// - [`cancel`] — Explicit per-request cancellation tokens.
/// - [`report`] — CSV/JSON export of sweep results.
/// - [`platform`] — Process elevation query and elevated restart.
pub mod cancel;
pub mod catalog;
pub mod engine;
pub mod estimate;
pub mod exec;
pub mod inspect;
pub mod model;
pub mod phase;
pub mod platform;
pub mod queue;
pub mod report;
pub mod selection;
pub mod sweep;

/// Reconciliation — merge the engine's per-item entries back onto the
/// original selection.
///
/// Every selected item receives exactly one final disposition: the
/// partition is total (no item dropped) and exact (no item counted twice,
/// duplicate engine entries collapse to the last one). What each
/// disposition means for the pending view:
///
/// - `Deleted` → removed; bytes counted as reclaimed now.
/// - `Skipped("not found")` → removed; the item was already gone.
/// - `Skipped(<anything else>)` → a persistent condition; retained as a
///   visible failure so the user can act on it.
/// - `Failed` → retained as a visible failure.
/// - `PendingReboot` → removed from the live view, but its bytes are
///   reported separately because the space is not reclaimed yet.
/// - absent from the engine's entries → decided by the configured
///   [`MissingEntryPolicy`].
use crate::engine::{DeleteOutcome, DeletionEntry, Disposition, MissingEntryPolicy};
use crate::model::Item;
use serde::Serialize;
use std::collections::HashMap;
use std::path::PathBuf;

/// Result of reconciling one delete run against its selection snapshot.
#[derive(Clone, Debug, Default, Serialize)]
pub struct SweepSummary {
    /// The full partition: exactly one entry per originally selected item.
    pub entries: Vec<DeletionEntry>,
    /// Paths to drop from the pending view.
    pub removed: Vec<PathBuf>,
    /// Entries retained as visible failures (failed + persistent skips).
    pub failures: Vec<DeletionEntry>,
    /// Bytes reclaimed immediately.
    pub reclaimed_bytes: u64,
    /// Bytes scheduled for release on the next OS restart.
    pub pending_reboot_bytes: u64,
}

/// Is this skip reason the transient "already gone" case?
fn is_transient_skip(reason: &str) -> bool {
    reason.to_lowercase().contains("not found")
}

/// Reconcile `outcome` against the `selection` snapshot of the run.
pub fn reconcile(
    selection: &[Item],
    outcome: &DeleteOutcome,
    policy: MissingEntryPolicy,
) -> SweepSummary {
    // Index engine entries by path; a duplicate path keeps the last entry,
    // matching the engine's final word on that item.
    let mut by_path: HashMap<&PathBuf, &DeletionEntry> = HashMap::new();
    for entry in &outcome.entries {
        by_path.insert(&entry.path, entry);
    }

    let mut summary = SweepSummary::default();

    for item in selection {
        let entry = match by_path.get(&item.path) {
            Some(&e) => e.clone(),
            None => synthesize_missing(item, policy),
        };

        match entry.disposition {
            Disposition::Deleted => {
                summary.reclaimed_bytes += entry.size_bytes;
                summary.removed.push(entry.path.clone());
            }
            Disposition::Skipped if is_transient_skip(&entry.reason) => {
                summary.removed.push(entry.path.clone());
            }
            Disposition::Skipped | Disposition::Failed => {
                summary.failures.push(entry.clone());
            }
            Disposition::PendingReboot => {
                summary.pending_reboot_bytes += entry.size_bytes;
                summary.removed.push(entry.path.clone());
            }
        }
        summary.entries.push(entry);
    }

    summary
}

/// Build the entry for an item the engine returned nothing for.
fn synthesize_missing(item: &Item, policy: MissingEntryPolicy) -> DeletionEntry {
    let (disposition, reason) = match policy {
        MissingEntryPolicy::TreatAsDeleted => (Disposition::Deleted, String::new()),
        MissingEntryPolicy::TreatAsFailed => (
            Disposition::Failed,
            "engine returned no entry for this item".to_owned(),
        ),
    };
    DeletionEntry {
        path: item.path.clone(),
        size_bytes: item.size,
        is_dir: item.is_dir,
        disposition,
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn item(path: &str, size: u64) -> Item {
        Item::new_file(PathBuf::from(path), size)
    }

    fn entry(path: &str, size: u64, disposition: Disposition, reason: &str) -> DeletionEntry {
        DeletionEntry {
            path: PathBuf::from(path),
            size_bytes: size,
            is_dir: false,
            disposition,
            reason: reason.to_owned(),
        }
    }

    fn outcome_of(entries: Vec<DeletionEntry>) -> DeleteOutcome {
        let mut o = DeleteOutcome::default();
        for e in entries {
            o.record(e);
        }
        o
    }

    /// The reference scenario: item1 deleted, item3 skipped("locked"),
    /// item2 absent → item2 treated as deleted, item3 a visible failure,
    /// item1 removed from view.
    #[test]
    fn reference_three_item_scenario() {
        let selection = vec![item("/s/item1", 10), item("/s/item2", 20), item("/s/item3", 30)];
        let outcome = outcome_of(vec![
            entry("/s/item1", 10, Disposition::Deleted, ""),
            entry("/s/item3", 30, Disposition::Skipped, "locked"),
        ]);

        let summary = reconcile(&selection, &outcome, MissingEntryPolicy::TreatAsDeleted);

        let removed: HashSet<_> = summary.removed.iter().cloned().collect();
        assert!(removed.contains(&PathBuf::from("/s/item1")));
        assert!(removed.contains(&PathBuf::from("/s/item2")), "absent ⇒ deleted");
        assert!(!removed.contains(&PathBuf::from("/s/item3")));

        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.failures[0].path, PathBuf::from("/s/item3"));
        assert_eq!(summary.reclaimed_bytes, 30); // item1 + item2
    }

    /// Every selected item must appear in `entries` exactly once,
    /// even with duplicate engine entries for the same path.
    #[test]
    fn partition_is_total_and_exact() {
        let selection = vec![item("/s/a", 1), item("/s/b", 2), item("/s/c", 3)];
        let outcome = outcome_of(vec![
            entry("/s/a", 1, Disposition::Failed, "first word"),
            entry("/s/a", 1, Disposition::Deleted, "last word wins"),
            entry("/s/b", 2, Disposition::Deleted, ""),
        ]);

        let summary = reconcile(&selection, &outcome, MissingEntryPolicy::TreatAsDeleted);

        assert_eq!(summary.entries.len(), selection.len());
        let paths: Vec<_> = summary.entries.iter().map(|e| e.path.clone()).collect();
        let unique: HashSet<_> = paths.iter().cloned().collect();
        assert_eq!(unique.len(), selection.len(), "no duplicates");
        assert_eq!(
            summary.entries[0].disposition,
            Disposition::Deleted,
            "the engine's last entry for a path must win"
        );
    }

    /// Under `TreatAsFailed`, absent items stay visible as failures.
    #[test]
    fn missing_policy_treat_as_failed() {
        let selection = vec![item("/s/only", 5)];
        let summary = reconcile(
            &selection,
            &DeleteOutcome::default(),
            MissingEntryPolicy::TreatAsFailed,
        );

        assert!(summary.removed.is_empty());
        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.failures[0].disposition, Disposition::Failed);
        assert_eq!(summary.reclaimed_bytes, 0);
    }

    /// Transient "not found" skips leave the view; persistent skips stay.
    #[test]
    fn skip_reasons_split_transient_from_persistent() {
        let selection = vec![item("/s/gone", 1), item("/s/held", 2)];
        let outcome = outcome_of(vec![
            entry("/s/gone", 1, Disposition::Skipped, "Not Found"),
            entry("/s/held", 2, Disposition::Skipped, "locked by another process"),
        ]);

        let summary = reconcile(&selection, &outcome, MissingEntryPolicy::TreatAsDeleted);

        assert_eq!(summary.removed, vec![PathBuf::from("/s/gone")]);
        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.failures[0].path, PathBuf::from("/s/held"));
    }

    /// Pending-reboot bytes are reported separately from reclaimed bytes,
    /// and the item leaves the live view.
    #[test]
    fn pending_reboot_bytes_are_separate() {
        let selection = vec![item("/s/now", 100), item("/s/later", 40)];
        let outcome = outcome_of(vec![
            entry("/s/now", 100, Disposition::Deleted, ""),
            entry("/s/later", 40, Disposition::PendingReboot, "scheduled"),
        ]);

        let summary = reconcile(&selection, &outcome, MissingEntryPolicy::TreatAsDeleted);

        assert_eq!(summary.reclaimed_bytes, 100);
        assert_eq!(summary.pending_reboot_bytes, 40);
        assert_eq!(summary.removed.len(), 2);
        assert!(summary.failures.is_empty());
    }
}

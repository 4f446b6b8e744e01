/// Built-in `std::fs` deletion engine.
///
/// Deletes permanently — recycle-bin transfer belongs to platform engines
/// supplied by the embedding application. Per-item failures never abort the
/// run: each item gets its own [`DeletionEntry`] and the sweep continues,
/// the same way the catalog walk tolerates unreadable directories.
use super::{DeleteOptions, DeleteOutcome, DeletionEngine, DeletionEntry, Disposition};
use crate::model::Item;
use std::fs;
use std::io::ErrorKind;
use tracing::{debug, warn};

/// Windows sharing-violation OS error: another process holds the file open.
const SHARING_VIOLATION: i32 = 32;

#[derive(Clone, Copy, Debug, Default)]
pub struct FsDeletionEngine;

impl FsDeletionEngine {
    fn delete_one(&self, item: &Item, options: &DeleteOptions) -> DeletionEntry {
        let result = if item.is_dir {
            fs::remove_dir_all(&item.path)
        } else {
            fs::remove_file(&item.path)
        };

        let (disposition, reason) = match result {
            Ok(()) => (Disposition::Deleted, String::new()),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                // Already gone — a transient skip the reconciler drops.
                (Disposition::Skipped, "not found".to_owned())
            }
            Err(e) if e.raw_os_error() == Some(SHARING_VIOLATION) && options.skip_locked => {
                (Disposition::Skipped, "locked by another process".to_owned())
            }
            Err(e) if e.kind() == ErrorKind::PermissionDenied => {
                (Disposition::Failed, "access denied".to_owned())
            }
            Err(e) => (Disposition::Failed, e.to_string()),
        };

        if disposition == Disposition::Failed {
            warn!("delete failed for {}: {}", item.path.display(), reason);
        }

        DeletionEntry {
            path: item.path.clone(),
            size_bytes: item.size,
            is_dir: item.is_dir,
            disposition,
            reason,
        }
    }
}

impl DeletionEngine for FsDeletionEngine {
    fn delete(
        &self,
        items: &[Item],
        on_progress: &mut dyn FnMut(u64, u64),
        options: &DeleteOptions,
    ) -> anyhow::Result<DeleteOutcome> {
        if options.prefer_recycle_bin {
            debug!("recycle bin not supported by the fs engine — deleting permanently");
        }

        let total = items.len() as u64;
        let mut outcome = DeleteOutcome::default();
        on_progress(0, total);

        for (i, item) in items.iter().enumerate() {
            outcome.record(self.delete_one(item, options));
            on_progress(i as u64 + 1, total);
        }

        Ok(outcome)
    }
}

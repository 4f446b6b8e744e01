/// Cleanup targets — a flat, clone-friendly item model.
///
/// Groups and items are plain data: the catalog scanner produces them,
/// the selection model owns them, and the orchestrator operates on cloned
/// snapshots so a run is never affected by concurrent selection edits.
use compact_str::CompactString;
use std::path::PathBuf;
use std::time::SystemTime;

/// One category of cleanup targets (e.g. temp files under one root).
///
/// Groups are replaced wholesale on every catalog rescan; the remaining
/// item count always equals the live `items` length.
#[derive(Clone, Debug)]
pub struct TargetGroup {
    /// Short category tag, e.g. "temp", "logs", "caches".
    pub category: CompactString,
    /// Safety classification shown next to the category, e.g. "safe", "review".
    pub classification: CompactString,
    /// Root path the group was catalogued under.
    pub path: PathBuf,
    /// Live items in this group, in catalog order.
    pub items: Vec<Item>,
    /// Human-readable cautions attached at catalog time.
    pub warnings: Vec<String>,
}

impl TargetGroup {
    /// Create an empty group for `category` rooted at `path`.
    pub fn new(category: impl Into<CompactString>, path: PathBuf) -> Self {
        Self {
            category: category.into(),
            classification: CompactString::new("review"),
            path,
            items: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Number of items still present (not yet removed by a sweep).
    pub fn remaining(&self) -> usize {
        self.items.len()
    }

    /// Total byte size of the currently selected items.
    pub fn selected_bytes(&self) -> u64 {
        self.items
            .iter()
            .filter(|i| i.selected)
            .map(|i| i.size)
            .sum()
    }
}

/// A single file or directory eligible for cleanup.
#[derive(Clone, Debug)]
pub struct Item {
    /// Full path of the file or directory.
    pub path: PathBuf,
    /// Logical size in bytes (directories: recursive content size).
    pub size: u64,
    /// Last-modified timestamp, if the filesystem reported one.
    pub modified: Option<SystemTime>,
    /// Creation timestamp, if the filesystem reported one.
    pub created: Option<SystemTime>,
    /// `true` if this item is a directory removed as a whole.
    pub is_dir: bool,
    /// Free-form risk signals gathered at catalog time
    /// (e.g. "in use by host process", "recently written").
    pub signals: Vec<String>,
    /// Whether the user has marked this item for deletion.
    pub selected: bool,
}

impl Item {
    /// Create a file item. Selection defaults to off.
    pub fn new_file(path: PathBuf, size: u64) -> Self {
        Self {
            path,
            size,
            modified: None,
            created: None,
            is_dir: false,
            signals: Vec::new(),
            selected: false,
        }
    }

    /// Create a directory item. Selection defaults to off.
    pub fn new_dir(path: PathBuf, size: u64) -> Self {
        Self {
            is_dir: true,
            ..Self::new_file(path, size)
        }
    }
}

/// A selected item paired with the category it was selected from.
///
/// This is the unit the lock-inspection sampler works on: stratification
/// happens per category so no category is starved by a volume-dominant one.
#[derive(Clone, Debug)]
pub struct SelectedItem {
    /// Category of the owning [`TargetGroup`].
    pub category: CompactString,
    /// Snapshot of the item at selection time.
    pub item: Item,
}

#[cfg(test)]
mod tests {
    use super::*;

    /// `remaining()` must track the live item count.
    #[test]
    fn remaining_equals_live_item_count() {
        let mut group = TargetGroup::new("temp", PathBuf::from("/tmp"));
        assert_eq!(group.remaining(), 0);

        group.items.push(Item::new_file(PathBuf::from("/tmp/a"), 10));
        group.items.push(Item::new_file(PathBuf::from("/tmp/b"), 20));
        assert_eq!(group.remaining(), 2);

        group.items.retain(|i| i.size != 10);
        assert_eq!(group.remaining(), 1);
    }

    /// Selected bytes must only count items with the selection flag on.
    #[test]
    fn selected_bytes_ignores_unselected() {
        let mut group = TargetGroup::new("logs", PathBuf::from("/var/log"));
        let mut a = Item::new_file(PathBuf::from("/var/log/a.log"), 100);
        a.selected = true;
        let b = Item::new_file(PathBuf::from("/var/log/b.log"), 200);
        group.items.push(a);
        group.items.push(b);

        assert_eq!(group.selected_bytes(), 100);
    }
}

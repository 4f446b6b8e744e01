/// Selection state container — groups, per-item flags, change listeners.
///
/// The model is shared as `Arc<RwLock<SelectionModel>>`: background workers
/// hold the write lock briefly when applying sweep results, the frontend
/// holds a read lock while rendering. Change notification uses plain
/// registered callbacks rather than any binding framework; callbacks run on
/// whichever thread performed the mutation, so frontends that care about
/// thread affinity should register a callback that posts through their
/// [`crate::exec::UiExecutor`].
use crate::model::{Item, SelectedItem, TargetGroup};
use parking_lot::RwLock;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

/// A shared, concurrently-readable selection model.
pub type SharedSelection = Arc<RwLock<SelectionModel>>;

/// Change listener invoked after every observable mutation.
pub type SelectionListener = Box<dyn Fn() + Send + Sync>;

/// Holds the catalogued target groups and the per-item selection flags.
#[derive(Default)]
pub struct SelectionModel {
    groups: Vec<TargetGroup>,
    listeners: Vec<SelectionListener>,
}

impl SelectionModel {
    /// Create an empty model.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a model for shared use.
    pub fn shared(self) -> SharedSelection {
        Arc::new(RwLock::new(self))
    }

    /// Replace all groups wholesale (done on every catalog rescan).
    /// Previous groups, items, and selection flags are discarded.
    pub fn replace_groups(&mut self, groups: Vec<TargetGroup>) {
        self.groups = groups;
        self.notify();
    }

    /// Read access to the current groups.
    pub fn groups(&self) -> &[TargetGroup] {
        &self.groups
    }

    /// Set the selection flag of one item. Out-of-range indices are ignored.
    pub fn set_selected(&mut self, group: usize, item: usize, selected: bool) {
        if let Some(i) = self
            .groups
            .get_mut(group)
            .and_then(|g| g.items.get_mut(item))
        {
            i.selected = selected;
            self.notify();
        }
    }

    /// Set the selection flag of every item in one group.
    pub fn set_group_selected(&mut self, group: usize, selected: bool) {
        if let Some(g) = self.groups.get_mut(group) {
            for item in &mut g.items {
                item.selected = selected;
            }
            self.notify();
        }
    }

    /// Immutable snapshot of every selected item, paired with its category.
    ///
    /// Sweeps and lock inspections run on this snapshot, so selection edits
    /// made while a run is active never affect it.
    pub fn selected_pairs(&self) -> Vec<SelectedItem> {
        self.groups
            .iter()
            .flat_map(|g| {
                g.items
                    .iter()
                    .filter(|i| i.selected)
                    .map(|i| SelectedItem {
                        category: g.category.clone(),
                        item: i.clone(),
                    })
            })
            .collect()
    }

    /// Immutable snapshot of just the selected items.
    pub fn selected_items(&self) -> Vec<Item> {
        self.selected_pairs().into_iter().map(|p| p.item).collect()
    }

    /// Count and total byte size of the current selection.
    pub fn selected_totals(&self) -> (usize, u64) {
        let mut count = 0usize;
        let mut bytes = 0u64;
        for g in &self.groups {
            for i in &g.items {
                if i.selected {
                    count += 1;
                    bytes += i.size;
                }
            }
        }
        (count, bytes)
    }

    /// Remove items whose paths were reclaimed by a completed sweep.
    ///
    /// Groups are kept (possibly empty) so the frontend can show "0 items
    /// remaining" until the next rescan replaces them.
    pub fn remove_paths(&mut self, paths: &HashSet<PathBuf>) {
        if paths.is_empty() {
            return;
        }
        for g in &mut self.groups {
            g.items.retain(|i| !paths.contains(&i.path));
        }
        self.notify();
    }

    /// Register a change listener. Listeners are never unregistered; they
    /// live as long as the model.
    pub fn subscribe(&mut self, listener: SelectionListener) {
        self.listeners.push(listener);
    }

    fn notify(&self) {
        for l in &self.listeners {
            l();
        }
    }
}

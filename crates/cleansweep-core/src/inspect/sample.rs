/// Stratified lock-inspection sampling.
///
/// Querying the lock detector for every selected path is prohibitively slow
/// on large selections, so inspection runs on a bounded sample. Sampling is
/// stratified per category first, then re-ranked globally: every category
/// contributes its top candidates even when one category dominates the
/// selection by volume, and the global pass still favours the paths most
/// worth checking (largest, most recently written).
use crate::model::SelectedItem;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::time::SystemTime;

/// Per-category shortlist cap.
pub const MAX_PER_CATEGORY: usize = 32;

/// Global cap on sampled paths handed to the lock detector.
pub const MAX_SAMPLE_PATHS: usize = 600;

/// A bounded sample of the current selection plus coverage statistics.
#[derive(Clone, Debug)]
pub struct LockSample {
    /// Deduplicated paths to hand to the lock detector, best candidates first.
    pub paths: Vec<PathBuf>,
    /// Item count of the full selection the sample was drawn from.
    pub total_items: usize,
    /// Number of items represented in `paths`.
    pub sampled_items: usize,
    /// Estimated fraction of the selection covered by the sample:
    /// sampled bytes over total bytes, or an item-count ratio when the
    /// selection reports zero total bytes. Always in `[0, 1]`.
    pub coverage: f64,
}

impl LockSample {
    /// One status line summarising what the sample represents.
    pub fn status_line(&self) -> String {
        format!(
            "sampled {} of {} items, ~{:.0}% of size",
            self.sampled_items,
            self.total_items,
            self.coverage * 100.0
        )
    }
}

/// Ranking key shared by the per-category and global passes:
/// size descending, then last-modified descending.
fn rank(a: &SelectedItem, b: &SelectedItem) -> std::cmp::Ordering {
    b.item
        .size
        .cmp(&a.item.size)
        .then_with(|| cmp_modified(b.item.modified, a.item.modified))
}

fn cmp_modified(a: Option<SystemTime>, b: Option<SystemTime>) -> std::cmp::Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => std::cmp::Ordering::Greater,
        (None, Some(_)) => std::cmp::Ordering::Less,
        (None, None) => std::cmp::Ordering::Equal,
    }
}

/// Build a bounded sample of `selection` for lock inspection.
///
/// Steps: shortlist the top [`MAX_PER_CATEGORY`] per category by
/// (size desc, modified desc); merge all shortlists and re-rank globally by
/// the same key; deduplicate by path; cap at [`MAX_SAMPLE_PATHS`].
pub fn build_sample(selection: &[SelectedItem]) -> LockSample {
    let total_items = selection.len();
    let total_bytes: u64 = selection.iter().map(|s| s.item.size).sum();

    // Per-category shortlists.
    let mut by_category: HashMap<&str, Vec<&SelectedItem>> = HashMap::new();
    for sel in selection {
        by_category
            .entry(sel.category.as_str())
            .or_default()
            .push(sel);
    }

    let mut merged: Vec<&SelectedItem> = Vec::new();
    for (_, mut candidates) in by_category {
        candidates.sort_unstable_by(|a, b| rank(a, b));
        candidates.truncate(MAX_PER_CATEGORY);
        merged.extend(candidates);
    }

    // Global re-rank over the merged shortlists, same key.
    merged.sort_unstable_by(|a, b| rank(a, b));

    let mut seen: HashSet<&PathBuf> = HashSet::with_capacity(merged.len());
    let mut paths: Vec<PathBuf> = Vec::new();
    let mut sampled_bytes = 0u64;

    for sel in merged {
        if paths.len() >= MAX_SAMPLE_PATHS {
            break;
        }
        if seen.insert(&sel.item.path) {
            sampled_bytes += sel.item.size;
            paths.push(sel.item.path.clone());
        }
    }

    let sampled_items = paths.len();
    let coverage = if total_bytes > 0 {
        sampled_bytes as f64 / total_bytes as f64
    } else if total_items > 0 {
        sampled_items as f64 / total_items as f64
    } else {
        0.0
    };

    LockSample {
        paths,
        total_items,
        sampled_items,
        coverage: coverage.clamp(0.0, 1.0),
    }
}

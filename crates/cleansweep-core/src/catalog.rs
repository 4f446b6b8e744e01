/// Catalog scanner — walks a root and builds cleanup target groups.
///
/// Uses `jwalk`'s rayon-backed parallel traversal so the scan stays fast
/// on very wide trees. Only files with a recognised cleanup classification
/// become items; everything else is left alone.
/// Groups come back in a fixed category order, items largest-first, and
/// are intended to replace the selection model's groups wholesale.
use crate::cancel::CancelToken;
use crate::model::{Item, TargetGroup};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, warn};

/// Cancellation is polled every this many walked entries.
const CANCEL_CHECK_INTERVAL: u64 = 1_000;

/// Category presentation order, with the safety classification shown
/// beside each. "safe" categories are regenerated by their owners;
/// "review" ones may carry data the user still wants.
const CATEGORY_ORDER: &[(&str, &str)] = &[
    ("temp", "safe"),
    ("caches", "safe"),
    ("logs", "review"),
    ("installers", "review"),
    ("other", "review"),
];

/// Classify a file path into a cleanup category, or `None` to leave it
/// alone. Extension rules run first; the cache rule matches on any path
/// component so nested cache layouts are caught.
fn classify(path: &Path) -> Option<&'static str> {
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase());
    if let Some(ext) = extension.as_deref() {
        match ext {
            "tmp" | "temp" | "bak" | "old" => return Some("temp"),
            "log" | "etl" | "dmp" => return Some("logs"),
            "msi" | "msu" | "cab" => return Some("installers"),
            "crdownload" | "partial" => return Some("other"),
            _ => {}
        }
    }

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    if matches!(name.as_str(), "thumbs.db" | ".ds_store" | "desktop.ini") {
        return Some("other");
    }

    let in_cache_dir = path.components().any(|c| {
        let c = c.as_os_str().to_string_lossy().to_lowercase();
        c == "cache" || c == "caches" || c == ".cache" || c.ends_with("-cache")
    });
    if in_cache_dir {
        return Some("caches");
    }

    None
}

/// Walk `root` and build the target groups for the selection model.
///
/// Unreadable entries are counted and surfaced as a group warning, never
/// a scan failure. Returns the groups gathered so far when `token` is
/// cancelled mid-walk.
pub fn scan_groups(root: &Path, token: &CancelToken) -> anyhow::Result<Vec<TargetGroup>> {
    let mut by_category: HashMap<&'static str, Vec<Item>> = HashMap::new();
    let mut error_count: u64 = 0;
    let mut walked: u64 = 0;

    let walker = jwalk::WalkDir::new(root)
        .skip_hidden(false)
        .follow_links(false)
        .parallelism(jwalk::Parallelism::RayonNewPool(num_cpus::get()));

    for entry_result in walker {
        walked += 1;
        if walked.is_multiple_of(CANCEL_CHECK_INTERVAL) && token.is_cancelled() {
            debug!("catalog scan cancelled after {walked} entries");
            break;
        }

        let entry = match entry_result {
            Ok(e) => e,
            Err(err) => {
                error_count += 1;
                debug!("catalog walk error: {err}");
                continue;
            }
        };
        if entry.file_type().is_dir() {
            continue;
        }

        let path = entry.path();
        let Some(category) = classify(&path) else {
            continue;
        };

        let metadata = match std::fs::symlink_metadata(&path) {
            Ok(m) => m,
            Err(err) => {
                error_count += 1;
                debug!("catalog stat error on {}: {err}", path.display());
                continue;
            }
        };
        let mut item = Item::new_file(path, metadata.len());
        item.modified = metadata.modified().ok();
        item.created = metadata.created().ok();
        by_category.entry(category).or_default().push(item);
    }

    if error_count > 0 {
        warn!("catalog scan skipped {error_count} unreadable entries under {}", root.display());
    }

    let mut groups = Vec::new();
    for &(category, classification) in CATEGORY_ORDER {
        let Some(mut items) = by_category.remove(category) else {
            continue;
        };
        items.sort_by(|a, b| b.size.cmp(&a.size));

        let mut group = TargetGroup::new(category, root.to_path_buf());
        group.classification = classification.into();
        if error_count > 0 {
            group
                .warnings
                .push(format!("{error_count} entries could not be read during cataloguing"));
        }
        group.items = items;
        groups.push(group);
    }

    debug!(
        "catalogued {} group(s) from {} walked entries under {}",
        groups.len(),
        walked,
        root.display()
    );
    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    fn touch(path: &Path, bytes: usize) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, vec![0u8; bytes]).unwrap();
    }

    /// Classification rules: extensions first, cache directories, known
    /// junk names; unknown files stay unclassified.
    #[test]
    fn classification_rules() {
        assert_eq!(classify(Path::new("/x/a.TMP")), Some("temp"));
        assert_eq!(classify(Path::new("/x/old-config.bak")), Some("temp"));
        assert_eq!(classify(Path::new("/x/service.log")), Some("logs"));
        assert_eq!(classify(Path::new("/x/crash.dmp")), Some("logs"));
        assert_eq!(classify(Path::new("/x/setup.msi")), Some("installers"));
        assert_eq!(classify(Path::new("/x/.cache/app/blob")), Some("caches"));
        assert_eq!(classify(Path::new("/x/gpu-cache/data")), Some("caches"));
        assert_eq!(classify(Path::new("/x/Thumbs.db")), Some("other"));
        assert_eq!(classify(Path::new("/x/movie.crdownload")), Some("other"));
        assert_eq!(classify(Path::new("/x/notes.txt")), None);
    }

    /// A mixed tree catalogues into ordered groups with items largest-first,
    /// and unclassified files never appear.
    #[test]
    fn scan_builds_ordered_groups() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        touch(&root.join("small.tmp"), 10);
        touch(&root.join("big.tmp"), 500);
        touch(&root.join("app/service.log"), 100);
        touch(&root.join("profile/cache/blob.bin"), 200);
        touch(&root.join("keep/notes.txt"), 42);

        let groups = scan_groups(root, &CancelToken::new()).unwrap();

        let categories: Vec<_> = groups.iter().map(|g| g.category.as_str()).collect();
        assert_eq!(categories, vec!["temp", "caches", "logs"]);

        let temp = &groups[0];
        assert_eq!(temp.classification.as_str(), "safe");
        assert_eq!(temp.remaining(), 2);
        assert_eq!(temp.items[0].path, root.join("big.tmp"), "largest first");
        assert_eq!(temp.items[0].size, 500);

        let all_paths: Vec<PathBuf> = groups
            .iter()
            .flat_map(|g| g.items.iter().map(|i| i.path.clone()))
            .collect();
        assert!(!all_paths.contains(&root.join("keep/notes.txt")));
    }

    /// Items carry filesystem timestamps for the risk assessment.
    #[test]
    fn items_carry_timestamps() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("fresh.tmp"), 1);

        let groups = scan_groups(dir.path(), &CancelToken::new()).unwrap();
        assert!(groups[0].items[0].modified.is_some());
    }

    /// An empty root catalogues to no groups at all.
    #[test]
    fn empty_root_yields_no_groups() {
        let dir = tempfile::tempdir().unwrap();
        let groups = scan_groups(dir.path(), &CancelToken::new()).unwrap();
        assert!(groups.is_empty());
    }
}

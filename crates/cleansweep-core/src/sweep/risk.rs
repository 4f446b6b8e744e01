/// Pre-run risk assessment — advisory only, never blocks a sweep.
///
/// Recomputed before every confirmation so the user sees current warnings:
/// recently-written items, items under protected system paths, and items
/// whose catalog signals suggest they are in use.
use crate::model::Item;
use serde::Serialize;
use std::path::Path;
use std::time::{Duration, SystemTime};

/// How loud a risk is presented.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum RiskSeverity {
    Info,
    Caution,
    Danger,
}

/// One advisory shown on the confirmation screen.
#[derive(Clone, Debug, Serialize)]
pub struct PendingRisk {
    pub title: String,
    pub description: String,
    pub severity: RiskSeverity,
}

/// Items modified within this many days are flagged as recently active.
pub const RECENT_MODIFY_DAYS: u64 = 3;

/// Lowercased prefixes of protected/system locations. Matching is textual
/// (case-insensitive, `/` normalised to `\`) so the predicate behaves the
/// same on every platform and in tests.
const PROTECTED_PREFIXES: &[&str] = &[
    "c:\\windows",
    "c:\\program files",
    "c:\\program files (x86)",
    "c:\\programdata\\microsoft",
];

/// Signal fragments that indicate an item is currently held open.
const IN_USE_FRAGMENTS: &[&str] = &["in use", "locked", "running", "open handle"];

/// Does `path` fall under a protected/system location?
pub fn is_protected_path(path: &Path) -> bool {
    let normalised = path.to_string_lossy().to_lowercase().replace('/', "\\");
    PROTECTED_PREFIXES
        .iter()
        .any(|prefix| normalised.starts_with(prefix))
}

/// Assess `selection` and return the advisories that apply.
pub fn assess(selection: &[Item]) -> Vec<PendingRisk> {
    let now = SystemTime::now();
    let recent_window = Duration::from_secs(RECENT_MODIFY_DAYS * 24 * 3600);

    let mut recent = 0usize;
    let mut protected = 0usize;
    let mut in_use = 0usize;

    for item in selection {
        if let Some(modified) = item.modified {
            if now
                .duration_since(modified)
                .map(|age| age < recent_window)
                .unwrap_or(false)
            {
                recent += 1;
            }
        }
        if is_protected_path(&item.path) {
            protected += 1;
        }
        if item.signals.iter().any(|s| {
            let s = s.to_lowercase();
            IN_USE_FRAGMENTS.iter().any(|f| s.contains(f))
        }) {
            in_use += 1;
        }
    }

    let mut risks = Vec::new();
    if recent > 0 {
        risks.push(PendingRisk {
            title: "Recently modified items".to_owned(),
            description: format!(
                "{recent} item(s) were written within the last {RECENT_MODIFY_DAYS} days and may still be needed"
            ),
            severity: RiskSeverity::Caution,
        });
    }
    if protected > 0 {
        risks.push(PendingRisk {
            title: "Protected system locations".to_owned(),
            description: format!(
                "{protected} item(s) live under protected system paths; removal requires elevation"
            ),
            severity: RiskSeverity::Danger,
        });
    }
    if in_use > 0 {
        risks.push(PendingRisk {
            title: "Items reported in use".to_owned(),
            description: format!(
                "{in_use} item(s) appear to be held open by a running process"
            ),
            severity: RiskSeverity::Caution,
        });
    }
    risks
}

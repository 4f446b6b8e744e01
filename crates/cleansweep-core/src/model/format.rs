/// Display formatting — human-readable byte counts and remaining-time text.
///
/// All internal sizes are `u64` bytes and all internal times are
/// `std::time::Duration`. Floating point appears only at the formatting
/// boundary.
use std::time::Duration;

/// Binary unit ladder labelled with the short forms users expect.
const UNITS: [(&str, u64); 4] = [
    ("TB", 1 << 40),
    ("GB", 1 << 30),
    ("MB", 1 << 20),
    ("KB", 1 << 10),
];

/// Format a byte count with the largest fitting unit.
///
/// Uses binary multiples (1 KB = 1024 B); GB and TB get two decimals,
/// smaller units one.
pub fn format_size(bytes: u64) -> String {
    for (label, scale) in UNITS {
        if bytes >= scale {
            let value = bytes as f64 / scale as f64;
            return if scale >= 1 << 30 {
                format!("{value:.2} {label}")
            } else {
                format!("{value:.1} {label}")
            };
        }
    }
    format!("{bytes} B")
}

/// Threshold above which remaining time switches from "mm:ss" to "hh:mm".
const LONG_RUN_THRESHOLD: Duration = Duration::from_secs(2 * 3600);

/// Render an estimated remaining duration for the progress display.
///
/// - `None` (no usable rate yet) renders as "calculating".
/// - More than two hours renders as "hh:mm".
/// - Anything else renders as "mm:ss".
pub fn format_remaining(remaining: Option<Duration>) -> String {
    let Some(remaining) = remaining else {
        return "calculating".to_owned();
    };

    let total_secs = remaining.as_secs();
    if remaining > LONG_RUN_THRESHOLD {
        let hours = total_secs / 3600;
        let minutes = (total_secs % 3600) / 60;
        format!("{hours:02}:{minutes:02}")
    } else {
        let minutes = total_secs / 60;
        let seconds = total_secs % 60;
        format!("{minutes:02}:{seconds:02}")
    }
}

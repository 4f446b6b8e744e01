/// Run reports — audit exports of a sweep's reconciled results.
///
/// CSV carries the per-item partition (one row per originally selected
/// item); JSON carries the whole summary including byte totals. Both use
/// the stable lowercase disposition labels so downstream tooling never
/// sees enum variant spelling changes.
use crate::sweep::reconcile::SweepSummary;
use anyhow::Context;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::info;

/// Write the summary's entry partition as CSV to `writer`.
pub fn write_entries_csv<W: Write>(summary: &SweepSummary, writer: W) -> anyhow::Result<()> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(["path", "size_bytes", "is_dir", "disposition", "reason"])?;
    for entry in &summary.entries {
        csv.write_record(&[
            entry.path.to_string_lossy().into_owned(),
            entry.size_bytes.to_string(),
            entry.is_dir.to_string(),
            entry.disposition.as_str().to_owned(),
            entry.reason.clone(),
        ])?;
    }
    csv.flush()?;
    Ok(())
}

/// Write the full summary as pretty-printed JSON to `writer`.
pub fn write_summary_json<W: Write>(summary: &SweepSummary, writer: W) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(writer, summary)?;
    Ok(())
}

/// Export the entry partition to a CSV file at `path`.
pub fn export_entries_csv(summary: &SweepSummary, path: &Path) -> anyhow::Result<()> {
    let file = File::create(path)
        .with_context(|| format!("failed to create report file {}", path.display()))?;
    write_entries_csv(summary, file)?;
    info!("wrote {} report row(s) to {}", summary.entries.len(), path.display());
    Ok(())
}

/// Export the full summary to a JSON file at `path`.
pub fn export_summary_json(summary: &SweepSummary, path: &Path) -> anyhow::Result<()> {
    let file = File::create(path)
        .with_context(|| format!("failed to create report file {}", path.display()))?;
    write_summary_json(summary, file)?;
    info!("wrote summary report to {}", path.display());
    Ok(())
}

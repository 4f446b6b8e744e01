//! CleanSweep — bulk cleanup orchestrator.
//!
//! Thin binary entry point. All logic lives in the `cleansweep-core`
//! crate; this front end catalogues a root, reports what a sweep would
//! touch, and optionally applies it with the filesystem engine.

use cleansweep_core::cancel::CancelToken;
use cleansweep_core::catalog;
use cleansweep_core::engine::fs::FsDeletionEngine;
use cleansweep_core::engine::{
    CloseMode, DeleteOptions, ElevationPrompt, LockDetector, ResourceLockInfo,
};
use cleansweep_core::exec::ChannelExecutor;
use cleansweep_core::model::{format_remaining, format_size};
use cleansweep_core::platform::ProcessElevation;
use cleansweep_core::report;
use cleansweep_core::selection::SelectionModel;
use cleansweep_core::sweep::reconcile::SweepSummary;
use cleansweep_core::sweep::{DeletionOrchestrator, SweepEvent};
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Command line shape: `CleanSweep <root> [--apply] [--csv FILE] [--json FILE]`.
struct Args {
    root: PathBuf,
    apply: bool,
    csv: Option<PathBuf>,
    json: Option<PathBuf>,
}

fn parse_args() -> anyhow::Result<Args> {
    let mut root = None;
    let mut apply = false;
    let mut csv = None;
    let mut json = None;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--apply" => apply = true,
            "--csv" => {
                csv = Some(PathBuf::from(args.next().ok_or_else(|| {
                    anyhow::anyhow!("--csv requires a file path")
                })?));
            }
            "--json" => {
                json = Some(PathBuf::from(args.next().ok_or_else(|| {
                    anyhow::anyhow!("--json requires a file path")
                })?));
            }
            other if root.is_none() && !other.starts_with('-') => {
                root = Some(PathBuf::from(other));
            }
            other => anyhow::bail!("unrecognised argument: {other}"),
        }
    }

    Ok(Args {
        root: root
            .ok_or_else(|| anyhow::anyhow!("usage: CleanSweep <root> [--apply] [--csv FILE] [--json FILE]"))?,
        apply,
        csv,
        json,
    })
}

/// Headless stand-in: no lock detection backend is wired into the CLI.
struct NoLockDetection;

impl LockDetector for NoLockDetection {
    fn inspect(
        &self,
        _paths: &[PathBuf],
        _token: &CancelToken,
    ) -> anyhow::Result<Vec<ResourceLockInfo>> {
        Ok(Vec::new())
    }

    fn close(&self, _process_ids: &[u32], _mode: CloseMode) -> anyhow::Result<String> {
        Ok("no lock detection backend".to_owned())
    }
}

/// Headless runs never confirm elevation; rerun elevated instead.
struct DeclinePrompt;

impl ElevationPrompt for DeclinePrompt {
    fn confirm(&self, reason: &str) -> bool {
        eprintln!("elevation needed ({reason}); rerun from an elevated shell");
        false
    }
}

fn main() -> anyhow::Result<()> {
    // Initialise structured logging.
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let args = parse_args()?;
    tracing::info!("CleanSweep starting, cataloguing {}", args.root.display());

    let groups = catalog::scan_groups(&args.root, &CancelToken::new())?;
    if groups.is_empty() {
        println!("nothing to clean under {}", args.root.display());
        return Ok(());
    }

    let mut model = SelectionModel::new();
    model.replace_groups(groups);
    for index in 0..model.groups().len() {
        model.set_group_selected(index, true);
    }
    for group in model.groups() {
        println!(
            "{:<12} [{}]  {} item(s), {}",
            group.category,
            group.classification,
            group.remaining(),
            format_size(group.selected_bytes())
        );
    }
    let (count, bytes) = model.selected_totals();
    println!("total: {count} item(s), {}", format_size(bytes));

    let selection = model.shared();
    let (executor, pump) = ChannelExecutor::new();
    let done = Arc::new(AtomicBool::new(false));
    let result: Arc<Mutex<Option<SweepSummary>>> = Arc::new(Mutex::new(None));

    let listener = {
        let done = Arc::clone(&done);
        let result = Arc::clone(&result);
        Arc::new(move |event: SweepEvent| match event {
            SweepEvent::Started { total_items, total_bytes } => {
                println!("sweeping {total_items} item(s), {}", format_size(total_bytes));
            }
            SweepEvent::Progress { completed, total, remaining } => {
                println!("  {completed}/{total} ({} remaining)", format_remaining(remaining));
            }
            SweepEvent::Completed { summary } => {
                *result.lock() = Some(summary);
                done.store(true, Ordering::SeqCst);
            }
            SweepEvent::Failed { message } => {
                eprintln!("sweep failed: {message}");
                done.store(true, Ordering::SeqCst);
            }
            SweepEvent::ElevationRequested => {
                done.store(true, Ordering::SeqCst);
            }
        })
    };

    let orchestrator = DeletionOrchestrator::new(
        selection,
        Arc::new(FsDeletionEngine),
        Arc::new(NoLockDetection),
        Arc::new(ProcessElevation),
        Arc::new(DeclinePrompt),
        Arc::new(executor),
        listener,
    );

    for risk in orchestrator.assess() {
        println!("warning ({:?}): {}", risk.severity, risk.description);
    }

    if !args.apply {
        println!("dry run; pass --apply to delete");
        return Ok(());
    }

    orchestrator.start(DeleteOptions::default())?;
    while !done.load(Ordering::SeqCst) {
        pump.drain(64);
        std::thread::sleep(Duration::from_millis(10));
    }
    pump.drain(usize::MAX);

    let Some(summary) = result.lock().take() else {
        anyhow::bail!("sweep did not complete");
    };
    println!(
        "reclaimed {} across {} item(s); {} failure(s)",
        format_size(summary.reclaimed_bytes),
        summary.removed.len(),
        summary.failures.len()
    );
    for failure in &summary.failures {
        eprintln!("  failed: {} ({})", failure.path.display(), failure.reason);
    }
    if summary.pending_reboot_bytes > 0 {
        println!(
            "{} will be released on the next restart",
            format_size(summary.pending_reboot_bytes)
        );
    }

    if let Some(path) = &args.csv {
        report::export_entries_csv(&summary, path)?;
    }
    if let Some(path) = &args.json {
        report::export_summary_json(&summary, path)?;
    }

    Ok(())
}

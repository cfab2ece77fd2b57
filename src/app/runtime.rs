use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use chartfetch_core::{Pipeline, RunSummary};
use clap::Parser;
use tracing::{debug, info, warn};

use crate::ProcessExit;
use crate::app::{config_manager, exit_handler, progress_manager, terminal};
use crate::cli::Args;

const SUMMARY_FILE: &str = "summary.json";

pub(crate) async fn run() -> Result<ProcessExit> {
    // Parse before tracing so --help works without logs.
    let args = Args::parse();

    let default_level = terminal::default_log_level(args.verbose, args.quiet);
    let no_color = terminal::no_color_env_requested() || terminal::is_dumb_terminal();
    terminal::init_tracing(default_level, no_color);

    debug!(?args, "CLI arguments parsed");

    let resolved = config_manager::resolve_config(&args)?;
    let output_dir = resolved.pipeline.output_dir.clone();
    info!(
        index = %resolved.pipeline.base_url,
        output = %output_dir.display(),
        concurrency = resolved.pipeline.concurrency,
        "Chart mirror starting"
    );

    let interrupted = Arc::new(AtomicBool::new(false));
    let mut pipeline =
        Pipeline::new(resolved.pipeline)?.with_cancel_flag(Arc::clone(&interrupted));
    if !resolved.assembler.is_empty() {
        pipeline = pipeline.with_assembler(resolved.assembler);
    }

    let interrupted_signal = Arc::clone(&interrupted);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, finishing the current leaf");
            interrupted_signal.store(true, Ordering::SeqCst);
        }
    });

    let use_spinner = terminal::should_use_spinner(
        io::stderr().is_terminal(),
        args.quiet,
        terminal::is_dumb_terminal(),
    );
    let (progress_handle, progress_stop) =
        progress_manager::spawn_progress_ui(use_spinner, pipeline.progress());

    let result = pipeline.run().await;

    progress_stop.store(true, Ordering::SeqCst);
    if let Some(handle) = progress_handle {
        let _ = handle.await;
    }

    let summary = result?;

    info!(
        written = summary.documents_written,
        failed = summary.documents_failed(),
        skipped = summary.documents_skipped,
        bytes = summary.bytes_written,
        "Crawl complete"
    );

    let summary_path = args
        .summary
        .clone()
        .unwrap_or_else(|| default_summary_path(&output_dir));
    write_summary(&summary, &summary_path).await?;
    report_failures(&summary);

    if summary.interrupted {
        warn!(
            written = summary.documents_written,
            "Interrupted. Run again to fetch the remaining leaves."
        );
    }

    Ok(exit_handler::determine_exit_outcome(&summary))
}

/// `summary.json` beside the output root, so archiving the root leaves it out.
fn default_summary_path(output_dir: &Path) -> PathBuf {
    match output_dir.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.join(SUMMARY_FILE),
        _ => PathBuf::from(SUMMARY_FILE),
    }
}

async fn write_summary(summary: &RunSummary, path: &Path) -> Result<()> {
    let json = summary.to_json().context("Failed to serialize run summary")?;
    tokio::fs::write(path, json)
        .await
        .with_context(|| format!("Failed to write run summary '{}'", path.display()))?;
    info!(path = %path.display(), "Wrote run summary");
    Ok(())
}

fn report_failures(summary: &RunSummary) {
    for branch in &summary.branch_errors {
        warn!(level = branch.level, url = %branch.url, reason = %branch.reason, "Skipped branch");
    }
    for failed in &summary.errors {
        warn!(
            url = %failed.url,
            name = %failed.output_name,
            kind = ?failed.kind,
            "Document failed: {}",
            failed.message
        );
    }
    for error in &summary.finalize_errors {
        warn!(error = %error, "Finalization step failed");
    }
}

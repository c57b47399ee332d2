use crate::config::{channel_capacity, PROGRESS_INTERVAL};
use crate::filter::spawn_filter;
use crate::language::Language;
use crate::models::DumpEntry;
use crate::parser::{DumpScanner, DumpSource};
use crate::pipeline::RenderPipeline;
use crate::render::parse_endpoints;
use crate::sink;
use crate::stats::RunStats;
use anyhow::{bail, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, info};

/// Parameters for a full scan, filter, render and write run
#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub dump: PathBuf,
    pub output_dir: PathBuf,
    pub language: Language,
    pub endpoints: Vec<String>,
    pub workers: usize,
    /// Stop after this many matched entries
    pub limit: Option<u64>,
}

/// Runs the whole pipeline and returns the collected statistics.
///
/// Configuration problems, an unreadable dump, a decode error in the dump and
/// failed output writes abort the run. Entries no endpoint could render are
/// logged and dropped.
pub async fn run_fetch(config: FetchConfig) -> Result<Arc<RunStats>> {
    if config.workers == 0 {
        bail!("Worker count must be at least 1");
    }
    let endpoints = parse_endpoints(&config.endpoints)?;

    tokio::fs::create_dir_all(&config.output_dir)
        .await
        .with_context(|| {
            format!(
                "Failed to create output directory: {}",
                config.output_dir.display()
            )
        })?;

    let scanner = DumpScanner::open(&config.dump, config.language)?;
    info!(
        dump = %config.dump.display(),
        language = %config.language,
        workers = config.workers,
        "Starting fetch"
    );

    let stats = Arc::new(RunStats::new());
    let capacity = channel_capacity(config.workers);

    let (scanned, mut scan_handle) = spawn_scan(scanner, config.limit, capacity, stats.clone());
    let (filtered, filter_handle) =
        spawn_filter(scanned, config.output_dir.clone(), capacity, stats.clone());
    let mut pipeline = RenderPipeline::spawn(filtered, endpoints, config.workers, stats.clone())?;

    // A decode error ends the run at once; queued entries are abandoned.
    let mut scan_joined = false;
    loop {
        tokio::select! {
            rendered = pipeline.next() => {
                let Some(rendered) = rendered else { break };
                sink::write_rendered(&config.output_dir, &rendered).await?;
                stats.inc_written();
            }
            scanned = &mut scan_handle, if !scan_joined => {
                scan_joined = true;
                let end = join_scan(scanned)?;
                debug!(?end, "Scan finished");
            }
        }
    }
    if !scan_joined {
        join_scan(scan_handle.await)?;
    }

    pipeline.finish().await?;
    filter_handle.await.context("Filter task panicked")?;

    stats.log_summary();
    info!("Done.");
    Ok(stats)
}

/// Streams matched entries without rendering: one
/// `revision_id<TAB>section<TAB>title` line each. Returns the number listed.
pub fn run_scan(
    dump: &Path,
    language: Language,
    limit: Option<u64>,
    out: &mut impl Write,
) -> Result<u64> {
    let mut scanner = DumpScanner::open(dump, language)?;
    let limit = limit.unwrap_or(u64::MAX);
    let mut listed = 0u64;

    while listed < limit {
        let Some(entry) = scanner.next() else { break };
        let entry = entry.context("Dump scan aborted")?;
        writeln!(out, "{}\t{}\t{}", entry.revision_id, entry.section, entry.title)
            .context("Failed to write entry listing")?;
        listed += 1;
    }
    out.flush().context("Failed to flush entry listing")?;

    info!(
        revisions = scanner.revisions_scanned(),
        listed, "Done reading dump"
    );
    Ok(listed)
}

/// Why the scan stage stopped feeding entries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanEnd {
    /// The dump had no more revisions
    Exhausted,
    /// `--limit` entries were handed on
    LimitReached,
    /// The next stage stopped receiving
    Closed,
}

fn join_scan(joined: Result<Result<ScanEnd>, JoinError>) -> Result<ScanEnd> {
    joined
        .context("Scan task panicked")?
        .context("Dump scan aborted")
}

fn spawn_scan(
    scanner: DumpScanner<DumpSource>,
    limit: Option<u64>,
    capacity: usize,
    stats: Arc<RunStats>,
) -> (mpsc::Receiver<DumpEntry>, JoinHandle<Result<ScanEnd>>) {
    let (tx, rx) = mpsc::channel(capacity);
    let handle = tokio::task::spawn_blocking(move || scan_into(scanner, limit, &tx, &stats));
    (rx, handle)
}

/// Feeds matched entries into `tx`, blocking while the next stage is busy.
fn scan_into<R: BufRead>(
    mut scanner: DumpScanner<R>,
    limit: Option<u64>,
    tx: &mpsc::Sender<DumpEntry>,
    stats: &RunStats,
) -> Result<ScanEnd> {
    let pb = make_spinner("Scanning dump");
    let limit = limit.unwrap_or(u64::MAX);
    let mut matched = 0u64;
    let mut last_tick = 0u64;

    let outcome = loop {
        if matched >= limit {
            info!(limit, "Entry limit reached");
            break Ok(ScanEnd::LimitReached);
        }
        let entry = match scanner.next() {
            Some(Ok(entry)) => entry,
            Some(Err(e)) => break Err(e),
            None => break Ok(ScanEnd::Exhausted),
        };

        matched += 1;
        stats.inc_matched();
        if tx.blocking_send(entry).is_err() {
            debug!("Filter stage closed, stopping scan");
            break Ok(ScanEnd::Closed);
        }

        if crossed_interval(&mut last_tick, scanner.revisions_scanned()) {
            pb.set_message(format!(
                "Scanning dump: {} matched in {} revisions",
                matched,
                scanner.revisions_scanned()
            ));
        }
    };

    stats.set_revisions(scanner.revisions_scanned());
    pb.finish_and_clear();
    info!(
        revisions = scanner.revisions_scanned(),
        matched, "Done reading dump"
    );
    outcome
}

/// True once `revisions` has passed another `PROGRESS_INTERVAL` boundary since
/// the last report.
fn crossed_interval(last_tick: &mut u64, revisions: u64) -> bool {
    let tick = revisions / PROGRESS_INTERVAL;
    if tick > *last_tick {
        *last_tick = tick;
        true
    } else {
        false
    }
}

fn make_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap(),
    );
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb.set_message(msg.to_string());
    pb
}

use crate::models::DumpEntry;
use crate::sink::output_path;
use crate::stats::RunStats;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// True when a non-empty regular file already sits at `path`.
///
/// A zero-byte file is left over from a failed write and does not count.
pub async fn is_materialized(path: &Path) -> bool {
    match tokio::fs::metadata(path).await {
        Ok(meta) => meta.is_file() && meta.len() > 0,
        Err(_) => false,
    }
}

/// Forwards entries whose output is not yet on disk and drops the rest.
///
/// The returned receiver closes once `entries` closes, or as soon as the
/// downstream receiver is dropped.
pub fn spawn_filter(
    mut entries: mpsc::Receiver<DumpEntry>,
    output_dir: PathBuf,
    capacity: usize,
    stats: Arc<RunStats>,
) -> (mpsc::Receiver<DumpEntry>, JoinHandle<()>) {
    let (tx, rx) = mpsc::channel(capacity);

    let handle = tokio::spawn(async move {
        while let Some(entry) = entries.recv().await {
            let path = output_path(&output_dir, &entry.revision_id);
            if is_materialized(&path).await {
                stats.inc_skipped();
                info!(path = %path.display(), "Already exists, skipped");
                continue;
            }

            debug!(path = %path.display(), "To download");
            stats.inc_queued();
            if tx.send(entry).await.is_err() {
                debug!("Render stage closed, stopping filter");
                break;
            }
        }
    });

    (rx, handle)
}

use crate::config::channel_capacity;
use crate::models::{DumpEntry, RenderedEntry};
use crate::render::Renderer;
use crate::stats::RunStats;
use anyhow::{bail, Context, Result};
use futures::stream::{FuturesUnordered, StreamExt};
use reqwest::Url;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// A fixed pool of render workers fed from one entry channel.
///
/// Output order is unspecified across workers. The output channel closes only
/// after every worker has returned: workers each hold a sender, and the
/// supervisor holds one more that it releases only once all worker tasks have
/// been joined.
pub struct RenderPipeline {
    output: mpsc::Receiver<RenderedEntry>,
    supervisor: JoinHandle<Result<()>>,
}

impl RenderPipeline {
    pub fn spawn(
        entries: mpsc::Receiver<DumpEntry>,
        endpoints: Arc<[Url]>,
        workers: usize,
        stats: Arc<RunStats>,
    ) -> Result<Self> {
        if workers == 0 {
            bail!("Worker count must be at least 1");
        }

        let renderers = (0..workers)
            .map(|_| Renderer::new(endpoints.clone()))
            .collect::<Result<Vec<_>>>()?;

        let (tx, output) = mpsc::channel(channel_capacity(workers));
        let inbox = Arc::new(Mutex::new(entries));

        let handles = FuturesUnordered::new();
        for (id, renderer) in renderers.into_iter().enumerate() {
            handles.push(tokio::spawn(run_worker(
                id,
                renderer,
                inbox.clone(),
                tx.clone(),
                stats.clone(),
            )));
        }

        info!(workers, endpoints = endpoints.len(), "Render workers started");
        let supervisor = tokio::spawn(supervise(handles, tx, workers));

        Ok(Self { output, supervisor })
    }

    /// Next rendered entry, or `None` once every worker has finished.
    pub async fn next(&mut self) -> Option<RenderedEntry> {
        self.output.recv().await
    }

    /// Waits for the supervisor. Dropping the output first stops workers that
    /// are blocked on a send or idle waiting for more input.
    pub async fn finish(self) -> Result<()> {
        let Self { output, supervisor } = self;
        drop(output);
        supervisor.await.context("Render supervisor panicked")?
    }
}

async fn supervise(
    mut handles: FuturesUnordered<JoinHandle<()>>,
    tx: mpsc::Sender<RenderedEntry>,
    workers: usize,
) -> Result<()> {
    let mut panicked = 0usize;
    while let Some(joined) = handles.next().await {
        if let Err(e) = joined {
            panicked += 1;
            error!(error = %e, "Render worker panicked");
        }
    }
    drop(tx);
    debug!(workers, "All render workers finished");

    if panicked > 0 {
        bail!("{panicked} of {workers} render workers panicked");
    }
    Ok(())
}

async fn run_worker(
    id: usize,
    renderer: Renderer,
    inbox: Arc<Mutex<mpsc::Receiver<DumpEntry>>>,
    outbox: mpsc::Sender<RenderedEntry>,
    stats: Arc<RunStats>,
) {
    debug!(worker = id, "Render worker started");
    loop {
        // Lock only for the receive so rendering runs concurrently.
        let next = tokio::select! {
            next = async { inbox.lock().await.recv().await } => next,
            _ = outbox.closed() => {
                debug!(worker = id, "Output closed, stopping worker");
                break;
            }
        };
        let Some(entry) = next else { break };

        match renderer.render(&entry, &stats).await {
            Some(rendered) => {
                stats.inc_rendered();
                if outbox.send(rendered).await.is_err() {
                    debug!(worker = id, "Output closed, stopping worker");
                    break;
                }
            }
            None => {
                stats.inc_render_failures();
                warn!(
                    title = %entry.title,
                    revision_id = %entry.revision_id,
                    "Rendering failed"
                );
            }
        }
    }
    debug!(worker = id, "Render worker finished");
}

use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;

/// Statistics collected while a fetch run streams through its stages
#[derive(Debug, Default)]
pub struct RunStats {
    pub revisions_scanned: AtomicU64,
    pub entries_matched: AtomicU64,
    pub entries_skipped: AtomicU64,
    pub entries_queued: AtomicU64,
    pub entries_rendered: AtomicU64,
    pub render_failures: AtomicU64,
    pub endpoint_failures: AtomicU64,
    pub files_written: AtomicU64,
}

impl RunStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_revisions(&self, count: u64) {
        self.revisions_scanned.store(count, Ordering::Relaxed);
    }

    pub fn inc_matched(&self) {
        self.entries_matched.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_skipped(&self) {
        self.entries_skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_queued(&self) {
        self.entries_queued.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_rendered(&self) {
        self.entries_rendered.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_render_failures(&self) {
        self.render_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_endpoint_failures(&self) {
        self.endpoint_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_written(&self) {
        self.files_written.fetch_add(1, Ordering::Relaxed);
    }

    pub fn revisions(&self) -> u64 {
        self.revisions_scanned.load(Ordering::Relaxed)
    }

    pub fn matched(&self) -> u64 {
        self.entries_matched.load(Ordering::Relaxed)
    }

    pub fn skipped(&self) -> u64 {
        self.entries_skipped.load(Ordering::Relaxed)
    }

    pub fn queued(&self) -> u64 {
        self.entries_queued.load(Ordering::Relaxed)
    }

    pub fn rendered(&self) -> u64 {
        self.entries_rendered.load(Ordering::Relaxed)
    }

    pub fn render_failed(&self) -> u64 {
        self.render_failures.load(Ordering::Relaxed)
    }

    pub fn endpoint_failed(&self) -> u64 {
        self.endpoint_failures.load(Ordering::Relaxed)
    }

    pub fn written(&self) -> u64 {
        self.files_written.load(Ordering::Relaxed)
    }

    pub fn log_summary(&self) {
        info!(
            revisions = self.revisions(),
            matched = self.matched(),
            skipped = self.skipped(),
            queued = self.queued(),
            rendered = self.rendered(),
            render_failures = self.render_failed(),
            endpoint_failures = self.endpoint_failed(),
            written = self.written(),
            "Run statistics"
        );
    }
}

/// Default number of concurrent render workers
pub const DEFAULT_WORKERS: usize = 4;

/// Queue slots per render worker; bounds how far the scanner can run ahead
pub const CHANNEL_SLOTS_PER_WORKER: usize = 2;

/// Progress update interval (tick every N revisions)
pub const PROGRESS_INTERVAL: u64 = 1000;

/// Extension of rendered output files (`<revision_id>.html`)
pub const OUTPUT_EXTENSION: &str = "html";

/// User agent sent to rendering endpoints
pub const USER_AGENT: &str = concat!(
    "wiktionary-renderer/",
    env!("CARGO_PKG_VERSION"),
    " (dump section renderer)"
);

/// Queue capacity between pipeline stages for a given worker count.
pub fn channel_capacity(workers: usize) -> usize {
    workers.max(1) * CHANNEL_SLOTS_PER_WORKER
}

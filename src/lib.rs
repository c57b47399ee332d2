//! wiktionary-renderer: per-language section rendering for Wiktionary dumps
//!
//! This crate streams a MediaWiki XML dump, finds the revisions that carry a
//! section for one language, and renders each such section to HTML through the
//! MediaWiki `action=parse` API:
//!
//! 1. **Scan** -- Stream the dump event by event and locate the language's
//!    second-level heading inside every revision text
//! 2. **Filter** -- Drop entries whose `<revision_id>.html` already exists and is
//!    non-empty, so interrupted runs pick up where they stopped
//! 3. **Render** -- A fixed pool of workers asks each endpoint in order for the
//!    section's HTML; the first clean answer wins
//! 4. **Write** -- Store each rendered section as `<revision_id>.html`
//!
//! # Architecture
//!
//! - **Streaming XML parsing** -- Never loads the dump into memory; plain and
//!   bzip2-compressed dumps are both read through quick-xml events
//! - **Bounded stages** -- Stages hand entries over bounded tokio channels, so the
//!   scanner runs at most a small multiple of the worker count ahead
//! - **Endpoint fallback** -- Transport errors, non-200 responses, undecodable JSON
//!   and Lua error spans all count as a failed attempt and move on to the next
//!   endpoint; an entry no endpoint can render is logged and dropped
//! - **Explicit completion** -- The render output closes only after every worker
//!   task has been joined
//!
//! # Key Modules
//!
//! - [`section`] -- Section ordinal lookup by whitespace-insensitive heading match
//! - [`parser`] -- Streaming dump scanner with BZ2 decompression
//! - [`filter`] -- Existing-output filter stage
//! - [`render`] -- Parse API client with endpoint fallback
//! - [`pipeline`] -- Render worker pool and completion barrier
//! - [`sink`] -- Output naming and writing
//! - [`run`] -- Stage wiring for the `fetch` and `scan` commands
//! - [`language`] -- Supported language pairs and their headings
//! - [`models`] -- `DumpEntry` and `RenderedEntry`
//! - [`stats`] -- Lock-free run counters
//! - [`config`] -- Constants
//!
//! # Example Usage
//!
//! ```bash
//! # Render Korean entries of the English Wiktionary with 8 workers
//! wiktionary-renderer fetch -d enwiktionary-latest-pages-articles.xml.bz2 \
//!     -l en-ko -u https://en.wiktionary.org/w/api.php -o out/ -w 8
//!
//! # List what would be rendered
//! wiktionary-renderer scan -d enwiktionary-latest-pages-articles.xml.bz2 -l en-ko
//! ```

pub mod config;
pub mod filter;
pub mod language;
pub mod models;
pub mod parser;
pub mod pipeline;
pub mod render;
pub mod run;
pub mod section;
pub mod sink;
pub mod stats;

/// A revision whose text contains the requested language section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpEntry {
    pub title: String,
    pub revision_id: String,
    /// 1-based section ordinal, never 0
    pub section: u32,
}

/// Rendered HTML for one `DumpEntry`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedEntry {
    pub title: String,
    pub revision_id: String,
    pub html: String,
}

impl RenderedEntry {
    pub fn from_entry(entry: &DumpEntry, html: String) -> Self {
        Self {
            title: entry.title.clone(),
            revision_id: entry.revision_id.clone(),
            html,
        }
    }
}

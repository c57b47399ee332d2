use crate::language::Language;
use crate::models::DumpEntry;
use crate::section;
use anyhow::{bail, Context, Result};
use bzip2::read::BzDecoder;
use quick_xml::events::Event;
use quick_xml::reader::Reader;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

const READ_BUFFER_SIZE: usize = 256 * 1024;

/// Boxed source so plain and bzip2 dumps share one scanner type.
pub type DumpSource = Box<dyn BufRead + Send>;

#[derive(Clone, Copy)]
enum Field {
    Title,
    RevisionId,
    Text,
}

enum Step {
    Open(String),
    Close(String),
    Skip,
    Eof,
}

/// Streams `<page>`/`<revision>` records out of a MediaWiki XML dump and yields
/// one [`DumpEntry`] per revision containing the requested language section.
///
/// Memory stays bounded by the largest single revision text, not the dump size.
/// Decode errors are fatal: the iterator yields the error once and then ends.
pub struct DumpScanner<R: BufRead> {
    reader: Reader<R>,
    buf: Vec<u8>,
    language: Language,
    open: Vec<String>,
    title: String,
    revision_id: String,
    text: String,
    revisions: u64,
    done: bool,
}

impl DumpScanner<DumpSource> {
    /// Opens a dump file; `.bz2` files are decompressed on the fly.
    pub fn open(path: impl AsRef<Path>, language: Language) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .with_context(|| format!("Failed to open wiki dump at: {}", path.display()))?;

        let source: DumpSource = if is_bz2(path) {
            Box::new(BufReader::with_capacity(
                READ_BUFFER_SIZE,
                BzDecoder::new(file),
            ))
        } else {
            Box::new(BufReader::with_capacity(READ_BUFFER_SIZE, file))
        };

        Ok(Self::from_reader(source, language))
    }
}

impl<R: BufRead> DumpScanner<R> {
    pub fn from_reader(source: R, language: Language) -> Self {
        Self {
            reader: Reader::from_reader(source),
            buf: Vec::with_capacity(64 * 1024),
            language,
            open: Vec::with_capacity(8),
            title: String::new(),
            revision_id: String::new(),
            text: String::new(),
            revisions: 0,
            done: false,
        }
    }

    /// Number of `</revision>` elements seen so far
    pub fn revisions_scanned(&self) -> u64 {
        self.revisions
    }

    /// Which field character data belongs to, judged by the open element stack.
    /// A page-level `<id>` and a contributor `<id>` are both ignored.
    fn current_field(&self) -> Option<Field> {
        let (last, rest) = self.open.split_last()?;
        match last.as_str() {
            "title" => Some(Field::Title),
            "text" => Some(Field::Text),
            "id" if rest.last().is_some_and(|parent| parent == "revision") => {
                Some(Field::RevisionId)
            }
            _ => None,
        }
    }

    fn field_mut(&mut self, field: Field) -> &mut String {
        match field {
            Field::Title => &mut self.title,
            Field::RevisionId => &mut self.revision_id,
            Field::Text => &mut self.text,
        }
    }

    fn next_entry(&mut self) -> Result<Option<DumpEntry>> {
        loop {
            let field = self.current_field();
            self.buf.clear();

            let step = match self.reader.read_event_into(&mut self.buf) {
                Ok(Event::Start(e)) => {
                    Step::Open(String::from_utf8_lossy(e.local_name().as_ref()).into_owned())
                }
                Ok(Event::End(e)) => {
                    Step::Close(String::from_utf8_lossy(e.local_name().as_ref()).into_owned())
                }
                Ok(Event::Text(e)) => {
                    if let Some(field) = field {
                        let chars = e.unescape().with_context(|| {
                            format!(
                                "Failed to unescape text at byte {}",
                                self.reader.buffer_position()
                            )
                        })?;
                        match field {
                            Field::Title => self.title.push_str(&chars),
                            Field::RevisionId => self.revision_id.push_str(&chars),
                            Field::Text => self.text.push_str(&chars),
                        }
                    }
                    Step::Skip
                }
                Ok(Event::CData(e)) => {
                    if let Some(field) = field {
                        let bytes = e.into_inner();
                        let chars = std::str::from_utf8(&bytes).with_context(|| {
                            format!(
                                "Invalid UTF-8 in CDATA at byte {}",
                                self.reader.buffer_position()
                            )
                        })?;
                        match field {
                            Field::Title => self.title.push_str(chars),
                            Field::RevisionId => self.revision_id.push_str(chars),
                            Field::Text => self.text.push_str(chars),
                        }
                    }
                    Step::Skip
                }
                Ok(Event::Eof) => Step::Eof,
                Ok(_) => Step::Skip,
                Err(e) => {
                    return Err(e).with_context(|| {
                        format!(
                            "Failed to decode dump at byte {}",
                            self.reader.buffer_position()
                        )
                    })
                }
            };

            match step {
                Step::Open(name) => {
                    match name.as_str() {
                        "page" => self.title.clear(),
                        "revision" => {
                            self.revision_id.clear();
                            self.text.clear();
                        }
                        _ => {}
                    }
                    self.open.push(name);
                    if let Some(field) = self.current_field() {
                        self.field_mut(field).clear();
                    }
                }
                Step::Close(name) => {
                    self.open.pop();
                    if name == "revision" {
                        self.revisions += 1;
                        if let Some(entry) = self.finish_revision() {
                            return Ok(Some(entry));
                        }
                    }
                }
                Step::Skip => {}
                Step::Eof => {
                    if let Some(unclosed) = self.open.last() {
                        bail!("Dump ended inside an open <{}> element", unclosed);
                    }
                    return Ok(None);
                }
            }
        }
    }

    fn finish_revision(&self) -> Option<DumpEntry> {
        let section = section::locate(&self.text, self.language)?;
        Some(DumpEntry {
            title: self.title.clone(),
            revision_id: self.revision_id.trim().to_string(),
            section,
        })
    }
}

impl<R: BufRead> Iterator for DumpScanner<R> {
    type Item = Result<DumpEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.next_entry() {
            Ok(Some(entry)) => Some(Ok(entry)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

fn is_bz2(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("bz2"))
}

//! Single-pass reader for the topic directory dump.
//!
//! The dump is an RDF document of `ExternalPage` elements:
//!
//! ```xml
//! <ExternalPage about="http://animation.about.com/">
//!   <d:Title>About.com: Animation Guide</d:Title>
//!   <d:Description>Keep up with developments in online animation.</d:Description>
//!   <topic>Top/Arts/Animation</topic>
//! </ExternalPage>
//! ```
//!
//! Fields are collected straight from the event stream while inside a page, so
//! a matched page is never re-parsed and nothing outside the current page is
//! kept in memory.

use crate::models::PageRecord;
use anyhow::{Context, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use std::io::BufRead;
use tracing::{debug, trace};

const PAGE_TAG: &[u8] = b"ExternalPage";
const URL_ATTR: &[u8] = b"about";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Title,
    Description,
    Topic,
}

impl Field {
    /// Matches on the local name so `d:Title` and `Title` are the same field.
    fn from_local_name(name: &[u8]) -> Option<Self> {
        match name {
            b"Title" => Some(Field::Title),
            b"Description" => Some(Field::Description),
            b"topic" => Some(Field::Topic),
            _ => None,
        }
    }
}

#[derive(Default)]
struct PageBuilder {
    url: Option<String>,
    topic: Option<String>,
    title: Option<String>,
    description: Option<String>,
    broken: bool,
}

impl PageBuilder {
    fn open(start: &BytesStart) -> Self {
        let url = match start.try_get_attribute(URL_ATTR) {
            Ok(Some(attr)) => attr
                .unescape_value()
                .ok()
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty()),
            _ => None,
        };
        Self {
            url,
            ..Self::default()
        }
    }

    /// First occurrence of each field wins; empty text leaves the field unset.
    fn set(&mut self, field: Field, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        let slot = match field {
            Field::Title => &mut self.title,
            Field::Description => &mut self.description,
            Field::Topic => &mut self.topic,
        };
        if slot.is_none() {
            *slot = Some(text.to_string());
        }
    }

    /// A page without a URL or a topic cannot be merged anywhere.
    fn finish(self) -> Option<PageRecord> {
        if self.broken {
            return None;
        }
        Some(PageRecord {
            url: self.url?,
            topic: self.topic?,
            title: self.title,
            description: self.description,
        })
    }
}

/// Per-page parse state, kept apart from the event buffer it reads from.
#[derive(Default)]
struct PageState {
    page: Option<PageBuilder>,
    field: Option<Field>,
    text: String,
    malformed: u64,
}

impl PageState {
    fn start(&mut self, start: &BytesStart) {
        let name = start.local_name();
        if name.as_ref() == PAGE_TAG {
            if self.page.take().is_some() {
                debug!("Unterminated page followed by a new page");
                self.malformed += 1;
            }
            self.page = Some(PageBuilder::open(start));
            self.field = None;
        } else if self.page.is_some() && self.field.is_none() {
            if let Some(field) = Field::from_local_name(name.as_ref()) {
                self.field = Some(field);
                self.text.clear();
            }
        }
    }

    /// `<ExternalPage about="..."/>` has no topic, so it is always malformed.
    fn empty(&mut self, start: &BytesStart) {
        if start.local_name().as_ref() == PAGE_TAG {
            self.malformed += 1;
        }
    }

    fn text(&mut self, text: &str) {
        if self.field.is_none() {
            return;
        }
        self.text.push_str(text);
    }

    fn broken_text(&mut self) {
        if let (Some(page), Some(_)) = (self.page.as_mut(), self.field) {
            page.broken = true;
        }
    }

    fn end(&mut self, local_name: &[u8]) -> Option<PageRecord> {
        if local_name == PAGE_TAG {
            self.field = None;
            let page = self.page.take()?;
            let record = page.finish();
            if record.is_none() {
                self.malformed += 1;
            }
            return record;
        }

        if let Some(field) = self.field {
            if Field::from_local_name(local_name) == Some(field) {
                if let Some(page) = self.page.as_mut() {
                    page.set(field, &self.text);
                }
                self.field = None;
            }
        }
        None
    }
}

/// Streams `PageRecord`s out of a topic directory dump.
///
/// Malformed pages (no `about` URL, no topic, undecodable field text) are
/// skipped and counted in [`TopicReader::malformed`]. XML syntax errors end the
/// stream with an error.
pub struct TopicReader<R> {
    reader: Reader<R>,
    buf: Vec<u8>,
    source: String,
    state: PageState,
    done: bool,
}

impl<R: BufRead> TopicReader<R> {
    pub fn new(inner: R, source: impl Into<String>) -> Self {
        let mut reader = Reader::from_reader(inner);
        // Field text is trimmed as a whole in `PageBuilder::set`; trimming each
        // event would eat the spaces around comments inside a field
        reader.trim_text(false);
        Self {
            reader,
            buf: Vec::with_capacity(64 * 1024),
            source: source.into(),
            state: PageState::default(),
            done: false,
        }
    }

    /// Pages skipped so far because they could not be turned into a record
    pub fn malformed(&self) -> u64 {
        self.state.malformed
    }

    fn read_page(&mut self) -> Result<Option<PageRecord>> {
        loop {
            self.buf.clear();
            let event = self.reader.read_event_into(&mut self.buf).with_context(|| {
                format!(
                    "Failed to parse topic source {} at byte {}",
                    self.source,
                    self.reader.buffer_position()
                )
            })?;

            match event {
                Event::Start(e) => self.state.start(&e),
                Event::Empty(e) => self.state.empty(&e),
                Event::Text(e) => match e.unescape() {
                    Ok(text) => self.state.text(&text),
                    Err(err) => {
                        trace!(error = %err, "Undecodable text in topic page");
                        self.state.broken_text();
                    }
                },
                Event::CData(e) => self.state.text(&String::from_utf8_lossy(&e)),
                Event::End(e) => {
                    if let Some(page) = self.state.end(e.local_name().as_ref()) {
                        return Ok(Some(page));
                    }
                }
                Event::Eof => {
                    if self.state.page.take().is_some() {
                        debug!("Topic source ended inside a page");
                        self.state.malformed += 1;
                    }
                    return Ok(None);
                }
                _ => {}
            }
        }
    }
}

impl<R: BufRead> Iterator for TopicReader<R> {
    type Item = Result<PageRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.read_page() {
            Ok(Some(page)) => Some(Ok(page)),
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

//! MSBuild project version (`vs`).
//!
//! Streams the project file token by token and copies everything through
//! verbatim, except the content of `<Version>` elements sitting directly in
//! a `<PropertyGroup>`, which is replaced with the bare version:
//!
//! ```xml
//! <Project Sdk="Microsoft.NET.Sdk">
//!   <PropertyGroup>
//!     <Version>1.4.0</Version>
//!   </PropertyGroup>
//! </Project>
//! ```
//!
//! Element names are matched on their local part, so `<msb:Version>` counts.

use camino::Utf8Path;
use quick_xml::events::{BytesStart, BytesText, Event};
use quick_xml::reader::Reader;
use quick_xml::writer::Writer;
use tracing::{debug, instrument, trace};

use super::{WriteError, WriteResult, require_target, write_target};
use crate::record::VersionRecord;

const PROPERTY_GROUP: &[u8] = b"PropertyGroup";
const VERSION: &[u8] = b"Version";
const UTF8_BOM: char = '\u{feff}';

/// Pull-based stream of XML events over a borrowed document.
///
/// Yields every event up to (not including) end of input, then `None`.
/// After an error the stream is exhausted.
pub struct Tokens<'a> {
    reader: Reader<&'a [u8]>,
    finished: bool,
}

impl<'a> Tokens<'a> {
    /// Start streaming `xml`.
    pub fn new(xml: &'a str) -> Self {
        Self {
            reader: Reader::from_str(xml),
            finished: false,
        }
    }

    /// Consume everything up to and including the end tag matching `start`.
    ///
    /// # Errors
    ///
    /// Fails if the element is never closed.
    pub fn skip_element(&mut self, start: &BytesStart<'_>) -> Result<(), quick_xml::Error> {
        self.reader.read_to_end(start.name())?;
        Ok(())
    }
}

impl<'a> Iterator for Tokens<'a> {
    type Item = Result<Event<'a>, quick_xml::Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.reader.read_event() {
            Ok(Event::Eof) => {
                self.finished = true;
                None
            }
            Ok(event) => Some(Ok(event)),
            Err(err) => {
                self.finished = true;
                Some(Err(err))
            }
        }
    }
}

/// Emits tokens and tracks which element encloses the current position.
struct Rewriter {
    writer: Writer<Vec<u8>>,
    open: Vec<Vec<u8>>,
    rewritten: usize,
}

impl Rewriter {
    fn new() -> Self {
        Self {
            writer: Writer::new(Vec::new()),
            open: Vec::new(),
            rewritten: 0,
        }
    }

    fn emit(&mut self, event: Event<'_>) -> WriteResult<()> {
        self.writer.write_event(event).map_err(WriteError::Emit)
    }

    /// A `Version` element whose parent is a `PropertyGroup`.
    fn is_version_slot(&self, start: &BytesStart<'_>) -> bool {
        start.local_name().as_ref() == VERSION
            && self
                .open
                .last()
                .is_some_and(|parent| parent.as_slice() == PROPERTY_GROUP)
    }

    fn emit_version(&mut self, start: BytesStart<'_>, version: &str) -> WriteResult<()> {
        let end = start.to_end().into_owned();
        self.emit(Event::Start(start))?;
        self.emit(Event::Text(BytesText::new(version)))?;
        self.emit(Event::End(end))?;
        self.rewritten += 1;
        Ok(())
    }
}

/// Rewrite every `PropertyGroup/Version` in `xml` to `version`.
///
/// Returns the new document and the number of elements rewritten. A leading
/// UTF-8 byte-order mark is preserved.
///
/// # Errors
///
/// Returns [`WriteError::Xml`] for malformed input and [`WriteError::Emit`]
/// if output cannot be produced.
pub fn patch(xml: &str, version: &str) -> WriteResult<(Vec<u8>, usize)> {
    let (bom, body) = xml
        .strip_prefix(UTF8_BOM)
        .map_or(("", xml), |rest| ("\u{feff}", rest));

    let mut tokens = Tokens::new(body);
    let mut out = Rewriter::new();

    while let Some(token) = tokens.next() {
        match token? {
            Event::Start(start) if out.is_version_slot(&start) => {
                tokens.skip_element(&start)?;
                out.emit_version(start, version)?;
            }
            Event::Empty(start) if out.is_version_slot(&start) => {
                out.emit_version(start, version)?;
            }
            Event::Start(start) => {
                out.open.push(start.local_name().as_ref().to_vec());
                out.emit(Event::Start(start))?;
            }
            Event::End(end) => {
                out.open.pop();
                out.emit(Event::End(end))?;
            }
            other => out.emit(other)?,
        }
    }

    trace!(rewritten = out.rewritten, "xml stream finished");
    let mut bytes = bom.as_bytes().to_vec();
    bytes.extend(out.writer.into_inner());
    Ok((bytes, out.rewritten))
}

/// Set the bare version in the MSBuild project at `path`.
///
/// # Errors
///
/// A missing file, content that is not UTF-8, or malformed XML is a soft
/// error. Failing to open the file, or to emit the rewritten document, is
/// fatal (see [`WriteError::is_fatal`]).
#[instrument(skip(record), fields(version = %record.bare_string()))]
pub fn write(record: &VersionRecord, path: &Utf8Path) -> WriteResult<()> {
    require_target(path)?;
    let bytes = std::fs::read(path).map_err(|source| WriteError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let content = String::from_utf8(bytes).map_err(|source| WriteError::Encoding {
        path: path.to_path_buf(),
        source,
    })?;

    let (patched, rewritten) = patch(&content, &record.bare_string())?;
    write_target(path, patched)?;
    debug!(rewritten, "project version rewritten");
    Ok(())
}

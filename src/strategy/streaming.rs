//! Streaming Record Scanner
//!
//! Single forward pass over a document that yields every product record
//! (an `item` directly under `items`) at its close tag, in document order.
//! Memory stays bounded by nesting depth plus the size of the record being
//! captured; nothing outside a record is materialized.

use std::io::Read;

use log::debug;

use crate::catalog::path::PathTracker;
use crate::catalog::record::RecordElement;
use crate::error::{CatalogError, Result};
use crate::reader::events::{StartElement, XmlEvent};
use crate::reader::stream::StreamReader;

/// How much of each record the scanner materializes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capture {
    /// Tag only, for counting
    None,
    /// The record's own attributes, no children
    Attributes,
    /// The full element subtree of the record
    Subtree,
}

/// Iterator over the product records of one document
pub struct StreamingScanner<R: Read> {
    reader: StreamReader<R>,
    path: PathTracker,
    capture: Capture,
    /// Elements being captured, outermost first
    building: Vec<RecordElement>,
    records: u64,
    done: bool,
}

impl<R: Read> StreamingScanner<R> {
    pub fn new(reader: R, origin: impl Into<String>, capture: Capture) -> Result<Self> {
        Ok(StreamingScanner {
            reader: StreamReader::new(reader, origin)?,
            path: PathTracker::new(),
            capture,
            building: Vec::new(),
            records: 0,
            done: false,
        })
    }

    /// Records yielded so far
    pub fn records_seen(&self) -> u64 {
        self.records
    }

    /// Bytes pulled from the source so far
    pub fn bytes_read(&self) -> u64 {
        self.reader.bytes_read()
    }

    /// Pull events until the next record closes
    fn advance(&mut self) -> Result<Option<RecordElement>> {
        while let Some(event) = self.reader.next_event()? {
            let record = match event {
                XmlEvent::StartElement(start) => {
                    self.on_start(start);
                    None
                }
                XmlEvent::EmptyElement(start) => {
                    let tag = start.name.clone();
                    self.on_start(start);
                    self.on_end(&tag)?
                }
                XmlEvent::EndElement(end) => self.on_end(&end.name)?,
            };
            if record.is_some() {
                self.records += 1;
                return Ok(record);
            }
        }
        Ok(None)
    }

    fn on_start(&mut self, start: StartElement) {
        let is_record = self.path.opens_record(&start.name);
        self.path.open(&start.name);

        let capture = match self.capture {
            Capture::None => false,
            Capture::Attributes => is_record,
            Capture::Subtree => is_record || !self.building.is_empty(),
        };
        if capture {
            self.building
                .push(RecordElement::new(start.name, start.attributes));
        }
    }

    fn on_end(&mut self, tag: &str) -> Result<Option<RecordElement>> {
        let qualifying = self
            .path
            .close(tag)
            .map_err(|message| CatalogError::malformed(message, self.reader.offset()))?;

        match self.capture {
            Capture::None => Ok(qualifying.then(|| RecordElement::new(tag, Vec::new()))),
            Capture::Attributes => Ok(if qualifying { self.building.pop() } else { None }),
            Capture::Subtree => {
                let Some(element) = self.building.pop() else {
                    return Ok(None);
                };
                let parent = self.building.last_mut();
                if qualifying {
                    // A record nested in another record is yielded on its own
                    if let Some(parent) = parent {
                        parent.children.push(element.stub());
                    }
                    Ok(Some(element))
                } else {
                    if let Some(parent) = parent {
                        parent.children.push(element);
                    }
                    Ok(None)
                }
            }
        }
    }
}

impl<R: Read> Iterator for StreamingScanner<R> {
    type Item = Result<RecordElement>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.advance() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
                self.done = true;
                debug!(
                    "scan of {} complete: {} records, {} bytes",
                    self.reader.origin(),
                    self.records,
                    self.reader.bytes_read()
                );
                None
            }
            Err(e) => {
                self.done = true;
                debug!("scan of {} failed: {e}", self.reader.origin());
                Some(Err(e))
            }
        }
    }
}

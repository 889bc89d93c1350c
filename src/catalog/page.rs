//! Offset/limit windows over the qualifying records of a scan.

use log::trace;

use crate::error::Result;

/// Half-open window `[start, start + limit)`; `limit: None` is unbounded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Page {
    pub start: usize,
    pub limit: Option<usize>,
}

impl Page {
    pub fn new(start: usize, limit: Option<usize>) -> Self {
        Page { start, limit }
    }

    /// Every record
    pub fn all() -> Self {
        Page::default()
    }

    /// The first `limit` records
    pub fn first(limit: usize) -> Self {
        Page::new(0, Some(limit))
    }

    /// Index one past the last record of the window
    pub fn end(&self) -> Option<usize> {
        self.limit.map(|limit| self.start.saturating_add(limit))
    }

    pub fn contains(&self, index: usize) -> bool {
        index >= self.start && self.end().map_or(true, |end| index < end)
    }
}

/// Applies a [`Page`] to a stream of records.
///
/// Records before the window are pulled and dropped; once the window is full
/// the inner stream is dropped without being pulled again, which ends the
/// scan and releases the source. Errors pass through as they arrive.
pub struct Paged<I> {
    inner: Option<I>,
    page: Page,
    seen: usize,
}

impl<I> Paged<I> {
    pub fn new(inner: I, page: Page) -> Self {
        Paged {
            inner: Some(inner),
            page,
            seen: 0,
        }
    }

    /// Qualifying records pulled so far, inside the window or not
    pub fn seen(&self) -> usize {
        self.seen
    }
}

impl<I, T> Iterator for Paged<I>
where
    I: Iterator<Item = Result<T>>,
{
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(end) = self.page.end().filter(|&end| self.seen >= end) {
                if self.inner.take().is_some() {
                    trace!(
                        "page {}..{} filled after {} records, stopping scan",
                        self.page.start,
                        end,
                        self.seen
                    );
                }
                return None;
            }

            match self.inner.as_mut()?.next() {
                Some(Ok(item)) => {
                    let index = self.seen;
                    self.seen += 1;
                    if index >= self.page.start {
                        return Some(Ok(item));
                    }
                }
                Some(Err(e)) => return Some(Err(e)),
                None => {
                    self.inner = None;
                    return None;
                }
            }
        }
    }
}

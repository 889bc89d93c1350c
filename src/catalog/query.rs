//! Catalog queries.
//!
//! Every query opens its source, drives one scan and returns. Bounded pages
//! stop reading as soon as the last record of the window has been seen.

use log::debug;

use super::page::{Page, Paged};
use super::record::{
    extract_name_and_image, extract_parts, spare_parts_entry, Product, RecordElement, SpareParts,
};
use super::source::Source;
use crate::error::Result;
use crate::strategy::streaming::{Capture, StreamingScanner};

fn scan<S: Source>(source: S, capture: Capture) -> Result<StreamingScanner<S::Reader>> {
    let origin = source.describe();
    let reader = source.open()?;
    debug!("opened {origin} for {capture:?} scan");
    StreamingScanner::new(reader, origin, capture)
}

/// Map records through `select`, dropping those it rejects and passing
/// errors through
fn keep<I, T, F>(records: I, mut select: F) -> impl Iterator<Item = Result<T>>
where
    I: Iterator<Item = Result<RecordElement>>,
    F: FnMut(RecordElement) -> Option<T>,
{
    records.filter_map(move |record| record.map(&mut select).transpose())
}

/// Number of product records, named or not.
pub fn count_products<S: Source>(source: S) -> Result<usize> {
    scan(source, Capture::None)?.try_fold(0, |count, record| record.map(|_| count + 1))
}

/// Number of product records listing at least one named spare part.
pub fn count_spare_parts<S: Source>(source: S) -> Result<usize> {
    scan(source, Capture::Subtree)?.try_fold(0, |count, record| {
        record.map(|r| count + usize::from(!extract_parts(&r).is_empty()))
    })
}

/// Lazily yield the named products inside `page`.
///
/// Records without a non-empty name are not part of the indexed sequence.
/// Dropping the iterator stops the scan and closes the source.
pub fn product_names<S: Source>(
    source: S,
    page: Page,
) -> Result<impl Iterator<Item = Result<Product>>> {
    let records = scan(source, Capture::Attributes)?;
    let products = keep(records, |record| extract_name_and_image(&record).into_product());
    Ok(Paged::new(products, page))
}

/// Lazily yield `(product name, spare parts)` for part-bearing products
/// inside `page`.
pub fn spare_parts<S: Source>(
    source: S,
    page: Page,
) -> Result<impl Iterator<Item = Result<(String, SpareParts)>>> {
    let records = scan(source, Capture::Subtree)?;
    let entries = keep(records, |record| spare_parts_entry(&record));
    Ok(Paged::new(entries, page))
}

pub fn list_product_names<S: Source>(source: S, page: Page) -> Result<Vec<Product>> {
    product_names(source, page)?.collect()
}

pub fn list_spare_parts<S: Source>(source: S, page: Page) -> Result<Vec<(String, SpareParts)>> {
    spare_parts(source, page)?.collect()
}

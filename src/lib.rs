//! catalogxml - Streaming product-catalog extraction
//!
//! Reads a catalog export in one forward pass with bounded memory and
//! answers four questions about it: how many products there are, how many
//! carry spare parts, and paginated listings of product names and spare
//! parts.
//!
//! Layers:
//! - core: markup scanner, tokenizer, attribute/entity/encoding handling
//! - reader: buffered byte source and the element event stream
//! - strategy: the record scanner (streaming) and parallel queries
//! - catalog: path tracking, record extraction, pagination and the queries
//!
//! The crate also builds as an Erlang NIF library exposing the queries.

use rustler::{Encoder, Env, NifResult, ResourceArc, Term};

pub mod catalog;
pub mod config;
pub mod core;
pub mod error;
pub mod reader;
mod resource;
pub mod strategy;
mod term;

// Queries live in `catalog`; the crate root holds the NIFs of the same names
pub use catalog::{FromReader, Page, Product, Source, SpareParts};
pub use config::CatalogConfig;
pub use error::{CatalogError, ErrorKind};

use resource::{CursorItem, CursorRef, CursorResource};
use term::{
    batch_to_term, error_to_term, ok_tuple, products_to_term, spare_parts_list_to_term,
    summary_to_term,
};

// ============================================================================
// Allocator Configuration
// ============================================================================

#[cfg(feature = "memory_tracking")]
mod tracking {
    use std::alloc::{GlobalAlloc, Layout};
    use std::sync::atomic::{AtomicUsize, Ordering};

    pub static ALLOCATED: AtomicUsize = AtomicUsize::new(0);
    pub static PEAK_ALLOCATED: AtomicUsize = AtomicUsize::new(0);

    pub struct TrackingAllocator;

    #[cfg(feature = "mimalloc")]
    static UNDERLYING: mimalloc::MiMalloc = mimalloc::MiMalloc;

    #[cfg(not(feature = "mimalloc"))]
    static UNDERLYING: std::alloc::System = std::alloc::System;

    unsafe impl GlobalAlloc for TrackingAllocator {
        unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
            let ptr = UNDERLYING.alloc(layout);
            if !ptr.is_null() {
                let current = ALLOCATED.fetch_add(layout.size(), Ordering::Relaxed) + layout.size();
                let mut peak = PEAK_ALLOCATED.load(Ordering::Relaxed);
                while current > peak {
                    match PEAK_ALLOCATED.compare_exchange_weak(
                        peak,
                        current,
                        Ordering::Relaxed,
                        Ordering::Relaxed,
                    ) {
                        Ok(_) => break,
                        Err(p) => peak = p,
                    }
                }
            }
            ptr
        }

        unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
            ALLOCATED.fetch_sub(layout.size(), Ordering::Relaxed);
            UNDERLYING.dealloc(ptr, layout)
        }
    }
}

#[cfg(feature = "memory_tracking")]
#[global_allocator]
static GLOBAL: tracking::TrackingAllocator = tracking::TrackingAllocator;

#[cfg(all(feature = "mimalloc", not(feature = "memory_tracking")))]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

// ============================================================================
// Memory Tracking NIFs
// ============================================================================

#[cfg(feature = "memory_tracking")]
use std::sync::atomic::Ordering;

#[cfg(feature = "memory_tracking")]
#[rustler::nif]
fn get_rust_memory() -> usize {
    tracking::ALLOCATED.load(Ordering::SeqCst)
}

#[cfg(feature = "memory_tracking")]
#[rustler::nif]
fn get_rust_memory_peak() -> usize {
    tracking::PEAK_ALLOCATED.load(Ordering::SeqCst)
}

#[cfg(feature = "memory_tracking")]
#[rustler::nif]
fn reset_rust_memory_stats() -> (usize, usize) {
    let current = tracking::ALLOCATED.load(Ordering::SeqCst);
    let peak = tracking::PEAK_ALLOCATED.swap(current, Ordering::SeqCst);
    (current, peak)
}

#[cfg(not(feature = "memory_tracking"))]
#[rustler::nif]
fn get_rust_memory() -> usize {
    0
}

#[cfg(not(feature = "memory_tracking"))]
#[rustler::nif]
fn get_rust_memory_peak() -> usize {
    0
}

#[cfg(not(feature = "memory_tracking"))]
#[rustler::nif]
fn reset_rust_memory_stats() -> (usize, usize) {
    (0, 0)
}

// ============================================================================
// Catalog Queries
// ============================================================================

/// Encode a query outcome as `{:ok, value}` or `{:error, {kind, message}}`
fn reply<'a, T>(
    env: Env<'a>,
    outcome: error::Result<T>,
    encode: impl FnOnce(Env<'a>, T) -> NifResult<Term<'a>>,
) -> NifResult<Term<'a>> {
    match outcome {
        Ok(value) => Ok(ok_tuple(env, encode(env, value)?)),
        Err(e) => Ok(error_to_term(env, &e)),
    }
}

/// Export path from `CATALOG_EXPORT_PATH`, or the built-in default
#[rustler::nif]
fn default_export_path() -> String {
    CatalogConfig::from_env().source().display().to_string()
}

#[rustler::nif(schedule = "DirtyIo")]
fn count_products<'a>(env: Env<'a>, path: String) -> NifResult<Term<'a>> {
    reply(env, catalog::count_products(path), |env, n| Ok(n.encode(env)))
}

#[rustler::nif(schedule = "DirtyIo")]
fn count_spare_parts<'a>(env: Env<'a>, path: String) -> NifResult<Term<'a>> {
    reply(env, catalog::count_spare_parts(path), |env, n| Ok(n.encode(env)))
}

/// `limit` of nil means every record from `start` on
#[rustler::nif(schedule = "DirtyIo")]
fn list_product_names<'a>(
    env: Env<'a>,
    path: String,
    start: usize,
    limit: Option<usize>,
) -> NifResult<Term<'a>> {
    let page = Page::new(start, limit);
    reply(env, catalog::list_product_names(path, page), |env, products| {
        products_to_term(env, &products)
    })
}

#[rustler::nif(schedule = "DirtyIo")]
fn list_spare_parts<'a>(
    env: Env<'a>,
    path: String,
    start: usize,
    limit: Option<usize>,
) -> NifResult<Term<'a>> {
    let page = Page::new(start, limit);
    reply(env, catalog::list_spare_parts(path, page), |env, entries| {
        spare_parts_list_to_term(env, &entries)
    })
}

/// Product and spare-part totals, computed in parallel
#[rustler::nif(schedule = "DirtyIo")]
fn summary<'a>(env: Env<'a>, path: String) -> NifResult<Term<'a>> {
    reply(env, strategy::parallel::summarize(path), |env, summary| {
        summary_to_term(env, &summary)
    })
}

// ============================================================================
// Cursors
// ============================================================================

/// Open a cursor over named products. The source is opened here so a
/// missing file is reported immediately.
#[rustler::nif(schedule = "DirtyIo")]
fn names_cursor<'a>(
    env: Env<'a>,
    path: String,
    start: usize,
    limit: Option<usize>,
) -> NifResult<Term<'a>> {
    let stream = catalog::product_names(path, Page::new(start, limit))
        .map(|records| records.map(|r| r.map(CursorItem::Product)));
    reply(env, stream, |env, stream| {
        let cursor: CursorRef = ResourceArc::new(CursorResource::new(stream));
        Ok(cursor.encode(env))
    })
}

#[rustler::nif(schedule = "DirtyIo")]
fn parts_cursor<'a>(
    env: Env<'a>,
    path: String,
    start: usize,
    limit: Option<usize>,
) -> NifResult<Term<'a>> {
    let stream = catalog::spare_parts(path, Page::new(start, limit)).map(|records| {
        records.map(|r| r.map(|(name, spare)| CursorItem::SpareParts(name, spare)))
    });
    reply(env, stream, |env, stream| {
        let cursor: CursorRef = ResourceArc::new(CursorResource::new(stream));
        Ok(cursor.encode(env))
    })
}

/// Pull up to `max` records: `{:ok, records, :more | :done}`
#[rustler::nif(schedule = "DirtyIo")]
fn cursor_take<'a>(env: Env<'a>, cursor: CursorRef, max: usize) -> NifResult<Term<'a>> {
    match cursor.take(max) {
        Ok(batch) => batch_to_term(env, &batch.items, batch.done),
        Err(e) => Ok(error_to_term(env, &e)),
    }
}

// ============================================================================
// NIF Initialization
// ============================================================================

// CursorResource registers itself through #[rustler::resource_impl]
rustler::init!("Elixir.CatalogXml.Native");

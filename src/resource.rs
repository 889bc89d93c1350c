//! ResourceArc Wrappers
//!
//! Persistent state for cursors that hand out a query's results in batches.

use std::sync::{Mutex, PoisonError};

use rustler::ResourceArc;

use crate::catalog::{Product, SpareParts};
use crate::error::Result;

/// One record handed out by a cursor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CursorItem {
    Product(Product),
    SpareParts(String, SpareParts),
}

type CursorStream = Box<dyn Iterator<Item = Result<CursorItem>> + Send>;

/// Wrapper for an in-progress scan that can be stored in a ResourceArc.
/// The scan (and its open file) is dropped once it ends or fails.
pub struct CursorResource {
    pub inner: Mutex<Option<CursorStream>>,
}

/// Records pulled by one `take`
#[derive(Debug)]
pub struct Batch {
    pub items: Vec<CursorItem>,
    /// True once the scan has no more records
    pub done: bool,
}

impl CursorResource {
    pub fn new<I>(stream: I) -> Self
    where
        I: Iterator<Item = Result<CursorItem>> + Send + 'static,
    {
        CursorResource {
            inner: Mutex::new(Some(Box::new(stream))),
        }
    }

    /// Pull up to `max` records
    pub fn take(&self, max: usize) -> Result<Batch> {
        let mut guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let mut items = Vec::with_capacity(max.min(1024));

        let Some(stream) = guard.as_mut() else {
            return Ok(Batch { items, done: true });
        };
        while items.len() < max {
            match stream.next() {
                Some(Ok(item)) => items.push(item),
                Some(Err(e)) => {
                    *guard = None;
                    return Err(e);
                }
                None => {
                    *guard = None;
                    return Ok(Batch { items, done: true });
                }
            }
        }
        Ok(Batch { items, done: false })
    }
}

#[rustler::resource_impl]
impl rustler::Resource for CursorResource {}

/// Type alias for the ResourceArc
pub type CursorRef = ResourceArc<CursorResource>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CatalogError;

    fn product(name: &str) -> Result<CursorItem> {
        Ok(CursorItem::Product(Product {
            name: name.to_string(),
            image: None,
        }))
    }

    #[test]
    fn test_take_in_batches() {
        let items = vec![product("a"), product("b"), product("c")];
        let cursor = CursorResource::new(items.into_iter());

        let first = cursor.take(2).unwrap();
        assert_eq!(first.items.len(), 2);
        assert!(!first.done);

        let second = cursor.take(2).unwrap();
        assert_eq!(second.items, vec![product("c").unwrap()]);
        assert!(second.done);

        let after = cursor.take(2).unwrap();
        assert!(after.items.is_empty());
        assert!(after.done);
    }

    #[test]
    fn test_error_ends_cursor() {
        let cursor = CursorResource::new(
            vec![product("a"), Err(CatalogError::malformed("bad", 7)), product("c")].into_iter(),
        );
        assert!(cursor.take(5).is_err());
        assert!(cursor.take(5).unwrap().done);
    }
}

//! Ancestor path tracking for the catalog scan.

use super::{ITEM, ITEMS};

/// Stack of open element names, outermost first
#[derive(Debug, Default)]
pub struct PathTracker {
    stack: Vec<String>,
}

impl PathTracker {
    pub fn new() -> Self {
        PathTracker {
            stack: Vec::with_capacity(16),
        }
    }

    /// True if an element named `tag` opened here would be a product record
    #[inline]
    pub fn opens_record(&self, tag: &str) -> bool {
        tag == ITEM && self.stack.last().is_some_and(|parent| parent == ITEMS)
    }

    pub fn open(&mut self, tag: &str) {
        self.stack.push(tag.to_owned());
    }

    /// True if the innermost open element is an `item` whose parent is `items`
    #[inline]
    pub fn is_qualifying_record(&self) -> bool {
        match self.stack.as_slice() {
            [.., parent, top] => top == ITEM && parent == ITEMS,
            _ => false,
        }
    }

    /// Close the innermost element.
    ///
    /// Returns whether the closed element was a product record. Fails when
    /// `tag` does not name the innermost open element.
    pub fn close(&mut self, tag: &str) -> Result<bool, String> {
        match self.stack.last() {
            Some(top) if top == tag => {}
            Some(top) => {
                return Err(format!("Mismatched end tag: expected </{top}>, found </{tag}>"))
            }
            None => return Err(format!("Unexpected end tag </{tag}>")),
        }
        let qualifying = self.is_qualifying_record();
        self.stack.pop();
        Ok(qualifying)
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }
}

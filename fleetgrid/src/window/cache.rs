//! Sparse row cache and in-flight page registry.

use std::collections::HashMap;
use std::collections::HashSet;
use std::ops::Range;

/// Rows received so far, keyed by absolute row index.
///
/// Never pre-sized to the row count. Within one query lifetime entries are
/// only added or overwritten; the cache is emptied as a whole on reset.
#[derive(Debug)]
pub struct RowWindow<R> {
    rows: HashMap<usize, R>,
}

impl<R> Default for RowWindow<R> {
    fn default() -> Self {
        Self {
            rows: HashMap::new(),
        }
    }
}

impl<R> RowWindow<R> {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the row at `index`, if its page has arrived.
    pub fn get(&self, index: usize) -> Option<&R> {
        self.rows.get(&index)
    }

    /// Returns `true` if a row is cached at `index`.
    pub fn contains(&self, index: usize) -> bool {
        self.rows.contains_key(&index)
    }

    /// Returns `true` if every index in `range` is cached.
    ///
    /// A page that came back short (the tail of a smaller collection) only
    /// covers the rows it returned, so it stops counting as cached once the
    /// row count grows past them.
    pub fn covers(&self, mut range: Range<usize>) -> bool {
        range.all(|index| self.rows.contains_key(&index))
    }

    /// Stores `items` at `offset..offset + items.len()`.
    pub fn insert_page(&mut self, offset: usize, items: Vec<R>) {
        for (i, item) in items.into_iter().enumerate() {
            self.rows.insert(offset + i, item);
        }
    }

    /// Number of cached rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Drops every row.
    pub fn clear(&mut self) {
        self.rows.clear();
    }
}

/// Pages with a request currently outstanding.
///
/// At most one request per page index may be in flight.
#[derive(Debug, Default)]
pub struct InFlight {
    pages: HashSet<usize>,
}

impl InFlight {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `page`; returns `false` if it is already in flight.
    pub fn try_begin(&mut self, page: usize) -> bool {
        self.pages.insert(page)
    }

    /// Marks `page` as no longer in flight.
    pub fn finish(&mut self, page: usize) {
        self.pages.remove(&page);
    }

    /// Returns `true` if `page` is in flight.
    pub fn contains(&self, page: usize) -> bool {
        self.pages.contains(&page)
    }

    /// In-flight page indices, ascending.
    pub fn pages(&self) -> Vec<usize> {
        let mut pages: Vec<_> = self.pages.iter().copied().collect();
        pages.sort_unstable();
        pages
    }

    /// Number of pages in flight.
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    /// Returns `true` if nothing is in flight.
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Forgets every outstanding request.
    pub fn clear(&mut self) {
        self.pages.clear();
    }
}

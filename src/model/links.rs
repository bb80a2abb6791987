//! Bipartite page-to-division link table.
//!
//! The relation is many-to-many: a page spanning a chapter boundary links to
//! several divisions, and a chapter spanning several pages is linked from
//! each of them. Entries keep global insertion order (for serialization)
//! and per-page insertion order (for queries).

use std::collections::HashMap;

/// One `(page, division)` association.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkEntry {
    pub page_id: String,
    pub division_id: String,
}

/// The page link table of one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkTable {
    entries: Vec<LinkEntry>,
    by_page: HashMap<String, Vec<String>>,
}

impl LinkTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a link. Duplicate `(page, division)` pairs are no-ops;
    /// returns whether the table changed.
    pub fn insert(&mut self, page_id: &str, division_id: &str) -> bool {
        if self.contains(page_id, division_id) {
            return false;
        }
        self.entries.push(LinkEntry {
            page_id: page_id.to_string(),
            division_id: division_id.to_string(),
        });
        self.by_page
            .entry(page_id.to_string())
            .or_default()
            .push(division_id.to_string());
        true
    }

    pub fn contains(&self, page_id: &str, division_id: &str) -> bool {
        self.by_page
            .get(page_id)
            .is_some_and(|divs| divs.iter().any(|d| d == division_id))
    }

    /// Divisions linked from a page, in the order they were added.
    pub fn divisions_for(&self, page_id: &str) -> &[String] {
        self.by_page.get(page_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The most recently added division for a page.
    pub fn last_for(&self, page_id: &str) -> Option<&str> {
        self.divisions_for(page_id).last().map(String::as_str)
    }

    /// All entries in global insertion order.
    pub fn entries(&self) -> &[LinkEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// src/cache.rs
//! In-memory lookup of calendar pages the helper already resolved.
//!
//! Entries live as long as the helper and are never evicted. A page deleted
//! in Notion after it was cached keeps resolving to its stale ID until the
//! next run.

use crate::types::{DatabaseId, PageId};
use std::collections::HashMap;

/// Page IDs keyed by (database, title).
#[derive(Debug, Default)]
pub struct RelationCache {
    entries: HashMap<DatabaseId, HashMap<String, PageId>>,
}

impl RelationCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, database: &DatabaseId, title: &str) -> Option<&PageId> {
        self.entries.get(database)?.get(title)
    }

    pub fn insert(&mut self, database: DatabaseId, title: impl Into<String>, page: PageId) {
        self.entries
            .entry(database)
            .or_default()
            .insert(title.into(), page);
    }

    /// Number of cached pages across all databases.
    pub fn len(&self) -> usize {
        self.entries.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

//! Load-scoped caching of import target documents
//!
//! An [`ImportCache`] lives for exactly one top-level repo construction. It
//! keeps every document pulled in through an import's `file` or `repo` field
//! so that several import sites naming the same document parse it once.
//! Entries hold fully import-resolved trees shared behind `Arc`. They are
//! never mutated; import sites always receive deep copies.

use std::collections::HashMap;
use std::sync::Arc;

use log::debug;
use toml::Table;

use crate::error::Result;

/// Cache key combining the owning repo and the resolved document URL
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey {
    pub repo: String,
    pub document: String,
}

impl CacheKey {
    pub fn new(repo: &str, document: &str) -> Self {
        Self {
            repo: repo.to_string(),
            document: document.to_string(),
        }
    }
}

/// Documents loaded while resolving one repo's imports
#[derive(Debug, Clone, Default)]
pub struct ImportCache {
    entries: HashMap<CacheKey, Arc<Table>>,
}

impl ImportCache {
    /// Create a new empty import cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a cached document, or load and cache it if not present
    pub fn get_or_load<F>(&mut self, key: CacheKey, loader: F) -> Result<Arc<Table>>
    where
        F: FnOnce() -> Result<Arc<Table>>,
    {
        if let Some(cached) = self.entries.get(&key) {
            debug!("Import cache hit for {}", key.document);
            return Ok(Arc::clone(cached));
        }

        let document = loader()?;
        self.entries.insert(key, Arc::clone(&document));
        Ok(document)
    }

    /// Store a document, replacing any previous entry for `key`
    pub fn insert(&mut self, key: CacheKey, document: Arc<Table>) {
        self.entries.insert(key, document);
    }

    /// Get a document from cache without loading
    pub fn get(&self, key: &CacheKey) -> Option<&Arc<Table>> {
        self.entries.get(key)
    }

    /// Check if a key exists in cache
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Cached keys in sorted order
    pub fn keys(&self) -> Vec<&CacheKey> {
        let mut keys: Vec<_> = self.entries.keys().collect();
        keys.sort();
        keys
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Clear all cached entries
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

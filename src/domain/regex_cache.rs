//! Shared cache of compiled regular expressions.
//!
//! Many reconciliations validate the same predicate objects concurrently, so
//! compiled programs are shared through a lock-free read path. Entries are
//! never mutated after insertion; a full cache still compiles, it just stops
//! remembering new patterns.

use dashmap::DashMap;
use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use std::sync::Arc;

/// Default compiled-program size limit in bytes
pub const DEFAULT_SIZE_LIMIT: usize = 1 << 20;

/// Default number of distinct patterns kept
pub const DEFAULT_CAPACITY: usize = 4096;

static GLOBAL_CACHE: Lazy<RegexCache> =
    Lazy::new(|| RegexCache::new(DEFAULT_SIZE_LIMIT, DEFAULT_CAPACITY));

#[derive(Debug)]
pub struct RegexCache {
    entries: DashMap<String, Arc<Regex>>,
    size_limit: usize,
    capacity: usize,
}

impl RegexCache {
    pub fn new(size_limit: usize, capacity: usize) -> Self {
        Self { entries: DashMap::new(), size_limit, capacity }
    }

    /// Process-wide cache with default limits
    pub fn global() -> &'static RegexCache {
        &GLOBAL_CACHE
    }

    /// Compile `pattern`, reusing a previously compiled program when present.
    pub fn compile(&self, pattern: &str) -> Result<Arc<Regex>, regex::Error> {
        if let Some(hit) = self.entries.get(pattern) {
            tracing::trace!(pattern, "regex cache hit");
            return Ok(Arc::clone(hit.value()));
        }

        let compiled = Arc::new(RegexBuilder::new(pattern).size_limit(self.size_limit).build()?);
        tracing::trace!(pattern, cached = self.entries.len(), "regex cache miss");

        if self.entries.len() < self.capacity {
            // A concurrent insert of the same pattern wins; both programs are equivalent.
            let entry = self.entries.entry(pattern.to_string()).or_insert(compiled);
            return Ok(Arc::clone(entry.value()));
        }

        Ok(compiled)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for RegexCache {
    fn default() -> Self {
        Self::new(DEFAULT_SIZE_LIMIT, DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hit_returns_same_program() {
        let cache = RegexCache::default();
        let first = cache.compile("^/v[0-9]+").unwrap();
        let second = cache.compile("^/v[0-9]+").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn invalid_pattern_is_not_cached() {
        let cache = RegexCache::default();
        assert!(cache.compile("(unclosed").is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn full_cache_still_compiles() {
        let cache = RegexCache::new(DEFAULT_SIZE_LIMIT, 1);
        cache.compile("a+").unwrap();
        let uncached = cache.compile("b+").unwrap();
        assert!(uncached.is_match("bbb"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn size_limit_rejects_oversized_programs() {
        let cache = RegexCache::new(64, DEFAULT_CAPACITY);
        assert!(cache.compile(r"\w{50}\d{50}").is_err());
    }

    #[test]
    fn concurrent_compiles_share_cache() {
        let cache = Arc::new(RegexCache::default());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || cache.compile("^api-[a-z]+$").unwrap().is_match("api-x"))
            })
            .collect();

        for handle in handles {
            assert!(handle.join().unwrap());
        }
        assert_eq!(cache.len(), 1);
    }
}

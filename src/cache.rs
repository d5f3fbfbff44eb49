use std::num::NonZeroUsize;
use std::sync::Arc;

use lru::LruCache;
use tracing::debug;

use crate::analyzer::analyze;
use crate::query::ParsedStatement;

/// Default number of statements a connection keeps analyzed.
pub const DEFAULT_CACHE_SIZE: usize = 250;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct StatementKey {
    sql: String,
    no_backslash_escapes: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

/// Bounded LRU of analyzed statements, owned by one connection.
///
/// Entries are shared as `Arc<ParsedStatement>`, so every prepared statement
/// built from the same text (including rebound clones) reuses one analysis.
/// A capacity of zero disables caching: every lookup analyzes afresh.
pub struct StatementCache {
    cache: Option<LruCache<StatementKey, Arc<ParsedStatement>>>,
    hits: u64,
    misses: u64,
    evictions: u64,
}

impl StatementCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            cache: NonZeroUsize::new(capacity).map(LruCache::new),
            hits: 0,
            misses: 0,
            evictions: 0,
        }
    }

    pub fn get_or_analyze(
        &mut self,
        sql: &str,
        no_backslash_escapes: bool,
    ) -> Arc<ParsedStatement> {
        let Some(cache) = self.cache.as_mut() else {
            self.misses += 1;
            return Arc::new(analyze(sql, no_backslash_escapes));
        };

        let key = StatementKey {
            sql: sql.to_string(),
            no_backslash_escapes,
        };
        if let Some(parsed) = cache.get(&key) {
            self.hits += 1;
            debug!(sql_len = sql.len(), "statement cache hit");
            return Arc::clone(parsed);
        }

        self.misses += 1;
        let parsed = Arc::new(analyze(sql, no_backslash_escapes));
        debug!(
            sql_len = sql.len(),
            parameters = parsed.parameter_count(),
            rewritable = parsed.is_rewritable(),
            "statement cache miss"
        );
        if let Some((evicted, _)) = cache.push(key, Arc::clone(&parsed)) {
            self.evictions += 1;
            debug!(sql_len = evicted.sql.len(), "statement cache eviction");
        }
        parsed
    }

    pub fn len(&self) -> usize {
        self.cache.as_ref().map_or(0, LruCache::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.cache.as_ref().map_or(0, |c| c.cap().get())
    }

    /// Drop every entry and reset the counters. Call when the statement text's
    /// meaning may have changed, e.g. after the session `sql_mode` changes.
    pub fn clear(&mut self) {
        if let Some(cache) = self.cache.as_mut() {
            cache.clear();
        }
        self.hits = 0;
        self.misses = 0;
        self.evictions = 0;
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.len(),
            hits: self.hits,
            misses: self.misses,
            evictions: self.evictions,
        }
    }
}

impl Default for StatementCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_shares_analysis() {
        let mut cache = StatementCache::new(4);
        let first = cache.get_or_analyze("INSERT INTO t VALUES (?)", false);
        let second = cache.get_or_analyze("INSERT INTO t VALUES (?)", false);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(
            cache.stats(),
            CacheStats {
                entries: 1,
                hits: 1,
                misses: 1,
                evictions: 0
            }
        );
    }

    #[test]
    fn test_escaping_mode_is_part_of_key() {
        let mut cache = StatementCache::new(4);
        let sql = "INSERT INTO t VALUES ('a\\', ?)";
        let escaped = cache.get_or_analyze(sql, false);
        let literal = cache.get_or_analyze(sql, true);
        assert_eq!(escaped.parameter_count(), 0);
        assert_eq!(literal.parameter_count(), 1);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_lru_eviction() {
        let mut cache = StatementCache::new(2);
        cache.get_or_analyze("SELECT 1", false);
        cache.get_or_analyze("SELECT 2", false);
        // Touch "SELECT 1" so "SELECT 2" is least recently used.
        cache.get_or_analyze("SELECT 1", false);
        cache.get_or_analyze("SELECT 3", false);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.stats().evictions, 1);

        cache.get_or_analyze("SELECT 1", false);
        assert_eq!(cache.stats().hits, 2);
        cache.get_or_analyze("SELECT 2", false);
        assert_eq!(cache.stats().misses, 4);
    }

    #[test]
    fn test_zero_capacity_disables_cache() {
        let mut cache = StatementCache::new(0);
        let a = cache.get_or_analyze("SELECT ?", false);
        let b = cache.get_or_analyze("SELECT ?", false);
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(a, b);
        assert!(cache.is_empty());
        assert_eq!(cache.capacity(), 0);
        assert_eq!(cache.stats().misses, 2);
    }

    #[test]
    fn test_clear() {
        let mut cache = StatementCache::default();
        cache.get_or_analyze("SELECT ?", false);
        cache.clear();
        assert_eq!(cache.stats(), CacheStats::default());
        assert_eq!(cache.capacity(), DEFAULT_CACHE_SIZE);
    }
}

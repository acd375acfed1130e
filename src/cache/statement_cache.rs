use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use once_cell::sync::OnceCell;
use parking_lot::Mutex;

use super::fingerprint::Fingerprint;
use crate::config::CONFIG;
use crate::statement::CompiledStatement;
use crate::{Result, SqlBridgeError};

struct CacheEntry {
    stmt: Arc<CompiledStatement>,
    cached_at: Instant,
}

/// Bounded LRU cache of compiled statements with single-flight fills.
///
/// Hits take one short lock on the LRU map (recency update requires it).
/// Misses register in an in-flight table keyed by fingerprint: the first
/// caller for a key compiles, concurrent callers for the same key wait on
/// that cell only, and callers for other keys proceed unaffected. Failed
/// compiles are never inserted and leave no trace.
pub struct StatementCache {
    entries: Mutex<lru::LruCache<Fingerprint, CacheEntry>>,
    in_flight: Mutex<HashMap<Fingerprint, Arc<OnceCell<Arc<CompiledStatement>>>>>,
    ttl: Option<Duration>,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct CacheStats {
    pub size: usize,
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

impl StatementCache {
    pub fn new(capacity: usize, ttl: Option<Duration>) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap();
        Self {
            entries: Mutex::new(lru::LruCache::new(capacity)),
            in_flight: Mutex::new(HashMap::new()),
            ttl,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    /// Build a cache sized from the global configuration
    pub fn with_config() -> Self {
        Self::new(
            CONFIG.statement_cache_size,
            CONFIG.statement_cache_ttl_duration(),
        )
    }

    /// Return the cached artifact for `fingerprint`, compiling at most once
    /// per key under concurrency. `sql` is the exact caller text; it backs
    /// the equality check that turns a hash collision into a hard error
    /// instead of a silently wrong artifact.
    pub fn get_or_compile<F>(
        &self,
        fingerprint: Fingerprint,
        sql: &str,
        compile_fn: F,
    ) -> Result<Arc<CompiledStatement>>
    where
        F: FnOnce() -> Result<CompiledStatement>,
    {
        if let Some(found) = self.lookup(&fingerprint, sql)? {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(found);
        }
        self.misses.fetch_add(1, Ordering::Relaxed);

        let cell = {
            let mut in_flight = self.in_flight.lock();
            in_flight
                .entry(fingerprint)
                .or_insert_with(|| Arc::new(OnceCell::new()))
                .clone()
        };

        let outcome = cell
            .get_or_try_init(|| {
                // A previous flight may have published between our lookup
                // miss and this cell being created; re-check before parsing.
                if let Some(found) = self.lookup(&fingerprint, sql)? {
                    return Ok(found);
                }
                compile_fn().map(Arc::new)
            })
            .cloned();

        match outcome {
            Ok(stmt) => {
                // Publish before retiring the flight so late arrivals find
                // either the cell or the entry, never neither.
                self.insert(fingerprint, stmt.clone());
                self.in_flight.lock().remove(&fingerprint);
                Ok(stmt)
            }
            Err(e) => {
                // Failed compiles leave no cache entry and no stale flight
                self.in_flight.lock().remove(&fingerprint);
                Err(e)
            }
        }
    }

    fn lookup(&self, fingerprint: &Fingerprint, sql: &str) -> Result<Option<Arc<CompiledStatement>>> {
        let mut entries = self.entries.lock();
        match entries.get(fingerprint) {
            None => return Ok(None),
            Some(entry) => {
                let expired = self
                    .ttl
                    .is_some_and(|ttl| entry.cached_at.elapsed() >= ttl);
                if !expired {
                    if &*entry.stmt.source_sql != sql {
                        return Err(SqlBridgeError::CacheIntegrity(format!(
                            "fingerprint collision: cached `{}` vs requested `{}`",
                            truncated(&entry.stmt.source_sql),
                            truncated(sql)
                        )));
                    }
                    return Ok(Some(entry.stmt.clone()));
                }
            }
        }
        entries.pop(fingerprint);
        Ok(None)
    }

    fn insert(&self, fingerprint: Fingerprint, stmt: Arc<CompiledStatement>) {
        let mut entries = self.entries.lock();
        if let Some((evicted_key, _)) = entries.push(
            fingerprint,
            CacheEntry {
                stmt,
                cached_at: Instant::now(),
            },
        ) && evicted_key != fingerprint
        {
            self.evictions.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn invalidate(&self, fingerprint: &Fingerprint) {
        self.entries.lock().pop(fingerprint);
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    pub fn stats(&self) -> CacheStats {
        let entries = self.entries.lock();
        CacheStats {
            size: entries.len(),
            capacity: entries.cap().get(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }
}

fn truncated(sql: &str) -> &str {
    let mut end = sql.len().min(60);
    while !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::compile_statement;
    use crate::statement::{Dialect, RawStatement, StatementConfig};
    use std::sync::atomic::AtomicUsize;

    fn compile_counting(sql: &str, parses: &AtomicUsize) -> Result<CompiledStatement> {
        parses.fetch_add(1, Ordering::SeqCst);
        let config = StatementConfig::default();
        compile_statement(RawStatement::new(sql, Dialect::Generic, &config))
    }

    #[test]
    fn test_n_compiles_one_parse() {
        let cache = StatementCache::new(16, None);
        let config = StatementConfig::default();
        let sql = "SELECT * FROM t WHERE id = :id";
        let fp = Fingerprint::compute(sql, Dialect::Generic, &config);
        let parses = AtomicUsize::new(0);

        for _ in 0..5 {
            cache
                .get_or_compile(fp, sql, || compile_counting(sql, &parses))
                .unwrap();
        }

        assert_eq!(parses.load(Ordering::SeqCst), 1);
        let stats = cache.stats();
        assert_eq!(stats.hits, 4);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.size, 1);
    }

    #[test]
    fn test_collision_is_fatal_not_silent() {
        let cache = StatementCache::new(16, None);
        let config = StatementConfig::default();
        let sql_a = "SELECT 1";
        let fp = Fingerprint::compute(sql_a, Dialect::Generic, &config);
        let parses = AtomicUsize::new(0);

        cache
            .get_or_compile(fp, sql_a, || compile_counting(sql_a, &parses))
            .unwrap();

        // Same fingerprint presented with different text models a collision
        let err = cache
            .get_or_compile(fp, "SELECT 2", || compile_counting("SELECT 2", &parses))
            .unwrap_err();
        assert!(matches!(err, SqlBridgeError::CacheIntegrity(_)));
    }

    #[test]
    fn test_failed_compiles_leave_no_entry() {
        let cache = StatementCache::new(16, None);
        let config = StatementConfig::default();
        let sql = "SELEKT nope";
        let fp = Fingerprint::compute(sql, Dialect::Generic, &config);
        let parses = AtomicUsize::new(0);

        assert!(
            cache
                .get_or_compile(fp, sql, || compile_counting(sql, &parses))
                .is_err()
        );
        assert_eq!(cache.stats().size, 0);

        // A later caller retries the compile rather than hitting a poisoned entry
        assert!(
            cache
                .get_or_compile(fp, sql, || compile_counting(sql, &parses))
                .is_err()
        );
        assert_eq!(parses.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_lru_eviction_is_counted() {
        let cache = StatementCache::new(2, None);
        let config = StatementConfig::default();
        let parses = AtomicUsize::new(0);

        for sql in ["SELECT 1", "SELECT 2", "SELECT 3"] {
            let fp = Fingerprint::compute(sql, Dialect::Generic, &config);
            cache
                .get_or_compile(fp, sql, || compile_counting(sql, &parses))
                .unwrap();
        }

        let stats = cache.stats();
        assert_eq!(stats.size, 2);
        assert_eq!(stats.evictions, 1);

        // The evicted statement compiles again on next use
        let fp = Fingerprint::compute("SELECT 1", Dialect::Generic, &config);
        cache
            .get_or_compile(fp, "SELECT 1", || compile_counting("SELECT 1", &parses))
            .unwrap();
        assert_eq!(parses.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_invalidate_single_and_all() {
        let cache = StatementCache::new(16, None);
        let config = StatementConfig::default();
        let parses = AtomicUsize::new(0);

        let fp_a = Fingerprint::compute("SELECT 1", Dialect::Generic, &config);
        let fp_b = Fingerprint::compute("SELECT 2", Dialect::Generic, &config);
        cache
            .get_or_compile(fp_a, "SELECT 1", || compile_counting("SELECT 1", &parses))
            .unwrap();
        cache
            .get_or_compile(fp_b, "SELECT 2", || compile_counting("SELECT 2", &parses))
            .unwrap();

        cache.invalidate(&fp_a);
        assert_eq!(cache.stats().size, 1);

        cache.clear();
        assert_eq!(cache.stats().size, 0);
    }

    #[test]
    fn test_single_flight_under_race() {
        let cache = Arc::new(StatementCache::new(16, None));
        let config = StatementConfig::default();
        let sql = "SELECT * FROM t WHERE id = :id";
        let fp = Fingerprint::compute(sql, Dialect::Generic, &config);
        let parses = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = cache.clone();
                let parses = parses.clone();
                std::thread::spawn(move || {
                    cache
                        .get_or_compile(fp, sql, || {
                            parses.fetch_add(1, Ordering::SeqCst);
                            std::thread::sleep(Duration::from_millis(20));
                            let config = StatementConfig::default();
                            compile_statement(RawStatement::new(sql, Dialect::Generic, &config))
                        })
                        .unwrap()
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        for pair in results.windows(2) {
            assert_eq!(*pair[0], *pair[1]);
        }
        assert_eq!(parses.load(Ordering::SeqCst), 1);
    }
}

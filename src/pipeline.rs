use std::sync::Arc;

use crate::cache::{CacheStats, CacheStatus, Fingerprint, StatementCache, get_cache_status};
use crate::driver::Driver;
use crate::executor::{self, ExecutionRequest, ExecutionResult};
use crate::query::compile_statement;
use crate::statement::{CompiledStatement, Dialect, RawStatement, StatementConfig};
use crate::types::ParamSet;
use crate::Result;

/// The full pipeline: fingerprint, cache, compile, convert, dispatch.
///
/// One instance owns one statement cache; everything else is per-call
/// state. Instances are cheap to share behind an `Arc` across tasks.
pub struct SqlBridge {
    cache: StatementCache,
}

impl SqlBridge {
    /// Build with the globally configured cache size and TTL
    pub fn new() -> Self {
        Self {
            cache: StatementCache::with_config(),
        }
    }

    pub fn with_cache(cache: StatementCache) -> Self {
        Self { cache }
    }

    /// Compile `sql` for a dialect, reusing the cached artifact when one
    /// exists. N calls with identical inputs cost one parse and N-1 hits.
    pub fn compile(
        &self,
        sql: &str,
        dialect: Dialect,
        config: &StatementConfig,
    ) -> Result<Arc<CompiledStatement>> {
        if !config.cache_statements {
            return compile_statement(RawStatement::new(sql, dialect, config)).map(Arc::new);
        }

        let fingerprint = Fingerprint::compute(sql, dialect, config);
        self.cache.get_or_compile(fingerprint, sql, || {
            compile_statement(RawStatement::new(sql, dialect, config))
        })
    }

    /// The cache key for a statement, for targeted invalidation
    pub fn fingerprint(&self, sql: &str, dialect: Dialect, config: &StatementConfig) -> Fingerprint {
        Fingerprint::compute(sql, dialect, config)
    }

    /// Dispatch a prepared request
    pub async fn execute(
        &self,
        driver: &dyn Driver,
        request: ExecutionRequest,
    ) -> Result<ExecutionResult> {
        executor::execute(driver, request).await
    }

    /// Convenience single-shot path: compile (or hit the cache) and run one
    /// statement with one set of values
    pub async fn query(
        &self,
        driver: &dyn Driver,
        sql: &str,
        dialect: Dialect,
        config: &StatementConfig,
        values: ParamSet,
    ) -> Result<ExecutionResult> {
        let statement = self.compile(sql, dialect, config)?;
        self.execute(driver, ExecutionRequest::single(statement, values))
            .await
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn cache_status(&self) -> CacheStatus {
        get_cache_status(&self.cache)
    }

    pub fn log_cache_status(&self) {
        crate::cache::log_cache_status(&self.cache);
    }

    pub fn invalidate(&self, fingerprint: &Fingerprint) {
        self.cache.invalidate(fingerprint);
    }

    pub fn invalidate_all(&self) {
        self.cache.clear();
    }
}

impl Default for SqlBridge {
    fn default() -> Self {
        Self::new()
    }
}

use serde::Serialize;

use super::statement_cache::{CacheStats, StatementCache};

/// Cache status snapshot for diagnostics
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CacheStatus {
    pub total_lookups: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub hit_rate: f64,
    pub evictions: u64,
    pub cache_size: usize,
    pub cache_capacity: usize,
}

impl From<CacheStats> for CacheStatus {
    fn from(stats: CacheStats) -> Self {
        let total = stats.hits + stats.misses;
        let hit_rate = if total > 0 {
            (stats.hits as f64 / total as f64) * 100.0
        } else {
            0.0
        };
        CacheStatus {
            total_lookups: total,
            cache_hits: stats.hits,
            cache_misses: stats.misses,
            hit_rate,
            evictions: stats.evictions,
            cache_size: stats.size,
            cache_capacity: stats.capacity,
        }
    }
}

/// Get the current status of a statement cache
pub fn get_cache_status(cache: &StatementCache) -> CacheStatus {
    cache.stats().into()
}

/// Format cache status as (metric, value) rows for diagnostic surfaces
pub fn format_cache_status_as_table(cache: &StatementCache) -> Vec<(String, String)> {
    let status = get_cache_status(cache);
    vec![
        ("total_lookups".to_string(), status.total_lookups.to_string()),
        ("cache_hits".to_string(), status.cache_hits.to_string()),
        ("cache_misses".to_string(), status.cache_misses.to_string()),
        (
            "hit_rate_percent".to_string(),
            format!("{:.1}", status.hit_rate),
        ),
        ("evictions".to_string(), status.evictions.to_string()),
        ("cache_size".to_string(), status.cache_size.to_string()),
        (
            "cache_capacity".to_string(),
            status.cache_capacity.to_string(),
        ),
    ]
}

/// Log cache status to tracing
pub fn log_cache_status(cache: &StatementCache) {
    let status = get_cache_status(cache);

    tracing::info!(
        "Statement Cache Status - Lookups: {}, Hits: {} ({:.1}%), Misses: {}, Evictions: {}, Size: {}/{}",
        status.total_lookups,
        status.cache_hits,
        status.hit_rate,
        status.cache_misses,
        status.evictions,
        status.cache_size,
        status.cache_capacity
    );
}

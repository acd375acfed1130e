use std::num::NonZeroUsize;
use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::Mutex;

use crate::config::CONFIG;
use crate::statement::StatementConfig;

/// Equality-keyed intern cache for `StatementConfig`.
///
/// Call sites tend to reuse a handful of option bundles across many
/// statements; interning hands every one of them the same `Arc` instead of
/// reallocating the bundle per call. Kept separate from the statement
/// cache: a config is keyed by its own value, not by any SQL text.
pub struct ConfigCache {
    interned: Mutex<lru::LruCache<StatementConfig, Arc<StatementConfig>>>,
}

impl ConfigCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            interned: Mutex::new(lru::LruCache::new(
                NonZeroUsize::new(capacity.max(1)).unwrap(),
            )),
        }
    }

    pub fn intern(&self, config: StatementConfig) -> Arc<StatementConfig> {
        let mut interned = self.interned.lock();
        if let Some(existing) = interned.get(&config) {
            return existing.clone();
        }
        let shared = Arc::new(config.clone());
        interned.push(config, shared.clone());
        shared
    }

    pub fn len(&self) -> usize {
        self.interned.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Global config intern cache
static GLOBAL_CONFIG_CACHE: Lazy<ConfigCache> =
    Lazy::new(|| ConfigCache::new(CONFIG.config_cache_size));

/// Intern a config through the global cache
pub fn intern_config(config: StatementConfig) -> Arc<StatementConfig> {
    GLOBAL_CONFIG_CACHE.intern(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::statement::ValidationLevel;

    #[test]
    fn test_identical_configs_share_one_allocation() {
        let cache = ConfigCache::new(8);
        let a = cache.intern(StatementConfig::default());
        let b = cache.intern(StatementConfig::default());
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_distinct_configs_do_not_alias() {
        let cache = ConfigCache::new(8);
        let a = cache.intern(StatementConfig::default());
        let b = cache.intern(StatementConfig {
            validation: ValidationLevel::Full,
            ..Default::default()
        });
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 2);
    }
}

// Compiled-statement caching: stable fingerprints, single-flight fills,
// config interning, and cache diagnostics

pub mod config_cache;
pub mod fingerprint;
pub mod statement_cache;
pub mod status;

pub use config_cache::{ConfigCache, intern_config};
pub use fingerprint::{CompileFlags, Fingerprint};
pub use statement_cache::{CacheStats, StatementCache};
pub use status::{CacheStatus, format_cache_status_as_table, get_cache_status, log_cache_status};

use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(name = "sqlbridge")]
#[command(about = "sqlbridge - compile-once SQL statement cache and execution dispatcher", long_about = None)]
pub struct Config {
    // Statement cache configuration
    #[arg(long, default_value = "1000", env = "SQLBRIDGE_STATEMENT_CACHE_SIZE", help = "Maximum number of compiled statements to cache")]
    pub statement_cache_size: usize,

    #[arg(long, default_value = "0", env = "SQLBRIDGE_STATEMENT_CACHE_TTL", help = "TTL for compiled statement entries in seconds (0 disables expiry)")]
    pub statement_cache_ttl: u64,

    #[arg(long, default_value = "64", env = "SQLBRIDGE_CONFIG_CACHE_SIZE", help = "Maximum number of interned statement configs")]
    pub config_cache_size: usize,

    #[arg(long, default_value = "300", env = "SQLBRIDGE_CACHE_METRICS_INTERVAL", help = "Interval for logging cache metrics in seconds")]
    pub cache_metrics_interval: u64,

    // Binding behaviour
    #[arg(long, env = "SQLBRIDGE_STRICT_BINDING", help = "Reject supplied parameter values that no placeholder references")]
    pub strict_binding: bool,

    // Observability: cosmetic only, never part of a statement fingerprint
    #[arg(long, env = "SQLBRIDGE_TRACE_EXECUTION", help = "Emit per-request execution traces (checked once per request, never per row)")]
    pub trace_execution: bool,
}

impl Config {
    /// Resolve configuration from environment variables and defaults.
    /// Embedding binaries that want CLI flags should call `Config::parse`
    /// themselves; the library never consumes the host's argv.
    pub fn load() -> Self {
        Config::parse_from(["sqlbridge"])
    }

    /// Get the statement cache TTL as Duration, None when expiry is disabled
    pub fn statement_cache_ttl_duration(&self) -> Option<std::time::Duration> {
        if self.statement_cache_ttl == 0 {
            None
        } else {
            Some(std::time::Duration::from_secs(self.statement_cache_ttl))
        }
    }

    /// Get the cache metrics interval as Duration
    pub fn cache_metrics_interval_duration(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.cache_metrics_interval)
    }
}

// Global configuration instance
lazy_static::lazy_static! {
    pub static ref CONFIG: Config = Config::load();
}

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use crate::translator::PlaceholderStyle;
use crate::{Result, SqlBridgeError};

/// SQL dialect / driver family. Determines the default placeholder style
/// and which parser dialect validates the statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    Generic,
    Postgres,
    Sqlite,
    Mysql,
}

impl Dialect {
    pub fn from_name(name: &str) -> Result<Self> {
        match name.to_ascii_lowercase().as_str() {
            "generic" => Ok(Dialect::Generic),
            "postgres" | "postgresql" => Ok(Dialect::Postgres),
            "sqlite" => Ok(Dialect::Sqlite),
            "mysql" => Ok(Dialect::Mysql),
            other => Err(SqlBridgeError::UnsupportedDialect(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Dialect::Generic => "generic",
            Dialect::Postgres => "postgres",
            Dialect::Sqlite => "sqlite",
            Dialect::Mysql => "mysql",
        }
    }

    pub fn default_placeholder_style(&self) -> PlaceholderStyle {
        match self {
            Dialect::Generic | Dialect::Sqlite | Dialect::Mysql => PlaceholderStyle::Positional,
            Dialect::Postgres => PlaceholderStyle::Numbered,
        }
    }
}

/// How much work the parser collaborator does at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ValidationLevel {
    /// No parse; the statement is scanned for placeholders only
    None,
    /// Parse through the SQL parser, reject syntax errors
    #[default]
    ParseOnly,
    /// Parse plus placeholder consistency checks (no mixed marker styles,
    /// no gaps in numbered parameters)
    Full,
}

/// Reusable compilation options. Interned via `cache::config_cache` so
/// call sites sharing identical options share one allocation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StatementConfig {
    pub validation: ValidationLevel,
    pub strip_comments: bool,
    pub cache_statements: bool,
    /// Reject supplied values no placeholder references. Consumed at bind
    /// time only; never part of the fingerprint.
    pub strict_binding: bool,
    /// Override the dialect's default placeholder style
    pub target_style: Option<PlaceholderStyle>,
}

impl Default for StatementConfig {
    fn default() -> Self {
        Self {
            validation: ValidationLevel::ParseOnly,
            strip_comments: true,
            cache_statements: true,
            strict_binding: false,
            target_style: None,
        }
    }
}

/// One statement as supplied by the caller. Per call, never mutated.
#[derive(Debug, Clone, Copy)]
pub struct RawStatement<'a> {
    pub sql: &'a str,
    pub dialect: Dialect,
    pub config: &'a StatementConfig,
}

impl<'a> RawStatement<'a> {
    pub fn new(sql: &'a str, dialect: Dialect, config: &'a StatementConfig) -> Self {
        Self { sql, dialect, config }
    }
}

/// Identity of one placeholder: either a name (`:id`, `%(id)s`) or a
/// zero-based position (`?` by occurrence order, `$n` as n-1).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParamKey {
    Named(String),
    Position(u32),
}

/// One placeholder occurrence in the canonical SQL. A named parameter may
/// occur multiple times; each occurrence is recorded separately.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamOccurrence {
    pub key: ParamKey,
    /// Byte span of the marker in the canonical SQL
    pub start: usize,
    pub end: usize,
}

/// SQL rewritten for one target placeholder style, plus the parameter keys
/// in output order. Built once per (statement, style) and reused for every
/// row of a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedStatement {
    pub sql: String,
    pub order: Vec<ParamKey>,
}

/// Immutable compiled artifact. Owned by the statement cache and shared
/// read-only by all callers; destroyed only on eviction.
#[derive(Debug)]
pub struct CompiledStatement {
    /// Exact caller text; the equality backstop for fingerprint collisions
    pub source_sql: Arc<str>,
    /// Text after optional comment stripping; what gets rendered/executed
    pub canonical_sql: String,
    pub params: Vec<ParamOccurrence>,
    pub distinct_params: usize,
    pub dialect: Dialect,
    /// Style resolved at compile time (config override or dialect default)
    pub target_style: PlaceholderStyle,
    pub validated: bool,
    rendered: RwLock<HashMap<PlaceholderStyle, Arc<RenderedStatement>>>,
    conversions: AtomicU64,
}

impl CompiledStatement {
    pub fn new(
        source_sql: Arc<str>,
        canonical_sql: String,
        params: Vec<ParamOccurrence>,
        dialect: Dialect,
        target_style: PlaceholderStyle,
        validated: bool,
    ) -> Self {
        let mut distinct: Vec<&ParamKey> = Vec::with_capacity(params.len());
        for occ in &params {
            if !distinct.contains(&&occ.key) {
                distinct.push(&occ.key);
            }
        }
        let distinct_params = distinct.len();
        Self {
            source_sql,
            canonical_sql,
            params,
            distinct_params,
            dialect,
            target_style,
            validated,
            rendered: RwLock::new(HashMap::new()),
            conversions: AtomicU64::new(0),
        }
    }

    /// Rendered form for a target style, if already converted
    pub fn rendered_for(&self, style: PlaceholderStyle) -> Option<Arc<RenderedStatement>> {
        self.rendered.read().get(&style).cloned()
    }

    /// Publish a rendered form. Under a race the first published form wins
    /// so every caller observes one canonical rendering.
    pub fn store_rendered(
        &self,
        style: PlaceholderStyle,
        rendered: Arc<RenderedStatement>,
    ) -> Arc<RenderedStatement> {
        let mut map = self.rendered.write();
        map.entry(style).or_insert(rendered).clone()
    }

    pub fn record_conversion(&self) {
        self.conversions.fetch_add(1, Ordering::Relaxed);
    }

    /// Number of placeholder conversions actually performed. Batch reuse is
    /// observable here: executing `many` with K sets leaves this at 1.
    pub fn conversion_count(&self) -> u64 {
        self.conversions.load(Ordering::Relaxed)
    }
}

// Value equality for artifacts: two independent compiles of the same input
// are interchangeable. Rendered caches and counters are runtime state, not
// identity.
impl PartialEq for CompiledStatement {
    fn eq(&self, other: &Self) -> bool {
        self.source_sql == other.source_sql
            && self.canonical_sql == other.canonical_sql
            && self.params == other.params
            && self.dialect == other.dialect
            && self.target_style == other.target_style
            && self.validated == other.validated
    }
}

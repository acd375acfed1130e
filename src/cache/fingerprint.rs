use std::collections::hash_map::DefaultHasher;
use std::hash::Hasher;

use bitflags::bitflags;

use crate::statement::{Dialect, StatementConfig, ValidationLevel};
use crate::translator::PlaceholderStyle;

bitflags! {
    /// Compilation options that change the compiled artifact, packed for
    /// the fingerprint. Cosmetic options (strict binding, tracing) are
    /// excluded by construction so they never fragment the cache.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CompileFlags: u8 {
        const STRIP_COMMENTS = 0b001;
        const VALIDATE_PARSE = 0b010;
        const VALIDATE_FULL  = 0b100;
    }
}

impl CompileFlags {
    pub fn from_config(config: &StatementConfig) -> Self {
        let mut flags = CompileFlags::empty();
        if config.strip_comments {
            flags |= CompileFlags::STRIP_COMMENTS;
        }
        match config.validation {
            ValidationLevel::None => {}
            ValidationLevel::ParseOnly => flags |= CompileFlags::VALIDATE_PARSE,
            ValidationLevel::Full => {
                flags |= CompileFlags::VALIDATE_PARSE | CompileFlags::VALIDATE_FULL;
            }
        }
        flags
    }
}

/// Stable cache key for a compiled statement.
///
/// Fixed-shape and `Copy`: a content hash and length of the SQL text plus
/// the dialect, resolved target style and packed option flags. Directly
/// usable as a map key with no further allocation. Equal inputs always
/// produce equal fingerprints; a hash-equal pair of distinct texts is
/// caught by the cache's exact-text fallback, never served silently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    hash: u64,
    text_len: u32,
    dialect: Dialect,
    style: PlaceholderStyle,
    flags: CompileFlags,
}

impl Fingerprint {
    /// Computed on every call, cache hits included, so this is one pass
    /// over the text and nothing else.
    #[inline]
    pub fn compute(sql: &str, dialect: Dialect, config: &StatementConfig) -> Self {
        let mut hasher = DefaultHasher::new();
        hasher.write(sql.as_bytes());
        Self {
            hash: hasher.finish(),
            text_len: sql.len() as u32,
            dialect,
            style: config
                .target_style
                .unwrap_or_else(|| dialect.default_placeholder_style()),
            flags: CompileFlags::from_config(config),
        }
    }
}

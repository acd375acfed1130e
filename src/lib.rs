pub mod cache;
pub mod config;
pub mod driver;
pub mod executor;
pub mod pipeline;
pub mod query;
pub mod shaper;
pub mod statement;
pub mod translator;
pub mod types;

pub use pipeline::SqlBridge;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SqlBridgeError {
    #[error("SQL parse error: {0}")]
    SqlParse(#[from] sqlparser::parser::ParserError),

    #[error("Unsupported dialect: {0}")]
    UnsupportedDialect(String),

    #[error("Parameter binding error: {0}")]
    ParameterBinding(String),

    #[error("Cache integrity violation: {0}")]
    CacheIntegrity(String),

    #[error("Execution failed at statement {index} (`{statement}`): {message}")]
    Execution {
        statement: String,
        index: usize,
        message: String,
    },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, SqlBridgeError>;

impl SqlBridgeError {
    /// Get the SQLSTATE class for this error, for callers that surface
    /// database-style diagnostics.
    pub fn sqlstate(&self) -> &str {
        match self {
            SqlBridgeError::SqlParse(_) => "42601", // syntax_error
            SqlBridgeError::UnsupportedDialect(_) => "0A000", // feature_not_supported
            SqlBridgeError::ParameterBinding(_) => "22023", // invalid_parameter_value
            SqlBridgeError::CacheIntegrity(_) => "XX000", // internal_error
            SqlBridgeError::Execution { .. } => "58000", // system_error
            SqlBridgeError::Cancelled => "57014",   // query_canceled
            SqlBridgeError::Sqlite(_) => "58000",   // system_error
        }
    }

    /// Execution errors carry the index of the failing item; every other
    /// kind fails before any driver interaction.
    pub fn failed_index(&self) -> Option<usize> {
        match self {
            SqlBridgeError::Execution { index, .. } => Some(*index),
            _ => None,
        }
    }
}

use std::sync::Arc;

use sqlparser::dialect::{GenericDialect, MySqlDialect, PostgreSqlDialect, SQLiteDialect};
use sqlparser::parser::Parser;

use super::param_scanner::{ScanOutcome, scan_parameters};
use super::strip_sql_comments;
use crate::statement::{
    CompiledStatement, Dialect, ParamKey, ParamOccurrence, RawStatement, ValidationLevel,
};
use crate::{Result, SqlBridgeError};

/// Compile one raw statement into the immutable cacheable artifact.
///
/// Comment stripping and placeholder scanning always run; the parser
/// collaborator is consulted per the configured validation level. Errors
/// surface before anything is published to the cache.
pub fn compile_statement(raw: RawStatement<'_>) -> Result<CompiledStatement> {
    let canonical = if raw.config.strip_comments {
        strip_sql_comments(raw.sql).into_owned()
    } else {
        raw.sql.to_string()
    };

    let scan = scan_parameters(&canonical);

    let validated = match raw.config.validation {
        ValidationLevel::None => false,
        level => {
            if level == ValidationLevel::Full {
                check_placeholder_consistency(&scan)?;
            }
            parse_for_validation(&canonical, &scan.params, raw.dialect)?;
            true
        }
    };

    let target_style = raw
        .config
        .target_style
        .unwrap_or_else(|| raw.dialect.default_placeholder_style());

    Ok(CompiledStatement::new(
        Arc::from(raw.sql),
        canonical,
        scan.params,
        raw.dialect,
        target_style,
        validated,
    ))
}

/// Run the statement through the SQL parser. Placeholder markers the parser
/// does not understand (named-percent in particular) are normalized to `?`
/// first; the spans from the scan make that a single splice pass.
fn parse_for_validation(
    canonical: &str,
    params: &[ParamOccurrence],
    dialect: Dialect,
) -> Result<()> {
    let normalized;
    let text: &str = if params.is_empty() {
        canonical
    } else {
        normalized = normalize_placeholders(canonical, params);
        &normalized
    };

    match dialect {
        Dialect::Generic => Parser::parse_sql(&GenericDialect {}, text)?,
        Dialect::Postgres => Parser::parse_sql(&PostgreSqlDialect {}, text)?,
        Dialect::Sqlite => Parser::parse_sql(&SQLiteDialect {}, text)?,
        Dialect::Mysql => Parser::parse_sql(&MySqlDialect {}, text)?,
    };
    Ok(())
}

fn normalize_placeholders(canonical: &str, params: &[ParamOccurrence]) -> String {
    let mut out = String::with_capacity(canonical.len());
    let mut prev = 0;
    for occ in params {
        out.push_str(&canonical[prev..occ.start]);
        out.push('?');
        prev = occ.end;
    }
    out.push_str(&canonical[prev..]);
    out
}

fn check_placeholder_consistency(scan: &ScanOutcome) -> Result<()> {
    if scan.saw_named && scan.saw_positional {
        return Err(SqlBridgeError::ParameterBinding(
            "statement mixes named and positional placeholders".to_string(),
        ));
    }

    let mut positions: Vec<u32> = scan
        .params
        .iter()
        .filter_map(|occ| match &occ.key {
            ParamKey::Position(n) => Some(*n),
            ParamKey::Named(_) => None,
        })
        .collect();
    positions.sort_unstable();
    positions.dedup();
    if let Some(&max) = positions.last()
        && positions.len() as u32 != max + 1
    {
        return Err(SqlBridgeError::ParameterBinding(format!(
            "positional placeholders are not contiguous: {} distinct markers but highest is ${}",
            positions.len(),
            max + 1
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::statement::StatementConfig;

    fn compile(sql: &str, config: &StatementConfig) -> Result<CompiledStatement> {
        compile_statement(RawStatement::new(sql, Dialect::Generic, config))
    }

    #[test]
    fn test_compile_scans_and_validates() {
        let config = StatementConfig::default();
        let stmt = compile("SELECT * FROM t WHERE id = :id", &config).unwrap();
        assert!(stmt.validated);
        assert_eq!(stmt.params.len(), 1);
        assert_eq!(stmt.params[0].key, ParamKey::Named("id".to_string()));
    }

    #[test]
    fn test_syntax_error_surfaces() {
        let config = StatementConfig::default();
        let err = compile("SELEKT * FORM t", &config).unwrap_err();
        assert!(matches!(err, SqlBridgeError::SqlParse(_)));
    }

    #[test]
    fn test_validation_none_skips_the_parser() {
        let config = StatementConfig {
            validation: ValidationLevel::None,
            ..Default::default()
        };
        let stmt = compile("SELEKT * FORM t", &config).unwrap();
        assert!(!stmt.validated);
    }

    #[test]
    fn test_comment_stripping_feeds_canonical_sql() {
        let config = StatementConfig::default();
        let stmt = compile("SELECT 1 -- note\n", &config).unwrap();
        assert_eq!(stmt.canonical_sql, "SELECT 1 \n");
        assert_eq!(&*stmt.source_sql, "SELECT 1 -- note\n");
    }

    #[test]
    fn test_full_validation_rejects_mixed_styles() {
        let config = StatementConfig {
            validation: ValidationLevel::Full,
            ..Default::default()
        };
        let err = compile("SELECT * FROM t WHERE a = :id AND b = ?", &config).unwrap_err();
        assert!(matches!(err, SqlBridgeError::ParameterBinding(_)));
    }

    #[test]
    fn test_full_validation_rejects_numbered_gaps() {
        let config = StatementConfig {
            validation: ValidationLevel::Full,
            ..Default::default()
        };
        let err = compile("SELECT * FROM t WHERE a = $1 AND b = $3", &config).unwrap_err();
        assert!(matches!(err, SqlBridgeError::ParameterBinding(_)));
    }

    #[test]
    fn test_percent_markers_validate_through_normalization() {
        let config = StatementConfig::default();
        let stmt = compile("SELECT * FROM t WHERE a = %(a)s", &config).unwrap();
        assert!(stmt.validated);
        assert_eq!(stmt.params[0].key, ParamKey::Named("a".to_string()));
    }
}

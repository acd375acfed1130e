use std::collections::HashSet;
use std::sync::Arc;

use super::PlaceholderStyle;
use crate::driver::DriverCapabilities;
use crate::statement::{CompiledStatement, ParamKey, RenderedStatement};
use crate::types::{BoundValue, ParamSet, ParamValue, global_bind_table};
use crate::{Result, SqlBridgeError};

/// Rewrite a compiled statement into the target placeholder style.
///
/// The result is memoized on the statement, so for any
/// (statement, style) pair the splice below runs exactly once no matter
/// how many rows or callers reuse it.
pub fn render(compiled: &CompiledStatement, style: PlaceholderStyle) -> Arc<RenderedStatement> {
    if let Some(cached) = compiled.rendered_for(style) {
        return cached;
    }

    compiled.record_conversion();

    let sql = &compiled.canonical_sql;
    let mut out = String::with_capacity(sql.len() + compiled.params.len() * 2);
    let mut itoa_buf = itoa::Buffer::new();
    let mut prev = 0;

    for (idx, occ) in compiled.params.iter().enumerate() {
        out.push_str(&sql[prev..occ.start]);
        match style {
            PlaceholderStyle::Positional => out.push('?'),
            PlaceholderStyle::Numbered => {
                out.push('$');
                out.push_str(itoa_buf.format(idx as u64 + 1));
            }
            PlaceholderStyle::NamedColon => {
                out.push(':');
                push_marker_name(&mut out, &occ.key, &mut itoa_buf);
            }
            PlaceholderStyle::NamedPercent => {
                out.push_str("%(");
                push_marker_name(&mut out, &occ.key, &mut itoa_buf);
                out.push_str(")s");
            }
        }
        prev = occ.end;
    }
    out.push_str(&sql[prev..]);

    let order = compiled.params.iter().map(|occ| occ.key.clone()).collect();
    compiled.store_rendered(style, Arc::new(RenderedStatement { sql: out, order }))
}

// Positional sources converted to a named style get synthetic `p1`-style
// names so the rendered text stays unambiguous.
fn push_marker_name(out: &mut String, key: &ParamKey, itoa_buf: &mut itoa::Buffer) {
    match key {
        ParamKey::Named(name) => out.push_str(name),
        ParamKey::Position(p) => {
            out.push('p');
            out.push_str(itoa_buf.format(*p as u64 + 1));
        }
    }
}

/// Bind one set of supplied values against a rendered statement, in output
/// order. A repeated name expands to one output value per occurrence, all
/// bound to the same supplied value. This is the per-row step of a batch;
/// it never re-renders.
pub fn bind_values(
    rendered: &RenderedStatement,
    values: &ParamSet,
    caps: &DriverCapabilities,
    strict: bool,
) -> Result<Vec<BoundValue>> {
    let table = global_bind_table();
    let mut out = Vec::with_capacity(rendered.order.len());
    let mut used_positions: HashSet<u32> = HashSet::new();
    let mut used_names: HashSet<&str> = HashSet::new();

    for key in &rendered.order {
        let value: ParamValue = match key {
            ParamKey::Position(p) => match values {
                ParamSet::Positional(list) => list.get(*p as usize).cloned().ok_or_else(|| {
                    SqlBridgeError::ParameterBinding(format!(
                        "no value supplied for positional parameter {} ({} supplied)",
                        p + 1,
                        list.len()
                    ))
                })?,
                ParamSet::Named(_) => {
                    return Err(SqlBridgeError::ParameterBinding(
                        "statement uses positional placeholders but named values were supplied"
                            .to_string(),
                    ));
                }
                ParamSet::Empty => {
                    return Err(SqlBridgeError::ParameterBinding(format!(
                        "no value supplied for positional parameter {}",
                        p + 1
                    )));
                }
            },
            ParamKey::Named(name) => match values {
                ParamSet::Named(map) => map.get(name).cloned().ok_or_else(|| {
                    SqlBridgeError::ParameterBinding(format!(
                        "no value supplied for parameter :{name}"
                    ))
                })?,
                ParamSet::Positional(_) => {
                    return Err(SqlBridgeError::ParameterBinding(format!(
                        "statement uses named placeholder :{name} but positional values were supplied"
                    )));
                }
                ParamSet::Empty => {
                    return Err(SqlBridgeError::ParameterBinding(format!(
                        "no value supplied for parameter :{name}"
                    )));
                }
            },
        };

        if strict {
            match key {
                ParamKey::Position(p) => {
                    used_positions.insert(*p);
                }
                ParamKey::Named(name) => {
                    used_names.insert(name.as_str());
                }
            }
        }

        out.push(table.apply(value, caps));
    }

    if strict {
        check_unused(values, &used_positions, &used_names)?;
    }

    Ok(out)
}

fn check_unused(
    values: &ParamSet,
    used_positions: &HashSet<u32>,
    used_names: &HashSet<&str>,
) -> Result<()> {
    match values {
        ParamSet::Empty => Ok(()),
        ParamSet::Positional(list) => {
            for idx in 0..list.len() {
                if !used_positions.contains(&(idx as u32)) {
                    return Err(SqlBridgeError::ParameterBinding(format!(
                        "value at position {} is not referenced by any placeholder",
                        idx + 1
                    )));
                }
            }
            Ok(())
        }
        ParamSet::Named(map) => {
            let mut unused: Vec<&str> = map
                .keys()
                .map(String::as_str)
                .filter(|name| !used_names.contains(name))
                .collect();
            if unused.is_empty() {
                Ok(())
            } else {
                unused.sort_unstable();
                Err(SqlBridgeError::ParameterBinding(format!(
                    "supplied values not referenced by any placeholder: {}",
                    unused.join(", ")
                )))
            }
        }
    }
}

/// Full conversion: rendered SQL for the target style plus the ordered
/// bound-value sequence for one parameter set.
pub fn convert(
    compiled: &CompiledStatement,
    values: &ParamSet,
    style: PlaceholderStyle,
    caps: &DriverCapabilities,
    strict: bool,
) -> Result<(Arc<RenderedStatement>, Vec<BoundValue>)> {
    let rendered = render(compiled, style);
    let bound = bind_values(&rendered, values, caps, strict)?;
    Ok((rendered, bound))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::compile_statement;
    use crate::statement::{Dialect, RawStatement, StatementConfig};

    fn caps() -> DriverCapabilities {
        DriverCapabilities {
            placeholder_style: PlaceholderStyle::Positional,
            bypass_wrapping: true,
        }
    }

    fn compile(sql: &str) -> CompiledStatement {
        let config = StatementConfig::default();
        compile_statement(RawStatement::new(sql, Dialect::Generic, &config)).unwrap()
    }

    #[test]
    fn test_named_to_positional() {
        let stmt = compile("SELECT * FROM t WHERE id = :id");
        let values = ParamSet::named([("id", 7i64)]);
        let (rendered, bound) =
            convert(&stmt, &values, PlaceholderStyle::Positional, &caps(), false).unwrap();
        assert_eq!(rendered.sql, "SELECT * FROM t WHERE id = ?");
        assert_eq!(bound, vec![BoundValue::Raw(ParamValue::Int(7))]);
    }

    #[test]
    fn test_repeated_name_expands_to_two_values() {
        let stmt = compile("SELECT * FROM t WHERE a = :id OR b = :id");
        let values = ParamSet::named([("id", 42i64)]);
        let (rendered, bound) =
            convert(&stmt, &values, PlaceholderStyle::Positional, &caps(), false).unwrap();
        assert_eq!(rendered.sql, "SELECT * FROM t WHERE a = ? OR b = ?");
        assert_eq!(
            bound,
            vec![
                BoundValue::Raw(ParamValue::Int(42)),
                BoundValue::Raw(ParamValue::Int(42)),
            ]
        );
    }

    #[test]
    fn test_numbered_markers_count_occurrences() {
        let stmt = compile("SELECT * FROM t WHERE a = :x AND b = :y AND c = :x");
        let rendered = render(&stmt, PlaceholderStyle::Numbered);
        assert_eq!(rendered.sql, "SELECT * FROM t WHERE a = $1 AND b = $2 AND c = $3");
    }

    #[test]
    fn test_positional_to_named_percent() {
        let stmt = compile("INSERT INTO t (a, b) VALUES (?, ?)");
        let rendered = render(&stmt, PlaceholderStyle::NamedPercent);
        assert_eq!(rendered.sql, "INSERT INTO t (a, b) VALUES (%(p1)s, %(p2)s)");
    }

    #[test]
    fn test_rendering_happens_once_per_style() {
        let stmt = compile("SELECT * FROM t WHERE id = :id");
        let first = render(&stmt, PlaceholderStyle::Positional);
        let second = render(&stmt, PlaceholderStyle::Positional);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(stmt.conversion_count(), 1);

        render(&stmt, PlaceholderStyle::Numbered);
        assert_eq!(stmt.conversion_count(), 2);
    }

    #[test]
    fn test_missing_value_is_a_binding_error() {
        let stmt = compile("SELECT * FROM t WHERE id = :id AND name = :name");
        let values = ParamSet::named([("id", 1i64)]);
        let err =
            convert(&stmt, &values, PlaceholderStyle::Positional, &caps(), false).unwrap_err();
        assert!(matches!(err, SqlBridgeError::ParameterBinding(_)));
        assert!(err.to_string().contains(":name"));
    }

    #[test]
    fn test_extra_values_only_rejected_when_strict() {
        let stmt = compile("SELECT * FROM t WHERE id = :id");
        let values = ParamSet::named([("id", 1i64), ("stray", 2i64)]);

        assert!(convert(&stmt, &values, PlaceholderStyle::Positional, &caps(), false).is_ok());

        let err =
            convert(&stmt, &values, PlaceholderStyle::Positional, &caps(), true).unwrap_err();
        assert!(err.to_string().contains("stray"));
    }
}

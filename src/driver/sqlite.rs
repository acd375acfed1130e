use async_trait::async_trait;
use parking_lot::Mutex;
use rusqlite::Connection;
use rusqlite::types::{Value, ValueRef};

use super::{Driver, DriverCapabilities, DriverOutcome};
use crate::Result;
use crate::translator::PlaceholderStyle;
use crate::types::{BoundValue, ParamValue};

/// Reference driver adapter over an embedded SQLite connection.
///
/// Positional placeholders, no bypass: SQLite stores everything as one of
/// five storage classes, so type-ambiguous values arrive wrapped and are
/// rendered to their canonical text form here.
pub struct SqliteDriver {
    conn: Mutex<Connection>,
}

impl SqliteDriver {
    pub fn open_in_memory() -> Result<Self> {
        Ok(Self {
            conn: Mutex::new(Connection::open_in_memory()?),
        })
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }
}

#[async_trait]
impl Driver for SqliteDriver {
    fn capabilities(&self) -> DriverCapabilities {
        DriverCapabilities {
            placeholder_style: PlaceholderStyle::Positional,
            bypass_wrapping: false,
        }
    }

    async fn execute(&self, sql: &str, values: &[BoundValue]) -> Result<DriverOutcome> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(sql)?;
        let params: Vec<Value> = values.iter().map(bound_to_sqlite).collect();

        if stmt.column_count() == 0 {
            let changed = stmt.execute(rusqlite::params_from_iter(params))?;
            return Ok(DriverOutcome::RowCount(changed as u64));
        }

        let columns: Vec<String> = stmt
            .column_names()
            .iter()
            .map(|name| name.to_string())
            .collect();
        let mut out_rows = Vec::new();
        let mut rows = stmt.query(rusqlite::params_from_iter(params))?;
        while let Some(row) = rows.next()? {
            let mut cells = Vec::with_capacity(columns.len());
            for i in 0..columns.len() {
                cells.push(cell_to_param(row.get_ref(i)?));
            }
            out_rows.push(cells);
        }

        Ok(DriverOutcome::Rows {
            columns,
            rows: out_rows,
        })
    }
}

fn bound_to_sqlite(bound: &BoundValue) -> Value {
    // Wrapped carriers render to the canonical text form for the declared
    // type; SQLite's storage classes cannot represent them natively
    param_to_sqlite(bound.value())
}

fn param_to_sqlite(value: &ParamValue) -> Value {
    match value {
        ParamValue::Null => Value::Null,
        ParamValue::Bool(b) => Value::Integer(i64::from(*b)),
        ParamValue::Int(i) => Value::Integer(*i),
        ParamValue::Float(f) => Value::Real(*f),
        ParamValue::Text(s) => Value::Text(s.clone()),
        ParamValue::Blob(b) => Value::Blob(b.clone()),
        ParamValue::Timestamp(ts) => Value::Text(ts.format("%Y-%m-%d %H:%M:%S%.f").to_string()),
        ParamValue::Decimal(d) => Value::Text(d.to_string()),
        ParamValue::Uuid(u) => Value::Text(u.to_string()),
        ParamValue::Json(j) => Value::Text(j.to_string()),
        ParamValue::Seq(items) => {
            let elements: Vec<serde_json::Value> = items.iter().map(param_to_json).collect();
            Value::Text(serde_json::Value::Array(elements).to_string())
        }
        ParamValue::Typed(typed) => param_to_sqlite(&typed.value),
    }
}

fn param_to_json(value: &ParamValue) -> serde_json::Value {
    match value {
        ParamValue::Null => serde_json::Value::Null,
        ParamValue::Bool(b) => serde_json::Value::Bool(*b),
        ParamValue::Int(i) => serde_json::Value::from(*i),
        ParamValue::Float(f) => serde_json::Value::from(*f),
        ParamValue::Text(s) => serde_json::Value::String(s.clone()),
        ParamValue::Json(j) => j.clone(),
        ParamValue::Seq(items) => {
            serde_json::Value::Array(items.iter().map(param_to_json).collect())
        }
        other => {
            let Value::Text(text) = param_to_sqlite(other) else {
                return serde_json::Value::Null;
            };
            serde_json::Value::String(text)
        }
    }
}

fn cell_to_param(cell: ValueRef<'_>) -> ParamValue {
    match cell {
        ValueRef::Null => ParamValue::Null,
        ValueRef::Integer(i) => ParamValue::Int(i),
        ValueRef::Real(f) => ParamValue::Float(f),
        ValueRef::Text(s) => ParamValue::Text(String::from_utf8_lossy(s).into_owned()),
        ValueRef::Blob(b) => ParamValue::Blob(b.to_vec()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SqlType;
    use rust_decimal::Decimal;

    #[tokio::test]
    async fn test_execute_round_trip() {
        let driver = SqliteDriver::open_in_memory().unwrap();

        let outcome = driver
            .execute("CREATE TABLE t (id INTEGER, name TEXT)", &[])
            .await
            .unwrap();
        assert_eq!(outcome, DriverOutcome::RowCount(0));

        let outcome = driver
            .execute(
                "INSERT INTO t VALUES (?, ?)",
                &[
                    BoundValue::Raw(ParamValue::Int(1)),
                    BoundValue::Raw(ParamValue::Text("alice".into())),
                ],
            )
            .await
            .unwrap();
        assert_eq!(outcome, DriverOutcome::RowCount(1));

        let outcome = driver
            .execute(
                "SELECT id, name FROM t WHERE id = ?",
                &[BoundValue::Raw(ParamValue::Int(1))],
            )
            .await
            .unwrap();
        match outcome {
            DriverOutcome::Rows { columns, rows } => {
                assert_eq!(columns, vec!["id", "name"]);
                assert_eq!(
                    rows,
                    vec![vec![ParamValue::Int(1), ParamValue::Text("alice".into())]]
                );
            }
            other => panic!("expected rows, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_wrapped_decimal_keeps_precision_as_text() {
        let driver = SqliteDriver::open_in_memory().unwrap();
        driver
            .execute("CREATE TABLE prices (amount TEXT)", &[])
            .await
            .unwrap();
        driver
            .execute(
                "INSERT INTO prices VALUES (?)",
                &[BoundValue::Wrapped {
                    declared: SqlType::Numeric,
                    value: ParamValue::Decimal(Decimal::new(1050, 2)),
                }],
            )
            .await
            .unwrap();

        let outcome = driver.execute("SELECT amount FROM prices", &[]).await.unwrap();
        match outcome {
            DriverOutcome::Rows { rows, .. } => {
                assert_eq!(rows[0][0], ParamValue::Text("10.50".into()));
            }
            other => panic!("expected rows, got {other:?}"),
        }
    }
}

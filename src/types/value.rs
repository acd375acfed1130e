use std::collections::HashMap;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use uuid::Uuid;

/// SQL-intended type carried by a wrapped value when the raw representation
/// alone is ambiguous to a driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SqlType {
    Boolean,
    BigInt,
    Double,
    Text,
    Bytea,
    Timestamp,
    Numeric,
    Uuid,
    Json,
    Array,
}

/// A value the caller already wrapped with its SQL type. Passed through
/// the dispatcher unchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct TypedValue {
    pub declared: SqlType,
    pub value: Box<ParamValue>,
}

/// Closed set of runtime value representations accepted as parameters.
/// Each variant maps to exactly one `ValueCategory` for table dispatch.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Blob(Vec<u8>),
    Timestamp(NaiveDateTime),
    Decimal(Decimal),
    Uuid(Uuid),
    Json(serde_json::Value),
    Seq(Vec<ParamValue>),
    Typed(TypedValue),
}

/// Dense discriminant used to index the bind-strategy table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(usize)]
pub enum ValueCategory {
    Null = 0,
    Bool = 1,
    Int = 2,
    Float = 3,
    Text = 4,
    Blob = 5,
    Timestamp = 6,
    Decimal = 7,
    Uuid = 8,
    Json = 9,
    Seq = 10,
    Typed = 11,
}

pub const VALUE_CATEGORY_COUNT: usize = 12;

impl ParamValue {
    #[inline]
    pub fn category(&self) -> ValueCategory {
        match self {
            ParamValue::Null => ValueCategory::Null,
            ParamValue::Bool(_) => ValueCategory::Bool,
            ParamValue::Int(_) => ValueCategory::Int,
            ParamValue::Float(_) => ValueCategory::Float,
            ParamValue::Text(_) => ValueCategory::Text,
            ParamValue::Blob(_) => ValueCategory::Blob,
            ParamValue::Timestamp(_) => ValueCategory::Timestamp,
            ParamValue::Decimal(_) => ValueCategory::Decimal,
            ParamValue::Uuid(_) => ValueCategory::Uuid,
            ParamValue::Json(_) => ValueCategory::Json,
            ParamValue::Seq(_) => ValueCategory::Seq,
            ParamValue::Typed(_) => ValueCategory::Typed,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ParamValue::Null)
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Int(v)
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Float(v)
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Bool(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Text(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::Text(v)
    }
}

impl<T: Into<ParamValue>> From<Option<T>> for ParamValue {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => ParamValue::Null,
        }
    }
}

/// One set of supplied parameter values, positional or named.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ParamSet {
    #[default]
    Empty,
    Positional(Vec<ParamValue>),
    Named(HashMap<String, ParamValue>),
}

impl ParamSet {
    pub fn positional<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<ParamValue>,
    {
        ParamSet::Positional(values.into_iter().map(Into::into).collect())
    }

    pub fn named<I, K, V>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<ParamValue>,
    {
        ParamSet::Named(
            values
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        match self {
            ParamSet::Empty => 0,
            ParamSet::Positional(v) => v.len(),
            ParamSet::Named(m) => m.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_is_dense() {
        let values = [
            ParamValue::Null,
            ParamValue::Bool(true),
            ParamValue::Int(1),
            ParamValue::Float(1.5),
            ParamValue::Text("x".into()),
            ParamValue::Blob(vec![0u8]),
            ParamValue::Timestamp(NaiveDateTime::default()),
            ParamValue::Decimal(Decimal::new(125, 2)),
            ParamValue::Uuid(Uuid::nil()),
            ParamValue::Json(serde_json::json!({})),
            ParamValue::Seq(vec![]),
            ParamValue::Typed(TypedValue {
                declared: SqlType::Text,
                value: Box::new(ParamValue::Null),
            }),
        ];
        for (idx, value) in values.iter().enumerate() {
            assert_eq!(value.category() as usize, idx);
        }
        assert_eq!(values.len(), VALUE_CATEGORY_COUNT);
    }

    #[test]
    fn test_option_maps_to_null() {
        assert_eq!(ParamValue::from(None::<i64>), ParamValue::Null);
        assert_eq!(ParamValue::from(Some(3i64)), ParamValue::Int(3));
    }
}

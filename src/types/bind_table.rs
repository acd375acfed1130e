use std::sync::LazyLock;

use crate::driver::DriverCapabilities;

use super::value::{ParamValue, SqlType, VALUE_CATEGORY_COUNT};

/// Decision for one parameter value: hand the raw value to the driver, or
/// wrap it in a type-preserving carrier first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindStrategy {
    PassThrough,
    Wrap(SqlType),
}

/// A parameter value as handed to the driver.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundValue {
    Raw(ParamValue),
    Wrapped { declared: SqlType, value: ParamValue },
}

impl BoundValue {
    pub fn value(&self) -> &ParamValue {
        match self {
            BoundValue::Raw(v) => v,
            BoundValue::Wrapped { value, .. } => value,
        }
    }

    pub fn is_wrapped(&self) -> bool {
        matches!(self, BoundValue::Wrapped { .. })
    }
}

type BindHandler = fn(&ParamValue) -> BindStrategy;

/// Bind-strategy lookup table indexed by `ValueCategory`. Resolved once at
/// process start; dispatch is a single indexed load, not a chain of type
/// checks.
pub struct BindTable {
    handlers: [BindHandler; VALUE_CATEGORY_COUNT],
}

impl BindTable {
    pub fn new() -> Self {
        Self {
            handlers: [
                // Null
                |_| BindStrategy::PassThrough,
                // Bool
                |_| BindStrategy::PassThrough,
                // Int
                |_| BindStrategy::PassThrough,
                // Float
                |_| BindStrategy::PassThrough,
                // Text
                |_| BindStrategy::PassThrough,
                // Blob
                |_| BindStrategy::PassThrough,
                // Timestamp: textual form is indistinguishable from TEXT
                |_| BindStrategy::Wrap(SqlType::Timestamp),
                // Decimal: precision is lost if coerced to float
                |_| BindStrategy::Wrap(SqlType::Numeric),
                // Uuid
                |_| BindStrategy::Wrap(SqlType::Uuid),
                // Json
                |_| BindStrategy::Wrap(SqlType::Json),
                // Seq: an empty collection has no element type to infer from
                |value| match value {
                    ParamValue::Seq(items) if items.is_empty() => {
                        BindStrategy::Wrap(SqlType::Array)
                    }
                    _ => BindStrategy::PassThrough,
                },
                // Typed: the caller already declared the type; keep it
                |value| match value {
                    ParamValue::Typed(typed) => BindStrategy::Wrap(typed.declared),
                    _ => BindStrategy::PassThrough,
                },
            ],
        }
    }

    /// Resolve the strategy for one value. Bypass drivers skip the table
    /// entirely so no wrapper is ever allocated for them.
    #[inline]
    pub fn plan(&self, value: &ParamValue, caps: &DriverCapabilities) -> BindStrategy {
        if caps.bypass_wrapping {
            return BindStrategy::PassThrough;
        }
        self.handlers[value.category() as usize](value)
    }

    /// Apply the strategy, producing the value the driver receives.
    pub fn apply(&self, value: ParamValue, caps: &DriverCapabilities) -> BoundValue {
        match self.plan(&value, caps) {
            BindStrategy::PassThrough => BoundValue::Raw(value),
            BindStrategy::Wrap(declared) => match value {
                // Already-wrapped values keep their original declaration
                ParamValue::Typed(typed) => BoundValue::Wrapped {
                    declared: typed.declared,
                    value: *typed.value,
                },
                other => BoundValue::Wrapped {
                    declared,
                    value: other,
                },
            },
        }
    }
}

impl Default for BindTable {
    fn default() -> Self {
        Self::new()
    }
}

static GLOBAL_BIND_TABLE: LazyLock<BindTable> = LazyLock::new(BindTable::new);

/// Get the process-wide bind table
pub fn global_bind_table() -> &'static BindTable {
    &GLOBAL_BIND_TABLE
}

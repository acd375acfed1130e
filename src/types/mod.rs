// Parameter value model and bind-strategy dispatch

mod bind_table;
mod value;

pub use bind_table::{BindStrategy, BindTable, BoundValue, global_bind_table};
pub use value::{ParamSet, ParamValue, SqlType, TypedValue, VALUE_CATEGORY_COUNT, ValueCategory};

// Driver collaborator surface: capability declaration and the execute
// entry point the dispatcher calls

pub mod sqlite;

use async_trait::async_trait;

pub use sqlite::SqliteDriver;

use crate::Result;
use crate::translator::PlaceholderStyle;
use crate::types::{BoundValue, ParamValue};

/// What a driver declares about itself. `bypass_wrapping` means the driver
/// interprets native values correctly on its own; the dispatcher then skips
/// type-preserving carriers for every value category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverCapabilities {
    pub placeholder_style: PlaceholderStyle,
    pub bypass_wrapping: bool,
}

/// Raw outcome of one driver call, before shaping.
#[derive(Debug, Clone, PartialEq)]
pub enum DriverOutcome {
    Rows {
        columns: Vec<String>,
        rows: Vec<Vec<ParamValue>>,
    },
    RowCount(u64),
}

impl DriverOutcome {
    pub fn row_count(&self) -> u64 {
        match self {
            DriverOutcome::Rows { rows, .. } => rows.len() as u64,
            DriverOutcome::RowCount(n) => *n,
        }
    }
}

/// A database driver as seen by the execution dispatcher. Connection and
/// pool management stay behind this trait; the core borrows the driver for
/// the duration of one call and never retains it.
#[async_trait]
pub trait Driver: Send + Sync {
    fn capabilities(&self) -> DriverCapabilities;

    async fn execute(&self, sql: &str, values: &[BoundValue]) -> Result<DriverOutcome>;
}

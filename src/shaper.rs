use crate::driver::DriverOutcome;
use crate::executor::ExecutionResult;
use crate::types::ParamValue;
use crate::{Result, SqlBridgeError};

/// Requested result shape.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RowShape {
    /// Rows pass through untouched with the driver's column metadata.
    /// No field-name resolution happens at all.
    #[default]
    Bare,
    /// Rows are reordered/projected onto the requested field names. The
    /// column-to-field correspondence is resolved once per result set,
    /// then applied per row by index.
    Mapped(Vec<String>),
}

/// Convert one raw driver outcome into the uniform result.
pub fn shape(
    outcome: DriverOutcome,
    target: &RowShape,
    statements_executed: usize,
) -> Result<ExecutionResult> {
    match outcome {
        DriverOutcome::RowCount(n) => Ok(ExecutionResult {
            columns: Vec::new(),
            rows: Vec::new(),
            row_count: n,
            statements_executed,
        }),
        DriverOutcome::Rows { columns, rows } => match target {
            RowShape::Bare => Ok(ExecutionResult {
                row_count: rows.len() as u64,
                columns,
                rows,
                statements_executed,
            }),
            RowShape::Mapped(fields) => {
                let indices = resolve_mapping(&columns, fields)?;
                let shaped: Vec<Vec<ParamValue>> = rows
                    .into_iter()
                    .map(|row| indices.iter().map(|&i| row[i].clone()).collect())
                    .collect();
                Ok(ExecutionResult {
                    columns: fields.clone(),
                    row_count: shaped.len() as u64,
                    rows: shaped,
                    statements_executed,
                })
            }
        },
    }
}

// Resolved once per result set from column metadata, never per row.
fn resolve_mapping(columns: &[String], fields: &[String]) -> Result<Vec<usize>> {
    fields
        .iter()
        .map(|field| {
            columns
                .iter()
                .position(|col| col == field)
                .or_else(|| columns.iter().position(|col| col.eq_ignore_ascii_case(field)))
                .ok_or_else(|| {
                    SqlBridgeError::ParameterBinding(format!(
                        "result set has no column `{field}` (columns: {})",
                        columns.join(", ")
                    ))
                })
        })
        .collect()
}

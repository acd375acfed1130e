// Execution dispatch: route a compiled statement plus bound parameters to
// single, batch, or script execution with minimal per-call overhead

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::CONFIG;
use crate::driver::Driver;
use crate::shaper::{RowShape, shape};
use crate::statement::CompiledStatement;
use crate::translator;
use crate::types::{ParamSet, ParamValue};
use crate::query::split_script;
use crate::{Result, SqlBridgeError};

/// Execution mode is explicit on the request; it is never inferred from
/// the SQL text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    Single,
    Many,
    Script,
}

/// Parameter values carried by a request.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ParamInput {
    #[default]
    None,
    Single(ParamSet),
    Batch(Vec<ParamSet>),
}

/// One execution: compiled statement, parameter set(s), mode, shape, and
/// an optional cancellation token. Per-call and unshared.
#[derive(Debug, Clone)]
pub struct ExecutionRequest {
    pub statement: Arc<CompiledStatement>,
    pub params: ParamInput,
    pub mode: ExecutionMode,
    pub shape: RowShape,
    pub strict_binding: bool,
    pub cancel: Option<CancellationToken>,
}

impl ExecutionRequest {
    pub fn single(statement: Arc<CompiledStatement>, values: ParamSet) -> Self {
        Self {
            statement,
            params: ParamInput::Single(values),
            mode: ExecutionMode::Single,
            shape: RowShape::Bare,
            strict_binding: CONFIG.strict_binding,
            cancel: None,
        }
    }

    pub fn many(statement: Arc<CompiledStatement>, sets: Vec<ParamSet>) -> Self {
        Self {
            statement,
            params: ParamInput::Batch(sets),
            mode: ExecutionMode::Many,
            shape: RowShape::Bare,
            strict_binding: CONFIG.strict_binding,
            cancel: None,
        }
    }

    pub fn script(statement: Arc<CompiledStatement>) -> Self {
        Self {
            statement,
            params: ParamInput::None,
            mode: ExecutionMode::Script,
            shape: RowShape::Bare,
            strict_binding: CONFIG.strict_binding,
            cancel: None,
        }
    }

    pub fn with_shape(mut self, shape: RowShape) -> Self {
        self.shape = shape;
        self
    }

    pub fn with_strict_binding(mut self, strict: bool) -> Self {
        self.strict_binding = strict;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }
}

/// Uniform result across drivers and modes.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<ParamValue>>,
    /// Returned rows for queries, affected rows otherwise
    pub row_count: u64,
    pub statements_executed: usize,
}

/// Dispatch one request to the driver.
///
/// Cancellation is checked at the checkpoints before conversion and before
/// each driver call; an in-flight driver call is awaited, never interrupted.
pub async fn execute(driver: &dyn Driver, request: ExecutionRequest) -> Result<ExecutionResult> {
    check_cancelled(&request.cancel)?;

    // One flag read per request. The traced path must never construct
    // span or log objects per row.
    let trace = CONFIG.trace_execution;
    if trace {
        debug!(
            mode = ?request.mode,
            sql = truncated(&request.statement.canonical_sql),
            "dispatching execution"
        );
    }

    let result = match request.mode {
        ExecutionMode::Single => execute_single(driver, &request).await,
        ExecutionMode::Many => execute_many(driver, &request).await,
        ExecutionMode::Script => execute_script(driver, &request).await,
    }?;

    if trace {
        debug!(
            rows = result.row_count,
            statements = result.statements_executed,
            "execution complete"
        );
    }
    Ok(result)
}

async fn execute_single(driver: &dyn Driver, request: &ExecutionRequest) -> Result<ExecutionResult> {
    let empty = ParamSet::Empty;
    let values = match &request.params {
        ParamInput::None => &empty,
        ParamInput::Single(values) => values,
        ParamInput::Batch(_) => {
            return Err(SqlBridgeError::ParameterBinding(
                "batch parameter sets require many mode".to_string(),
            ));
        }
    };

    let caps = driver.capabilities();
    let (rendered, bound) = translator::convert(
        &request.statement,
        values,
        caps.placeholder_style,
        &caps,
        request.strict_binding,
    )?;

    check_cancelled(&request.cancel)?;
    let outcome = driver
        .execute(&rendered.sql, &bound)
        .await
        .map_err(|e| execution_error(&rendered.sql, 0, e))?;

    shape(outcome, &request.shape, 1)
}

async fn execute_many(driver: &dyn Driver, request: &ExecutionRequest) -> Result<ExecutionResult> {
    let sets = match &request.params {
        ParamInput::Batch(sets) => sets,
        _ => {
            return Err(SqlBridgeError::ParameterBinding(
                "many mode requires a batch of parameter sets".to_string(),
            ));
        }
    };

    let caps = driver.capabilities();
    // Converted once; each set below is a binding application only
    let rendered = translator::render(&request.statement, caps.placeholder_style);

    let mut total = 0u64;
    for (index, set) in sets.iter().enumerate() {
        let bound = translator::bind_values(&rendered, set, &caps, request.strict_binding)
            .map_err(|e| SqlBridgeError::ParameterBinding(format!("item {index}: {e}")))?;

        check_cancelled(&request.cancel)?;
        let outcome = driver
            .execute(&rendered.sql, &bound)
            .await
            .map_err(|e| execution_error(&rendered.sql, index, e))?;
        total += outcome.row_count();
    }

    Ok(ExecutionResult {
        columns: Vec::new(),
        rows: Vec::new(),
        row_count: total,
        statements_executed: sets.len(),
    })
}

async fn execute_script(driver: &dyn Driver, request: &ExecutionRequest) -> Result<ExecutionResult> {
    if !matches!(request.params, ParamInput::None) {
        return Err(SqlBridgeError::ParameterBinding(
            "script mode takes no parameter values".to_string(),
        ));
    }

    let statements = split_script(&request.statement.canonical_sql);
    let mut total = 0u64;
    for (index, sql) in statements.iter().enumerate() {
        check_cancelled(&request.cancel)?;
        // Stop at the first failure; the error's index doubles as the
        // count of statements that succeeded before it
        let outcome = driver
            .execute(sql, &[])
            .await
            .map_err(|e| execution_error(sql, index, e))?;
        total += outcome.row_count();
    }

    Ok(ExecutionResult {
        columns: Vec::new(),
        rows: Vec::new(),
        row_count: total,
        statements_executed: statements.len(),
    })
}

fn check_cancelled(cancel: &Option<CancellationToken>) -> Result<()> {
    if let Some(token) = cancel
        && token.is_cancelled()
    {
        return Err(SqlBridgeError::Cancelled);
    }
    Ok(())
}

fn execution_error(sql: &str, index: usize, source: SqlBridgeError) -> SqlBridgeError {
    match source {
        // Cancellation and binding problems are not driver failures
        SqlBridgeError::Cancelled => SqlBridgeError::Cancelled,
        other => SqlBridgeError::Execution {
            statement: truncated(sql).to_string(),
            index,
            message: other.to_string(),
        },
    }
}

fn truncated(sql: &str) -> &str {
    let mut end = sql.len().min(80);
    while !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}

//! Statement Executor
//!
//! Runs a parsed statement end to end: validation, logical planning,
//! physical planning, and the open/next/close cycle of the operator tree.

use std::time::{Duration, Instant};
use kestrel_common::prelude::*;
use kestrel_sql::{format_plan, LogicalPlanGenerator, UpdateSqlNode, UpdateStmt};
use kestrel_storage::{Db, Trx};

use crate::physical_plan::PhysicalPlanGenerator;

/// Outcome of a data-modifying statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    pub rows_affected: usize,
    pub elapsed: Duration,
}

#[derive(Debug, Clone, Default)]
pub struct StatementExecutor {
    config: ExecutionConfig,
}

impl StatementExecutor {
    pub fn new(config: ExecutionConfig) -> Self {
        Self { config }
    }

    /// Validate, plan, and run an UPDATE under `trx`.
    ///
    /// Rows already rewritten when a later row fails stay rewritten; undoing
    /// them is left to whoever owns `trx`.
    pub fn execute_update(&self, db: &Db, update: &UpdateSqlNode, trx: &Trx) -> Result<ExecutionResult> {
        let start = Instant::now();
        let stmt = UpdateStmt::create(db, update)?;
        let logical = LogicalPlanGenerator::create_update(&stmt);
        trace!(plan = %format_plan(&logical, 0), "logical plan");

        let mut op = PhysicalPlanGenerator::new(self.config.clone()).create(logical)?;
        let before = trx.update_count();
        let opened = op.open(trx);
        let closed = op.close();
        opened?;
        closed?;

        let result = ExecutionResult {
            rows_affected: trx.update_count() - before,
            elapsed: start.elapsed(),
        };
        if result.elapsed > self.config.slow_statement_threshold {
            warn!(
                table = %stmt.table().name(),
                elapsed = %humantime::format_duration(result.elapsed),
                "slow statement"
            );
        }
        info!(table = %stmt.table().name(), rows = result.rows_affected, txn = %trx.id(), "update executed");
        Ok(result)
    }
}

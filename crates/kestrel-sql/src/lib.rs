//! # Kestrel SQL
//!
//! Statement layer for KestrelDB providing:
//! - Parse-tree nodes for UPDATE and WHERE conditions
//! - Filter compilation against a table schema
//! - UPDATE validation
//! - Logical operators and the logical plan generator

pub mod ast;
pub mod filter;
pub mod planner;
pub mod update_stmt;

pub use ast::{CompOp, ConditionSqlNode, Operand, RelAttr, UpdateSqlNode};
pub use filter::{FilterObj, FilterStmt, FilterUnit};
pub use planner::{
    format_plan, LogicalOperator, LogicalOperatorType, LogicalPlanGenerator,
    UpdateLogicalOperator,
};
pub use update_stmt::UpdateStmt;

//! Logical Planning
//!
//! Provides the logical operator tree for validated statements:
//! - Logical operator nodes (table get, predicate, update)
//! - The logical plan generator
//! - Plan pretty printing

use std::fmt;
use std::sync::Arc;
use kestrel_common::prelude::*;
use kestrel_storage::Table;

use crate::filter::FilterStmt;
use crate::update_stmt::UpdateStmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalOperatorType {
    TableGet,
    Predicate,
    Update,
}

impl fmt::Display for LogicalOperatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LogicalOperatorType::TableGet => "TABLE_GET",
            LogicalOperatorType::Predicate => "PREDICATE",
            LogicalOperatorType::Update => "UPDATE",
        };
        f.write_str(name)
    }
}

/// Logical plan node
#[derive(Debug, Clone)]
pub enum LogicalOperator {
    /// Read every record of a table
    TableGet {
        table: Arc<dyn Table>,
        /// False when the records will be written back by an ancestor
        read_only: bool,
    },
    /// Keep the child's records accepted by `filter`
    Predicate {
        filter: FilterStmt,
        child: Box<LogicalOperator>,
    },
    /// Rewrite the records produced by the child
    Update(UpdateLogicalOperator),
}

impl LogicalOperator {
    pub fn kind(&self) -> LogicalOperatorType {
        match self {
            LogicalOperator::TableGet { .. } => LogicalOperatorType::TableGet,
            LogicalOperator::Predicate { .. } => LogicalOperatorType::Predicate,
            LogicalOperator::Update(_) => LogicalOperatorType::Update,
        }
    }

    pub fn children(&self) -> Vec<&LogicalOperator> {
        match self {
            LogicalOperator::TableGet { .. } => Vec::new(),
            LogicalOperator::Predicate { child, .. } => vec![child.as_ref()],
            LogicalOperator::Update(update) => update.children.iter().collect(),
        }
    }
}

/// Planned form of an UPDATE.
///
/// Holds the target table, the values and the fields they are written to,
/// and a single child that produces the records to rewrite.
#[derive(Debug, Clone)]
pub struct UpdateLogicalOperator {
    table: Arc<dyn Table>,
    values: Vec<Value>,
    fields: Vec<FieldMeta>,
    children: Vec<LogicalOperator>,
}

impl UpdateLogicalOperator {
    pub fn new(table: Arc<dyn Table>, values: Vec<Value>, fields: Vec<FieldMeta>) -> Self {
        Self {
            table,
            values,
            fields,
            children: Vec::new(),
        }
    }

    pub fn table(&self) -> &Arc<dyn Table> {
        &self.table
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn fields(&self) -> &[FieldMeta] {
        &self.fields
    }

    pub fn children(&self) -> &[LogicalOperator] {
        &self.children
    }

    pub fn add_child(&mut self, child: LogicalOperator) {
        self.children.push(child);
    }

    /// Split into `(table, values, fields, children)` for physical planning
    pub fn into_parts(self) -> (Arc<dyn Table>, Vec<Value>, Vec<FieldMeta>, Vec<LogicalOperator>) {
        (self.table, self.values, self.fields, self.children)
    }
}

/// Builds logical plans from validated statements
pub struct LogicalPlanGenerator;

impl LogicalPlanGenerator {
    /// `Update -> [Predicate ->] TableGet`
    ///
    /// The scan is planned read-write since its records are written back, and
    /// the predicate is left out when there is nothing to filter.
    pub fn create_update(stmt: &UpdateStmt) -> LogicalOperator {
        let table = stmt.table().clone();
        let mut source = LogicalOperator::TableGet {
            table: table.clone(),
            read_only: false,
        };
        if !stmt.filter().is_empty() {
            source = LogicalOperator::Predicate {
                filter: stmt.filter().clone(),
                child: Box::new(source),
            };
        }

        let mut update =
            UpdateLogicalOperator::new(table, stmt.values().to_vec(), stmt.fields().to_vec());
        update.add_child(source);
        trace!(table = %update.table.name(), "update plan created");
        LogicalOperator::Update(update)
    }
}

/// Pretty print a logical plan
pub fn format_plan(plan: &LogicalOperator, indent: usize) -> String {
    let prefix = "  ".repeat(indent);
    let mut result = String::new();

    match plan {
        LogicalOperator::TableGet { table, read_only } => {
            result.push_str(&format!(
                "{}TableGet: {} [{}]\n",
                prefix,
                table.name(),
                if *read_only { "read" } else { "read/write" }
            ));
        }

        LogicalOperator::Predicate { filter, child } => {
            result.push_str(&format!(
                "{}Predicate: {} units\n",
                prefix,
                filter.filter_units().len()
            ));
            result.push_str(&format_plan(child, indent + 1));
        }

        LogicalOperator::Update(update) => {
            let names: Vec<&str> = update.fields.iter().map(|f| f.name.as_str()).collect();
            result.push_str(&format!(
                "{}Update: {} [{}]\n",
                prefix,
                update.table.name(),
                names.join(", ")
            ));
            for child in &update.children {
                result.push_str(&format_plan(child, indent + 1));
            }
        }
    }

    result
}

//! Physical Plan Generation
//!
//! Translates logical operator trees into executable operator trees.

use kestrel_common::prelude::*;
use kestrel_sql::LogicalOperator;

use crate::operator::PhysicalOperator;
use crate::predicate::PredicatePhysicalOperator;
use crate::table_scan::TableScanPhysicalOperator;
use crate::update::UpdatePhysicalOperator;

/// Builds physical operators from logical plans
#[derive(Debug, Clone, Default)]
pub struct PhysicalPlanGenerator {
    config: ExecutionConfig,
}

impl PhysicalPlanGenerator {
    pub fn new(config: ExecutionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExecutionConfig {
        &self.config
    }

    pub fn create(&self, plan: LogicalOperator) -> Result<Box<dyn PhysicalOperator>> {
        match plan {
            LogicalOperator::TableGet { table, read_only } => {
                Ok(Box::new(TableScanPhysicalOperator::new(table, read_only)))
            }

            LogicalOperator::Predicate { filter, child } => {
                let mut op = PredicatePhysicalOperator::new(filter);
                op.add_child(self.create(*child)?);
                Ok(Box::new(op))
            }

            LogicalOperator::Update(update) => {
                let (table, values, fields, children) = update.into_parts();
                if children.len() > 1 {
                    return Err(Error::internal(format!(
                        "update plan must have at most one child, has {}",
                        children.len()
                    )));
                }
                let mut op = UpdatePhysicalOperator::new(table, values, fields)
                    .with_buffer_limit(self.config.update_buffer_limit);
                for child in children {
                    op.add_child(self.create(child)?);
                }
                Ok(Box::new(op))
            }
        }
    }
}

/// Pretty print a physical operator tree
pub fn format_physical_plan(op: &dyn PhysicalOperator, indent: usize) -> String {
    let mut output = format!("{}{}\n", "  ".repeat(indent), op.kind());
    for child in op.children() {
        output.push_str(&format_physical_plan(child.as_ref(), indent + 1));
    }
    output
}

//! Row filter.

use kestrel_common::prelude::*;
use kestrel_sql::FilterStmt;
use kestrel_storage::Trx;

use crate::operator::{PhysicalOperator, PhysicalOperatorType, Tuple};

/// Passes through the child's row tuples that satisfy `filter`
#[derive(Debug)]
pub struct PredicatePhysicalOperator {
    filter: FilterStmt,
    children: Vec<Box<dyn PhysicalOperator>>,
}

impl PredicatePhysicalOperator {
    pub fn new(filter: FilterStmt) -> Self {
        Self {
            filter,
            children: Vec::new(),
        }
    }

    fn child(&mut self) -> Result<&mut Box<dyn PhysicalOperator>> {
        self.children
            .first_mut()
            .ok_or_else(|| Error::internal("predicate operator has no child"))
    }
}

impl PhysicalOperator for PredicatePhysicalOperator {
    fn kind(&self) -> PhysicalOperatorType {
        PhysicalOperatorType::Predicate
    }

    fn open(&mut self, trx: &Trx) -> Result<()> {
        if self.children.len() != 1 {
            return Err(Error::internal(format!(
                "predicate operator must have one child, has {}",
                self.children.len()
            )));
        }
        self.child()?.open(trx)
    }

    fn next(&mut self) -> Result<bool> {
        while self.child()?.next()? {
            let record = match self.children[0].current_tuple() {
                Some(tuple) => tuple
                    .record()
                    .ok_or_else(|| Error::internal("predicate input is not a row"))?,
                None => return Err(Error::internal("child produced no tuple")),
            };
            if self.filter.evaluate(record)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn close(&mut self) -> Result<()> {
        self.child()?.close()
    }

    fn current_tuple(&self) -> Option<&Tuple> {
        self.children.first().and_then(|child| child.current_tuple())
    }

    fn children(&self) -> &[Box<dyn PhysicalOperator>] {
        &self.children
    }

    fn add_child(&mut self, child: Box<dyn PhysicalOperator>) {
        self.children.push(child);
    }
}

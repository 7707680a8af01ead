//! Sequential scan over a live table.

use std::sync::Arc;
use kestrel_common::prelude::*;
use kestrel_storage::{Table, Trx};

use crate::operator::{PhysicalOperator, PhysicalOperatorType, RowTuple, Tuple};

/// Walks the table slot by slot, reading the record at the cursor on every
/// `next`. Writes made to the table while the scan is open are visible to
/// it, and a rewrite that moves a record can make the cursor skip or revisit
/// rows.
#[derive(Debug)]
pub struct TableScanPhysicalOperator {
    table: Arc<dyn Table>,
    /// Shared by every tuple the scan yields
    meta: Arc<TableMeta>,
    read_only: bool,
    trx: Option<Trx>,
    cursor: usize,
    current: Option<Tuple>,
    children: Vec<Box<dyn PhysicalOperator>>,
}

impl TableScanPhysicalOperator {
    pub fn new(table: Arc<dyn Table>, read_only: bool) -> Self {
        Self {
            meta: Arc::new(table.table_meta().clone()),
            table,
            read_only,
            trx: None,
            cursor: 0,
            current: None,
            children: Vec::new(),
        }
    }

    pub fn table(&self) -> &Arc<dyn Table> {
        &self.table
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }
}

impl PhysicalOperator for TableScanPhysicalOperator {
    fn kind(&self) -> PhysicalOperatorType {
        PhysicalOperatorType::TableScan
    }

    fn open(&mut self, trx: &Trx) -> Result<()> {
        self.trx = Some(trx.clone());
        self.cursor = 0;
        self.current = None;
        trace!(table = %self.table.name(), read_only = self.read_only, "table scan opened");
        Ok(())
    }

    fn next(&mut self) -> Result<bool> {
        let trx = self
            .trx
            .as_ref()
            .ok_or_else(|| Error::internal("table scan used before open"))?;
        match self.table.record_at(trx, self.cursor)? {
            Some(record) => {
                self.cursor += 1;
                self.current = Some(Tuple::Row(RowTuple::new(record, Arc::clone(&self.meta))));
                Ok(true)
            }
            None => {
                self.current = None;
                Ok(false)
            }
        }
    }

    fn close(&mut self) -> Result<()> {
        self.trx = None;
        self.current = None;
        Ok(())
    }

    fn current_tuple(&self) -> Option<&Tuple> {
        self.current.as_ref()
    }

    fn children(&self) -> &[Box<dyn PhysicalOperator>] {
        &self.children
    }

    fn add_child(&mut self, child: Box<dyn PhysicalOperator>) {
        self.children.push(child);
    }
}

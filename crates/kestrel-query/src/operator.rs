//! Physical operator protocol.
//!
//! Operators form a Volcano-style tree. A consumer calls `open` once, then
//! `next` until it returns `Ok(false)`, reading `current_tuple` after each
//! `Ok(true)`, and finally `close`.

use std::fmt;
use std::sync::Arc;
use kestrel_common::prelude::*;
use kestrel_storage::{Record, Trx};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhysicalOperatorType {
    TableScan,
    Predicate,
    ScalarAggregate,
    Update,
}

impl fmt::Display for PhysicalOperatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PhysicalOperatorType::TableScan => "TABLE_SCAN",
            PhysicalOperatorType::Predicate => "PREDICATE",
            PhysicalOperatorType::ScalarAggregate => "SCALAR_AGGREGATE",
            PhysicalOperatorType::Update => "UPDATE",
        };
        f.write_str(name)
    }
}

pub trait PhysicalOperator: fmt::Debug {
    fn kind(&self) -> PhysicalOperatorType;

    /// Prepare for iteration; `trx` is forwarded to children and storage.
    fn open(&mut self, trx: &Trx) -> Result<()>;

    /// Advance to the next tuple. `Ok(false)` marks end of stream.
    fn next(&mut self) -> Result<bool>;

    fn close(&mut self) -> Result<()>;

    /// Tuple produced by the last successful `next`
    fn current_tuple(&self) -> Option<&Tuple>;

    fn children(&self) -> &[Box<dyn PhysicalOperator>];

    fn add_child(&mut self, child: Box<dyn PhysicalOperator>);
}

// ============================================================================
// Tuples
// ============================================================================

/// A row flowing between operators
#[derive(Debug, Clone, PartialEq)]
pub enum Tuple {
    /// A stored record, still tied to its row id
    Row(RowTuple),
    /// Computed values with no backing record
    Values(ValueListTuple),
}

impl Tuple {
    pub fn cell_num(&self) -> usize {
        match self {
            Tuple::Row(row) => row.record.len(),
            Tuple::Values(values) => values.cells.len(),
        }
    }

    pub fn cell_at(&self, index: usize) -> Result<&Value> {
        match self {
            Tuple::Row(row) => row.cell_at(index),
            Tuple::Values(values) => values.cell_at(index),
        }
    }

    pub fn record(&self) -> Option<&Record> {
        match self {
            Tuple::Row(row) => Some(&row.record),
            Tuple::Values(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RowTuple {
    record: Record,
    meta: Arc<TableMeta>,
}

impl RowTuple {
    pub fn new(record: Record, meta: Arc<TableMeta>) -> Self {
        Self { record, meta }
    }

    pub fn record(&self) -> &Record {
        &self.record
    }

    pub fn table_meta(&self) -> &TableMeta {
        &self.meta
    }

    pub fn cell_at(&self, index: usize) -> Result<&Value> {
        self.record.value_at(index).ok_or_else(|| {
            Error::invalid_argument(format!(
                "cell index {} out of range for {} ({} fields)",
                index,
                self.meta.name,
                self.record.len()
            ))
        })
    }

    /// Cell of the named field, if the table has one
    pub fn find_cell(&self, field_name: &str) -> Option<&Value> {
        self.meta
            .field_index(field_name)
            .and_then(|i| self.record.value_at(i))
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ValueListTuple {
    cells: Vec<Value>,
}

impl ValueListTuple {
    pub fn new(cells: Vec<Value>) -> Self {
        Self { cells }
    }

    pub fn cells(&self) -> &[Value] {
        &self.cells
    }

    pub fn cell_at(&self, index: usize) -> Result<&Value> {
        self.cells.get(index).ok_or_else(|| {
            Error::invalid_argument(format!(
                "cell index {} out of range ({} cells)",
                index,
                self.cells.len()
            ))
        })
    }
}

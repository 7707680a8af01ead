//! End-to-end tests for UPDATE execution
//!
//! Drives the full pipeline (validation, logical plan, physical plan, and
//! operator execution) against an instrumented table that records every
//! storage call:
//! - All matching rows are read before the first write
//! - A failing write stops the loop and leaves earlier writes applied
//! - A single-pass scan-and-write loop skips rows, which buffering avoids

use parking_lot::Mutex;
use std::sync::Arc;
use kestrel_common::error::StorageError;
use kestrel_common::prelude::*;
use kestrel_common::testing::fixtures;
use kestrel_query::{PhysicalOperator, PhysicalPlanGenerator, TableScanPhysicalOperator, Tuple};
use kestrel_sql::{CompOp, ConditionSqlNode, LogicalPlanGenerator, UpdateSqlNode, UpdateStmt};
use kestrel_storage::{Db, MemTable, Record, Table, Trx, TrxFactory};

// ============================================================================
// Test Helpers
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Read(usize),
    Update(RowId),
}

/// Delegates to a [`MemTable`], logging calls and optionally failing the
/// n-th update (1-based).
#[derive(Debug)]
struct InstrumentedTable {
    inner: MemTable,
    calls: Mutex<Vec<Call>>,
    fail_update: Option<usize>,
}

impl InstrumentedTable {
    fn new(fail_update: Option<usize>) -> Self {
        Self {
            inner: MemTable::new(fixtures::id_x_meta()),
            calls: Mutex::new(Vec::new()),
            fail_update,
        }
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    fn updated_rids(&self) -> Vec<u64> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Update(rid) => Some(rid.0),
                Call::Read(_) => None,
            })
            .collect()
    }

    fn rows(&self) -> Vec<(i32, i32)> {
        self.inner
            .scan_all()
            .iter()
            .map(|r| (r.values()[0].get_int(), r.values()[1].get_int()))
            .collect()
    }
}

impl Table for InstrumentedTable {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn table_meta(&self) -> &TableMeta {
        self.inner.table_meta()
    }

    fn record_count(&self, trx: &Trx) -> usize {
        self.inner.record_count(trx)
    }

    fn record_at(&self, trx: &Trx, index: usize) -> Result<Option<Record>> {
        self.calls.lock().push(Call::Read(index));
        self.inner.record_at(trx, index)
    }

    fn insert_record(&self, trx: &Trx, values: Vec<Value>) -> Result<RowId> {
        self.inner.insert_record(trx, values)
    }

    fn update_record(
        &self,
        trx: &Trx,
        record: &Record,
        values: &[Value],
        fields: &[FieldMeta],
    ) -> Result<()> {
        let attempt = {
            let mut calls = self.calls.lock();
            calls.push(Call::Update(record.rid()));
            calls.iter().filter(|c| matches!(c, Call::Update(_))).count()
        };
        if self.fail_update == Some(attempt) {
            return Err(StorageError::IoError(format!("injected failure on update {}", attempt)).into());
        }
        self.inner.update_record(trx, record, values, fields)
    }
}

/// `t = [{1,5},{2,5},{3,9}]` behind an instrumented table
fn setup(fail_update: Option<usize>) -> (Db, Arc<InstrumentedTable>, Trx) {
    let db = Db::new("it");
    let table = Arc::new(InstrumentedTable::new(fail_update));
    db.add_table(table.clone()).unwrap();
    let trx = TrxFactory::new().begin();
    for (id, x) in [(1, 5), (2, 5), (3, 9)] {
        table
            .insert_record(&trx, vec![Value::Ints(id), Value::Ints(x)])
            .unwrap();
    }
    (db, table, trx)
}

fn plan(db: &Db, update: &UpdateSqlNode) -> Box<dyn PhysicalOperator> {
    let stmt = UpdateStmt::create(db, update).unwrap();
    PhysicalPlanGenerator::default()
        .create(LogicalPlanGenerator::create_update(&stmt))
        .unwrap()
}

fn set_x_where_x(to: i32, from: i32) -> UpdateSqlNode {
    UpdateSqlNode::new("t")
        .set("x", to)
        .filter(ConditionSqlNode::attr_cmp("x", CompOp::Eq, from))
}

// ============================================================================
// Buffer-then-write
// ============================================================================

mod buffering {
    use super::*;

    #[test]
    fn test_update_matching_rows() {
        let (db, table, trx) = setup(None);
        let mut op = plan(&db, &set_x_where_x(10, 5));

        op.open(&trx).unwrap();
        assert!(!op.next().unwrap());
        assert!(op.current_tuple().is_none());
        op.close().unwrap();

        assert_eq!(table.rows(), vec![(1, 10), (2, 10), (3, 9)]);
        assert_eq!(table.updated_rids(), vec![1, 2]);
        assert_eq!(trx.update_count(), 2);
    }

    #[test]
    fn test_every_read_precedes_first_write() {
        let (db, table, trx) = setup(None);
        let mut op = plan(&db, &set_x_where_x(10, 5));
        op.open(&trx).unwrap();
        op.close().unwrap();

        let calls = table.calls();
        let first_write = calls
            .iter()
            .position(|c| matches!(c, Call::Update(_)))
            .unwrap();
        assert!(calls[..first_write].iter().all(|c| matches!(c, Call::Read(_))));
        assert!(calls[first_write..].iter().all(|c| matches!(c, Call::Update(_))));
        // three records plus the read that finds the end of the table
        assert_eq!(first_write, 4);
    }

    #[test]
    fn test_no_match_writes_nothing() {
        let (db, table, trx) = setup(None);
        let mut op = plan(&db, &set_x_where_x(1, 42));
        op.open(&trx).unwrap();
        op.close().unwrap();
        assert!(table.updated_rids().is_empty());
        assert_eq!(table.rows(), vec![(1, 5), (2, 5), (3, 9)]);
    }

    #[test]
    fn test_update_without_filter_touches_all() {
        let (db, table, trx) = setup(None);
        let mut op = plan(&db, &UpdateSqlNode::new("t").set("x", 0));
        op.open(&trx).unwrap();
        op.close().unwrap();
        assert_eq!(table.rows(), vec![(1, 0), (2, 0), (3, 0)]);
        assert_eq!(table.updated_rids(), vec![1, 2, 3]);
    }
}

// ============================================================================
// Partial Failure
// ============================================================================

mod partial_failure {
    use super::*;

    #[test]
    fn test_second_write_failure_keeps_first() {
        let (db, table, trx) = setup(Some(2));
        let mut op = plan(&db, &UpdateSqlNode::new("t").set("x", 10));

        let err = op.open(&trx).unwrap_err();
        assert!(matches!(err, Error::Storage(StorageError::IoError(_))));
        op.close().unwrap();

        // first applied, second failed, third never attempted
        assert_eq!(table.updated_rids(), vec![1, 2]);
        assert_eq!(table.rows(), vec![(1, 10), (2, 5), (3, 9)]);
        assert_eq!(trx.update_count(), 1);
    }

    #[test]
    fn test_failure_is_reproducible() {
        for _ in 0..3 {
            let (db, table, trx) = setup(Some(2));
            let mut op = plan(&db, &UpdateSqlNode::new("t").set("x", 10));
            assert!(op.open(&trx).is_err());
            assert_eq!(table.rows(), vec![(1, 10), (2, 5), (3, 9)]);
        }
    }
}

// ============================================================================
// Single-pass Hazard
// ============================================================================

mod single_pass {
    use super::*;

    /// Writing each match while the scan is still open moves the rewritten
    /// record to the tail, so the record that slides into its slot is never
    /// visited.
    #[test]
    fn test_write_during_scan_skips_rows() {
        let (_db, table, trx) = setup(None);
        let x = table.table_meta().field("x").unwrap().clone();
        let mut scan = TableScanPhysicalOperator::new(table.clone(), false);

        scan.open(&trx).unwrap();
        while scan.next().unwrap() {
            let record = match scan.current_tuple() {
                Some(Tuple::Row(row)) => row.record().clone(),
                other => panic!("unexpected tuple {:?}", other),
            };
            if record.value_at(1) == Some(&Value::Ints(5)) {
                table
                    .update_record(&trx, &record, &[Value::Ints(10)], std::slice::from_ref(&x))
                    .unwrap();
            }
        }
        scan.close().unwrap();

        assert_eq!(table.rows(), vec![(1, 10), (2, 5), (3, 9)]);
    }

    #[test]
    fn test_buffered_update_reaches_every_row() {
        let (db, table, trx) = setup(None);
        let mut op = plan(&db, &set_x_where_x(10, 5));
        op.open(&trx).unwrap();
        op.close().unwrap();
        assert_eq!(table.rows(), vec![(1, 10), (2, 10), (3, 9)]);
    }
}

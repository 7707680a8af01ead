//! UPDATE execution.
//!
//! The child scans the same table this operator writes to, so `open` runs in
//! two phases: every matching record is copied out of the child and the child
//! is closed, and only then is the first record rewritten. Rewriting during
//! the scan would let the cursor observe its own writes.

use std::sync::Arc;
use kestrel_common::error::QueryError;
use kestrel_common::prelude::*;
use kestrel_storage::{Record, Table, Trx};

use crate::operator::{PhysicalOperator, PhysicalOperatorType, Tuple};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateState {
    Unopened,
    /// Draining the child into the buffer
    Buffering,
    /// Writing buffered records back
    Applying,
    Closed,
}

#[derive(Debug)]
pub struct UpdatePhysicalOperator {
    table: Arc<dyn Table>,
    values: Vec<Value>,
    fields: Vec<FieldMeta>,
    /// Maximum number of buffered records, 0 for no limit
    buffer_limit: usize,
    records: Vec<Record>,
    state: UpdateState,
    children: Vec<Box<dyn PhysicalOperator>>,
}

impl UpdatePhysicalOperator {
    pub fn new(table: Arc<dyn Table>, values: Vec<Value>, fields: Vec<FieldMeta>) -> Self {
        Self {
            table,
            values,
            fields,
            buffer_limit: 0,
            records: Vec::new(),
            state: UpdateState::Unopened,
            children: Vec::new(),
        }
    }

    pub fn with_buffer_limit(mut self, limit: usize) -> Self {
        self.buffer_limit = limit;
        self
    }

    pub fn state(&self) -> UpdateState {
        self.state
    }

    /// Records collected from the child and not yet released by `close`
    pub fn buffered_records(&self) -> &[Record] {
        &self.records
    }

    fn buffer_child(&mut self, trx: &Trx) -> Result<()> {
        let child = self.children[0].as_mut();
        child.open(trx)?;
        let drained = drain_rows(child, &mut self.records, self.buffer_limit);
        let closed = child.close();
        drained?;
        closed
    }
}

/// Copy every record the child yields into `records`.
fn drain_rows(
    child: &mut dyn PhysicalOperator,
    records: &mut Vec<Record>,
    limit: usize,
) -> Result<()> {
    while child.next()? {
        let record = match child.current_tuple() {
            Some(Tuple::Row(row)) => row.record().clone(),
            Some(Tuple::Values(_)) => {
                return Err(Error::internal("update input is not a stored row"))
            }
            None => return Err(Error::internal("child produced no tuple")),
        };
        if limit > 0 && records.len() >= limit {
            warn!(limit, "update buffer limit exceeded");
            return Err(QueryError::OutOfMemory.into());
        }
        records.push(record);
    }
    Ok(())
}

impl PhysicalOperator for UpdatePhysicalOperator {
    fn kind(&self) -> PhysicalOperatorType {
        PhysicalOperatorType::Update
    }

    fn open(&mut self, trx: &Trx) -> Result<()> {
        if self.children.is_empty() {
            return Ok(());
        }
        if self.children.len() != 1 {
            return Err(Error::internal(format!(
                "update operator must have one child, has {}",
                self.children.len()
            )));
        }

        self.records.clear();
        self.state = UpdateState::Buffering;
        if let Err(e) = self.buffer_child(trx) {
            warn!(table = %self.table.name(), error = %e, "failed to collect records to update");
            return Err(e);
        }
        debug!(table = %self.table.name(), records = self.records.len(), "update records buffered");

        self.state = UpdateState::Applying;
        for record in &self.records {
            if let Err(e) = self
                .table
                .update_record(trx, record, &self.values, &self.fields)
            {
                warn!(table = %self.table.name(), rid = %record.rid(), error = %e, "failed to update record");
                return Err(e);
            }
        }
        Ok(())
    }

    fn next(&mut self) -> Result<bool> {
        Ok(false)
    }

    fn close(&mut self) -> Result<()> {
        self.records.clear();
        self.state = UpdateState::Closed;
        Ok(())
    }

    fn current_tuple(&self) -> Option<&Tuple> {
        None
    }

    fn children(&self) -> &[Box<dyn PhysicalOperator>] {
        &self.children
    }

    fn add_child(&mut self, child: Box<dyn PhysicalOperator>) {
        self.children.push(child);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operator::{RowTuple, ValueListTuple};
    use crate::table_scan::TableScanPhysicalOperator;
    use kestrel_common::error::StorageError;
    use kestrel_common::testing::fixtures;
    use kestrel_storage::{Db, MemTable, TrxFactory};
    use parking_lot::Mutex;

    /// Child that yields fixed tuples and can fail on the n-th `next` (1-based).
    /// `close` logs how many updates the transaction had seen by then.
    #[derive(Debug)]
    struct ScriptedChild {
        tuples: Vec<Tuple>,
        fail_on: Option<usize>,
        pulls: usize,
        trx: Option<Trx>,
        current: Option<Tuple>,
        log: Arc<Mutex<Vec<String>>>,
        children: Vec<Box<dyn PhysicalOperator>>,
    }

    impl ScriptedChild {
        fn new(tuples: Vec<Tuple>, fail_on: Option<usize>) -> (Self, Arc<Mutex<Vec<String>>>) {
            let log = Arc::new(Mutex::new(Vec::new()));
            let child = Self {
                tuples,
                fail_on,
                pulls: 0,
                trx: None,
                current: None,
                log: log.clone(),
                children: Vec::new(),
            };
            (child, log)
        }
    }

    impl PhysicalOperator for ScriptedChild {
        fn kind(&self) -> PhysicalOperatorType {
            PhysicalOperatorType::TableScan
        }

        fn open(&mut self, trx: &Trx) -> Result<()> {
            self.trx = Some(trx.clone());
            self.log.lock().push("open".to_string());
            Ok(())
        }

        fn next(&mut self) -> Result<bool> {
            self.pulls += 1;
            self.log.lock().push("next".to_string());
            if self.fail_on == Some(self.pulls) {
                return Err(StorageError::IoError("boom".to_string()).into());
            }
            self.current = self.tuples.get(self.pulls - 1).cloned();
            Ok(self.current.is_some())
        }

        fn close(&mut self) -> Result<()> {
            let updates = self.trx.as_ref().map_or(0, |trx| trx.update_count());
            self.log.lock().push(format!("close after {} updates", updates));
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

    fn row_tuples(table: &MemTable) -> Vec<Tuple> {
        let meta = Arc::new(table.table_meta().clone());
        table
            .scan_all()
            .into_iter()
            .map(|record| Tuple::Row(RowTuple::new(record, meta.clone())))
            .collect()
    }

    fn update_from(db: &Db, child: ScriptedChild) -> UpdatePhysicalOperator {
        let table = db.find_table("t").unwrap();
        let x = table.table_meta().field("x").unwrap().clone();
        let mut op = UpdatePhysicalOperator::new(table, vec![Value::Ints(9)], vec![x]);
        op.add_child(Box::new(child));
        op
    }

    fn seeded(rows: usize) -> (Db, Arc<MemTable>, Trx) {
        let db = Db::new("test");
        let table = db.create_table(fixtures::id_x_meta()).unwrap();
        let trx = TrxFactory::new().begin();
        for id in 1..=rows as i32 {
            table
                .insert_record(&trx, vec![Value::Ints(id), Value::Ints(0)])
                .unwrap();
        }
        (db, table, trx)
    }

    fn update_all(db: &Db, value: i32) -> UpdatePhysicalOperator {
        let table = db.find_table("t").unwrap();
        let x = table.table_meta().field("x").unwrap().clone();
        let mut op = UpdatePhysicalOperator::new(table.clone(), vec![Value::Ints(value)], vec![x]);
        op.add_child(Box::new(TableScanPhysicalOperator::new(table, false)));
        op
    }

    #[test]
    fn test_updates_every_row_once() {
        let (db, table, trx) = seeded(4);
        let mut op = update_all(&db, 7);
        assert_eq!(op.state(), UpdateState::Unopened);

        op.open(&trx).unwrap();
        assert_eq!(op.state(), UpdateState::Applying);
        assert_eq!(op.buffered_records().len(), 4);
        assert!(!op.next().unwrap());
        assert!(op.current_tuple().is_none());
        assert_eq!(trx.update_count(), 4);
        assert!(table.scan_all().iter().all(|r| r.values()[1] == Value::Ints(7)));

        op.close().unwrap();
        op.close().unwrap();
        assert_eq!(op.state(), UpdateState::Closed);
        assert!(op.buffered_records().is_empty());
    }

    #[test]
    fn test_no_child_is_noop() {
        let (db, _table, trx) = seeded(2);
        let table = db.find_table("t").unwrap();
        let mut op = UpdatePhysicalOperator::new(table, vec![], vec![]);
        op.open(&trx).unwrap();
        assert_eq!(trx.update_count(), 0);
    }

    #[test]
    fn test_buffer_limit() {
        let (db, table, trx) = seeded(3);
        let mut op = update_all(&db, 1).with_buffer_limit(2);
        assert!(matches!(
            op.open(&trx),
            Err(Error::Query(QueryError::OutOfMemory))
        ));
        assert_eq!(trx.update_count(), 0);
        assert!(table.scan_all().iter().all(|r| r.values()[1] == Value::Ints(0)));

        let mut op = update_all(&db, 1).with_buffer_limit(3);
        op.open(&trx).unwrap();
        assert_eq!(trx.update_count(), 3);
    }

    #[test]
    fn test_child_closed_before_first_write() {
        let (db, table, trx) = seeded(2);
        let (child, log) = ScriptedChild::new(row_tuples(&table), None);
        let mut op = update_from(&db, child);

        op.open(&trx).unwrap();
        assert_eq!(
            *log.lock(),
            vec!["open", "next", "next", "next", "close after 0 updates"]
        );
        assert_eq!(trx.update_count(), 2);
    }

    #[test]
    fn test_child_error_propagates_and_closes_child() {
        let (db, table, trx) = seeded(3);
        let (child, log) = ScriptedChild::new(row_tuples(&table), Some(2));
        let mut op = update_from(&db, child);

        let err = op.open(&trx).unwrap_err();
        assert!(matches!(&err, Error::Storage(StorageError::IoError(m)) if m == "boom"));
        assert_eq!(
            *log.lock(),
            vec!["open", "next", "next", "close after 0 updates"]
        );
        assert_eq!(trx.update_count(), 0);
        assert!(table.scan_all().iter().all(|r| r.values()[1] == Value::Ints(0)));
    }

    #[test]
    fn test_value_tuple_input_is_internal() {
        let (db, table, trx) = seeded(1);
        let tuples = vec![Tuple::Values(ValueListTuple::new(vec![Value::Ints(1)]))];
        let (child, log) = ScriptedChild::new(tuples, None);
        let mut op = update_from(&db, child);

        assert!(op.open(&trx).unwrap_err().is_internal());
        assert_eq!(log.lock().last().map(String::as_str), Some("close after 0 updates"));
        assert_eq!(trx.update_count(), 0);
        assert!(table.scan_all().iter().all(|r| r.values()[1] == Value::Ints(0)));
    }

    #[test]
    fn test_write_error_propagates() {
        let (db, table, trx) = seeded(2);
        trx.commit().unwrap();
        let mut op = update_all(&db, 1);
        assert!(matches!(op.open(&trx), Err(Error::Transaction(_))));
        assert!(table.scan_all().iter().all(|r| r.values()[1] == Value::Ints(0)));
    }
}

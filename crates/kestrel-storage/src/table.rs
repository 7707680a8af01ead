//! In-memory heap table.
//!
//! Records live in a vector in storage order. An update follows the
//! delete-old/insert-new pattern of a versioned row store: the old version
//! is removed from its slot and the new version, keeping its row id, is
//! appended at the tail. A cursor walking slots by position therefore shifts
//! when a record before it is rewritten, so callers must not update through
//! a scan that is still open.
//!
//! Updates find the row by a linear search over the slots. Removing the old
//! version shifts every later slot, so each update is linear in the table
//! size whether or not the row id is indexed.

use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use kestrel_common::error::{SqlError, StorageError};
use kestrel_common::prelude::*;

use crate::record::Record;
use crate::trx::{Trx, TrxOperation};
use crate::Table;

#[derive(Debug)]
pub struct MemTable {
    meta: TableMeta,
    records: RwLock<Vec<Record>>,
    next_row_id: AtomicU64,
}

impl MemTable {
    pub fn new(meta: TableMeta) -> Self {
        Self {
            meta,
            records: RwLock::new(Vec::new()),
            next_row_id: AtomicU64::new(1),
        }
    }

    fn allocate_row_id(&self) -> RowId {
        RowId(self.next_row_id.fetch_add(1, Ordering::SeqCst))
    }

    /// All records ordered by row id.
    pub fn scan_all(&self) -> Vec<Record> {
        let mut records = self.records.read().clone();
        records.sort_by_key(Record::rid);
        records
    }

    /// Records in physical slot order.
    pub fn storage_order(&self) -> Vec<Record> {
        self.records.read().clone()
    }

    fn resolve_field(&self, field: &FieldMeta) -> Result<usize> {
        self.meta.field_index(&field.name).ok_or_else(|| {
            SqlError::FieldMissing(format!("{}.{}", self.meta.name, field.name)).into()
        })
    }
}

impl Table for MemTable {
    fn name(&self) -> &str {
        &self.meta.name
    }

    fn table_meta(&self) -> &TableMeta {
        &self.meta
    }

    fn record_count(&self, _trx: &Trx) -> usize {
        self.records.read().len()
    }

    fn record_at(&self, _trx: &Trx, index: usize) -> Result<Option<Record>> {
        Ok(self.records.read().get(index).cloned())
    }

    fn insert_record(&self, trx: &Trx, values: Vec<Value>) -> Result<RowId> {
        trx.check_active()?;
        if values.len() != self.meta.field_num() {
            return Err(StorageError::ArityMismatch {
                expected: self.meta.field_num(),
                actual: values.len(),
            }
            .into());
        }
        for (field, value) in self.meta.fields().iter().zip(&values) {
            field.check_value(value)?;
        }

        let rid = self.allocate_row_id();
        self.records.write().push(Record::new(rid, values));
        trx.record(TrxOperation::Insert {
            table: self.meta.name.clone(),
            rid,
        });
        trace!(table = %self.meta.name, %rid, "record inserted");
        Ok(rid)
    }

    fn update_record(
        &self,
        trx: &Trx,
        record: &Record,
        values: &[Value],
        fields: &[FieldMeta],
    ) -> Result<()> {
        trx.check_active()?;
        if values.len() != fields.len() {
            return Err(Error::invalid_argument(format!(
                "update of {} has {} values for {} fields",
                self.meta.name,
                values.len(),
                fields.len()
            )));
        }

        let mut targets = Vec::with_capacity(fields.len());
        for (field, value) in fields.iter().zip(values) {
            let index = self.resolve_field(field)?;
            self.meta.fields[index].check_value(value)?;
            targets.push(index);
        }

        let mut records = self.records.write();
        let slot = records
            .iter()
            .position(|r| r.rid() == record.rid())
            .ok_or(StorageError::RecordNotFound(record.rid().0))?;

        let mut updated = records.remove(slot);
        let old = updated.values().to_vec();
        for (&index, value) in targets.iter().zip(values) {
            updated.set_value_at(index, value.clone());
        }
        let new = updated.values().to_vec();
        records.push(updated);
        drop(records);

        trx.record(TrxOperation::Update {
            table: self.meta.name.clone(),
            rid: record.rid(),
            old,
            new,
        });
        trace!(table = %self.meta.name, rid = %record.rid(), "record updated");
        Ok(())
    }
}

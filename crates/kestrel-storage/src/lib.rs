//! # Kestrel Storage
//!
//! Storage collaborators for the KestrelDB execution core:
//! - Records and the `Table` interface operators read and write through
//! - In-memory heap table
//! - Database catalog
//! - Transaction handle

pub mod catalog;
pub mod record;
pub mod table;
pub mod trx;

// Re-export key types for convenience
pub use catalog::Db;
pub use record::Record;
pub use table::MemTable;
pub use trx::{Trx, TrxFactory, TrxOperation};

use kestrel_common::prelude::*;

/// Table interface for record access and mutation
pub trait Table: Send + Sync + std::fmt::Debug {
    /// Table name
    fn name(&self) -> &str;

    /// Schema of the table
    fn table_meta(&self) -> &TableMeta;

    /// Number of record slots currently visible to `trx`
    fn record_count(&self, trx: &Trx) -> usize;

    /// Read the record in slot `index`, or `None` past the end
    fn record_at(&self, trx: &Trx, index: usize) -> Result<Option<Record>>;

    /// Insert a row and return its ID
    fn insert_record(&self, trx: &Trx, values: Vec<Value>) -> Result<RowId>;

    /// Overwrite `fields` of `record` with `values`, pairwise
    fn update_record(
        &self,
        trx: &Trx,
        record: &Record,
        values: &[Value],
        fields: &[FieldMeta],
    ) -> Result<()>;
}

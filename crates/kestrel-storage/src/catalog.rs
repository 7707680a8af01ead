//! Database catalog.
//!
//! Owns every table of one database. Plans and statements hold cloned
//! `Arc` handles, so a table stays alive for as long as anything references
//! it, and nothing outside the catalog ever frees one.

use dashmap::DashMap;
use std::sync::Arc;
use kestrel_common::prelude::*;

use crate::table::MemTable;
use crate::Table;

#[derive(Debug)]
pub struct Db {
    name: String,
    /// Tables indexed by lowercased name
    tables: DashMap<String, Arc<dyn Table>>,
}

impl Db {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tables: DashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Create an empty in-memory table from `meta`.
    pub fn create_table(&self, meta: TableMeta) -> Result<Arc<MemTable>> {
        let table = Arc::new(MemTable::new(meta));
        self.add_table(table.clone())?;
        Ok(table)
    }

    /// Register an existing table implementation.
    pub fn add_table(&self, table: Arc<dyn Table>) -> Result<()> {
        let key = table.name().to_ascii_lowercase();
        if key.is_empty() {
            return Err(Error::invalid_argument("table name is empty"));
        }
        if self.tables.contains_key(&key) {
            return Err(Error::invalid_argument(format!(
                "table already exists: {}",
                table.name()
            )));
        }
        info!(db = %self.name, table = %table.name(), "table registered");
        self.tables.insert(key, table);
        Ok(())
    }

    /// Case-insensitive lookup
    pub fn find_table(&self, name: &str) -> Option<Arc<dyn Table>> {
        self.tables
            .get(&name.to_ascii_lowercase())
            .map(|entry| entry.value().clone())
    }

    pub fn table_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .tables
            .iter()
            .map(|entry| entry.value().name().to_string())
            .collect();
        names.sort();
        names
    }
}

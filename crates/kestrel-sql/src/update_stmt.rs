//! Validated UPDATE statement.

use std::collections::HashMap;
use std::sync::Arc;
use kestrel_common::error::SqlError;
use kestrel_common::prelude::*;
use kestrel_storage::{Db, Table};

use crate::ast::UpdateSqlNode;
use crate::filter::FilterStmt;

/// An UPDATE that has passed schema validation.
///
/// `values[i]` is assigned to `fields[i]` on every record the filter accepts.
#[derive(Debug, Clone)]
pub struct UpdateStmt {
    table: Arc<dyn Table>,
    values: Vec<Value>,
    fields: Vec<FieldMeta>,
    filter: FilterStmt,
}

impl UpdateStmt {
    /// Validate `update` against the catalog.
    ///
    /// Every assignment must name an existing field and carry a value the
    /// field can store. Nothing is built unless all checks pass.
    pub fn create(db: &Db, update: &UpdateSqlNode) -> Result<UpdateStmt> {
        let table_name = update.relation_name.as_str();
        if table_name.is_empty() {
            warn!("invalid argument. relation name is empty");
            return Err(Error::invalid_argument("relation name is empty"));
        }
        let table = db.find_table(table_name).ok_or_else(|| {
            warn!(db = %db.name(), table = %table_name, "no such table");
            Error::from(SqlError::TableNotFound(table_name.to_string()))
        })?;

        if update.assignments.is_empty() {
            warn!(table = %table_name, "update has no assignments");
            return Err(Error::invalid_argument("update has no assignments"));
        }

        let meta = table.table_meta();
        let mut values = Vec::with_capacity(update.assignments.len());
        let mut fields: Vec<FieldMeta> = Vec::with_capacity(update.assignments.len());
        for (field_name, value) in &update.assignments {
            let field = meta.field(field_name).ok_or_else(|| {
                info!(table = %table_name, field = %field_name, "no such field in table");
                Error::from(SqlError::FieldMissing(format!("{}.{}", table_name, field_name)))
            })?;
            if fields.iter().any(|f| f.name == field.name) {
                warn!(table = %table_name, field = %field.name, "field assigned twice");
                return Err(Error::invalid_argument(format!(
                    "field {} assigned more than once",
                    field.name
                )));
            }
            field.check_value(value).map_err(|e| {
                warn!(table = %table_name, field = %field.name, error = %e, "update value rejected");
                e
            })?;
            values.push(value.clone());
            fields.push(field.clone());
        }

        let mut table_map = HashMap::new();
        table_map.insert(meta.name.clone(), table.clone());
        let filter = FilterStmt::create(db, &table, &table_map, &update.conditions).map_err(|e| {
            warn!(table = %table_name, error = %e, "cannot construct filter stmt");
            e
        })?;

        debug!(table = %table_name, fields = fields.len(), units = filter.filter_units().len(), "update validated");
        Ok(UpdateStmt {
            table,
            values,
            fields,
            filter,
        })
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

    pub fn value_amount(&self) -> usize {
        self.values.len()
    }

    pub fn filter(&self) -> &FilterStmt {
        &self.filter
    }
}

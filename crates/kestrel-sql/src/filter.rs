//! Compiled WHERE clauses.
//!
//! A [`FilterStmt`] is the conjunction of its units. Column references are
//! resolved to field positions once, at compile time, so evaluation is a
//! positional lookup into the record.

use std::collections::HashMap;
use std::sync::Arc;
use kestrel_common::error::SqlError;
use kestrel_common::prelude::*;
use kestrel_storage::{Db, Record, Table};

use crate::ast::{CompOp, ConditionSqlNode, Operand, RelAttr};

/// A resolved comparison operand
#[derive(Debug, Clone, PartialEq)]
pub enum FilterObj {
    Field {
        table: String,
        field: FieldMeta,
        index: usize,
    },
    Value(Value),
}

impl FilterObj {
    fn resolve<'a>(&'a self, record: &'a Record) -> Result<&'a Value> {
        match self {
            FilterObj::Value(v) => Ok(v),
            FilterObj::Field { table, field, index } => record.value_at(*index).ok_or_else(|| {
                Error::internal(format!(
                    "{} has no slot {} for field {}.{}",
                    record.rid(),
                    index,
                    table,
                    field.name
                ))
            }),
        }
    }
}

/// One compiled `left op right` comparison
#[derive(Debug, Clone, PartialEq)]
pub struct FilterUnit {
    pub left: FilterObj,
    pub op: CompOp,
    pub right: FilterObj,
}

impl FilterUnit {
    /// A side that is NULL, or a pair with no defined order, filters the
    /// row out.
    pub fn evaluate(&self, record: &Record) -> Result<bool> {
        let left = self.left.resolve(record)?;
        let right = self.right.resolve(record)?;
        Ok(left
            .compare(right)
            .map(|ordering| self.op.matches(ordering))
            .unwrap_or(false))
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilterStmt {
    units: Vec<FilterUnit>,
}

impl FilterStmt {
    /// Compile `conditions` against the tables they may reference.
    ///
    /// Unqualified attributes resolve against `default_table`; qualified ones
    /// must name a table in `table_map`.
    pub fn create(
        db: &Db,
        default_table: &Arc<dyn Table>,
        table_map: &HashMap<String, Arc<dyn Table>>,
        conditions: &[ConditionSqlNode],
    ) -> Result<FilterStmt> {
        let mut units = Vec::with_capacity(conditions.len());
        for condition in conditions {
            let left = resolve_operand(db, default_table, table_map, &condition.left)?;
            let right = resolve_operand(db, default_table, table_map, &condition.right)?;
            units.push(FilterUnit {
                left,
                op: condition.op,
                right,
            });
        }
        Ok(FilterStmt { units })
    }

    pub fn filter_units(&self) -> &[FilterUnit] {
        &self.units
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// True when every unit holds for `record`
    pub fn evaluate(&self, record: &Record) -> Result<bool> {
        for unit in &self.units {
            if !unit.evaluate(record)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

fn resolve_operand(
    db: &Db,
    default_table: &Arc<dyn Table>,
    table_map: &HashMap<String, Arc<dyn Table>>,
    operand: &Operand,
) -> Result<FilterObj> {
    match operand {
        Operand::Value(v) => Ok(FilterObj::Value(v.clone())),
        Operand::Attr(attr) => {
            let table = lookup_table(db, default_table, table_map, attr)?;
            let meta = table.table_meta();
            let index = meta.field_index(&attr.attribute).ok_or_else(|| {
                info!(db = %db.name(), table = %meta.name, field = %attr.attribute, "no such field in filter");
                Error::from(SqlError::FieldMissing(format!("{}.{}", meta.name, attr.attribute)))
            })?;
            Ok(FilterObj::Field {
                table: meta.name.clone(),
                field: meta.fields[index].clone(),
                index,
            })
        }
    }
}

fn lookup_table<'a>(
    db: &Db,
    default_table: &'a Arc<dyn Table>,
    table_map: &'a HashMap<String, Arc<dyn Table>>,
    attr: &RelAttr,
) -> Result<&'a Arc<dyn Table>> {
    if !attr.is_qualified() {
        return Ok(default_table);
    }
    table_map
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(&attr.relation))
        .map(|(_, table)| table)
        .ok_or_else(|| {
            warn!(db = %db.name(), relation = %attr.relation, "filter references unknown table");
            SqlError::TableNotFound(attr.relation.clone()).into()
        })
}

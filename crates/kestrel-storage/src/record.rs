//! Storage-level row representation.

use kestrel_common::prelude::*;
use serde::{Deserialize, Serialize};

/// One stored row: its identifier and a value per table field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    rid: RowId,
    values: Vec<Value>,
}

impl Record {
    pub fn new(rid: RowId, values: Vec<Value>) -> Self {
        Self { rid, values }
    }

    pub fn rid(&self) -> RowId {
        self.rid
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn value_at(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub(crate) fn set_value_at(&mut self, index: usize, value: Value) {
        self.values[index] = value;
    }
}

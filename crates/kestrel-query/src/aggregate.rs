//! Aggregation without grouping.

use kestrel_common::prelude::*;
use kestrel_storage::Trx;

use crate::aggregator::{AggregateKind, Aggregator};
use crate::operator::{PhysicalOperator, PhysicalOperatorType, Tuple, ValueListTuple};

/// One aggregate over the cell at `field_index` of every input tuple
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregateSpec {
    pub kind: AggregateKind,
    pub field_index: usize,
}

impl AggregateSpec {
    pub fn new(kind: AggregateKind, field_index: usize) -> Self {
        Self { kind, field_index }
    }
}

/// Drains its child on the first `next` and yields exactly one tuple with
/// one cell per aggregate, even when the input is empty.
#[derive(Debug)]
pub struct ScalarAggregatePhysicalOperator {
    specs: Vec<AggregateSpec>,
    emitted: bool,
    result: Option<Tuple>,
    children: Vec<Box<dyn PhysicalOperator>>,
}

impl ScalarAggregatePhysicalOperator {
    pub fn new(specs: Vec<AggregateSpec>) -> Self {
        Self {
            specs,
            emitted: false,
            result: None,
            children: Vec::new(),
        }
    }

    fn aggregate_child(&mut self) -> Result<Vec<Value>> {
        let mut aggregators: Vec<Aggregator> =
            self.specs.iter().map(|spec| Aggregator::new(spec.kind)).collect();
        let child = self
            .children
            .first_mut()
            .ok_or_else(|| Error::internal("aggregate operator has no child"))?;

        let mut rows = 0usize;
        while child.next()? {
            let tuple = child
                .current_tuple()
                .ok_or_else(|| Error::internal("child produced no tuple"))?;
            for (spec, aggregator) in self.specs.iter().zip(aggregators.iter_mut()) {
                aggregator.accumulate(tuple.cell_at(spec.field_index)?)?;
            }
            rows += 1;
        }
        debug!(rows, aggregates = self.specs.len(), "scalar aggregate drained child");

        aggregators.iter().map(Aggregator::evaluate).collect()
    }
}

impl PhysicalOperator for ScalarAggregatePhysicalOperator {
    fn kind(&self) -> PhysicalOperatorType {
        PhysicalOperatorType::ScalarAggregate
    }

    fn open(&mut self, trx: &Trx) -> Result<()> {
        self.emitted = false;
        self.result = None;
        match self.children.first_mut() {
            Some(child) => child.open(trx),
            None => Err(Error::internal("aggregate operator has no child")),
        }
    }

    fn next(&mut self) -> Result<bool> {
        if self.emitted {
            self.result = None;
            return Ok(false);
        }
        let cells = self.aggregate_child()?;
        self.result = Some(Tuple::Values(ValueListTuple::new(cells)));
        self.emitted = true;
        Ok(true)
    }

    fn close(&mut self) -> Result<()> {
        self.result = None;
        match self.children.first_mut() {
            Some(child) => child.close(),
            None => Ok(()),
        }
    }

    fn current_tuple(&self) -> Option<&Tuple> {
        self.result.as_ref()
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
    use crate::table_scan::TableScanPhysicalOperator;
    use kestrel_common::testing::fixtures;
    use kestrel_storage::{Db, Table, TrxFactory};

    fn aggregate_users(count: usize, specs: Vec<AggregateSpec>) -> Vec<Value> {
        let db = Db::new("test");
        let table = db.create_table(fixtures::users_meta()).unwrap();
        let trx = TrxFactory::new().begin();
        for row in fixtures::sample_users(count) {
            table.insert_record(&trx, row).unwrap();
        }

        let mut op = ScalarAggregatePhysicalOperator::new(specs);
        op.add_child(Box::new(TableScanPhysicalOperator::new(
            db.find_table("users").unwrap(),
            true,
        )));
        op.open(&trx).unwrap();
        assert!(op.next().unwrap());
        let cells = match op.current_tuple() {
            Some(Tuple::Values(values)) => values.cells().to_vec(),
            other => panic!("expected values tuple, got {:?}", other),
        };
        assert!(!op.next().unwrap());
        op.close().unwrap();
        cells
    }

    #[test]
    fn test_aggregates_over_scan() {
        // scores: NULL, 1.5, 3.0, NULL, 6.0, 7.5
        let cells = aggregate_users(
            6,
            vec![
                AggregateSpec::new(AggregateKind::Count, 2),
                AggregateSpec::new(AggregateKind::Sum, 2),
                AggregateSpec::new(AggregateKind::Max, 0),
                AggregateSpec::new(AggregateKind::Min, 1),
                AggregateSpec::new(AggregateKind::Avg, 2),
            ],
        );
        assert_eq!(
            cells,
            vec![
                Value::Ints(4),
                Value::Floats(18.0),
                Value::Ints(6),
                Value::from("user_0"),
                Value::Floats(4.5),
            ]
        );
    }

    #[test]
    fn test_empty_input_yields_one_row() {
        let cells = aggregate_users(
            0,
            vec![
                AggregateSpec::new(AggregateKind::Count, 0),
                AggregateSpec::new(AggregateKind::Sum, 0),
            ],
        );
        assert_eq!(cells, vec![Value::Ints(0), Value::Null]);
    }
}

//! Streaming aggregate accumulators.
//!
//! An [`Aggregator`] folds one column of a group into a single value under
//! SQL null semantics. SUM, MAX, MIN and the running sum of AVG share one
//! state machine:
//!
//! - no input yet: adopt the first input verbatim, even NULL
//! - holding NULL: every input so far was NULL, adopt the next one verbatim
//! - holding a concrete value: skip NULL, combine a value of the same kind,
//!   and reject any other kind as an internal error
//!
//! COUNT counts non-null inputs and never evaluates to NULL.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use kestrel_common::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AggregateKind {
    Sum,
    Max,
    Min,
    Avg,
    Count,
}

impl AggregateKind {
    fn name(&self) -> &'static str {
        match self {
            AggregateKind::Sum => "SUM",
            AggregateKind::Max => "MAX",
            AggregateKind::Min => "MIN",
            AggregateKind::Avg => "AVG",
            AggregateKind::Count => "COUNT",
        }
    }
}

impl fmt::Display for AggregateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AggregateKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        [
            AggregateKind::Sum,
            AggregateKind::Max,
            AggregateKind::Min,
            AggregateKind::Avg,
            AggregateKind::Count,
        ]
        .into_iter()
        .find(|k| k.name().eq_ignore_ascii_case(s.trim()))
        .ok_or_else(|| Error::invalid_argument(format!("unknown aggregate function: {}", s)))
    }
}

/// Per-group accumulator
#[derive(Debug, Clone, PartialEq)]
pub enum Aggregator {
    Sum { current: Value },
    Max { current: Value },
    Min { current: Value },
    Count { current: Value },
    Avg { sum: Value, count: Value },
}

impl Aggregator {
    pub fn new(kind: AggregateKind) -> Self {
        match kind {
            AggregateKind::Sum => Aggregator::Sum { current: Value::Undefined },
            AggregateKind::Max => Aggregator::Max { current: Value::Undefined },
            AggregateKind::Min => Aggregator::Min { current: Value::Undefined },
            AggregateKind::Count => Aggregator::Count { current: Value::Undefined },
            AggregateKind::Avg => Aggregator::Avg {
                sum: Value::Undefined,
                count: Value::Undefined,
            },
        }
    }

    pub fn kind(&self) -> AggregateKind {
        match self {
            Aggregator::Sum { .. } => AggregateKind::Sum,
            Aggregator::Max { .. } => AggregateKind::Max,
            Aggregator::Min { .. } => AggregateKind::Min,
            Aggregator::Count { .. } => AggregateKind::Count,
            Aggregator::Avg { .. } => AggregateKind::Avg,
        }
    }

    /// Fold one input.
    ///
    /// Fails only with an internal error, when the input's kind differs from
    /// the concrete kind already accumulated or cannot be summed. A rejected
    /// input leaves the aggregator unchanged.
    pub fn accumulate(&mut self, value: &Value) -> Result<()> {
        match self {
            Aggregator::Sum { current } => fold(current, value, add),
            Aggregator::Max { current } => fold(current, value, |acc, v| {
                keep_if(acc, v, Ordering::Greater)
            }),
            Aggregator::Min { current } => fold(current, value, |acc, v| {
                keep_if(acc, v, Ordering::Less)
            }),
            Aggregator::Count { current } => {
                bump_count(current, value);
                Ok(())
            }
            Aggregator::Avg { sum, count } => {
                fold(sum, value, add)?;
                bump_count(count, value);
                Ok(())
            }
        }
    }

    /// Final value of the group.
    ///
    /// An aggregator that saw no input evaluates to NULL, or 0 for COUNT.
    pub fn evaluate(&self) -> Result<Value> {
        match self {
            Aggregator::Sum { current }
            | Aggregator::Max { current }
            | Aggregator::Min { current } => Ok(match current {
                Value::Undefined => Value::Null,
                v => v.clone(),
            }),
            Aggregator::Count { current } => Ok(match current {
                Value::Undefined => Value::Ints(0),
                v => v.clone(),
            }),
            Aggregator::Avg { sum, count } => {
                let n = match count {
                    Value::Undefined => 0,
                    Value::Ints(n) => *n,
                    other => {
                        return Err(Error::internal(format!(
                            "avg count holds {} instead of ints",
                            other.attr_type()
                        )))
                    }
                };
                if matches!(sum, Value::Null | Value::Undefined) {
                    if n != 0 {
                        return Err(Error::internal(format!(
                            "avg sum is null but count is {}",
                            n
                        )));
                    }
                    return Ok(Value::Null);
                }
                if n == 0 {
                    return Err(Error::internal("avg sum is set but count is 0"));
                }
                Ok(Value::Floats(sum.get_float() / n as f32))
            }
        }
    }

    /// Drop accumulated state, keeping the kind.
    pub fn reset(&mut self) {
        *self = Aggregator::new(self.kind());
    }
}

/// Null-skipping fold shared by SUM, MAX, MIN and the sum side of AVG.
fn fold(
    current: &mut Value,
    value: &Value,
    combine: impl FnOnce(&Value, &Value) -> Result<Option<Value>>,
) -> Result<()> {
    if matches!(current, Value::Undefined | Value::Null) {
        current.set_value(value);
        return Ok(());
    }
    if value.is_null() {
        return Ok(());
    }
    if value.attr_type() != current.attr_type() {
        return Err(Error::internal(format!(
            "type mismatch. value type: {}, accumulated type: {}",
            value.attr_type(),
            current.attr_type()
        )));
    }
    if let Some(next) = combine(current, value)? {
        *current = next;
    }
    Ok(())
}

fn add(acc: &Value, v: &Value) -> Result<Option<Value>> {
    match (acc, v) {
        (Value::Ints(a), Value::Ints(b)) => Ok(Some(Value::Ints(a.wrapping_add(*b)))),
        (Value::Floats(a), Value::Floats(b)) => Ok(Some(Value::Floats(a + b))),
        _ => Err(Error::internal(format!(
            "cannot sum values of type {}",
            acc.attr_type()
        ))),
    }
}

/// Replace `acc` with `v` when `v` compares strictly `wanted` to it; ties keep `acc`.
fn keep_if(acc: &Value, v: &Value, wanted: Ordering) -> Result<Option<Value>> {
    Ok((v.compare(acc) == Some(wanted)).then(|| v.clone()))
}

fn bump_count(count: &mut Value, value: &Value) {
    if matches!(count, Value::Undefined) {
        count.set_int(0);
    }
    if !value.is_null() {
        count.set_int(count.get_int() + 1);
    }
}

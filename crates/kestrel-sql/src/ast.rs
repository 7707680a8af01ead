//! Parse-tree nodes consumed by statement validation.
//!
//! The grammar itself lives outside this crate; these are the shapes it hands
//! over once an UPDATE has been parsed.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use kestrel_common::prelude::*;

// ============================================================================
// Attributes and Operands
// ============================================================================

/// A possibly qualified column reference (`x` or `t.x`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RelAttr {
    /// Empty when unqualified
    pub relation: String,
    pub attribute: String,
}

impl RelAttr {
    pub fn new(attribute: impl Into<String>) -> Self {
        Self {
            relation: String::new(),
            attribute: attribute.into(),
        }
    }

    pub fn qualified(relation: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self {
            relation: relation.into(),
            attribute: attribute.into(),
        }
    }

    pub fn is_qualified(&self) -> bool {
        !self.relation.is_empty()
    }
}

impl fmt::Display for RelAttr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_qualified() {
            write!(f, "{}.{}", self.relation, self.attribute)
        } else {
            f.write_str(&self.attribute)
        }
    }
}

/// One side of a comparison
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operand {
    Attr(RelAttr),
    Value(Value),
}

impl From<RelAttr> for Operand {
    fn from(attr: RelAttr) -> Self {
        Operand::Attr(attr)
    }
}

impl From<Value> for Operand {
    fn from(value: Value) -> Self {
        Operand::Value(value)
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Attr(attr) => write!(f, "{}", attr),
            Operand::Value(Value::Chars(s)) => write!(f, "'{}'", s),
            Operand::Value(v) => write!(f, "{}", v),
        }
    }
}

// ============================================================================
// Comparison Operators
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompOp {
    /// Whether a three-way comparison result satisfies this operator
    pub fn matches(&self, ordering: Ordering) -> bool {
        match self {
            CompOp::Eq => ordering == Ordering::Equal,
            CompOp::Ne => ordering != Ordering::Equal,
            CompOp::Lt => ordering == Ordering::Less,
            CompOp::Le => ordering != Ordering::Greater,
            CompOp::Gt => ordering == Ordering::Greater,
            CompOp::Ge => ordering != Ordering::Less,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            CompOp::Eq => "=",
            CompOp::Ne => "<>",
            CompOp::Lt => "<",
            CompOp::Le => "<=",
            CompOp::Gt => ">",
            CompOp::Ge => ">=",
        }
    }
}

impl fmt::Display for CompOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

// ============================================================================
// Statements
// ============================================================================

/// `left op right` in a WHERE clause
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionSqlNode {
    pub left: Operand,
    pub op: CompOp,
    pub right: Operand,
}

impl ConditionSqlNode {
    pub fn new(left: impl Into<Operand>, op: CompOp, right: impl Into<Operand>) -> Self {
        Self {
            left: left.into(),
            op,
            right: right.into(),
        }
    }

    /// Shorthand for the common `column op literal` form
    pub fn attr_cmp(attribute: &str, op: CompOp, value: impl Into<Value>) -> Self {
        Self::new(RelAttr::new(attribute), op, value.into())
    }
}

impl fmt::Display for ConditionSqlNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.left, self.op, self.right)
    }
}

/// `UPDATE relation SET a = v [, b = w ...] [WHERE cond AND ...]`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UpdateSqlNode {
    pub relation_name: String,
    pub assignments: Vec<(String, Value)>,
    pub conditions: Vec<ConditionSqlNode>,
}

impl UpdateSqlNode {
    pub fn new(relation_name: impl Into<String>) -> Self {
        Self {
            relation_name: relation_name.into(),
            ..Default::default()
        }
    }

    pub fn set(mut self, attribute: impl Into<String>, value: impl Into<Value>) -> Self {
        self.assignments.push((attribute.into(), value.into()));
        self
    }

    pub fn filter(mut self, condition: ConditionSqlNode) -> Self {
        self.conditions.push(condition);
        self
    }
}

impl fmt::Display for UpdateSqlNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UPDATE {} SET ", self.relation_name)?;
        for (i, (attribute, value)) in self.assignments.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{} = {}", attribute, Operand::Value(value.clone()))?;
        }
        for (i, condition) in self.conditions.iter().enumerate() {
            f.write_str(if i == 0 { " WHERE " } else { " AND " })?;
            write!(f, "{}", condition)?;
        }
        Ok(())
    }
}

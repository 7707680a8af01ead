//! # Kestrel Query
//!
//! Query execution engine for KestrelDB providing:
//! - Streaming aggregate accumulators
//! - Volcano-style physical operators (scan, predicate, aggregate, update)
//! - Physical plan generation
//! - Statement execution

pub mod aggregate;
pub mod aggregator;
pub mod executor;
pub mod operator;
pub mod physical_plan;
pub mod predicate;
pub mod table_scan;
pub mod update;

pub use aggregate::{AggregateSpec, ScalarAggregatePhysicalOperator};
pub use aggregator::{AggregateKind, Aggregator};
pub use executor::{ExecutionResult, StatementExecutor};
pub use operator::{PhysicalOperator, PhysicalOperatorType, RowTuple, Tuple, ValueListTuple};
pub use physical_plan::{format_physical_plan, PhysicalPlanGenerator};
pub use predicate::PredicatePhysicalOperator;
pub use table_scan::TableScanPhysicalOperator;
pub use update::{UpdatePhysicalOperator, UpdateState};

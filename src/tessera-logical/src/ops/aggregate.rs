//! Partition-local aggregation operators.

use serde::{Deserialize, Serialize};

use crate::expr::{AggExpr, LogicalExpr};
use crate::resource::ResourceRequest;

use super::LogicalNode;

/// Aggregation within each partition, without any exchange.
///
/// A global aggregation is expressed upstream as local aggregate,
/// repartition on the group keys, then a second local aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalAggregateOp {
    pub input: Box<LogicalNode>,
    pub aggs: Vec<AggExpr>,
    /// Grouping keys. Empty for a whole-partition aggregation.
    pub group_by: Vec<LogicalExpr>,
    pub resource_request: ResourceRequest,
}

impl LocalAggregateOp {
    pub fn new(input: LogicalNode, aggs: Vec<AggExpr>, group_by: Vec<LogicalExpr>) -> Self {
        Self {
            input: Box::new(input),
            aggs,
            group_by,
            resource_request: ResourceRequest::default(),
        }
    }
}

/// Distinct rows within each partition, by the group-by columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalDistinctOp {
    pub input: Box<LogicalNode>,
    pub group_by: Vec<LogicalExpr>,
    pub resource_request: ResourceRequest,
}

impl LocalDistinctOp {
    pub fn new(input: LogicalNode, group_by: Vec<LogicalExpr>) -> Self {
        Self {
            input: Box::new(input),
            group_by,
            resource_request: ResourceRequest::default(),
        }
    }
}

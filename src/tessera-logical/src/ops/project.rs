//! Per-partition row transforms: projections and partition maps.

use serde::{Deserialize, Serialize};

use crate::expr::LogicalExpr;
use crate::resource::ResourceRequest;

use super::{join_display, LogicalNode};

/// Project operator - computes a new set of columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectOp {
    /// Input operator.
    pub input: Box<LogicalNode>,
    /// Output expressions, in output column order.
    pub projection: Vec<LogicalExpr>,
    pub resource_request: ResourceRequest,
}

impl ProjectOp {
    /// Create a new projection.
    pub fn new(input: LogicalNode, projection: Vec<LogicalExpr>) -> Self {
        Self {
            input: Box::new(input),
            projection,
            resource_request: ResourceRequest::default(),
        }
    }

    /// Names of the output columns.
    pub fn output_names(&self) -> Vec<String> {
        self.projection.iter().map(LogicalExpr::output_name).collect()
    }
}

/// A function applied to a whole partition at once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MapFunction {
    /// Expand list-valued columns into one row per element.
    Explode { columns: Vec<LogicalExpr> },
}

impl std::fmt::Display for MapFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Explode { columns } => write!(f, "Explode[{}]", join_display(columns)),
        }
    }
}

/// Map-partition operator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapPartitionOp {
    pub input: Box<LogicalNode>,
    pub func: MapFunction,
    pub resource_request: ResourceRequest,
}

impl MapPartitionOp {
    pub fn new(input: LogicalNode, func: MapFunction) -> Self {
        Self {
            input: Box::new(input),
            func,
            resource_request: ResourceRequest::default(),
        }
    }
}

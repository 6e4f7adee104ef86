//! Join operator.

use serde::{Deserialize, Serialize};

use crate::expr::LogicalExpr;
use crate::resource::ResourceRequest;

use super::LogicalNode;

/// Join type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JoinType {
    Inner,
    Left,
    Right,
}

impl std::fmt::Display for JoinType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Inner => "Inner",
            Self::Left => "Left",
            Self::Right => "Right",
        };
        write!(f, "{name}")
    }
}

/// Equi-join of two co-partitioned inputs.
///
/// Both inputs must already be partitioned the same way on their join keys;
/// partition `i` on the left is joined with partition `i` on the right.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinOp {
    pub left: Box<LogicalNode>,
    pub right: Box<LogicalNode>,
    pub left_on: Vec<LogicalExpr>,
    pub right_on: Vec<LogicalExpr>,
    pub how: JoinType,
    pub resource_request: ResourceRequest,
}

impl JoinOp {
    pub fn new(
        left: LogicalNode,
        right: LogicalNode,
        left_on: Vec<LogicalExpr>,
        right_on: Vec<LogicalExpr>,
        how: JoinType,
    ) -> Self {
        Self {
            left: Box::new(left),
            right: Box::new(right),
            left_on,
            right_on,
            how,
            resource_request: ResourceRequest::default(),
        }
    }
}

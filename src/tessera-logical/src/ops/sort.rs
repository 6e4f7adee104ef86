//! Sort operator.

use serde::{Deserialize, Serialize};

use crate::expr::LogicalExpr;
use crate::resource::ResourceRequest;

use super::LogicalNode;

/// A single sort column and its direction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortKey {
    /// Expression to sort by.
    pub expr: LogicalExpr,
    pub descending: bool,
}

impl SortKey {
    /// Create a new ascending sort key.
    pub const fn asc(expr: LogicalExpr) -> Self {
        Self {
            expr,
            descending: false,
        }
    }

    /// Create a new descending sort key.
    pub const fn desc(expr: LogicalExpr) -> Self {
        Self {
            expr,
            descending: true,
        }
    }
}

impl std::fmt::Display for SortKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let dir = if self.descending { "DESC" } else { "ASC" };
        write!(f, "{} {dir}", self.expr)
    }
}

/// Global sort. The output keeps the input's partition count, with
/// partitions ordered by key range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortOp {
    pub input: Box<LogicalNode>,
    pub sort_by: Vec<SortKey>,
    pub resource_request: ResourceRequest,
}

impl SortOp {
    pub fn new(input: LogicalNode, sort_by: Vec<SortKey>) -> Self {
        Self {
            input: Box::new(input),
            sort_by,
            resource_request: ResourceRequest::default(),
        }
    }

    /// The sort expressions, in key order.
    pub fn sort_exprs(&self) -> Vec<LogicalExpr> {
        self.sort_by.iter().map(|k| k.expr.clone()).collect()
    }

    /// The direction of each key, in key order.
    pub fn descending(&self) -> Vec<bool> {
        self.sort_by.iter().map(|k| k.descending).collect()
    }
}

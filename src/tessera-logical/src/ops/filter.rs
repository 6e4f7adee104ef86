//! Filter operator for predicate-based filtering.

use serde::{Deserialize, Serialize};

use crate::expr::LogicalExpr;
use crate::resource::ResourceRequest;

use super::LogicalNode;

/// Filter operator - predicate-based row filtering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterOp {
    /// Input operator.
    pub input: Box<LogicalNode>,
    /// Filter predicate (must evaluate to bool).
    pub predicate: LogicalExpr,
    pub resource_request: ResourceRequest,
}

impl FilterOp {
    /// Create a new filter operation.
    pub fn new(input: LogicalNode, predicate: LogicalExpr) -> Self {
        Self {
            input: Box::new(input),
            predicate,
            resource_request: ResourceRequest::default(),
        }
    }
}

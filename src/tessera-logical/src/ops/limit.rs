//! Limit operators for row limiting.

use serde::{Deserialize, Serialize};

use crate::resource::ResourceRequest;

use super::LogicalNode;

/// Truncates each partition independently to at most `limit` rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalLimitOp {
    pub input: Box<LogicalNode>,
    pub limit: usize,
    pub resource_request: ResourceRequest,
}

impl LocalLimitOp {
    pub fn new(input: LogicalNode, limit: usize) -> Self {
        Self {
            input: Box::new(input),
            limit,
            resource_request: ResourceRequest::default(),
        }
    }
}

/// Keeps the first `limit` rows of the whole input, in partition order.
///
/// The number of output partitions is unchanged; partitions past the
/// limit come out empty.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalLimitOp {
    pub input: Box<LogicalNode>,
    pub limit: usize,
    pub resource_request: ResourceRequest,
}

impl GlobalLimitOp {
    pub fn new(input: LogicalNode, limit: usize) -> Self {
        Self {
            input: Box::new(input),
            limit,
            resource_request: ResourceRequest::default(),
        }
    }
}

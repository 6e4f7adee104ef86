//! Operators that change the number of partitions.

use common_error::{ensure, TesseraResult};
use serde::{Deserialize, Serialize};

use crate::expr::LogicalExpr;
use crate::partitioning::PartitionScheme;
use crate::resource::ResourceRequest;

use super::LogicalNode;

/// Full shuffle into `num_partitions` outputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepartitionOp {
    pub input: Box<LogicalNode>,
    pub scheme: PartitionScheme,
    pub num_partitions: usize,
    /// Keys for hash and range schemes.
    pub partition_by: Vec<LogicalExpr>,
    pub resource_request: ResourceRequest,
}

impl RepartitionOp {
    /// Create a repartition, checking the partition count and keys.
    pub fn try_new(
        input: LogicalNode,
        scheme: PartitionScheme,
        num_partitions: usize,
        partition_by: Vec<LogicalExpr>,
    ) -> TesseraResult<Self> {
        ensure!(
            num_partitions > 0,
            ValueError: "Repartition needs at least one output partition"
        );
        ensure!(
            !scheme.requires_keys() || !partition_by.is_empty(),
            ValueError: "{scheme} repartition needs at least one partition key"
        );
        Ok(Self {
            input: Box::new(input),
            scheme,
            num_partitions,
            partition_by,
            resource_request: ResourceRequest::default(),
        })
    }
}

/// Merges consecutive input partitions down to a smaller count, without a
/// shuffle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoalesceOp {
    pub input: Box<LogicalNode>,
    pub num_partitions: usize,
    pub resource_request: ResourceRequest,
}

impl CoalesceOp {
    /// Create a coalesce. The target must be positive and strictly below the
    /// input's partition count.
    pub fn try_new(input: LogicalNode, num_partitions: usize) -> TesseraResult<Self> {
        let from = input.num_partitions();
        ensure!(
            num_partitions > 0 && num_partitions < from,
            ValueError: "Coalesce can only reduce the number of partitions: {num_partitions} vs {from}"
        );
        Ok(Self {
            input: Box::new(input),
            num_partitions,
            resource_request: ResourceRequest::default(),
        })
    }
}

//! Fluent construction of logical plans.

use common_error::TesseraResult;

use crate::expr::{AggExpr, LogicalExpr};
use crate::ops::{
    CoalesceOp, ExtensionOp, FileWriteOp, FilterOp, GlobalLimitOp, InMemoryScanOp, JoinOp,
    JoinType, LocalAggregateOp, LocalDistinctOp, LocalLimitOp, LogicalNode, MapFunction,
    MapPartitionOp, OutputFileInfo, ProjectOp, RepartitionOp, ScanInfo, SortKey, SortOp,
    TabularFilesScanOp,
};
use crate::partitioning::PartitionScheme;
use crate::resource::ResourceRequest;

/// Builder for logical plans.
///
/// Each method wraps the current root in a new node. Operators that can
/// reject their arguments return `TesseraResult<Self>`.
#[derive(Debug, Clone)]
pub struct PlanBuilder {
    root: LogicalNode,
}

impl PlanBuilder {
    /// Start from an existing node.
    pub fn from_node(root: LogicalNode) -> Self {
        Self { root }
    }

    /// Start from partitions held in memory under `cache_key`.
    pub fn in_memory_scan(cache_key: impl Into<String>, num_partitions: usize) -> Self {
        Self::from_node(LogicalNode::InMemoryScan(InMemoryScanOp::new(
            cache_key,
            num_partitions,
        )))
    }

    /// Read the files listed by `listing`, one output partition per file.
    pub fn files_scan(listing: PlanBuilder, scan_info: ScanInfo, num_files: usize) -> Self {
        Self::from_node(LogicalNode::TabularFilesScan(TabularFilesScanOp::new(
            listing.root,
            scan_info,
            num_files,
        )))
    }

    /// Start from a user-defined node.
    pub fn extension(
        name: impl Into<String>,
        inputs: Vec<PlanBuilder>,
        num_partitions: usize,
    ) -> TesseraResult<Self> {
        let inputs = inputs.into_iter().map(|b| b.root).collect();
        let op = ExtensionOp::try_new(name, inputs, num_partitions)?;
        Ok(Self::from_node(LogicalNode::Extension(op)))
    }

    /// Filter rows by a predicate.
    pub fn filter(self, predicate: LogicalExpr) -> Self {
        Self::from_node(LogicalNode::Filter(FilterOp::new(self.root, predicate)))
    }

    /// Project columns.
    pub fn project(self, projection: Vec<LogicalExpr>) -> Self {
        Self::from_node(LogicalNode::Projection(ProjectOp::new(
            self.root, projection,
        )))
    }

    /// Apply a function to each whole partition.
    pub fn map_partition(self, func: MapFunction) -> Self {
        Self::from_node(LogicalNode::MapPartition(MapPartitionOp::new(
            self.root, func,
        )))
    }

    /// Explode list columns into one row per element.
    pub fn explode(self, columns: Vec<LogicalExpr>) -> Self {
        self.map_partition(MapFunction::Explode { columns })
    }

    /// Aggregate within each partition.
    pub fn local_aggregate(self, aggs: Vec<AggExpr>, group_by: Vec<LogicalExpr>) -> Self {
        Self::from_node(LogicalNode::LocalAggregate(LocalAggregateOp::new(
            self.root, aggs, group_by,
        )))
    }

    /// Distinct rows within each partition.
    pub fn local_distinct(self, group_by: Vec<LogicalExpr>) -> Self {
        Self::from_node(LogicalNode::LocalDistinct(LocalDistinctOp::new(
            self.root, group_by,
        )))
    }

    /// Write to files.
    pub fn write(self, output: OutputFileInfo) -> Self {
        Self::from_node(LogicalNode::FileWrite(FileWriteOp::new(self.root, output)))
    }

    /// Limit each partition independently.
    pub fn local_limit(self, limit: usize) -> Self {
        Self::from_node(LogicalNode::LocalLimit(LocalLimitOp::new(self.root, limit)))
    }

    /// Limit the whole input.
    pub fn global_limit(self, limit: usize) -> Self {
        Self::from_node(LogicalNode::GlobalLimit(GlobalLimitOp::new(
            self.root, limit,
        )))
    }

    /// Limit the whole input, truncating each partition first.
    pub fn limit(self, limit: usize) -> Self {
        self.local_limit(limit).global_limit(limit)
    }

    /// Shuffle into `num_partitions` outputs.
    pub fn repartition(
        self,
        scheme: PartitionScheme,
        num_partitions: usize,
        partition_by: Vec<LogicalExpr>,
    ) -> TesseraResult<Self> {
        let op = RepartitionOp::try_new(self.root, scheme, num_partitions, partition_by)?;
        Ok(Self::from_node(LogicalNode::Repartition(op)))
    }

    /// Sort globally.
    pub fn sort(self, sort_by: Vec<SortKey>) -> Self {
        Self::from_node(LogicalNode::Sort(SortOp::new(self.root, sort_by)))
    }

    /// Merge partitions down to `num_partitions`.
    pub fn coalesce(self, num_partitions: usize) -> TesseraResult<Self> {
        let op = CoalesceOp::try_new(self.root, num_partitions)?;
        Ok(Self::from_node(LogicalNode::Coalesce(op)))
    }

    /// Join with another plan on equal keys.
    pub fn join(
        self,
        right: PlanBuilder,
        left_on: Vec<LogicalExpr>,
        right_on: Vec<LogicalExpr>,
        how: JoinType,
    ) -> Self {
        Self::from_node(LogicalNode::Join(JoinOp::new(
            self.root, right.root, left_on, right_on, how,
        )))
    }

    /// Set the resource request of the current root.
    #[must_use]
    pub fn with_resource_request(self, request: ResourceRequest) -> Self {
        Self::from_node(self.root.with_resource_request(request))
    }

    /// Borrow the current root.
    pub fn root(&self) -> &LogicalNode {
        &self.root
    }

    /// Finish building.
    pub fn build(self) -> LogicalNode {
        self.root
    }
}

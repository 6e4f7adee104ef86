//! Logical operators for query plans.

mod aggregate;
mod extension;
mod filter;
mod join;
mod limit;
mod project;
mod repartition;
mod scan;
mod sort;
mod write;

pub use aggregate::{LocalAggregateOp, LocalDistinctOp};
pub use extension::ExtensionOp;
pub use filter::FilterOp;
pub use join::{JoinOp, JoinType};
pub use limit::{GlobalLimitOp, LocalLimitOp};
pub use project::{MapFunction, MapPartitionOp, ProjectOp};
pub use repartition::{CoalesceOp, RepartitionOp};
pub use scan::{FileFormat, FileInfo, InMemoryScanOp, ScanInfo, TabularFilesScanOp};
pub use sort::{SortKey, SortOp};
pub use write::{FileWriteOp, OutputFileInfo};

use common_display::{render_tree, TreeDisplay};
use serde::{Deserialize, Serialize};

use crate::resource::ResourceRequest;

/// Logical operator in a query plan.
///
/// Nodes own their inputs. A tree is built once upstream and only read
/// afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LogicalNode {
    /// Read partitions already held in memory.
    InMemoryScan(InMemoryScanOp),
    /// Read tabular files produced by a file listing.
    TabularFilesScan(TabularFilesScanOp),
    /// Filter rows based on a predicate.
    Filter(FilterOp),
    /// Project columns.
    Projection(ProjectOp),
    /// Apply a function to each whole partition.
    MapPartition(MapPartitionOp),
    /// Aggregate within each partition.
    LocalAggregate(LocalAggregateOp),
    /// Distinct rows within each partition.
    LocalDistinct(LocalDistinctOp),
    /// Write partitions to files.
    FileWrite(FileWriteOp),
    /// Limit each partition independently.
    LocalLimit(LocalLimitOp),
    /// Limit the whole input.
    GlobalLimit(GlobalLimitOp),
    /// Shuffle into a new partitioning.
    Repartition(RepartitionOp),
    /// Global sort.
    Sort(SortOp),
    /// Merge partitions down without a shuffle.
    Coalesce(CoalesceOp),
    /// Join two co-partitioned inputs.
    Join(JoinOp),
    /// Operator defined outside the core set.
    Extension(ExtensionOp),
}

/// The inputs of a node, by arity.
#[derive(Debug, Clone, Copy)]
pub enum NodeChildren<'a> {
    Leaf,
    Unary(&'a LogicalNode),
    Binary(&'a LogicalNode, &'a LogicalNode),
}

impl LogicalNode {
    /// Get the inputs of this node.
    pub fn children(&self) -> NodeChildren<'_> {
        match self {
            Self::InMemoryScan(_) => NodeChildren::Leaf,
            Self::TabularFilesScan(op) => NodeChildren::Unary(&op.input),
            Self::Filter(op) => NodeChildren::Unary(&op.input),
            Self::Projection(op) => NodeChildren::Unary(&op.input),
            Self::MapPartition(op) => NodeChildren::Unary(&op.input),
            Self::LocalAggregate(op) => NodeChildren::Unary(&op.input),
            Self::LocalDistinct(op) => NodeChildren::Unary(&op.input),
            Self::FileWrite(op) => NodeChildren::Unary(&op.input),
            Self::LocalLimit(op) => NodeChildren::Unary(&op.input),
            Self::GlobalLimit(op) => NodeChildren::Unary(&op.input),
            Self::Repartition(op) => NodeChildren::Unary(&op.input),
            Self::Sort(op) => NodeChildren::Unary(&op.input),
            Self::Coalesce(op) => NodeChildren::Unary(&op.input),
            Self::Join(op) => NodeChildren::Binary(&op.left, &op.right),
            Self::Extension(op) => match op.inputs() {
                [] => NodeChildren::Leaf,
                [input] => NodeChildren::Unary(input),
                // Construction and deserialization both cap inputs at two.
                [left, right, ..] => NodeChildren::Binary(left, right),
            },
        }
    }

    /// Get the inputs of this node as a list.
    pub fn inputs(&self) -> Vec<&LogicalNode> {
        match self.children() {
            NodeChildren::Leaf => vec![],
            NodeChildren::Unary(input) => vec![input],
            NodeChildren::Binary(left, right) => vec![left, right],
        }
    }

    /// Get the name of this operator.
    pub fn name(&self) -> &'static str {
        match self {
            Self::InMemoryScan(_) => "InMemoryScan",
            Self::TabularFilesScan(_) => "TabularFilesScan",
            Self::Filter(_) => "Filter",
            Self::Projection(_) => "Projection",
            Self::MapPartition(_) => "MapPartition",
            Self::LocalAggregate(_) => "LocalAggregate",
            Self::LocalDistinct(_) => "LocalDistinct",
            Self::FileWrite(_) => "FileWrite",
            Self::LocalLimit(_) => "LocalLimit",
            Self::GlobalLimit(_) => "GlobalLimit",
            Self::Repartition(_) => "Repartition",
            Self::Sort(_) => "Sort",
            Self::Coalesce(_) => "Coalesce",
            Self::Join(_) => "Join",
            Self::Extension(_) => "Extension",
        }
    }

    /// Number of partitions this node produces.
    pub fn num_partitions(&self) -> usize {
        match self {
            Self::InMemoryScan(op) => op.num_partitions,
            Self::TabularFilesScan(op) => op.num_partitions,
            Self::Repartition(op) => op.num_partitions,
            Self::Coalesce(op) => op.num_partitions,
            Self::Join(op) => op.left.num_partitions(),
            Self::Extension(op) => op.num_partitions(),
            Self::Filter(op) => op.input.num_partitions(),
            Self::Projection(op) => op.input.num_partitions(),
            Self::MapPartition(op) => op.input.num_partitions(),
            Self::LocalAggregate(op) => op.input.num_partitions(),
            Self::LocalDistinct(op) => op.input.num_partitions(),
            Self::FileWrite(op) => op.input.num_partitions(),
            Self::LocalLimit(op) => op.input.num_partitions(),
            Self::GlobalLimit(op) => op.input.num_partitions(),
            Self::Sort(op) => op.input.num_partitions(),
        }
    }

    /// Resources requested by this node's instructions.
    pub fn resource_request(&self) -> &ResourceRequest {
        match self {
            Self::InMemoryScan(op) => &op.resource_request,
            Self::TabularFilesScan(op) => &op.resource_request,
            Self::Filter(op) => &op.resource_request,
            Self::Projection(op) => &op.resource_request,
            Self::MapPartition(op) => &op.resource_request,
            Self::LocalAggregate(op) => &op.resource_request,
            Self::LocalDistinct(op) => &op.resource_request,
            Self::FileWrite(op) => &op.resource_request,
            Self::LocalLimit(op) => &op.resource_request,
            Self::GlobalLimit(op) => &op.resource_request,
            Self::Repartition(op) => &op.resource_request,
            Self::Sort(op) => &op.resource_request,
            Self::Coalesce(op) => &op.resource_request,
            Self::Join(op) => &op.resource_request,
            Self::Extension(op) => &op.resource_request,
        }
    }

    /// Replace this node's resource request.
    #[must_use]
    pub fn with_resource_request(mut self, request: ResourceRequest) -> Self {
        let slot = match &mut self {
            Self::InMemoryScan(op) => &mut op.resource_request,
            Self::TabularFilesScan(op) => &mut op.resource_request,
            Self::Filter(op) => &mut op.resource_request,
            Self::Projection(op) => &mut op.resource_request,
            Self::MapPartition(op) => &mut op.resource_request,
            Self::LocalAggregate(op) => &mut op.resource_request,
            Self::LocalDistinct(op) => &mut op.resource_request,
            Self::FileWrite(op) => &mut op.resource_request,
            Self::LocalLimit(op) => &mut op.resource_request,
            Self::GlobalLimit(op) => &mut op.resource_request,
            Self::Repartition(op) => &mut op.resource_request,
            Self::Sort(op) => &mut op.resource_request,
            Self::Coalesce(op) => &mut op.resource_request,
            Self::Join(op) => &mut op.resource_request,
            Self::Extension(op) => &mut op.resource_request,
        };
        *slot = request;
        self
    }

    /// Explain this plan as an indented tree.
    pub fn explain(&self) -> String {
        render_tree(self)
    }

    /// One-line description of this node, without its inputs.
    pub fn label(&self) -> String {
        match self {
            Self::InMemoryScan(op) => format!(
                "InMemoryScan(key={}, partitions={})",
                op.cache_key, op.num_partitions
            ),
            Self::TabularFilesScan(op) => format!(
                "TabularFilesScan(format={}, partitions={})",
                op.scan_info.file_format, op.num_partitions
            ),
            Self::Filter(op) => format!("Filter({})", op.predicate),
            Self::Projection(op) => format!("Projection({})", join_display(&op.projection)),
            Self::MapPartition(op) => format!("MapPartition({})", op.func),
            Self::LocalAggregate(op) => format!(
                "LocalAggregate(aggs=[{}], group_by=[{}])",
                join_display(&op.aggs),
                join_display(&op.group_by)
            ),
            Self::LocalDistinct(op) => {
                format!("LocalDistinct(group_by=[{}])", join_display(&op.group_by))
            }
            Self::FileWrite(op) => format!(
                "FileWrite(format={}, root={})",
                op.output.file_format, op.output.root_dir
            ),
            Self::LocalLimit(op) => format!("LocalLimit({})", op.limit),
            Self::GlobalLimit(op) => format!("GlobalLimit({})", op.limit),
            Self::Repartition(op) if op.partition_by.is_empty() => {
                format!("Repartition({}, {})", op.scheme, op.num_partitions)
            }
            Self::Repartition(op) => format!(
                "Repartition({}, {}, by=[{}])",
                op.scheme,
                op.num_partitions,
                join_display(&op.partition_by)
            ),
            Self::Sort(op) => format!("Sort({})", join_display(&op.sort_by)),
            Self::Coalesce(op) => format!("Coalesce({})", op.num_partitions),
            Self::Join(op) => format!(
                "Join({}, on=[{}] = [{}])",
                op.how,
                join_display(&op.left_on),
                join_display(&op.right_on)
            ),
            Self::Extension(op) => format!("Extension({})", op.name()),
        }
    }
}

impl std::fmt::Display for LogicalNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl TreeDisplay for LogicalNode {
    fn display_label(&self) -> String {
        self.label()
    }

    fn display_children(&self) -> Vec<&dyn TreeDisplay> {
        self.inputs()
            .into_iter()
            .map(|input| input as &dyn TreeDisplay)
            .collect()
    }
}

pub(crate) fn join_display<T: std::fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

//! Logical planning layer for tessera.
//!
//! `tessera-logical` provides the logical plan tree handed to the physical
//! plan translator: relational operators over partitioned data, each
//! carrying a resource request and its node-specific parameters.
//!
//! # Overview
//!
//! - **Expression System**: column references, literals and operators used by
//!   predicates, projections, aggregations and keys
//! - **Logical Operators**: the closed operator set (scans, filters,
//!   projections, local aggregates, limits, repartitions, sorts, joins, ...)
//! - **Plan Building**: fluent API for constructing plans programmatically
//!
//! # Example
//!
//! ```rust
//! use tessera_logical::{col, lit, PartitionScheme, PlanBuilder};
//!
//! let plan = PlanBuilder::in_memory_scan("events", 8)
//!     .filter(col("year").gte(lit(2022)))
//!     .repartition(PartitionScheme::Hash, 4, vec![col("user_id")])
//!     .unwrap()
//!     .build();
//!
//! assert_eq!(plan.num_partitions(), 4);
//! println!("{}", plan.explain());
//! ```

pub mod expr;
pub mod ops;
mod partitioning;
mod plan;
mod resource;

pub use partitioning::PartitionScheme;
pub use plan::PlanBuilder;
pub use resource::ResourceRequest;

pub use ops::{
    CoalesceOp, ExtensionOp, FileFormat, FileInfo, FileWriteOp, FilterOp, GlobalLimitOp,
    InMemoryScanOp, JoinOp, JoinType, LocalAggregateOp, LocalDistinctOp, LocalLimitOp,
    LogicalNode, MapFunction, MapPartitionOp, NodeChildren, OutputFileInfo, ProjectOp,
    RepartitionOp, ScanInfo, SortKey, SortOp, TabularFilesScanOp,
};

pub use expr::{col, count, lit, max, mean, min, sum, AggExpr, AggFunc, LogicalExpr, Value};

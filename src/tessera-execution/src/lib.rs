//! Partition tasks and lazy physical plans for tessera.
//!
//! A physical plan is a pull-based sequence of execution steps. Each step is
//! either a task still open to pipelining, a task whose outputs some
//! combinator is waiting on, or a marker that nothing can be produced until
//! an outstanding task completes.
//!
//! ```text
//! LogicalNode ──▶ translator ──▶ PhysicalPlan ──▶ materialize ──▶ scheduler
//!                                (combinators)    (requests,      (runner)
//!                                                  outputs)
//! ```
//!
//! # Key Components
//!
//! - [`partition`]: opaque partition handles, their metadata and the keyed
//!   partition sets scans read from
//! - [`step`]: instructions, task builders, finalized tasks and their
//!   write-once result slots
//! - [`physical`]: the combinators (`partition_read`, `global_limit`,
//!   `reduce`, `sort`, `join`, ...) that compose plans
//! - [`runner`]: the [`PartitionRunner`] seam a scheduler runs tasks through
//!
//! The `testing` feature adds simulated partitions and a runner that tracks
//! row counts only.

pub mod partition;
pub mod physical;
pub mod runner;
pub mod step;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use partition::{
    MaterializedResult, PartialPartitionMetadata, Partition, PartitionMetadata, PartitionSet,
    PartitionSets,
};
pub use physical::{materialize, MaterializingPlan, MaterializingStep, PhysicalPlan};
pub use runner::PartitionRunner;
pub use step::{
    ExecutionStep, Instruction, MaterializationRequest, PartitionTask, PartitionTaskBuilder,
    PipelinedInstruction, TaskId,
};

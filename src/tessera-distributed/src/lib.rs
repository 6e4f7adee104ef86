//! Physical planning and reference scheduling for tessera.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────┐     ┌────────────────────────┐     ┌───────────────────┐
//! │   LogicalNode    │ ──▶ │ PhysicalPlanTranslator │ ──▶ │  LocalScheduler   │
//! │ (tessera-logical)│     │  (lazy step streams)   │     │ (PartitionRunner) │
//! └──────────────────┘     └────────────────────────┘     └───────────────────┘
//! ```
//!
//! # Key Components
//!
//! - [`PhysicalPlanTranslator`]: lowers a logical tree into a lazy physical
//!   plan, dispatching on node arity first and node kind second
//! - [`LocalScheduler`]: pulls a materializing plan, runs its requests
//!   through a [`PartitionRunner`](tessera_execution::PartitionRunner) and
//!   feeds the results back into the plan
//!
//! # Example
//!
//! ```rust,ignore
//! use tessera_distributed::{get_materializing_physical_plan, LocalScheduler};
//!
//! let plan = get_materializing_physical_plan(&node, &psets)?;
//! let outputs = LocalScheduler::new(runner).run(plan).await?;
//! ```

pub mod planner;
pub mod scheduler;

pub use planner::{get_materializing_physical_plan, get_physical_plan, PhysicalPlanTranslator};
pub use scheduler::LocalScheduler;

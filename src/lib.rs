//! Tessera - lowering of logical dataframe plans into partition tasks
//!
//! Tessera takes an optimized logical plan and turns it into a lazy stream of
//! per-partition tasks that a scheduler pulls, runs and feeds back into the
//! plan as results materialize.

#![forbid(unsafe_code)]
#![allow(clippy::module_name_repetitions)]

// Re-export core crates
pub use common_config as config;
pub use common_error as error;
pub use tessera_distributed as distributed;
pub use tessera_execution as execution;
pub use tessera_logical as logical;

pub use tessera_distributed::{
    get_materializing_physical_plan, get_physical_plan, LocalScheduler, PhysicalPlanTranslator,
};

/// Tessera version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

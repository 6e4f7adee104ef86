//! The seam between scheduling and actually running a task.

use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;

use common_error::TesseraResult;

use crate::partition::{MaterializedResult, Partition};
use crate::step::PartitionTask;

/// Runs partition tasks.
///
/// A runner executes the task's instruction pipeline over its input
/// partitions and returns one result per declared output, in output order.
/// Runners may be called concurrently for independent tasks.
#[async_trait]
pub trait PartitionRunner<P: Partition>: Send + Sync + Debug + 'static {
    /// Run a task to completion.
    async fn run(&self, task: Arc<PartitionTask<P>>) -> TesseraResult<Vec<MaterializedResult<P>>>;
}


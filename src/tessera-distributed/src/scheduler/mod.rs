//! Reference scheduler that drives a materializing plan on one machine.

use std::sync::Arc;

use log::{debug, info};

use common_config::SchedulerConfig;
use common_error::{TesseraError, TesseraResult};
use common_runtime::JoinSet;
use tessera_execution::{
    MaterializationRequest, MaterializedResult, MaterializingPlan, MaterializingStep, Partition,
    PartitionRunner,
};

type TaskOutput<P> = (
    MaterializationRequest<P>,
    TesseraResult<Vec<MaterializedResult<P>>>,
);

/// Pulls a materializing plan and runs its requests through a runner.
///
/// Requests are dispatched as soon as the plan issues them, up to
/// `max_inflight_tasks` at once. Whenever the plan is not ready, or the cap
/// is reached, the scheduler waits for one running task and records its
/// results before pulling again.
#[derive(Debug)]
pub struct LocalScheduler<P: Partition> {
    runner: Arc<dyn PartitionRunner<P>>,
    config: SchedulerConfig,
}

impl<P: Partition> LocalScheduler<P> {
    /// Create a scheduler with the default configuration.
    pub fn new(runner: Arc<dyn PartitionRunner<P>>) -> Self {
        Self {
            runner,
            config: SchedulerConfig::default(),
        }
    }

    /// Replace the configuration.
    pub fn with_config(mut self, config: SchedulerConfig) -> Self {
        self.config = config;
        self
    }

    /// Get the scheduler configuration.
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Run `plan` to completion and return its outputs in emission order.
    ///
    /// The first failing task aborts the run. A plan that keeps reporting
    /// not-ready with nothing running fails with an `ExecutionError`.
    pub async fn run(
        &self,
        mut plan: MaterializingPlan<P>,
    ) -> TesseraResult<Vec<MaterializedResult<P>>> {
        let max_inflight = self.config.max_inflight_tasks.max(1);
        let mut inflight: JoinSet<TaskOutput<P>> = JoinSet::new();
        let mut outputs = Vec::new();
        let mut dispatched = 0usize;
        let mut idle_polls = 0usize;

        loop {
            if inflight.len() >= max_inflight {
                Self::complete_one(&mut inflight).await?;
                continue;
            }

            let Some(step) = plan.next() else {
                break;
            };
            match step {
                MaterializingStep::Request(request) => {
                    idle_polls = 0;
                    if request.is_cancelled() {
                        debug!("skipping cancelled {}", request.id());
                        continue;
                    }
                    debug!(
                        "dispatching {} ({}): {request}",
                        request.id(),
                        request.task().resource_request()
                    );
                    dispatched += 1;
                    let runner = Arc::clone(&self.runner);
                    inflight.spawn(async move {
                        let result = runner.run(request.task_ref()).await;
                        (request, result)
                    });
                }
                MaterializingStep::Output(result) => {
                    idle_polls = 0;
                    outputs.push(result);
                }
                MaterializingStep::NotReady if inflight.is_empty() => {
                    idle_polls += 1;
                    if idle_polls > self.config.max_idle_polls {
                        return Err(TesseraError::execution(format!(
                            "plan made no progress after {idle_polls} polls with no task running"
                        )));
                    }
                    tokio::task::yield_now().await;
                }
                MaterializingStep::NotReady => Self::complete_one(&mut inflight).await?,
            }
        }

        // Whatever is still running was cancelled by the plan.
        inflight.abort_all();
        info!(
            "Plan finished: {} outputs from {dispatched} tasks",
            outputs.len()
        );
        Ok(outputs)
    }

    /// Blocking variant of [`run`](Self::run).
    ///
    /// Must not be called from within an async runtime.
    pub fn run_sync(&self, plan: MaterializingPlan<P>) -> TesseraResult<Vec<MaterializedResult<P>>> {
        common_runtime::block_on(self.run(plan))?
    }

    /// Wait for one running task and record its results.
    async fn complete_one(inflight: &mut JoinSet<TaskOutput<P>>) -> TesseraResult<()> {
        let Some(joined) = inflight.join_next().await else {
            return Ok(());
        };
        let (request, result) = joined?;
        if request.is_cancelled() {
            debug!("discarding results of cancelled {}", request.id());
            return Ok(());
        }
        request.set_results(result?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_execution::physical::{materialize, partition_read};
    use tessera_execution::testing::{SimulatedPartition, SimulatedRunner};
    use tessera_execution::PhysicalPlan;

    #[tokio::test]
    async fn test_run_returns_outputs_in_order() {
        let runner = Arc::new(SimulatedRunner::new());
        let scheduler = LocalScheduler::<SimulatedPartition>::new(runner.clone())
            .with_config(SchedulerConfig::default().with_max_inflight_tasks(2));
        let source = partition_read((1..=5).map(SimulatedPartition::new).collect());

        let outputs = scheduler.run(materialize(source)).await.unwrap();
        let rows: Vec<_> = outputs.iter().map(|r| r.metadata.num_rows).collect();
        assert_eq!(rows, vec![1, 2, 3, 4, 5]);
        assert_eq!(runner.task_log().len(), 5);
    }

    #[tokio::test]
    async fn test_stalled_plan_fails() {
        let runner = Arc::new(SimulatedRunner::new());
        let scheduler = LocalScheduler::<SimulatedPartition>::new(runner)
            .with_config(SchedulerConfig::default().with_max_idle_polls(3));
        let stalled = PhysicalPlan::<SimulatedPartition>::new(
            "stalled",
            std::iter::repeat_with(|| tessera_execution::ExecutionStep::NotReady),
        );

        let err = scheduler.run(materialize(stalled)).await.unwrap_err();
        assert!(matches!(err, TesseraError::ExecutionError(_)));
    }

    #[test]
    fn test_run_sync() {
        let runner = Arc::new(SimulatedRunner::new());
        let scheduler = LocalScheduler::<SimulatedPartition>::new(runner);
        let source = partition_read(vec![SimulatedPartition::new(3)]);
        let outputs = scheduler.run_sync(materialize(source)).unwrap();
        assert_eq!(outputs.len(), 1);
    }
}

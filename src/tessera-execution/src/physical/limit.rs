//! Global limit: the one combinator that adapts to materialized results.

use std::collections::VecDeque;

use log::debug;
use tessera_logical::{GlobalLimitOp, ResourceRequest};

use super::{describe, front_done, local_limit, pull_materialized, PhysicalPlan};
use crate::partition::{MaterializedResult, Partition};
use crate::step::{ExecutionStep, Instruction, MaterializationRequest, PartitionTaskBuilder};

/// Running state of a global limit across polls.
#[derive(Debug)]
pub struct GlobalLimitState<P> {
    remaining_rows: usize,
    remaining_partitions: usize,
    materializations: VecDeque<MaterializationRequest<P>>,
    queued: VecDeque<ExecutionStep<P>>,
    finished: bool,
}

impl<P: Partition> GlobalLimitState<P> {
    pub fn new(limit: usize, num_partitions: usize) -> Self {
        Self {
            remaining_rows: limit,
            remaining_partitions: num_partitions,
            materializations: VecDeque::new(),
            queued: VecDeque::new(),
            finished: false,
        }
    }

    /// Rows still to be taken.
    pub fn remaining_rows(&self) -> usize {
        self.remaining_rows
    }

    /// Output partitions still to be emitted.
    pub fn remaining_partitions(&self) -> usize {
        self.remaining_partitions
    }

    /// Requests issued upstream whose limited output is not yet emitted.
    pub fn num_pending(&self) -> usize {
        self.materializations.len()
    }

    /// True once the budget is spent and every output has been emitted.
    pub fn is_finished(&self) -> bool {
        self.finished && self.queued.is_empty()
    }

    /// Produce the next step of the limit over `child`.
    ///
    /// `child` must already carry a local limit of the full budget; see
    /// [`global_limit`].
    pub fn poll(&mut self, child: &mut PhysicalPlan<P>) -> Option<ExecutionStep<P>> {
        if let Some(step) = self.queued.pop_front() {
            return Some(step);
        }
        if self.finished {
            return None;
        }

        if front_done(&self.materializations) {
            let result = self
                .materializations
                .pop_front()
                .and_then(|done| done.result().cloned());
            if let Some(result) = result {
                return Some(self.take(&result));
            }
        }

        // Limit(0) with a partition already on the way: wait for it.
        if self.remaining_rows == 0 && !self.materializations.is_empty() {
            return Some(ExecutionStep::NotReady);
        }

        match pull_materialized(child, &mut self.materializations) {
            Some(step) => Some(step),
            None if self.materializations.is_empty() => {
                self.finished = true;
                None
            }
            None => {
                debug!(
                    "global_limit blocked on completion of: {}",
                    describe(self.materializations.front())
                );
                Some(ExecutionStep::NotReady)
            }
        }
    }

    /// Apply the rolling limit to the next materialized partition.
    fn take(&mut self, done: &MaterializedResult<P>) -> ExecutionStep<P> {
        let limit = self.remaining_rows.min(done.metadata.num_rows);
        self.remaining_rows -= limit;
        self.remaining_partitions = self.remaining_partitions.saturating_sub(1);
        let step = limit_step(done, limit);

        if self.remaining_rows == 0 {
            // Everything left comes out empty; reuse this partition for it.
            for request in self.materializations.drain(..) {
                request.cancel();
            }
            for _ in 0..self.remaining_partitions {
                self.queued.push_back(limit_step(done, 0));
            }
            self.remaining_partitions = 0;
            self.finished = true;
        }
        step
    }
}

fn limit_step<P: Partition>(done: &MaterializedResult<P>, limit: usize) -> ExecutionStep<P> {
    ExecutionStep::Pipeable(PartitionTaskBuilder::from_results([done]).add_instruction(
        Instruction::LocalLimit { limit },
        ResourceRequest::new().with_memory_bytes(done.metadata.size_bytes),
    ))
}

/// Keep the first `limit` rows of `child`, in partition order.
///
/// Each upstream partition is materialized to learn its row count, then
/// re-emitted with a local limit sized to the rows still wanted. Once the
/// budget is spent no further upstream partitions are pulled, and the
/// remaining outputs are empty limits over an already materialized
/// partition.
pub fn global_limit<P: Partition>(child: PhysicalPlan<P>, node: &GlobalLimitOp) -> PhysicalPlan<P> {
    let child = local_limit(child, node.limit);
    let state = GlobalLimitState::new(node.limit, node.input.num_partitions());
    PhysicalPlan::new("global_limit", GlobalLimit { child, state })
}

struct GlobalLimit<P> {
    child: PhysicalPlan<P>,
    state: GlobalLimitState<P>,
}

impl<P: Partition> Iterator for GlobalLimit<P> {
    type Item = ExecutionStep<P>;

    fn next(&mut self) -> Option<Self::Item> {
        self.state.poll(&mut self.child)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physical::partition_read;
    use crate::testing::{SimulatedPartition, SimulatedRunner};

    fn limited_rows(step: &ExecutionStep<SimulatedPartition>) -> Option<usize> {
        match step {
            ExecutionStep::Pipeable(b) => match b.instructions().last()?.instruction {
                Instruction::LocalLimit { limit } => Some(limit),
                _ => None,
            },
            _ => None,
        }
    }

    /// Drive the limit, running every request as soon as it is issued.
    fn drive(sizes: &[usize], limit: usize) -> (Vec<usize>, usize) {
        let runner = SimulatedRunner::new();
        let source = partition_read(sizes.iter().map(|&n| SimulatedPartition::new(n)).collect());
        let mut child = local_limit(source, limit);
        let mut state = GlobalLimitState::new(limit, sizes.len());

        let mut limits = Vec::new();
        let mut requested = 0;
        while let Some(step) = state.poll(&mut child) {
            match &step {
                ExecutionStep::Materialize(request) => {
                    requested += 1;
                    request
                        .set_results(runner.run_task(request.task()).unwrap())
                        .unwrap();
                }
                ExecutionStep::Pipeable(_) => limits.extend(limited_rows(&step)),
                ExecutionStep::NotReady => panic!("eagerly driven limit should never block"),
            }
        }
        assert!(state.is_finished());
        (limits, requested)
    }

    #[test]
    fn test_global_limit_stops_pulling() {
        let (limits, requested) = drive(&[5, 5, 5], 7);
        assert_eq!(limits, vec![5, 2, 0]);
        assert_eq!(limits.iter().sum::<usize>(), 7);
        assert_eq!(requested, 2);
    }

    #[test]
    fn test_global_limit_larger_than_input() {
        let (limits, requested) = drive(&[3, 1, 2], 100);
        assert_eq!(limits, vec![3, 1, 2]);
        assert_eq!(requested, 3);
    }

    #[test]
    fn test_global_limit_zero() {
        let (limits, requested) = drive(&[4, 4, 4, 4], 0);
        assert_eq!(limits, vec![0, 0, 0, 0]);
        assert_eq!(requested, 1);
    }

    #[test]
    fn test_global_limit_waits_for_front() {
        let source = partition_read(vec![SimulatedPartition::new(5), SimulatedPartition::new(5)]);
        let mut child = local_limit(source, 0);
        let mut state = GlobalLimitState::new(0, 2);

        let first = match state.poll(&mut child) {
            Some(ExecutionStep::Materialize(request)) => request,
            other => panic!("expected a request, got {other:?}"),
        };
        // Nothing more is pulled while the only useful partition is pending.
        assert!(state.poll(&mut child).is_some_and(|s| s.is_not_ready()));
        assert!(state.poll(&mut child).is_some_and(|s| s.is_not_ready()));
        assert_eq!(state.num_pending(), 1);

        let runner = SimulatedRunner::new();
        first.set_results(runner.run_task(first.task()).unwrap()).unwrap();
        let limits: Vec<_> = std::iter::from_fn(|| state.poll(&mut child))
            .map(|s| limited_rows(&s))
            .collect();
        assert_eq!(limits, vec![Some(0), Some(0)]);
        assert_eq!(state.remaining_partitions(), 0);
    }

    #[test]
    fn test_global_limit_cancels_unneeded_requests() {
        let source = partition_read(vec![SimulatedPartition::new(5), SimulatedPartition::new(5)]);
        let mut child = local_limit(source, 3);
        let mut state = GlobalLimitState::new(3, 2);
        let runner = SimulatedRunner::new();

        let mut requests = Vec::new();
        for _ in 0..2 {
            match state.poll(&mut child) {
                Some(ExecutionStep::Materialize(request)) => requests.push(request),
                other => panic!("expected a request, got {other:?}"),
            }
        }
        requests[0]
            .set_results(runner.run_task(requests[0].task()).unwrap())
            .unwrap();

        let step = state.poll(&mut child).unwrap();
        assert_eq!(limited_rows(&step), Some(3));
        assert_eq!(state.remaining_rows(), 0);
        assert!(requests[1].is_cancelled());
    }

    proptest::proptest! {
        #[test]
        fn test_global_limit_takes_exactly_the_budget(
            sizes in proptest::collection::vec(0usize..20, 0..8),
            limit in 0usize..60,
        ) {
            let (limits, _) = drive(&sizes, limit);
            let total: usize = sizes.iter().sum();
            proptest::prop_assert_eq!(limits.iter().sum::<usize>(), limit.min(total));
            proptest::prop_assert_eq!(limits.len(), sizes.len());
        }
    }
}

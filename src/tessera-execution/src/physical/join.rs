//! Co-partitioned join.

use std::collections::VecDeque;

use log::{debug, warn};
use tessera_logical::expr::LogicalExpr;
use tessera_logical::{JoinOp, JoinType, ResourceRequest};

use super::{describe, front_done, pull_materialized, PhysicalPlan};
use crate::partition::{MaterializedResult, Partition};
use crate::step::{ExecutionStep, Instruction, MaterializationRequest, PartitionTaskBuilder};

/// Join partition `i` of `left` with partition `i` of `right`.
///
/// Both sides are materialized; whenever the front partitions of both sides
/// are done they are paired into a join step. Otherwise one more step is
/// pulled from whichever side has fewer requests outstanding.
pub fn join<P: Partition>(
    left: PhysicalPlan<P>,
    right: PhysicalPlan<P>,
    node: &JoinOp,
) -> PhysicalPlan<P> {
    PhysicalPlan::new(
        "join",
        Join {
            left: Side::new(left),
            right: Side::new(right),
            left_on: node.left_on.clone(),
            right_on: node.right_on.clone(),
            how: node.how,
        },
    )
}

struct Side<P> {
    plan: Option<PhysicalPlan<P>>,
    requests: VecDeque<MaterializationRequest<P>>,
}

impl<P: Partition> Side<P> {
    fn new(plan: PhysicalPlan<P>) -> Self {
        Self {
            plan: Some(plan),
            requests: VecDeque::new(),
        }
    }

    fn exhausted(&self) -> bool {
        self.plan.is_none()
    }

    /// Pull one step, or mark the side exhausted.
    fn pull(&mut self) -> Option<ExecutionStep<P>> {
        let plan = self.plan.as_mut()?;
        let step = pull_materialized(plan, &mut self.requests);
        if step.is_none() {
            self.plan = None;
        }
        step
    }

    fn pop_result(&mut self) -> Option<MaterializedResult<P>> {
        self.requests
            .pop_front()
            .and_then(|request| request.result().cloned())
    }
}

struct Join<P> {
    left: Side<P>,
    right: Side<P>,
    left_on: Vec<LogicalExpr>,
    right_on: Vec<LogicalExpr>,
    how: JoinType,
}

impl<P: Partition> Join<P> {
    fn join_step(
        &self,
        left: &MaterializedResult<P>,
        right: &MaterializedResult<P>,
    ) -> ExecutionStep<P> {
        let size_bytes = left.metadata.size_bytes + right.metadata.size_bytes;
        ExecutionStep::Pipeable(PartitionTaskBuilder::from_results([left, right]).add_instruction(
            Instruction::Join {
                left_on: self.left_on.clone(),
                right_on: self.right_on.clone(),
                how: self.how,
            },
            ResourceRequest::new().with_memory_bytes(size_bytes),
        ))
    }
}

impl<P: Partition> Iterator for Join<P> {
    type Item = ExecutionStep<P>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if front_done(&self.left.requests) && front_done(&self.right.requests) {
                let pair = self.left.pop_result().zip(self.right.pop_result());
                if let Some((left, right)) = pair {
                    return Some(self.join_step(&left, &right));
                }
                continue;
            }

            // Pull from the side that is behind, or the one still producing.
            let pull_left = match (self.left.exhausted(), self.right.exhausted()) {
                (false, false) => self.left.requests.len() <= self.right.requests.len(),
                (false, true) => true,
                (true, false) => false,
                (true, true) => break,
            };
            let side = if pull_left {
                &mut self.left
            } else {
                &mut self.right
            };
            if let Some(step) = side.pull() {
                return Some(step);
            }
        }

        // Both sides exhausted.
        let (left, right) = (&self.left.requests, &self.right.requests);
        if left.is_empty() && right.is_empty() {
            return None;
        }
        if left.is_empty() || right.is_empty() {
            warn!(
                "join inputs have different partition counts, dropping {} unmatched partitions",
                left.len() + right.len()
            );
            self.left.requests.clear();
            self.right.requests.clear();
            return None;
        }
        debug!(
            "join blocked on completion of sources. Left: [{}] Right: [{}]",
            describe(left),
            describe(right)
        );
        Some(ExecutionStep::NotReady)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physical::partition_read;
    use crate::testing::{SimulatedPartition, SimulatedRunner};
    use tessera_logical::{col, LogicalNode, PlanBuilder};

    fn join_node() -> JoinOp {
        let right = PlanBuilder::in_memory_scan("r", 2);
        match PlanBuilder::in_memory_scan("l", 2)
            .join(right, vec![col("k")], vec![col("k")], JoinType::Inner)
            .build()
        {
            LogicalNode::Join(op) => op,
            other => panic!("expected join node, got {other}"),
        }
    }

    fn source(rows: &[usize]) -> PhysicalPlan<SimulatedPartition> {
        partition_read(rows.iter().map(|&n| SimulatedPartition::new(n)).collect())
    }

    #[test]
    fn test_join_pairs_partitions_in_order() {
        let runner = SimulatedRunner::new();
        let mut pulled = Vec::new();
        let joins: Vec<_> = join(source(&[1, 2]), source(&[3, 4]), &join_node())
            .filter_map(|step| match step {
                ExecutionStep::Materialize(request) => {
                    request
                        .set_results(runner.run_task(request.task()).unwrap())
                        .unwrap();
                    pulled.push(request.task().inputs()[0].num_rows);
                    None
                }
                ExecutionStep::Pipeable(builder) => Some(
                    builder
                        .inputs()
                        .iter()
                        .map(|p| p.num_rows)
                        .collect::<Vec<_>>(),
                ),
                ExecutionStep::NotReady => panic!("eagerly driven join should never block"),
            })
            .collect();

        assert_eq!(joins, vec![vec![1, 3], vec![2, 4]]);
        // Sides are pulled alternately, left first.
        assert_eq!(pulled, vec![1, 3, 2, 4]);
    }

    #[test]
    fn test_join_memory_request() {
        let runner = SimulatedRunner::new();
        let steps: Vec<_> = join(source(&[2]), source(&[3]), &join_node())
            .filter_map(|step| match step {
                ExecutionStep::Materialize(request) => {
                    request
                        .set_results(runner.run_task(request.task()).unwrap())
                        .unwrap();
                    None
                }
                other => Some(other),
            })
            .collect();

        let ExecutionStep::Pipeable(builder) = &steps[0] else {
            panic!("expected join step, got {}", steps[0]);
        };
        assert_eq!(builder.resource_request().memory_bytes, Some(40));
        assert_eq!(builder.to_string(), "[2 in] -> Join");
    }

    #[test]
    fn test_join_waits_for_both_sides() {
        let mut plan = join(source(&[1]), source(&[1]), &join_node());
        let left = match plan.next() {
            Some(ExecutionStep::Materialize(r)) => r,
            other => panic!("expected left request, got {other:?}"),
        };
        let right = match plan.next() {
            Some(ExecutionStep::Materialize(r)) => r,
            other => panic!("expected right request, got {other:?}"),
        };
        assert!(plan.next().is_some_and(|s| s.is_not_ready()));

        let runner = SimulatedRunner::new();
        left.set_results(runner.run_task(left.task()).unwrap()).unwrap();
        assert!(plan.next().is_some_and(|s| s.is_not_ready()));

        right.set_results(runner.run_task(right.task()).unwrap()).unwrap();
        assert!(matches!(plan.next(), Some(ExecutionStep::Pipeable(_))));
        assert!(plan.next().is_none());
    }

    #[test]
    fn test_join_mismatched_sides_terminates() {
        let runner = SimulatedRunner::new();
        let joins = join(source(&[1, 1, 1]), source(&[1]), &join_node())
            .filter(|step| match step {
                ExecutionStep::Materialize(request) => {
                    request
                        .set_results(runner.run_task(request.task()).unwrap())
                        .unwrap();
                    false
                }
                ExecutionStep::Pipeable(_) => true,
                ExecutionStep::NotReady => panic!("eagerly driven join should never block"),
            })
            .count();
        assert_eq!(joins, 1);
    }
}

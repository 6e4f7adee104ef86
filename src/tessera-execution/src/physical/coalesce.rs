//! Coalesce: merge consecutive partitions without a shuffle.

use std::collections::VecDeque;

use log::{debug, warn};
use tessera_logical::{CoalesceOp, ResourceRequest};

use super::{describe, pull_materialized, PhysicalPlan};
use crate::partition::Partition;
use crate::step::{ExecutionStep, Instruction, MaterializationRequest, PartitionTaskBuilder};

/// How many consecutive inputs each output merges.
///
/// Inputs are spread as evenly as possible; the first `from % to` outputs
/// take one extra input.
pub fn coalesce_merge_counts(from: usize, to: usize) -> VecDeque<usize> {
    if to == 0 {
        return VecDeque::new();
    }
    let base = from / to;
    let extra = from % to;
    (0..to).map(|i| base + usize::from(i < extra)).collect()
}

/// Merge the partitions of `child` down to the node's partition count.
///
/// If the child yields a different number of partitions than its node
/// declared, the last output absorbs whatever is left and outputs with no
/// inputs are skipped.
pub fn coalesce<P: Partition>(child: PhysicalPlan<P>, node: &CoalesceOp) -> PhysicalPlan<P> {
    PhysicalPlan::new(
        "coalesce",
        Coalesce {
            child: Some(child),
            merges: coalesce_merge_counts(node.input.num_partitions(), node.num_partitions),
            materializations: VecDeque::new(),
        },
    )
}

struct Coalesce<P> {
    child: Option<PhysicalPlan<P>>,
    merges: VecDeque<usize>,
    materializations: VecDeque<MaterializationRequest<P>>,
}

impl<P: Partition> Coalesce<P> {
    /// Number of inputs the next output takes, if it can be emitted now.
    fn ready_group(&self) -> Option<usize> {
        let child_done = self.child.is_none();
        let wanted = match self.merges.len() {
            0 => return None,
            // The last group takes everything that remains.
            1 if child_done => self.materializations.len(),
            1 => return None,
            _ if child_done => self.merges[0].min(self.materializations.len()),
            _ => self.merges[0],
        };
        let ready = wanted > 0
            && self.materializations.len() >= wanted
            && self.materializations.iter().take(wanted).all(MaterializationRequest::done);
        ready.then_some(wanted)
    }

    fn merge(&mut self, n: usize) -> ExecutionStep<P> {
        let group: Vec<_> = self.materializations.drain(..n).collect();
        let results: Vec<_> = group
            .iter()
            .filter_map(MaterializationRequest::result)
            .cloned()
            .collect();
        let size_bytes = results.iter().map(|r| r.metadata.size_bytes).sum();
        self.merges.pop_front();
        ExecutionStep::Pipeable(PartitionTaskBuilder::from_results(&results).add_instruction(
            Instruction::ReduceMerge,
            ResourceRequest::new().with_memory_bytes(size_bytes),
        ))
    }
}

impl<P: Partition> Iterator for Coalesce<P> {
    type Item = ExecutionStep<P>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(n) = self.ready_group() {
            return Some(self.merge(n));
        }

        if let Some(child) = self.child.as_mut() {
            if let Some(step) = pull_materialized(child, &mut self.materializations) {
                return Some(step);
            }
            self.child = None;
            if let Some(n) = self.ready_group() {
                return Some(self.merge(n));
            }
        }

        if self.materializations.is_empty() {
            if !self.merges.is_empty() {
                warn!(
                    "coalesce input ran out with {} outputs still expected",
                    self.merges.len()
                );
                self.merges.clear();
            }
            return None;
        }
        if self.merges.is_empty() {
            warn!(
                "coalesce dropping {} partitions beyond the declared input",
                self.materializations.len()
            );
            self.materializations.clear();
            return None;
        }

        debug!(
            "coalesce blocked on completion of a task in: {}",
            describe(&self.materializations)
        );
        Some(ExecutionStep::NotReady)
    }
}

//! Shuffle reduce: gather fanout shards by output index and merge them.

use log::debug;
use tessera_logical::ResourceRequest;

use super::{describe, PhysicalPlan};
use crate::partition::{MaterializedResult, Partition};
use crate::step::{ExecutionStep, Instruction, MaterializationRequest, PartitionTaskBuilder};

/// Merge the shards produced by `fanouts` into `num_partitions` outputs.
///
/// Every fanout task is dispatched first. Once all of them are done, output
/// `i` is emitted as `reduce_instruction` over shard `i` of every fanout, in
/// fanout order. Exactly `num_partitions` outputs are produced regardless of
/// the number of fanouts.
pub fn reduce<P: Partition>(
    fanouts: PhysicalPlan<P>,
    num_partitions: usize,
    reduce_instruction: Instruction,
) -> PhysicalPlan<P> {
    PhysicalPlan::new(
        "reduce",
        Reduce {
            phase: ReducePhase::Dispatch(fanouts),
            materializations: Vec::new(),
            num_partitions,
            reduce_instruction,
            next_output: 0,
        },
    )
}

enum ReducePhase<P> {
    Dispatch(PhysicalPlan<P>),
    Wait,
    Emit(Vec<Vec<MaterializedResult<P>>>),
    Done,
}

struct Reduce<P> {
    phase: ReducePhase<P>,
    materializations: Vec<MaterializationRequest<P>>,
    num_partitions: usize,
    reduce_instruction: Instruction,
    next_output: usize,
}

impl<P: Partition> Reduce<P> {
    /// Group shards by output index: `outputs[i][j]` is shard `i` of fanout `j`.
    fn transpose(&self) -> Vec<Vec<MaterializedResult<P>>> {
        let mut outputs = vec![Vec::with_capacity(self.materializations.len()); self.num_partitions];
        for request in &self.materializations {
            for (i, shard) in request.results().unwrap_or_default().iter().enumerate() {
                if let Some(output) = outputs.get_mut(i) {
                    output.push(shard.clone());
                }
            }
        }
        outputs
    }
}

fn merge_step<P: Partition>(
    reduce_instruction: &Instruction,
    shards: &[MaterializedResult<P>],
) -> ExecutionStep<P> {
    let size_bytes = shards.iter().map(|s| s.metadata.size_bytes).sum();
    ExecutionStep::Pipeable(PartitionTaskBuilder::from_results(shards).add_instruction(
        reduce_instruction.clone(),
        ResourceRequest::new().with_memory_bytes(size_bytes),
    ))
}

impl<P: Partition> Iterator for Reduce<P> {
    type Item = ExecutionStep<P>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match &mut self.phase {
                ReducePhase::Dispatch(fanouts) => match fanouts.next() {
                    Some(ExecutionStep::Pipeable(builder)) => {
                        let request = builder.finalize();
                        self.materializations.push(request.clone());
                        return Some(ExecutionStep::Materialize(request));
                    }
                    Some(other) => return Some(other),
                    None => self.phase = ReducePhase::Wait,
                },
                ReducePhase::Wait => {
                    if self.materializations.iter().all(MaterializationRequest::done) {
                        let outputs = self.transpose();
                        self.materializations.clear();
                        self.phase = ReducePhase::Emit(outputs);
                    } else {
                        debug!(
                            "reduce blocked on completion of all sources in: {}",
                            describe(&self.materializations)
                        );
                        return Some(ExecutionStep::NotReady);
                    }
                }
                ReducePhase::Emit(outputs) => {
                    let Some(shards) = outputs.get(self.next_output) else {
                        self.phase = ReducePhase::Done;
                        continue;
                    };
                    let step = merge_step(&self.reduce_instruction, shards);
                    self.next_output += 1;
                    return Some(step);
                }
                ReducePhase::Done => return None,
            }
        }
    }
}

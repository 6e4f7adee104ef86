//! Global sort by sampled range partitioning.

use log::debug;
use tessera_logical::expr::LogicalExpr;
use tessera_logical::{ResourceRequest, SortOp};

use super::{describe, reduce, PhysicalPlan};
use crate::partition::{MaterializedResult, Partition};
use crate::step::{ExecutionStep, Instruction, MaterializationRequest, PartitionTaskBuilder};

/// Sort `child` globally.
///
/// Stages, each waiting on the previous one:
/// 1. materialize every input partition;
/// 2. sample up to `sample_size` rows of each;
/// 3. reduce the samples to range boundaries, one range per output;
/// 4. range-fan each input out by the boundaries, then merge and sort each
///    range with [`reduce`].
pub fn sort<P: Partition>(
    child: PhysicalPlan<P>,
    node: &SortOp,
    sample_size: usize,
) -> PhysicalPlan<P> {
    PhysicalPlan::new(
        "sort",
        Sort {
            phase: SortPhase::Sources(child),
            sources: Vec::new(),
            samples: Vec::new(),
            sort_by: node.sort_exprs(),
            descending: node.descending(),
            num_partitions: node.input.num_partitions(),
            sample_size,
        },
    )
}

enum SortPhase<P> {
    Sources(PhysicalPlan<P>),
    Sample { next: usize },
    WaitSamples,
    WaitBoundaries(MaterializationRequest<P>),
    Reduce(PhysicalPlan<P>),
}

struct Sort<P> {
    phase: SortPhase<P>,
    sources: Vec<MaterializationRequest<P>>,
    samples: Vec<MaterializationRequest<P>>,
    sort_by: Vec<LogicalExpr>,
    descending: Vec<bool>,
    num_partitions: usize,
    sample_size: usize,
}

impl<P: Partition> Sort<P> {
    fn merge_and_sort(&self) -> Instruction {
        Instruction::ReduceMergeAndSort {
            sort_by: self.sort_by.clone(),
            descending: self.descending.clone(),
        }
    }

    fn sample(&self, source: &MaterializedResult<P>) -> MaterializationRequest<P> {
        PartitionTaskBuilder::from_results([source])
            .add_instruction(
                Instruction::Sample {
                    sort_by: self.sort_by.clone(),
                    size: self.sample_size,
                },
                ResourceRequest::default(),
            )
            .finalize()
    }

    fn boundaries(&self) -> MaterializationRequest<P> {
        let samples = self.samples.iter().filter_map(MaterializationRequest::result);
        PartitionTaskBuilder::from_results(samples)
            .add_instruction(
                Instruction::ReduceToQuantiles {
                    num_quantiles: self.num_partitions,
                    sort_by: self.sort_by.clone(),
                    descending: self.descending.clone(),
                },
                ResourceRequest::default(),
            )
            .finalize()
    }

    fn range_fanout(&self, boundaries: &MaterializedResult<P>) -> PhysicalPlan<P> {
        let steps = self
            .sources
            .iter()
            .filter_map(MaterializationRequest::result)
            .map(|source| {
                ExecutionStep::Pipeable(
                    PartitionTaskBuilder::from_results([boundaries, source]).add_instruction(
                        Instruction::FanoutRange {
                            num_outputs: self.num_partitions,
                            sort_by: self.sort_by.clone(),
                            descending: self.descending.clone(),
                        },
                        ResourceRequest::new().with_memory_bytes(source.metadata.size_bytes),
                    ),
                )
            })
            .collect();
        PhysicalPlan::from_steps("range_fanout", steps)
    }
}

impl<P: Partition> Iterator for Sort<P> {
    type Item = ExecutionStep<P>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match &mut self.phase {
                SortPhase::Sources(child) => match child.next() {
                    Some(ExecutionStep::Pipeable(builder)) => {
                        let request = builder.finalize();
                        self.sources.push(request.clone());
                        return Some(ExecutionStep::Materialize(request));
                    }
                    Some(other) => return Some(other),
                    None if self.sources.is_empty() => {
                        let empty = PhysicalPlan::from_steps("range_fanout", Vec::new());
                        let merge = self.merge_and_sort();
                        self.phase = SortPhase::Reduce(reduce(empty, self.num_partitions, merge));
                    }
                    None => self.phase = SortPhase::Sample { next: 0 },
                },
                SortPhase::Sample { next } => {
                    let Some(source) = self.sources.get(*next) else {
                        self.phase = SortPhase::WaitSamples;
                        continue;
                    };
                    if !source.done() {
                        debug!("sort blocked on completion of source: {}", source.id());
                        return Some(ExecutionStep::NotReady);
                    }
                    *next += 1;
                    if let Some(result) = source.result() {
                        let sample = self.sample(result);
                        self.samples.push(sample.clone());
                        return Some(ExecutionStep::Materialize(sample));
                    }
                }
                SortPhase::WaitSamples => {
                    if !self.samples.iter().all(MaterializationRequest::done) {
                        debug!(
                            "sort blocked on completion of all samples: {}",
                            describe(&self.samples)
                        );
                        return Some(ExecutionStep::NotReady);
                    }
                    let boundaries = self.boundaries();
                    self.phase = SortPhase::WaitBoundaries(boundaries.clone());
                    return Some(ExecutionStep::Materialize(boundaries));
                }
                SortPhase::WaitBoundaries(boundaries) => {
                    let Some(result) = boundaries.result().cloned() else {
                        debug!(
                            "sort blocked on completion of boundary partition: {}",
                            boundaries.id()
                        );
                        return Some(ExecutionStep::NotReady);
                    };
                    let fanouts = self.range_fanout(&result);
                    let merge = self.merge_and_sort();
                    self.sources.clear();
                    self.samples.clear();
                    self.phase = SortPhase::Reduce(reduce(fanouts, self.num_partitions, merge));
                }
                SortPhase::Reduce(plan) => return plan.next(),
            }
        }
    }
}

//! Simulated partitions and runner for driving plans without real data.
//!
//! A [`SimulatedPartition`] only carries a row count, a byte size and
//! optionally a file listing. The [`SimulatedRunner`] evaluates instruction
//! pipelines on those counts, which is enough to exercise every combinator
//! and the scheduler end to end.

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use log::trace;

use common_error::{TesseraError, TesseraResult};
use tessera_logical::{FileInfo, JoinType};

use crate::partition::{MaterializedResult, Partition, PartitionMetadata};
use crate::physical::{MaterializingPlan, MaterializingStep};
use crate::runner::PartitionRunner;
use crate::step::{Instruction, PartitionTask};

/// Bytes per simulated row.
pub const ROW_BYTES: usize = 8;

/// A partition described only by its shape.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatedPartition {
    pub num_rows: usize,
    pub size_bytes: usize,
    files: Vec<FileInfo>,
}

impl SimulatedPartition {
    /// A partition of `num_rows` rows.
    pub fn new(num_rows: usize) -> Self {
        Self::with_size(num_rows, num_rows * ROW_BYTES)
    }

    pub fn with_size(num_rows: usize, size_bytes: usize) -> Self {
        Self {
            num_rows,
            size_bytes,
            files: Vec::new(),
        }
    }

    /// A file listing partition, one row per file.
    pub fn listing(files: Vec<FileInfo>) -> Self {
        let mut partition = Self::new(files.len());
        partition.files = files;
        partition
    }

    pub fn metadata(&self) -> PartitionMetadata {
        PartitionMetadata::new(self.num_rows, self.size_bytes)
    }
}

impl Partition for SimulatedPartition {
    fn file_infos(&self) -> Vec<FileInfo> {
        self.files.clone()
    }
}

/// Runs tasks over [`SimulatedPartition`]s by tracking row counts.
#[derive(Debug, Default)]
pub struct SimulatedRunner {
    log: Mutex<Vec<String>>,
}

impl SimulatedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run a task synchronously.
    pub fn run_task(
        &self,
        task: &PartitionTask<SimulatedPartition>,
    ) -> TesseraResult<Vec<MaterializedResult<SimulatedPartition>>> {
        trace!("running {}: {task}", task.id());
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(task.to_string());

        let mut partitions = task.inputs().to_vec();
        for pipelined in task.instructions() {
            partitions = apply(&pipelined.instruction, partitions)?;
        }
        Ok(partitions
            .into_iter()
            .map(|p| {
                let metadata = p.metadata();
                MaterializedResult::new(p, metadata)
            })
            .collect())
    }

    /// Every task run so far, rendered as its pipeline.
    pub fn task_log(&self) -> Vec<String> {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Pull `plan` to completion, running each request as soon as it is
    /// issued, and return the plan's outputs.
    pub fn drive(
        &self,
        plan: MaterializingPlan<SimulatedPartition>,
    ) -> TesseraResult<Vec<MaterializedResult<SimulatedPartition>>> {
        let mut outputs = Vec::new();
        for step in plan {
            match step {
                MaterializingStep::Request(request) => {
                    request.set_results(self.run_task(request.task())?)?;
                }
                MaterializingStep::Output(result) => outputs.push(result),
                // Requests run eagerly, so nothing should ever be outstanding.
                MaterializingStep::NotReady => {
                    return Err(TesseraError::execution(
                        "plan is waiting on a request that was never issued",
                    ))
                }
            }
        }
        Ok(outputs)
    }
}

#[async_trait]
impl PartitionRunner<SimulatedPartition> for SimulatedRunner {
    async fn run(
        &self,
        task: Arc<PartitionTask<SimulatedPartition>>,
    ) -> TesseraResult<Vec<MaterializedResult<SimulatedPartition>>> {
        self.run_task(&task)
    }
}

fn apply(
    instruction: &Instruction,
    inputs: Vec<SimulatedPartition>,
) -> TesseraResult<Vec<SimulatedPartition>> {
    let map_rows = |f: &dyn Fn(usize) -> usize| {
        inputs
            .iter()
            .map(|p| SimulatedPartition::new(f(p.num_rows)))
            .collect::<Vec<_>>()
    };

    Ok(match instruction {
        Instruction::ReadFile {
            file_info,
            scan_info,
            ..
        } => {
            let rows = file_info.num_rows.unwrap_or(0);
            let rows = scan_info.limit_rows.map_or(rows, |limit| rows.min(limit));
            let size = file_info.size_bytes.unwrap_or(rows * ROW_BYTES);
            vec![SimulatedPartition::with_size(rows, size)]
        }
        Instruction::WriteFile { .. } => map_rows(&|_| 1),
        Instruction::Filter { .. } | Instruction::Project { .. } | Instruction::MapPartition { .. } => {
            map_rows(&|rows| rows)
        }
        Instruction::LocalLimit { limit } => map_rows(&|rows| rows.min(*limit)),
        Instruction::Aggregate { group_by, .. } if group_by.is_empty() => map_rows(&|_| 1),
        Instruction::Aggregate { .. } => map_rows(&|rows| rows),
        Instruction::Sample { size, .. } => map_rows(&|rows| rows.min(*size)),
        Instruction::ReduceToQuantiles { num_quantiles, .. } => {
            vec![SimulatedPartition::new(num_quantiles.saturating_sub(1))]
        }
        Instruction::FanoutRandom { num_outputs, .. } | Instruction::FanoutHash { num_outputs, .. } => {
            let [source] = inputs.as_slice() else {
                return Err(arity_error(instruction, 1, inputs.len()));
            };
            split(source.num_rows, *num_outputs)
        }
        Instruction::FanoutRange { num_outputs, .. } => {
            let [_boundaries, source] = inputs.as_slice() else {
                return Err(arity_error(instruction, 2, inputs.len()));
            };
            split(source.num_rows, *num_outputs)
        }
        Instruction::ReduceMerge | Instruction::ReduceMergeAndSort { .. } => {
            vec![SimulatedPartition::new(inputs.iter().map(|p| p.num_rows).sum())]
        }
        Instruction::Join { how, .. } => {
            let [left, right] = inputs.as_slice() else {
                return Err(arity_error(instruction, 2, inputs.len()));
            };
            let rows = match how {
                JoinType::Inner => left.num_rows.min(right.num_rows),
                JoinType::Left => left.num_rows,
                JoinType::Right => right.num_rows,
            };
            vec![SimulatedPartition::new(rows)]
        }
    })
}

/// Spread `rows` over `n` shards, the first `rows % n` taking one extra.
fn split(rows: usize, n: usize) -> Vec<SimulatedPartition> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| SimulatedPartition::new(rows / n + usize::from(i < rows % n)))
        .collect()
}

fn arity_error(instruction: &Instruction, expected: usize, got: usize) -> TesseraError {
    TesseraError::execution(format!(
        "{instruction} takes {expected} inputs, got {got}"
    ))
}

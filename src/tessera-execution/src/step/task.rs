//! Partition tasks: pipelines of instructions over a set of input partitions.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use common_error::{TesseraError, TesseraResult};
use tessera_logical::ResourceRequest;

use super::Instruction;
use crate::partition::{MaterializedResult, PartialPartitionMetadata, Partition};

/// An instruction together with the resources it needs.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelinedInstruction {
    pub instruction: Instruction,
    pub resource_request: ResourceRequest,
}

/// A task under construction.
///
/// Builders are handed from combinator to combinator, each appending its
/// instruction, until one of them needs the outputs and finalizes it.
#[derive(Debug, Clone)]
pub struct PartitionTaskBuilder<P> {
    inputs: Vec<P>,
    partial_metadatas: Vec<PartialPartitionMetadata>,
    instructions: Vec<PipelinedInstruction>,
}

impl<P: Partition> PartitionTaskBuilder<P> {
    /// Start a task over `inputs`, with nothing known about them.
    pub fn new(inputs: Vec<P>) -> Self {
        let partial_metadatas = vec![PartialPartitionMetadata::unknown(); inputs.len()];
        Self {
            inputs,
            partial_metadatas,
            instructions: Vec::new(),
        }
    }

    /// Start a task over already materialized partitions.
    pub fn from_results<'a>(results: impl IntoIterator<Item = &'a MaterializedResult<P>>) -> Self {
        let (inputs, partial_metadatas) = results
            .into_iter()
            .map(|r| (r.partition.clone(), PartialPartitionMetadata::from(r.metadata)))
            .unzip();
        Self {
            inputs,
            partial_metadatas,
            instructions: Vec::new(),
        }
    }

    /// Append an instruction to the pipeline.
    #[must_use]
    pub fn add_instruction(
        mut self,
        instruction: Instruction,
        resource_request: ResourceRequest,
    ) -> Self {
        self.partial_metadatas = instruction.partial_metadata(&self.partial_metadatas);
        self.instructions.push(PipelinedInstruction {
            instruction,
            resource_request,
        });
        self
    }

    pub fn inputs(&self) -> &[P] {
        &self.inputs
    }

    pub fn instructions(&self) -> &[PipelinedInstruction] {
        &self.instructions
    }

    /// What is known about the outputs of the pipeline so far.
    pub fn partial_metadatas(&self) -> &[PartialPartitionMetadata] {
        &self.partial_metadatas
    }

    /// Field-wise maximum of the instructions' requests.
    pub fn resource_request(&self) -> ResourceRequest {
        ResourceRequest::max_of(self.instructions.iter().map(|i| &i.resource_request))
    }

    /// Number of outputs the task will produce.
    ///
    /// A task without instructions passes its inputs through.
    pub fn num_outputs(&self) -> usize {
        self.instructions
            .last()
            .map_or(self.inputs.len(), |i| i.instruction.num_outputs())
    }

    /// Seal the pipeline into a task and request its materialization.
    pub fn finalize(self) -> MaterializationRequest<P> {
        let task = PartitionTask {
            id: TaskId::next(),
            resource_request: self.resource_request(),
            num_outputs: self.num_outputs(),
            inputs: self.inputs,
            partial_metadatas: self.partial_metadatas,
            instructions: self.instructions,
        };
        MaterializationRequest::new(task)
    }
}

impl<P> std::fmt::Display for PartitionTaskBuilder<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fmt_pipeline(f, self.inputs.len(), &self.instructions)
    }
}

fn fmt_pipeline(
    f: &mut std::fmt::Formatter<'_>,
    num_inputs: usize,
    instructions: &[PipelinedInstruction],
) -> std::fmt::Result {
    write!(f, "[{num_inputs} in]")?;
    for inst in instructions {
        write!(f, " -> {}", inst.instruction)?;
    }
    Ok(())
}

/// Unique id of a finalized task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

impl TaskId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(0);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "task-{}", self.0)
    }
}

/// A finalized task, ready to run.
#[derive(Debug)]
pub struct PartitionTask<P> {
    id: TaskId,
    inputs: Vec<P>,
    partial_metadatas: Vec<PartialPartitionMetadata>,
    instructions: Vec<PipelinedInstruction>,
    resource_request: ResourceRequest,
    num_outputs: usize,
}

impl<P: Partition> PartitionTask<P> {
    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn inputs(&self) -> &[P] {
        &self.inputs
    }

    pub fn instructions(&self) -> &[PipelinedInstruction] {
        &self.instructions
    }

    pub fn partial_metadatas(&self) -> &[PartialPartitionMetadata] {
        &self.partial_metadatas
    }

    pub fn resource_request(&self) -> &ResourceRequest {
        &self.resource_request
    }

    pub fn num_outputs(&self) -> usize {
        self.num_outputs
    }
}

impl<P> std::fmt::Display for PartitionTask<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fmt_pipeline(f, self.inputs.len(), &self.instructions)
    }
}

#[derive(Debug)]
struct RequestState<P> {
    results: OnceLock<Vec<MaterializedResult<P>>>,
    cancelled: AtomicBool,
}

/// A task whose outputs someone is waiting for.
///
/// Clones share one write-once result slot: the scheduler fills it, the
/// combinator that issued the request reads it.
#[derive(Debug)]
pub struct MaterializationRequest<P> {
    task: Arc<PartitionTask<P>>,
    state: Arc<RequestState<P>>,
}

impl<P> Clone for MaterializationRequest<P> {
    fn clone(&self) -> Self {
        Self {
            task: Arc::clone(&self.task),
            state: Arc::clone(&self.state),
        }
    }
}

impl<P: Partition> MaterializationRequest<P> {
    fn new(task: PartitionTask<P>) -> Self {
        Self {
            task: Arc::new(task),
            state: Arc::new(RequestState {
                results: OnceLock::new(),
                cancelled: AtomicBool::new(false),
            }),
        }
    }

    pub fn id(&self) -> TaskId {
        self.task.id
    }

    pub fn task(&self) -> &PartitionTask<P> {
        &self.task
    }

    /// Shared handle to the task, for handing to a runner.
    pub fn task_ref(&self) -> Arc<PartitionTask<P>> {
        Arc::clone(&self.task)
    }

    /// True once results have been recorded.
    pub fn done(&self) -> bool {
        self.state.results.get().is_some()
    }

    /// All outputs, once done.
    pub fn results(&self) -> Option<&[MaterializedResult<P>]> {
        self.state.results.get().map(Vec::as_slice)
    }

    /// The first output, once done.
    pub fn result(&self) -> Option<&MaterializedResult<P>> {
        self.results().and_then(<[_]>::first)
    }

    /// Record the outputs of the task.
    ///
    /// Fails if results were already recorded or the count does not match
    /// the task's outputs.
    pub fn set_results(&self, results: Vec<MaterializedResult<P>>) -> TesseraResult<()> {
        if results.len() != self.task.num_outputs {
            return Err(TesseraError::execution(format!(
                "{} produced {} outputs, expected {}",
                self.task.id,
                results.len(),
                self.task.num_outputs
            )));
        }
        self.state.results.set(results).map_err(|_| {
            TesseraError::internal(format!("results of {} recorded twice", self.task.id))
        })
    }

    /// Mark the outputs as no longer needed.
    pub fn cancel(&self) {
        self.state.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.state.cancelled.load(Ordering::Acquire)
    }
}

impl<P> std::fmt::Display for MaterializationRequest<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.task)
    }
}

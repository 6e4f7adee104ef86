//! Execution steps: the units a physical plan hands to its scheduler.

mod instruction;
mod task;

pub use instruction::Instruction;
pub use task::{
    MaterializationRequest, PartitionTask, PartitionTaskBuilder, PipelinedInstruction, TaskId,
};

use crate::partition::Partition;

/// One step pulled from a physical plan.
#[derive(Debug)]
pub enum ExecutionStep<P> {
    /// A task still open to further pipelining.
    Pipeable(PartitionTaskBuilder<P>),
    /// A task whose outputs a combinator is waiting for.
    Materialize(MaterializationRequest<P>),
    /// Nothing can be produced until an outstanding request completes.
    NotReady,
}

impl<P: Partition> ExecutionStep<P> {
    /// Append an instruction if this step is still pipeable.
    #[must_use]
    pub fn pipe(
        self,
        instruction: &Instruction,
        resource_request: &tessera_logical::ResourceRequest,
    ) -> Self {
        match self {
            Self::Pipeable(builder) => {
                Self::Pipeable(builder.add_instruction(instruction.clone(), resource_request.clone()))
            }
            other => other,
        }
    }

    pub fn is_not_ready(&self) -> bool {
        matches!(self, Self::NotReady)
    }
}

impl<P> std::fmt::Display for ExecutionStep<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pipeable(builder) => write!(f, "Pipeable({builder})"),
            Self::Materialize(request) => write!(f, "Materialize({request})"),
            Self::NotReady => write!(f, "NotReady"),
        }
    }
}

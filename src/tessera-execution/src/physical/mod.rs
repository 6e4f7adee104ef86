//! Lazy physical plans and the combinators that build them.
//!
//! A physical plan is a pull-based sequence of [`ExecutionStep`]s. Each
//! combinator owns its upstream plan(s) exclusively and keeps whatever
//! buffering it needs in its own state; nothing is shared between plans
//! except the read-only result slots of materialization requests.
//!
//! Combinators that must wait on a result yield [`ExecutionStep::NotReady`];
//! the puller re-polls once some outstanding request completes.

mod coalesce;
mod join;
mod limit;
mod materialize;
mod pipeline;
mod read;
mod reduce;
mod sort;

pub use coalesce::{coalesce, coalesce_merge_counts};
pub use join::join;
pub use limit::{global_limit, GlobalLimitState};
pub use materialize::{materialize, MaterializingPlan, MaterializingStep};
pub use pipeline::{file_write, local_limit, pipeline_instruction};
pub use read::{file_read, partition_read};
pub use reduce::reduce;
pub use sort::sort;

use crate::partition::Partition;
use crate::step::{ExecutionStep, MaterializationRequest};

/// A lazy sequence of execution steps.
pub struct PhysicalPlan<P> {
    name: &'static str,
    steps: Box<dyn Iterator<Item = ExecutionStep<P>> + Send>,
}

impl<P: Partition> PhysicalPlan<P> {
    /// Wrap an iterator of steps produced by the named combinator.
    pub fn new<I>(name: &'static str, steps: I) -> Self
    where
        I: Iterator<Item = ExecutionStep<P>> + Send + 'static,
    {
        Self {
            name,
            steps: Box::new(steps),
        }
    }

    /// A plan that yields the given steps in order.
    pub fn from_steps(name: &'static str, steps: Vec<ExecutionStep<P>>) -> Self {
        Self::new(name, steps.into_iter())
    }

    /// Name of the combinator at the root of this plan.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl<P> Iterator for PhysicalPlan<P> {
    type Item = ExecutionStep<P>;

    fn next(&mut self) -> Option<Self::Item> {
        self.steps.next()
    }
}

impl<P> std::fmt::Debug for PhysicalPlan<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhysicalPlan").field("name", &self.name).finish()
    }
}

/// Pull one step from `child`, finalizing a pipeable step into a request
/// that is queued on `pending`.
///
/// Returns `None` once the child is exhausted.
pub(crate) fn pull_materialized<P: Partition>(
    child: &mut PhysicalPlan<P>,
    pending: &mut std::collections::VecDeque<MaterializationRequest<P>>,
) -> Option<ExecutionStep<P>> {
    let step = child.next()?;
    Some(match step {
        ExecutionStep::Pipeable(builder) => {
            let request = builder.finalize();
            pending.push_back(request.clone());
            ExecutionStep::Materialize(request)
        }
        other => other,
    })
}

/// True if the front request of `pending` has finished.
pub(crate) fn front_done<P: Partition>(
    pending: &std::collections::VecDeque<MaterializationRequest<P>>,
) -> bool {
    pending.front().is_some_and(MaterializationRequest::done)
}

/// Join request descriptions for log lines.
pub(crate) fn describe<'a, P: Partition>(
    requests: impl IntoIterator<Item = &'a MaterializationRequest<P>>,
) -> String {
    requests
        .into_iter()
        .map(|r| r.id().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

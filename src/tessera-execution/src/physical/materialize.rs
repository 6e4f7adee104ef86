//! Top-level materialization of a physical plan.

use std::collections::VecDeque;

use log::debug;

use super::{describe, pull_materialized, PhysicalPlan};
use crate::partition::{MaterializedResult, Partition};
use crate::step::{ExecutionStep, MaterializationRequest};

/// One step pulled from a [`MaterializingPlan`].
#[derive(Debug)]
pub enum MaterializingStep<P> {
    /// A task the scheduler must run.
    Request(MaterializationRequest<P>),
    /// A final output partition of the plan.
    Output(MaterializedResult<P>),
    /// Nothing can be produced until an outstanding request completes.
    NotReady,
}

impl<P> std::fmt::Display for MaterializingStep<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Request(request) => write!(f, "Request({request})"),
            Self::Output(result) => write!(
                f,
                "Output(rows={}, bytes={})",
                result.metadata.num_rows, result.metadata.size_bytes
            ),
            Self::NotReady => write!(f, "NotReady"),
        }
    }
}

/// Finalize every step of `plan` and hand back its outputs.
///
/// Every pipeable step becomes a request; outputs are yielded in the order
/// their requests were issued, as soon as the earliest outstanding request is
/// done. Not-ready markers from `plan` pass through unchanged.
pub fn materialize<P: Partition>(plan: PhysicalPlan<P>) -> MaterializingPlan<P> {
    MaterializingPlan {
        child: Some(plan),
        pending: VecDeque::new(),
        outputs: VecDeque::new(),
    }
}

/// A physical plan whose outputs are being materialized.
#[derive(Debug)]
pub struct MaterializingPlan<P> {
    child: Option<PhysicalPlan<P>>,
    pending: VecDeque<MaterializationRequest<P>>,
    outputs: VecDeque<MaterializedResult<P>>,
}

impl<P: Partition> MaterializingPlan<P> {
    /// Top-level requests whose outputs have not been yielded yet.
    pub fn num_pending(&self) -> usize {
        self.pending.len()
    }

    /// Move the outputs of finished requests at the front of the queue.
    fn collect_done(&mut self) {
        while let Some(front) = self.pending.front() {
            let Some(results) = front.results() else {
                break;
            };
            self.outputs.extend(results.iter().cloned());
            self.pending.pop_front();
        }
    }
}

impl<P: Partition> Iterator for MaterializingPlan<P> {
    type Item = MaterializingStep<P>;

    fn next(&mut self) -> Option<Self::Item> {
        self.collect_done();
        if let Some(output) = self.outputs.pop_front() {
            return Some(MaterializingStep::Output(output));
        }

        if let Some(child) = self.child.as_mut() {
            match pull_materialized(child, &mut self.pending) {
                Some(ExecutionStep::Materialize(request)) => {
                    return Some(MaterializingStep::Request(request))
                }
                Some(_) => return Some(MaterializingStep::NotReady),
                None => self.child = None,
            }
        }

        if self.pending.is_empty() {
            return None;
        }
        debug!(
            "materialize blocked on completion of: {}",
            describe(&self.pending)
        );
        Some(MaterializingStep::NotReady)
    }
}

//! Source combinators.

use std::collections::VecDeque;

use log::debug;
use tessera_logical::{ResourceRequest, ScanInfo};

use super::{describe, front_done, pull_materialized, PhysicalPlan};
use crate::partition::Partition;
use crate::step::{ExecutionStep, Instruction, MaterializationRequest, PartitionTaskBuilder};

/// One pipeable step per partition, in input order.
pub fn partition_read<P: Partition>(partitions: Vec<P>) -> PhysicalPlan<P> {
    PhysicalPlan::new(
        "partition_read",
        partitions
            .into_iter()
            .map(|p| ExecutionStep::Pipeable(PartitionTaskBuilder::new(vec![p]))),
    )
}

/// Expand file-listing partitions into one read step per listed file.
///
/// Each listing partition from `child` is materialized first; once it is
/// done, every file it lists becomes a `ReadFile` step over it, requesting
/// the file's size in memory.
pub fn file_read<P: Partition>(child: PhysicalPlan<P>, scan_info: ScanInfo) -> PhysicalPlan<P> {
    PhysicalPlan::new(
        "file_read",
        FileRead {
            child,
            scan_info,
            listings: VecDeque::new(),
            ready: VecDeque::new(),
            next_partition_id: 0,
        },
    )
}

struct FileRead<P> {
    child: PhysicalPlan<P>,
    scan_info: ScanInfo,
    listings: VecDeque<MaterializationRequest<P>>,
    ready: VecDeque<ExecutionStep<P>>,
    next_partition_id: usize,
}

impl<P: Partition> FileRead<P> {
    fn expand(&mut self, listing: &MaterializationRequest<P>) {
        for result in listing.results().unwrap_or_default() {
            for (index, file_info) in result.partition.file_infos().into_iter().enumerate() {
                let resource_request = match file_info.size_bytes {
                    Some(size) => ResourceRequest::new().with_memory_bytes(size),
                    None => ResourceRequest::new(),
                };
                let instruction = Instruction::ReadFile {
                    partition_id: self.next_partition_id,
                    index,
                    file_info,
                    scan_info: self.scan_info.clone(),
                };
                let builder = PartitionTaskBuilder::from_results([result])
                    .add_instruction(instruction, resource_request);
                self.ready.push_back(ExecutionStep::Pipeable(builder));
                self.next_partition_id += 1;
            }
        }
    }
}

impl<P: Partition> Iterator for FileRead<P> {
    type Item = ExecutionStep<P>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(step) = self.ready.pop_front() {
                return Some(step);
            }

            if front_done(&self.listings) {
                if let Some(listing) = self.listings.pop_front() {
                    self.expand(&listing);
                }
                continue;
            }

            return match pull_materialized(&mut self.child, &mut self.listings) {
                Some(step) => Some(step),
                None if self.listings.is_empty() => None,
                None => {
                    debug!(
                        "file_read blocked on completion of first listing in: {}",
                        describe(&self.listings)
                    );
                    Some(ExecutionStep::NotReady)
                }
            };
        }
    }
}

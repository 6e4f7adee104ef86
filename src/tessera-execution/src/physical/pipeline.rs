//! Stateless combinators that append an instruction to each pipeable step.

use tessera_logical::{FileWriteOp, ResourceRequest};

use super::PhysicalPlan;
use crate::partition::Partition;
use crate::step::{ExecutionStep, Instruction};

/// Append `instruction` to every pipeable step of `child`.
///
/// Materialization requests and not-ready markers pass through unchanged.
pub fn pipeline_instruction<P: Partition>(
    child: PhysicalPlan<P>,
    instruction: Instruction,
    resource_request: ResourceRequest,
) -> PhysicalPlan<P> {
    PhysicalPlan::new(
        "pipeline_instruction",
        child.map(move |step| step.pipe(&instruction, &resource_request)),
    )
}

/// Truncate every partition of `child` to at most `limit` rows.
pub fn local_limit<P: Partition>(child: PhysicalPlan<P>, limit: usize) -> PhysicalPlan<P> {
    let mut plan = pipeline_instruction(
        child,
        Instruction::LocalLimit { limit },
        ResourceRequest::default(),
    );
    plan.name = "local_limit";
    plan
}

/// Write every partition of `child` to files.
///
/// Output partitions are numbered in the order their steps are pulled.
pub fn file_write<P: Partition>(child: PhysicalPlan<P>, write: &FileWriteOp) -> PhysicalPlan<P> {
    let output = write.output.clone();
    let resource_request = write.resource_request.clone();
    let mut next_partition_id = 0;
    PhysicalPlan::new(
        "file_write",
        child.map(move |step| match step {
            ExecutionStep::Pipeable(builder) => {
                let instruction = Instruction::WriteFile {
                    partition_id: next_partition_id,
                    output: output.clone(),
                };
                next_partition_id += 1;
                ExecutionStep::Pipeable(builder.add_instruction(instruction, resource_request.clone()))
            }
            other => other,
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physical::partition_read;
    use crate::testing::SimulatedPartition;
    use tessera_logical::{col, lit, FileFormat, OutputFileInfo, PlanBuilder};

    fn source(n: usize) -> PhysicalPlan<SimulatedPartition> {
        partition_read((0..n).map(|_| SimulatedPartition::new(10)).collect())
    }

    #[test]
    fn test_pipeline_carries_resource_request() {
        let request = ResourceRequest::new().with_num_cpus(2.0);
        let predicate = col("x").gt(lit(1));
        let steps: Vec<_> = pipeline_instruction(
            source(2),
            Instruction::Filter {
                predicate: predicate.clone(),
            },
            request.clone(),
        )
        .collect();

        assert_eq!(steps.len(), 2);
        for step in &steps {
            let ExecutionStep::Pipeable(builder) = step else {
                panic!("expected pipeable step, got {step}");
            };
            assert_eq!(builder.instructions().len(), 1);
            assert_eq!(
                builder.instructions()[0].instruction,
                Instruction::Filter {
                    predicate: predicate.clone()
                }
            );
            assert_eq!(builder.instructions()[0].resource_request, request);
        }
    }

    #[test]
    fn test_pipeline_passes_other_steps_through() {
        let upstream = PhysicalPlan::from_steps(
            "test",
            vec![
                ExecutionStep::NotReady,
                ExecutionStep::Pipeable(crate::step::PartitionTaskBuilder::new(vec![
                    SimulatedPartition::new(1),
                ])),
            ],
        );
        let steps: Vec<_> = local_limit(upstream, 3).collect();
        assert!(steps[0].is_not_ready());
        assert_eq!(steps[1].to_string(), "Pipeable([1 in] -> LocalLimit(3))");
    }

    #[test]
    fn test_file_write_numbers_partitions() {
        let node = PlanBuilder::in_memory_scan("t", 3)
            .write(OutputFileInfo::new("/out", FileFormat::Parquet))
            .build();
        let tessera_logical::LogicalNode::FileWrite(write) = &node else {
            panic!("expected file write node");
        };

        let ids: Vec<_> = file_write(source(3), write)
            .map(|step| match step {
                ExecutionStep::Pipeable(b) => match &b.instructions()[0].instruction {
                    Instruction::WriteFile { partition_id, .. } => *partition_id,
                    other => panic!("unexpected instruction {other}"),
                },
                other => panic!("unexpected step {other}"),
            })
            .collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }
}

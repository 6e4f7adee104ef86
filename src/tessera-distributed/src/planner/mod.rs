//! Physical planning: lowering logical plans into lazy physical plans.
//!
//! The translator walks the logical tree depth first. Leaves become source
//! plans, unary nodes wrap the plan of their input, and joins compose the
//! plans of both inputs. Nothing is pulled during translation; the returned
//! plan only starts producing steps once a scheduler pulls it.

use log::debug;

use common_config::PlannerConfig;
use common_error::{unsupported_err, TesseraResult};
use tessera_execution::physical::{
    coalesce, file_read, file_write, global_limit, join, local_limit, materialize,
    partition_read, pipeline_instruction, reduce, sort, MaterializingPlan, PhysicalPlan,
};
use tessera_execution::{Instruction, Partition, PartitionSets};
use tessera_logical::{LogicalNode, NodeChildren, PartitionScheme, RepartitionOp};

// ============================================================================
// Physical Plan Translator
// ============================================================================

/// Lowers logical plans into physical plans.
///
/// Translation is a pure function of the logical tree, the partition sets
/// and the configuration: translating the same inputs twice yields two
/// independent plans producing the same steps.
#[derive(Debug, Clone, Default)]
pub struct PhysicalPlanTranslator {
    config: PlannerConfig,
}

impl PhysicalPlanTranslator {
    /// Create a translator with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with configuration.
    pub fn with_config(config: PlannerConfig) -> Self {
        Self { config }
    }

    /// Get the planner configuration.
    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Translate `node` into a physical plan.
    ///
    /// Fails with `PartitionSetNotFound` if an in-memory scan references a
    /// key missing from `psets`, and with `UnsupportedPlan` for nodes that
    /// have no physical lowering. On failure no plan is produced at all.
    pub fn translate<P: Partition>(
        &self,
        node: &LogicalNode,
        psets: &PartitionSets<P>,
    ) -> TesseraResult<PhysicalPlan<P>> {
        debug!("Translating {}", node.label());
        match node.children() {
            NodeChildren::Leaf => Self::translate_leaf(node, psets),
            NodeChildren::Unary(input) => {
                let child = self.translate(input, psets)?;
                self.translate_unary(node, child)
            }
            NodeChildren::Binary(left, right) => {
                let left = self.translate(left, psets)?;
                let right = self.translate(right, psets)?;
                Self::translate_binary(node, left, right)
            }
        }
    }

    /// Translate `node` into a plan that also materializes its outputs.
    pub fn translate_materializing<P: Partition>(
        &self,
        node: &LogicalNode,
        psets: &PartitionSets<P>,
    ) -> TesseraResult<MaterializingPlan<P>> {
        Ok(materialize(self.translate(node, psets)?))
    }

    fn translate_leaf<P: Partition>(
        node: &LogicalNode,
        psets: &PartitionSets<P>,
    ) -> TesseraResult<PhysicalPlan<P>> {
        match node {
            LogicalNode::InMemoryScan(scan) => {
                let set = psets.get(&scan.cache_key)?;
                Ok(partition_read(set.partitions().to_vec()))
            }
            _ => unsupported_err!("Unsupported plan type {}", node.label()),
        }
    }

    fn translate_unary<P: Partition>(
        &self,
        node: &LogicalNode,
        child: PhysicalPlan<P>,
    ) -> TesseraResult<PhysicalPlan<P>> {
        let plan = match node {
            LogicalNode::TabularFilesScan(scan) => file_read(child, scan.scan_info.clone()),
            LogicalNode::Filter(filter) => pipeline_instruction(
                child,
                Instruction::Filter {
                    predicate: filter.predicate.clone(),
                },
                filter.resource_request.clone(),
            ),
            LogicalNode::Projection(project) => pipeline_instruction(
                child,
                Instruction::Project {
                    projection: project.projection.clone(),
                },
                project.resource_request.clone(),
            ),
            LogicalNode::MapPartition(map) => pipeline_instruction(
                child,
                Instruction::MapPartition {
                    func: map.func.clone(),
                },
                map.resource_request.clone(),
            ),
            LogicalNode::LocalAggregate(agg) => pipeline_instruction(
                child,
                Instruction::Aggregate {
                    to_agg: agg.aggs.clone(),
                    group_by: agg.group_by.clone(),
                },
                agg.resource_request.clone(),
            ),
            // Distinct is a group-by with nothing aggregated.
            LogicalNode::LocalDistinct(distinct) => pipeline_instruction(
                child,
                Instruction::Aggregate {
                    to_agg: Vec::new(),
                    group_by: distinct.group_by.clone(),
                },
                distinct.resource_request.clone(),
            ),
            LogicalNode::FileWrite(write) => file_write(child, write),
            LogicalNode::LocalLimit(limit) => local_limit(child, limit.limit),
            LogicalNode::GlobalLimit(limit) => global_limit(child, limit),
            LogicalNode::Repartition(repartition) => self.repartition(child, repartition)?,
            LogicalNode::Sort(sort_op) => sort(child, sort_op, self.config.sort_sample_size),
            LogicalNode::Coalesce(coalesce_op) => coalesce(child, coalesce_op),
            _ => unsupported_err!("Unsupported plan type {}", node.label()),
        };
        Ok(plan)
    }

    fn translate_binary<P: Partition>(
        node: &LogicalNode,
        left: PhysicalPlan<P>,
        right: PhysicalPlan<P>,
    ) -> TesseraResult<PhysicalPlan<P>> {
        match node {
            LogicalNode::Join(join_op) => Ok(join(left, right, join_op)),
            _ => unsupported_err!("Unsupported plan type {}", node.label()),
        }
    }

    /// Shuffle: fan every input out into `k` shards, then merge shard `i` of
    /// every input into output `i`.
    fn repartition<P: Partition>(
        &self,
        child: PhysicalPlan<P>,
        node: &RepartitionOp,
    ) -> TesseraResult<PhysicalPlan<P>> {
        let fanout = match node.scheme {
            PartitionScheme::Random => Instruction::FanoutRandom {
                num_outputs: node.num_partitions,
                seed: self.config.random_fanout_seed,
            },
            PartitionScheme::Hash => Instruction::FanoutHash {
                num_outputs: node.num_partitions,
                partition_by: node.partition_by.clone(),
            },
            scheme @ (PartitionScheme::Range | PartitionScheme::Unknown) => {
                unsupported_err!("Unimplemented partitioning scheme {scheme}")
            }
        };

        let fanout_plan = pipeline_instruction(child, fanout, node.resource_request.clone());
        Ok(reduce(
            fanout_plan,
            node.num_partitions,
            Instruction::ReduceMerge,
        ))
    }
}

/// Translate `node` with the default configuration.
pub fn get_physical_plan<P: Partition>(
    node: &LogicalNode,
    psets: &PartitionSets<P>,
) -> TesseraResult<PhysicalPlan<P>> {
    PhysicalPlanTranslator::new().translate(node, psets)
}

/// Translate `node` with the default configuration into a plan that
/// materializes its outputs.
pub fn get_materializing_physical_plan<P: Partition>(
    node: &LogicalNode,
    psets: &PartitionSets<P>,
) -> TesseraResult<MaterializingPlan<P>> {
    PhysicalPlanTranslator::new().translate_materializing(node, psets)
}

//! Integration tests for physical plan translation.
//!
//! Plans are translated against simulated partitions and, where the shape of
//! the produced steps depends on materialized results, driven to completion
//! with the simulated runner.

use proptest::prelude::*;

use common_config::PlannerConfig;
use common_error::TesseraError;
use tessera_distributed::{
    get_materializing_physical_plan, get_physical_plan, PhysicalPlanTranslator,
};
use tessera_execution::testing::{SimulatedPartition, SimulatedRunner};
use tessera_execution::{ExecutionStep, Instruction, PartitionSets};
use tessera_logical::{
    col, lit, sum, FileFormat, FileInfo, JoinType, LogicalNode, OutputFileInfo, PartitionScheme,
    PlanBuilder, ResourceRequest, ScanInfo, SortKey,
};

fn partitions(rows: &[usize]) -> Vec<SimulatedPartition> {
    rows.iter().map(|&n| SimulatedPartition::new(n)).collect()
}

fn psets(key: &str, rows: &[usize]) -> PartitionSets<SimulatedPartition> {
    PartitionSets::new().with_set(key, partitions(rows))
}

fn row_counts(node: &LogicalNode, psets: &PartitionSets<SimulatedPartition>) -> Vec<usize> {
    let plan = get_materializing_physical_plan(node, psets).unwrap();
    SimulatedRunner::new()
        .drive(plan)
        .unwrap()
        .iter()
        .map(|r| r.metadata.num_rows)
        .collect()
}

// ============================================================================
// Sources
// ============================================================================

#[test]
fn test_in_memory_scan_reads_partitions_in_order() {
    let psets = psets("k", &[10, 20, 30]);
    let node = PlanBuilder::in_memory_scan("k", 3).build();

    let steps: Vec<_> = get_physical_plan(&node, &psets).unwrap().collect();
    assert_eq!(steps.len(), 3);
    for (step, expected) in steps.iter().zip(psets.get("k").unwrap().partitions()) {
        let ExecutionStep::Pipeable(builder) = step else {
            panic!("expected read step, got {step}");
        };
        assert_eq!(builder.inputs(), std::slice::from_ref(expected));
        assert!(builder.instructions().is_empty());
    }
}

#[test]
fn test_in_memory_scan_missing_key() {
    let node = PlanBuilder::in_memory_scan("missing", 3).build();
    let err = get_physical_plan(&node, &psets("k", &[1])).unwrap_err();
    assert!(err.is_lookup_failure());
    assert!(matches!(err, TesseraError::PartitionSetNotFound { ref key } if key == "missing"));
}

#[test]
fn test_files_scan_reads_every_listed_file() {
    let listing = SimulatedPartition::listing(vec![
        FileInfo::new("a.csv").with_num_rows(10),
        FileInfo::new("b.csv").with_num_rows(40),
    ]);
    let psets = PartitionSets::new().with_set("listing", vec![listing]);
    let node = PlanBuilder::files_scan(
        PlanBuilder::in_memory_scan("listing", 1),
        ScanInfo::new(FileFormat::Csv).with_limit_rows(25),
        2,
    )
    .build();

    assert_eq!(row_counts(&node, &psets), vec![10, 25]);
}

// ============================================================================
// Pipelined transforms
// ============================================================================

#[test]
fn test_filter_carries_node_resource_request() {
    let request = ResourceRequest::new()
        .with_num_cpus(0.5)
        .with_memory_bytes(64);
    let predicate = col("age").gt(lit(18));
    let node = PlanBuilder::in_memory_scan("people", 2)
        .filter(predicate.clone())
        .with_resource_request(request.clone())
        .build();
    let psets = psets("people", &[3, 4]);

    let steps: Vec<_> = get_physical_plan(&node, &psets).unwrap().collect();
    assert_eq!(steps.len(), 2);
    for (step, expected) in steps.iter().zip(psets.get("people").unwrap().partitions()) {
        let ExecutionStep::Pipeable(builder) = step else {
            panic!("expected pipelined step, got {step}");
        };
        assert_eq!(builder.inputs(), std::slice::from_ref(expected));
        let [pipelined] = builder.instructions() else {
            panic!("expected one instruction, got {builder}");
        };
        assert_eq!(
            pipelined.instruction,
            Instruction::Filter {
                predicate: predicate.clone()
            }
        );
        assert_eq!(pipelined.resource_request, request);
    }
}

#[test]
fn test_local_limit_truncates_each_partition() {
    let node = PlanBuilder::in_memory_scan("t", 3).local_limit(4).build();
    assert_eq!(row_counts(&node, &psets("t", &[2, 9, 4])), vec![2, 4, 4]);
}

// ============================================================================
// Shuffles
// ============================================================================

proptest! {
    #[test]
    fn test_hash_repartition_always_yields_k_outputs(
        rows in proptest::collection::vec(0usize..50, 1..20),
    ) {
        let node = PlanBuilder::in_memory_scan("t", rows.len())
            .repartition(PartitionScheme::Hash, 4, vec![col("k")])
            .unwrap()
            .build();
        let plan = get_materializing_physical_plan(&node, &psets("t", &rows)).unwrap();
        let runner = SimulatedRunner::new();
        let outputs = runner.drive(plan).unwrap();

        prop_assert_eq!(outputs.len(), 4);
        prop_assert_eq!(
            outputs.iter().map(|r| r.metadata.num_rows).sum::<usize>(),
            rows.iter().sum::<usize>()
        );

        let log = runner.task_log();
        let fanouts = log.iter().filter(|t| t.ends_with("FanoutHash(4)")).count();
        let merges = log.iter().filter(|t| t.ends_with("ReduceMerge")).count();
        prop_assert_eq!(fanouts, rows.len());
        prop_assert_eq!(merges, 4);
    }
}

#[test]
fn test_hash_repartition_specific_input_counts() {
    for n in [1, 2, 17] {
        let node = PlanBuilder::in_memory_scan("t", n)
            .repartition(PartitionScheme::Hash, 4, vec![col("k")])
            .unwrap()
            .build();
        let rows = vec![3; n];
        assert_eq!(row_counts(&node, &psets("t", &rows)).len(), 4);
    }
}

#[test]
fn test_range_repartition_is_unsupported() {
    let node = PlanBuilder::in_memory_scan("t", 2)
        .repartition(PartitionScheme::Range, 4, vec![col("k")])
        .unwrap()
        .build();
    let err = get_physical_plan(&node, &psets("t", &[1, 1])).unwrap_err();
    assert!(err.is_unsupported_plan());
    assert!(err
        .to_string()
        .contains("Unimplemented partitioning scheme Range"));
}

#[test]
fn test_sort_produces_input_partition_count() {
    let node = PlanBuilder::in_memory_scan("t", 3)
        .sort(vec![SortKey::asc(col("a"))])
        .build();
    let counts = row_counts(&node, &psets("t", &[30, 3, 12]));
    assert_eq!(counts.len(), 3);
    assert_eq!(counts.iter().sum::<usize>(), 45);
}

#[test]
fn test_coalesce_merges_partitions() {
    let node = PlanBuilder::in_memory_scan("t", 5)
        .coalesce(2)
        .unwrap()
        .build();
    assert_eq!(row_counts(&node, &psets("t", &[1, 2, 3, 4, 5])), vec![6, 9]);
}

// ============================================================================
// Limits
// ============================================================================

#[test]
fn test_global_limit_stops_at_budget() {
    let node = PlanBuilder::in_memory_scan("t", 3).global_limit(7).build();
    let plan = get_materializing_physical_plan(&node, &psets("t", &[5, 5, 5])).unwrap();
    let runner = SimulatedRunner::new();
    let outputs = runner.drive(plan).unwrap();

    let rows: Vec<_> = outputs.iter().map(|r| r.metadata.num_rows).collect();
    assert_eq!(rows, vec![5, 2, 0]);

    // Only two upstream partitions were ever requested.
    let log = runner.task_log();
    let upstream = log
        .iter()
        .filter(|t| t.as_str() == "[1 in] -> LocalLimit(7)")
        .count();
    assert_eq!(upstream, 2);
}

// ============================================================================
// Joins
// ============================================================================

#[test]
fn test_join_sides_resolve_their_own_keys() {
    let psets = PartitionSets::new()
        .with_set("left", partitions(&[1, 2]))
        .with_set("right", partitions(&[10, 20]));
    let join = |how| {
        PlanBuilder::in_memory_scan("left", 2)
            .join(
                PlanBuilder::in_memory_scan("right", 2),
                vec![col("k")],
                vec![col("k")],
                how,
            )
            .build()
    };

    assert_eq!(row_counts(&join(JoinType::Left), &psets), vec![1, 2]);
    assert_eq!(row_counts(&join(JoinType::Right), &psets), vec![10, 20]);

    // A key registered for one side does not leak into the other.
    let left_only = PartitionSets::new().with_set("left", partitions(&[1, 2]));
    let err = get_physical_plan(&join(JoinType::Inner), &left_only).unwrap_err();
    assert!(matches!(err, TesseraError::PartitionSetNotFound { ref key } if key == "right"));
}

// ============================================================================
// Determinism and dispatch
// ============================================================================

#[test]
fn test_translation_is_repeatable() {
    let node = PlanBuilder::in_memory_scan("t", 4)
        .filter(col("x").gte(lit(0)))
        .repartition(PartitionScheme::Random, 3, vec![])
        .unwrap()
        .sort(vec![SortKey::desc(col("x"))])
        .coalesce(2)
        .unwrap()
        .limit(10)
        .build();
    let psets = psets("t", &[7, 3, 9, 1]);
    let translator =
        PhysicalPlanTranslator::with_config(PlannerConfig::default().with_random_fanout_seed(42));

    let run = || {
        let runner = SimulatedRunner::new();
        let plan = translator.translate_materializing(&node, &psets).unwrap();
        let outputs: Vec<_> = runner
            .drive(plan)
            .unwrap()
            .iter()
            .map(|r| r.metadata)
            .collect();
        (runner.task_log(), outputs)
    };

    let (first_log, first_outputs) = run();
    let (second_log, second_outputs) = run();
    assert_eq!(first_log, second_log);
    assert_eq!(first_outputs, second_outputs);
    assert_eq!(
        first_outputs.iter().map(|m| m.num_rows).sum::<usize>(),
        10
    );
}

#[test]
fn test_extension_is_unsupported() {
    let node = PlanBuilder::extension("my_udf", vec![PlanBuilder::in_memory_scan("t", 2)], 2)
        .unwrap()
        .build();
    let err = get_physical_plan(&node, &psets("t", &[1, 1])).unwrap_err();
    assert!(err.is_unsupported_plan());
    assert!(err.to_string().contains("Extension(my_udf)"));
}

// ============================================================================
// Arbitrary trees
// ============================================================================

/// One step stacked on top of the tree built so far.
#[derive(Debug, Clone)]
enum Stage {
    /// Filter, project, explode, aggregate, distinct or write, by index.
    Pipelined(usize),
    LocalLimit(usize),
    Limit(usize),
    Hash(usize),
    Random(usize),
    Sort,
    Coalesce(usize),
    Join,
}

fn stage() -> impl Strategy<Value = Stage> {
    prop_oneof![
        (0usize..6).prop_map(Stage::Pipelined),
        (0usize..20).prop_map(Stage::LocalLimit),
        (0usize..40).prop_map(Stage::Limit),
        (1usize..6).prop_map(Stage::Hash),
        (1usize..6).prop_map(Stage::Random),
        Just(Stage::Sort),
        (1usize..6).prop_map(Stage::Coalesce),
        Just(Stage::Join),
    ]
}

fn push_stage(builder: PlanBuilder, stage: &Stage) -> PlanBuilder {
    let n = builder.root().num_partitions();
    match *stage {
        Stage::Pipelined(0) => builder.filter(col("x").gte(lit(0))),
        Stage::Pipelined(1) => builder.project(vec![col("x"), col("k")]),
        Stage::Pipelined(2) => builder.explode(vec![col("tags")]),
        Stage::Pipelined(3) => builder.local_aggregate(vec![sum(col("x"))], vec![col("k")]),
        Stage::Pipelined(4) => builder.local_distinct(vec![col("k")]),
        Stage::Pipelined(_) => builder.write(OutputFileInfo::new("out", FileFormat::Parquet)),
        Stage::LocalLimit(limit) => builder.local_limit(limit),
        Stage::Limit(limit) => builder.limit(limit),
        Stage::Hash(k) => builder
            .repartition(PartitionScheme::Hash, k, vec![col("k")])
            .unwrap(),
        Stage::Random(k) => builder
            .repartition(PartitionScheme::Random, k, vec![])
            .unwrap(),
        Stage::Sort => builder.sort(vec![SortKey::desc(col("x"))]),
        Stage::Coalesce(to) if to < n => builder.coalesce(to).unwrap(),
        Stage::Coalesce(_) => builder,
        Stage::Join => {
            let right = PlanBuilder::in_memory_scan("right", 3)
                .repartition(PartitionScheme::Hash, n, vec![col("k")])
                .unwrap();
            builder.join(right, vec![col("k")], vec![col("k")], JoinType::Inner)
        }
    }
}

proptest! {
    #[test]
    fn test_supported_trees_translate_and_run_to_completion(
        rows in proptest::collection::vec(0usize..30, 1..6),
        from_files in any::<bool>(),
        stages in proptest::collection::vec(stage(), 0..6),
    ) {
        let files = rows
            .iter()
            .enumerate()
            .map(|(i, &n)| FileInfo::new(format!("part-{i}.csv")).with_num_rows(n))
            .collect();
        let psets = PartitionSets::new()
            .with_set("t", partitions(&rows))
            .with_set("right", partitions(&[4, 5, 6]))
            .with_set("listing", vec![SimulatedPartition::listing(files)]);
        let source = if from_files {
            PlanBuilder::files_scan(
                PlanBuilder::in_memory_scan("listing", 1),
                ScanInfo::new(FileFormat::Csv),
                rows.len(),
            )
        } else {
            PlanBuilder::in_memory_scan("t", rows.len())
        };
        let node = stages.iter().fold(source, push_stage).build();

        let plan = get_materializing_physical_plan(&node, &psets);
        prop_assert!(plan.is_ok(), "translation failed: {:?}", plan.as_ref().err());
        let outputs = SimulatedRunner::new().drive(plan.unwrap());
        prop_assert!(outputs.is_ok(), "run failed: {:?}", outputs.as_ref().err());
        prop_assert_eq!(outputs.unwrap().len(), node.num_partitions());
    }
}

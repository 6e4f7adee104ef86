//! End-to-end tests: translate a logical plan and run it on the local
//! scheduler with the simulated runner.

use std::sync::Arc;

use common_config::{SchedulerConfig, TesseraConfig};
use tessera_distributed::{LocalScheduler, PhysicalPlanTranslator};
use tessera_execution::testing::{SimulatedPartition, SimulatedRunner};
use tessera_execution::PartitionSets;
use tessera_logical::{
    col, lit, FileFormat, FileInfo, JoinType, PartitionScheme, PlanBuilder, ScanInfo, SortKey,
};

fn scheduler(
    runner: &Arc<SimulatedRunner>,
    max_inflight_tasks: usize,
) -> LocalScheduler<SimulatedPartition> {
    LocalScheduler::<SimulatedPartition>::new(runner.clone()).with_config(
        SchedulerConfig::default().with_max_inflight_tasks(max_inflight_tasks),
    )
}

#[tokio::test]
async fn test_files_to_limited_sorted_output() {
    let files = (0..4)
        .map(|i| {
            FileInfo::new(format!("part-{i}.parquet"))
                .with_num_rows(25)
                .with_size_bytes(200)
        })
        .collect();
    let psets = PartitionSets::new().with_set("listing", vec![SimulatedPartition::listing(files)]);
    let node = PlanBuilder::files_scan(
        PlanBuilder::in_memory_scan("listing", 1),
        ScanInfo::new(FileFormat::Parquet),
        4,
    )
    .filter(col("score").gte(lit(0)))
    .repartition(PartitionScheme::Hash, 3, vec![col("user")])
    .unwrap()
    .sort(vec![SortKey::asc(col("score"))])
    .coalesce(2)
    .unwrap()
    .limit(30)
    .build();

    let runner = Arc::new(SimulatedRunner::new());
    let plan = PhysicalPlanTranslator::new()
        .translate_materializing(&node, &psets)
        .unwrap();
    let outputs = scheduler(&runner, 4).run(plan).await.unwrap();

    let rows: Vec<_> = outputs.iter().map(|r| r.metadata.num_rows).collect();
    assert_eq!(rows, vec![30, 0]);

    let log = runner.task_log();
    assert_eq!(log.iter().filter(|t| t.contains("ReadFile")).count(), 4);
    assert_eq!(log.iter().filter(|t| t.ends_with("ReduceToQuantiles")).count(), 1);
}

#[tokio::test]
async fn test_global_limit_with_one_task_in_flight() {
    let psets = PartitionSets::new().with_set(
        "t",
        vec![
            SimulatedPartition::new(5),
            SimulatedPartition::new(5),
            SimulatedPartition::new(5),
        ],
    );
    let node = PlanBuilder::in_memory_scan("t", 3).global_limit(7).build();

    let runner = Arc::new(SimulatedRunner::new());
    let plan = PhysicalPlanTranslator::new()
        .translate_materializing(&node, &psets)
        .unwrap();
    let outputs = scheduler(&runner, 1).run(plan).await.unwrap();

    let rows: Vec<_> = outputs.iter().map(|r| r.metadata.num_rows).collect();
    assert_eq!(rows.iter().sum::<usize>(), 7);
    let upstream = runner
        .task_log()
        .iter()
        .filter(|t| t.as_str() == "[1 in] -> LocalLimit(7)")
        .count();
    assert_eq!(upstream, 2);
}

#[tokio::test]
async fn test_join_of_repartitioned_sides() {
    let psets = PartitionSets::new()
        .with_set("orders", (1..=4).map(SimulatedPartition::new).collect())
        .with_set("users", vec![SimulatedPartition::new(8)]);
    let orders = PlanBuilder::in_memory_scan("orders", 4)
        .repartition(PartitionScheme::Hash, 2, vec![col("user_id")])
        .unwrap();
    let users = PlanBuilder::in_memory_scan("users", 1)
        .repartition(PartitionScheme::Hash, 2, vec![col("id")])
        .unwrap();
    let node = orders
        .join(users, vec![col("user_id")], vec![col("id")], JoinType::Left)
        .build();

    let runner = Arc::new(SimulatedRunner::new());
    let plan = PhysicalPlanTranslator::new()
        .translate_materializing(&node, &psets)
        .unwrap();
    let outputs = scheduler(&runner, 8).run(plan).await.unwrap();

    assert_eq!(outputs.len(), 2);
    assert_eq!(outputs.iter().map(|r| r.metadata.num_rows).sum::<usize>(), 10);
}

#[test]
fn test_run_sync_with_config_from_json() {
    let config = TesseraConfig::from_json(
        r#"{"planner": {"sort_sample_size": 4}, "scheduler": {"max_inflight_tasks": 2}}"#,
    )
    .unwrap();
    let psets = PartitionSets::new().with_set(
        "t",
        (0..6).map(|i| SimulatedPartition::new(i * 3)).collect(),
    );
    let node = PlanBuilder::in_memory_scan("t", 6)
        .sort(vec![SortKey::desc(col("x"))])
        .build();

    let runner = Arc::new(SimulatedRunner::new());
    let plan = PhysicalPlanTranslator::with_config(config.planner)
        .translate_materializing(&node, &psets)
        .unwrap();
    let outputs = LocalScheduler::<SimulatedPartition>::new(runner.clone())
        .with_config(config.scheduler)
        .run_sync(plan)
        .unwrap();

    assert_eq!(outputs.len(), 6);
    assert_eq!(outputs.iter().map(|r| r.metadata.num_rows).sum::<usize>(), 45);
    assert!(runner
        .task_log()
        .iter()
        .filter(|t| t.ends_with("Sample"))
        .all(|t| t == "[1 in] -> Sample"));
}

//! Tests for the metrics module.
#![cfg(feature = "metrics")]

use anyhow::Result;
use ironfold::metrics::{
    ABORTS, COMBINES, CounterMetric, ELEMENTS, GaugeMetric, LEAVES, MetricsCollector, RUNS,
};
use ironfold::{FoldConfig, Runner, filter, fold_with, try_fold_with};
use serde_json::json;

fn add(a: u64, b: u64) -> u64 {
    a + b
}

#[test]
fn fold_records_leaves_and_combines() -> Result<()> {
    let metrics = MetricsCollector::new();
    let runner = Runner::new(FoldConfig::new().with_leaf_threshold(10))?.with_metrics(metrics.clone());
    let data: Vec<u64> = (0..100).collect();

    assert_eq!(fold_with(&runner, add, add, 0, &data)?, 4_950);

    let snapshot = metrics.snapshot();
    assert_eq!(snapshot[LEAVES], json!(16));
    assert_eq!(snapshot[COMBINES], json!(15));
    assert_eq!(snapshot[ELEMENTS], json!(100));
    assert_eq!(snapshot[RUNS], json!(1));
    assert_eq!(snapshot[ABORTS], json!(0));
    assert!(metrics.elapsed().is_some());
    Ok(())
}

#[test]
fn counters_accumulate_across_folds() -> Result<()> {
    let metrics = MetricsCollector::new();
    let runner = Runner::with_threshold(50)?.with_metrics(metrics.clone());
    let data: Vec<u64> = (0..100).collect();
    let evens = filter(|x: &u64| x % 2 == 0, &data);

    fold_with(&runner, add, add, 0, &data)?;
    fold_with(&runner, add, add, 0, &evens)?;

    let snapshot = metrics.snapshot();
    assert_eq!(snapshot[RUNS], json!(2));
    assert_eq!(snapshot[LEAVES], json!(4));
    // raw elements are counted whether or not a filter keeps them
    assert_eq!(snapshot[ELEMENTS], json!(200));
    Ok(())
}

#[test]
fn aborted_fold_counts_only_what_ran() -> Result<()> {
    let metrics = MetricsCollector::new();
    let runner = Runner::new(FoldConfig::new().with_leaf_threshold(4).sequential())?
        .with_metrics(metrics.clone());
    let data: Vec<u64> = (0..64).collect();

    let err = try_fold_with(
        &runner,
        |a: u64, x: u64| {
            if x == 2 {
                anyhow::bail!("stop at 2");
            }
            Ok(a + x)
        },
        |a: u64, b: u64| Ok(a + b),
        0,
        &data,
    )
    .unwrap_err();
    assert_eq!(err.to_string(), "stop at 2");

    // the first leaf reads 0, 1 and the failing 2; every other leaf is skipped
    let snapshot = metrics.snapshot();
    assert_eq!(snapshot[LEAVES], json!(1));
    assert_eq!(snapshot[ELEMENTS], json!(3));
    assert_eq!(snapshot[COMBINES], json!(0));
    assert_eq!(snapshot[RUNS], json!(0));
    assert_eq!(snapshot[ABORTS], json!(1));
    Ok(())
}

#[test]
fn empty_fold_records_nothing() -> Result<()> {
    let metrics = MetricsCollector::new();
    let runner = Runner::default().with_metrics(metrics.clone());
    let empty: Vec<u64> = Vec::new();

    assert_eq!(fold_with(&runner, add, add, 3, &empty)?, 3);
    assert!(metrics.snapshot().is_empty());
    Ok(())
}

#[test]
fn custom_metrics() {
    let collector = MetricsCollector::new();
    collector.register(Box::new(CounterMetric::with_value("batches", 5)));
    collector.register(Box::new(GaugeMetric::new("load", 0.5).with_description("worker load")));
    collector.increment_counter("batches", 2);

    let snapshot = collector.snapshot();
    assert_eq!(snapshot["batches"], json!(7));
    assert_eq!(snapshot["load"], json!(0.5));

    let out = collector.to_json();
    assert_eq!(out["load"]["description"], json!("worker load"));
    assert!(collector.to_string().contains("batches: 7"));
}

#[test]
fn set_counter_overwrites() {
    let collector = MetricsCollector::new();
    collector.set_counter("operations", 100);
    collector.set_counter("operations", 200);
    assert_eq!(collector.snapshot()["operations"], json!(200));
}

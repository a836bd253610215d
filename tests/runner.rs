use anyhow::Result;
use ironfold::partition::leaf_count;
use ironfold::testing::{Probe, expected_combines};
use ironfold::{ExecMode, FoldConfig, Runner, filter, fold_with, map};
use std::collections::HashSet;
use std::sync::Mutex;

fn add(a: u64, b: u64) -> u64 {
    a + b
}

#[test]
fn reducer_runs_once_per_element() -> Result<()> {
    let data: Vec<u64> = (0..1_000).collect();
    let probe = Probe::new();
    for threshold in [1, 3, 50, 1_000] {
        probe.reset();
        let runner = Runner::with_threshold(threshold)?;
        let total = fold_with(&runner, probe.reducer(add), probe.combiner(add), 0, &data)?;
        assert_eq!(total, 499_500);
        assert_eq!(probe.reduce_calls(), 1_000, "threshold {threshold}");
        assert_eq!(probe.combine_calls(), expected_combines(1_000, threshold));
    }
    probe.reset();
    assert_eq!((probe.reduce_calls(), probe.combine_calls()), (0, 0));
    Ok(())
}

#[test]
fn combines_once_per_join() -> Result<()> {
    let data: Vec<u64> = (0..100).collect();
    for threshold in [1, 2, 10, 49, 50, 99, 100] {
        let probe = Probe::new();
        let runner = Runner::with_threshold(threshold)?;
        fold_with(&runner, probe.reducer(add), probe.combiner(add), 0, &data)?;
        assert_eq!(probe.combine_calls(), expected_combines(100, threshold), "threshold {threshold}");
    }
    // 100 -> 50/50 -> 25/25 -> 12/13 -> 6/6, 6/7
    assert_eq!(expected_combines(100, 10), 15);
    Ok(())
}

#[test]
fn single_leaf_never_combines() -> Result<()> {
    let data: Vec<u64> = (0..50).collect();
    let probe = Probe::new();
    let total = fold_with(&Runner::default(), probe.reducer(add), probe.combiner(add), 0, &data)?;
    assert_eq!(total, 1_225);
    assert_eq!(probe.combine_calls(), 0);
    Ok(())
}

#[test]
fn filtered_elements_do_not_reach_the_reducer() -> Result<()> {
    let data: Vec<u64> = (0..100).collect();
    let probe = Probe::new();
    let runner = Runner::with_threshold(8)?;
    let evens = filter(|x: &u64| x % 2 == 0, &data);
    fold_with(&runner, probe.reducer(add), probe.combiner(add), 0, &evens)?;
    assert_eq!(probe.reduce_calls(), 50);
    // joins depend on raw length only
    assert_eq!(probe.combine_calls(), expected_combines(100, 8));
    Ok(())
}

#[test]
fn seed_starts_every_leaf_and_never_joins() -> Result<()> {
    let data: Vec<u64> = (0..100).collect();

    // One leaf: the seed is folded in exactly once.
    let runner = Runner::with_threshold(100)?;
    assert_eq!(fold_with(&runner, add, add, 100, &data)?, 5_050);

    // Many leaves: each starts from its own copy, joins add nothing.
    let runner = Runner::with_threshold(10)?;
    let leaves = leaf_count(100, 10).map_or(0, |n| n as u64);
    assert_eq!(fold_with(&runner, add, add, 1, &data)?, 4_950 + leaves);
    Ok(())
}

#[test]
fn collect_preserves_source_order() -> Result<()> {
    let data: Vec<u32> = (0..500).collect();
    let runner = Runner::with_threshold(1)?;
    let out = fold_with(
        &runner,
        |mut acc: Vec<u32>, x: u32| {
            acc.push(x);
            acc
        },
        |mut l: Vec<u32>, r: Vec<u32>| {
            l.extend(r);
            l
        },
        Vec::new(),
        &map(|x: u32| x * 3, &data),
    )?;
    assert_eq!(out, (0..500).map(|x| x * 3).collect::<Vec<_>>());
    Ok(())
}

#[test]
fn sequential_and_parallel_modes_agree() -> Result<()> {
    let data: Vec<i64> = (-300..300).collect();
    let t = map(|x: i64| x * x, filter(|x: &i64| x % 3 != 0, &data));
    let sum = |a: i64, b: i64| a + b;

    let seq = Runner::new(FoldConfig::new().with_leaf_threshold(7).sequential())?;
    let par = Runner::new(FoldConfig::new().with_leaf_threshold(7))?;
    assert_eq!(seq.config().mode, ExecMode::Sequential);
    assert_eq!(par.config().mode, ExecMode::Parallel);
    assert_eq!(fold_with(&seq, sum, sum, 0, &t)?, fold_with(&par, sum, sum, 0, &t)?);
    Ok(())
}

#[test]
fn dedicated_pool_runs_every_leaf() -> Result<()> {
    let data: Vec<u64> = (0..256).collect();
    let runner = Runner::new(FoldConfig::new().with_leaf_threshold(4).with_threads(3))?;
    let names = Mutex::new(HashSet::new());

    let total = fold_with(
        &runner,
        |a: u64, x: u64| {
            let name = std::thread::current().name().unwrap_or("").to_string();
            names.lock().unwrap().insert(name);
            a + x
        },
        add,
        0,
        &data,
    )?;
    assert_eq!(total, 32_640);

    let names = names.into_inner().unwrap();
    assert!(!names.is_empty());
    assert!(names.iter().all(|n| n.starts_with("ironfold-")), "leaves ran on {names:?}");
    Ok(())
}

#[test]
fn runner_can_be_reused() -> Result<()> {
    let runner = Runner::with_threshold(16)?;
    let a: Vec<u64> = (0..10).collect();
    let b: Vec<u64> = (0..1_000).collect();
    assert_eq!(fold_with(&runner, add, add, 0, &a)?, 45);
    assert_eq!(fold_with(&runner, add, add, 0, &b)?, 499_500);
    assert_eq!(runner.leaf_threshold(), 16);
    Ok(())
}

#[test]
fn fold_directly_on_runner() -> Result<()> {
    let data: Vec<u64> = (1..=10).collect();
    let runner = Runner::with_threshold(2)?;
    let product = runner.fold(&data[..], |a: u64, x: u64| a * x, |a: u64, b: u64| a * b, 1)?;
    assert_eq!(product, 3_628_800);
    Ok(())
}

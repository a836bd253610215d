//! Helpers for testing folds.
//!
//! - [`Probe`] wraps reducing and combining functions and counts how often they run.
//! - [`assert_fold_equivalent`] checks that a fork-join fold agrees with the
//!   sequential fold for several thresholds in both execution modes.
//! - [`expected_combines`] gives the number of join-point combines for a source size.
//!
//! ```
//! use ironfold::testing::{Probe, expected_combines};
//! use ironfold::{Runner, fold_with};
//!
//! # fn main() -> anyhow::Result<()> {
//! let probe = Probe::new();
//! let data: Vec<u64> = (0..1000).collect();
//! let runner = Runner::with_threshold(50)?;
//! let total = fold_with(
//!     &runner,
//!     probe.reducer(|a: u64, x: u64| a + x),
//!     probe.combiner(|a: u64, b: u64| a + b),
//!     0,
//!     &data,
//! )?;
//! assert_eq!(total, 499_500);
//! assert_eq!(probe.reduce_calls(), 1000);
//! assert_eq!(probe.combine_calls(), expected_combines(1000, 50));
//! # Ok(())
//! # }
//! ```

use crate::config::{ExecMode, FoldConfig};
use crate::partition::leaf_count;
use crate::runner::Runner;
use crate::source::Foldable;
use std::fmt::Debug;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Invocation counters shared by every function a probe wraps.
#[derive(Clone, Debug, Default)]
pub struct Probe {
    reduces: Arc<AtomicUsize>,
    combines: Arc<AtomicUsize>,
}

impl Probe {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap `reduce` so every call is counted.
    pub fn reducer<A, E, R>(&self, reduce: R) -> impl Fn(A, E) -> A + Send + Sync + Clone + use<A, E, R>
    where
        R: Fn(A, E) -> A + Send + Sync + Clone,
    {
        let calls = Arc::clone(&self.reduces);
        move |acc, e| {
            calls.fetch_add(1, Ordering::Relaxed);
            reduce(acc, e)
        }
    }

    /// Wrap `combine` so every call is counted.
    pub fn combiner<A, C>(&self, combine: C) -> impl Fn(A, A) -> A + Send + Sync + Clone + use<A, C>
    where
        C: Fn(A, A) -> A + Send + Sync + Clone,
    {
        let calls = Arc::clone(&self.combines);
        move |a, b| {
            calls.fetch_add(1, Ordering::Relaxed);
            combine(a, b)
        }
    }

    #[must_use]
    pub fn reduce_calls(&self) -> usize {
        self.reduces.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn combine_calls(&self) -> usize {
        self.combines.load(Ordering::Relaxed)
    }

    pub fn reset(&self) {
        self.reduces.store(0, Ordering::Relaxed);
        self.combines.store(0, Ordering::Relaxed);
    }
}

/// Combine calls a fold of `len` elements makes with `threshold`: one fewer than
/// the number of leaves, and none for an empty source.
///
/// # Panics
///
/// Panics if `threshold` is zero.
#[must_use]
pub fn expected_combines(len: usize, threshold: usize) -> usize {
    if len == 0 {
        return 0;
    }
    leaf_count(len, threshold).expect("threshold must be greater than zero") - 1
}

/// Assert that folding `source` in parallel equals its sequential fold for every
/// threshold in `thresholds`, in both execution modes.
///
/// # Panics
///
/// Panics if any fold fails or disagrees with the sequential result.
pub fn assert_fold_equivalent<E, A, R, C, S>(
    source: &S,
    reduce: R,
    combine: C,
    seed: A,
    thresholds: &[usize],
) where
    S: Foldable<E> + ?Sized,
    A: Clone + Send + Sync + PartialEq + Debug,
    R: Fn(A, E) -> A + Send + Sync + Clone,
    C: Fn(A, A) -> A + Sync + Clone,
{
    let expected = source.sequential_fold(reduce.clone(), seed.clone());
    let len = source.source_len();
    for &threshold in thresholds {
        for mode in [ExecMode::Sequential, ExecMode::Parallel] {
            let config = FoldConfig { leaf_threshold: threshold, mode, threads: None };
            let runner = Runner::new(config)
                .unwrap_or_else(|e| panic!("threshold {threshold}: invalid config: {e}"));
            let actual = source
                .parallel_fold(&runner, reduce.clone(), combine.clone(), seed.clone())
                .unwrap_or_else(|e| panic!("threshold {threshold}, {mode:?}: fold failed: {e}"));
            assert_eq!(
                actual, expected,
                "fold mismatch over {len} elements with threshold {threshold} in {mode:?} mode:\n  Expected: {expected:?}\n  Actual: {actual:?}"
            );
        }
    }
}

//! Top-level fold entry points.
//!
//! `fold(reduce, combine, seed, source)` computes what a sequential left fold
//! of `source` with `reduce` and `seed` would, by folding leaves independently
//! and merging them with `combine`. `source` is anything [`Foldable`]: a slice,
//! a `Vec`, or a [`Transformed`](crate::source::Transformed) built with
//! [`map`](crate::source::map) / [`filter`](crate::source::filter).
//!
//! The caller guarantees that `combine` is associative and that `seed` is an
//! identity for it. Neither is checked; breaking them gives results that depend
//! on the leaf threshold.

use crate::combiners::Combiner;
use crate::runner::Runner;
use crate::source::Foldable;
use anyhow::Result;

/// Fold `source` with the default runner (threshold 50, global rayon pool).
///
/// ```
/// use ironfold::{fold, map};
///
/// let data: Vec<u64> = (0..100).collect();
/// let add = |a: u64, x: u64| a + x;
/// assert_eq!(fold(add, add, 0, &data)?, 4950);
/// assert_eq!(fold(add, add, 0, &map(|x: u64| x + 1, &data))?, 5050);
/// # Ok::<_, anyhow::Error>(())
/// ```
///
/// # Errors
///
/// Fails if a user function panics.
pub fn fold<E, A, R, C, S>(reduce: R, combine: C, seed: A, source: &S) -> Result<A>
where
    S: Foldable<E> + ?Sized,
    A: Clone + Send + Sync,
    R: Fn(A, E) -> A + Send + Sync + Clone,
    C: Fn(A, A) -> A + Sync,
{
    fold_with(&Runner::default(), reduce, combine, seed, source)
}

/// Fold `source` under a specific [`Runner`].
///
/// # Errors
///
/// Fails if a user function panics.
pub fn fold_with<E, A, R, C, S>(
    runner: &Runner,
    reduce: R,
    combine: C,
    seed: A,
    source: &S,
) -> Result<A>
where
    S: Foldable<E> + ?Sized,
    A: Clone + Send + Sync,
    R: Fn(A, E) -> A + Send + Sync + Clone,
    C: Fn(A, A) -> A + Sync,
{
    source.parallel_fold(runner, reduce, combine, seed)
}

/// Fold with fallible user functions using the default runner.
///
/// # Errors
///
/// Returns the first error raised by `reduce` or `combine`; no partial result
/// is produced.
pub fn try_fold<E, A, R, C, S>(reduce: R, combine: C, seed: A, source: &S) -> Result<A>
where
    S: Foldable<E> + ?Sized,
    A: Clone + Send + Sync,
    R: Fn(A, E) -> Result<A> + Send + Sync + Clone,
    C: Fn(A, A) -> Result<A> + Sync,
{
    try_fold_with(&Runner::default(), reduce, combine, seed, source)
}

/// # Errors
///
/// Returns the first error raised by `reduce` or `combine`.
pub fn try_fold_with<E, A, R, C, S>(
    runner: &Runner,
    reduce: R,
    combine: C,
    seed: A,
    source: &S,
) -> Result<A>
where
    S: Foldable<E> + ?Sized,
    A: Clone + Send + Sync,
    R: Fn(A, E) -> Result<A> + Send + Sync + Clone,
    C: Fn(A, A) -> Result<A> + Sync,
{
    source.try_parallel_fold(runner, reduce, combine, seed)
}

/// Fold `source` with a packaged [`Combiner`].
///
/// ```
/// use ironfold::combiners::{Collect, Sum};
/// use ironfold::{Runner, filter, fold_with_combiner};
///
/// let data: Vec<u32> = (0..10).collect();
/// let runner = Runner::with_threshold(3)?;
/// let odds = filter(|x: &u32| x % 2 == 1, &data);
/// assert_eq!(fold_with_combiner(&runner, &Sum::new(), &odds)?, 25);
/// assert_eq!(fold_with_combiner(&runner, &Collect::new(), &odds)?, vec![1, 3, 5, 7, 9]);
/// # Ok::<_, anyhow::Error>(())
/// ```
///
/// # Errors
///
/// Fails if the combiner panics.
pub fn fold_with_combiner<E, A, K, S>(runner: &Runner, combiner: &K, source: &S) -> Result<A>
where
    S: Foldable<E> + ?Sized,
    A: Clone + Send + Sync,
    K: Combiner<E, A>,
{
    source.parallel_fold(
        runner,
        |acc, e| combiner.reduce(acc, e),
        |a, b| combiner.combine(a, b),
        combiner.seed(),
    )
}

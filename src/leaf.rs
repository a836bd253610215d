//! Sequential folding of a single partition.
//!
//! This is the only place the seed enters a fold and the only place the
//! reducing function runs. Elements are visited strictly left to right.

use crate::partition::Partition;
use anyhow::Result;
use std::sync::atomic::{AtomicBool, Ordering};

/// Fold `source[part]` left to right starting from `seed`.
///
/// # Panics
///
/// Panics if `part` is not within `source`.
#[inline]
pub fn fold_leaf<E, A, R>(reduce: &R, seed: A, part: Partition, source: &[E]) -> A
where
    E: Clone,
    R: Fn(A, E) -> A,
{
    source[part.range()]
        .iter()
        .cloned()
        .fold(seed, |acc, e| reduce(acc, e))
}

/// Fallible leaf fold that gives up early once `stop` is raised.
///
/// Returns `Ok(None)` when the leaf was abandoned because of `stop`; the caller
/// is expected to surface whichever failure raised it.
///
/// # Errors
///
/// Returns the first error produced by `reduce`.
///
/// # Panics
///
/// Panics if `part` is not within `source`.
pub fn try_fold_leaf<E, A, R>(
    reduce: &R,
    seed: A,
    part: Partition,
    source: &[E],
    stop: &AtomicBool,
) -> Result<Option<A>>
where
    E: Clone,
    R: Fn(A, E) -> Result<A>,
{
    let mut acc = seed;
    for e in &source[part.range()] {
        if stop.load(Ordering::Relaxed) {
            return Ok(None);
        }
        acc = reduce(acc, e.clone())?;
    }
    Ok(Some(acc))
}

//! Ready-made combiners: Sum, Count, Min, Max, Collect
//!
//! Each combiner packages a seed, a reducing function and an associative
//! combining function whose identity is the seed. Pass one to
//! [`fold_with_combiner`](crate::fold::fold_with_combiner).

use std::marker::PhantomData;
use std::ops::Add;

/// A packaged `(seed, reduce, combine)` triple.
///
/// `combine` must be associative and `seed` must be an identity for it, so that
/// independently seeded leaves merge into the same value a sequential fold
/// would produce.
pub trait Combiner<E, A>: Send + Sync {
    fn seed(&self) -> A;
    fn reduce(&self, acc: A, e: E) -> A;
    fn combine(&self, left: A, right: A) -> A;
}

/* ===================== Sum<T> ===================== */

/// Sum of all elements.
///
/// - Accumulator: `T`
/// - Output: `T`
///
/// Requires `T: Add<Output=T> + Default`.
#[derive(Clone, Copy, Debug, Default)]
pub struct Sum<T>(PhantomData<fn() -> T>);
impl<T> Sum<T> {
    /// Convenience constructor (same as `Default`).
    #[must_use]
    pub const fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Combiner<T, T> for Sum<T>
where
    T: Add<Output = T> + Default,
{
    fn seed(&self) -> T {
        T::default()
    }

    fn reduce(&self, acc: T, e: T) -> T {
        acc + e
    }

    fn combine(&self, left: T, right: T) -> T {
        left + right
    }
}

/* ===================== Count ===================== */

/// Number of elements that reach the reducer.
///
/// - Accumulator: `u64`
/// - Output: `u64`
#[derive(Clone, Copy, Debug, Default)]
pub struct Count;

impl<E> Combiner<E, u64> for Count {
    fn seed(&self) -> u64 {
        0
    }

    fn reduce(&self, acc: u64, _e: E) -> u64 {
        acc + 1
    }

    fn combine(&self, left: u64, right: u64) -> u64 {
        left + right
    }
}

/* ===================== Min<T> ===================== */

/// Smallest element (requires `Ord`).
///
/// - Accumulator: `Option<T>`
/// - Output: `Option<T>`, `None` when nothing reached the reducer
#[derive(Clone, Copy, Debug, Default)]
pub struct Min<T>(PhantomData<fn() -> T>);
impl<T> Min<T> {
    /// Convenience constructor (same as `Default`).
    #[must_use]
    pub const fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T: Ord> Combiner<T, Option<T>> for Min<T> {
    fn seed(&self) -> Option<T> {
        None
    }

    fn reduce(&self, acc: Option<T>, e: T) -> Option<T> {
        match acc {
            Some(cur) if cur <= e => Some(cur),
            _ => Some(e),
        }
    }

    fn combine(&self, left: Option<T>, right: Option<T>) -> Option<T> {
        match (left, right) {
            (Some(a), Some(b)) => Some(if b < a { b } else { a }),
            (a, None) => a,
            (None, b) => b,
        }
    }
}

/* ===================== Max<T> ===================== */

/// Largest element (requires `Ord`).
///
/// - Accumulator: `Option<T>`
/// - Output: `Option<T>`, `None` when nothing reached the reducer
#[derive(Clone, Copy, Debug, Default)]
pub struct Max<T>(PhantomData<fn() -> T>);
impl<T> Max<T> {
    /// Convenience constructor (same as `Default`).
    #[must_use]
    pub const fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T: Ord> Combiner<T, Option<T>> for Max<T> {
    fn seed(&self) -> Option<T> {
        None
    }

    fn reduce(&self, acc: Option<T>, e: T) -> Option<T> {
        match acc {
            Some(cur) if cur >= e => Some(cur),
            _ => Some(e),
        }
    }

    fn combine(&self, left: Option<T>, right: Option<T>) -> Option<T> {
        match (left, right) {
            (Some(a), Some(b)) => Some(if b > a { b } else { a }),
            (a, None) => a,
            (None, b) => b,
        }
    }
}

/* ===================== Collect<T> ===================== */

/// Gathers surviving elements into a `Vec`, in source order.
///
/// - Accumulator: `Vec<T>`
/// - Output: `Vec<T>`
///
/// Joins always put the left half first, so order holds in parallel mode too.
#[derive(Clone, Copy, Debug, Default)]
pub struct Collect<T>(PhantomData<fn() -> T>);
impl<T> Collect<T> {
    /// Convenience constructor (same as `Default`).
    #[must_use]
    pub const fn new() -> Self {
        Self(PhantomData)
    }
}

impl<T> Combiner<T, Vec<T>> for Collect<T> {
    fn seed(&self) -> Vec<T> {
        Vec::new()
    }

    fn reduce(&self, mut acc: Vec<T>, e: T) -> Vec<T> {
        acc.push(e);
        acc
    }

    fn combine(&self, mut left: Vec<T>, right: Vec<T>) -> Vec<T> {
        left.extend(right);
        left
    }
}

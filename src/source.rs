//! Foldable sources: raw slices and slices seen through a stage pipeline.
//!
//! [`Foldable`] is the one interface the fold entry points talk to. It has two
//! implementors: a plain slice, which is folded as is, and [`Transformed`], which
//! fuses its [`Pipeline`] into the caller's reducing function first. The runner
//! never learns which of the two it is folding.
//!
//! Building a `Transformed` never copies or touches the underlying slice; it
//! only records stages.
//!
//! ```
//! use ironfold::source::{Foldable, filter, map};
//!
//! let data: Vec<u64> = (0..100).collect();
//! let evens_plus_one = map(|x: u64| x + 1, filter(|x: &u64| x % 2 == 0, &data));
//! assert_eq!(evens_plus_one.sequential_fold(|a: u64, x: u64| a + x, 0), 2500);
//! ```

use crate::leaf::fold_leaf;
use crate::partition::Partition;
use crate::runner::Runner;
use crate::stage::{Pipeline, Stage};
use anyhow::Result;
use std::fmt::{Debug, Formatter, Result as FormatResult};

/// Something that can be folded sequentially or with fork-join parallelism.
pub trait Foldable<E> {
    /// Number of raw elements a fold reads.
    fn source_len(&self) -> usize;

    /// Left fold over every element on the calling thread.
    fn sequential_fold<A, R>(&self, reduce: R, seed: A) -> A
    where
        R: Fn(A, E) -> A + Send + Sync + Clone;

    /// Fallible left fold; stops at the first error.
    ///
    /// # Errors
    ///
    /// Returns the first error produced by `reduce`.
    fn try_sequential_fold<A, R>(&self, reduce: R, seed: A) -> Result<A>
    where
        R: Fn(A, E) -> Result<A> + Send + Sync + Clone;

    /// Fork-join fold driven by `runner`.
    ///
    /// # Errors
    ///
    /// Fails if a user function panics.
    fn parallel_fold<A, R, C>(&self, runner: &Runner, reduce: R, combine: C, seed: A) -> Result<A>
    where
        A: Clone + Send + Sync,
        R: Fn(A, E) -> A + Send + Sync + Clone,
        C: Fn(A, A) -> A + Sync;

    /// Fork-join fold with fallible user functions.
    ///
    /// # Errors
    ///
    /// Returns the first user error, or a fault if a user function panics.
    fn try_parallel_fold<A, R, C>(
        &self,
        runner: &Runner,
        reduce: R,
        combine: C,
        seed: A,
    ) -> Result<A>
    where
        A: Clone + Send + Sync,
        R: Fn(A, E) -> Result<A> + Send + Sync + Clone,
        C: Fn(A, A) -> Result<A> + Sync;
}

impl<E> Foldable<E> for [E]
where
    E: Clone + Send + Sync,
{
    fn source_len(&self) -> usize {
        self.len()
    }

    fn sequential_fold<A, R>(&self, reduce: R, seed: A) -> A
    where
        R: Fn(A, E) -> A + Send + Sync + Clone,
    {
        fold_leaf(&reduce, seed, Partition::full(self.len()), self)
    }

    fn try_sequential_fold<A, R>(&self, reduce: R, seed: A) -> Result<A>
    where
        R: Fn(A, E) -> Result<A> + Send + Sync + Clone,
    {
        self.iter().cloned().try_fold(seed, |acc, e| reduce(acc, e))
    }

    fn parallel_fold<A, R, C>(&self, runner: &Runner, reduce: R, combine: C, seed: A) -> Result<A>
    where
        A: Clone + Send + Sync,
        R: Fn(A, E) -> A + Send + Sync + Clone,
        C: Fn(A, A) -> A + Sync,
    {
        runner.fold(self, reduce, combine, seed)
    }

    fn try_parallel_fold<A, R, C>(
        &self,
        runner: &Runner,
        reduce: R,
        combine: C,
        seed: A,
    ) -> Result<A>
    where
        A: Clone + Send + Sync,
        R: Fn(A, E) -> Result<A> + Send + Sync + Clone,
        C: Fn(A, A) -> Result<A> + Sync,
    {
        runner.try_fold(self, reduce, combine, seed)
    }
}

impl<E> Foldable<E> for Vec<E>
where
    E: Clone + Send + Sync,
{
    fn source_len(&self) -> usize {
        self.len()
    }

    fn sequential_fold<A, R>(&self, reduce: R, seed: A) -> A
    where
        R: Fn(A, E) -> A + Send + Sync + Clone,
    {
        self.as_slice().sequential_fold(reduce, seed)
    }

    fn try_sequential_fold<A, R>(&self, reduce: R, seed: A) -> Result<A>
    where
        R: Fn(A, E) -> Result<A> + Send + Sync + Clone,
    {
        self.as_slice().try_sequential_fold(reduce, seed)
    }

    fn parallel_fold<A, R, C>(&self, runner: &Runner, reduce: R, combine: C, seed: A) -> Result<A>
    where
        A: Clone + Send + Sync,
        R: Fn(A, E) -> A + Send + Sync + Clone,
        C: Fn(A, A) -> A + Sync,
    {
        self.as_slice().parallel_fold(runner, reduce, combine, seed)
    }

    fn try_parallel_fold<A, R, C>(
        &self,
        runner: &Runner,
        reduce: R,
        combine: C,
        seed: A,
    ) -> Result<A>
    where
        A: Clone + Send + Sync,
        R: Fn(A, E) -> Result<A> + Send + Sync + Clone,
        C: Fn(A, A) -> Result<A> + Sync,
    {
        self.as_slice().try_parallel_fold(runner, reduce, combine, seed)
    }
}

/// A borrowed slice paired with the stages to apply while folding it.
pub struct Transformed<'a, E> {
    source: &'a [E],
    pipeline: Pipeline<E>,
}

impl<E> Clone for Transformed<'_, E> {
    fn clone(&self) -> Self {
        Self { source: self.source, pipeline: self.pipeline.clone() }
    }
}

impl<E> Debug for Transformed<'_, E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FormatResult {
        f.debug_struct("Transformed")
            .field("len", &self.source.len())
            .field("pipeline", &self.pipeline)
            .finish()
    }
}

impl<'a, E> Transformed<'a, E> {
    #[must_use]
    pub const fn new(source: &'a [E], pipeline: Pipeline<E>) -> Self {
        Self { source, pipeline }
    }

    #[must_use]
    pub const fn source(&self) -> &'a [E] {
        self.source
    }

    #[must_use]
    pub const fn pipeline(&self) -> &Pipeline<E> {
        &self.pipeline
    }

    /// Append a map stage.
    #[must_use]
    pub fn map<F>(mut self, f: F) -> Self
    where
        F: Fn(E) -> E + Send + Sync + 'static,
    {
        self.pipeline.push(Stage::map(f));
        self
    }

    /// Append a filter stage.
    #[must_use]
    pub fn filter<P>(mut self, p: P) -> Self
    where
        P: Fn(&E) -> bool + Send + Sync + 'static,
    {
        self.pipeline.push(Stage::filter(p));
        self
    }

    #[must_use]
    pub fn stage(mut self, stage: Stage<E>) -> Self {
        self.pipeline.push(stage);
        self
    }

    /// Append all stages of `pipeline` after the current ones.
    #[must_use]
    pub fn then(mut self, pipeline: Pipeline<E>) -> Self {
        self.pipeline = self.pipeline.then(pipeline);
        self
    }
}

impl<E> Foldable<E> for Transformed<'_, E>
where
    E: Clone + Send + Sync,
{
    fn source_len(&self) -> usize {
        self.source.len()
    }

    fn sequential_fold<A, R>(&self, reduce: R, seed: A) -> A
    where
        R: Fn(A, E) -> A + Send + Sync + Clone,
    {
        let fused = self.pipeline.fuse(reduce);
        fold_leaf(&fused, seed, Partition::full(self.source.len()), self.source)
    }

    fn try_sequential_fold<A, R>(&self, reduce: R, seed: A) -> Result<A>
    where
        R: Fn(A, E) -> Result<A> + Send + Sync + Clone,
    {
        let fused = self.pipeline.try_fuse(reduce);
        self.source.iter().cloned().try_fold(seed, |acc, e| fused(acc, e))
    }

    fn parallel_fold<A, R, C>(&self, runner: &Runner, reduce: R, combine: C, seed: A) -> Result<A>
    where
        A: Clone + Send + Sync,
        R: Fn(A, E) -> A + Send + Sync + Clone,
        C: Fn(A, A) -> A + Sync,
    {
        runner.fold(self.source, self.pipeline.fuse(reduce), combine, seed)
    }

    fn try_parallel_fold<A, R, C>(
        &self,
        runner: &Runner,
        reduce: R,
        combine: C,
        seed: A,
    ) -> Result<A>
    where
        A: Clone + Send + Sync,
        R: Fn(A, E) -> Result<A> + Send + Sync + Clone,
        C: Fn(A, A) -> Result<A> + Sync,
    {
        runner.try_fold(self.source, self.pipeline.try_fuse(reduce), combine, seed)
    }
}

/// Conversion into a [`Transformed`] so stages can be appended.
///
/// Raw slices start with the identity pipeline; an existing `Transformed` keeps
/// its stages.
pub trait IntoTransformed<'a, E> {
    fn into_transformed(self) -> Transformed<'a, E>;
}

impl<'a, E> IntoTransformed<'a, E> for &'a [E] {
    fn into_transformed(self) -> Transformed<'a, E> {
        Transformed::new(self, Pipeline::new())
    }
}

impl<'a, E> IntoTransformed<'a, E> for &'a Vec<E> {
    fn into_transformed(self) -> Transformed<'a, E> {
        Transformed::new(self.as_slice(), Pipeline::new())
    }
}

impl<'a, E, const N: usize> IntoTransformed<'a, E> for &'a [E; N] {
    fn into_transformed(self) -> Transformed<'a, E> {
        Transformed::new(self.as_slice(), Pipeline::new())
    }
}

impl<'a, E> IntoTransformed<'a, E> for Transformed<'a, E> {
    fn into_transformed(self) -> Transformed<'a, E> {
        self
    }
}

/// Append `Map(f)` to `source`'s pipeline.
pub fn map<'a, E, F, S>(f: F, source: S) -> Transformed<'a, E>
where
    S: IntoTransformed<'a, E>,
    F: Fn(E) -> E + Send + Sync + 'static,
{
    source.into_transformed().map(f)
}

/// Append `Filter(p)` to `source`'s pipeline.
pub fn filter<'a, E, P, S>(p: P, source: S) -> Transformed<'a, E>
where
    S: IntoTransformed<'a, E>,
    P: Fn(&E) -> bool + Send + Sync + 'static,
{
    source.into_transformed().filter(p)
}

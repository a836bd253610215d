//! Element-wise stages and their fusion into a single reducing function.
//!
//! A [`Pipeline`] is an ordered list of [`Stage`]s. Nothing runs when stages are
//! added; instead [`Pipeline::fuse`] compiles the stages together with a base
//! reducing function into one `Fn(A, E) -> A`. Each leaf then makes a single pass
//! over its range, and no intermediate collection is ever built.
//!
//! ## Ordering
//!
//! Stages run in **declaration order** against each element. The first declared
//! stage sees the raw element; each later stage sees whatever the earlier ones
//! produced. A failing filter returns the accumulator unchanged and skips every
//! later stage and the base reducer for that element.
//!
//! Order is observable. Over `0..100`:
//!
//! ```
//! use ironfold::stage::{Pipeline, Stage};
//!
//! let even_then_inc = Pipeline::new()
//!     .with(Stage::filter(|x: &u64| x % 2 == 0))
//!     .with(Stage::map(|x: u64| x + 1));
//! let inc_then_even = Pipeline::new()
//!     .with(Stage::map(|x: u64| x + 1))
//!     .with(Stage::filter(|x: &u64| x % 2 == 0));
//!
//! let a = even_then_inc.fuse(|acc: u64, x: u64| acc + x);
//! let b = inc_then_even.fuse(|acc: u64, x: u64| acc + x);
//! assert_eq!((0..100u64).fold(0, |acc, x| a(acc, x)), 2500);
//! assert_eq!((0..100u64).fold(0, |acc, x| b(acc, x)), 2550);
//! ```
//!
//! Callers that need to filter on raw values declare the filter first.

use anyhow::Result;
use std::fmt::{Debug, Display, Formatter, Result as FormatResult};
use std::sync::Arc;

/// Shared element transform.
pub type MapFn<E> = Arc<dyn Fn(E) -> E + Send + Sync>;
/// Shared element predicate.
pub type PredFn<E> = Arc<dyn Fn(&E) -> bool + Send + Sync>;

/// Discriminant of a [`Stage`], used for inspection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StageKind {
    Map,
    Filter,
}

impl Display for StageKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FormatResult {
        match self {
            Self::Map => f.write_str("map"),
            Self::Filter => f.write_str("filter"),
        }
    }
}

/// One element-wise transformation step.
pub enum Stage<E> {
    /// Replace the element with `f(element)`.
    Map { f: MapFn<E>, label: Option<String> },
    /// Drop the element unless `p(&element)` holds.
    Filter { p: PredFn<E>, label: Option<String> },
}

impl<E> Clone for Stage<E> {
    fn clone(&self) -> Self {
        match self {
            Self::Map { f, label } => Self::Map { f: Arc::clone(f), label: label.clone() },
            Self::Filter { p, label } => Self::Filter { p: Arc::clone(p), label: label.clone() },
        }
    }
}

impl<E> Stage<E> {
    pub fn map<F>(f: F) -> Self
    where
        F: Fn(E) -> E + Send + Sync + 'static,
    {
        Self::Map { f: Arc::new(f), label: None }
    }

    pub fn filter<P>(p: P) -> Self
    where
        P: Fn(&E) -> bool + Send + Sync + 'static,
    {
        Self::Filter { p: Arc::new(p), label: None }
    }

    /// A map stage that shows `label` when the pipeline is displayed.
    pub fn map_named<F>(label: impl Into<String>, f: F) -> Self
    where
        F: Fn(E) -> E + Send + Sync + 'static,
    {
        Self::Map { f: Arc::new(f), label: Some(label.into()) }
    }

    /// A filter stage that shows `label` when the pipeline is displayed.
    pub fn filter_named<P>(label: impl Into<String>, p: P) -> Self
    where
        P: Fn(&E) -> bool + Send + Sync + 'static,
    {
        Self::Filter { p: Arc::new(p), label: Some(label.into()) }
    }

    #[must_use]
    pub const fn kind(&self) -> StageKind {
        match self {
            Self::Map { .. } => StageKind::Map,
            Self::Filter { .. } => StageKind::Filter,
        }
    }

    #[must_use]
    pub fn label(&self) -> Option<&str> {
        match self {
            Self::Map { label, .. } | Self::Filter { label, .. } => label.as_deref(),
        }
    }
}

impl<E> Debug for Stage<E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FormatResult {
        f.debug_struct("Stage")
            .field("kind", &self.kind())
            .field("label", &self.label())
            .finish()
    }
}

impl<E> Display for Stage<E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FormatResult {
        match self.label() {
            Some(l) => write!(f, "{}({l})", self.kind()),
            None => write!(f, "{}", self.kind()),
        }
    }
}

/// Run `e` through `stages` in declaration order.
///
/// Returns `None` as soon as a filter rejects the value.
#[inline]
fn run_stages<E>(stages: &[Stage<E>], mut e: E) -> Option<E> {
    for stage in stages {
        match stage {
            Stage::Map { f, .. } => e = f(e),
            Stage::Filter { p, .. } => {
                if !p(&e) {
                    return None;
                }
            }
        }
    }
    Some(e)
}

/// An ordered list of stages.
pub struct Pipeline<E> {
    stages: Vec<Stage<E>>,
}

impl<E> Default for Pipeline<E> {
    fn default() -> Self {
        Self { stages: Vec::new() }
    }
}

impl<E> Clone for Pipeline<E> {
    fn clone(&self) -> Self {
        Self { stages: self.stages.clone() }
    }
}

impl<E> Pipeline<E> {
    /// The identity pipeline.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a stage after the existing ones.
    pub fn push(&mut self, stage: Stage<E>) {
        self.stages.push(stage);
    }

    #[must_use]
    pub fn with(mut self, stage: Stage<E>) -> Self {
        self.push(stage);
        self
    }

    /// Append every stage of `other`, keeping its order.
    #[must_use]
    pub fn then(mut self, other: Self) -> Self {
        self.stages.extend(other.stages);
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    #[must_use]
    pub fn stages(&self) -> &[Stage<E>] {
        &self.stages
    }

    #[must_use]
    pub fn kinds(&self) -> Vec<StageKind> {
        self.stages.iter().map(Stage::kind).collect()
    }

    /// Push a single element through the stages outside of any fold.
    pub fn apply(&self, e: E) -> Option<E> {
        run_stages(&self.stages, e)
    }

    /// Compile the stages and `reduce` into one reducing function.
    ///
    /// The result is an ordinary `Fn(A, E) -> A` and can itself be fused again by
    /// another pipeline.
    pub fn fuse<A, R>(&self, reduce: R) -> impl Fn(A, E) -> A + Send + Sync + Clone + use<A, E, R>
    where
        R: Fn(A, E) -> A + Send + Sync + Clone,
    {
        let stages: Arc<[Stage<E>]> = self.stages.clone().into();
        move |acc, e| match run_stages(&stages, e) {
            Some(e) => reduce(acc, e),
            None => acc,
        }
    }

    /// Like [`Pipeline::fuse`] for a fallible reducing function.
    pub fn try_fuse<A, R>(
        &self,
        reduce: R,
    ) -> impl Fn(A, E) -> Result<A> + Send + Sync + Clone + use<A, E, R>
    where
        R: Fn(A, E) -> Result<A> + Send + Sync + Clone,
    {
        let stages: Arc<[Stage<E>]> = self.stages.clone().into();
        move |acc, e| match run_stages(&stages, e) {
            Some(e) => reduce(acc, e),
            None => Ok(acc),
        }
    }
}

impl<E> FromIterator<Stage<E>> for Pipeline<E> {
    fn from_iter<I: IntoIterator<Item = Stage<E>>>(iter: I) -> Self {
        Self { stages: iter.into_iter().collect() }
    }
}

impl<E> Debug for Pipeline<E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FormatResult {
        f.debug_list().entries(&self.stages).finish()
    }
}

impl<E> Display for Pipeline<E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FormatResult {
        if self.stages.is_empty() {
            return f.write_str("identity");
        }
        for (i, stage) in self.stages.iter().enumerate() {
            if i > 0 {
                f.write_str(" -> ")?;
            }
            write!(f, "{stage}")?;
        }
        Ok(())
    }
}

//! # Ironfold
//!
//! A **parallel divide-and-conquer fold engine** for Rust. Given a slice, a
//! reducing function, an associative combining function, and a seed, Ironfold
//! computes the same value as a sequential left fold by recursively halving the
//! slice, folding the halves on a rayon worker pool, and merging the partial
//! results with the combiner.
//!
//! Element-wise `map` and `filter` stages are **fused** into the reducing step,
//! so a pipeline such as "keep evens, add one, sum" makes a single pass over each
//! leaf and never builds an intermediate collection.
//!
//! ## Key Features
//!
//! - **Fork-join folding** - halves are forked with `rayon::join` above the leaf threshold
//! - **Stage fusion** - map/filter stages compile into one reducing function
//! - **Declaration-order stages** - filter-then-map and map-then-filter are distinct pipelines
//! - **Fail-fast** - the first failing user function cancels the rest of the fold
//! - **Sequential and parallel execution** - both produce the same result
//! - **Built-in combiners** - Sum, Count, Min, Max, Collect
//!
//! ## Quick Start
//!
//! ```
//! use ironfold::*;
//! # use anyhow::Result;
//!
//! # fn main() -> Result<()> {
//! let data: Vec<u64> = (0..100).collect();
//! let add = |a: u64, b: u64| a + b;
//!
//! // Plain fold
//! assert_eq!(fold(add, add, 0, &data)?, 4950);
//!
//! // Keep the evens, then add one to each survivor
//! let pipeline = map(|x: u64| x + 1, filter(|x: &u64| x % 2 == 0, &data));
//! assert_eq!(fold(add, add, 0, &pipeline)?, 2500);
//!
//! // Add one first, then keep the evens of the incremented values
//! let pipeline = filter(|x: &u64| x % 2 == 0, map(|x: u64| x + 1, &data));
//! assert_eq!(fold(add, add, 0, &pipeline)?, 2550);
//! # Ok(())
//! # }
//! ```
//!
//! ## Core Concepts
//!
//! ### Sources
//!
//! Any slice (or `Vec`) can be folded directly. [`map`] and [`filter`] wrap a
//! slice in a [`Transformed`] source that borrows the slice and owns a
//! [`Pipeline`] of stages. Both kinds implement [`Foldable`], which is all the
//! entry points need.
//!
//! ### Stages
//!
//! Stages run in the order they were declared. The first stage sees the raw
//! element; a failing filter drops the element for every later stage and for
//! the reducer. See [`stage`] for the fusion rules.
//!
//! ### Reducing and combining
//!
//! The reducing function folds elements into an accumulator inside a leaf. The
//! combining function merges two finished accumulators at a join. The seed is
//! the starting accumulator of every leaf and never appears at a join, so it
//! must be an identity for the combiner, and the combiner must be associative.
//!
//! ### Execution
//!
//! A [`Runner`] holds a validated [`FoldConfig`]:
//! - `leaf_threshold` (default 50) - ranges at most this long are folded sequentially
//! - `mode` - [`ExecMode::Parallel`] forks halves, [`ExecMode::Sequential`] runs them in place
//! - `threads` - optional dedicated worker pool size
//!
//! ```
//! use ironfold::*;
//!
//! # fn main() -> anyhow::Result<()> {
//! let runner = Runner::new(FoldConfig::new().with_leaf_threshold(8).with_threads(2))?;
//! let words = vec!["a", "bb", "ccc"];
//! let total = fold_with(&runner, |n: usize, w: &str| n + w.len(), |a, b| a + b, 0, &words)?;
//! assert_eq!(total, 6);
//! # Ok(())
//! # }
//! ```
//!
//! ### Errors
//!
//! Entry points return [`anyhow::Result`]. A zero leaf threshold is rejected
//! with [`FoldError::InvalidThreshold`] before anything runs. A panicking user
//! function surfaces as [`FoldError::UserFault`]; with [`try_fold`] the user's
//! own error is returned instead. Either way no partial result is produced.
//!
//! ## Module Overview
//!
//! - [`partition`] - index ranges and the halving rule
//! - [`leaf`] - sequential folding of one partition
//! - [`stage`] - stages, pipelines, and fusion
//! - [`runner`] - fork-join executor
//! - [`source`] - the `Foldable` trait and transformed sources
//! - [`fold`](mod@fold) - top-level entry points
//! - [`combiners`] - ready-made reduce/combine/seed triples
//! - [`config`] - configuration and validation
//! - [`metrics`] - execution counters (feature `metrics`)
//! - [`testing`] - helpers for testing folds

pub mod combiners;
pub mod config;
pub mod error;
pub mod fold;
pub mod leaf;
#[cfg(feature = "metrics")]
pub mod metrics;
pub mod partition;
pub mod runner;
pub mod source;
pub mod stage;
pub mod testing;

// General re-exports
pub use combiners::{Collect, Combiner, Count, Max, Min, Sum};
pub use config::{DEFAULT_LEAF_THRESHOLD, ExecMode, FoldConfig};
pub use error::FoldError;
pub use fold::{fold, fold_with, fold_with_combiner, try_fold, try_fold_with};
pub use partition::Partition;
pub use runner::Runner;
pub use source::{Foldable, IntoTransformed, Transformed, filter, map};
pub use stage::{Pipeline, Stage, StageKind};

// Gated re-exports
#[cfg(feature = "metrics")]
pub use metrics::MetricsCollector;

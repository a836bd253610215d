//! Fork-join execution of a fold.
//!
//! The runner halves the index range until partitions are at most
//! `leaf_threshold` long, folds every leaf from the seed, and merges sibling
//! results with the combining function on the way back up. In
//! [`ExecMode::Parallel`] the two halves of each split are handed to
//! [`rayon::join`]; leaves always run synchronously on whichever worker reached
//! them.
//!
//! Joins only ever see two finished accumulators. The reducing function and
//! the seed never appear at a join, so element stages fused into the reducer
//! are never applied twice.
//!
//! ## Failure
//!
//! Every fold carries a stop flag. A failing leaf or join (error or panic)
//! raises it, leaves that are running bail out at their next element, and no
//! new leaf starts. The first real failure is reported; sibling results are
//! dropped.

use crate::config::{ExecMode, FoldConfig};
use crate::error::FoldError;
use crate::leaf::try_fold_leaf;
#[cfg(feature = "metrics")]
use crate::metrics::{FoldCounters, MetricsCollector};
use crate::partition::Partition;
use anyhow::{Result, anyhow};
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::any::Any;
#[cfg(feature = "metrics")]
use std::cell::Cell;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, trace, warn};

/// Why a subtree stopped without a result.
enum Halt {
    /// A user function returned an error.
    Failed(anyhow::Error),
    /// A user function panicked.
    Panicked(String),
    /// A sibling failed first.
    Cancelled,
}

impl Halt {
    /// Keep the more informative of two failures, left first.
    fn or(self, other: Self) -> Self {
        match (self, other) {
            (Self::Cancelled, other) => other,
            (this, _) => this,
        }
    }

    fn into_error(self) -> anyhow::Error {
        match self {
            Self::Failed(e) => e,
            Self::Panicked(message) => FoldError::UserFault { message }.into(),
            Self::Cancelled => anyhow!("fold cancelled"),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Shared, read-only state of one fold invocation.
struct Job<'a, E, A, R, C> {
    source: &'a [E],
    reduce: &'a R,
    combine: &'a C,
    seed: &'a A,
    threshold: usize,
    mode: ExecMode,
    stop: AtomicBool,
    #[cfg(feature = "metrics")]
    counters: FoldCounters,
}

impl<E, A, R, C> Job<'_, E, A, R, C>
where
    E: Clone + Send + Sync,
    A: Clone + Send + Sync,
    R: Fn(A, E) -> Result<A> + Sync,
    C: Fn(A, A) -> Result<A> + Sync,
{
    fn halt(&self, halt: Halt) -> Halt {
        self.stop.store(true, Ordering::Relaxed);
        halt
    }

    fn run(&self, part: Partition) -> Result<A, Halt> {
        if self.stop.load(Ordering::Relaxed) {
            return Err(Halt::Cancelled);
        }
        if part.is_leaf(self.threshold) {
            return self.leaf(part);
        }

        let (left, right) = part.split();
        let (l, r) = match self.mode {
            ExecMode::Parallel => rayon::join(|| self.run(left), || self.run(right)),
            ExecMode::Sequential => {
                let l = self.run(left);
                (l, self.run(right))
            }
        };

        match (l, r) {
            (Ok(a), Ok(b)) => self.join(a, b),
            (Err(a), Err(b)) => Err(a.or(b)),
            (Err(h), Ok(_)) | (Ok(_), Err(h)) => Err(h),
        }
    }

    fn leaf(&self, part: Partition) -> Result<A, Halt> {
        trace!(range = %part, "folding leaf");
        #[cfg(feature = "metrics")]
        let read = Cell::new(0_usize);
        let reduce = |acc: A, e: E| -> Result<A> {
            #[cfg(feature = "metrics")]
            read.set(read.get() + 1);
            (self.reduce)(acc, e)
        };

        let out = catch_unwind(AssertUnwindSafe(|| {
            try_fold_leaf(&reduce, self.seed.clone(), part, self.source, &self.stop)
        }));
        #[cfg(feature = "metrics")]
        self.counters.leaf(read.get());

        match out {
            Ok(Ok(Some(acc))) => Ok(acc),
            Ok(Ok(None)) => Err(Halt::Cancelled),
            Ok(Err(e)) => Err(self.halt(Halt::Failed(e))),
            Err(payload) => Err(self.halt(Halt::Panicked(panic_message(payload.as_ref())))),
        }
    }

    fn join(&self, left: A, right: A) -> Result<A, Halt> {
        #[cfg(feature = "metrics")]
        self.counters.combine();

        match catch_unwind(AssertUnwindSafe(|| (self.combine)(left, right))) {
            Ok(Ok(acc)) => Ok(acc),
            Ok(Err(e)) => Err(self.halt(Halt::Failed(e))),
            Err(payload) => Err(self.halt(Halt::Panicked(panic_message(payload.as_ref())))),
        }
    }
}

/// Executes folds under a validated [`FoldConfig`].
#[derive(Clone)]
pub struct Runner {
    config: FoldConfig,
    pool: Option<Arc<ThreadPool>>,
    #[cfg(feature = "metrics")]
    metrics: Option<MetricsCollector>,
}

impl Default for Runner {
    fn default() -> Self {
        Self {
            config: FoldConfig::default(),
            pool: None,
            #[cfg(feature = "metrics")]
            metrics: None,
        }
    }
}

impl Runner {
    /// Validate `config` and build its worker pool, if it asks for one.
    ///
    /// # Errors
    ///
    /// Returns a [`FoldError`] configuration error for a zero threshold, a zero
    /// worker count, or a pool that cannot be built.
    pub fn new(config: FoldConfig) -> Result<Self> {
        config.validate()?;
        let pool = match config.threads {
            Some(n) => Some(Arc::new(
                ThreadPoolBuilder::new()
                    .num_threads(n)
                    .thread_name(|i| format!("ironfold-{i}"))
                    .build()
                    .map_err(|e| FoldError::ThreadPool(e.to_string()))?,
            )),
            None => None,
        };
        Ok(Self {
            config,
            pool,
            #[cfg(feature = "metrics")]
            metrics: None,
        })
    }

    /// Shorthand for a runner that only changes the leaf threshold.
    ///
    /// # Errors
    ///
    /// Returns [`FoldError::InvalidThreshold`] when `leaf_threshold` is zero.
    pub fn with_threshold(leaf_threshold: usize) -> Result<Self> {
        Self::new(FoldConfig::new().with_leaf_threshold(leaf_threshold))
    }

    #[cfg(feature = "metrics")]
    #[must_use]
    pub fn with_metrics(mut self, metrics: MetricsCollector) -> Self {
        self.metrics = Some(metrics);
        self
    }

    #[must_use]
    pub const fn config(&self) -> &FoldConfig {
        &self.config
    }

    #[must_use]
    pub const fn leaf_threshold(&self) -> usize {
        self.config.leaf_threshold
    }

    /// Fork-join fold of `source` with infallible user functions.
    ///
    /// A panic in `reduce` or `combine` aborts the fold and is reported as
    /// [`FoldError::UserFault`].
    ///
    /// # Errors
    ///
    /// Fails only when a user function panics.
    pub fn fold<E, A, R, C>(&self, source: &[E], reduce: R, combine: C, seed: A) -> Result<A>
    where
        E: Clone + Send + Sync,
        A: Clone + Send + Sync,
        R: Fn(A, E) -> A + Sync,
        C: Fn(A, A) -> A + Sync,
    {
        self.try_fold(
            source,
            |acc, e| Ok(reduce(acc, e)),
            |a, b| Ok(combine(a, b)),
            seed,
        )
    }

    /// Fork-join fold of `source` with fallible user functions.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by `reduce` or `combine`, or
    /// [`FoldError::UserFault`] if one of them panicked.
    pub fn try_fold<E, A, R, C>(&self, source: &[E], reduce: R, combine: C, seed: A) -> Result<A>
    where
        E: Clone + Send + Sync,
        A: Clone + Send + Sync,
        R: Fn(A, E) -> Result<A> + Sync,
        C: Fn(A, A) -> Result<A> + Sync,
    {
        if source.is_empty() {
            return Ok(seed);
        }

        let job = Job {
            source,
            reduce: &reduce,
            combine: &combine,
            seed: &seed,
            threshold: self.config.leaf_threshold,
            mode: self.config.mode,
            stop: AtomicBool::new(false),
            #[cfg(feature = "metrics")]
            counters: FoldCounters::default(),
        };

        debug!(
            len = source.len(),
            leaf_threshold = job.threshold,
            mode = ?job.mode,
            "starting fold"
        );
        #[cfg(feature = "metrics")]
        if let Some(m) = &self.metrics {
            m.record_start();
        }

        let whole = Partition::full(source.len());
        let out = match &self.pool {
            Some(pool) => pool.install(|| job.run(whole)),
            None => job.run(whole),
        };

        #[cfg(feature = "metrics")]
        if let Some(m) = &self.metrics {
            job.counters.flush(m, out.is_ok());
            m.record_end();
        }

        match out {
            Ok(acc) => {
                debug!(len = source.len(), "fold finished");
                Ok(acc)
            }
            Err(halt) => {
                let err = halt.into_error();
                warn!(error = %err, "fold aborted");
                Err(err)
            }
        }
    }
}

//! Fold configuration.
//!
//! The leaf threshold decides where recursion stops: ranges of at most
//! `leaf_threshold` elements are folded sequentially, larger ones are halved.
//! The remaining knobs choose how the recursion is scheduled.
//!
//! ```
//! use ironfold::config::FoldConfig;
//!
//! let cfg = FoldConfig::from_json(r#"{ "leaf_threshold": 128, "threads": 4 }"#)?;
//! assert_eq!(cfg.leaf_threshold, 128);
//! assert_eq!(cfg.threads, Some(4));
//! # Ok::<_, anyhow::Error>(())
//! ```

use crate::error::FoldError;
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Leaf threshold used when none is configured.
pub const DEFAULT_LEAF_THRESHOLD: usize = 50;

/// How the fork-join recursion is scheduled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecMode {
    /// Both halves of every split run on the calling thread, left first.
    Sequential,
    /// Halves are forked onto the worker pool.
    #[default]
    Parallel,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FoldConfig {
    /// Largest partition folded without splitting. Must be greater than zero.
    pub leaf_threshold: usize,
    pub mode: ExecMode,
    /// Size of a dedicated worker pool. `None` uses the global rayon pool.
    pub threads: Option<usize>,
}

impl Default for FoldConfig {
    fn default() -> Self {
        Self {
            leaf_threshold: DEFAULT_LEAF_THRESHOLD,
            mode: ExecMode::Parallel,
            threads: None,
        }
    }
}

impl FoldConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn with_leaf_threshold(mut self, leaf_threshold: usize) -> Self {
        self.leaf_threshold = leaf_threshold;
        self
    }

    #[must_use]
    pub const fn with_threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }

    #[must_use]
    pub const fn sequential(mut self) -> Self {
        self.mode = ExecMode::Sequential;
        self
    }

    /// Pick a threshold so that `len` elements split into about four leaves per core.
    ///
    /// Never goes below [`DEFAULT_LEAF_THRESHOLD`].
    #[must_use]
    pub fn auto(len: usize) -> Self {
        let target_leaves = 4 * num_cpus::get().max(1);
        let leaf_threshold = len.div_ceil(target_leaves).max(DEFAULT_LEAF_THRESHOLD);
        Self { leaf_threshold, ..Self::default() }
    }

    /// Parse a JSON document. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`FoldError::Config`] for malformed documents (including negative
    /// thresholds) and any error reported by [`FoldConfig::validate`].
    pub fn from_json(s: &str) -> Result<Self> {
        let cfg: Self =
            serde_json::from_str(s).map_err(|e| FoldError::Config(e.to_string()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// # Errors
    ///
    /// Returns [`FoldError::InvalidThreshold`] for a zero threshold and
    /// [`FoldError::InvalidThreads`] for an explicit worker count of zero.
    pub fn validate(&self) -> Result<()> {
        if self.leaf_threshold == 0 {
            return Err(FoldError::InvalidThreshold { threshold: self.leaf_threshold }.into());
        }
        if self.threads == Some(0) {
            return Err(FoldError::InvalidThreads.into());
        }
        Ok(())
    }
}

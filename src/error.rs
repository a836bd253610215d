//! Error kinds raised by the fold engine itself.
//!
//! Public entry points return [`anyhow::Result`]. Failures that originate in the
//! engine (bad configuration, a panicking user function) are wrapped
//! [`FoldError`] values and can be recovered with `downcast_ref::<FoldError>()`.
//! Errors returned by fallible user functions pass through untouched.

use thiserror::Error;

/// Failures detected by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FoldError {
    /// The leaf threshold must be strictly positive, otherwise splitting never terminates.
    #[error("invalid leaf threshold {threshold}: must be greater than zero")]
    InvalidThreshold { threshold: usize },

    /// An explicit worker count of zero was requested.
    #[error("invalid worker count: threads must be greater than zero when set")]
    InvalidThreads,

    /// A configuration document could not be parsed.
    #[error("invalid fold configuration: {0}")]
    Config(String),

    /// The dedicated worker pool could not be created.
    #[error("failed to build worker pool: {0}")]
    ThreadPool(String),

    /// A user-supplied function panicked while the fold was running.
    #[error("user function panicked: {message}")]
    UserFault { message: String },
}

impl FoldError {
    /// True for the errors raised before any element is processed.
    #[must_use]
    pub const fn is_config(&self) -> bool {
        matches!(
            self,
            Self::InvalidThreshold { .. } | Self::InvalidThreads | Self::Config(_) | Self::ThreadPool(_)
        )
    }
}

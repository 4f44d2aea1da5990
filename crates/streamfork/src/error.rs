//! Error types for splitting, reducing and forking.
//!
//! ## Error Cases
//! - `Exhausted`: a source was advanced past its last element.
//! - `Source`: a source failed for a reason of its own while being traversed.
//! - `DuplicateTrigger`: a fork was registered, or results requested, after
//!   the forker was triggered.
//! - `UnknownForkKey`: a result was requested for a key that was never
//!   registered.
//! - `ForkComputation`: a fork's transform panicked or returned an error.
//! - `AggregateReduce`: a branch of a parallel reduction panicked or its
//!   source failed.
//! - `ResultTypeMismatch` / `ResultTaken`: a fork result was requested with the
//!   wrong type, or after it had already been handed out.
//! - `InvalidConfig` / `ThreadPool`: configuration was rejected.
//!
//! Splitting never fails: a source that cannot split simply returns `None`
//! from [`crate::Spliterator::try_split`].

use std::sync::Arc;

/// Result alias used throughout `streamfork`.
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Boxed error carried as the source of a failed fork or reduction.
pub type BoxedError = Arc<dyn std::error::Error + Send + Sync + 'static>;

/// All errors that `streamfork` can produce.
#[derive(Clone, thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// The source had already reported that no elements remain.
    ///
    /// This is a traversal defect and is absorbed by
    /// [`crate::Spliterator::for_each_remaining`] and the reduce engine.
    #[error("source exhausted")]
    Exhausted,

    /// A source failed while being traversed.
    #[error("source failed: {reason}")]
    Source { reason: String },

    /// The forker was already triggered by [`crate::StreamForker::get_results`].
    #[error("fork results were already requested; registrations are frozen")]
    DuplicateTrigger,

    /// No fork was registered under the requested key.
    #[error("unknown fork key: {key}")]
    UnknownForkKey { key: String },

    /// The fork's transform failed inside its task.
    #[error("fork `{key}` failed: {reason}")]
    ForkComputation {
        key: String,
        reason: String,
        #[source]
        source: Option<BoxedError>,
    },

    /// A branch of a parallel reduction failed; partial results were
    /// discarded.
    #[error("parallel reduction failed: {reason}")]
    AggregateReduce {
        reason: String,
        #[source]
        source: Option<BoxedError>,
    },

    /// The fork's result is not of the requested type.
    #[error("fork `{key}` did not produce a `{expected}`")]
    ResultTypeMismatch { key: String, expected: &'static str },

    /// The fork's result was already handed out by an earlier `get`.
    #[error("fork `{key}` result was already taken")]
    ResultTaken { key: String },

    /// A configuration value was rejected.
    #[error("invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    /// The worker pool could not be built.
    #[error("thread pool error: {reason}")]
    ThreadPool { reason: String },
}

impl From<rayon::ThreadPoolBuildError> for Error {
    fn from(err: rayon::ThreadPoolBuildError) -> Self {
        Self::ThreadPool {
            reason: err.to_string(),
        }
    }
}

impl Error {
    pub(crate) fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }
}

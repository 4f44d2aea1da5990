//! Fork-join reduction over splittable sources.
//!
//! [`ReduceEngine::reduce`] splits a source top-down until its
//! [`crate::SplitPolicy`] refuses, folds every leaf sequentially and combines
//! the partial results bottom-up. Sibling branches run as `rayon::join` tasks
//! on the engine's pool, so a branch blocked on its sibling lends its thread to
//! pending work instead of parking it.

use crate::{EngineConfig, Error, Reducer, Result, Spliterator, panic::panic_message};
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Runs associative reductions on a shared worker pool.
///
/// Cloning is cheap; clones share the same pool.
///
/// # Example
/// ```
/// use streamfork::{EngineConfig, FnReducer, MidpointSplitter, ReduceEngine, SliceSource};
///
/// let engine = ReduceEngine::new(EngineConfig::with_threads(4)).unwrap();
/// let numbers: Vec<u64> = (1..=1_000).collect();
/// let source = SliceSource::new(&numbers, MidpointSplitter { min_chunk_size: 64 });
/// let sum = FnReducer::new(|| 0_u64, |acc: u64, n: u64| acc + n, |a: u64, b: u64| a + b);
///
/// assert_eq!(engine.reduce(source, &sum).unwrap(), 500_500);
/// ```
#[derive(Clone)]
pub struct ReduceEngine {
    pool: Arc<ThreadPool>,
    config: EngineConfig,
}

impl ReduceEngine {
    /// Builds a dedicated worker pool from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] for an invalid `config` and
    /// [`Error::ThreadPool`] if the pool's threads cannot be spawned.
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;

        let prefix = config.thread_name_prefix.clone();
        let pool = ThreadPoolBuilder::new()
            .num_threads(config.num_threads)
            .thread_name(move |i| format!("{prefix}-{i}"))
            .build()?;

        #[cfg(feature = "tracing")]
        tracing::debug!(
            num_threads = config.num_threads,
            prefix = %config.thread_name_prefix,
            "built reduce engine pool"
        );

        Ok(Self {
            pool: Arc::new(pool),
            config,
        })
    }

    /// The pool shared by reductions and by forkers created from this engine.
    pub fn pool(&self) -> &Arc<ThreadPool> {
        &self.pool
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Reduces `source` in parallel.
    ///
    /// The result equals [`Self::reduce_sequential`] whenever `reducer`
    /// combines chunks cut by the source's split policy exactly, regardless of
    /// how many splits happen or in which order branches finish.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AggregateReduce`] if any branch panics or its source
    /// fails; the results of the other branches are discarded. A source
    /// error is kept as the aggregate's [`std::error::Error::source`].
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip_all))]
    pub fn reduce<S, R>(&self, source: S, reducer: &R) -> Result<R::Output>
    where
        S: Spliterator + Send,
        R: Reducer<S::Item> + Sync,
        R::Output: Send,
    {
        let outcome = self
            .pool
            .install(|| catch_unwind(AssertUnwindSafe(|| reduce_split(source, reducer, 0))));

        match outcome {
            Ok(Ok(output)) => Ok(output),
            Ok(Err(err)) => {
                #[cfg(feature = "tracing")]
                tracing::warn!(error = %err, "parallel reduction branch failed");
                Err(Error::AggregateReduce {
                    reason: err.to_string(),
                    source: Some(Arc::new(err)),
                })
            }
            Err(payload) => {
                let reason = panic_message(payload.as_ref());
                #[cfg(feature = "tracing")]
                tracing::warn!(%reason, "parallel reduction branch panicked");
                Err(Error::AggregateReduce { reason, source: None })
            }
        }
    }

    /// Left-folds `source` on the calling thread without splitting.
    ///
    /// # Errors
    ///
    /// Propagates source errors other than [`Error::Exhausted`].
    pub fn reduce_sequential<S, R>(mut source: S, reducer: &R) -> Result<R::Output>
    where
        S: Spliterator,
        R: Reducer<S::Item>,
    {
        source.fold_remaining(reducer.identity(), |acc, item| reducer.accumulate(acc, item))
    }
}

impl core::fmt::Debug for ReduceEngine {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ReduceEngine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

fn reduce_split<S, R>(mut source: S, reducer: &R, depth: usize) -> Result<R::Output>
where
    S: Spliterator + Send,
    R: Reducer<S::Item> + Sync,
    R::Output: Send,
{
    match source.try_split() {
        Some(prefix) => {
            #[cfg(feature = "tracing")]
            tracing::trace!(
                depth,
                prefix = prefix.estimate_size(),
                suffix = source.estimate_size(),
                "forking reduce branches"
            );
            let (left, right) = rayon::join(
                || reduce_split(prefix, reducer, depth + 1),
                || reduce_split(source, reducer, depth + 1),
            );
            Ok(reducer.combine(left?, right?))
        }
        None => ReduceEngine::reduce_sequential(source, reducer),
    }
}

//! Fan a single source out to many independently computed pipelines.
//!
//! A [`StreamForker`] collects named transforms, then on
//! [`StreamForker::get_results`] gives every transform its own blocking queue,
//! schedules it on the worker pool and walks the source exactly once, copying
//! each element into every queue. The returned [`ResultHandle`] retrieves each
//! transform's result by key.

use super::queue::{FanOut, ForkSource, fork_queue};
use super::results::{ForkFailure, Outcome, ResultHandle};
use crate::{Error, ReduceEngine, Result, Spliterator, panic::panic_message};
use core::any::Any;
use core::fmt::Debug;
use core::hash::Hash;
use futures::channel::oneshot;
use rayon::ThreadPool;
use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

#[cfg(feature = "tracing")]
use tracing::instrument;

type Transform<T> = Box<dyn FnOnce(ForkSource<T>) -> Outcome + Send>;

/// Registers transforms against one source and runs them all from a single
/// pass over it.
///
/// Registration is open until [`Self::get_results`] is called; from then on
/// the fork set is frozen and further registrations fail with
/// [`Error::DuplicateTrigger`].
///
/// # Example
/// ```
/// use streamfork::{CharSource, StreamForker};
///
/// let chars: Vec<char> = "ab cd".chars().collect();
/// let mut forker = StreamForker::new(CharSource::whitespace(&chars));
/// forker
///     .fork("words", |src| streamfork::count_words_iteratively(&src.collect::<String>()))?
///     .fork("upper", |src| src.map(|c| c.to_ascii_uppercase()).collect::<String>())?;
///
/// let results = forker.get_results()?;
/// assert_eq!(results.get::<usize>(&"words")?, 2);
/// assert_eq!(results.get::<String>(&"upper")?, "AB CD");
/// # Ok::<(), streamfork::Error>(())
/// ```
pub struct StreamForker<S: Spliterator, K> {
    source: Option<S>,
    forks: HashMap<K, Transform<S::Item>>,
    pool: Option<Arc<ThreadPool>>,
}

impl<S, K> StreamForker<S, K>
where
    S: Spliterator,
    S::Item: Clone + Send + 'static,
    K: Eq + Hash + Debug,
{
    /// Creates a forker whose transforms run on rayon's global pool.
    pub fn new(source: S) -> Self {
        Self {
            source: Some(source),
            forks: HashMap::new(),
            pool: None,
        }
    }

    /// Creates a forker whose transforms run on `pool`.
    pub fn with_pool(source: S, pool: Arc<ThreadPool>) -> Self {
        Self {
            pool: Some(pool),
            ..Self::new(source)
        }
    }

    /// Creates a forker sharing `engine`'s worker pool.
    pub fn with_engine(source: S, engine: &ReduceEngine) -> Self {
        Self::with_pool(source, Arc::clone(engine.pool()))
    }

    /// Registers `transform` under `key`, replacing any earlier registration
    /// for the same key.
    ///
    /// A panic inside `transform` is captured and reported by
    /// [`ResultHandle::get`] as [`Error::ForkComputation`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateTrigger`] once [`Self::get_results`] has been
    /// called.
    pub fn fork<R, F>(&mut self, key: K, transform: F) -> Result<&mut Self>
    where
        F: FnOnce(ForkSource<S::Item>) -> R + Send + 'static,
        R: Any + Send,
    {
        self.register(
            key,
            Box::new(move |source| Ok(Box::new(transform(source)) as Box<dyn Any + Send>)),
        )
    }

    /// Registers a fallible `transform` under `key`.
    ///
    /// An `Err` returned by `transform` is reported by [`ResultHandle::get`] as
    /// [`Error::ForkComputation`], with the original error as its source.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateTrigger`] once [`Self::get_results`] has been
    /// called.
    pub fn try_fork<R, E, F>(&mut self, key: K, transform: F) -> Result<&mut Self>
    where
        F: FnOnce(ForkSource<S::Item>) -> core::result::Result<R, E> + Send + 'static,
        R: Any + Send,
        E: std::error::Error + Send + Sync + 'static,
    {
        self.register(
            key,
            Box::new(move |source| match transform(source) {
                Ok(value) => Ok(Box::new(value) as Box<dyn Any + Send>),
                Err(err) => Err(ForkFailure::errored(err)),
            }),
        )
    }

    fn register(&mut self, key: K, transform: Transform<S::Item>) -> Result<&mut Self> {
        if self.is_triggered() {
            return Err(Error::DuplicateTrigger);
        }
        if let Some(_replaced) = self.forks.insert(key, transform) {
            #[cfg(feature = "tracing")]
            tracing::trace!("replaced an earlier fork registration");
        }
        Ok(self)
    }

    /// Whether [`Self::get_results`] has been called.
    pub const fn is_triggered(&self) -> bool {
        self.source.is_none()
    }

    /// Number of registered forks.
    pub fn len(&self) -> usize {
        self.forks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forks.is_empty()
    }

    /// Starts every registered fork, then feeds them the whole source.
    ///
    /// Each fork gets a fresh queue and is scheduled before the walk begins,
    /// so forks consume while the source is still being read. The walk runs
    /// on the calling thread and returns once every element and the end of
    /// stream marker have been queued; the forks keep running afterwards.
    ///
    /// # Errors
    ///
    /// - [`Error::DuplicateTrigger`] if called more than once.
    /// - Any error other than [`Error::Exhausted`] raised by the source. The
    ///   forks still receive their end of stream marker and finish on the
    ///   elements delivered so far.
    #[cfg_attr(feature = "tracing", instrument(level = "debug", skip_all))]
    pub fn get_results(&mut self) -> Result<ResultHandle<K>> {
        let mut source = self.source.take().ok_or(Error::DuplicateTrigger)?;
        let forks = core::mem::take(&mut self.forks);

        #[cfg(feature = "tracing")]
        tracing::debug!(forks = forks.len(), "triggering forks");

        let mut queues = Vec::with_capacity(forks.len());
        let mut handle = ResultHandle::new();
        for (key, transform) in forks {
            let (queue, fork_source) = fork_queue();
            let (result_tx, result_rx) = oneshot::channel();
            #[cfg(feature = "tracing")]
            let label = format!("{key:?}");

            self.spawn(move || {
                let outcome = match catch_unwind(AssertUnwindSafe(|| transform(fork_source))) {
                    Ok(outcome) => outcome,
                    Err(payload) => Err(ForkFailure::panicked(panic_message(payload.as_ref()))),
                };
                #[cfg(feature = "tracing")]
                if outcome.is_err() {
                    tracing::warn!(fork = %label, "fork computation failed");
                }
                // The handle may already be gone; nobody is left to tell.
                let _ = result_tx.send(outcome);
            });

            queues.push(queue);
            handle.insert(key, result_rx);
        }

        let mut fan_out = FanOut::new(queues);
        let walked = source.for_each_remaining(|item| fan_out.push(item));
        fan_out.finish();

        #[cfg(feature = "tracing")]
        tracing::debug!(delivered = fan_out.delivered(), "source drained");

        walked.map(|()| handle)
    }

    fn spawn<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        match &self.pool {
            Some(pool) => pool.spawn(job),
            None => rayon::spawn(job),
        }
    }
}

impl<S: Spliterator, K: Debug> Debug for StreamForker<S, K> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("StreamForker")
            .field("forks", &self.forks.keys().collect::<Vec<_>>())
            .field("triggered", &self.source.is_none())
            .finish_non_exhaustive()
    }
}

use crate::{BoxedError, Error, Result};
use core::any::{Any, type_name};
use core::fmt::Debug;
use core::hash::Hash;
use futures::channel::oneshot;
use futures::lock::Mutex;
use std::collections::HashMap;

/// What a fork task sends back: its boxed result, or why it failed.
pub(crate) type Outcome = core::result::Result<Box<dyn Any + Send>, ForkFailure>;

/// A failure captured at a fork's task boundary.
#[derive(Clone, Debug)]
pub(crate) struct ForkFailure {
    reason: String,
    source: Option<BoxedError>,
}

impl ForkFailure {
    pub(crate) const fn panicked(reason: String) -> Self {
        Self {
            reason,
            source: None,
        }
    }

    pub(crate) fn errored<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self {
            reason: err.to_string(),
            source: Some(std::sync::Arc::new(err)),
        }
    }

    fn dropped() -> Self {
        Self::panicked(String::from("task dropped before producing a result"))
    }

    fn to_error(&self, key: &str) -> Error {
        Error::ForkComputation {
            key: key.to_owned(),
            reason: self.reason.clone(),
            source: self.source.clone(),
        }
    }
}

struct SlotState {
    pending: Option<oneshot::Receiver<Outcome>>,
    outcome: Option<Outcome>,
}

impl SlotState {
    /// Waits for the fork's outcome unless it already arrived.
    async fn settle(&mut self) {
        if let Some(pending) = self.pending.as_mut() {
            let outcome = pending.await.unwrap_or_else(|_| Err(ForkFailure::dropped()));
            self.pending = None;
            self.outcome = Some(outcome);
        }
    }
}

struct Slot {
    label: String,
    state: Mutex<SlotState>,
}

impl Slot {
    fn mismatch<R>(&self) -> Error {
        Error::ResultTypeMismatch {
            key: self.label.clone(),
            expected: type_name::<R>(),
        }
    }

    fn taken(&self) -> Error {
        Error::ResultTaken {
            key: self.label.clone(),
        }
    }
}

/// Retrieves the results of a triggered [`crate::StreamForker`].
///
/// Each registered key maps to exactly one running computation. Retrieving a
/// result waits for that computation only; other forks are unaffected by a
/// slow or failed neighbour.
///
/// A successful result is handed out once by [`Self::get`], or shared any
/// number of times through [`Self::get_cloned`]. A failure is reported on
/// every retrieval.
pub struct ResultHandle<K> {
    slots: HashMap<K, Slot>,
}

impl<K> ResultHandle<K>
where
    K: Eq + Hash + Debug,
{
    pub(crate) fn new() -> Self {
        Self {
            slots: HashMap::new(),
        }
    }

    pub(crate) fn insert(&mut self, key: K, pending: oneshot::Receiver<Outcome>) {
        let label = format!("{key:?}");
        let state = Mutex::new(SlotState {
            pending: Some(pending),
            outcome: None,
        });
        self.slots.insert(key, Slot { label, state });
    }

    /// Blocks until the fork registered under `key` completes and returns its
    /// result.
    ///
    /// Do not call this from a thread of the pool running the forks: with
    /// every pool thread waiting, the fork itself can never be scheduled.
    ///
    /// # Errors
    ///
    /// - [`Error::UnknownForkKey`], immediately, if `key` was never registered.
    /// - [`Error::ForkComputation`] if the fork's transform panicked or
    ///   returned an error.
    /// - [`Error::ResultTypeMismatch`] if the result is not an `R`; it stays
    ///   available for a correctly typed call.
    /// - [`Error::ResultTaken`] if the result was already returned.
    pub fn get<R: Any>(&self, key: &K) -> Result<R> {
        futures::executor::block_on(self.get_async(key))
    }

    /// Awaits the fork registered under `key`.
    ///
    /// # Errors
    ///
    /// See [`Self::get`].
    pub async fn get_async<R: Any>(&self, key: &K) -> Result<R> {
        let slot = self.slot(key)?;
        let mut state = slot.state.lock().await;
        state.settle().await;

        match state.outcome.take() {
            Some(Ok(value)) => match value.downcast::<R>() {
                Ok(value) => Ok(*value),
                Err(value) => {
                    state.outcome = Some(Ok(value));
                    Err(slot.mismatch::<R>())
                }
            },
            Some(Err(failure)) => {
                let err = failure.to_error(&slot.label);
                state.outcome = Some(Err(failure));
                Err(err)
            }
            None => Err(slot.taken()),
        }
    }

    /// Blocks until the fork registered under `key` completes and returns a
    /// clone of its result, leaving the result in place.
    ///
    /// # Errors
    ///
    /// As [`Self::get`]; [`Error::ResultTaken`] only once a plain `get` has
    /// taken the result.
    pub fn get_cloned<R: Any + Clone>(&self, key: &K) -> Result<R> {
        futures::executor::block_on(self.get_cloned_async(key))
    }

    /// Awaits the fork registered under `key` and clones its result.
    ///
    /// # Errors
    ///
    /// See [`Self::get_cloned`].
    pub async fn get_cloned_async<R: Any + Clone>(&self, key: &K) -> Result<R> {
        let slot = self.slot(key)?;
        let mut state = slot.state.lock().await;
        state.settle().await;

        match &state.outcome {
            Some(Ok(value)) => (**value)
                .downcast_ref::<R>()
                .cloned()
                .ok_or_else(|| slot.mismatch::<R>()),
            Some(Err(failure)) => Err(failure.to_error(&slot.label)),
            None => Err(slot.taken()),
        }
    }

    fn slot(&self, key: &K) -> Result<&Slot> {
        self.slots.get(key).ok_or_else(|| Error::UnknownForkKey {
            key: format!("{key:?}"),
        })
    }

    /// Whether a fork was registered under `key`.
    pub fn contains(&self, key: &K) -> bool {
        self.slots.contains_key(key)
    }

    /// The registered keys, in no particular order.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.slots.keys()
    }

    /// Number of registered forks.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl<K: Debug> Debug for ResultHandle<K> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ResultHandle")
            .field("keys", &self.slots.keys().collect::<Vec<_>>())
            .finish()
    }
}

use crate::{Characteristics, Error, Result, SizeThresholdSplitter, SplitPolicy, Spliterator};

/// A [`Spliterator`] over a borrowed, immutable slice.
///
/// Where the source may be split is decided by its [`SplitPolicy`]; the
/// source itself only guarantees that every split is disjoint and
/// order-preserving.
#[derive(Debug, Clone)]
pub struct SliceSource<'a, T, P> {
    remaining: &'a [T],
    policy: P,
}

/// A character source that only splits at whitespace.
pub type CharSource<'a> = SliceSource<'a, char, SizeThresholdSplitter<fn(&char) -> bool>>;

impl<'a, T, P> SliceSource<'a, T, P>
where
    T: Clone,
    P: SplitPolicy<T> + Clone,
{
    /// Creates a source yielding every element of `items`, split according to
    /// `policy`.
    pub const fn new(items: &'a [T], policy: P) -> Self {
        Self {
            remaining: items,
            policy,
        }
    }

    /// The elements not yet traversed or handed off by a split.
    pub const fn remaining(&self) -> &'a [T] {
        self.remaining
    }

    pub const fn policy(&self) -> &P {
        &self.policy
    }
}

impl<'a> CharSource<'a> {
    /// A character source using [`SizeThresholdSplitter::whitespace`].
    pub fn whitespace(chars: &'a [char]) -> Self {
        Self::new(chars, SizeThresholdSplitter::whitespace())
    }
}

impl<T, P> Spliterator for SliceSource<'_, T, P>
where
    T: Clone,
    P: SplitPolicy<T> + Clone,
{
    type Item = T;

    fn try_advance(&mut self) -> Result<(T, bool)> {
        let (first, rest) = self.remaining.split_first().ok_or(Error::Exhausted)?;
        self.remaining = rest;
        Ok((first.clone(), !rest.is_empty()))
    }

    fn try_split(&mut self) -> Option<Self> {
        let at = self.policy.split_point(self.remaining)?;
        // Neither half may be empty.
        if at == 0 || at >= self.remaining.len() {
            return None;
        }

        let (prefix, suffix) = self.remaining.split_at(at);
        #[cfg(feature = "tracing")]
        tracing::trace!(prefix = prefix.len(), suffix = suffix.len(), "split slice source");
        self.remaining = suffix;
        Some(Self {
            remaining: prefix,
            policy: self.policy.clone(),
        })
    }

    fn estimate_size(&self) -> usize {
        self.remaining.len()
    }

    fn characteristics(&self) -> Characteristics {
        Characteristics::SLICE
    }
}

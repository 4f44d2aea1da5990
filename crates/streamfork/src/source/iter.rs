use crate::{Characteristics, Error, Result, Spliterator};
use core::iter::Peekable;

/// Wraps an arbitrary [`Iterator`] as a sequential, non-splittable
/// [`Spliterator`].
///
/// The wrapped iterator is read one element ahead so that
/// [`Spliterator::try_advance`] can report whether more elements remain.
pub struct IterSource<I: Iterator> {
    inner: Peekable<I>,
}

impl<I: Iterator> IterSource<I> {
    pub fn new(iter: impl IntoIterator<IntoIter = I>) -> Self {
        Self {
            inner: iter.into_iter().peekable(),
        }
    }
}

impl<I: Iterator> core::fmt::Debug for IterSource<I> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("IterSource")
            .field("size_hint", &self.inner.size_hint())
            .finish_non_exhaustive()
    }
}

impl<I: Iterator> Spliterator for IterSource<I> {
    type Item = I::Item;

    fn try_advance(&mut self) -> Result<(I::Item, bool)> {
        let item = self.inner.next().ok_or(Error::Exhausted)?;
        let has_more = self.inner.peek().is_some();
        Ok((item, has_more))
    }

    fn try_split(&mut self) -> Option<Self> {
        None
    }

    fn estimate_size(&self) -> usize {
        self.inner.size_hint().0
    }

    fn characteristics(&self) -> Characteristics {
        match self.inner.size_hint() {
            (lo, Some(hi)) if lo == hi => Characteristics::ORDERED | Characteristics::SIZED,
            _ => Characteristics::ORDERED,
        }
    }
}

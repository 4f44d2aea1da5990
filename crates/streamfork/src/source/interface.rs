use crate::{Characteristics, Error, Result};

/// A lazy, order-preserving producer of elements that can optionally be split
/// into independent, disjoint parts.
///
/// A successful [`Self::try_split`] hands a contiguous prefix of the remaining
/// elements to a new source and leaves the suffix in `self`. Traversing the
/// prefix and then `self` reproduces exactly the sequence `self` would have
/// produced without splitting.
///
/// # Example
/// ```
/// use streamfork::{SizeThresholdSplitter, SliceSource, Spliterator};
///
/// let chars: Vec<char> = "one two three four five".chars().collect();
/// let mut suffix = SliceSource::new(&chars, SizeThresholdSplitter::whitespace());
/// let prefix = suffix.try_split().expect("long enough to split");
///
/// let rejoined: String = prefix.items().chain(suffix.items()).collect();
/// assert_eq!(rejoined, "one two three four five");
/// ```
pub trait Spliterator {
    /// The element type yielded by the source.
    type Item;

    /// Consumes the next element.
    ///
    /// Returns the element together with whether more elements remain after
    /// it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Exhausted`] once no elements remain, including on the
    /// first call for an empty source.
    fn try_advance(&mut self) -> Result<(Self::Item, bool)>;

    /// Splits off a prefix of the remaining elements into a new source.
    ///
    /// Returns `None` when the source is too small or has no valid split
    /// point; the caller is then expected to traverse it sequentially.
    fn try_split(&mut self) -> Option<Self>
    where
        Self: Sized;

    /// Estimated number of remaining elements, `0` when unknown.
    ///
    /// Only a splitting heuristic, never a correctness guarantee unless the
    /// source reports [`Characteristics::SIZED`].
    fn estimate_size(&self) -> usize;

    /// The structural properties of this source.
    fn characteristics(&self) -> Characteristics;

    /// Folds every remaining element into `init`, in order.
    ///
    /// An empty or already drained source folds to `init`.
    ///
    /// # Errors
    ///
    /// Propagates any error other than [`Error::Exhausted`] raised by
    /// [`Self::try_advance`].
    fn fold_remaining<B, F>(&mut self, init: B, mut f: F) -> Result<B>
    where
        F: FnMut(B, Self::Item) -> B,
    {
        let mut acc = init;
        loop {
            match self.try_advance() {
                Ok((item, has_more)) => {
                    acc = f(acc, item);
                    if !has_more {
                        return Ok(acc);
                    }
                }
                Err(Error::Exhausted) => return Ok(acc),
                Err(e) => return Err(e),
            }
        }
    }

    /// Feeds every remaining element to `f`, in order.
    ///
    /// # Errors
    ///
    /// See [`Self::fold_remaining`].
    fn for_each_remaining<F>(&mut self, mut f: F) -> Result<()>
    where
        F: FnMut(Self::Item),
    {
        self.fold_remaining((), |(), item| f(item))
    }

    /// Adapts the source into a standard [`Iterator`].
    fn items(self) -> SourceIter<Self>
    where
        Self: Sized,
    {
        SourceIter::new(self)
    }
}

/// An [`Iterator`] over the remaining elements of a [`Spliterator`].
///
/// Iteration ends at the last element or at the first error; errors are not
/// reported. Use [`Spliterator::for_each_remaining`] when they matter.
#[derive(Debug)]
pub struct SourceIter<S> {
    source: S,
    done: bool,
}

impl<S: Spliterator> SourceIter<S> {
    pub const fn new(source: S) -> Self {
        Self {
            source,
            done: false,
        }
    }

    /// Returns the underlying source.
    pub fn into_inner(self) -> S {
        self.source
    }
}

impl<S: Spliterator> Iterator for SourceIter<S> {
    type Item = S::Item;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.source.try_advance() {
            Ok((item, has_more)) => {
                self.done = !has_more;
                Some(item)
            }
            Err(_) => {
                self.done = true;
                None
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.done {
            (0, Some(0))
        } else if self.source.characteristics().contains(Characteristics::SIZED) {
            let n = self.source.estimate_size();
            (n, Some(n))
        } else {
            (0, None)
        }
    }
}

/// Decides where, if anywhere, a sequence may be divided.
///
/// Implementations must return an index strictly inside `1..remaining.len()`
/// or `None`. The element at the returned index starts the suffix.
pub trait SplitPolicy<T> {
    fn split_point(&self, remaining: &[T]) -> Option<usize>;
}

/// The minimum chunk size used by [`SizeThresholdSplitter::whitespace`].
pub const DEFAULT_MIN_CHUNK_SIZE: usize = 10;

/// Splits near the midpoint, but only at elements matching a boundary
/// predicate.
///
/// Sequences shorter than `min_chunk_size` are never split. Otherwise the
/// splitter scans forward from the midpoint for the first boundary element
/// and splits there, so the boundary element opens the suffix. When no
/// boundary follows the midpoint the sequence is left whole.
///
/// Because every seam lands on a boundary, reducers whose state only carries
/// across non-boundary runs (for example word counting with whitespace
/// boundaries) combine split results exactly.
///
/// # Example
/// ```
/// use streamfork::{SizeThresholdSplitter, SplitPolicy};
///
/// let splitter = SizeThresholdSplitter::whitespace();
/// let chars: Vec<char> = "hello brave new world".chars().collect();
/// assert_eq!(splitter.split_point(&chars), Some(11));
///
/// let short: Vec<char> = "tiny one".chars().collect();
/// assert_eq!(splitter.split_point(&short), None);
/// ```
#[derive(Clone, Copy)]
pub struct SizeThresholdSplitter<F> {
    min_chunk_size: usize,
    is_boundary: F,
}

impl SizeThresholdSplitter<fn(&char) -> bool> {
    /// Splits character sequences of at least [`DEFAULT_MIN_CHUNK_SIZE`] at
    /// whitespace.
    pub fn whitespace() -> Self {
        Self {
            min_chunk_size: DEFAULT_MIN_CHUNK_SIZE,
            is_boundary: |c: &char| c.is_whitespace(),
        }
    }
}

impl<F> SizeThresholdSplitter<F> {
    /// Creates a splitter from a minimum chunk size and a boundary predicate.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidConfig`] if `min_chunk_size` is zero.
    pub fn new(min_chunk_size: usize, is_boundary: F) -> crate::Result<Self> {
        if min_chunk_size == 0 {
            return Err(crate::Error::invalid_config(
                "min_chunk_size must be at least 1",
            ));
        }
        Ok(Self {
            min_chunk_size,
            is_boundary,
        })
    }

    pub const fn min_chunk_size(&self) -> usize {
        self.min_chunk_size
    }

    /// Tests a single element against the boundary predicate.
    pub fn is_boundary<T>(&self, item: &T) -> bool
    where
        F: Fn(&T) -> bool,
    {
        (self.is_boundary)(item)
    }
}

impl<F> core::fmt::Debug for SizeThresholdSplitter<F> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SizeThresholdSplitter")
            .field("min_chunk_size", &self.min_chunk_size)
            .finish_non_exhaustive()
    }
}

impl<T, F> SplitPolicy<T> for SizeThresholdSplitter<F>
where
    F: Fn(&T) -> bool,
{
    fn split_point(&self, remaining: &[T]) -> Option<usize> {
        let len = remaining.len();
        if len < self.min_chunk_size {
            return None;
        }
        let mid = (len / 2).max(1);
        (mid..len).find(|&i| (self.is_boundary)(&remaining[i]))
    }
}

/// Splits at the exact midpoint of anything at least `min_chunk_size` long.
///
/// Only suitable for reducers that are associative at every position, such as
/// sums or counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MidpointSplitter {
    pub min_chunk_size: usize,
}

impl<T> SplitPolicy<T> for MidpointSplitter {
    fn split_point(&self, remaining: &[T]) -> Option<usize> {
        let len = remaining.len();
        if len < self.min_chunk_size.max(2) {
            return None;
        }
        Some(len / 2)
    }
}

/// Never splits; the source is always traversed sequentially.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoSplit;

impl<T> SplitPolicy<T> for NoSplit {
    fn split_point(&self, _remaining: &[T]) -> Option<usize> {
        None
    }
}

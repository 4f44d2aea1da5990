use crate::{CharSource, ReduceEngine, Reducer, Result};

/// Partial result of counting words.
///
/// `last_boundary` records whether the last element seen was a boundary, so
/// the next non-boundary element starts a new word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WordCount {
    pub count: usize,
    pub last_boundary: bool,
}

impl WordCount {
    /// No words seen, positioned as if after a boundary.
    pub const IDENTITY: Self = Self {
        count: 0,
        last_boundary: true,
    };

    /// Advances the count by one element.
    #[must_use]
    pub const fn accumulate(self, is_boundary: bool) -> Self {
        match (is_boundary, self.last_boundary) {
            (true, _) => Self {
                count: self.count,
                last_boundary: true,
            },
            (false, true) => Self {
                count: self.count + 1,
                last_boundary: false,
            },
            (false, false) => self,
        }
    }

    /// Merges the count of the chunk that follows `self`.
    ///
    /// The right chunk's trailing state wins. This is exact only when the
    /// seam between the chunks sits on a boundary element, which is what
    /// [`crate::SizeThresholdSplitter`] guarantees.
    #[must_use]
    pub const fn combine(self, right: Self) -> Self {
        Self {
            count: self.count + right.count,
            last_boundary: right.last_boundary,
        }
    }
}

impl Default for WordCount {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Counts maximal runs of non-boundary elements.
#[derive(Clone, Copy)]
pub struct WordCounter<F> {
    is_boundary: F,
}

impl WordCounter<fn(&char) -> bool> {
    /// Counts whitespace-separated words.
    pub fn whitespace() -> Self {
        Self {
            is_boundary: |c: &char| c.is_whitespace(),
        }
    }
}

impl<F> WordCounter<F> {
    pub const fn new(is_boundary: F) -> Self {
        Self { is_boundary }
    }
}

impl<F> core::fmt::Debug for WordCounter<F> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("WordCounter").finish_non_exhaustive()
    }
}

impl<T, F> Reducer<T> for WordCounter<F>
where
    F: Fn(&T) -> bool,
{
    type Output = WordCount;

    fn identity(&self) -> WordCount {
        WordCount::IDENTITY
    }

    fn accumulate(&self, acc: WordCount, item: T) -> WordCount {
        acc.accumulate((self.is_boundary)(&item))
    }

    fn combine(&self, left: WordCount, right: WordCount) -> WordCount {
        left.combine(right)
    }
}

/// Counts whitespace-separated words with a plain loop.
///
/// # Example
/// ```
/// assert_eq!(streamfork::count_words_iteratively("  two   words "), 2);
/// ```
pub fn count_words_iteratively(s: &str) -> usize {
    let mut counter = 0;
    let mut last_space = true;
    for c in s.chars() {
        if c.is_whitespace() {
            last_space = true;
        } else {
            if last_space {
                counter += 1;
            }
            last_space = false;
        }
    }
    counter
}

/// Counts whitespace-separated words by splitting `s` at whitespace and
/// reducing the chunks on `engine`'s pool.
///
/// # Errors
///
/// Returns [`crate::Error::AggregateReduce`] if a reduction branch fails.
///
/// # Example
/// ```
/// use streamfork::{EngineConfig, ReduceEngine, count_words};
///
/// let engine = ReduceEngine::new(EngineConfig::with_threads(2)).unwrap();
/// let words = count_words(" Nel   mezzo del cammin  di nostra  vita ", &engine).unwrap();
/// assert_eq!(words, 7);
/// ```
pub fn count_words(s: &str, engine: &ReduceEngine) -> Result<usize> {
    let chars: Vec<char> = s.chars().collect();
    let counted = engine.reduce(CharSource::whitespace(&chars), &WordCounter::whitespace())?;
    Ok(counted.count)
}

/// An accumulate/combine pair reducing elements of type `T`.
///
/// `combine` must merge the results of two adjacent chunks such that
/// splitting a sequence, reducing each chunk from [`Self::identity`] and
/// combining left-to-right yields the same value as one sequential left fold.
/// A reducer may only achieve this for chunks cut by a particular
/// [`crate::SplitPolicy`]; pair them accordingly.
///
/// Reducers are stateless and shared by reference across worker threads.
pub trait Reducer<T> {
    type Output;

    /// The starting value of every chunk.
    fn identity(&self) -> Self::Output;

    /// Folds one element into a partial result.
    fn accumulate(&self, acc: Self::Output, item: T) -> Self::Output;

    /// Merges the partial results of two adjacent chunks, `left` preceding
    /// `right`.
    fn combine(&self, left: Self::Output, right: Self::Output) -> Self::Output;
}

use crate::Reducer;

/// A [`Reducer`] assembled from three closures.
///
/// # Example
/// ```
/// use streamfork::{FnReducer, Reducer};
///
/// let sum = FnReducer::new(|| 0_u64, |acc: u64, n: u32| acc + u64::from(n), |a: u64, b: u64| a + b);
/// let fold = |items: &[u32]| {
///     items
///         .iter()
///         .fold(Reducer::<u32>::identity(&sum), |acc, &n| sum.accumulate(acc, n))
/// };
/// let (left, right) = (fold(&[1, 2, 3]), fold(&[4, 5]));
/// assert_eq!(Reducer::<u32>::combine(&sum, left, right), 15);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct FnReducer<I, A, C> {
    identity: I,
    accumulate: A,
    combine: C,
}

impl<I, A, C> FnReducer<I, A, C> {
    pub const fn new(identity: I, accumulate: A, combine: C) -> Self {
        Self {
            identity,
            accumulate,
            combine,
        }
    }
}

impl<T, R, I, A, C> Reducer<T> for FnReducer<I, A, C>
where
    I: Fn() -> R,
    A: Fn(R, T) -> R,
    C: Fn(R, R) -> R,
{
    type Output = R;

    fn identity(&self) -> R {
        (self.identity)()
    }

    fn accumulate(&self, acc: R, item: T) -> R {
        (self.accumulate)(acc, item)
    }

    fn combine(&self, left: R, right: R) -> R {
        (self.combine)(left, right)
    }
}

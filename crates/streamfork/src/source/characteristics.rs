use bitflags::bitflags;

bitflags! {
    /// Structural properties a [`crate::Spliterator`] promises about the
    /// elements it yields.
    ///
    /// These are hints for consumers; nothing in `streamfork` relies on them
    /// for correctness.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct Characteristics: u8 {
        /// Elements have a defined encounter order.
        const ORDERED = 1;
        /// [`crate::Spliterator::estimate_size`] is exact before traversal.
        const SIZED = 1 << 1;
        /// Every source produced by splitting is also `SIZED`.
        const SUBSIZED = 1 << 2;
        /// No element is a "missing" value.
        const NON_NULL = 1 << 3;
        /// The backing sequence cannot change during traversal.
        const IMMUTABLE = 1 << 4;
    }
}

impl Characteristics {
    /// The characteristics of a source over an in-memory, immutable sequence.
    pub const SLICE: Self = Self::ORDERED
        .union(Self::SIZED)
        .union(Self::SUBSIZED)
        .union(Self::NON_NULL)
        .union(Self::IMMUTABLE);
}

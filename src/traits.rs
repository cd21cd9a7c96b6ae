use core::fmt::{Debug, Display};
use num_traits::{Float, Num, NumCast, One, Zero};

/// Trait for types that can be used as matrix elements.
///
/// Blanket-implemented for all types satisfying the bounds.
/// Covers `f32`, `f64`, and all integer types.
pub trait Scalar: Copy + PartialEq + Debug + Zero + One + Num {}

impl<T: Copy + PartialEq + Debug + Zero + One + Num> Scalar for T {}

/// Trait for real floating-point matrix elements.
///
/// Required by every decomposition, the property classifier and the norms.
/// `Send + Sync` so that blocks of a matrix can be handed to worker threads.
pub trait FloatScalar: Scalar + Float + NumCast + Display + Send + Sync + 'static {
    /// Convert an `f64` constant into `Self`.
    #[inline]
    fn lit(x: f64) -> Self {
        <Self as NumCast>::from(x).unwrap_or_else(Self::nan)
    }

    /// Convert a count (dimension, index offset) into `Self`.
    #[inline]
    fn from_usize(n: usize) -> Self {
        <Self as NumCast>::from(n).unwrap_or_else(Self::infinity)
    }
}

impl<T: Scalar + Float + NumCast + Display + Send + Sync + 'static> FloatScalar for T {}

/// Read-only access to a matrix-like type.
///
/// Implemented by the owned [`Matrix`](crate::Matrix) and by the borrowed
/// [`MatrixView`](crate::MatrixView) / [`MatrixViewMut`](crate::MatrixViewMut),
/// so predicates and reductions work on views without copying.
pub trait MatrixRef<T> {
    fn nrows(&self) -> usize;
    fn ncols(&self) -> usize;
    fn get(&self, row: usize, col: usize) -> &T;
}

/// Mutable access to a matrix-like type.
///
/// Extends `MatrixRef` with mutable element access, enabling
/// in-place algorithms (QR, permutation, non-singular repair) to work generically.
pub trait MatrixMut<T>: MatrixRef<T> {
    fn get_mut(&mut self, row: usize, col: usize) -> &mut T;
}

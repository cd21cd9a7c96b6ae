use crate::traits::{FloatScalar, MatrixRef};

use super::Matrix;

/// Maximum absolute column sum. Zero for an empty matrix.
pub(crate) fn norm1<T: FloatScalar>(a: &impl MatrixRef<T>) -> T {
    let mut max = T::zero();
    for j in 0..a.ncols() {
        let mut sum = T::zero();
        for i in 0..a.nrows() {
            sum = sum + a.get(i, j).abs();
        }
        max = max.max(sum);
    }
    max
}

/// Maximum absolute row sum. Zero for an empty matrix.
pub(crate) fn norm_infinity<T: FloatScalar>(a: &impl MatrixRef<T>) -> T {
    let mut max = T::zero();
    for i in 0..a.nrows() {
        let mut sum = T::zero();
        for j in 0..a.ncols() {
            sum = sum + a.get(i, j).abs();
        }
        max = max.max(sum);
    }
    max
}

/// Frobenius norm accumulated with `hypot`, so no intermediate square
/// overflows.
pub(crate) fn norm_f<T: FloatScalar>(a: &impl MatrixRef<T>) -> T {
    let mut acc = T::zero();
    for i in 0..a.nrows() {
        for j in 0..a.ncols() {
            acc = acc.hypot(*a.get(i, j));
        }
    }
    acc
}

impl<T: FloatScalar> Matrix<T> {
    /// One norm (maximum absolute column sum).
    ///
    /// ```
    /// use linfactor::Matrix;
    /// let m = Matrix::from_rows(2, 2, &[1.0_f64, -2.0, 3.0, 4.0]);
    /// assert_eq!(m.norm1(), 6.0);
    /// ```
    pub fn norm1(&self) -> T {
        norm1(self)
    }

    /// Infinity norm (maximum absolute row sum).
    ///
    /// ```
    /// use linfactor::Matrix;
    /// let m = Matrix::from_rows(2, 2, &[1.0_f64, -2.0, 3.0, 4.0]);
    /// assert_eq!(m.norm_infinity(), 7.0);
    /// ```
    pub fn norm_infinity(&self) -> T {
        norm_infinity(self)
    }

    /// Frobenius norm.
    ///
    /// ```
    /// use linfactor::Matrix;
    /// let m = Matrix::from_rows(2, 2, &[1.0_f64, 2.0, 3.0, 4.0]);
    /// assert!((m.norm_f() - 30.0_f64.sqrt()).abs() < 1e-12);
    /// ```
    pub fn norm_f(&self) -> T {
        norm_f(self)
    }
}

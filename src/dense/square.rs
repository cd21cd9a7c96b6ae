use crate::traits::{MatrixRef, Scalar};

use super::vector::Vector;
use super::Matrix;

/// Sum of the leading-diagonal cells over `min(nrows, ncols)`.
pub(crate) fn trace<T: Scalar>(a: &impl MatrixRef<T>) -> T {
    let n = a.nrows().min(a.ncols());
    (0..n).fold(T::zero(), |acc, i| acc + *a.get(i, i))
}

impl<T: Scalar> Matrix<T> {
    /// Sum of the diagonal elements. Non-square matrices use the leading
    /// `min(nrows, ncols)` diagonal; empty matrices give zero.
    ///
    /// ```
    /// use linfactor::Matrix;
    /// let m = Matrix::from_rows(3, 3, &[5.0, 2.0, 4.0, -3.0, 6.0, 2.0, 3.0, -3.0, 1.0]);
    /// assert_eq!(m.trace(), 12.0);
    /// ```
    pub fn trace(&self) -> T {
        trace(self)
    }

    /// Copy of the leading diagonal.
    pub fn diagonal(&self) -> Vector<T> {
        let n = self.nrows.min(self.ncols);
        Vector::from_vec((0..n).map(|i| self[(i, i)]).collect())
    }

    /// Integer power of a square matrix by repeated squaring. `pow(0)` is
    /// the identity.
    ///
    /// Panics if the matrix is not square.
    ///
    /// ```
    /// use linfactor::Matrix;
    /// let m = Matrix::from_rows(2, 2, &[1.0, 1.0, 0.0, 1.0]);
    /// assert_eq!(m.pow(3), Matrix::from_rows(2, 2, &[1.0, 3.0, 0.0, 1.0]));
    /// ```
    pub fn pow(&self, mut n: u32) -> Matrix<T> {
        assert!(self.is_square(), "pow requires a square matrix");
        let mut result = Matrix::identity(self.nrows);
        let mut base = self.clone();
        while n > 0 {
            if n & 1 == 1 {
                result = result.matmul(&base);
            }
            n >>= 1;
            if n > 0 {
                base = base.matmul(&base);
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trace_of_rectangular() {
        let m = Matrix::from_rows(2, 3, &[1.0, 9.0, 9.0, 9.0, 2.0, 9.0]);
        assert_eq!(m.trace(), 3.0);
        assert_eq!(Matrix::<f64>::zeros(0, 0).trace(), 0.0);
    }

    #[test]
    fn diagonal_roundtrip() {
        let m = Matrix::from_diagonal(&[1.0, 2.0, 3.0]);
        assert_eq!(m.diagonal().as_slice(), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn pow_zero_is_identity() {
        let m = Matrix::from_rows(2, 2, &[2.0, 1.0, 1.0, 3.0]);
        assert_eq!(m.pow(0), Matrix::identity(2));
        assert_eq!(m.pow(2), m.matmul(&m));
    }
}

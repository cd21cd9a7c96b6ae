use crate::traits::{MatrixRef, Scalar};

use super::Matrix;

impl<T: Scalar> Matrix<T> {
    /// Copy of the `rows x cols` sub-matrix starting at `(i, j)`.
    ///
    /// Panics if the block extends beyond the matrix bounds.
    ///
    /// ```
    /// use linfactor::Matrix;
    /// let m = Matrix::from_fn(3, 3, |i, j| (i * 3 + j) as f64);
    /// let b = m.block(1, 1, 2, 2);
    /// assert_eq!(b[(0, 0)], 4.0);
    /// assert_eq!(b[(1, 1)], 8.0);
    /// ```
    pub fn block(&self, i: usize, j: usize, rows: usize, cols: usize) -> Matrix<T> {
        self.view_part(i, j, rows, cols).to_matrix()
    }

    /// Write `src` into self starting at `(i, j)`.
    ///
    /// Panics if the block extends beyond the matrix bounds.
    pub fn set_block(&mut self, i: usize, j: usize, src: &impl MatrixRef<T>) {
        self.view_part_mut(i, j, src.nrows(), src.ncols()).copy_from(src);
    }

    /// Copy of the first `n` columns.
    pub fn left_columns(&self, n: usize) -> Matrix<T> {
        self.block(0, 0, self.nrows, n)
    }
}

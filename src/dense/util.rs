use core::fmt::{self, Write as _};

use crate::traits::Scalar;

use super::vector::Vector;
use super::Matrix;

// ── Map / assign ────────────────────────────────────────────────────

impl<T> Matrix<T> {
    /// Apply a function to every element, producing a new matrix.
    ///
    /// ```
    /// use linfactor::Matrix;
    /// let m = Matrix::from_rows(2, 2, &[1.0_f64, 4.0, 9.0, 16.0]);
    /// let r = m.map(|x: f64| x.sqrt());
    /// assert_eq!(r[(1, 1)], 4.0);
    /// ```
    pub fn map<U>(&self, f: impl Fn(T) -> U) -> Matrix<U>
    where
        T: Copy,
    {
        Matrix {
            data: self.data.iter().map(|&x| f(x)).collect(),
            nrows: self.nrows,
            ncols: self.ncols,
        }
    }
}

impl<T: Scalar> Matrix<T> {
    /// Replace every cell with `f(cell)`.
    pub fn assign(&mut self, f: impl Fn(T) -> T) {
        for x in self.data.iter_mut() {
            *x = f(*x);
        }
    }

    /// Replace every cell with `f(cell, other_cell)`. Panics on shape mismatch.
    ///
    /// ```
    /// use linfactor::Matrix;
    /// let mut a = Matrix::from_rows(1, 3, &[1.0, 2.0, 3.0]);
    /// let b = Matrix::from_rows(1, 3, &[10.0, 20.0, 30.0]);
    /// a.assign_with(&b, |x, y| x * y);
    /// assert_eq!(a.as_slice(), &[10.0, 40.0, 90.0]);
    /// ```
    pub fn assign_with(&mut self, other: &Matrix<T>, f: impl Fn(T, T) -> T) {
        assert_eq!(
            (self.nrows, self.ncols),
            (other.nrows, other.ncols),
            "dimension mismatch",
        );
        for (a, &b) in self.data.iter_mut().zip(other.data.iter()) {
            *a = f(*a, b);
        }
    }

    /// Overwrite every cell with the matching cell of `other`.
    pub fn copy_from(&mut self, other: &Matrix<T>) {
        self.assign_with(other, |_, b| b);
    }

    /// Fold every cell with `aggr(acc, f(x))`, starting from `f` of the
    /// first cell. Returns `None` for an empty matrix.
    ///
    /// ```
    /// use linfactor::Matrix;
    /// let m = Matrix::from_rows(2, 2, &[1.0, -2.0, 3.0, -4.0]);
    /// assert_eq!(m.aggregate(|a, b| a + b, |x| x * x), Some(30.0));
    /// ```
    pub fn aggregate(&self, aggr: impl Fn(T, T) -> T, f: impl Fn(T) -> T) -> Option<T> {
        let mut it = self.data.iter();
        let first = f(*it.next()?);
        Some(it.fold(first, |acc, &x| aggr(acc, f(x))))
    }

    /// Sum of all elements.
    pub fn sum(&self) -> T {
        self.data.iter().fold(T::zero(), |acc, &x| acc + x)
    }

    /// Owned transpose.
    ///
    /// ```
    /// use linfactor::Matrix;
    /// let m = Matrix::from_rows(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    /// let t = m.transpose();
    /// assert_eq!(t.shape(), (3, 2));
    /// assert_eq!(t[(2, 1)], 6.0);
    /// ```
    pub fn transpose(&self) -> Matrix<T> {
        Matrix::from_fn(self.ncols, self.nrows, |i, j| self[(j, i)])
    }
}

// ── Row / column manipulation ───────────────────────────────────────

impl<T> Matrix<T> {
    /// Swap two rows in place.
    pub fn swap_rows(&mut self, a: usize, b: usize) {
        if a != b {
            let n = self.ncols;
            for j in 0..n {
                self.data.swap(a * n + j, b * n + j);
            }
        }
    }

    /// Swap two columns in place.
    pub fn swap_columns(&mut self, a: usize, b: usize) {
        if a != b {
            for i in 0..self.nrows {
                let row = i * self.ncols;
                self.data.swap(row + a, row + b);
            }
        }
    }
}

impl<T: Scalar> Matrix<T> {
    /// Copy of row `i`.
    pub fn row(&self, i: usize) -> Vector<T> {
        Vector::from_slice(self.row_slice(i))
    }

    /// Copy of column `j`.
    ///
    /// ```
    /// use linfactor::Matrix;
    /// let m = Matrix::from_rows(2, 2, &[1.0, 2.0, 3.0, 4.0]);
    /// assert_eq!(m.column(1).as_slice(), &[2.0, 4.0]);
    /// ```
    pub fn column(&self, j: usize) -> Vector<T> {
        Vector::from_vec((0..self.nrows).map(|i| self[(i, j)]).collect())
    }

    /// Diagonal matrix with `diag` on its main diagonal.
    pub fn from_diagonal(diag: &[T]) -> Matrix<T> {
        let n = diag.len();
        let mut m = Matrix::zeros(n, n);
        for (i, &d) in diag.iter().enumerate() {
            m[(i, i)] = d;
        }
        m
    }
}

// ── Display ─────────────────────────────────────────────────────────

impl<T: fmt::Display> fmt::Display for Matrix<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (m, n) = (self.nrows, self.ncols);
        if m == 0 || n == 0 {
            return write!(f, "{}x{} matrix", m, n);
        }

        let mut widths = vec![0usize; n];
        for (j, width) in widths.iter_mut().enumerate() {
            for i in 0..m {
                let w = WriteCounting::count(|wc| write!(wc, "{}", self.data[i * n + j]));
                *width = (*width).max(w);
            }
        }

        for i in 0..m {
            write!(f, "│")?;
            for (j, &width) in widths.iter().enumerate() {
                if j > 0 {
                    write!(f, "  ")?;
                }
                write!(f, "{:>width$}", self.data[i * n + j], width = width)?;
            }
            write!(f, "│")?;
            if i + 1 < m {
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

struct WriteCounting {
    count: usize,
}

impl WriteCounting {
    fn count(f: impl FnOnce(&mut Self) -> fmt::Result) -> usize {
        let mut wc = WriteCounting { count: 0 };
        let _ = f(&mut wc);
        wc.count
    }
}

impl fmt::Write for WriteCounting {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.count += s.chars().count();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aggregate_empty_is_none() {
        let m = Matrix::<f64>::zeros(0, 3);
        assert_eq!(m.aggregate(|a, b| a + b, |x| x), None);
    }

    #[test]
    fn swap_rows_and_columns() {
        let mut m = Matrix::from_rows(2, 2, &[1.0, 2.0, 3.0, 4.0]);
        m.swap_rows(0, 1);
        assert_eq!(m.as_slice(), &[3.0, 4.0, 1.0, 2.0]);
        m.swap_columns(0, 1);
        assert_eq!(m.as_slice(), &[4.0, 3.0, 2.0, 1.0]);
    }

    #[test]
    fn row_and_column_copies() {
        let m = Matrix::from_fn(3, 2, |i, j| if j == 1 { 7.0 + i as f64 } else { 0.0 });
        assert_eq!(m.column(1).as_slice(), &[7.0, 8.0, 9.0]);
        assert_eq!(m.row(2).as_slice(), &[0.0, 9.0]);
    }

    #[test]
    fn display_alignment() {
        let m = Matrix::from_rows(2, 2, &[1.0, 100.0, 1000.0, 2.0]);
        let s = format!("{}", m);
        let lines: Vec<&str> = s.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].chars().count(), lines[1].chars().count());
    }

    #[test]
    fn display_empty() {
        assert_eq!(format!("{}", Matrix::<f64>::zeros(0, 2)), "0x2 matrix");
    }
}

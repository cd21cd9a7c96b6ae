//! Structural classification of matrices within a tolerance.
//!
//! [`Property`] is an immutable value holding a tolerance. Two cells are
//! considered equal when their difference is at most the tolerance, and a
//! cell is considered zero when its magnitude is at most the tolerance.
//! There is no setter: pass a different `Property` to use a different
//! tolerance.
//!
//! ```
//! use linfactor::{Matrix, Property};
//!
//! let a = Matrix::from_rows(3, 3, &[
//!     4.0_f64, 1.0, 0.0,
//!     1.0, 4.0, 1.0,
//!     0.0, 1.0, 4.0,
//! ]);
//! let p = Property::<f64>::DEFAULT;
//! assert!(p.is_tridiagonal(&a));
//! assert!(p.is_symmetric(&a).unwrap());
//! assert_eq!(p.semi_bandwidth(&a).unwrap(), 2);
//! assert!(p.is_diagonally_dominant_by_row(&a));
//! ```

use core::fmt;

use crate::error::{LinalgError, Result};
use crate::linalg::LuDecomposition;
use crate::traits::{FloatScalar, MatrixMut, MatrixRef};

/// Tolerance-carrying matrix classifier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Property<T> {
    tolerance: T,
}

impl Property<f64> {
    /// Tolerance `1e-9`.
    pub const DEFAULT: Property<f64> = Property { tolerance: 1e-9 };
    /// Exact comparisons.
    pub const ZERO: Property<f64> = Property { tolerance: 0.0 };
    /// Tolerance `1e-12`.
    pub const TWELVE: Property<f64> = Property { tolerance: 1e-12 };
}

impl Property<f32> {
    /// Tolerance `1e-9`.
    pub const DEFAULT: Property<f32> = Property { tolerance: 1e-9 };
    /// Exact comparisons.
    pub const ZERO: Property<f32> = Property { tolerance: 0.0 };
    /// Tolerance `1e-12`.
    pub const TWELVE: Property<f32> = Property { tolerance: 1e-12 };
}

impl<T: FloatScalar> Default for Property<T> {
    fn default() -> Self {
        Self::standard()
    }
}

impl<T: FloatScalar> Property<T> {
    /// Classifier with the given tolerance. The absolute value is used.
    pub fn new(tolerance: T) -> Self {
        Self {
            tolerance: tolerance.abs(),
        }
    }

    /// Tolerance `1e-9`.
    pub fn standard() -> Self {
        Self::new(T::lit(1e-9))
    }

    /// Exact comparisons.
    pub fn zero() -> Self {
        Self::new(T::zero())
    }

    /// Tolerance `1e-12`.
    pub fn twelve() -> Self {
        Self::new(T::lit(1e-12))
    }

    /// The tolerance this classifier compares with.
    #[inline]
    pub fn tolerance(&self) -> T {
        self.tolerance
    }

    #[inline]
    fn is_small(&self, x: T) -> bool {
        x.abs() <= self.tolerance
    }

    #[inline]
    fn near(&self, a: T, b: T) -> bool {
        if a.is_nan() || b.is_nan() {
            return a.is_nan() && b.is_nan();
        }
        a == b || (a - b).abs() <= self.tolerance
    }

    /// True when every cell selected by `outside(i, j)` is zero within
    /// tolerance.
    fn zero_outside(&self, a: &impl MatrixRef<T>, outside: impl Fn(usize, usize) -> bool) -> bool {
        for i in 0..a.nrows() {
            for j in 0..a.ncols() {
                if outside(i, j) && !self.is_small(*a.get(i, j)) {
                    return false;
                }
            }
        }
        true
    }

    // ── Shape ───────────────────────────────────────────────────────

    /// `rows == columns`. No tolerance involved.
    pub fn is_square(&self, a: &impl MatrixRef<T>) -> bool {
        a.nrows() == a.ncols()
    }

    /// `rows >= columns`.
    pub fn is_rectangular(&self, a: &impl MatrixRef<T>) -> bool {
        a.nrows() >= a.ncols()
    }

    /// `Err(NotSquare)` unless `a` is square.
    pub fn check_square(&self, a: &impl MatrixRef<T>) -> Result<()> {
        if self.is_square(a) {
            Ok(())
        } else {
            Err(LinalgError::NotSquare {
                rows: a.nrows(),
                cols: a.ncols(),
            })
        }
    }

    /// `Err(NotRectangular)` unless `rows >= columns`.
    pub fn check_rectangular(&self, a: &impl MatrixRef<T>) -> Result<()> {
        if self.is_rectangular(a) {
            Ok(())
        } else {
            Err(LinalgError::NotRectangular {
                rows: a.nrows(),
                cols: a.ncols(),
            })
        }
    }

    // ── Zero patterns ───────────────────────────────────────────────

    /// Every off-diagonal cell is zero.
    pub fn is_diagonal(&self, a: &impl MatrixRef<T>) -> bool {
        self.zero_outside(a, |i, j| i != j)
    }

    /// Diagonal with ones on the diagonal.
    pub fn is_identity(&self, a: &impl MatrixRef<T>) -> bool {
        self.is_diagonal(a) && self.unit_diagonal(a)
    }

    fn unit_diagonal(&self, a: &impl MatrixRef<T>) -> bool {
        let n = a.nrows().min(a.ncols());
        (0..n).all(|i| self.near(*a.get(i, i), T::one()))
    }

    /// Every cell is zero.
    pub fn is_zero(&self, a: &impl MatrixRef<T>) -> bool {
        self.zero_outside(a, |_, _| true)
    }

    /// Every cell above the diagonal is zero.
    pub fn is_lower_triangular(&self, a: &impl MatrixRef<T>) -> bool {
        self.zero_outside(a, |i, j| j > i)
    }

    /// Every cell below the diagonal is zero.
    pub fn is_upper_triangular(&self, a: &impl MatrixRef<T>) -> bool {
        self.zero_outside(a, |i, j| i > j)
    }

    /// Lower or upper triangular.
    pub fn is_triangular(&self, a: &impl MatrixRef<T>) -> bool {
        self.is_lower_triangular(a) || self.is_upper_triangular(a)
    }

    /// Lower triangular with a zero diagonal.
    pub fn is_strictly_lower_triangular(&self, a: &impl MatrixRef<T>) -> bool {
        self.zero_outside(a, |i, j| j >= i)
    }

    /// Upper triangular with a zero diagonal.
    pub fn is_strictly_upper_triangular(&self, a: &impl MatrixRef<T>) -> bool {
        self.zero_outside(a, |i, j| i >= j)
    }

    /// Strictly lower or strictly upper triangular.
    pub fn is_strictly_triangular(&self, a: &impl MatrixRef<T>) -> bool {
        self.is_strictly_lower_triangular(a) || self.is_strictly_upper_triangular(a)
    }

    /// Triangular with ones on the diagonal.
    pub fn is_unit_triangular(&self, a: &impl MatrixRef<T>) -> bool {
        self.is_triangular(a) && self.unit_diagonal(a)
    }

    /// Every cell with `|i - j| > 1` is zero.
    pub fn is_tridiagonal(&self, a: &impl MatrixRef<T>) -> bool {
        self.zero_outside(a, |i, j| i > j + 1 || j > i + 1)
    }

    /// Non-zeros only on the diagonal and the first superdiagonal.
    pub fn is_upper_bidiagonal(&self, a: &impl MatrixRef<T>) -> bool {
        self.zero_outside(a, |i, j| i > j || j > i + 1)
    }

    /// Non-zeros only on the diagonal and the first subdiagonal.
    pub fn is_lower_bidiagonal(&self, a: &impl MatrixRef<T>) -> bool {
        self.zero_outside(a, |i, j| j > i || i > j + 1)
    }

    // ── Tolerance-free predicates ───────────────────────────────────

    /// `|a[i][i]|` exceeds the absolute sum of the other cells in row `i`,
    /// for every row of the leading `min(m, n)` block.
    pub fn is_diagonally_dominant_by_row(&self, a: &impl MatrixRef<T>) -> bool {
        let min = a.nrows().min(a.ncols());
        (0..min).all(|i| {
            let diag = a.get(i, i).abs();
            let sum = (0..a.ncols()).fold(T::zero(), |acc, j| acc + a.get(i, j).abs());
            diag + diag > sum
        })
    }

    /// `|a[j][j]|` exceeds the absolute sum of the other cells in column `j`.
    pub fn is_diagonally_dominant_by_column(&self, a: &impl MatrixRef<T>) -> bool {
        let min = a.nrows().min(a.ncols());
        (0..min).all(|j| {
            let diag = a.get(j, j).abs();
            let sum = (0..a.nrows()).fold(T::zero(), |acc, i| acc + a.get(i, j).abs());
            diag + diag > sum
        })
    }

    /// Every cell `>= 0`.
    pub fn is_non_negative(&self, a: &impl MatrixRef<T>) -> bool {
        (0..a.nrows()).all(|i| (0..a.ncols()).all(|j| *a.get(i, j) >= T::zero()))
    }

    /// Every cell `> 0`.
    pub fn is_positive(&self, a: &impl MatrixRef<T>) -> bool {
        (0..a.nrows()).all(|i| (0..a.ncols()).all(|j| *a.get(i, j) > T::zero()))
    }

    // ── Square-only predicates ──────────────────────────────────────

    /// `a == aᵗ` within tolerance.
    pub fn is_symmetric(&self, a: &impl MatrixRef<T>) -> Result<bool> {
        self.check_square(a)?;
        let n = a.nrows();
        for i in 0..n {
            for j in 0..i {
                if !self.near(*a.get(i, j), *a.get(j, i)) {
                    return Ok(false);
                }
            }
        }
        Ok(true)
    }

    /// `a == -aᵗ` within tolerance (so the diagonal is zero).
    pub fn is_skew_symmetric(&self, a: &impl MatrixRef<T>) -> Result<bool> {
        self.check_square(a)?;
        let n = a.nrows();
        for i in 0..n {
            for j in 0..=i {
                if !self.near(*a.get(i, j), -*a.get(j, i)) {
                    return Ok(false);
                }
            }
        }
        Ok(true)
    }

    /// `a · aᵗ == I` within tolerance.
    pub fn is_orthogonal(&self, a: &impl MatrixRef<T>) -> Result<bool> {
        self.check_square(a)?;
        let n = a.nrows();
        for i in 0..n {
            for j in 0..n {
                let mut dot = T::zero();
                for k in 0..n {
                    dot = dot + *a.get(i, k) * *a.get(j, k);
                }
                let expected = if i == j { T::one() } else { T::zero() };
                if !self.near(dot, expected) {
                    return Ok(false);
                }
            }
        }
        Ok(true)
    }

    /// `|det(a)| < tolerance`, with the determinant from an LU factorisation.
    ///
    /// ```
    /// use linfactor::{Matrix, Property};
    /// let p = Property::<f64>::DEFAULT;
    /// assert!(p.is_singular(&Matrix::from_rows(2, 2, &[1.0, 2.0, 2.0, 4.0])).unwrap());
    /// assert!(!p.is_singular(&Matrix::<f64>::identity(3)).unwrap());
    /// assert!(p.is_singular(&Matrix::<f64>::zeros(2, 3)).is_err());
    /// ```
    pub fn is_singular(&self, a: &impl MatrixRef<T>) -> Result<bool> {
        self.check_square(a)?;
        let det = LuDecomposition::new(a).det()?;
        Ok(!(det.abs() >= self.tolerance))
    }

    /// Largest `k` such that some cell `a[i + k][i]` is non-zero; 0 when
    /// nothing below the diagonal is non-zero.
    pub fn lower_bandwidth(&self, a: &impl MatrixRef<T>) -> Result<usize> {
        self.check_square(a)?;
        let n = a.nrows();
        for k in (1..n).rev() {
            if (0..n - k).any(|i| !self.is_small(*a.get(i + k, i))) {
                return Ok(k);
            }
        }
        Ok(0)
    }

    /// Largest `k` such that some cell `a[i][i + k]` is non-zero; 0 when
    /// nothing above the diagonal is non-zero.
    pub fn upper_bandwidth(&self, a: &impl MatrixRef<T>) -> Result<usize> {
        self.check_square(a)?;
        let n = a.nrows();
        for k in (1..n).rev() {
            if (0..n - k).any(|i| !self.is_small(*a.get(i, i + k))) {
                return Ok(k);
            }
        }
        Ok(0)
    }

    /// `1 + ` the widest offset `k` with a non-zero cell at `(i + k, i)` or
    /// `(i, i + k)`. Diagonal and zero matrices give 1, tridiagonal 2.
    pub fn semi_bandwidth(&self, a: &impl MatrixRef<T>) -> Result<usize> {
        self.check_square(a)?;
        let n = a.nrows();
        for k in (0..n).rev() {
            for i in 0..n - k {
                let j = i + k;
                if !self.is_small(*a.get(j, i)) || !self.is_small(*a.get(i, j)) {
                    return Ok(k + 1);
                }
            }
        }
        Ok(1)
    }

    // ── Comparisons ─────────────────────────────────────────────────

    /// Every cell equals `value` within tolerance.
    pub fn equals_value(&self, a: &impl MatrixRef<T>, value: T) -> bool {
        (0..a.nrows()).all(|i| (0..a.ncols()).all(|j| self.near(*a.get(i, j), value)))
    }

    /// Same shape and every cell pair equal within tolerance. `NaN` equals
    /// `NaN`.
    pub fn equals(&self, a: &impl MatrixRef<T>, b: &impl MatrixRef<T>) -> bool {
        if a.nrows() != b.nrows() || a.ncols() != b.ncols() {
            return false;
        }
        (0..a.nrows()).all(|i| (0..a.ncols()).all(|j| self.near(*a.get(i, j), *b.get(i, j))))
    }

    /// Fraction of cells that are not exactly zero. Zero for an empty matrix.
    pub fn density(&self, a: &impl MatrixRef<T>) -> T {
        let size = a.nrows() * a.ncols();
        if size == 0 {
            return T::zero();
        }
        let mut nonzero = 0usize;
        for i in 0..a.nrows() {
            for j in 0..a.ncols() {
                if *a.get(i, j) != T::zero() {
                    nonzero += 1;
                }
            }
        }
        T::from_usize(nonzero) / T::from_usize(size)
    }

    // ── Repair ──────────────────────────────────────────────────────

    /// Overwrite the diagonal so the matrix is strictly diagonally dominant
    /// by row and by column, hence nonsingular.
    ///
    /// The diagonal is zeroed, then `a[i][i] = max(row_abs_sum_i,
    /// col_abs_sum_i) + (i + 1)`.
    ///
    /// ```
    /// use linfactor::{Matrix, Property};
    /// let mut a = Matrix::from_rows(2, 2, &[0.0_f64, 3.0, -5.0, 0.0]);
    /// let p = Property::<f64>::DEFAULT;
    /// p.generate_non_singular(&mut a).unwrap();
    /// assert_eq!(a[(0, 0)], 6.0);
    /// assert_eq!(a[(1, 1)], 7.0);
    /// assert!(p.is_diagonally_dominant_by_row(&a));
    /// ```
    pub fn generate_non_singular(&self, a: &mut impl MatrixMut<T>) -> Result<()> {
        self.check_square(a)?;
        let n = a.nrows();
        for i in 0..n {
            *a.get_mut(i, i) = T::zero();
        }
        for i in 0..n {
            let mut row_sum = T::zero();
            let mut col_sum = T::zero();
            for k in 0..n {
                row_sum = row_sum + a.get(i, k).abs();
                col_sum = col_sum + a.get(k, i).abs();
            }
            *a.get_mut(i, i) = row_sum.max(col_sum) + T::from_usize(i + 1);
        }
        Ok(())
    }

    // ── Report ──────────────────────────────────────────────────────

    /// Summary of every predicate for `a`.
    pub fn report(&self, a: &impl MatrixRef<T>) -> PropertyReport {
        fn flag(b: bool) -> String {
            b.to_string()
        }
        fn square<V: ToString>(r: Result<V>) -> String {
            match r {
                Ok(v) => v.to_string(),
                Err(e) => e.to_string(),
            }
        }

        let entries = vec![
            ("density", self.density(a).to_string()),
            ("isDiagonal", flag(self.is_diagonal(a))),
            ("isDiagonallyDominantByColumn", flag(self.is_diagonally_dominant_by_column(a))),
            ("isDiagonallyDominantByRow", flag(self.is_diagonally_dominant_by_row(a))),
            ("isIdentity", flag(self.is_identity(a))),
            ("isLowerBidiagonal", flag(self.is_lower_bidiagonal(a))),
            ("isLowerTriangular", flag(self.is_lower_triangular(a))),
            ("isNonNegative", flag(self.is_non_negative(a))),
            ("isOrthogonal", square(self.is_orthogonal(a))),
            ("isPositive", flag(self.is_positive(a))),
            ("isSingular", square(self.is_singular(a))),
            ("isSkewSymmetric", square(self.is_skew_symmetric(a))),
            ("isSquare", flag(self.is_square(a))),
            ("isStrictlyLowerTriangular", flag(self.is_strictly_lower_triangular(a))),
            ("isStrictlyTriangular", flag(self.is_strictly_triangular(a))),
            ("isStrictlyUpperTriangular", flag(self.is_strictly_upper_triangular(a))),
            ("isSymmetric", square(self.is_symmetric(a))),
            ("isTriangular", flag(self.is_triangular(a))),
            ("isTridiagonal", flag(self.is_tridiagonal(a))),
            ("isUnitTriangular", flag(self.is_unit_triangular(a))),
            ("isUpperBidiagonal", flag(self.is_upper_bidiagonal(a))),
            ("isUpperTriangular", flag(self.is_upper_triangular(a))),
            ("isZero", flag(self.is_zero(a))),
            ("lowerBandwidth", square(self.lower_bandwidth(a))),
            ("semiBandwidth", square(self.semi_bandwidth(a))),
            ("upperBandwidth", square(self.upper_bandwidth(a))),
        ];
        PropertyReport { entries }
    }
}

/// Outcome of every [`Property`] predicate for one matrix.
///
/// Square-only predicates evaluated on a non-square matrix show the error
/// message instead of a value.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyReport {
    entries: Vec<(&'static str, String)>,
}

impl PropertyReport {
    /// Value recorded for `name`, e.g. `"isSymmetric"`.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.as_str())
    }

    /// All `(name, value)` pairs in alphabetical order.
    pub fn entries(&self) -> &[(&'static str, String)] {
        &self.entries
    }
}

impl fmt::Display for PropertyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self.entries.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
        for (idx, (name, value)) in self.entries.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{:>width$}: {}", name, value, width = width)?;
        }
        Ok(())
    }
}

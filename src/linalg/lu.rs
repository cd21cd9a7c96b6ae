use core::fmt;

use log::debug;

use crate::error::{LinalgError, Result};
use crate::traits::{FloatScalar, MatrixRef};
use crate::{Matrix, Vector};

/// Column sparsity cut-off divisor: a column with fewer than `m / CUT_OFF`
/// non-zeros is eliminated with index-restricted dot products.
const CUT_OFF: usize = 10;

/// LU decomposition with partial pivoting of an `m x n` matrix.
///
/// Produces a unit lower-triangular `L` (`m x min(m, n)`), an upper
/// triangular `U` (`min(m, n) x n`) and a row permutation `piv` with
/// `A[piv, :] = L * U`. The factorisation always succeeds; singularity is
/// a state queried with [`is_nonsingular`](Self::is_nonsingular), and
/// [`det`](Self::det) / [`solve`](Self::solve) act on it.
///
/// Elimination is left-looking (Crout): each column receives all earlier
/// transformations at once. Columns with few non-zeros use dot products
/// restricted to their non-zero rows, which gives the same result as the
/// dense product.
///
/// # Example
///
/// ```
/// use linfactor::{LuDecomposition, Matrix, Vector};
///
/// let a = Matrix::from_rows(3, 3, &[
///     2.0_f64, 1.0, -1.0,
///     -3.0, -1.0, 2.0,
///     -2.0, 1.0, 2.0,
/// ]);
/// let lu = LuDecomposition::new(&a);
/// assert!(lu.is_nonsingular());
/// assert!((lu.det().unwrap() - (-1.0)).abs() < 1e-12);
///
/// let x = lu.solve(&Vector::from_slice(&[8.0, -11.0, -3.0])).unwrap();
/// assert!((x[0] - 2.0).abs() < 1e-12);
/// assert!((x[1] - 3.0).abs() < 1e-12);
/// assert!((x[2] - (-1.0)).abs() < 1e-12);
/// ```
#[derive(Debug, Clone)]
pub struct LuDecomposition<T> {
    lu: Matrix<T>,
    piv: Vec<usize>,
    pivsign: i32,
    nonsingular: bool,
    tolerance: T,
}

impl<T: FloatScalar> Default for LuDecomposition<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T: FloatScalar> LuDecomposition<T> {
    /// Decomposition of the `0 x 0` matrix, ready for [`decompose`](Self::decompose).
    /// Pivots are compared against machine epsilon.
    pub fn empty() -> Self {
        Self::with_tolerance(T::epsilon())
    }

    /// Empty decomposition whose nonsingularity test uses `tolerance`
    /// instead of machine epsilon.
    pub fn with_tolerance(tolerance: T) -> Self {
        Self {
            lu: Matrix::zeros(0, 0),
            piv: Vec::new(),
            pivsign: 1,
            nonsingular: true,
            tolerance: tolerance.abs(),
        }
    }

    /// Decompose a copy of `a`.
    pub fn new(a: &impl MatrixRef<T>) -> Self {
        let mut lu = Self::empty();
        lu.decompose(a);
        lu
    }

    /// Replace the held state with the factorisation of a copy of `a`.
    pub fn decompose(&mut self, a: &impl MatrixRef<T>) {
        self.decompose_with_cutoff(a, a.nrows() / CUT_OFF);
    }

    /// Elimination with an explicit sparsity cut-off. A column is treated as
    /// sparse when it holds fewer than `max_cardinality` non-zeros, so 0
    /// forces every column dense and `usize::MAX` forces every column sparse.
    pub(crate) fn decompose_with_cutoff(&mut self, a: &impl MatrixRef<T>, max_cardinality: usize) {
        let mut lu = Matrix::copy_of(a);
        let (m, n) = lu.shape();
        let mut piv: Vec<usize> = (0..m).collect();
        let mut pivsign = 1;

        let mut col = vec![T::zero(); m];
        let mut sparse_columns = 0usize;

        for j in 0..n {
            for (i, c) in col.iter_mut().enumerate() {
                *c = lu[(i, j)];
            }

            let mut nonzero: Vec<usize> = col
                .iter()
                .enumerate()
                .filter(|(_, &x)| x != T::zero())
                .map(|(i, _)| i)
                .take(max_cardinality)
                .collect();
            let sparse = nonzero.len() < max_cardinality;
            if sparse {
                sparse_columns += 1;
            }

            // Apply previous transformations to column j.
            for i in 0..m {
                let kmax = i.min(j);
                let row = &lu.row_slice(i)[..kmax];
                let s = if sparse {
                    nonzero
                        .iter()
                        .take_while(|&&k| k < kmax)
                        .fold(T::zero(), |acc, &k| acc + row[k] * col[k])
                } else {
                    row.iter()
                        .zip(col.iter())
                        .fold(T::zero(), |acc, (&l, &c)| acc + l * c)
                };
                let before = col[i];
                let after = before - s;
                col[i] = after;
                lu[(i, j)] = after;

                if sparse {
                    if before == T::zero() && after != T::zero() {
                        if let Err(pos) = nonzero.binary_search(&i) {
                            nonzero.insert(pos, i);
                        }
                    } else if before != T::zero() && after == T::zero() {
                        if let Ok(pos) = nonzero.binary_search(&i) {
                            nonzero.remove(pos);
                        }
                    }
                }
            }

            if j >= m {
                continue;
            }

            // Pivot: first row of maximal magnitude in [j, m).
            let mut p = j;
            for i in (j + 1)..m {
                if col[i].abs() > col[p].abs() {
                    p = i;
                }
            }
            if p != j {
                lu.swap_rows(p, j);
                piv.swap(p, j);
                pivsign = -pivsign;
            }

            let jj = lu[(j, j)];
            if jj != T::zero() {
                let multiplier = T::one() / jj;
                for i in (j + 1)..m {
                    lu[(i, j)] = lu[(i, j)] * multiplier;
                }
            }
        }

        debug!(
            "lu {}x{}: {} of {} columns eliminated sparse",
            m, n, sparse_columns, n
        );
        self.install(lu, piv, pivsign);
    }

    /// Decompose a square matrix of known semi-bandwidth.
    ///
    /// Semi-bandwidth 2 (tridiagonal) runs a forward recurrence without
    /// pivoting; semi-bandwidth 0 or 1 (zero or diagonal) needs no
    /// elimination. Anything else, including non-square input, uses the
    /// general algorithm.
    ///
    /// ```
    /// use linfactor::{LuDecomposition, Matrix};
    /// let a = Matrix::from_rows(3, 3, &[
    ///     2.0_f64, -1.0, 0.0,
    ///     -1.0, 2.0, -1.0,
    ///     0.0, -1.0, 2.0,
    /// ]);
    /// let mut lu = LuDecomposition::empty();
    /// lu.decompose_banded(&a, 2);
    /// assert_eq!(lu.pivot(), &[0, 1, 2]);
    /// assert!((lu.det().unwrap() - 4.0).abs() < 1e-12);
    /// ```
    pub fn decompose_banded(&mut self, a: &impl MatrixRef<T>, semi_bandwidth: usize) {
        if a.nrows() != a.ncols() || semi_bandwidth > 2 {
            debug!(
                "lu {}x{}: semi-bandwidth {} has no banded path, using general elimination",
                a.nrows(),
                a.ncols(),
                semi_bandwidth
            );
            self.decompose(a);
            return;
        }

        let mut lu = Matrix::copy_of(a);
        let n = lu.nrows();
        if semi_bandwidth == 2 {
            for i in 1..n {
                let l = lu[(i, i - 1)] / lu[(i - 1, i - 1)];
                lu[(i, i - 1)] = l;
                lu[(i, i)] = lu[(i, i)] - l * lu[(i - 1, i)];
            }
        }
        self.install(lu, (0..n).collect(), 1);
    }

    /// Install an externally produced combined `L\U` buffer with its pivot
    /// vector. The pivot sign is derived from the permutation parity.
    pub fn set_lu(&mut self, lu: Matrix<T>, piv: Vec<usize>) -> Result<()> {
        let m = lu.nrows();
        if piv.len() != m {
            return Err(LinalgError::InvalidPermutation {
                expected: m,
                got: piv.len(),
            });
        }
        let pivsign = permutation_sign(&piv).ok_or(LinalgError::InvalidArgument(
            "pivot vector is not a permutation",
        ))?;
        self.install(lu, piv, pivsign);
        Ok(())
    }

    fn install(&mut self, lu: Matrix<T>, piv: Vec<usize>, pivsign: i32) {
        let min = lu.nrows().min(lu.ncols());
        self.nonsingular = (0..min).all(|j| lu[(j, j)].abs() > self.tolerance);
        self.lu = lu;
        self.piv = piv;
        self.pivsign = pivsign;
    }

    /// Whether every diagonal entry of `U` exceeds the tolerance in magnitude.
    #[inline]
    pub fn is_nonsingular(&self) -> bool {
        self.nonsingular
    }

    /// Tolerance used by the nonsingularity test.
    #[inline]
    pub fn tolerance(&self) -> T {
        self.tolerance
    }

    /// Determinant. Zero when singular.
    pub fn det(&self) -> Result<T> {
        self.require_square()?;
        if !self.nonsingular {
            return Ok(T::zero());
        }
        let n = self.lu.nrows();
        let mut det = if self.pivsign < 0 { -T::one() } else { T::one() };
        for j in 0..n {
            det = det * self.lu[(j, j)];
        }
        Ok(det)
    }

    fn require_square(&self) -> Result<()> {
        if self.lu.is_square() {
            Ok(())
        } else {
            Err(LinalgError::NotSquare {
                rows: self.lu.nrows(),
                cols: self.lu.ncols(),
            })
        }
    }

    fn require_solvable(&self, rows: usize, cols: usize) -> Result<()> {
        self.require_square()?;
        let m = self.lu.nrows();
        if rows != m {
            return Err(LinalgError::shape((m, cols), (rows, cols)));
        }
        if !self.nonsingular {
            return Err(LinalgError::Singular);
        }
        Ok(())
    }

    /// Solve `A x = b` for a vector right-hand side.
    pub fn solve(&self, b: &Vector<T>) -> Result<Vector<T>> {
        let mut x = b.clone();
        self.solve_in_place(x.as_mut_slice())?;
        Ok(x)
    }

    /// Solve `A x = b`, overwriting `b` with `x`.
    pub fn solve_in_place(&self, b: &mut [T]) -> Result<()> {
        self.require_solvable(b.len(), 1)?;
        let n = self.lu.nrows();

        let permuted: Vec<T> = self.piv.iter().map(|&p| b[p]).collect();
        b.copy_from_slice(&permuted);

        // L y = P b, skipping zero multipliers.
        for k in 0..n {
            let f = b[k];
            if f != T::zero() {
                for i in (k + 1)..n {
                    let v = self.lu[(i, k)];
                    if v != T::zero() {
                        b[i] = b[i] - f * v;
                    }
                }
            }
        }

        // U x = y
        for k in (0..n).rev() {
            b[k] = b[k] / self.lu[(k, k)];
            let f = b[k];
            if f != T::zero() {
                for i in 0..k {
                    let v = self.lu[(i, k)];
                    if v != T::zero() {
                        b[i] = b[i] - f * v;
                    }
                }
            }
        }
        Ok(())
    }

    /// Solve `A X = B` for a matrix right-hand side.
    pub fn solve_matrix(&self, b: &Matrix<T>) -> Result<Matrix<T>> {
        let mut x = b.clone();
        self.solve_matrix_in_place(&mut x)?;
        Ok(x)
    }

    /// Solve `A X = B`, overwriting `B` with `X`.
    ///
    /// Row operations on `B` are restricted to the non-zero columns of the
    /// pivot row when it holds fewer than `ncols / 10` non-zeros.
    pub fn solve_matrix_in_place(&self, b: &mut Matrix<T>) -> Result<()> {
        self.require_solvable(b.nrows(), b.ncols())?;
        let n = self.lu.nrows();
        let nx = b.ncols();
        let max_cardinality = nx / CUT_OFF;

        let permuted: Vec<T> = self
            .piv
            .iter()
            .flat_map(|&p| b.row_slice(p).iter().copied())
            .collect();
        b.as_mut_slice().copy_from_slice(&permuted);

        let sparse_columns = |row: &[T]| -> Option<Vec<usize>> {
            let nz: Vec<usize> = row
                .iter()
                .enumerate()
                .filter(|(_, &x)| x != T::zero())
                .map(|(j, _)| j)
                .take(max_cardinality)
                .collect();
            (nz.len() < max_cardinality).then_some(nz)
        };

        // L Y = P B
        for k in 0..n {
            let nz = sparse_columns(b.row_slice(k));
            for i in (k + 1)..n {
                let multiplier = self.lu[(i, k)];
                if multiplier != T::zero() {
                    row_axpy(b, i, k, multiplier, nz.as_deref());
                }
            }
        }

        // U X = Y
        for k in (0..n).rev() {
            let d = self.lu[(k, k)];
            for x in b.row_slice_mut(k) {
                *x = *x / d;
            }
            let nz = sparse_columns(b.row_slice(k));
            for i in 0..k {
                let multiplier = self.lu[(i, k)];
                if multiplier != T::zero() {
                    row_axpy(b, i, k, multiplier, nz.as_deref());
                }
            }
        }
        Ok(())
    }

    /// Inverse of the factored square matrix.
    pub fn inverse(&self) -> Result<Matrix<T>> {
        self.require_square()?;
        self.solve_matrix(&Matrix::identity(self.lu.nrows()))
    }

    /// Unit lower-triangular factor, `m x min(m, n)`.
    pub fn l(&self) -> Matrix<T> {
        let (m, n) = self.lu.shape();
        Matrix::from_fn(m, m.min(n), |i, j| {
            if i > j {
                self.lu[(i, j)]
            } else if i == j {
                T::one()
            } else {
                T::zero()
            }
        })
    }

    /// Upper-triangular factor, `min(m, n) x n`.
    pub fn u(&self) -> Matrix<T> {
        let (m, n) = self.lu.shape();
        Matrix::from_fn(m.min(n), n, |i, j| if i <= j { self.lu[(i, j)] } else { T::zero() })
    }

    /// Combined `L\U` buffer: `L` strictly below the diagonal, `U` on and
    /// above it.
    #[inline]
    pub fn lu(&self) -> &Matrix<T> {
        &self.lu
    }

    /// Row `i` of the factored matrix came from row `pivot()[i]` of the input.
    #[inline]
    pub fn pivot(&self) -> &[usize] {
        &self.piv
    }

    /// `+1` for an even number of row interchanges, `-1` for odd.
    #[inline]
    pub fn pivot_sign(&self) -> i32 {
        self.pivsign
    }
}

/// `b[dst, :] -= alpha * b[src, :]`, optionally only on the listed columns.
fn row_axpy<T: FloatScalar>(b: &mut Matrix<T>, dst: usize, src: usize, alpha: T, columns: Option<&[usize]>) {
    let ncols = b.ncols();
    let data = b.as_mut_slice();
    let (src_row, dst_row) = if src < dst {
        let (head, tail) = data.split_at_mut(dst * ncols);
        (&head[src * ncols..(src + 1) * ncols], &mut tail[..ncols])
    } else {
        let (head, tail) = data.split_at_mut(src * ncols);
        (&tail[..ncols], &mut head[dst * ncols..(dst + 1) * ncols])
    };
    match columns {
        Some(cols) => {
            for &j in cols {
                dst_row[j] = dst_row[j] - alpha * src_row[j];
            }
        }
        None => {
            for (d, &s) in dst_row.iter_mut().zip(src_row) {
                *d = *d - alpha * s;
            }
        }
    }
}

/// `+1` / `-1` parity of `perm`, or `None` if it is not a permutation of
/// `0..perm.len()`.
fn permutation_sign(perm: &[usize]) -> Option<i32> {
    let n = perm.len();
    let mut seen = vec![false; n];
    let mut sign = 1;
    for start in 0..n {
        if seen[start] {
            continue;
        }
        let mut len = 0usize;
        let mut i = start;
        while !seen[i] {
            seen[i] = true;
            i = *perm.get(i).filter(|&&p| p < n)?;
            len += 1;
        }
        if i != start {
            return None;
        }
        if len % 2 == 0 {
            sign = -sign;
        }
    }
    Some(sign)
}

impl<T: FloatScalar> fmt::Display for LuDecomposition<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn or_error<V: fmt::Display>(r: Result<V>) -> String {
            match r {
                Ok(v) => v.to_string(),
                Err(e) => format!("error: {}", e),
            }
        }

        writeln!(f, "LU decomposition of {}x{} matrix", self.lu.nrows(), self.lu.ncols())?;
        writeln!(f, "nonsingular: {}", self.nonsingular)?;
        writeln!(f, "det: {}", or_error(self.det()))?;
        writeln!(f, "pivot: {:?}", self.piv)?;
        writeln!(f, "L:\n{}", self.l())?;
        writeln!(f, "U:\n{}", self.u())?;
        write!(f, "inverse:\n{}", or_error(self.inverse()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-12;

    fn assert_near(a: f64, b: f64, tol: f64, msg: &str) {
        assert!((a - b).abs() < tol, "{}: {} vs {} (diff {})", msg, a, b, (a - b).abs());
    }

    fn sample() -> Matrix<f64> {
        Matrix::from_rows(4, 4, &[
            2.0, 1.0, 1.0, 0.0,
            4.0, 3.0, 3.0, 1.0,
            8.0, 7.0, 9.0, 5.0,
            6.0, 7.0, 9.0, 8.0,
        ])
    }

    fn reconstruct(lu: &LuDecomposition<f64>, a: &Matrix<f64>) {
        let prod = lu.l().matmul(&lu.u());
        for (i, &p) in lu.pivot().iter().enumerate() {
            for j in 0..a.ncols() {
                assert_near(prod[(i, j)], a[(p, j)], TOL, &format!("PA[{},{}]", i, j));
            }
        }
    }

    #[test]
    fn reconstruct_square() {
        let a = sample();
        let lu = LuDecomposition::new(&a);
        assert!(lu.is_nonsingular());
        reconstruct(&lu, &a);
        assert_eq!(lu.l().shape(), (4, 4));
    }

    #[test]
    fn reconstruct_rectangular() {
        let tall = Matrix::from_fn(5, 3, |i, j| ((i * 3 + j * 7) % 11) as f64 - 4.0);
        let lu = LuDecomposition::new(&tall);
        assert_eq!(lu.l().shape(), (5, 3));
        assert_eq!(lu.u().shape(), (3, 3));
        reconstruct(&lu, &tall);
        assert_eq!(lu.det(), Err(LinalgError::NotSquare { rows: 5, cols: 3 }));

        let wide = tall.transpose();
        let lu = LuDecomposition::new(&wide);
        assert_eq!(lu.l().shape(), (3, 3));
        assert_eq!(lu.u().shape(), (3, 5));
        reconstruct(&lu, &wide);
    }

    #[test]
    fn pivot_picks_first_maximum() {
        let a = Matrix::from_rows(3, 1, &[1.0, -3.0, 3.0]);
        let lu = LuDecomposition::new(&a);
        assert_eq!(lu.pivot(), &[1, 0, 2]);
        assert_eq!(lu.pivot_sign(), -1);
    }

    #[test]
    fn det_and_swaps() {
        let id = Matrix::<f64>::identity(3);
        let mut swapped = id.clone();
        swapped.swap_rows(0, 2);
        assert_near(LuDecomposition::new(&id).det().unwrap(), 1.0, TOL, "det I");
        assert_near(LuDecomposition::new(&swapped).det().unwrap(), -1.0, TOL, "det swap");
        assert_near(LuDecomposition::new(&sample()).det().unwrap(), 8.0, 1e-10, "det sample");
    }

    #[test]
    fn singular_state() {
        let a = Matrix::from_rows(3, 3, &[1.0, 2.0, 3.0, 2.0, 4.0, 6.0, 1.0, 0.0, 1.0]);
        let lu = LuDecomposition::new(&a);
        assert!(!lu.is_nonsingular());
        assert_eq!(lu.det().unwrap(), 0.0);
        assert_eq!(
            lu.solve(&Vector::from_slice(&[1.0, 2.0, 3.0])).unwrap_err(),
            LinalgError::Singular
        );
        assert_eq!(lu.inverse().unwrap_err(), LinalgError::Singular);
    }

    #[test]
    fn tolerance_controls_singularity() {
        let a = Matrix::from_rows(2, 2, &[1.0, 0.0, 0.0, 1e-6]);
        let mut lu = LuDecomposition::with_tolerance(1e-3);
        lu.decompose(&a);
        assert!(!lu.is_nonsingular());
        assert!(LuDecomposition::new(&a).is_nonsingular());
    }

    #[test]
    fn solve_shape_mismatch() {
        let lu = LuDecomposition::new(&sample());
        let err = lu.solve(&Vector::from_slice(&[1.0, 2.0])).unwrap_err();
        assert_eq!(err, LinalgError::shape((4, 1), (2, 1)));
        let err = lu.solve_matrix(&Matrix::zeros(3, 2)).unwrap_err();
        assert_eq!(err, LinalgError::shape((4, 2), (3, 2)));
    }

    #[test]
    fn solve_vector_and_matrix_agree() {
        let a = sample();
        let lu = LuDecomposition::new(&a);
        let b = Matrix::from_fn(4, 3, |i, j| (i as f64) - 2.0 * (j as f64) + 1.0);
        let x = lu.solve_matrix(&b).unwrap();
        for j in 0..3 {
            let xj = lu.solve(&b.column(j)).unwrap();
            for i in 0..4 {
                assert_near(x[(i, j)], xj[i], 1e-10, "column solve");
            }
        }
        let ax = a.matmul(&x);
        for i in 0..4 {
            for j in 0..3 {
                assert_near(ax[(i, j)], b[(i, j)], 1e-10, "A X = B");
            }
        }
    }

    #[test]
    fn sparse_rhs_rows_take_restricted_path() {
        // 40 columns with one non-zero per row: every row is sparse.
        let a = sample();
        let lu = LuDecomposition::new(&a);
        let b = Matrix::from_fn(4, 40, |i, j| if j == i * 7 { 1.0 + i as f64 } else { 0.0 });
        let x = lu.solve_matrix(&b).unwrap();
        let ax = a.matmul(&x);
        for i in 0..4 {
            for j in 0..40 {
                assert_near(ax[(i, j)], b[(i, j)], 1e-10, "sparse rhs");
            }
        }
    }

    #[test]
    fn dense_and_sparse_elimination_agree() {
        let n = 30;
        let a = Matrix::from_fn(n, n, |i, j| {
            if i == j {
                4.0 + i as f64
            } else if (i * 31 + j * 17) % 13 == 0 {
                ((i + 2 * j) % 7) as f64 - 3.0
            } else {
                0.0
            }
        });
        let mut dense = LuDecomposition::empty();
        dense.decompose_with_cutoff(&a, 0);
        let mut sparse = LuDecomposition::empty();
        sparse.decompose_with_cutoff(&a, usize::MAX);
        let auto = LuDecomposition::new(&a);
        assert_eq!(dense.lu(), sparse.lu());
        assert_eq!(dense.lu(), auto.lu());
        assert_eq!(dense.pivot(), sparse.pivot());
        assert_eq!(dense.pivot_sign(), sparse.pivot_sign());
    }

    #[test]
    fn banded_tridiagonal() {
        let n = 6;
        let a = Matrix::from_fn(n, n, |i, j| {
            if i == j {
                4.0
            } else if i + 1 == j || j + 1 == i {
                -1.0
            } else {
                0.0
            }
        });
        let mut banded = LuDecomposition::empty();
        banded.decompose_banded(&a, 2);
        assert_eq!(banded.pivot(), &[0, 1, 2, 3, 4, 5]);
        assert_eq!(banded.pivot_sign(), 1);
        let prod = banded.l().matmul(&banded.u());
        for i in 0..n {
            for j in 0..n {
                assert_near(prod[(i, j)], a[(i, j)], TOL, "LU = A");
            }
        }
        let general = LuDecomposition::new(&a);
        assert_near(banded.det().unwrap(), general.det().unwrap(), 1e-9, "det");
    }

    #[test]
    fn banded_falls_back() {
        let a = sample();
        let mut banded = LuDecomposition::empty();
        banded.decompose_banded(&a, 4);
        assert_eq!(banded.lu(), LuDecomposition::new(&a).lu());

        let diag = Matrix::from_diagonal(&[2.0, 3.0]);
        banded.decompose_banded(&diag, 1);
        assert_eq!(banded.lu(), &diag);
        assert_near(banded.det().unwrap(), 6.0, TOL, "diag det");
    }

    #[test]
    fn banded_on_rectangular_uses_general_path() {
        let a = Matrix::from_rows(4, 3, &[
            1.0, -1.0, 0.0,
            -1.0, 3.0, -1.0,
            0.0, -1.0, 5.0,
            0.0, 0.0, -1.0,
        ]);
        let general = LuDecomposition::new(&a);
        let mut banded = LuDecomposition::empty();
        banded.decompose_banded(&a, 2);
        assert_eq!(banded.lu(), general.lu());
        assert_eq!(banded.pivot(), general.pivot());
        assert_eq!(banded.pivot_sign(), general.pivot_sign());
        assert_eq!(banded.det().unwrap_err(), general.det().unwrap_err());
    }

    #[test]
    fn set_lu_derives_sign() {
        let mut lu = LuDecomposition::empty();
        lu.set_lu(Matrix::from_diagonal(&[2.0, 3.0, 1.0]), vec![1, 0, 2]).unwrap();
        assert_eq!(lu.pivot_sign(), -1);
        assert_near(lu.det().unwrap(), -6.0, TOL, "det");
        assert_eq!(
            lu.set_lu(Matrix::identity(3), vec![0, 1]),
            Err(LinalgError::InvalidPermutation { expected: 3, got: 2 })
        );
        assert!(lu.set_lu(Matrix::identity(3), vec![0, 0, 2]).is_err());
        lu.set_lu(Matrix::identity(3), vec![1, 2, 0]).unwrap();
        assert_eq!(lu.pivot_sign(), 1);
    }

    #[test]
    fn inverse_matches_identity_solve() {
        let a = sample();
        let inv = LuDecomposition::new(&a).inverse().unwrap();
        let prod = a.matmul(&inv);
        for i in 0..4 {
            for j in 0..4 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_near(prod[(i, j)], expected, 1e-10, "A A^-1");
            }
        }
    }

    #[test]
    fn display_report() {
        let s = LuDecomposition::new(&Matrix::<f64>::zeros(2, 3)).to_string();
        assert!(s.contains("nonsingular: false"));
        assert!(s.contains("error: matrix must be square"));
    }
}

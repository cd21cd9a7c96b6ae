//! High-level operations over dense matrices.
//!
//! [`Algebra`] bundles a [`Property`] (the tolerance used for structural
//! decisions) with a [`Blas`] backend (sequential by default, or
//! [`SmpBlas`](crate::SmpBlas) for block-parallel products) and routes each
//! request to the right decomposition.

use crate::dense::{norm, square};
use crate::error::{LinalgError, Result};
use crate::linalg::{LuDecomposition, QrDecomposition, SingularValueDecomposition};
use crate::permute;
use crate::property::Property;
use crate::smp::{Blas, SeqBlas};
use crate::traits::{FloatScalar, MatrixRef};
use crate::{Matrix, Vector};

/// Linear algebra façade.
///
/// ```
/// use linfactor::{Algebra, Matrix};
///
/// let alg = Algebra::standard();
/// let a = Matrix::from_rows(2, 2, &[4.0_f64, 1.0, 2.0, 3.0]);
/// let inv = alg.inverse(&a).unwrap();
/// let id = alg.mult(&a, &inv).unwrap();
/// assert!(alg.property().equals(&id, &Matrix::identity(2)));
/// assert_eq!(alg.trace(&a), 7.0);
/// assert!((alg.det(&a).unwrap() - 10.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone)]
pub struct Algebra<T, B = SeqBlas> {
    property: Property<T>,
    blas: B,
}

impl<T: FloatScalar> Algebra<T, SeqBlas> {
    /// Sequential algebra with the default tolerance (`1e-9`).
    pub fn standard() -> Self {
        Self::new(Property::standard())
    }

    /// Sequential algebra with the given classifier.
    pub fn new(property: Property<T>) -> Self {
        Self {
            property,
            blas: SeqBlas,
        }
    }
}

impl<T: FloatScalar> Default for Algebra<T, SeqBlas> {
    fn default() -> Self {
        Self::standard()
    }
}

impl<T: FloatScalar, B: Blas<T>> Algebra<T, B> {
    /// Algebra running its products on `blas`.
    pub fn with_blas(property: Property<T>, blas: B) -> Self {
        Self { property, blas }
    }

    #[inline]
    pub fn property(&self) -> &Property<T> {
        &self.property
    }

    #[inline]
    pub fn blas(&self) -> &B {
        &self.blas
    }

    /// Take back the backend.
    pub fn into_blas(self) -> B {
        self.blas
    }

    // ── Decompositions ──────────────────────────────────────────────

    /// LU decomposition of `a`.
    pub fn lu(&self, a: &impl MatrixRef<T>) -> LuDecomposition<T> {
        LuDecomposition::new(a)
    }

    /// QR decomposition of `a` (`m >= n`).
    pub fn qr(&self, a: &impl MatrixRef<T>) -> Result<QrDecomposition<T>> {
        QrDecomposition::new(a)
    }

    /// Singular value decomposition of `a` (`m >= n`).
    pub fn svd(&self, a: &impl MatrixRef<T>) -> Result<SingularValueDecomposition<T>> {
        SingularValueDecomposition::new(a)
    }

    /// SVD of `a`, or of `aᵗ` when `a` is wide. Same singular values.
    fn singular_values(&self, a: &Matrix<T>) -> Result<Vec<T>> {
        let svd = if a.nrows() >= a.ncols() {
            SingularValueDecomposition::with_options(a, false, false, true)?
        } else {
            SingularValueDecomposition::with_options(&a.view_dice(), false, false, true)?
        };
        Ok(svd.singular_values().to_vec())
    }

    // ── Solving ─────────────────────────────────────────────────────

    /// Inverse of a square `a`, or the least-squares pseudo-inverse
    /// otherwise.
    ///
    /// A diagonal `a` (within tolerance) is inverted cell by cell and fails
    /// with `Singular` when a diagonal magnitude is at most the tolerance.
    pub fn inverse(&self, a: &Matrix<T>) -> Result<Matrix<T>> {
        if a.is_square() && self.property.is_diagonal(a) {
            let tol = self.property.tolerance();
            let n = a.nrows();
            let mut inv = Matrix::zeros(n, n);
            for i in 0..n {
                let d = a[(i, i)];
                if !(d.abs() > tol) {
                    return Err(LinalgError::Singular);
                }
                inv[(i, i)] = T::one() / d;
            }
            return Ok(inv);
        }
        self.solve(a, &Matrix::identity(a.nrows()))
    }

    /// Solve `A X = B`.
    ///
    /// Square `A` goes through LU. Tall `A` gives the least-squares solution
    /// via QR; wide `A` gives the minimum-norm solution via QR of `Aᵗ`.
    pub fn solve(&self, a: &Matrix<T>, b: &Matrix<T>) -> Result<Matrix<T>> {
        let (m, n) = a.shape();
        if b.nrows() != m {
            return Err(LinalgError::shape((m, b.ncols()), b.shape()));
        }
        if m == n {
            LuDecomposition::new(a).solve_matrix(b)
        } else if m > n {
            QrDecomposition::new(a)?.solve(b)
        } else {
            min_norm_solve(a, b)
        }
    }

    /// Solve `A x = b` for a vector.
    pub fn solve_vector(&self, a: &Matrix<T>, b: &Vector<T>) -> Result<Vector<T>> {
        if a.is_square() {
            return LuDecomposition::new(a).solve(b);
        }
        let x = self.solve(a, &b.to_column())?;
        Ok(Vector::from_vec(x.into_vec()))
    }

    /// Solve `X A = B`, i.e. `Aᵗ Xᵗ = Bᵗ`.
    pub fn solve_transpose(&self, a: &Matrix<T>, b: &Matrix<T>) -> Result<Matrix<T>> {
        Ok(self.solve(&a.transpose(), &b.transpose())?.transpose())
    }

    // ── Scalar summaries ────────────────────────────────────────────

    /// Determinant of a square `a`.
    pub fn det(&self, a: &impl MatrixRef<T>) -> Result<T> {
        self.property.check_square(a)?;
        LuDecomposition::new(a).det()
    }

    /// Numerical rank from the singular values.
    pub fn rank(&self, a: &Matrix<T>) -> Result<usize> {
        let s = self.singular_values(a)?;
        let Some(&s0) = s.first() else {
            return Ok(0);
        };
        let tol = T::from_usize(a.nrows().max(a.ncols())) * s0 * T::epsilon();
        Ok(s.iter().filter(|&&x| x > tol).count())
    }

    /// 2-norm condition number, `s_max / s_min`.
    pub fn cond(&self, a: &Matrix<T>) -> Result<T> {
        let s = self.singular_values(a)?;
        Ok(match (s.first(), s.last()) {
            (Some(&hi), Some(&lo)) => hi / lo,
            _ => T::zero(),
        })
    }

    /// Maximum absolute column sum.
    pub fn norm1(&self, a: &impl MatrixRef<T>) -> T {
        norm::norm1(a)
    }

    /// Largest singular value.
    pub fn norm2(&self, a: &Matrix<T>) -> Result<T> {
        Ok(self.singular_values(a)?.first().copied().unwrap_or_else(T::zero))
    }

    /// Frobenius norm.
    pub fn norm_f(&self, a: &impl MatrixRef<T>) -> T {
        norm::norm_f(a)
    }

    /// Maximum absolute row sum.
    pub fn norm_infinity(&self, a: &impl MatrixRef<T>) -> T {
        norm::norm_infinity(a)
    }

    /// Sum of the leading diagonal.
    pub fn trace(&self, a: &impl MatrixRef<T>) -> T {
        square::trace(a)
    }

    // ── Products ────────────────────────────────────────────────────

    /// Transposed copy.
    pub fn transpose(&self, a: &Matrix<T>) -> Matrix<T> {
        a.transpose()
    }

    /// `A · B` through the BLAS backend.
    pub fn mult(&self, a: &Matrix<T>, b: &Matrix<T>) -> Result<Matrix<T>> {
        let mut c = Matrix::zeros(a.nrows(), b.ncols());
        self.blas.gemm(false, false, T::one(), a, b, T::zero(), &mut c)?;
        Ok(c)
    }

    /// `A · x` through the BLAS backend.
    pub fn mult_vector(&self, a: &Matrix<T>, x: &Vector<T>) -> Result<Vector<T>> {
        let mut y = Vector::zeros(a.nrows());
        self.blas.gemv(false, T::one(), a, x, T::zero(), &mut y)?;
        Ok(y)
    }

    /// `A^p` for a square `a`; negative `p` raises the inverse.
    pub fn pow(&self, a: &Matrix<T>, p: i32) -> Result<Matrix<T>> {
        self.property.check_square(a)?;
        let base = if p < 0 { self.inverse(a)? } else { a.clone() };
        let mut result = Matrix::identity(a.nrows());
        let mut base = base;
        let mut n = p.unsigned_abs();
        while n > 0 {
            if n & 1 == 1 {
                result = self.mult(&result, &base)?;
            }
            n >>= 1;
            if n > 0 {
                base = self.mult(&base, &base)?;
            }
        }
        Ok(result)
    }

    // ── Permutations ────────────────────────────────────────────────

    /// Gather `v[i] = v[indexes[i]]`.
    pub fn permute(&self, v: &mut Vector<T>, indexes: &[usize]) -> Result<()> {
        permute::permute(v.as_mut_slice(), indexes)
    }

    /// Row `i` becomes old row `indexes[i]`.
    pub fn permute_rows(&self, a: &mut Matrix<T>, indexes: &[usize]) -> Result<()> {
        permute::permute_rows(a, indexes)
    }

    /// Column `j` becomes old column `indexes[j]`.
    pub fn permute_columns(&self, a: &mut Matrix<T>, indexes: &[usize]) -> Result<()> {
        permute::permute_columns(a, indexes)
    }
}

/// Minimum-norm solution of a wide system `A X = B`.
///
/// With `Aᵗ = Q R`, the solution is `X = Q R⁻ᵗ B`.
fn min_norm_solve<T: FloatScalar>(a: &Matrix<T>, b: &Matrix<T>) -> Result<Matrix<T>> {
    let qr = QrDecomposition::new(&a.view_dice())?;
    if !qr.has_full_rank() {
        return Err(LinalgError::RankDeficient);
    }
    let r = qr.r();
    let m = r.nrows();
    let nx = b.ncols();

    // Rᵗ Z = B, forward substitution.
    let mut z = b.clone();
    for j in 0..nx {
        for i in 0..m {
            let mut sum = z[(i, j)];
            for k in 0..i {
                sum = sum - r[(k, i)] * z[(k, j)];
            }
            z[(i, j)] = sum / r[(i, i)];
        }
    }
    Ok(qr.q().matmul(&z))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::smp::{Smp, SmpBlas};

    const TOL: f64 = 1e-10;

    fn assert_near(a: f64, b: f64, tol: f64, msg: &str) {
        assert!((a - b).abs() < tol, "{}: {} vs {} (diff {})", msg, a, b, (a - b).abs());
    }

    fn assert_matrix_near(a: &Matrix<f64>, b: &Matrix<f64>, tol: f64, msg: &str) {
        assert_eq!(a.shape(), b.shape(), "{}: shape", msg);
        for i in 0..a.nrows() {
            for j in 0..a.ncols() {
                assert_near(a[(i, j)], b[(i, j)], tol, &format!("{}[{},{}]", msg, i, j));
            }
        }
    }

    #[test]
    fn inverse_symmetric_dominant() {
        let alg = Algebra::standard();
        let a = Matrix::from_rows(2, 2, &[1000.0, 12.4126, 12.4126, 83.9204]);
        let inv = alg.inverse(&a).unwrap();

        let det = 1000.0 * 83.9204 - 12.4126 * 12.4126;
        let exact = Matrix::from_rows(2, 2, &[83.9204 / det, -12.4126 / det, -12.4126 / det, 1000.0 / det]);
        assert_matrix_near(&inv, &exact, TOL, "closed form");

        let rounded = Matrix::from_rows(2, 2, &[0.0010018, -0.0001482, -0.0001482, 0.0119380]);
        assert_matrix_near(&inv, &rounded, 1e-7, "published");
    }

    #[test]
    fn inverse_diagonal_fast_path() {
        let alg = Algebra::standard();
        let d = Matrix::from_diagonal(&[2.0, -4.0, 0.5]);
        assert_eq!(alg.inverse(&d).unwrap(), Matrix::from_diagonal(&[0.5, -0.25, 2.0]));
        let z = Matrix::from_diagonal(&[2.0, 1e-12, 1.0]);
        assert_eq!(alg.inverse(&z).unwrap_err(), LinalgError::Singular);
    }

    #[test]
    fn inverse_equals_solve_identity() {
        let alg = Algebra::standard();
        let a = Matrix::from_rows(3, 3, &[4.0, -2.0, 1.0, 3.0, 6.0, -4.0, 2.0, 1.0, 8.0]);
        let inv = alg.inverse(&a).unwrap();
        let via_solve = alg.solve(&a, &Matrix::identity(3)).unwrap();
        assert_matrix_near(&inv, &via_solve, TOL, "inverse vs solve");
        assert_matrix_near(&alg.mult(&a, &inv).unwrap(), &Matrix::identity(3), TOL, "A A⁻¹");
    }

    #[test]
    fn trace_of_principal_diagonal() {
        let alg = Algebra::<f64>::standard();
        let a = Matrix::from_rows(3, 3, &[5.0, 2.0, 4.0, -3.0, 6.0, 2.0, 3.0, -3.0, 1.0]);
        assert_eq!(alg.trace(&a), 12.0);
        assert_eq!(alg.trace(&Matrix::<f64>::zeros(0, 0)), 0.0);
        assert_eq!(alg.norm1(&Matrix::<f64>::zeros(0, 0)), 0.0);
        assert_eq!(alg.norm_infinity(&a), 11.0);
        assert_eq!(alg.norm1(&a), 11.0);
    }

    #[test]
    fn least_squares_and_min_norm() {
        let alg = Algebra::standard();
        let tall = Matrix::from_rows(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let x = alg.solve_vector(&tall, &Vector::from_slice(&[1.0, 2.0, 4.0])).unwrap();
        assert_near(x[0], 5.0 / 6.0, TOL, "intercept");
        assert_near(x[1], 1.5, TOL, "slope");

        // x + y = 2 has minimum-norm solution (1, 1).
        let wide = Matrix::from_rows(1, 2, &[1.0, 1.0]);
        let x = alg.solve(&wide, &Matrix::from_rows(1, 1, &[2.0])).unwrap();
        assert_matrix_near(&x, &Matrix::from_rows(2, 1, &[1.0, 1.0]), TOL, "min norm");
    }

    #[test]
    fn solve_transpose_right_division() {
        let alg = Algebra::standard();
        let a = Matrix::from_rows(2, 2, &[2.0, 1.0, 1.0, 3.0]);
        let x_true = Matrix::from_rows(1, 2, &[1.0, -2.0]);
        let b = x_true.matmul(&a);
        let x = alg.solve_transpose(&a, &b).unwrap();
        assert_matrix_near(&x, &x_true, TOL, "X A = B");
    }

    #[test]
    fn solve_shape_mismatch() {
        let alg = Algebra::standard();
        let err = alg.solve(&Matrix::<f64>::identity(3), &Matrix::zeros(2, 1)).unwrap_err();
        assert_eq!(err, LinalgError::shape((3, 1), (2, 1)));
    }

    #[test]
    fn rank_norm2_cond_accept_wide() {
        let alg = Algebra::standard();
        let a = Matrix::from_rows(2, 3, &[3.0, 0.0, 0.0, 0.0, 4.0, 0.0]);
        assert_eq!(alg.rank(&a).unwrap(), 2);
        assert_near(alg.norm2(&a).unwrap(), 4.0, TOL, "norm2");
        assert_near(alg.cond(&a).unwrap(), 4.0 / 3.0, TOL, "cond");
        assert_near(alg.norm_f(&a), 5.0, TOL, "frobenius");
    }

    #[test]
    fn pow_positive_negative_zero() {
        let alg = Algebra::standard();
        let a = Matrix::from_rows(2, 2, &[2.0, 1.0, 0.0, 1.0]);
        assert_eq!(alg.pow(&a, 0).unwrap(), Matrix::identity(2));
        assert_eq!(alg.pow(&a, 3).unwrap(), a.pow(3));
        let inv2 = alg.pow(&a, -2).unwrap();
        assert_matrix_near(&alg.mult(&inv2, &a.pow(2)).unwrap(), &Matrix::identity(2), TOL, "A⁻² A²");
        assert_eq!(
            alg.pow(&Matrix::<f64>::zeros(2, 3), 2).unwrap_err(),
            LinalgError::NotSquare { rows: 2, cols: 3 }
        );
    }

    #[test]
    fn parallel_backend_matches() {
        let par = Algebra::with_blas(
            Property::standard(),
            SmpBlas::new(Smp::new(3).unwrap()).with_threshold(1),
        );
        let seq = Algebra::standard();
        let a = Matrix::from_fn(7, 5, |i, j| (i as f64 - j as f64) * 0.5);
        let b = Matrix::from_fn(5, 6, |i, j| (i + 2 * j) as f64);
        assert_eq!(par.mult(&a, &b).unwrap(), seq.mult(&a, &b).unwrap());
        par.into_blas().into_inner().shutdown();
    }

    #[test]
    fn permutations_through_facade() {
        let alg = Algebra::standard();
        let mut v = Vector::from_slice(&[1.0, 2.0, 3.0]);
        alg.permute(&mut v, &[1, 2, 0]).unwrap();
        assert_eq!(v.as_slice(), &[2.0, 3.0, 1.0]);

        let mut a = Matrix::from_rows(2, 2, &[1.0, 2.0, 3.0, 4.0]);
        alg.permute_rows(&mut a, &[1, 0]).unwrap();
        assert_eq!(a, Matrix::from_rows(2, 2, &[3.0, 4.0, 1.0, 2.0]));
        alg.permute_columns(&mut a, &[1, 0]).unwrap();
        assert_eq!(a, Matrix::from_rows(2, 2, &[4.0, 3.0, 2.0, 1.0]));
        assert_eq!(
            alg.permute_rows(&mut a, &[0]),
            Err(LinalgError::InvalidPermutation { expected: 2, got: 1 })
        );
    }
}

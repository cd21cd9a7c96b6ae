use crate::error::{LinalgError, Result};
use crate::traits::{FloatScalar, MatrixMut, MatrixRef};
use crate::{Matrix, Vector};

/// Householder QR in place for `m >= n`.
///
/// On return `a` holds `R` on and above the diagonal and the scaled
/// Householder vectors below it; `tau` (length `n`) holds the reflector
/// scalars. A column that is already zero below the diagonal gets
/// `tau = 0` (identity reflector) and a zero `R` diagonal.
pub(crate) fn qr_in_place<T: FloatScalar>(a: &mut impl MatrixMut<T>, tau: &mut [T]) {
    let m = a.nrows();
    let n = a.ncols();
    debug_assert!(m >= n);
    debug_assert_eq!(tau.len(), n);

    for col in 0..n {
        let mut norm = T::zero();
        for i in col..m {
            norm = norm.hypot(*a.get(i, col));
        }
        if norm == T::zero() {
            tau[col] = T::zero();
            continue;
        }

        let a_cc = *a.get(col, col);
        let sigma = if a_cc < T::zero() { -norm } else { norm };
        let v0 = a_cc + sigma;
        let tau_val = v0 / sigma;
        tau[col] = tau_val;

        for i in (col + 1)..m {
            let val = *a.get(i, col) / v0;
            *a.get_mut(i, col) = val;
        }

        // A[col:m, j] -= tau * v * (vᵗ A[col:m, j])
        for j in (col + 1)..n {
            let mut dot = *a.get(col, j);
            for i in (col + 1)..m {
                dot = dot + *a.get(i, col) * *a.get(i, j);
            }
            dot = dot * tau_val;
            *a.get_mut(col, j) = *a.get(col, j) - dot;
            for i in (col + 1)..m {
                let vi = *a.get(i, col);
                *a.get_mut(i, j) = *a.get(i, j) - dot * vi;
            }
        }

        *a.get_mut(col, col) = -sigma;
    }
}

/// QR decomposition of an `m x n` matrix with `m >= n`.
///
/// Used for least-squares solves of over-determined systems.
///
/// # Example
///
/// ```
/// use linfactor::{Matrix, QrDecomposition, Vector};
///
/// // Fit y = c0 + c1*x to points (0,1), (1,2), (2,4)
/// let a = Matrix::from_rows(3, 2, &[1.0_f64, 0.0, 1.0, 1.0, 1.0, 2.0]);
/// let b = Vector::from_slice(&[1.0, 2.0, 4.0]);
/// let x = QrDecomposition::new(&a).unwrap().solve_vector(&b).unwrap();
/// assert!((x[0] - 5.0 / 6.0).abs() < 1e-10);
/// assert!((x[1] - 3.0 / 2.0).abs() < 1e-10);
/// ```
#[derive(Debug, Clone)]
pub struct QrDecomposition<T> {
    qr: Matrix<T>,
    tau: Vec<T>,
}

impl<T: FloatScalar> QrDecomposition<T> {
    /// Decompose a copy of `a`. Fails with `NotRectangular` when `m < n`.
    pub fn new(a: &impl MatrixRef<T>) -> Result<Self> {
        let (m, n) = (a.nrows(), a.ncols());
        if m < n {
            return Err(LinalgError::NotRectangular { rows: m, cols: n });
        }
        let mut qr = Matrix::copy_of(a);
        let mut tau = vec![T::zero(); n];
        qr_in_place(&mut qr, &mut tau);
        Ok(Self { qr, tau })
    }

    /// Whether every diagonal entry of `R` is significant relative to the
    /// largest one.
    pub fn has_full_rank(&self) -> bool {
        let (m, n) = self.qr.shape();
        let max = (0..n).fold(T::zero(), |acc, j| acc.max(self.qr[(j, j)].abs()));
        let tol = T::from_usize(m.max(n)) * T::epsilon() * max;
        (0..n).all(|j| self.qr[(j, j)].abs() > tol)
    }

    /// Upper-triangular `R`, `n x n`.
    pub fn r(&self) -> Matrix<T> {
        let n = self.qr.ncols();
        Matrix::from_fn(n, n, |i, j| if i <= j { self.qr[(i, j)] } else { T::zero() })
    }

    /// Thin `Q`, `m x n` with orthonormal columns.
    ///
    /// Reflections are applied in reverse to the first `n` columns of the
    /// identity.
    pub fn q(&self) -> Matrix<T> {
        let (m, n) = self.qr.shape();
        let mut q = Matrix::zeros(m, n);
        for i in 0..n {
            q[(i, i)] = T::one();
        }
        for col in (0..n).rev() {
            let tau_val = self.tau[col];
            if tau_val == T::zero() {
                continue;
            }
            for j in col..n {
                let mut dot = q[(col, j)];
                for i in (col + 1)..m {
                    dot = dot + self.qr[(i, col)] * q[(i, j)];
                }
                dot = dot * tau_val;
                q[(col, j)] = q[(col, j)] - dot;
                for i in (col + 1)..m {
                    q[(i, j)] = q[(i, j)] - dot * self.qr[(i, col)];
                }
            }
        }
        q
    }

    /// Least-squares solution `X` minimising `‖A X - B‖`.
    pub fn solve(&self, b: &Matrix<T>) -> Result<Matrix<T>> {
        let (m, n) = self.qr.shape();
        if b.nrows() != m {
            return Err(LinalgError::shape((m, b.ncols()), b.shape()));
        }
        if !self.has_full_rank() {
            return Err(LinalgError::RankDeficient);
        }
        let nx = b.ncols();
        let mut y = b.clone();

        // Y = Qᵗ B
        for col in 0..n {
            let tau_val = self.tau[col];
            if tau_val == T::zero() {
                continue;
            }
            for j in 0..nx {
                let mut dot = y[(col, j)];
                for i in (col + 1)..m {
                    dot = dot + self.qr[(i, col)] * y[(i, j)];
                }
                dot = dot * tau_val;
                y[(col, j)] = y[(col, j)] - dot;
                for i in (col + 1)..m {
                    y[(i, j)] = y[(i, j)] - dot * self.qr[(i, col)];
                }
            }
        }

        // R X = Y[0..n]
        let mut x = Matrix::zeros(n, nx);
        for j in 0..nx {
            for i in (0..n).rev() {
                let mut sum = y[(i, j)];
                for k in (i + 1)..n {
                    sum = sum - self.qr[(i, k)] * x[(k, j)];
                }
                x[(i, j)] = sum / self.qr[(i, i)];
            }
        }
        Ok(x)
    }

    /// Least-squares solution for a vector right-hand side.
    pub fn solve_vector(&self, b: &Vector<T>) -> Result<Vector<T>> {
        let x = self.solve(&b.to_column())?;
        Ok(Vector::from_vec(x.into_vec()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-10;

    fn assert_near(a: f64, b: f64, tol: f64, msg: &str) {
        assert!((a - b).abs() < tol, "{}: {} vs {} (diff {})", msg, a, b, (a - b).abs());
    }

    #[test]
    fn qr_rectangular_4x3() {
        let a = Matrix::from_rows(4, 3, &[
            1.0, -1.0, 4.0,
            1.0, 4.0, -2.0,
            1.0, 4.0, 2.0,
            1.0, -1.0, 0.0,
        ]);
        let qr = QrDecomposition::new(&a).unwrap();
        let q = qr.q();
        let prod = q.matmul(&qr.r());
        for i in 0..4 {
            for j in 0..3 {
                assert_near(prod[(i, j)], a[(i, j)], TOL, &format!("QR[({},{})]", i, j));
            }
        }
        let qtq = q.transpose().matmul(&q);
        for i in 0..3 {
            for j in 0..3 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert_near(qtq[(i, j)], expected, TOL, &format!("QtQ[({},{})]", i, j));
            }
        }
    }

    #[test]
    fn residual_orthogonal_to_columns() {
        let a = Matrix::from_rows(4, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0, 1.0, 3.0]);
        let b = Vector::from_slice(&[1.0, 2.0, 4.0, 3.0]);
        let x = QrDecomposition::new(&a).unwrap().solve_vector(&b).unwrap();
        let ax = a.matvec(&x);
        let r: Vec<f64> = (0..4).map(|i| b[i] - ax[i]).collect();
        for j in 0..2 {
            let dot: f64 = (0..4).map(|i| a[(i, j)] * r[i]).sum();
            assert_near(dot, 0.0, TOL, "Aᵗr");
        }
    }

    #[test]
    fn wide_is_rejected() {
        let a = Matrix::<f64>::zeros(2, 3);
        assert_eq!(
            QrDecomposition::new(&a).unwrap_err(),
            LinalgError::NotRectangular { rows: 2, cols: 3 }
        );
    }

    #[test]
    fn zero_column_is_rank_deficient() {
        let a = Matrix::from_rows(3, 2, &[1.0, 0.0, 2.0, 0.0, 3.0, 0.0]);
        let qr = QrDecomposition::new(&a).unwrap();
        assert!(!qr.has_full_rank());
        assert_eq!(
            qr.solve(&Matrix::zeros(3, 1)).unwrap_err(),
            LinalgError::RankDeficient
        );
        let prod = qr.q().matmul(&qr.r());
        for i in 0..3 {
            for j in 0..2 {
                assert_near(prod[(i, j)], a[(i, j)], TOL, "QR = A");
            }
        }
    }

    #[test]
    fn solve_shape_mismatch() {
        let a = Matrix::<f64>::identity(3);
        let qr = QrDecomposition::new(&a).unwrap();
        assert_eq!(
            qr.solve(&Matrix::zeros(2, 2)).unwrap_err(),
            LinalgError::shape((3, 2), (2, 2))
        );
    }
}

use core::ops::{Add, AddAssign, Mul, MulAssign, Neg, Sub, SubAssign};

use crate::traits::Scalar;

use super::vector::Vector;
use super::Matrix;

impl<T: Scalar> Matrix<T> {
    fn zip_with(&self, rhs: &Matrix<T>, op: &str, f: impl Fn(T, T) -> T) -> Matrix<T> {
        assert_eq!(
            (self.nrows, self.ncols),
            (rhs.nrows, rhs.ncols),
            "dimension mismatch: {}x{} {} {}x{}",
            self.nrows,
            self.ncols,
            op,
            rhs.nrows,
            rhs.ncols,
        );
        let data = self
            .data
            .iter()
            .zip(rhs.data.iter())
            .map(|(&a, &b)| f(a, b))
            .collect();
        Matrix {
            data,
            nrows: self.nrows,
            ncols: self.ncols,
        }
    }

    /// Matrix product `self * rhs`, row-oriented (i-k-j) loop order.
    ///
    /// Panics when `self.ncols() != rhs.nrows()`.
    ///
    /// ```
    /// use linfactor::Matrix;
    /// let a = Matrix::from_rows(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    /// let b = Matrix::from_rows(3, 2, &[7.0, 8.0, 9.0, 10.0, 11.0, 12.0]);
    /// let c = a.matmul(&b);
    /// assert_eq!(c, Matrix::from_rows(2, 2, &[58.0, 64.0, 139.0, 154.0]));
    /// ```
    pub fn matmul(&self, rhs: &Matrix<T>) -> Matrix<T> {
        assert_eq!(
            self.ncols, rhs.nrows,
            "dimension mismatch: {}x{} * {}x{}",
            self.nrows, self.ncols, rhs.nrows, rhs.ncols,
        );
        let mut out = Matrix::zeros(self.nrows, rhs.ncols);
        for i in 0..self.nrows {
            let a_row = self.row_slice(i);
            let c_row = out.row_slice_mut(i);
            for (k, &a) in a_row.iter().enumerate() {
                if a == T::zero() {
                    continue;
                }
                for (c, &b) in c_row.iter_mut().zip(rhs.row_slice(k)) {
                    *c = *c + a * b;
                }
            }
        }
        out
    }

    /// Matrix-vector product `self * v`.
    pub fn matvec(&self, v: &Vector<T>) -> Vector<T> {
        assert_eq!(
            self.ncols,
            v.len(),
            "dimension mismatch: {}x{} * {}",
            self.nrows,
            self.ncols,
            v.len(),
        );
        let data = (0..self.nrows)
            .map(|i| {
                self.row_slice(i)
                    .iter()
                    .zip(v.as_slice())
                    .fold(T::zero(), |acc, (&a, &b)| acc + a * b)
            })
            .collect();
        Vector::from_vec(data)
    }

    /// Multiply every element by `s`.
    pub fn scale(&self, s: T) -> Matrix<T> {
        self.map(|x| x * s)
    }
}

// ── Element-wise add / sub ──────────────────────────────────────────

macro_rules! elementwise {
    ($tr:ident, $method:ident, $assign_tr:ident, $assign_method:ident, $op:tt) => {
        impl<T: Scalar> $tr<&Matrix<T>> for &Matrix<T> {
            type Output = Matrix<T>;
            fn $method(self, rhs: &Matrix<T>) -> Matrix<T> {
                self.zip_with(rhs, stringify!($op), |a, b| a $op b)
            }
        }

        impl<T: Scalar> $tr<&Matrix<T>> for Matrix<T> {
            type Output = Matrix<T>;
            fn $method(self, rhs: &Matrix<T>) -> Matrix<T> {
                (&self).$method(rhs)
            }
        }

        impl<T: Scalar> $tr for Matrix<T> {
            type Output = Matrix<T>;
            fn $method(self, rhs: Matrix<T>) -> Matrix<T> {
                (&self).$method(&rhs)
            }
        }

        impl<T: Scalar> $assign_tr<&Matrix<T>> for Matrix<T> {
            fn $assign_method(&mut self, rhs: &Matrix<T>) {
                assert_eq!(
                    (self.nrows, self.ncols),
                    (rhs.nrows, rhs.ncols),
                    "dimension mismatch",
                );
                for (a, &b) in self.data.iter_mut().zip(rhs.data.iter()) {
                    *a = *a $op b;
                }
            }
        }
    };
}

elementwise!(Add, add, AddAssign, add_assign, +);
elementwise!(Sub, sub, SubAssign, sub_assign, -);

impl<T: Scalar + Neg<Output = T>> Neg for Matrix<T> {
    type Output = Matrix<T>;
    fn neg(self) -> Matrix<T> {
        self.map(|x| -x)
    }
}

impl<T: Scalar + Neg<Output = T>> Neg for &Matrix<T> {
    type Output = Matrix<T>;
    fn neg(self) -> Matrix<T> {
        self.map(|x| -x)
    }
}

// ── Products ────────────────────────────────────────────────────────

impl<T: Scalar> Mul<&Matrix<T>> for &Matrix<T> {
    type Output = Matrix<T>;
    fn mul(self, rhs: &Matrix<T>) -> Matrix<T> {
        self.matmul(rhs)
    }
}

impl<T: Scalar> Mul for Matrix<T> {
    type Output = Matrix<T>;
    fn mul(self, rhs: Matrix<T>) -> Matrix<T> {
        self.matmul(&rhs)
    }
}

impl<T: Scalar> Mul<&Vector<T>> for &Matrix<T> {
    type Output = Vector<T>;
    fn mul(self, rhs: &Vector<T>) -> Vector<T> {
        self.matvec(rhs)
    }
}

impl<T: Scalar> Mul<T> for &Matrix<T> {
    type Output = Matrix<T>;
    fn mul(self, rhs: T) -> Matrix<T> {
        self.scale(rhs)
    }
}

impl<T: Scalar> Mul<T> for Matrix<T> {
    type Output = Matrix<T>;
    fn mul(self, rhs: T) -> Matrix<T> {
        self.scale(rhs)
    }
}

impl<T: Scalar> MulAssign<T> for Matrix<T> {
    fn mul_assign(&mut self, rhs: T) {
        for x in self.data.iter_mut() {
            *x = *x * rhs;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_sub_neg() {
        let a = Matrix::from_rows(2, 2, &[1.0, 2.0, 3.0, 4.0]);
        let b = Matrix::from_rows(2, 2, &[4.0, 3.0, 2.0, 1.0]);
        assert_eq!(&a + &b, Matrix::fill(2, 2, 5.0));
        assert_eq!(&a - &a, Matrix::zeros(2, 2));
        assert_eq!((-a.clone())[(1, 1)], -4.0);
        let mut c = a.clone();
        c += &b;
        c -= &b;
        assert_eq!(c, a);
    }

    #[test]
    #[should_panic(expected = "dimension mismatch")]
    fn add_shape_mismatch() {
        let _ = Matrix::<f64>::zeros(2, 2) + Matrix::zeros(2, 3);
    }

    #[test]
    fn matmul_identity() {
        let a = Matrix::from_fn(3, 4, |i, j| (i + 2 * j) as f64);
        assert_eq!(&Matrix::identity(3) * &a, a);
        assert_eq!(&a * &Matrix::identity(4), a);
    }

    #[test]
    fn matvec_and_scale() {
        let a = Matrix::from_rows(2, 3, &[1.0, 0.0, 2.0, -1.0, 3.0, 1.0]);
        let v = Vector::from_slice(&[3.0, 2.0, 1.0]);
        assert_eq!((&a * &v).as_slice(), &[5.0, 4.0]);
        let mut s = &a * 2.0;
        assert_eq!(s[(0, 2)], 4.0);
        s *= 0.5;
        assert_eq!(s, a);
    }

    #[test]
    fn empty_product() {
        let a = Matrix::<f64>::zeros(2, 0);
        let b = Matrix::<f64>::zeros(0, 3);
        assert_eq!(a.matmul(&b), Matrix::zeros(2, 3));
    }
}

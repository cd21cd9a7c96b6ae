use core::ops::{Index, IndexMut};

use crate::traits::{FloatScalar, MatrixMut, MatrixRef, Scalar};

use super::view::{VectorView, VectorViewMut};
use super::Matrix;

/// Dynamically-sized dense vector.
///
/// Acts as an `n x 1` column through [`MatrixRef`], which is the
/// orientation solves and matrix-vector products expect.
///
/// # Examples
///
/// ```
/// use linfactor::Vector;
///
/// let v = Vector::from_slice(&[1.0_f64, 2.0, 3.0]);
/// assert_eq!(v[0], 1.0);
/// assert_eq!(v.len(), 3);
/// assert!((v.dot(&v) - 14.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Vector<T> {
    pub(crate) data: Vec<T>,
}

impl<T: Scalar> Vector<T> {
    /// Create a vector from a slice.
    pub fn from_slice(data: &[T]) -> Self {
        Self {
            data: data.to_vec(),
        }
    }

    /// Create a vector from an owned `Vec`.
    ///
    /// ```
    /// use linfactor::Vector;
    /// let v = Vector::from_vec(vec![1.0, 2.0, 3.0]);
    /// assert_eq!(v[2], 3.0);
    /// ```
    pub fn from_vec(data: Vec<T>) -> Self {
        Self { data }
    }

    /// Zero vector of length `n`.
    pub fn zeros(n: usize) -> Self {
        Self {
            data: vec![T::zero(); n],
        }
    }

    /// Vector of length `n` filled with `value`.
    pub fn fill(n: usize, value: T) -> Self {
        Self {
            data: vec![value; n],
        }
    }

    /// Dot product. Panics on length mismatch.
    ///
    /// ```
    /// use linfactor::Vector;
    /// let a = Vector::from_slice(&[1.0, 2.0, 3.0]);
    /// let b = Vector::from_slice(&[4.0, 5.0, 6.0]);
    /// assert_eq!(a.dot(&b), 32.0);
    /// ```
    pub fn dot(&self, rhs: &Self) -> T {
        assert_eq!(self.len(), rhs.len(), "vector length mismatch");
        let mut sum = T::zero();
        for (&a, &b) in self.data.iter().zip(rhs.data.iter()) {
            sum = sum + a * b;
        }
        sum
    }

    /// Replace every element with `f(x)`.
    pub fn assign(&mut self, f: impl Fn(T) -> T) {
        for x in self.data.iter_mut() {
            *x = f(*x);
        }
    }

    /// Copy the vector into an `n x 1` matrix.
    pub fn to_column(&self) -> Matrix<T> {
        Matrix::from_vec(self.len(), 1, self.data.clone())
    }
}

impl<T: FloatScalar> Vector<T> {
    /// Euclidean norm, computed with `hypot` to avoid overflow.
    ///
    /// ```
    /// use linfactor::Vector;
    /// let v = Vector::from_slice(&[3.0_f64, 4.0]);
    /// assert_eq!(v.norm(), 5.0);
    /// ```
    pub fn norm(&self) -> T {
        self.data.iter().fold(T::zero(), |acc, &x| acc.hypot(x))
    }
}

impl<T> Vector<T> {
    /// Number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the vector is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The elements as a slice.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// The elements as a mutable slice.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Consume the vector, returning the elements.
    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    /// Read-only view of the whole vector.
    pub fn view(&self) -> VectorView<'_, T> {
        VectorView::from_slice(&self.data)
    }

    /// Mutable view of the whole vector.
    pub fn view_mut(&mut self) -> VectorViewMut<'_, T> {
        VectorViewMut::from_slice(&mut self.data)
    }
}

impl<T> Index<usize> for Vector<T> {
    type Output = T;

    #[inline]
    fn index(&self, i: usize) -> &T {
        &self.data[i]
    }
}

impl<T> IndexMut<usize> for Vector<T> {
    #[inline]
    fn index_mut(&mut self, i: usize) -> &mut T {
        &mut self.data[i]
    }
}

impl<T> MatrixRef<T> for Vector<T> {
    #[inline]
    fn nrows(&self) -> usize {
        self.data.len()
    }

    #[inline]
    fn ncols(&self) -> usize {
        1
    }

    #[inline]
    fn get(&self, row: usize, col: usize) -> &T {
        debug_assert_eq!(col, 0);
        &self.data[row]
    }
}

impl<T> MatrixMut<T> for Vector<T> {
    #[inline]
    fn get_mut(&mut self, row: usize, col: usize) -> &mut T {
        debug_assert_eq!(col, 0);
        &mut self.data[row]
    }
}

impl<T> From<Vec<T>> for Vector<T> {
    fn from(data: Vec<T>) -> Self {
        Self { data }
    }
}

impl<T: Scalar> From<VectorView<'_, T>> for Vector<T> {
    fn from(v: VectorView<'_, T>) -> Self {
        v.to_vector()
    }
}

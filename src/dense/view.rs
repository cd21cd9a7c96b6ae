//! Borrowed, strided views into a [`Matrix`] buffer.
//!
//! A view is the parent's backing slice plus an `offset` and a pair of
//! strides. Element `(i, j)` of a matrix view lives at
//! `offset + i * row_stride + j * col_stride`; transposition (`view_dice`)
//! swaps the strides. Writes through a mutable view land in the parent
//! buffer.
//!
//! Coordinates are validated against the parent's bounds when the view is
//! created. Out-of-range coordinates panic, like slice indexing.

use core::fmt;

use crate::traits::{MatrixMut, MatrixRef, Scalar};

use super::vector::Vector;
use super::Matrix;

#[inline]
fn check_part(what: &str, row: usize, col: usize, rows: usize, cols: usize, nrows: usize, ncols: usize) {
    assert!(
        row.checked_add(rows).is_some_and(|r| r <= nrows)
            && col.checked_add(cols).is_some_and(|c| c <= ncols),
        "{} ({},{}) size {}x{} out of bounds for {}x{} matrix",
        what,
        row,
        col,
        rows,
        cols,
        nrows,
        ncols,
    );
}

#[inline]
fn check_index(what: &str, index: usize, len: usize) {
    assert!(index < len, "{} index {} out of bounds for length {}", what, index, len);
}

// ── MatrixView ──────────────────────────────────────────────────────

/// Read-only strided view of a matrix region.
pub struct MatrixView<'a, T> {
    data: &'a [T],
    offset: usize,
    nrows: usize,
    ncols: usize,
    row_stride: usize,
    col_stride: usize,
}

impl<T> Clone for MatrixView<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for MatrixView<'_, T> {}

impl<T: fmt::Debug> fmt::Debug for MatrixView<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut list = f.debug_list();
        for i in 0..self.nrows {
            let row: Vec<&T> = (0..self.ncols).map(|j| &self.data[self.at(i, j)]).collect();
            list.entry(&row);
        }
        list.finish()
    }
}

impl<'a, T> MatrixView<'a, T> {
    #[inline]
    fn at(&self, row: usize, col: usize) -> usize {
        self.offset + row * self.row_stride + col * self.col_stride
    }

    /// Number of rows.
    #[inline]
    pub fn nrows(&self) -> usize {
        self.nrows
    }

    /// Number of columns.
    #[inline]
    pub fn ncols(&self) -> usize {
        self.ncols
    }

    /// `(nrows, ncols)`.
    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.nrows, self.ncols)
    }

    /// Total number of cells.
    #[inline]
    pub fn size(&self) -> usize {
        self.nrows * self.ncols
    }

    /// Sub-range view of `rows x cols` cells starting at `(row, col)`.
    pub fn view_part(self, row: usize, col: usize, rows: usize, cols: usize) -> MatrixView<'a, T> {
        check_part("view_part", row, col, rows, cols, self.nrows, self.ncols);
        MatrixView {
            data: self.data,
            offset: self.at(row, col),
            nrows: rows,
            ncols: cols,
            row_stride: self.row_stride,
            col_stride: self.col_stride,
        }
    }

    /// Row `i` as a vector view.
    pub fn view_row(self, i: usize) -> VectorView<'a, T> {
        check_index("row", i, self.nrows);
        VectorView {
            data: self.data,
            offset: self.at(i, 0),
            len: self.ncols,
            stride: self.col_stride,
        }
    }

    /// Column `j` as a vector view.
    pub fn view_column(self, j: usize) -> VectorView<'a, T> {
        check_index("column", j, self.ncols);
        VectorView {
            data: self.data,
            offset: self.at(0, j),
            len: self.nrows,
            stride: self.row_stride,
        }
    }

    /// Transposed view (rows and columns exchanged, no copy).
    pub fn view_dice(self) -> MatrixView<'a, T> {
        MatrixView {
            data: self.data,
            offset: self.offset,
            nrows: self.ncols,
            ncols: self.nrows,
            row_stride: self.col_stride,
            col_stride: self.row_stride,
        }
    }

    /// Every `step`-th row starting at `first`, `count` rows in total.
    ///
    /// ```
    /// use linfactor::Matrix;
    /// let m = Matrix::from_fn(5, 2, |i, _| i as f64);
    /// let odd = m.view().view_rows_strided(1, 2, 2);
    /// assert_eq!(odd.to_matrix(), Matrix::from_rows(2, 2, &[1.0, 1.0, 3.0, 3.0]));
    /// ```
    pub fn view_rows_strided(self, first: usize, step: usize, count: usize) -> MatrixView<'a, T> {
        assert!(step > 0, "row step must be positive");
        if count > 0 {
            check_index("strided row", first + (count - 1) * step, self.nrows);
        }
        MatrixView {
            data: self.data,
            offset: self.at(first.min(self.nrows), 0),
            nrows: count,
            ncols: self.ncols,
            row_stride: self.row_stride * step,
            col_stride: self.col_stride,
        }
    }
}

impl<T: Scalar> MatrixView<'_, T> {
    /// Deep copy into an owned matrix.
    pub fn to_matrix(&self) -> Matrix<T> {
        Matrix::from_fn(self.nrows, self.ncols, |i, j| self.data[self.at(i, j)])
    }
}

impl<T> MatrixRef<T> for MatrixView<'_, T> {
    #[inline]
    fn nrows(&self) -> usize {
        self.nrows
    }

    #[inline]
    fn ncols(&self) -> usize {
        self.ncols
    }

    #[inline]
    fn get(&self, row: usize, col: usize) -> &T {
        debug_assert!(row < self.nrows && col < self.ncols);
        &self.data[self.at(row, col)]
    }
}

// ── MatrixViewMut ───────────────────────────────────────────────────

/// Mutable strided view of a matrix region. Writes alias the parent.
pub struct MatrixViewMut<'a, T> {
    data: &'a mut [T],
    offset: usize,
    nrows: usize,
    ncols: usize,
    row_stride: usize,
    col_stride: usize,
}

impl<'a, T> MatrixViewMut<'a, T> {
    #[inline]
    fn at(&self, row: usize, col: usize) -> usize {
        self.offset + row * self.row_stride + col * self.col_stride
    }

    /// Number of rows.
    #[inline]
    pub fn nrows(&self) -> usize {
        self.nrows
    }

    /// Number of columns.
    #[inline]
    pub fn ncols(&self) -> usize {
        self.ncols
    }

    /// Reborrow as a read-only view.
    pub fn rb(&self) -> MatrixView<'_, T> {
        MatrixView {
            data: self.data,
            offset: self.offset,
            nrows: self.nrows,
            ncols: self.ncols,
            row_stride: self.row_stride,
            col_stride: self.col_stride,
        }
    }

    /// Mutable sub-range view.
    pub fn view_part_mut(self, row: usize, col: usize, rows: usize, cols: usize) -> MatrixViewMut<'a, T> {
        check_part("view_part", row, col, rows, cols, self.nrows, self.ncols);
        let offset = self.at(row, col);
        MatrixViewMut {
            data: self.data,
            offset,
            nrows: rows,
            ncols: cols,
            row_stride: self.row_stride,
            col_stride: self.col_stride,
        }
    }

    /// Mutable row view.
    pub fn view_row_mut(self, i: usize) -> VectorViewMut<'a, T> {
        check_index("row", i, self.nrows);
        let offset = self.at(i, 0);
        VectorViewMut {
            data: self.data,
            offset,
            len: self.ncols,
            stride: self.col_stride,
        }
    }

    /// Mutable column view.
    pub fn view_column_mut(self, j: usize) -> VectorViewMut<'a, T> {
        check_index("column", j, self.ncols);
        let offset = self.at(0, j);
        VectorViewMut {
            data: self.data,
            offset,
            len: self.nrows,
            stride: self.row_stride,
        }
    }

    /// Mutable transposed view.
    pub fn view_dice_mut(self) -> MatrixViewMut<'a, T> {
        MatrixViewMut {
            data: self.data,
            offset: self.offset,
            nrows: self.ncols,
            ncols: self.nrows,
            row_stride: self.col_stride,
            col_stride: self.row_stride,
        }
    }

    /// Swap two rows of the viewed region.
    pub fn swap_rows(&mut self, a: usize, b: usize) {
        check_index("row", a, self.nrows);
        check_index("row", b, self.nrows);
        if a == b {
            return;
        }
        for j in 0..self.ncols {
            let (ia, ib) = (self.at(a, j), self.at(b, j));
            self.data.swap(ia, ib);
        }
    }

    /// Swap two columns of the viewed region.
    pub fn swap_columns(&mut self, a: usize, b: usize) {
        check_index("column", a, self.ncols);
        check_index("column", b, self.ncols);
        if a == b {
            return;
        }
        for i in 0..self.nrows {
            let (ia, ib) = (self.at(i, a), self.at(i, b));
            self.data.swap(ia, ib);
        }
    }
}

impl<T: Scalar> MatrixViewMut<'_, T> {
    /// Replace every cell with `f(cell)`.
    pub fn assign(&mut self, f: impl Fn(T) -> T) {
        for i in 0..self.nrows {
            for j in 0..self.ncols {
                let k = self.at(i, j);
                self.data[k] = f(self.data[k]);
            }
        }
    }

    /// Replace every cell with `f(cell, other_cell)`.
    ///
    /// Panics on shape mismatch.
    pub fn assign_with(&mut self, other: &impl MatrixRef<T>, f: impl Fn(T, T) -> T) {
        assert_eq!(
            (self.nrows, self.ncols),
            (other.nrows(), other.ncols()),
            "dimension mismatch",
        );
        for i in 0..self.nrows {
            for j in 0..self.ncols {
                let k = self.at(i, j);
                self.data[k] = f(self.data[k], *other.get(i, j));
            }
        }
    }

    /// Copy every cell of `src` into the viewed region.
    pub fn copy_from(&mut self, src: &impl MatrixRef<T>) {
        self.assign_with(src, |_, b| b);
    }

    /// Set every cell to `value`.
    pub fn fill(&mut self, value: T) {
        self.assign(|_| value);
    }

    /// Deep copy into an owned matrix.
    pub fn to_matrix(&self) -> Matrix<T> {
        self.rb().to_matrix()
    }
}

impl<T> MatrixRef<T> for MatrixViewMut<'_, T> {
    #[inline]
    fn nrows(&self) -> usize {
        self.nrows
    }

    #[inline]
    fn ncols(&self) -> usize {
        self.ncols
    }

    #[inline]
    fn get(&self, row: usize, col: usize) -> &T {
        debug_assert!(row < self.nrows && col < self.ncols);
        &self.data[self.at(row, col)]
    }
}

impl<T> MatrixMut<T> for MatrixViewMut<'_, T> {
    #[inline]
    fn get_mut(&mut self, row: usize, col: usize) -> &mut T {
        debug_assert!(row < self.nrows && col < self.ncols);
        let k = self.at(row, col);
        &mut self.data[k]
    }
}

// ── VectorView ──────────────────────────────────────────────────────

/// Read-only strided view of a row, column or vector range.
pub struct VectorView<'a, T> {
    data: &'a [T],
    offset: usize,
    len: usize,
    stride: usize,
}

impl<T> Clone for VectorView<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for VectorView<'_, T> {}

impl<T: fmt::Debug> fmt::Debug for VectorView<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<'a, T> VectorView<'a, T> {
    pub(crate) fn from_slice(data: &'a [T]) -> Self {
        VectorView {
            data,
            offset: 0,
            len: data.len(),
            stride: 1,
        }
    }

    /// Number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the view is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Reference to element `i`.
    #[inline]
    pub fn get_ref(&self, i: usize) -> &'a T {
        check_index("vector", i, self.len);
        &self.data[self.offset + i * self.stride]
    }

    /// Iterate over the elements in order.
    pub fn iter(&self) -> impl Iterator<Item = &'a T> + 'a {
        let data = self.data;
        let (offset, stride) = (self.offset, self.stride);
        (0..self.len).map(move |i| &data[offset + i * stride])
    }

    /// View of `len` elements starting at `from`.
    pub fn view_part(self, from: usize, len: usize) -> VectorView<'a, T> {
        assert!(
            from.checked_add(len).is_some_and(|e| e <= self.len),
            "view_part [{}..{}) out of bounds for length {}",
            from,
            from + len,
            self.len,
        );
        VectorView {
            data: self.data,
            offset: self.offset + from * self.stride,
            len,
            stride: self.stride,
        }
    }
}

impl<T: Scalar> VectorView<'_, T> {
    /// Element `i` by value.
    #[inline]
    pub fn get(&self, i: usize) -> T {
        *self.get_ref(i)
    }

    /// Deep copy into an owned vector.
    pub fn to_vector(&self) -> Vector<T> {
        Vector::from_vec(self.iter().copied().collect())
    }

    /// Fold every element with `aggr(acc, f(x))`, starting from `f(x[0])`.
    /// Returns `None` when empty.
    pub fn aggregate(&self, aggr: impl Fn(T, T) -> T, f: impl Fn(T) -> T) -> Option<T> {
        let mut it = self.iter();
        let first = f(*it.next()?);
        Some(it.fold(first, |acc, &x| aggr(acc, f(x))))
    }
}

// ── VectorViewMut ───────────────────────────────────────────────────

/// Mutable strided view of a row, column or vector range.
pub struct VectorViewMut<'a, T> {
    data: &'a mut [T],
    offset: usize,
    len: usize,
    stride: usize,
}

impl<'a, T> VectorViewMut<'a, T> {
    pub(crate) fn from_slice(data: &'a mut [T]) -> Self {
        let len = data.len();
        VectorViewMut {
            data,
            offset: 0,
            len,
            stride: 1,
        }
    }

    /// Number of elements.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the view is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Reborrow as a read-only view.
    pub fn rb(&self) -> VectorView<'_, T> {
        VectorView {
            data: self.data,
            offset: self.offset,
            len: self.len,
            stride: self.stride,
        }
    }

    /// Mutable reference to element `i`.
    #[inline]
    pub fn get_mut(&mut self, i: usize) -> &mut T {
        check_index("vector", i, self.len);
        &mut self.data[self.offset + i * self.stride]
    }

    /// Mutable view of `len` elements starting at `from`.
    pub fn view_part_mut(self, from: usize, len: usize) -> VectorViewMut<'a, T> {
        assert!(
            from.checked_add(len).is_some_and(|e| e <= self.len),
            "view_part [{}..{}) out of bounds for length {}",
            from,
            from + len,
            self.len,
        );
        VectorViewMut {
            data: self.data,
            offset: self.offset + from * self.stride,
            len,
            stride: self.stride,
        }
    }

    /// Swap elements `a` and `b`.
    pub fn swap(&mut self, a: usize, b: usize) {
        check_index("vector", a, self.len);
        check_index("vector", b, self.len);
        let (ia, ib) = (self.offset + a * self.stride, self.offset + b * self.stride);
        self.data.swap(ia, ib);
    }
}

impl<T: Scalar> VectorViewMut<'_, T> {
    /// Element `i` by value.
    #[inline]
    pub fn get(&self, i: usize) -> T {
        check_index("vector", i, self.len);
        self.data[self.offset + i * self.stride]
    }

    /// Set element `i`.
    #[inline]
    pub fn set(&mut self, i: usize, value: T) {
        *self.get_mut(i) = value;
    }

    /// Replace every element with `f(x)`.
    pub fn assign(&mut self, f: impl Fn(T) -> T) {
        for i in 0..self.len {
            let k = self.offset + i * self.stride;
            self.data[k] = f(self.data[k]);
        }
    }

    /// Copy `src` element by element. Panics on length mismatch.
    pub fn copy_from(&mut self, src: &VectorView<'_, T>) {
        assert_eq!(self.len, src.len(), "vector length mismatch");
        for (i, &x) in src.iter().enumerate() {
            let k = self.offset + i * self.stride;
            self.data[k] = x;
        }
    }
}

// ── Matrix entry points ─────────────────────────────────────────────

impl<T> Matrix<T> {
    /// Read-only view of the whole matrix.
    pub fn view(&self) -> MatrixView<'_, T> {
        MatrixView {
            data: &self.data,
            offset: 0,
            nrows: self.nrows,
            ncols: self.ncols,
            row_stride: self.ncols,
            col_stride: 1,
        }
    }

    /// Mutable view of the whole matrix.
    pub fn view_mut(&mut self) -> MatrixViewMut<'_, T> {
        MatrixViewMut {
            offset: 0,
            nrows: self.nrows,
            ncols: self.ncols,
            row_stride: self.ncols,
            col_stride: 1,
            data: &mut self.data,
        }
    }

    /// Read-only view of `rows x cols` cells starting at `(row, col)`.
    ///
    /// ```
    /// use linfactor::Matrix;
    /// let m = Matrix::from_fn(3, 3, |i, j| (i * 3 + j) as f64);
    /// let p = m.view_part(1, 1, 2, 2);
    /// assert_eq!(p.to_matrix(), Matrix::from_rows(2, 2, &[4.0, 5.0, 7.0, 8.0]));
    /// ```
    pub fn view_part(&self, row: usize, col: usize, rows: usize, cols: usize) -> MatrixView<'_, T> {
        self.view().view_part(row, col, rows, cols)
    }

    /// Mutable view of `rows x cols` cells starting at `(row, col)`.
    pub fn view_part_mut(&mut self, row: usize, col: usize, rows: usize, cols: usize) -> MatrixViewMut<'_, T> {
        self.view_mut().view_part_mut(row, col, rows, cols)
    }

    /// Row `i` as a read-only vector view.
    pub fn view_row(&self, i: usize) -> VectorView<'_, T> {
        self.view().view_row(i)
    }

    /// Row `i` as a mutable vector view.
    pub fn view_row_mut(&mut self, i: usize) -> VectorViewMut<'_, T> {
        self.view_mut().view_row_mut(i)
    }

    /// Column `j` as a read-only vector view.
    pub fn view_column(&self, j: usize) -> VectorView<'_, T> {
        self.view().view_column(j)
    }

    /// Column `j` as a mutable vector view.
    ///
    /// ```
    /// use linfactor::Matrix;
    /// let mut m = Matrix::from_rows(2, 2, &[1.0, 2.0, 3.0, 4.0]);
    /// m.view_column_mut(1).assign(|x| x * 10.0);
    /// assert_eq!(m[(0, 1)], 20.0);
    /// assert_eq!(m[(1, 1)], 40.0);
    /// ```
    pub fn view_column_mut(&mut self, j: usize) -> VectorViewMut<'_, T> {
        self.view_mut().view_column_mut(j)
    }

    /// Transposed view (no copy).
    pub fn view_dice(&self) -> MatrixView<'_, T> {
        self.view().view_dice()
    }

    /// Mutable transposed view.
    pub fn view_dice_mut(&mut self) -> MatrixViewMut<'_, T> {
        self.view_mut().view_dice_mut()
    }

    /// Split into disjoint mutable blocks of consecutive rows, one per entry
    /// of `counts`. Rows past the sum of `counts` are not covered.
    ///
    /// Panics if the counts add up to more than `nrows`.
    pub fn split_rows_mut(&mut self, counts: &[usize]) -> Vec<MatrixViewMut<'_, T>> {
        let total: usize = counts.iter().sum();
        assert!(total <= self.nrows, "row blocks of {} rows out of bounds for {} rows", total, self.nrows);
        let ncols = self.ncols;
        let mut rest: &mut [T] = &mut self.data;
        let mut blocks = Vec::with_capacity(counts.len());
        for &rows in counts {
            let (head, tail) = core::mem::take(&mut rest).split_at_mut(rows * ncols);
            blocks.push(MatrixViewMut {
                data: head,
                offset: 0,
                nrows: rows,
                ncols,
                row_stride: ncols,
                col_stride: 1,
            });
            rest = tail;
        }
        blocks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_blocks_are_disjoint() {
        let mut m = Matrix::<f64>::zeros(5, 2);
        {
            let mut blocks = m.split_rows_mut(&[2, 3]);
            blocks[0].fill(1.0);
            blocks[1].fill(2.0);
            assert_eq!(blocks[1].nrows(), 3);
        }
        assert_eq!(m.column(0).into_vec(), vec![1.0, 1.0, 2.0, 2.0, 2.0]);
    }

    #[test]
    fn strided_rows_interleave() {
        let m = Matrix::from_fn(6, 1, |i, _| i as f64);
        let even = m.view().view_rows_strided(0, 3, 2);
        assert_eq!(even.to_matrix().into_vec(), vec![0.0, 3.0]);
        let last = m.view().view_rows_strided(2, 3, 2);
        assert_eq!(last.to_matrix().into_vec(), vec![2.0, 5.0]);
    }

    fn mat3x4() -> Matrix<f64> {
        Matrix::from_fn(3, 4, |i, j| (i * 4 + j) as f64)
    }

    #[test]
    fn row_and_column_views() {
        let m = mat3x4();
        let r = m.view_row(1);
        assert_eq!(r.len(), 4);
        assert_eq!(r.get(2), 6.0);
        let c = m.view_column(3);
        assert_eq!(c.len(), 3);
        assert_eq!(c.get(2), 11.0);
    }

    #[test]
    fn dice_swaps_axes() {
        let m = mat3x4();
        let t = m.view_dice();
        assert_eq!(t.shape(), (4, 3));
        for i in 0..3 {
            for j in 0..4 {
                assert_eq!(*t.get(j, i), m[(i, j)]);
            }
        }
    }

    #[test]
    fn nested_parts_compose_offsets() {
        let m = mat3x4();
        let p = m.view_part(1, 1, 2, 3).view_part(1, 1, 1, 2);
        assert_eq!(p.to_matrix(), Matrix::from_rows(1, 2, &[10.0, 11.0]));
        let pt = m.view_dice().view_part(2, 0, 2, 2);
        assert_eq!(pt.to_matrix(), Matrix::from_rows(2, 2, &[2.0, 6.0, 3.0, 7.0]));
    }

    #[test]
    fn writes_alias_the_parent() {
        let mut m = mat3x4();
        {
            let mut part = m.view_part_mut(0, 2, 2, 2);
            part.fill(-1.0);
        }
        assert_eq!(m[(0, 2)], -1.0);
        assert_eq!(m[(1, 3)], -1.0);
        assert_eq!(m[(2, 3)], 11.0);

        m.view_dice_mut().view_row_mut(0).assign(|x| x + 100.0);
        assert_eq!(m[(0, 0)], 100.0);
        assert_eq!(m[(2, 0)], 108.0);
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn part_out_of_bounds() {
        let m = mat3x4();
        let _ = m.view_part(2, 2, 2, 2);
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn row_out_of_bounds() {
        let m = mat3x4();
        let _ = m.view_row(3);
    }

    #[test]
    fn swap_rows_in_view() {
        let mut m = mat3x4();
        m.view_part_mut(0, 0, 3, 2).swap_rows(0, 2);
        assert_eq!(m[(0, 0)], 8.0);
        assert_eq!(m[(2, 1)], 1.0);
        assert_eq!(m[(0, 2)], 2.0);
    }
}

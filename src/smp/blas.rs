use log::trace;

use crate::dense::{MatrixView, MatrixViewMut};
use crate::error::{LinalgError, Result};
use crate::traits::{FloatScalar, MatrixRef};
use crate::{Matrix, Vector};

use super::{row_blocks_mut, Axis, Smp};

/// Dense kernels used by [`Algebra`](crate::Algebra).
///
/// `gemm` and `gemv` follow the BLAS level-3/level-2 conventions: `op(X)`
/// is `X` or `Xᵗ` depending on the transpose flag, and a zero `beta`
/// overwrites the output instead of scaling it.
pub trait Blas<T: FloatScalar> {
    /// `C = alpha · op(A) · op(B) + beta · C`.
    #[allow(clippy::too_many_arguments)]
    fn gemm(
        &self,
        transpose_a: bool,
        transpose_b: bool,
        alpha: T,
        a: &Matrix<T>,
        b: &Matrix<T>,
        beta: T,
        c: &mut Matrix<T>,
    ) -> Result<()>;

    /// `y = alpha · op(A) · x + beta · y`.
    fn gemv(&self, transpose_a: bool, alpha: T, a: &Matrix<T>, x: &Vector<T>, beta: T, y: &mut Vector<T>)
        -> Result<()>;

    /// Reduce `f(a_ij)` with `aggr`; `Ok(None)` for an empty matrix.
    fn aggregate(&self, a: &Matrix<T>, aggr: impl Fn(T, T) -> T + Sync, f: impl Fn(T) -> T + Sync)
        -> Result<Option<T>>;

    /// `a_ij = f(a_ij)` for every cell.
    fn assign(&self, a: &mut Matrix<T>, f: impl Fn(T) -> T + Sync) -> Result<()>;
}

fn op<T>(x: &Matrix<T>, transpose: bool) -> MatrixView<'_, T> {
    if transpose {
        x.view_dice()
    } else {
        x.view()
    }
}

fn check_gemm<T>(a: &MatrixView<'_, T>, b: &MatrixView<'_, T>, c: &Matrix<T>) -> Result<()> {
    if a.ncols() != b.nrows() {
        return Err(LinalgError::shape((a.ncols(), b.ncols()), b.shape()));
    }
    if c.shape() != (a.nrows(), b.ncols()) {
        return Err(LinalgError::shape((a.nrows(), b.ncols()), c.shape()));
    }
    Ok(())
}

fn check_gemv<T>(a: &MatrixView<'_, T>, x: &Vector<T>, y: &Vector<T>) -> Result<()> {
    if x.len() != a.ncols() {
        return Err(LinalgError::shape((a.ncols(), 1), (x.len(), 1)));
    }
    if y.len() != a.nrows() {
        return Err(LinalgError::shape((a.nrows(), 1), (y.len(), 1)));
    }
    Ok(())
}

/// `alpha · A · B` into a fresh matrix, i-k-j order, zero `a_ik` skipped.
fn product<T: FloatScalar>(alpha: T, a: &MatrixView<'_, T>, b: &MatrixView<'_, T>) -> Matrix<T> {
    let (m, k, n) = (a.nrows(), a.ncols(), b.ncols());
    let mut out = Matrix::zeros(m, n);
    for i in 0..m {
        let row = out.row_slice_mut(i);
        for p in 0..k {
            let aip = *a.get(i, p);
            if aip == T::zero() {
                continue;
            }
            let s = alpha * aip;
            for (j, o) in row.iter_mut().enumerate() {
                *o = *o + s * *b.get(p, j);
            }
        }
    }
    out
}

/// `C = P + beta · C`.
fn accumulate<T: FloatScalar>(beta: T, mut c: MatrixViewMut<'_, T>, p: &Matrix<T>) {
    if beta == T::zero() {
        c.copy_from(p);
    } else {
        c.assign_with(p, |c, x| beta * c + x);
    }
}

/// `alpha · A[:, cols] · x[cols]` for one column band of `A`.
fn partial_gemv<T: FloatScalar>(alpha: T, a: &MatrixView<'_, T>, x: &[T]) -> Vec<T> {
    (0..a.nrows())
        .map(|i| {
            let dot = x
                .iter()
                .enumerate()
                .fold(T::zero(), |acc, (j, &xj)| acc + *a.get(i, j) * xj);
            alpha * dot
        })
        .collect()
}

fn view_aggregate<T: FloatScalar>(a: &MatrixView<'_, T>, aggr: &impl Fn(T, T) -> T, f: &impl Fn(T) -> T) -> Option<T> {
    let mut acc: Option<T> = None;
    for i in 0..a.nrows() {
        for j in 0..a.ncols() {
            let v = f(*a.get(i, j));
            acc = Some(match acc {
                Some(x) => aggr(x, v),
                None => v,
            });
        }
    }
    acc
}

fn update_y<T: FloatScalar>(beta: T, y: &mut Vector<T>, ax: &[T]) {
    for (yi, &v) in y.as_mut_slice().iter_mut().zip(ax) {
        *yi = if beta == T::zero() { v } else { beta * *yi + v };
    }
}

/// Single-threaded kernels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeqBlas;

impl<T: FloatScalar> Blas<T> for SeqBlas {
    fn gemm(
        &self,
        transpose_a: bool,
        transpose_b: bool,
        alpha: T,
        a: &Matrix<T>,
        b: &Matrix<T>,
        beta: T,
        c: &mut Matrix<T>,
    ) -> Result<()> {
        let (a, b) = (op(a, transpose_a), op(b, transpose_b));
        check_gemm(&a, &b, c)?;
        let p = product(alpha, &a, &b);
        accumulate(beta, c.view_mut(), &p);
        Ok(())
    }

    fn gemv(
        &self,
        transpose_a: bool,
        alpha: T,
        a: &Matrix<T>,
        x: &Vector<T>,
        beta: T,
        y: &mut Vector<T>,
    ) -> Result<()> {
        let a = op(a, transpose_a);
        check_gemv(&a, x, y)?;
        let ax = partial_gemv(alpha, &a, x.as_slice());
        update_y(beta, y, &ax);
        Ok(())
    }

    fn aggregate(
        &self,
        a: &Matrix<T>,
        aggr: impl Fn(T, T) -> T + Sync,
        f: impl Fn(T) -> T + Sync,
    ) -> Result<Option<T>> {
        Ok(view_aggregate(&a.view(), &aggr, &f))
    }

    fn assign(&self, a: &mut Matrix<T>, f: impl Fn(T) -> T + Sync) -> Result<()> {
        a.assign(f);
        Ok(())
    }
}

/// Block-parallel kernels over an [`Smp`].
///
/// Each call estimates its flop count, asks the executor for a block plan
/// and falls back to [`SeqBlas`] when no plan is worth it. Block tasks read
/// disjoint views and return owned partial results, which the calling
/// thread writes back in block order.
///
/// ```
/// use linfactor::{Blas, Matrix, SeqBlas, Smp, SmpBlas};
///
/// let blas = SmpBlas::new(Smp::new(4).unwrap()).with_threshold(1);
/// let a = Matrix::from_fn(6, 5, |i, j| (i as f64) - 0.5 * j as f64);
/// let b = Matrix::from_fn(5, 7, |i, j| (i * j) as f64 + 1.0);
/// let mut c = Matrix::zeros(6, 7);
/// blas.gemm(false, false, 1.0, &a, &b, 0.0, &mut c).unwrap();
/// assert_eq!(c, a.matmul(&b));
/// ```
#[derive(Debug)]
pub struct SmpBlas {
    smp: Smp,
    threshold: usize,
}

impl SmpBlas {
    /// Kernels on `smp`, using its configured flop threshold.
    pub fn new(smp: Smp) -> Self {
        let threshold = smp.threshold();
        Self { smp, threshold }
    }

    /// Override the minimum flops per task.
    pub fn with_threshold(mut self, threshold: usize) -> Self {
        self.threshold = threshold.max(1);
        self
    }

    #[inline]
    pub fn smp(&self) -> &Smp {
        &self.smp
    }

    /// Give back the executor, e.g. to [`shutdown`](Smp::shutdown) it.
    pub fn into_inner(self) -> Smp {
        self.smp
    }
}

impl<T: FloatScalar> Blas<T> for SmpBlas {
    fn gemm(
        &self,
        transpose_a: bool,
        transpose_b: bool,
        alpha: T,
        a: &Matrix<T>,
        b: &Matrix<T>,
        beta: T,
        c: &mut Matrix<T>,
    ) -> Result<()> {
        let (av, bv) = (op(a, transpose_a), op(b, transpose_b));
        check_gemm(&av, &bv, c)?;
        let flops = 2 * av.nrows() * av.ncols() * bv.ncols();
        let Some(plan) = self.smp.split_blocked(c, self.threshold, flops) else {
            return SeqBlas.gemm(transpose_a, transpose_b, alpha, a, b, beta, c);
        };
        trace!("smp gemm: {} blocks along {:?}", plan.len(), plan.axis());

        // Column bands of C come from column bands of op(B); row bands from
        // row bands of op(A).
        let (blocks_a, blocks_b) = match plan.axis() {
            Axis::Columns => (vec![av; plan.len()], plan.views_of(bv)),
            Axis::Rows => (plan.views_of(av), vec![bv; plan.len()]),
        };
        let parts = self.smp.run(&blocks_a, &blocks_b, |x, y| Ok(product(alpha, x, y)))?;

        for (span, p) in plan.spans().iter().zip(&parts) {
            let target = match plan.axis() {
                Axis::Columns => c.view_part_mut(0, span.offset, c.nrows(), span.span),
                Axis::Rows => c.view_part_mut(span.offset, 0, span.span, c.ncols()),
            };
            accumulate(beta, target, p);
        }
        Ok(())
    }

    fn gemv(
        &self,
        transpose_a: bool,
        alpha: T,
        a: &Matrix<T>,
        x: &Vector<T>,
        beta: T,
        y: &mut Vector<T>,
    ) -> Result<()> {
        let av = op(a, transpose_a);
        check_gemv(&av, x, y)?;
        let flops = 2 * av.nrows() * av.ncols();
        let Some(plan) = self.smp.split_blocked(&av, self.threshold, flops) else {
            return SeqBlas.gemv(transpose_a, alpha, a, x, beta, y);
        };
        let xs = x.as_slice();
        let blocks = plan.views_of(av);
        let parts = match plan.axis() {
            Axis::Rows => self.smp.run_each(&blocks, |blk| Ok(partial_gemv(alpha, blk, xs)))?,
            Axis::Columns => self.smp.run(&blocks, plan.spans(), |blk, span| {
                Ok(partial_gemv(alpha, blk, &xs[span.offset..span.offset + span.span]))
            })?,
        };

        let ax: Vec<T> = match plan.axis() {
            Axis::Rows => parts.into_iter().flatten().collect(),
            Axis::Columns => parts.into_iter().fold(vec![T::zero(); av.nrows()], |mut acc, part| {
                for (s, v) in acc.iter_mut().zip(part) {
                    *s = *s + v;
                }
                acc
            }),
        };
        update_y(beta, y, &ax);
        Ok(())
    }

    fn aggregate(
        &self,
        a: &Matrix<T>,
        aggr: impl Fn(T, T) -> T + Sync,
        f: impl Fn(T) -> T + Sync,
    ) -> Result<Option<T>> {
        let Some(plan) = self.smp.split_blocked(a, self.threshold, a.size()) else {
            return SeqBlas.aggregate(a, aggr, f);
        };
        let blocks = plan.views(a);
        let parts = self
            .smp
            .run_each(&blocks, |blk| Ok(view_aggregate(blk, &aggr, &f)))?;
        Ok(parts.into_iter().flatten().reduce(|x, y| aggr(x, y)))
    }

    fn assign(&self, a: &mut Matrix<T>, f: impl Fn(T) -> T + Sync) -> Result<()> {
        let Some(plan) = self.smp.split_rows(a, self.threshold, a.size()) else {
            return SeqBlas.assign(a, f);
        };
        let blocks = row_blocks_mut(a, &plan);
        self.smp.run_mut(blocks, |blk| {
            blk.assign(&f);
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1e-10;

    fn assert_near(a: f64, b: f64, tol: f64, msg: &str) {
        assert!((a - b).abs() < tol, "{}: {} vs {} (diff {})", msg, a, b, (a - b).abs());
    }

    fn sample(m: usize, n: usize, seed: usize) -> Matrix<f64> {
        Matrix::from_fn(m, n, |i, j| (((i * 31 + j * 17 + seed) % 23) as f64) - 11.0)
    }

    fn parallel() -> SmpBlas {
        SmpBlas::new(Smp::new(4).unwrap()).with_threshold(1)
    }

    #[test]
    fn gemm_matches_sequential_both_axes() {
        let blas = parallel();
        // Wide C splits by columns, narrow C by rows.
        for (m, k, n) in [(3, 5, 9), (9, 5, 2)] {
            let a = sample(m, k, 1);
            let b = sample(k, n, 2);
            let c0 = sample(m, n, 3);
            let mut seq = c0.clone();
            let mut par = c0.clone();
            SeqBlas.gemm(false, false, 2.0, &a, &b, 0.5, &mut seq).unwrap();
            blas.gemm(false, false, 2.0, &a, &b, 0.5, &mut par).unwrap();
            assert_eq!(seq, par, "{}x{}x{}", m, k, n);
        }
        assert!(blas.smp().stats().batches >= 2);
    }

    #[test]
    fn gemm_transposes() {
        let a = sample(5, 3, 4);
        let b = sample(4, 5, 5);
        let mut c = Matrix::zeros(3, 4);
        parallel().gemm(true, true, 1.0, &a, &b, 0.0, &mut c).unwrap();
        assert_eq!(c, a.transpose().matmul(&b.transpose()));
    }

    #[test]
    fn gemm_shape_errors() {
        let a = sample(2, 3, 0);
        let mut c = Matrix::zeros(2, 2);
        assert_eq!(
            SeqBlas.gemm(false, false, 1.0, &a, &sample(2, 2, 0), 0.0, &mut c),
            Err(LinalgError::shape((3, 2), (2, 2)))
        );
        assert_eq!(
            parallel().gemm(false, false, 1.0, &a, &sample(3, 3, 0), 0.0, &mut c),
            Err(LinalgError::shape((2, 3), (2, 2)))
        );
    }

    #[test]
    fn gemv_matches_sequential() {
        let blas = parallel();
        for (m, n) in [(8, 3), (3, 8)] {
            let a = sample(m, n, 6);
            let x = Vector::from_vec((0..n).map(|i| i as f64 - 1.5).collect());
            let y0 = Vector::fill(m, 1.0);
            let mut seq = y0.clone();
            let mut par = y0.clone();
            SeqBlas.gemv(false, 1.5, &a, &x, -1.0, &mut seq).unwrap();
            blas.gemv(false, 1.5, &a, &x, -1.0, &mut par).unwrap();
            for i in 0..m {
                assert_near(seq[i], par[i], TOL, "gemv");
            }
        }
    }

    #[test]
    fn aggregate_and_assign() {
        let blas = parallel();
        let mut a = sample(12, 7, 7);
        let seq = SeqBlas.aggregate(&a, |x, y| x + y, |x| x * x).unwrap().unwrap();
        let par = blas.aggregate(&a, |x, y| x + y, |x| x * x).unwrap().unwrap();
        assert_near(seq, par, TOL, "sum of squares");

        let expected = a.map(|x| 2.0 * x + 1.0);
        blas.assign(&mut a, |x| 2.0 * x + 1.0).unwrap();
        assert_eq!(a, expected);

        assert_eq!(blas.aggregate(&Matrix::<f64>::zeros(0, 0), |x, y| x + y, |x| x), Ok(None));
    }

    #[test]
    fn aggregate_reports_through_the_executor() {
        let blas = parallel();
        let a = sample(12, 7, 3);
        let max = blas.aggregate(&a, f64::max, |x| x).unwrap();
        assert_eq!(max, Some(11.0));
        let stats = blas.smp().stats();
        assert_eq!(stats.batches, 1);
        assert_eq!(stats.tasks, 4);
    }

    #[test]
    fn falls_back_below_threshold() {
        let blas = SmpBlas::new(Smp::new(4).unwrap());
        let a = sample(3, 3, 0);
        let mut c = Matrix::zeros(3, 3);
        blas.gemm(false, false, 1.0, &a, &a, 0.0, &mut c).unwrap();
        assert_eq!(c, a.matmul(&a));
        assert_eq!(blas.smp().stats().tasks, 0);
        blas.into_inner().shutdown();
    }
}

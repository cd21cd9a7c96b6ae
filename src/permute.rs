//! Index permutations of vectors and matrix rows/columns.
//!
//! Every routine follows the gather convention `out[i] = in[indexes[i]]`.
//! Matrix variants pick between two strategies: when the other dimension is
//! small relative to the permuted one they gather each column (row) through
//! a scratch buffer, otherwise they follow the permutation's cycles and
//! swap whole rows (columns) in place.

use crate::dense::VectorViewMut;
use crate::error::{LinalgError, Result};
use crate::traits::Scalar;
use crate::Matrix;

/// Check that `indexes` is a permutation of `0..n`.
pub(crate) fn validate(indexes: &[usize], n: usize) -> Result<()> {
    if indexes.len() != n {
        return Err(LinalgError::InvalidPermutation {
            expected: n,
            got: indexes.len(),
        });
    }
    let mut seen = vec![false; n];
    for &k in indexes {
        if k >= n || seen[k] {
            return Err(LinalgError::InvalidArgument("indexes do not form a permutation"));
        }
        seen[k] = true;
    }
    Ok(())
}

/// Apply `indexes` through a swap callback, following cycles.
///
/// After the call, position `i` holds what was at position `indexes[i]`.
/// `swapper(a, b)` must exchange the items at positions `a` and `b`; it is
/// called at most `n - 1` times.
///
/// ```
/// use linfactor::permute::permute_with_swapper;
///
/// let mut items = ['a', 'b', 'c', 'd'];
/// permute_with_swapper(&[2, 0, 3, 1], |a, b| items.swap(a, b)).unwrap();
/// assert_eq!(items, ['c', 'a', 'd', 'b']);
/// ```
pub fn permute_with_swapper(indexes: &[usize], mut swapper: impl FnMut(usize, usize)) -> Result<()> {
    let n = indexes.len();
    validate(indexes, n)?;

    // tracks[e]: current position of original item e.
    // pos[p]: original item currently at position p.
    let mut tracks: Vec<usize> = (0..n).collect();
    let mut pos: Vec<usize> = (0..n).collect();
    for (i, &want) in indexes.iter().enumerate() {
        let track = tracks[want];
        if i != track {
            swapper(i, track);
            tracks[want] = i;
            tracks[pos[i]] = track;
            pos.swap(i, track);
        }
    }
    Ok(())
}

/// Gather `v[i] = v[indexes[i]]` in place.
///
/// ```
/// use linfactor::permute::permute;
///
/// let mut v = [10.0, 20.0, 30.0];
/// permute(&mut v, &[2, 0, 1]).unwrap();
/// assert_eq!(v, [30.0, 10.0, 20.0]);
/// ```
pub fn permute<T: Copy>(v: &mut [T], indexes: &[usize]) -> Result<()> {
    validate(indexes, v.len())?;
    let work: Vec<T> = indexes.iter().map(|&k| v[k]).collect();
    v.copy_from_slice(&work);
    Ok(())
}

/// Gather through a strided view, reusing `work` as scratch.
fn permute_view<T: Scalar>(v: &mut VectorViewMut<'_, T>, indexes: &[usize], work: &mut Vec<T>) {
    work.clear();
    work.extend(indexes.iter().map(|&k| v.get(k)));
    for (i, &x) in work.iter().enumerate() {
        v.set(i, x);
    }
}

/// Reorder rows so that row `i` becomes old row `indexes[i]`.
///
/// Fails with `InvalidPermutation` when `indexes.len() != a.nrows()`.
pub fn permute_rows<T: Scalar>(a: &mut Matrix<T>, indexes: &[usize]) -> Result<()> {
    let size = a.nrows();
    validate(indexes, size)?;
    if a.ncols() < size / 10 {
        let mut work = Vec::with_capacity(size);
        for j in 0..a.ncols() {
            permute_view(&mut a.view_column_mut(j), indexes, &mut work);
        }
        return Ok(());
    }
    permute_with_swapper(indexes, |x, y| a.swap_rows(x, y))
}

/// Reorder columns so that column `j` becomes old column `indexes[j]`.
///
/// Fails with `InvalidPermutation` when `indexes.len() != a.ncols()`.
pub fn permute_columns<T: Scalar>(a: &mut Matrix<T>, indexes: &[usize]) -> Result<()> {
    let size = a.ncols();
    validate(indexes, size)?;
    if a.nrows() < size / 10 {
        let mut work = Vec::with_capacity(size);
        for i in 0..a.nrows() {
            permute_view(&mut a.view_row_mut(i), indexes, &mut work);
        }
        return Ok(());
    }
    permute_with_swapper(indexes, |x, y| a.swap_columns(x, y))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shuffled(n: usize) -> Vec<usize> {
        // Deterministic derangement-ish permutation: i -> 7i + 3 mod n (n coprime to 7).
        (0..n).map(|i| (7 * i + 3) % n).collect()
    }

    #[test]
    fn swapper_matches_gather() {
        for n in [1, 2, 5, 12, 30] {
            let idx = shuffled(n);
            let mut a: Vec<usize> = (0..n).map(|i| 100 + i).collect();
            let expected: Vec<usize> = idx.iter().map(|&k| a[k]).collect();
            permute_with_swapper(&idx, |x, y| a.swap(x, y)).unwrap();
            assert_eq!(a, expected, "n = {}", n);
        }
    }

    #[test]
    fn swap_count_bounded() {
        let idx = shuffled(30);
        let mut swaps = 0;
        permute_with_swapper(&idx, |_, _| swaps += 1).unwrap();
        assert!(swaps < 30);
    }

    #[test]
    fn rows_agree_across_strategies() {
        // 30 rows: 2 columns takes the gather path, 5 columns the swap path.
        let idx = shuffled(30);
        for cols in [2, 5] {
            let a = Matrix::from_fn(30, cols, |i, j| (i * 10 + j) as f64);
            let mut b = a.clone();
            permute_rows(&mut b, &idx).unwrap();
            for i in 0..30 {
                assert_eq!(b.row(i), a.row(idx[i]), "cols = {}, row {}", cols, i);
            }
        }
    }

    #[test]
    fn columns_agree_across_strategies() {
        let idx = shuffled(30);
        for rows in [2, 5] {
            let a = Matrix::from_fn(rows, 30, |i, j| (i * 100 + j) as f64);
            let mut b = a.clone();
            permute_columns(&mut b, &idx).unwrap();
            for j in 0..30 {
                assert_eq!(b.column(j), a.column(idx[j]), "rows = {}, col {}", rows, j);
            }
        }
    }

    #[test]
    fn wrong_length_is_rejected() {
        let mut a = Matrix::<f64>::zeros(3, 3);
        assert_eq!(
            permute_rows(&mut a, &[0, 1]),
            Err(LinalgError::InvalidPermutation { expected: 3, got: 2 })
        );
        assert_eq!(
            permute_columns(&mut a, &[0, 1, 2, 3]),
            Err(LinalgError::InvalidPermutation { expected: 3, got: 4 })
        );
        let mut v = [1.0, 2.0];
        assert!(matches!(permute(&mut v, &[0, 0]), Err(LinalgError::InvalidArgument(_))));
        assert_eq!(v, [1.0, 2.0]);
    }
}

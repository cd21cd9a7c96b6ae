use crate::dense::MatrixView;
use crate::Matrix;

/// Direction along which a matrix is cut into blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    /// Blocks are bands of whole rows.
    Rows,
    /// Blocks are bands of whole columns.
    Columns,
}

/// One block of a plan: `span` rows or columns starting at `offset`.
///
/// For a strided plan `offset` is the first row and the block takes every
/// `stride`-th row from there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockSpan {
    pub offset: usize,
    pub span: usize,
}

/// Partition of a matrix into disjoint blocks along one axis.
///
/// Blocked plans cut the axis into contiguous bands of equal span, the last
/// one absorbing the remainder. Strided plans deal rows out round-robin.
/// Either way every row (column) along the axis belongs to exactly one
/// block.
///
/// ```
/// use linfactor::{Axis, Matrix, Smp};
///
/// let smp = Smp::new(4).unwrap();
/// let a = Matrix::<f64>::zeros(10, 3);
/// let plan = smp.split_blocked(&a, 1, 100).unwrap();
/// assert_eq!(plan.axis(), Axis::Rows);
/// assert_eq!(plan.len(), 4);
/// let rows: Vec<usize> = plan.views(&a).iter().map(|v| v.nrows()).collect();
/// assert_eq!(rows, vec![2, 2, 2, 4]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockPlan {
    axis: Axis,
    stride: usize,
    spans: Vec<BlockSpan>,
}

impl BlockPlan {
    /// `tasks` contiguous bands over `extent` rows or columns.
    pub(crate) fn blocked(axis: Axis, extent: usize, tasks: usize) -> Self {
        debug_assert!(tasks >= 1 && tasks <= extent);
        let span = extent / tasks;
        let spans = (0..tasks)
            .map(|i| BlockSpan {
                offset: i * span,
                span: if i + 1 == tasks { extent - i * span } else { span },
            })
            .collect();
        Self { axis, stride: 1, spans }
    }

    /// `tasks` interleaved row sets over `extent` rows; block `i` holds rows
    /// `i, i + tasks, i + 2·tasks, ...`.
    pub(crate) fn strided(extent: usize, tasks: usize) -> Self {
        debug_assert!(tasks >= 1 && tasks <= extent);
        let spans = (0..tasks)
            .map(|i| BlockSpan {
                offset: i,
                span: (extent - i).div_ceil(tasks),
            })
            .collect();
        Self {
            axis: Axis::Rows,
            stride: tasks,
            spans,
        }
    }

    #[inline]
    pub fn axis(&self) -> Axis {
        self.axis
    }

    /// Row step inside a block: 1 for blocked plans, the task count for
    /// strided ones.
    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    #[inline]
    pub fn spans(&self) -> &[BlockSpan] {
        &self.spans
    }

    /// Number of blocks.
    #[inline]
    pub fn len(&self) -> usize {
        self.spans.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// Rows (columns) covered by all blocks together.
    pub fn extent(&self) -> usize {
        self.spans.iter().map(|b| b.span).sum()
    }

    /// Block views of `a` in block order.
    ///
    /// Panics if `a` is smaller than the plan along its axis.
    pub fn views<'a, T>(&self, a: &'a Matrix<T>) -> Vec<MatrixView<'a, T>> {
        self.views_of(a.view())
    }

    /// Block views of an arbitrary view.
    pub fn views_of<'a, T>(&self, a: MatrixView<'a, T>) -> Vec<MatrixView<'a, T>> {
        self.spans
            .iter()
            .map(|b| match (self.axis, self.stride) {
                (Axis::Rows, 1) => a.view_part(b.offset, 0, b.span, a.ncols()),
                (Axis::Rows, step) => a.view_rows_strided(b.offset, step, b.span),
                (Axis::Columns, _) => a.view_part(0, b.offset, a.nrows(), b.span),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::MatrixRef;

    #[test]
    fn blocked_last_absorbs_remainder() {
        let plan = BlockPlan::blocked(Axis::Columns, 11, 3);
        let spans: Vec<(usize, usize)> = plan.spans().iter().map(|b| (b.offset, b.span)).collect();
        assert_eq!(spans, vec![(0, 3), (3, 3), (6, 5)]);
        assert_eq!(plan.extent(), 11);
    }

    #[test]
    fn strided_covers_every_row_once() {
        let plan = BlockPlan::strided(7, 3);
        assert_eq!(plan.stride(), 3);
        let a = Matrix::from_fn(7, 2, |i, j| (i * 2 + j) as f64);
        let mut seen = vec![0usize; 7];
        for v in plan.views(&a) {
            for r in 0..v.nrows() {
                let row = *v.get(r, 0) as usize / 2;
                seen[row] += 1;
            }
        }
        assert_eq!(seen, vec![1; 7]);
        assert_eq!(plan.extent(), 7);
    }

    #[test]
    fn column_views_cover_once() {
        let a = Matrix::from_fn(3, 10, |i, j| (i * 10 + j) as f64);
        let plan = BlockPlan::blocked(Axis::Columns, 10, 4);
        let views = plan.views(&a);
        let total: usize = views.iter().map(|v| v.size()).sum();
        assert_eq!(total, a.size());
        let last = views[3].to_matrix();
        assert_eq!(last.ncols(), 4);
        assert_eq!(last[(2, 0)], 26.0);
    }
}

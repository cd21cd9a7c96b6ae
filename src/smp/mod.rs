//! Block-parallel execution.
//!
//! [`Smp`] owns a bounded worker pool and two jobs: planning how to cut a
//! matrix into disjoint row or column blocks ([`BlockPlan`]), and running one
//! kernel task per block with [`Smp::run`]. Results land in a pre-sized slot
//! vector, slot `i` written only by task `i`, so the aggregate always comes
//! back in block order however the tasks were scheduled.
//!
//! With the `parallel` feature (default) the pool is a rayon
//! [`ThreadPool`](rayon::ThreadPool) and [`rayon::ThreadPool::scope`] is the
//! join barrier. Without it, or with a cap of one worker, blocks run on the
//! calling thread in order.
//!
//! [`SmpBlas`] builds the usual dense kernels on top.

mod blas;
mod plan;

pub use blas::{Blas, SeqBlas, SmpBlas};
pub use plan::{Axis, BlockPlan, BlockSpan};

use core::sync::atomic::{AtomicUsize, Ordering};

use log::{debug, trace};

use crate::dense::MatrixViewMut;
use crate::error::{LinalgError, Result};
use crate::traits::MatrixRef;

#[cfg(feature = "parallel")]
type Pool = rayon::ThreadPool;

#[cfg(not(feature = "parallel"))]
#[derive(Debug)]
struct Pool;

/// Flop count per task below which splitting does not pay off.
pub const DEFAULT_THRESHOLD: usize = 30_000;

/// Construction parameters for [`Smp`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SmpConfig {
    /// Worker cap. Clamped to at least 1; 1 means no pool.
    pub max_threads: usize,
    /// Minimum flops per task used by [`SmpBlas`].
    pub threshold: usize,
}

impl Default for SmpConfig {
    /// One worker per available core and a 30 000-flop threshold.
    fn default() -> Self {
        let max_threads = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        Self {
            max_threads,
            threshold: DEFAULT_THRESHOLD,
        }
    }
}

/// Counters of work dispatched through an [`Smp`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SmpStats {
    /// Calls that dispatched at least one block.
    pub batches: usize,
    /// Block tasks run.
    pub tasks: usize,
}

/// Bounded block-task executor.
///
/// ```
/// use linfactor::{Matrix, Smp};
///
/// let smp = Smp::new(2).unwrap();
/// let a = Matrix::from_fn(4, 6, |i, j| (i + j) as f64);
/// let plan = smp.split_blocked(&a, 10, 100).unwrap();
/// let blocks = plan.views(&a);
/// let sums = smp
///     .run_each(&blocks, |b| Ok(b.to_matrix().sum()))
///     .unwrap();
/// assert_eq!(sums.iter().sum::<f64>(), a.sum());
/// smp.shutdown();
/// ```
#[derive(Debug)]
pub struct Smp {
    max_threads: usize,
    threshold: usize,
    pool: Option<Pool>,
    batches: AtomicUsize,
    tasks: AtomicUsize,
}

impl Smp {
    /// Executor with at most `max_threads` workers (clamped to at least 1).
    pub fn new(max_threads: usize) -> Result<Self> {
        Self::from_config(SmpConfig {
            max_threads,
            ..SmpConfig::default()
        })
    }

    /// Executor from a full configuration.
    pub fn from_config(config: SmpConfig) -> Result<Self> {
        let max_threads = config.max_threads.max(1);
        let pool = if max_threads > 1 { build_pool(max_threads)? } else { None };
        debug!(
            "smp: {} worker(s), threshold {} flops, pool {}",
            max_threads,
            config.threshold,
            if pool.is_some() { "created" } else { "not used" }
        );
        Ok(Self {
            max_threads,
            threshold: config.threshold.max(1),
            pool,
            batches: AtomicUsize::new(0),
            tasks: AtomicUsize::new(0),
        })
    }

    /// Executor that never spawns: every block runs on the caller.
    pub fn sequential() -> Self {
        Self {
            max_threads: 1,
            threshold: DEFAULT_THRESHOLD,
            pool: None,
            batches: AtomicUsize::new(0),
            tasks: AtomicUsize::new(0),
        }
    }

    /// Worker cap.
    #[inline]
    pub fn max_threads(&self) -> usize {
        self.max_threads
    }

    /// Configured minimum flops per task.
    #[inline]
    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// Whether a worker pool exists.
    #[inline]
    pub fn is_parallel(&self) -> bool {
        self.pool.is_some()
    }

    /// Snapshot of the dispatch counters.
    pub fn stats(&self) -> SmpStats {
        SmpStats {
            batches: self.batches.load(Ordering::Relaxed),
            tasks: self.tasks.load(Ordering::Relaxed),
        }
    }

    /// Release the pool. Its workers are told to stop and exit on their
    /// own; this does not wait for them.
    pub fn shutdown(self) {
        let stats = self.stats();
        debug!(
            "smp: shutting down after {} batch(es), {} task(s)",
            stats.batches, stats.tasks
        );
        drop(self.pool);
    }

    /// Task count worth running for `flops` of work: `min(flops /
    /// threshold, cap)`, or 0 if that is below 2.
    fn task_count(&self, threshold: usize, flops: usize) -> usize {
        let tasks = (flops / threshold.max(1)).min(self.max_threads);
        if tasks < 2 {
            0
        } else {
            tasks
        }
    }

    /// Plan contiguous blocks over `a` for `flops` of work.
    ///
    /// Splits along columns when `a` has at least as many columns as tasks,
    /// otherwise along rows, then caps the task count at that extent.
    /// Returns `None` when fewer than two tasks would result.
    pub fn split_blocked<T>(&self, a: &impl MatrixRef<T>, threshold: usize, flops: usize) -> Option<BlockPlan> {
        let tasks = self.task_count(threshold, flops);
        if tasks == 0 {
            trace!("smp: {} flops below threshold {}, no split", flops, threshold);
            return None;
        }
        let (axis, extent) = if a.ncols() >= tasks {
            (Axis::Columns, a.ncols())
        } else {
            (Axis::Rows, a.nrows())
        };
        plan_along(axis, extent, tasks, a.nrows(), a.ncols())
    }

    /// Plan blocks that cut `a` and `b` identically.
    ///
    /// Uses the axis [`split_blocked`](Self::split_blocked) would pick for
    /// `a` when `b` has the same extent along it, otherwise the other axis.
    /// `None` when neither axis is shared or fewer than two tasks result.
    pub fn split_blocked_pair<T>(
        &self,
        a: &impl MatrixRef<T>,
        b: &impl MatrixRef<T>,
        threshold: usize,
        flops: usize,
    ) -> Option<BlockPlan> {
        let tasks = self.task_count(threshold, flops);
        if tasks == 0 {
            return None;
        }
        let rows = (Axis::Rows, a.nrows(), a.nrows() == b.nrows());
        let cols = (Axis::Columns, a.ncols(), a.ncols() == b.ncols());
        let order = if a.ncols() >= tasks { [cols, rows] } else { [rows, cols] };
        let (axis, extent, _) = order.into_iter().find(|&(_, _, shared)| shared)?;
        plan_along(axis, extent, tasks, a.nrows(), a.ncols())
    }

    /// Plan contiguous row bands over `a`, whatever its width.
    pub fn split_rows<T>(&self, a: &impl MatrixRef<T>, threshold: usize, flops: usize) -> Option<BlockPlan> {
        let tasks = self.task_count(threshold, flops);
        if tasks == 0 {
            return None;
        }
        plan_along(Axis::Rows, a.nrows(), tasks, a.nrows(), a.ncols())
    }

    /// Plan interleaved row sets over `a`: block `i` gets rows `i`,
    /// `i + tasks`, ... Balances work when row cost grows or shrinks with
    /// the row index.
    pub fn split_strided<T>(&self, a: &impl MatrixRef<T>, threshold: usize, flops: usize) -> Option<BlockPlan> {
        let tasks = self.task_count(threshold, flops).min(a.nrows());
        if tasks < 2 {
            return None;
        }
        debug!("smp: {} strided row blocks over {} rows", tasks, a.nrows());
        Some(BlockPlan::strided(a.nrows(), tasks))
    }

    /// Run `kernel(&blocks_a[i], &blocks_b[i])` for every block pair.
    ///
    /// Blocks until every task has finished. The result is in block order;
    /// if any task fails, the first error in block order is returned.
    pub fn run<A, B, R, F>(&self, blocks_a: &[A], blocks_b: &[B], kernel: F) -> Result<Vec<R>>
    where
        A: Sync,
        B: Sync,
        R: Send,
        F: Fn(&A, &B) -> Result<R> + Sync,
    {
        if blocks_a.len() != blocks_b.len() {
            return Err(LinalgError::shape((blocks_a.len(), 1), (blocks_b.len(), 1)));
        }
        self.dispatch(blocks_a.len(), |i| kernel(&blocks_a[i], &blocks_b[i]))
    }

    /// Run `kernel(&blocks[i])` for every block.
    pub fn run_each<A, R, F>(&self, blocks: &[A], kernel: F) -> Result<Vec<R>>
    where
        A: Sync,
        R: Send,
        F: Fn(&A) -> Result<R> + Sync,
    {
        self.dispatch(blocks.len(), |i| kernel(&blocks[i]))
    }

    /// Run `kernel` on each disjoint mutable block.
    pub fn run_mut<T, F>(&self, blocks: Vec<MatrixViewMut<'_, T>>, kernel: F) -> Result<()>
    where
        T: Send,
        F: Fn(&mut MatrixViewMut<'_, T>) -> Result<()> + Sync,
    {
        let n = blocks.len();
        let mut slots: Vec<(MatrixViewMut<'_, T>, Option<Result<()>>)> =
            blocks.into_iter().map(|b| (b, None)).collect();
        self.count(n);
        match &self.pool {
            #[cfg(feature = "parallel")]
            Some(pool) => pool.scope(|s| {
                let kernel = &kernel;
                for (block, slot) in slots.iter_mut() {
                    s.spawn(move |_| *slot = Some(kernel(block)));
                }
            }),
            _ => {
                for (block, slot) in slots.iter_mut() {
                    *slot = Some(kernel(block));
                }
            }
        }
        slots.into_iter().map(|(_, r)| finished(r)).collect()
    }

    fn count(&self, n: usize) {
        if n == 0 {
            return;
        }
        self.batches.fetch_add(1, Ordering::Relaxed);
        self.tasks.fetch_add(n, Ordering::Relaxed);
        trace!("smp: dispatching {} block task(s)", n);
    }

    fn dispatch<R, F>(&self, n: usize, task: F) -> Result<Vec<R>>
    where
        R: Send,
        F: Fn(usize) -> Result<R> + Sync,
    {
        let mut slots: Vec<Option<Result<R>>> = (0..n).map(|_| None).collect();
        self.count(n);
        match &self.pool {
            #[cfg(feature = "parallel")]
            Some(pool) => pool.scope(|s| {
                let task = &task;
                for (i, slot) in slots.iter_mut().enumerate() {
                    s.spawn(move |_| *slot = Some(task(i)));
                }
            }),
            _ => {
                for (i, slot) in slots.iter_mut().enumerate() {
                    *slot = Some(task(i));
                }
            }
        }
        slots.into_iter().map(finished).collect()
    }
}

impl Default for Smp {
    fn default() -> Self {
        Self::sequential()
    }
}

fn finished<R>(slot: Option<Result<R>>) -> Result<R> {
    slot.unwrap_or_else(|| Err(LinalgError::ThreadPool("block task did not complete".into())))
}

fn plan_along(axis: Axis, extent: usize, tasks: usize, nrows: usize, ncols: usize) -> Option<BlockPlan> {
    let tasks = tasks.min(extent);
    if tasks < 2 {
        trace!("smp: {}x{} too small to split along {:?}", nrows, ncols, axis);
        return None;
    }
    debug!("smp: {} blocks along {:?} of a {}x{} matrix", tasks, axis, nrows, ncols);
    Some(BlockPlan::blocked(axis, extent, tasks))
}

#[cfg(feature = "parallel")]
fn build_pool(threads: usize) -> Result<Option<Pool>> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .thread_name(|i| format!("linfactor-smp-{}", i))
        .build()
        .map_err(|e| LinalgError::ThreadPool(e.to_string()))?;
    debug!("smp: thread pool of {} started", threads);
    Ok(Some(pool))
}

#[cfg(not(feature = "parallel"))]
fn build_pool(threads: usize) -> Result<Option<Pool>> {
    debug!("smp: built without `parallel`, {} requested worker(s) run inline", threads);
    Ok(None)
}

/// Mutable row bands of `a` following a row-axis plan.
pub(crate) fn row_blocks_mut<'a, T>(a: &'a mut crate::Matrix<T>, plan: &BlockPlan) -> Vec<MatrixViewMut<'a, T>> {
    debug_assert_eq!(plan.axis(), Axis::Rows);
    debug_assert_eq!(plan.stride(), 1);
    let counts: Vec<usize> = plan.spans().iter().map(|b| b.span).collect();
    a.split_rows_mut(&counts)
}

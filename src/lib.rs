//! # linfactor
//!
//! Dense real linear algebra: LU and singular value decompositions, a
//! tolerance-based structural classifier, and a block-parallel executor for
//! the heavy kernels.
//!
//! ## Quick start
//!
//! ```
//! use linfactor::{Algebra, LuDecomposition, Matrix, Vector};
//!
//! // Solve a linear system Ax = b
//! let a = Matrix::from_rows(3, 3, &[
//!     2.0_f64, 1.0, -1.0,
//!     -3.0, -1.0, 2.0,
//!     -2.0, 1.0, 2.0,
//! ]);
//! let b = Vector::from_slice(&[8.0, -11.0, -3.0]);
//! let x = LuDecomposition::new(&a).solve(&b).unwrap(); // x = [2, 3, -1]
//! assert!((x[0] - 2.0).abs() < 1e-12);
//!
//! let alg = Algebra::standard();
//! assert!((alg.det(&a).unwrap() + 1.0).abs() < 1e-12);
//! ```
//!
//! ## Modules
//!
//! - [`Matrix`] / [`Vector`]: heap-allocated, row-major containers with
//!   aliasing strided views ([`MatrixView`], [`MatrixViewMut`],
//!   [`VectorView`], [`VectorViewMut`]). `view_dice` is a transpose that
//!   copies nothing; writes through a mutable view land in the parent.
//!
//! - [`property`]: [`Property`], an immutable tolerance object answering
//!   structural questions (triangular, banded, symmetric, orthogonal,
//!   diagonally dominant, singular) about any [`MatrixRef`].
//!
//! - [`linalg`]: [`LuDecomposition`] (partial pivoting, sparsity-aware
//!   Crout elimination, tridiagonal fast path), [`QrDecomposition`]
//!   (Householder least squares) and [`SingularValueDecomposition`]
//!   (Golub–Reinsch with incremental column updates).
//!
//! - [`algebra`]: [`Algebra`], the façade for inverse, solve, norms, rank,
//!   condition number, powers and permutations.
//!
//! - [`smp`]: [`Smp`] block planner and executor, and the [`Blas`] kernels
//!   ([`SeqBlas`], [`SmpBlas`]) that use it.
//!
//! - [`permute`]: gather-style permutations of slices and matrix rows or
//!   columns.
//!
//! - [`traits`]: element traits [`Scalar`] / [`FloatScalar`] and the
//!   [`MatrixRef`] / [`MatrixMut`] access seams.
//!
//! ## Logging
//!
//! Diagnostics go through the [`log`] facade: planning decisions and pool
//! lifecycle at `debug`, per-batch dispatch at `trace`, SVD non-convergence
//! at `warn`. No logger is installed by the library.
//!
//! ## Cargo features
//!
//! | Feature    | Default | Description |
//! |------------|---------|-------------|
//! | `parallel` | yes     | [`Smp`] runs block tasks on a rayon thread pool; without it blocks run inline |

pub mod algebra;
mod dense;
pub mod error;
pub mod linalg;
pub mod permute;
pub mod property;
pub mod smp;
pub mod traits;

pub use algebra::Algebra;
pub use dense::{Matrix, MatrixView, MatrixViewMut, Vector, VectorView, VectorViewMut};
pub use error::{LinalgError, Result};
pub use linalg::{LuDecomposition, QrDecomposition, SingularValueDecomposition};
pub use property::{Property, PropertyReport};
pub use smp::{Axis, Blas, BlockPlan, BlockSpan, SeqBlas, Smp, SmpBlas, SmpConfig, SmpStats};
pub use traits::{FloatScalar, MatrixMut, MatrixRef, Scalar};

/// Common imports.
///
/// ```
/// use linfactor::prelude::*;
///
/// let a = Matrix::<f64>::identity(2);
/// assert!(Property::standard().is_identity(&a));
/// ```
pub mod prelude {
    pub use crate::{
        Algebra, Blas, FloatScalar, LinalgError, LuDecomposition, Matrix, MatrixMut, MatrixRef, Property,
        QrDecomposition, SingularValueDecomposition, Smp, SmpBlas, Vector,
    };
}

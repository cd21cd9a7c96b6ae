use thiserror::Error;

/// Errors from linear algebra operations.
///
/// Returned by decompositions, the [`Algebra`](crate::Algebra) façade,
/// square-only [`Property`](crate::Property) predicates and the SMP engine.
///
/// ```
/// use linfactor::{Algebra, LinalgError, Matrix};
///
/// let singular = Matrix::from_rows(2, 2, &[1.0_f64, 2.0, 2.0, 4.0]);
/// assert_eq!(Algebra::standard().inverse(&singular).unwrap_err(), LinalgError::Singular);
///
/// let wide = Matrix::zeros(2, 3);
/// assert_eq!(
///     Algebra::<f64>::standard().det(&wide).unwrap_err(),
///     LinalgError::NotSquare { rows: 2, cols: 3 },
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LinalgError {
    /// Operand shapes do not agree.
    #[error("dimension mismatch: expected {}x{}, got {}x{}", expected.0, expected.1, got.0, got.1)]
    ShapeMismatch {
        /// Expected `(rows, cols)`.
        expected: (usize, usize),
        /// Got `(rows, cols)`.
        got: (usize, usize),
    },

    /// A square matrix was required.
    #[error("matrix must be square, got {rows}x{cols}")]
    NotSquare { rows: usize, cols: usize },

    /// A matrix with at least as many rows as columns was required.
    #[error("matrix must be rectangular (rows >= columns), got {rows}x{cols}")]
    NotRectangular { rows: usize, cols: usize },

    /// Matrix is singular or nearly singular.
    #[error("matrix is singular")]
    Singular,

    /// Matrix does not have full column rank (least squares).
    #[error("matrix is rank deficient")]
    RankDeficient,

    /// Iterative algorithm did not converge within the iteration budget.
    #[error("iterative algorithm did not converge")]
    ConvergenceFailure,

    /// Permutation index array has the wrong length.
    #[error("invalid permutation: expected {expected} indexes, got {got}")]
    InvalidPermutation { expected: usize, got: usize },

    /// Argument outside the operation's domain.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// The worker pool could not be built.
    #[error("worker pool: {0}")]
    ThreadPool(String),
}

impl LinalgError {
    pub(crate) fn shape(expected: (usize, usize), got: (usize, usize)) -> Self {
        LinalgError::ShapeMismatch { expected, got }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = core::result::Result<T, LinalgError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        let e = LinalgError::shape((2, 3), (3, 2));
        assert_eq!(e.to_string(), "dimension mismatch: expected 2x3, got 3x2");
        assert_eq!(
            LinalgError::NotSquare { rows: 2, cols: 5 }.to_string(),
            "matrix must be square, got 2x5"
        );
        assert_eq!(LinalgError::Singular.to_string(), "matrix is singular");
    }
}

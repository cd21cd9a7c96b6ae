//! Matrix decompositions.
//!
//! - [`LuDecomposition`]: partial-pivot LU with sparsity-aware Crout
//!   elimination and a tridiagonal fast path
//! - [`QrDecomposition`]: Householder QR for least squares
//! - [`SingularValueDecomposition`]: Golub–Reinsch SVD with column updates

pub(crate) mod lu;
pub(crate) mod qr;
pub(crate) mod svd;

pub use lu::LuDecomposition;
pub use qr::QrDecomposition;
pub use svd::SingularValueDecomposition;

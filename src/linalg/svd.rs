use core::fmt;

use log::{debug, warn};

use crate::error::{LinalgError, Result};
use crate::traits::{FloatScalar, MatrixRef};
use crate::{Matrix, Vector};

/// QR sweeps allowed per singular value before giving up.
const MAX_SWEEPS: usize = 75;

/// Singular value decomposition `A = U · diag(s) · Vᵗ` of an `m x n`
/// matrix with `m >= n`.
///
/// `U` is `m x n` with orthonormal columns, `s` holds the `n` singular
/// values (non-negative, descending unless ordering was disabled) and `V`
/// is `N x n` where `N` counts the source columns seen so far. Both
/// factors are optional.
///
/// The decomposition can be grown one column at a time with
/// [`update`](Self::update) and truncated with [`reduce_to`](Self::reduce_to).
///
/// # Example
///
/// ```
/// use linfactor::{Matrix, SingularValueDecomposition};
///
/// let a = Matrix::from_rows(3, 2, &[3.0_f64, 0.0, 0.0, 4.0, 0.0, 0.0]);
/// let svd = SingularValueDecomposition::new(&a).unwrap();
/// assert!((svd.singular_values()[0] - 4.0).abs() < 1e-12);
/// assert!((svd.singular_values()[1] - 3.0).abs() < 1e-12);
/// assert_eq!(svd.rank(), 2);
/// assert!((svd.cond() - 4.0 / 3.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone)]
pub struct SingularValueDecomposition<T> {
    u: Option<Matrix<T>>,
    s: Vec<T>,
    v: Option<Matrix<T>>,
    m: usize,
    ordered: bool,
}

impl<T: FloatScalar> SingularValueDecomposition<T> {
    /// Decompose `a`, computing `U` and `V`, singular values descending.
    pub fn new(a: &impl MatrixRef<T>) -> Result<Self> {
        Self::with_options(a, true, true, true)
    }

    /// Decompose `a`, choosing which factors to compute and whether to sort
    /// the singular values. Fails with `NotRectangular` when `m < n`.
    pub fn with_options(a: &impl MatrixRef<T>, want_u: bool, want_v: bool, order: bool) -> Result<Self> {
        let (m, n) = (a.nrows(), a.ncols());
        if m < n {
            return Err(LinalgError::NotRectangular { rows: m, cols: n });
        }
        let (u, s, v) = golub_reinsch(Matrix::copy_of(a), want_u, want_v, order)?;
        Ok(Self {
            u,
            s,
            v,
            m,
            ordered: order,
        })
    }

    /// Decomposition of an `m x 0` matrix, the starting point for building
    /// an SVD column by column with [`update`](Self::update).
    ///
    /// ```
    /// use linfactor::{SingularValueDecomposition, Vector};
    /// let mut svd = SingularValueDecomposition::<f64>::empty(3);
    /// svd.update(&Vector::from_slice(&[0.0, 3.0, 4.0]), true).unwrap();
    /// assert_eq!(svd.ncols(), 1);
    /// assert!((svd.singular_values()[0] - 5.0).abs() < 1e-12);
    /// ```
    pub fn empty(m: usize) -> Self {
        Self {
            u: Some(Matrix::zeros(m, 0)),
            s: Vec::new(),
            v: Some(Matrix::zeros(0, 0)),
            m,
            ordered: true,
        }
    }

    /// Row count `m` of the decomposed matrix.
    #[inline]
    pub fn nrows(&self) -> usize {
        self.m
    }

    /// Number of singular values `n`.
    #[inline]
    pub fn ncols(&self) -> usize {
        self.s.len()
    }

    /// Singular values.
    #[inline]
    pub fn singular_values(&self) -> &[T] {
        &self.s
    }

    /// `n x n` diagonal matrix of singular values.
    pub fn s(&self) -> Matrix<T> {
        Matrix::from_diagonal(&self.s)
    }

    /// Left singular vectors, if computed.
    #[inline]
    pub fn u(&self) -> Option<&Matrix<T>> {
        self.u.as_ref()
    }

    /// Right singular vectors, if computed.
    #[inline]
    pub fn v(&self) -> Option<&Matrix<T>> {
        self.v.as_ref()
    }

    /// Number of singular values above `max(m, n) · s[0] · ε`.
    pub fn rank(&self) -> usize {
        let Some(&s0) = self.s.first() else {
            return 0;
        };
        let tol = T::from_usize(self.m.max(self.s.len())) * s0 * T::epsilon();
        self.s.iter().filter(|&&x| x > tol).count()
    }

    /// Largest singular value; zero when there are none.
    pub fn norm2(&self) -> T {
        self.s.first().copied().unwrap_or_else(T::zero)
    }

    /// Ratio of the largest to the smallest singular value; zero when there
    /// are none.
    pub fn cond(&self) -> T {
        match (self.s.first(), self.s.last()) {
            (Some(&hi), Some(&lo)) => hi / lo,
            _ => T::zero(),
        }
    }

    /// Truncate to the numerical rank.
    pub fn reduce(&mut self) {
        let r = self.rank();
        self.truncate(r);
    }

    /// Keep only the first `r` singular triplets. Irreversible.
    pub fn reduce_to(&mut self, r: usize) -> Result<()> {
        if r > self.s.len() {
            return Err(LinalgError::InvalidArgument(
                "reduced rank exceeds the number of singular values",
            ));
        }
        self.truncate(r);
        Ok(())
    }

    fn truncate(&mut self, r: usize) {
        self.s.truncate(r);
        if let Some(u) = self.u.as_mut() {
            *u = u.left_columns(r);
        }
        if let Some(v) = self.v.as_mut() {
            *v = v.left_columns(r);
        }
    }

    /// Append one source column `d` (length `m`).
    ///
    /// Projects `d` onto the current basis, `l = Uᵗd`, and takes the
    /// residual `r = d - Ul`. When `‖r‖` is NaN or below
    /// `max(m, n + 1) · ε · max(s[0], ‖d‖)` the column lies in the span of
    /// `U` and nothing changes. Otherwise the bordered `(n + 1) x (n + 1)`
    /// matrix `[diag(s), l; 0, ‖r‖]` is decomposed and its factors are
    /// folded into `U`, `s` and `V`.
    ///
    /// With `want_v` the existing `V` is extended (it must have been
    /// computed); without it `V` is discarded.
    pub fn update(&mut self, d: &Vector<T>, want_v: bool) -> Result<()> {
        let u = self
            .u
            .as_ref()
            .ok_or(LinalgError::InvalidArgument("update requires U"))?;
        if want_v && self.v.is_none() {
            return Err(LinalgError::InvalidArgument("update with want_v requires V"));
        }
        let m = self.m;
        if d.len() != m {
            return Err(LinalgError::shape((m, 1), (d.len(), 1)));
        }
        let n = self.s.len();

        let mut l = vec![T::zero(); n];
        for (j, lj) in l.iter_mut().enumerate() {
            *lj = (0..m).fold(T::zero(), |acc, i| acc + u[(i, j)] * d[i]);
        }
        let mut r = vec![T::zero(); m];
        for (i, ri) in r.iter_mut().enumerate() {
            let ul = (0..n).fold(T::zero(), |acc, j| acc + u[(i, j)] * l[j]);
            *ri = d[i] - ul;
        }
        let k = r.iter().fold(T::zero(), |acc, &x| acc.hypot(x));

        let scale = self.norm2().max(d.norm());
        let threshold = T::from_usize(m.max(n + 1)) * T::epsilon() * scale;
        if k.is_nan() || k <= threshold {
            debug!("svd update: column lies in the span of U (residual {}), no-op", k);
            if !want_v {
                self.v = None;
            }
            return Ok(());
        }

        let mut q = Matrix::zeros(n + 1, n + 1);
        for i in 0..n {
            q[(i, i)] = self.s[i];
            q[(i, n)] = l[i];
        }
        q[(n, n)] = k;
        let (uq, sq, vq) = golub_reinsch(q, true, want_v, self.ordered)?;

        let mut basis = Matrix::zeros(m, n + 1);
        basis.set_block(0, 0, u);
        for (i, &ri) in r.iter().enumerate() {
            basis[(i, n)] = ri / k;
        }
        let uq = uq.ok_or(LinalgError::ConvergenceFailure)?;
        self.u = Some(basis.matmul(&uq));
        self.s = sq;

        self.v = match (want_v, self.v.take(), vq) {
            (true, Some(v), Some(vq)) => {
                let big_n = v.nrows();
                let mut bordered = Matrix::zeros(big_n + 1, n + 1);
                bordered.set_block(0, 0, &v);
                bordered[(big_n, n)] = T::one();
                Some(bordered.matmul(&vq))
            }
            _ => None,
        };
        Ok(())
    }
}

impl<T: FloatScalar> fmt::Display for SingularValueDecomposition<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "SVD of {} rows, {} singular values", self.m, self.s.len())?;
        writeln!(f, "rank: {}", self.rank())?;
        writeln!(f, "norm2: {}", self.norm2())?;
        writeln!(f, "cond: {}", self.cond())?;
        write!(f, "singular values: [")?;
        for (i, x) in self.s.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", x)?;
        }
        write!(f, "]")?;
        if let Some(u) = &self.u {
            write!(f, "\nU:\n{}", u)?;
        }
        if let Some(v) = &self.v {
            write!(f, "\nV:\n{}", v)?;
        }
        Ok(())
    }
}

type Factors<T> = (Option<Matrix<T>>, Vec<T>, Option<Matrix<T>>);

/// Golub–Reinsch SVD of `a` (`m >= n`): Householder bidiagonalisation,
/// explicit generation of `U` / `V`, then implicit-shift QR on the
/// bidiagonal.
fn golub_reinsch<T: FloatScalar>(mut a: Matrix<T>, want_u: bool, want_v: bool, order: bool) -> Result<Factors<T>> {
    let (m, n) = a.shape();
    debug_assert!(m >= n);
    if n == 0 {
        return Ok((
            want_u.then(|| Matrix::zeros(m, 0)),
            Vec::new(),
            want_v.then(|| Matrix::zeros(0, 0)),
        ));
    }

    let mut s = vec![T::zero(); n];
    let mut e = vec![T::zero(); n];
    let mut work = vec![T::zero(); m];
    let mut u = Matrix::zeros(m, n);
    let mut v = Matrix::zeros(n, n);

    // ── Bidiagonalisation ───────────────────────────────────────────

    let nct = (m - 1).min(n);
    let nrt = if n >= 2 { (n - 2).min(m) } else { 0 };
    for k in 0..nct.max(nrt) {
        if k < nct {
            // Column transformation: 2-norm of column k below the diagonal.
            s[k] = T::zero();
            for i in k..m {
                s[k] = s[k].hypot(a[(i, k)]);
            }
            if s[k] != T::zero() {
                if a[(k, k)] < T::zero() {
                    s[k] = -s[k];
                }
                for i in k..m {
                    a[(i, k)] = a[(i, k)] / s[k];
                }
                a[(k, k)] = a[(k, k)] + T::one();
            }
            s[k] = -s[k];
        }
        for j in (k + 1)..n {
            if k < nct && s[k] != T::zero() {
                let mut t = T::zero();
                for i in k..m {
                    t = t + a[(i, k)] * a[(i, j)];
                }
                t = -t / a[(k, k)];
                for i in k..m {
                    a[(i, j)] = a[(i, j)] + t * a[(i, k)];
                }
            }
            // Row k of A, used for the row transformation.
            e[j] = a[(k, j)];
        }
        if want_u && k < nct {
            for i in k..m {
                u[(i, k)] = a[(i, k)];
            }
        }
        if k < nrt {
            // Row transformation: 2-norm of e right of the superdiagonal.
            e[k] = T::zero();
            for i in (k + 1)..n {
                e[k] = e[k].hypot(e[i]);
            }
            if e[k] != T::zero() {
                if e[k + 1] < T::zero() {
                    e[k] = -e[k];
                }
                for i in (k + 1)..n {
                    e[i] = e[i] / e[k];
                }
                e[k + 1] = e[k + 1] + T::one();
            }
            e[k] = -e[k];
            if k + 1 < m && e[k] != T::zero() {
                for w in work.iter_mut().skip(k + 1) {
                    *w = T::zero();
                }
                for j in (k + 1)..n {
                    for i in (k + 1)..m {
                        work[i] = work[i] + e[j] * a[(i, j)];
                    }
                }
                for j in (k + 1)..n {
                    let t = -e[j] / e[k + 1];
                    for i in (k + 1)..m {
                        a[(i, j)] = a[(i, j)] + t * work[i];
                    }
                }
            }
            if want_v {
                for i in (k + 1)..n {
                    v[(i, k)] = e[i];
                }
            }
        }
    }

    // Final bidiagonal of order p.
    let mut p = n;
    if nct < n {
        s[nct] = a[(nct, nct)];
    }
    if nrt + 1 < p {
        e[nrt] = a[(nrt, p - 1)];
    }
    e[p - 1] = T::zero();

    // ── Generate U ──────────────────────────────────────────────────

    if want_u {
        for j in nct..n {
            for i in 0..m {
                u[(i, j)] = T::zero();
            }
            u[(j, j)] = T::one();
        }
        for k in (0..nct).rev() {
            if s[k] != T::zero() {
                for j in (k + 1)..n {
                    let mut t = T::zero();
                    for i in k..m {
                        t = t + u[(i, k)] * u[(i, j)];
                    }
                    t = -t / u[(k, k)];
                    for i in k..m {
                        u[(i, j)] = u[(i, j)] + t * u[(i, k)];
                    }
                }
                for i in k..m {
                    u[(i, k)] = -u[(i, k)];
                }
                u[(k, k)] = T::one() + u[(k, k)];
                for i in 0..k {
                    u[(i, k)] = T::zero();
                }
            } else {
                for i in 0..m {
                    u[(i, k)] = T::zero();
                }
                u[(k, k)] = T::one();
            }
        }
    }

    // ── Generate V ──────────────────────────────────────────────────

    if want_v {
        for k in (0..n).rev() {
            if k < nrt && e[k] != T::zero() {
                for j in (k + 1)..n {
                    let mut t = T::zero();
                    for i in (k + 1)..n {
                        t = t + v[(i, k)] * v[(i, j)];
                    }
                    t = -t / v[(k + 1, k)];
                    for i in (k + 1)..n {
                        v[(i, j)] = v[(i, j)] + t * v[(i, k)];
                    }
                }
            }
            for i in 0..n {
                v[(i, k)] = T::zero();
            }
            v[(k, k)] = T::one();
        }
    }

    // ── Implicit-shift QR on the bidiagonal ─────────────────────────

    let pp = p - 1;
    let eps = T::epsilon();
    let tiny = T::min_positive_value() / eps;
    let mut sweeps = 0usize;

    while p > 0 {
        // Find the largest k < p - 1 with a negligible e[k]; `lo` is the
        // start of the unreduced block.
        let mut lo = 0;
        for k in (0..p - 1).rev() {
            if e[k].abs() <= tiny + eps * (s[k].abs() + s[k + 1].abs()) {
                e[k] = T::zero();
                lo = k + 1;
                break;
            }
        }

        enum Kase {
            Deflate,
            Split(usize),
            Sweep,
            Converged,
        }

        let kase = if lo == p - 1 {
            Kase::Converged
        } else {
            let mut negligible = None;
            for ks in (lo..p).rev() {
                let t = e[ks].abs() + if ks != lo { e[ks - 1].abs() } else { T::zero() };
                if s[ks].abs() <= tiny + eps * t {
                    s[ks] = T::zero();
                    negligible = Some(ks);
                    break;
                }
            }
            match negligible {
                None => Kase::Sweep,
                Some(ks) if ks == p - 1 => Kase::Deflate,
                Some(ks) => Kase::Split(ks + 1),
            }
        };

        match kase {
            // s[p-1] is negligible: chase e[p-2] up the bidiagonal.
            Kase::Deflate => {
                let k = lo;
                let mut f = e[p - 2];
                e[p - 2] = T::zero();
                for j in (k..=p - 2).rev() {
                    let t = s[j].hypot(f);
                    let cs = s[j] / t;
                    let sn = f / t;
                    s[j] = t;
                    if j != k {
                        f = -sn * e[j - 1];
                        e[j - 1] = cs * e[j - 1];
                    }
                    if want_v {
                        rotate_columns(&mut v, j, p - 1, cs, sn);
                    }
                }
            }

            // s[k-1] is negligible: split the problem at k.
            Kase::Split(k) => {
                let mut f = e[k - 1];
                e[k - 1] = T::zero();
                for j in k..p {
                    let t = s[j].hypot(f);
                    let cs = s[j] / t;
                    let sn = f / t;
                    s[j] = t;
                    f = -sn * e[j];
                    e[j] = cs * e[j];
                    if want_u {
                        rotate_columns(&mut u, j, k - 1, cs, sn);
                    }
                }
            }

            // One QR sweep with a shift from the trailing 2x2.
            Kase::Sweep => {
                let k = lo;
                sweeps += 1;
                if sweeps > MAX_SWEEPS {
                    warn!(
                        "svd {}x{}: no convergence after {} sweeps at singular value {}",
                        m, n, MAX_SWEEPS, p - 1
                    );
                    return Err(LinalgError::ConvergenceFailure);
                }

                let scale = s[p - 1]
                    .abs()
                    .max(s[p - 2].abs())
                    .max(e[p - 2].abs())
                    .max(s[k].abs())
                    .max(e[k].abs());
                let sp = s[p - 1] / scale;
                let spm1 = s[p - 2] / scale;
                let epm1 = e[p - 2] / scale;
                let sk = s[k] / scale;
                let ek = e[k] / scale;
                let two = T::one() + T::one();
                let b = ((spm1 + sp) * (spm1 - sp) + epm1 * epm1) / two;
                let c = (sp * epm1) * (sp * epm1);
                let mut shift = T::zero();
                if b != T::zero() || c != T::zero() {
                    shift = (b * b + c).sqrt();
                    if b < T::zero() {
                        shift = -shift;
                    }
                    shift = c / (b + shift);
                }
                let mut f = (sk + sp) * (sk - sp) + shift;
                let mut g = sk * ek;

                for j in k..p - 1 {
                    let t = f.hypot(g);
                    let cs = f / t;
                    let sn = g / t;
                    if j != k {
                        e[j - 1] = t;
                    }
                    f = cs * s[j] + sn * e[j];
                    e[j] = cs * e[j] - sn * s[j];
                    g = sn * s[j + 1];
                    s[j + 1] = cs * s[j + 1];
                    if want_v {
                        rotate_columns(&mut v, j, j + 1, cs, sn);
                    }

                    let t = f.hypot(g);
                    let cs = f / t;
                    let sn = g / t;
                    s[j] = t;
                    f = cs * e[j] + sn * s[j + 1];
                    s[j + 1] = -sn * e[j] + cs * s[j + 1];
                    g = sn * e[j + 1];
                    e[j + 1] = cs * e[j + 1];
                    if want_u {
                        rotate_columns(&mut u, j, j + 1, cs, sn);
                    }
                }
                e[p - 2] = f;
            }

            // s[p-1] converged: make it non-negative and move it into place.
            Kase::Converged => {
                let mut k = lo;
                if s[k] <= T::zero() {
                    s[k] = if s[k] < T::zero() { -s[k] } else { T::zero() };
                    if want_v {
                        for i in 0..=pp {
                            v[(i, k)] = -v[(i, k)];
                        }
                    }
                }
                if order {
                    while k < pp && s[k] < s[k + 1] {
                        s.swap(k, k + 1);
                        if want_v {
                            v.swap_columns(k, k + 1);
                        }
                        if want_u {
                            u.swap_columns(k, k + 1);
                        }
                        k += 1;
                    }
                }
                sweeps = 0;
                p -= 1;
            }
        }
    }

    Ok((want_u.then_some(u), s, want_v.then_some(v)))
}

/// Plane rotation of columns `j` and `k`:
/// `(x_j, x_k) <- (cs·x_j + sn·x_k, -sn·x_j + cs·x_k)`.
fn rotate_columns<T: FloatScalar>(x: &mut Matrix<T>, j: usize, k: usize, cs: T, sn: T) {
    for i in 0..x.nrows() {
        let (xj, xk) = (x[(i, j)], x[(i, k)]);
        x[(i, j)] = cs * xj + sn * xk;
        x[(i, k)] = -sn * xj + cs * xk;
    }
}

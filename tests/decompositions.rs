use linfactor::{Algebra, LuDecomposition, Matrix, Property, SingularValueDecomposition, Vector};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const TOL: f64 = 1e-9;

fn assert_near(a: f64, b: f64, tol: f64, msg: &str) {
    assert!((a - b).abs() < tol, "{}: {} vs {} (diff {})", msg, a, b, (a - b).abs());
}

fn random_matrix(rng: &mut StdRng, m: usize, n: usize) -> Matrix<f64> {
    let data = (0..m * n).map(|_| rng.gen_range(-1.0..1.0)).collect();
    Matrix::from_vec(m, n, data)
}

fn max_abs_diff(a: &Matrix<f64>, b: &Matrix<f64>) -> f64 {
    assert_eq!(a.shape(), b.shape());
    a.as_slice()
        .iter()
        .zip(b.as_slice())
        .fold(0.0, |acc, (x, y)| f64::max(acc, (x - y).abs()))
}

// ── LU ───────────────────────────────────────────────────────────────

#[test]
fn lu_round_trip_random() {
    let mut rng = StdRng::seed_from_u64(7);
    for &(m, n) in &[(1, 1), (4, 4), (9, 9), (7, 4), (4, 7), (25, 25)] {
        let a = random_matrix(&mut rng, m, n);
        let lu = LuDecomposition::new(&a);
        let prod = lu.l().matmul(&lu.u());
        for (i, &p) in lu.pivot().iter().enumerate() {
            for j in 0..n {
                assert_near(prod[(i, j)], a[(p, j)], TOL, &format!("{}x{} (LU)[{},{}]", m, n, i, j));
            }
        }
    }
}

#[test]
fn lu_on_sparse_input_round_trips() {
    // Mostly-zero columns exercise the sparse elimination path.
    let mut rng = StdRng::seed_from_u64(11);
    let n = 40;
    let mut a = Matrix::from_fn(n, n, |i, j| if i == j { 4.0 } else { 0.0 });
    for _ in 0..60 {
        let (i, j) = (rng.gen_range(0..n), rng.gen_range(0..n));
        a[(i, j)] += rng.gen_range(-1.0..1.0);
    }
    let lu = LuDecomposition::new(&a);
    assert!(lu.is_nonsingular());
    let x_true = Vector::from_vec((0..n).map(|i| (i as f64).sin()).collect());
    let b = a.matvec(&x_true);
    let x = lu.solve(&b).unwrap();
    for i in 0..n {
        assert_near(x[i], x_true[i], TOL, &format!("x[{}]", i));
    }
}

#[test]
fn determinant_flips_with_each_row_swap() {
    let mut rng = StdRng::seed_from_u64(3);
    let a = random_matrix(&mut rng, 5, 5);
    let det = LuDecomposition::new(&a).det().unwrap();

    let mut b = a.clone();
    b.swap_rows(0, 3);
    assert_near(LuDecomposition::new(&b).det().unwrap(), -det, TOL, "one swap");
    b.swap_rows(1, 4);
    assert_near(LuDecomposition::new(&b).det().unwrap(), det, TOL, "two swaps");

    let mut p = Matrix::<f64>::identity(4);
    p.swap_rows(0, 2);
    let lu = LuDecomposition::new(&p);
    assert_eq!(lu.pivot_sign(), -1);
    assert_eq!(lu.det().unwrap(), -1.0);
}

#[test]
fn solve_identity_matches_inverse() {
    let mut rng = StdRng::seed_from_u64(5);
    let alg = Algebra::standard();
    let a = random_matrix(&mut rng, 6, 6);
    let lu = LuDecomposition::new(&a);
    let via_solve = lu.solve_matrix(&Matrix::identity(6)).unwrap();
    let inv = alg.inverse(&a).unwrap();
    assert!(max_abs_diff(&via_solve, &inv) < TOL);
    assert!(max_abs_diff(&lu.inverse().unwrap(), &inv) < TOL);
}

#[test]
fn repaired_matrix_is_invertible() {
    let mut rng = StdRng::seed_from_u64(13);
    let p = Property::standard();
    // Rank one: every row is a multiple of the first.
    let row: Vec<f64> = (0..6).map(|_| rng.gen_range(-1.0..1.0)).collect();
    let mut a = Matrix::from_fn(6, 6, |i, j| (i as f64 + 1.0) * row[j]);
    assert!(p.is_singular(&a).unwrap());

    p.generate_non_singular(&mut a).unwrap();
    assert!(p.is_diagonally_dominant_by_row(&a));
    assert!(p.is_diagonally_dominant_by_column(&a));
    assert!(!p.is_singular(&a).unwrap());
    let inv = Algebra::new(p).inverse(&a).unwrap();
    assert!(max_abs_diff(&inv.matmul(&a), &Matrix::identity(6)) < TOL);
}

#[test]
fn banded_path_solves_tridiagonal() {
    let n = 12;
    let a = Matrix::from_fn(n, n, |i, j| match i.abs_diff(j) {
        0 => 4.0,
        1 => -1.0,
        _ => 0.0,
    });
    let p = Property::<f64>::standard();
    assert_eq!(p.semi_bandwidth(&a).unwrap(), 2);

    let mut lu = LuDecomposition::empty();
    lu.decompose_banded(&a, 2);
    let general = LuDecomposition::new(&a);
    assert_near(lu.det().unwrap(), general.det().unwrap(), 1e-6, "det");
    let b = Vector::fill(n, 1.0);
    let x = lu.solve(&b).unwrap();
    let r = a.matvec(&x);
    for i in 0..n {
        assert_near(r[i], 1.0, TOL, "A x = b");
    }
}

// ── SVD ──────────────────────────────────────────────────────────────

fn reconstruct(svd: &SingularValueDecomposition<f64>) -> Matrix<f64> {
    let (u, v) = (svd.u().unwrap(), svd.v().unwrap());
    u.matmul(&svd.s()).matmul(&v.transpose())
}

#[test]
fn svd_reconstructs_random() {
    let mut rng = StdRng::seed_from_u64(17);
    for &(m, n) in &[(1, 1), (3, 3), (8, 5), (20, 7), (6, 1)] {
        let a = random_matrix(&mut rng, m, n);
        let svd = SingularValueDecomposition::new(&a).unwrap();
        assert!(max_abs_diff(&reconstruct(&svd), &a) < TOL, "{}x{}", m, n);
        let s = svd.singular_values();
        assert!(s.windows(2).all(|w| w[0] >= w[1]), "{}x{} ordering", m, n);
        assert_eq!(svd.norm2(), s[0]);
    }
}

#[test]
fn svd_update_on_dependent_column_changes_nothing() {
    // Columns of A are multiples of unit vectors, so U is exact and the
    // residual of any combination of them is exactly zero.
    let a = Matrix::from_rows(5, 3, &[
        2.0, 0.0, 0.0,
        0.0, 0.0, 0.0,
        0.0, -3.0, 0.0,
        0.0, 0.0, 0.5,
        0.0, 0.0, 0.0,
    ]);
    let mut svd = SingularValueDecomposition::new(&a).unwrap();
    let before = svd.clone();
    svd.update(&Vector::from_slice(&[1.0, 0.0, 2.0, -4.0, 0.0]), true).unwrap();
    assert_eq!(svd.ncols(), before.ncols());
    assert_eq!(svd.singular_values(), before.singular_values());
    assert_eq!(svd.u(), before.u());
    assert_eq!(svd.v(), before.v());
}

#[test]
fn svd_incremental_build_matches_batch() {
    let mut rng = StdRng::seed_from_u64(19);
    let a = random_matrix(&mut rng, 10, 6);
    let mut inc = SingularValueDecomposition::empty(10);
    for j in 0..6 {
        inc.update(&a.column(j), true).unwrap();
        assert_eq!(inc.ncols(), j + 1);
    }
    let batch = SingularValueDecomposition::new(&a).unwrap();
    for (x, y) in inc.singular_values().iter().zip(batch.singular_values()) {
        assert_near(*x, *y, TOL, "singular value");
    }
    assert!(max_abs_diff(&reconstruct(&inc), &a) < TOL);

    let v = inc.v().unwrap();
    assert!(max_abs_diff(&v.transpose().matmul(v), &Matrix::identity(6)) < TOL);
}

#[test]
fn reduce_trades_fidelity_for_rank() {
    let mut rng = StdRng::seed_from_u64(23);
    let a = random_matrix(&mut rng, 8, 5);
    let full = SingularValueDecomposition::new(&a).unwrap();
    let rank = full.rank();
    assert_eq!(rank, 5);

    let error_at = |r: usize| {
        let mut svd = full.clone();
        svd.reduce_to(r).unwrap();
        (&reconstruct(&svd) - &a).norm_f()
    };

    assert!(error_at(rank) < TOL, "full rank keeps A");
    for r in 1..rank {
        assert!(error_at(r) > error_at(r + 1), "rank {} vs {}", r, r + 1);
    }

    let mut reduced = full.clone();
    reduced.reduce();
    assert_eq!(reduced.ncols(), rank);
}

//! Randomized block subspace iteration for the leading singular triples of a
//! sparse matrix. Only sparse × dense products touch the input matrix.

use ndarray::{s, Array1, Array2};
use rand::{rngs::StdRng, Rng, SeedableRng};
use sprs::CsMat;
use tracing::trace;

use super::eigen::symmetric_eigen;
use super::sparse::mul_dense;

/// Solver knobs, see `DecomposeConfig`
#[derive(Debug, Clone)]
pub struct SolverOptions {
    pub oversample: usize,
    pub max_iterations: usize,
    pub tolerance: f64,
    pub seed: Option<u64>,
}

/// Singular triples in ascending order of strength
#[derive(Debug, Clone)]
pub struct AscendingTriples {
    /// N × k
    pub u: Array2<f64>,
    /// length k, ascending
    pub sigma: Array1<f64>,
    /// k × V
    pub vt: Array2<f64>,
    pub iterations: usize,
    pub converged: bool,
}

/// Top-`k` singular triples of `a`. `at` must be the CSR transpose of `a`.
pub fn truncated_svd(a: &CsMat<f64>, at: &CsMat<f64>, k: usize, opts: &SolverOptions) -> AscendingTriples {
    let (n, v) = a.shape();
    let p = (k + opts.oversample).min(n.min(v));
    let mut rng = match opts.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let mut q = Array2::from_shape_fn((v, p), |_| rng.gen::<f64>() - 0.5);
    orthonormalize(&mut q, &mut rng);

    let mut previous: Option<Vec<f64>> = None;
    let mut iterations = 0;
    let mut converged = false;
    while iterations < opts.max_iterations {
        iterations += 1;
        let z = mul_dense(a, &q);
        let mut w = mul_dense(at, &z);

        // Rayleigh quotients of the current basis track the leading eigenvalues of AᵀA
        let mut estimate: Vec<f64> = (0..p).map(|j| q.column(j).dot(&w.column(j))).collect();
        estimate.sort_unstable_by(|x, y| y.total_cmp(x));
        estimate.truncate(k);

        orthonormalize(&mut w, &mut rng);
        q = w;

        if let Some(prev) = &previous {
            let top = estimate[0].abs().max(f64::MIN_POSITIVE);
            let delta = estimate
                .iter()
                .zip(prev)
                .map(|(e, p)| (e - p).abs())
                .fold(0.0, f64::max);
            trace!(iteration = iterations, delta = delta / top, "subspace iteration");
            if delta <= opts.tolerance * top {
                converged = true;
                break;
            }
        }
        previous = Some(estimate);
    }

    // Rayleigh-Ritz on the converged basis
    let b = mul_dense(a, &q);
    let h = b.t().dot(&b);
    let (lambda, y) = symmetric_eigen(&h);

    let mut order: Vec<usize> = (0..p).collect();
    order.sort_by(|&i, &j| lambda[i].total_cmp(&lambda[j]));
    let kept = &order[p - k..];

    let mut u = Array2::zeros((n, k));
    let mut sigma = Array1::zeros(k);
    let mut vt = Array2::zeros((k, v));
    for (dst, &src) in kept.iter().enumerate() {
        let s_val = lambda[src].max(0.0).sqrt();
        sigma[dst] = s_val;
        let y_col = y.column(src);
        vt.row_mut(dst).assign(&q.dot(&y_col));
        if s_val > 0.0 {
            u.column_mut(dst).assign(&(b.dot(&y_col) / s_val));
        }
    }

    AscendingTriples { u, sigma, vt, iterations, converged }
}

/// Remove from column `j` its components along columns `0..j`.
fn project_out(m: &mut Array2<f64>, j: usize) {
    // two passes keep the basis orthogonal to working precision
    for _ in 0..2 {
        for i in 0..j {
            let (done, mut rest) = m.multi_slice_mut((s![.., i], s![.., j]));
            let proj = done.dot(&rest);
            rest.scaled_add(-proj, &done);
        }
    }
}

/// Modified Gram-Schmidt in place. Columns that collapse relative to the
/// largest column (rank deficiency) are replaced by random directions
/// orthogonal to the previous ones. An all-zero input gets a random basis.
fn orthonormalize(m: &mut Array2<f64>, rng: &mut StdRng) {
    let scale = m
        .columns()
        .into_iter()
        .map(|c| c.dot(&c).sqrt())
        .fold(0.0, f64::max);
    let threshold = 1e-12 * scale;

    for j in 0..m.ncols() {
        project_out(m, j);
        let mut norm = m.column(j).dot(&m.column(j)).sqrt();
        if norm <= threshold {
            m.column_mut(j).mapv_inplace(|_| rng.gen::<f64>() - 0.5);
            project_out(m, j);
            norm = m.column(j).dot(&m.column(j)).sqrt();
        }
        if norm > 0.0 {
            m.column_mut(j).mapv_inplace(|x| x / norm);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decomposer::sparse::transpose_csr;
    use sprs::TriMat;

    fn options() -> SolverOptions {
        SolverOptions { oversample: 4, max_iterations: 500, tolerance: 1e-12, seed: Some(42) }
    }

    #[test]
    fn diagonal_matrix_singular_values() {
        let mut tri = TriMat::new((4, 5));
        for (i, val) in [4.0, 3.0, 2.0, 1.0].iter().enumerate() {
            tri.add_triplet(i, i, *val);
        }
        let a: CsMat<f64> = tri.to_csr();
        let at = transpose_csr(&a);
        let out = truncated_svd(&a, &at, 2, &options());
        assert!((out.sigma[0] - 3.0).abs() < 1e-8);
        assert!((out.sigma[1] - 4.0).abs() < 1e-8);
        assert!(out.converged);
    }

    #[test]
    fn orthonormalize_keeps_tiny_independent_columns() {
        let mut rng = StdRng::seed_from_u64(3);
        let original = Array2::from_shape_vec((3, 2), vec![1e-14, 0.0, 0.0, 2e-14, 0.0, 0.0]).unwrap();
        let mut m = original.clone();
        orthonormalize(&mut m, &mut rng);
        // directions are kept, only lengths change
        assert!((m[[0, 0]] - 1.0).abs() < 1e-12);
        assert!((m[[1, 1]] - 1.0).abs() < 1e-12);
        assert!(m[[2, 0]].abs() < 1e-12 && m[[2, 1]].abs() < 1e-12);
    }

    #[test]
    fn orthonormalize_replaces_zero_input() {
        let mut rng = StdRng::seed_from_u64(4);
        let mut m = Array2::zeros((4, 2));
        orthonormalize(&mut m, &mut rng);
        let gram = m.t().dot(&m);
        assert!((gram[[0, 0]] - 1.0).abs() < 1e-12);
        assert!((gram[[1, 1]] - 1.0).abs() < 1e-12);
        assert!(gram[[0, 1]].abs() < 1e-12);
    }

    #[test]
    fn orthonormalize_handles_dependent_columns() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut m = Array2::from_shape_vec((3, 2), vec![1.0, 2.0, 1.0, 2.0, 1.0, 2.0]).unwrap();
        orthonormalize(&mut m, &mut rng);
        let gram = m.t().dot(&m);
        assert!((gram[[0, 0]] - 1.0).abs() < 1e-12);
        assert!((gram[[1, 1]] - 1.0).abs() < 1e-12);
        assert!(gram[[0, 1]].abs() < 1e-12);
    }
}

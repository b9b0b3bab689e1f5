//! Cyclic Jacobi eigen-solver for the small dense symmetric problem left
//! after projecting onto the iteration subspace.

use ndarray::{Array1, Array2};

const MAX_SWEEPS: usize = 100;

/// Eigen-decomposition of a symmetric matrix.
/// Returns `(eigenvalues, eigenvectors)`; eigenvector `j` is column `j`.
/// Eigenvalues come out unordered.
pub fn symmetric_eigen(m: &Array2<f64>) -> (Array1<f64>, Array2<f64>) {
    let n = m.nrows();
    debug_assert_eq!(n, m.ncols());
    let mut a = m.clone();
    let mut v = Array2::<f64>::eye(n);

    let scale = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    if scale == 0.0 {
        return (Array1::zeros(n), v);
    }

    for _ in 0..MAX_SWEEPS {
        let mut off = 0.0;
        for i in 0..n {
            for j in 0..n {
                if i != j {
                    off += a[[i, j]] * a[[i, j]];
                }
            }
        }
        if off.sqrt() <= 1e-15 * scale {
            break;
        }

        for p in 0..n {
            for q in (p + 1)..n {
                let apq = a[[p, q]];
                if apq.abs() <= f64::MIN_POSITIVE {
                    continue;
                }
                let theta = (a[[q, q]] - a[[p, p]]) / (2.0 * apq);
                let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
                let c = 1.0 / (t * t + 1.0).sqrt();
                let s = t * c;

                for k in 0..n {
                    let akp = a[[k, p]];
                    let akq = a[[k, q]];
                    a[[k, p]] = c * akp - s * akq;
                    a[[k, q]] = s * akp + c * akq;
                }
                for k in 0..n {
                    let apk = a[[p, k]];
                    let aqk = a[[q, k]];
                    a[[p, k]] = c * apk - s * aqk;
                    a[[q, k]] = s * apk + c * aqk;
                }
                for k in 0..n {
                    let vkp = v[[k, p]];
                    let vkq = v[[k, q]];
                    v[[k, p]] = c * vkp - s * vkq;
                    v[[k, q]] = s * vkp + c * vkq;
                }
            }
        }
    }

    (a.diag().to_owned(), v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn diagonal_is_unchanged() {
        let m = array![[3.0, 0.0], [0.0, 1.0]];
        let (vals, vecs) = symmetric_eigen(&m);
        assert_eq!(vals, array![3.0, 1.0]);
        assert_eq!(vecs, Array2::<f64>::eye(2));
    }

    #[test]
    fn recovers_known_spectrum() {
        let m = array![[2.0, 1.0, 0.0], [1.0, 2.0, 1.0], [0.0, 1.0, 2.0]];
        let (vals, vecs) = symmetric_eigen(&m);
        let mut sorted = vals.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));
        let sqrt2 = 2f64.sqrt();
        for (got, want) in sorted.iter().zip([2.0 - sqrt2, 2.0, 2.0 + sqrt2]) {
            assert!((got - want).abs() < 1e-10);
        }
        // M v = λ v for every pair
        for j in 0..3 {
            let col = vecs.column(j);
            let mv = m.dot(&col);
            for i in 0..3 {
                assert!((mv[i] - vals[j] * col[i]).abs() < 1e-10);
            }
        }
        // orthonormal eigenvectors
        let gram = vecs.t().dot(&vecs);
        for i in 0..3 {
            for j in 0..3 {
                let want = if i == j { 1.0 } else { 0.0 };
                assert!((gram[[i, j]] - want).abs() < 1e-10);
            }
        }
    }

    #[test]
    fn zero_matrix_has_zero_spectrum() {
        let (vals, _) = symmetric_eigen(&Array2::zeros((3, 3)));
        assert!(vals.iter().all(|v| *v == 0.0));
    }
}

pub mod eigen;
pub mod sparse;
pub mod subspace;

use ndarray::{s, Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use sprs::CsMat;
use tracing::{info, info_span, warn};

use crate::config::DecomposeConfig;
use crate::error::{Result, SpectralError};
use crate::utils::sort::top_k_desc;
use crate::vectorizer::TermWeightingModel;

use self::sparse::{frobenius_sq, mul_dense, transpose_csr};
use self::subspace::{truncated_svd, AscendingTriples, SolverOptions};

/// Decomposition triple (U, σ, Vᵗ)
/// - `u`: N × k document-to-concept loadings
/// - `sigma`: k concept strengths, strongest first
/// - `vt`: k × V concept-to-term loadings
///
/// Columns of `u` and rows of `vt` are orthonormal within numerical tolerance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Decomposition {
    pub u: Array2<f64>,
    pub sigma: Array1<f64>,
    pub vt: Array2<f64>,
    /// squared Frobenius norm of the factored matrix
    pub total_energy: f64,
}

/// Rank-k decomposer
#[derive(Debug, Clone, Default)]
pub struct Decomposer {
    pub config: DecomposeConfig,
}

/// Decompose with default solver settings.
pub fn decompose(matrix: &CsMat<f64>, k: usize) -> Result<Decomposition> {
    Decomposer::default().decompose(matrix, k)
}

impl Decomposer {
    pub fn new(config: DecomposeConfig) -> Self {
        Self { config }
    }

    /// Factor `matrix` (N × V) into its `k` strongest concepts.
    pub fn decompose(&self, matrix: &CsMat<f64>, k: usize) -> Result<Decomposition> {
        let (n, v) = matrix.shape();
        let _span = info_span!("decompose", n, v, k).entered();

        if k == 0 {
            return Err(SpectralError::Decomposition("k must be at least 1".to_string()));
        }
        if k >= n.min(v) {
            return Err(SpectralError::Decomposition(format!(
                "k = {} must be smaller than min(documents, terms) = {}",
                k,
                n.min(v)
            )));
        }
        let total_energy = frobenius_sq(matrix);
        if total_energy == 0.0 {
            return Err(SpectralError::Decomposition("matrix is all zero".to_string()));
        }

        let a = if matrix.is_csr() { matrix.clone() } else { matrix.to_csr() };
        let at = transpose_csr(&a);
        let options = SolverOptions {
            oversample: self.config.oversample,
            max_iterations: self.config.max_iterations,
            tolerance: self.config.tolerance,
            seed: self.config.seed,
        };
        let raw = truncated_svd(&a, &at, k, &options);
        if raw.converged {
            info!(iterations = raw.iterations, "subspace iteration converged");
        } else {
            warn!(
                iterations = raw.iterations,
                "subspace iteration hit max_iterations, using current estimate"
            );
        }

        let decomposition = Decomposition::from_ascending(raw, total_energy);
        let strongest = decomposition.sigma[0];
        let weakest = decomposition.sigma[k - 1];
        if weakest <= strongest * 1e-10 {
            return Err(SpectralError::Decomposition(format!(
                "numerical rank of the matrix is below k = {}",
                k
            )));
        }
        info!(sigma_max = strongest, sigma_min = weakest, "decomposition done");
        Ok(decomposition)
    }
}

impl Decomposition {
    /// Solvers report the weakest component first. Reverse all three outputs so
    /// index 0 is the strongest concept, then fix the sign of every concept.
    pub(crate) fn from_ascending(raw: AscendingTriples, total_energy: f64) -> Self {
        let mut decomposition = Self {
            u: raw.u.slice(s![.., ..;-1]).as_standard_layout().into_owned(),
            sigma: raw.sigma.slice(s![..;-1]).as_standard_layout().into_owned(),
            vt: raw.vt.slice(s![..;-1, ..]).as_standard_layout().into_owned(),
            total_energy,
        };
        decomposition.normalize_signs();
        decomposition
    }

    /// Make the largest-magnitude term loading of every concept positive,
    /// flipping the matching document loadings with it.
    fn normalize_signs(&mut self) {
        for i in 0..self.rank() {
            let row = self.vt.row(i);
            let pivot = row
                .iter()
                .copied()
                .fold(0.0_f64, |best, x| if x.abs() > best.abs() { x } else { best });
            if pivot < 0.0 {
                self.vt.row_mut(i).mapv_inplace(|x| -x);
                self.u.column_mut(i).mapv_inplace(|x| -x);
            }
        }
    }

    /// Number of concepts
    pub fn rank(&self) -> usize {
        self.sigma.len()
    }

    /// Keep only the `k` strongest concepts.
    pub fn truncate(&self, k: usize) -> Decomposition {
        let k = k.min(self.rank());
        Decomposition {
            u: self.u.slice(s![.., ..k]).to_owned(),
            sigma: self.sigma.slice(s![..k]).to_owned(),
            vt: self.vt.slice(s![..k, ..]).to_owned(),
            total_energy: self.total_energy,
        }
    }

    /// U scaled column-wise by σ
    pub fn document_concepts(&self) -> Array2<f64> {
        &self.u * &self.sigma.view().insert_axis(Axis(0))
    }

    /// ‖A − UΣVᵗ‖_F without materializing the dense reconstruction.
    pub fn reconstruction_error(&self, matrix: &CsMat<f64>) -> f64 {
        let a = if matrix.is_csr() { matrix.clone() } else { matrix.to_csr() };
        let av = mul_dense(&a, &self.vt.t().to_owned());
        let cross: f64 = (0..self.rank())
            .map(|i| self.sigma[i] * self.u.column(i).dot(&av.column(i)))
            .sum();
        let approx: f64 = self.sigma.iter().map(|s| s * s).sum();
        (frobenius_sq(&a) - 2.0 * cross + approx).max(0.0).sqrt()
    }

    /// σᵢ² / ‖A‖², per concept
    pub fn explained_variance_ratio(&self) -> Vec<f64> {
        if self.total_energy <= 0.0 {
            return vec![0.0; self.rank()];
        }
        self.sigma.iter().map(|s| s * s / self.total_energy).collect()
    }

    /// Largest deviation of UᵀU and VᵗVᵗᵀ from the identity
    pub fn orthonormality_error(&self) -> f64 {
        let k = self.rank();
        let gram_u = self.u.t().dot(&self.u);
        let gram_v = self.vt.dot(&self.vt.t());
        let mut worst = 0.0_f64;
        for i in 0..k {
            for j in 0..k {
                let want = if i == j { 1.0 } else { 0.0 };
                worst = worst
                    .max((gram_u[[i, j]] - want).abs())
                    .max((gram_v[[i, j]] - want).abs());
            }
        }
        worst
    }

    /// Terms with the strongest positive loading on `concept`
    pub fn top_terms(&self, concept: usize, n: usize, model: &TermWeightingModel) -> Vec<(String, f64)> {
        if concept >= self.rank() {
            return Vec::new();
        }
        let row = self.vt.row(concept).to_vec();
        top_k_desc(&row, n)
            .into_iter()
            .filter_map(|idx| model.term_at(idx).map(|term| (term.to_string(), row[idx])))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WeightingConfig;
    use sprs::TriMat;

    fn seeded() -> Decomposer {
        Decomposer::new(DecomposeConfig { seed: Some(7), ..DecomposeConfig::default() })
    }

    fn generic_matrix() -> CsMat<f64> {
        pseudo_random_matrix(12, 9)
    }

    // deterministic, ~40% fill
    fn pseudo_random_matrix(rows: usize, cols: usize) -> CsMat<f64> {
        let mut tri = TriMat::new((rows, cols));
        let mut state: u64 = 0x9E37_79B9;
        for r in 0..rows {
            for c in 0..cols {
                state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                let x = (state >> 33) as f64 / (1u64 << 31) as f64;
                if x < 0.4 {
                    tri.add_triplet(r, c, 1.0 + 3.0 * x);
                }
            }
        }
        tri.to_csr()
    }

    #[test]
    fn sigma_is_descending_and_non_negative() {
        let a = generic_matrix();
        for k in 1..8 {
            let d = seeded().decompose(&a, k).unwrap();
            assert_eq!(d.rank(), k);
            assert_eq!(d.u.shape(), &[12, k]);
            assert_eq!(d.vt.shape(), &[k, 9]);
            assert!(d.sigma.iter().all(|s| *s >= 0.0));
            for w in d.sigma.to_vec().windows(2) {
                assert!(w[0] > w[1], "sigma not strictly descending: {:?}", d.sigma);
            }
        }
    }

    #[test]
    fn reversal_puts_strongest_first() {
        let raw = AscendingTriples {
            u: Array2::from_shape_vec((2, 2), vec![1.0, 0.0, 0.0, 1.0]).unwrap(),
            sigma: Array1::from(vec![1.0, 5.0]),
            vt: Array2::from_shape_vec((2, 3), vec![0.0, 1.0, 0.0, -1.0, 0.0, 0.0]).unwrap(),
            iterations: 1,
            converged: true,
        };
        let d = Decomposition::from_ascending(raw, 26.0);
        assert_eq!(d.sigma.to_vec(), vec![5.0, 1.0]);
        // strongest concept came from the last row and had a negative pivot
        assert_eq!(d.vt.row(0).to_vec(), vec![1.0, 0.0, 0.0]);
        assert_eq!(d.u.column(0).to_vec(), vec![0.0, -1.0]);
        assert_eq!(d.vt.row(1).to_vec(), vec![0.0, 1.0, 0.0]);
        assert_eq!(d.u.column(1).to_vec(), vec![1.0, 0.0]);
    }

    #[test]
    fn factors_are_orthonormal() {
        let d = seeded().decompose(&generic_matrix(), 5).unwrap();
        assert!(d.orthonormality_error() < 1e-8);
    }

    #[test]
    fn reconstruction_improves_with_rank() {
        let a = generic_matrix();
        let full = seeded().decompose(&a, 7).unwrap();
        let mut previous = f64::INFINITY;
        for k in 1..=7 {
            let err = full.truncate(k).reconstruction_error(&a);
            assert!(err < previous);
            // optimal rank-k error equals the energy outside the leading k values
            let tail: f64 = full.total_energy - full.sigma.iter().take(k).map(|s| s * s).sum::<f64>();
            assert!((err - tail.max(0.0).sqrt()).abs() < 1e-6);
            previous = err;
        }
    }

    #[test]
    fn different_seeds_agree_on_spectrum() {
        let a = generic_matrix();
        let d1 = Decomposer::new(DecomposeConfig { seed: Some(1), ..DecomposeConfig::default() })
            .decompose(&a, 4)
            .unwrap();
        let d2 = Decomposer::new(DecomposeConfig { seed: Some(99), ..DecomposeConfig::default() })
            .decompose(&a, 4)
            .unwrap();
        for (x, y) in d1.sigma.iter().zip(d2.sigma.iter()) {
            assert!((x - y).abs() < 1e-8);
        }
        let e1 = d1.reconstruction_error(&a);
        let e2 = d2.reconstruction_error(&a);
        assert!((e1 - e2).abs() < 1e-6);
    }

    #[test]
    fn sigma_scales_with_tiny_matrices() {
        // the oversampled basis must stay narrower than the row space
        let a = pseudo_random_matrix(60, 40);
        let reference = seeded().decompose(&a, 3).unwrap();
        for scale in [1e-7, 1e-8] {
            let scaled = a.map(|v| v * scale);
            let d = seeded().decompose(&scaled, 3).unwrap();
            for (small, big) in d.sigma.iter().zip(reference.sigma.iter()) {
                assert!((small / (big * scale) - 1.0).abs() < 1e-6, "scale {}: {} vs {}", scale, small, big * scale);
            }
            let ratio = d.reconstruction_error(&scaled) / (reference.reconstruction_error(&a) * scale);
            assert!((ratio - 1.0).abs() < 1e-6, "scale {}: error ratio {}", scale, ratio);
        }
    }

    #[test]
    fn rejects_bad_k_and_zero_matrix() {
        let a = generic_matrix();
        assert!(matches!(decompose(&a, 0), Err(SpectralError::Decomposition(_))));
        assert!(matches!(decompose(&a, 9), Err(SpectralError::Decomposition(_))));
        let zero: CsMat<f64> = TriMat::new((4, 4)).to_csr();
        assert!(matches!(decompose(&zero, 2), Err(SpectralError::Decomposition(_))));
    }

    #[test]
    fn rank_deficient_matrix_is_rejected() {
        // rank 1: every row is a multiple of the same vector
        let mut tri = TriMat::new((4, 4));
        for r in 0..4 {
            tri.add_triplet(r, 0, (r + 1) as f64);
            tri.add_triplet(r, 1, 2.0 * (r + 1) as f64);
        }
        let a: CsMat<f64> = tri.to_csr();
        assert!(seeded().decompose(&a, 1).is_ok());
        assert!(matches!(seeded().decompose(&a, 2), Err(SpectralError::Decomposition(_))));
    }

    #[test]
    fn top_terms_follow_concept_loadings() {
        let docs = vec!["cat dog", "dog bird", "car engine", "car engine wheel"];
        let (model, matrix) = TermWeightingModel::fit(&docs, &WeightingConfig::default()).unwrap();
        let d = seeded().decompose(&matrix, 2).unwrap();
        let leading = d.top_terms(0, 2, &model);
        assert_eq!(leading.len(), 2);
        assert!(leading[0].1 >= leading[1].1);
        assert!(d.top_terms(5, 3, &model).is_empty());
        let ratios = d.explained_variance_ratio();
        assert!(ratios[0] >= ratios[1]);
        assert!(ratios.iter().sum::<f64>() <= 1.0 + 1e-9);
    }
}

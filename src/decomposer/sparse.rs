//! Sparse × dense products used by the iterative solver.

use ndarray::{Array2, ArrayView1};
use rayon::prelude::*;
use sprs::CsMat;

/// `a * x` for a CSR matrix `a` (r × c) and a dense `x` (c × p).
/// Rows of the product are computed in parallel.
pub fn mul_dense(a: &CsMat<f64>, x: &Array2<f64>) -> Array2<f64> {
    debug_assert!(a.is_csr(), "left operand must be CSR");
    debug_assert_eq!(a.cols(), x.nrows());
    let p = x.ncols();

    let rows: Vec<Vec<f64>> = (0..a.rows())
        .into_par_iter()
        .map(|r| {
            let mut out = vec![0.0; p];
            if let Some(row) = a.outer_view(r) {
                for (c, &v) in row.iter() {
                    for (o, &xv) in out.iter_mut().zip(x.row(c).iter()) {
                        *o += v * xv;
                    }
                }
            }
            out
        })
        .collect();

    let mut result = Array2::zeros((a.rows(), p));
    for (r, vals) in rows.iter().enumerate() {
        result.row_mut(r).assign(&ArrayView1::from(&vals[..]));
    }
    result
}

/// CSR copy of the transpose
pub fn transpose_csr(a: &CsMat<f64>) -> CsMat<f64> {
    a.transpose_view().to_csr()
}

/// Squared Frobenius norm
pub fn frobenius_sq(a: &CsMat<f64>) -> f64 {
    a.data().iter().map(|v| v * v).sum()
}

use ndarray::Array1;
use rayon::prelude::*;

use crate::index::DocumentSpace;
use crate::utils::math::{cosine, l2_norm};

/// Cosine of `query` against every document row, in document order.
/// A zero query or a zero document scores 0.
pub(crate) fn cosine_scores(space: &DocumentSpace, query: &Array1<f64>) -> Vec<f64> {
    let query_norm = l2_norm(query.iter().copied());
    (0..space.matrix.nrows())
        .into_par_iter()
        .map(|i| cosine(space.matrix.row(i).dot(query), query_norm, space.norms[i]))
        .collect()
}

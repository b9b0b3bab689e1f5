use std::cmp::Ordering;

/// Descending order on scores, ties broken by ascending index.
/// NaN ranks below every number.
#[inline(always)]
fn rank_order(scores: &[f64], a: usize, b: usize) -> Ordering {
    let key = |i: usize| {
        let s = scores[i];
        if s.is_nan() { f64::NEG_INFINITY } else { s }
    };
    key(b).total_cmp(&key(a)).then_with(|| a.cmp(&b))
}

/// Indices of the `k` highest scores in rank order.
/// - equal scores keep their original index order, so the result is deterministic
/// - `k` larger than `scores.len()` returns every index
///
/// Complexity: O(n + k log k) via selection then a sort of the selected prefix
pub fn top_k_desc(scores: &[f64], k: usize) -> Vec<usize> {
    let k = k.min(scores.len());
    if k == 0 {
        return Vec::new();
    }
    let mut order: Vec<usize> = (0..scores.len()).collect();
    if k < order.len() {
        order.select_nth_unstable_by(k - 1, |&a, &b| rank_order(scores, a, b));
        order.truncate(k);
    }
    order.sort_unstable_by(|&a, &b| rank_order(scores, a, b));
    order
}

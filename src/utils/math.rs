use num::Float;

/// Euclidean norm
#[inline]
pub fn l2_norm<N: Float>(values: impl IntoIterator<Item = N>) -> N {
    values.into_iter().fold(N::zero(), |acc, v| acc + v * v).sqrt()
}

/// Cosine from a precomputed dot product and both norms.
/// Defined as zero when either norm is zero.
#[inline]
pub fn cosine<N: Float>(dot: N, norm_a: N, norm_b: N) -> N {
    if norm_a == N::zero() || norm_b == N::zero() {
        return N::zero();
    }
    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn norm_of_pythagorean_triple() {
        assert_eq!(l2_norm([3.0f64, 4.0]), 5.0);
        assert_eq!(l2_norm([3.0f32, 4.0]), 5.0);
        assert_eq!(l2_norm(Vec::<f64>::new()), 0.0);
    }

    #[test]
    fn cosine_handles_zero_norm() {
        assert_eq!(cosine(1.0f64, 0.0, 2.0), 0.0);
        assert_eq!(cosine(0.0f64, 1.0, 0.0), 0.0);
        assert!((cosine(2.0f64, 1.0, 2.0) - 1.0).abs() < 1e-15);
        assert!((cosine(-2.0f64, 1.0, 2.0) + 1.0).abs() < 1e-15);
    }
}

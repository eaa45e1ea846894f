//! Vector math shared by the flat index and the in-memory store

/// Squared Euclidean distance
pub fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

/// Cosine similarity; zero vectors have similarity 0
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

/// Scale a vector to unit length in place; zero vectors are left alone
pub fn l2_normalize(v: &mut [f32]) {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_squared_l2() {
        assert_eq!(squared_l2(&[0.0, 0.0], &[3.0, 4.0]), 25.0);
        assert_eq!(squared_l2(&[1.0, 2.0], &[1.0, 2.0]), 0.0);
    }

    #[test]
    fn test_cosine() {
        assert!((cosine_similarity(&[1.0, 0.0], &[2.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn test_normalized_l2_ranks_like_cosine() {
        let mut q = vec![1.0, 2.0, 0.5];
        let mut a = vec![2.0, 4.1, 1.0];
        let mut b = vec![-1.0, 0.3, 3.0];

        let cos_a = cosine_similarity(&q, &a);
        let cos_b = cosine_similarity(&q, &b);

        l2_normalize(&mut q);
        l2_normalize(&mut a);
        l2_normalize(&mut b);

        // ||q - x||² = 2 - 2cos for unit vectors
        assert!((squared_l2(&q, &a) - (2.0 - 2.0 * cos_a)).abs() < 1e-5);
        assert!((squared_l2(&q, &b) - (2.0 - 2.0 * cos_b)).abs() < 1e-5);
        assert!(squared_l2(&q, &a) < squared_l2(&q, &b));
    }
}

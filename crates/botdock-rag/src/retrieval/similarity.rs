//! Cosine similarity and top-K ranking over a candidate pool

use std::cmp::Ordering;

use crate::types::EmbeddingRecord;

use super::search::RankedMatch;

/// Cosine similarity between two vectors.
///
/// Zero-magnitude input on either side yields 0.0 rather than NaN.
/// Vectors of unequal length are compared over their common prefix.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Rank a candidate pool against a query vector, returning the top `top_k`
/// matches by descending similarity.
///
/// Ties keep the pool's original order: the sort is stable and compares on
/// similarity alone, so callers get deterministic results for deterministic
/// pools.
pub fn rank(query: &[f32], pool: Vec<EmbeddingRecord>, top_k: usize) -> Vec<RankedMatch> {
    let mut matches: Vec<RankedMatch> = pool
        .into_iter()
        .map(|record| {
            let similarity = cosine_similarity(query, &record.embedding);
            RankedMatch { record, similarity }
        })
        .collect();

    matches.sort_by(|a, b| {
        b.similarity
            .partial_cmp(&a.similarity)
            .unwrap_or(Ordering::Equal)
    });
    matches.truncate(top_k);

    matches
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn record_with(embedding: Vec<f32>, text: &str) -> EmbeddingRecord {
        EmbeddingRecord::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            text.to_string(),
            embedding,
            0,
            "test.txt".to_string(),
        )
    }

    #[test]
    fn identical_vectors_score_one() {
        let v = [0.5f32, -1.25, 3.0, 0.75];
        let sim = cosine_similarity(&v, &v);
        assert!((sim - 1.0).abs() < 1e-6);
    }

    #[test]
    fn opposite_vectors_score_minus_one() {
        let v = [1.0f32, 2.0, -3.0];
        let neg: Vec<f32> = v.iter().map(|x| -x).collect();
        let sim = cosine_similarity(&v, &neg);
        assert!((sim + 1.0).abs() < 1e-6);
    }

    #[test]
    fn similarity_is_symmetric() {
        let a = [0.3f32, 0.9, -0.2, 1.7];
        let b = [1.1f32, -0.4, 0.6, 0.0];
        assert_eq!(cosine_similarity(&a, &b), cosine_similarity(&b, &a));
    }

    #[test]
    fn zero_magnitude_yields_zero_not_nan() {
        let zero = [0.0f32; 4];
        let v = [1.0f32, 2.0, 3.0, 4.0];
        assert_eq!(cosine_similarity(&zero, &v), 0.0);
        assert_eq!(cosine_similarity(&v, &zero), 0.0);
        assert_eq!(cosine_similarity(&zero, &zero), 0.0);
    }

    #[test]
    fn orthogonal_vectors_score_zero() {
        let a = [1.0f32, 0.0];
        let b = [0.0f32, 1.0];
        assert!(cosine_similarity(&a, &b).abs() < 1e-6);
    }

    #[test]
    fn rank_returns_exactly_k_sorted_results() {
        let query = vec![1.0f32, 0.0];
        let pool = vec![
            record_with(vec![0.0, 1.0], "orthogonal"),
            record_with(vec![1.0, 0.0], "exact"),
            record_with(vec![1.0, 1.0], "diagonal"),
            record_with(vec![-1.0, 0.0], "opposite"),
        ];

        let ranked = rank(&query, pool, 3);
        assert_eq!(ranked.len(), 3);
        assert_eq!(ranked[0].record.text, "exact");
        assert_eq!(ranked[1].record.text, "diagonal");
        assert_eq!(ranked[2].record.text, "orthogonal");
        for pair in ranked.windows(2) {
            assert!(pair[0].similarity >= pair[1].similarity);
        }
    }

    #[test]
    fn rank_ties_preserve_pool_order() {
        let query = vec![1.0f32, 0.0];
        // Scaled copies of the same direction all score 1.0
        let pool = vec![
            record_with(vec![2.0, 0.0], "first"),
            record_with(vec![5.0, 0.0], "second"),
            record_with(vec![0.5, 0.0], "third"),
        ];

        let ranked = rank(&query, pool, 3);
        let order: Vec<&str> = ranked.iter().map(|m| m.record.text.as_str()).collect();
        assert_eq!(order, vec!["first", "second", "third"]);
    }

    #[test]
    fn rank_with_k_beyond_pool_returns_whole_pool() {
        let query = vec![1.0f32];
        let pool = vec![record_with(vec![1.0], "only")];
        assert_eq!(rank(&query, pool, 10).len(), 1);
    }

    #[test]
    fn rank_empty_pool_is_empty() {
        assert!(rank(&[1.0], Vec::new(), 5).is_empty());
    }
}

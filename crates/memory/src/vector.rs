//! Vector similarity utilities.
//!
//! Pure-Rust cosine similarity and a brute-force top-k ranking.

/// Compute cosine similarity between two vectors.
///
/// Returns a value in [-1, 1] where 1 = identical, 0 = orthogonal, -1 = opposite.
/// Returns 0.0 if either vector is zero-length or empty.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;

    for (x, y) in a.iter().zip(b.iter()) {
        let x = *x as f64;
        let y = *y as f64;
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < 1e-10 {
        return 0.0;
    }

    (dot / denom) as f32
}

/// Rank `candidates` by cosine similarity to `query`.
///
/// Returns `(index, score)` pairs sorted by descending score, truncated to
/// `limit`. No score threshold is applied. Equal scores keep their
/// original order.
pub fn rank_by_similarity<'a, I>(candidates: I, query: &[f32], limit: usize) -> Vec<(usize, f32)>
where
    I: IntoIterator<Item = &'a [f32]>,
{
    let mut scored: Vec<(usize, f32)> = candidates
        .into_iter()
        .enumerate()
        .map(|(i, emb)| (i, cosine_similarity(emb, query)))
        .collect();

    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(limit);
    scored
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cosine_identical_vectors() {
        let v = vec![1.0, 2.0, 3.0];
        let sim = cosine_similarity(&v, &v);
        assert!((sim - 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_orthogonal_vectors() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![0.0, 1.0, 0.0];
        assert!(cosine_similarity(&a, &b).abs() < 1e-6);
    }

    #[test]
    fn cosine_opposite_vectors() {
        let a = vec![1.0, 0.0];
        let b = vec![-1.0, 0.0];
        assert!((cosine_similarity(&a, &b) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_degenerate_inputs() {
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[1.0, 2.0], &[1.0, 2.0, 3.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
    }

    #[test]
    fn cosine_known_value() {
        // [1,1] · [1,0] = 1, |[1,1]| = sqrt(2), |[1,0]| = 1
        let sim = cosine_similarity(&[1.0, 1.0], &[1.0, 0.0]);
        assert!((sim - 0.7071).abs() < 0.001);
    }

    #[test]
    fn ranks_by_similarity() {
        let candidates = [
            vec![0.0, 1.0, 0.0], // orthogonal = 0
            vec![1.0, 0.0, 0.0], // identical = 1
            vec![0.5, 0.5, 0.0], // partial = ~0.707
        ];
        let ranked = rank_by_similarity(candidates.iter().map(Vec::as_slice), &[1.0, 0.0, 0.0], 10);
        let order: Vec<usize> = ranked.iter().map(|(i, _)| *i).collect();
        assert_eq!(order, vec![1, 2, 0]);
    }

    #[test]
    fn keeps_low_scores_and_respects_limit() {
        let candidates: Vec<Vec<f32>> = (0..10).map(|i| vec![1.0, i as f32]).collect();
        let ranked = rank_by_similarity(candidates.iter().map(Vec::as_slice), &[0.0, -1.0], 4);
        assert_eq!(ranked.len(), 4);
        assert!(ranked.iter().all(|(_, score)| *score <= 0.0));
    }

    #[test]
    fn ties_keep_insertion_order() {
        let candidates = [vec![1.0, 0.0], vec![2.0, 0.0], vec![3.0, 0.0]];
        let ranked = rank_by_similarity(candidates.iter().map(Vec::as_slice), &[1.0, 0.0], 3);
        let order: Vec<usize> = ranked.iter().map(|(i, _)| *i).collect();
        assert_eq!(order, vec![0, 1, 2]);
    }
}
